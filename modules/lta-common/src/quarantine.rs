//! Quarantine patch-body construction, shared by every worker stage.

use chrono::Utc;
use serde_json::{json, Value};

const KEEP_HEAD_LINES: usize = 250;
const KEEP_TAIL_LINES: usize = 250;
const TRUNCATE_THRESHOLD: usize = 500;

/// Truncate a stack trace to at most 500 lines: keep the first 250 and last
/// 250, joined by an ellipsis line noting the omitted count. Traces at or
/// under the threshold pass through unchanged.
pub fn truncate_trace(trace: &str) -> String {
    let lines: Vec<&str> = trace.lines().collect();
    if lines.len() <= TRUNCATE_THRESHOLD {
        return trace.to_string();
    }
    let omitted = lines.len() - KEEP_HEAD_LINES - KEEP_TAIL_LINES;
    let head = &lines[..KEEP_HEAD_LINES];
    let tail = &lines[lines.len() - KEEP_TAIL_LINES..];
    let mut out = String::new();
    out.push_str(&head.join("\n"));
    out.push_str(&format!("\n... [{omitted} lines omitted] ...\n"));
    out.push_str(&tail.join("\n"));
    out
}

/// Build the quarantine PATCH body for a bundle or transfer request.
pub fn quarantine_patch(original_status: &str, claimant: &str, cause: &str, trace: &str) -> Value {
    json!({
        "original_status": original_status,
        "status": "quarantined",
        "reason": format!("BY:{claimant} REASON:{cause}"),
        "reason_details": truncate_trace(trace),
        "work_priority_timestamp": crate::types::format_timestamp(&Utc::now()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_trace_passes_through() {
        let trace = "line1\nline2\nline3";
        assert_eq!(truncate_trace(trace), trace);
    }

    #[test]
    fn long_trace_is_truncated_head_and_tail() {
        let lines: Vec<String> = (0..1000).map(|i| format!("line{i}")).collect();
        let trace = lines.join("\n");
        let truncated = truncate_trace(&trace);
        assert!(truncated.contains("line0"));
        assert!(truncated.contains("line249"));
        assert!(truncated.contains("line999"));
        assert!(truncated.contains("500 lines omitted"));
        assert!(!truncated.contains("line300"));
    }

    #[test]
    fn patch_has_expected_shape() {
        let patch = quarantine_patch("transferring", "verifier-abc123", "Checksum mismatch", "trace here");
        assert_eq!(patch["status"], "quarantined");
        assert_eq!(patch["original_status"], "transferring");
        assert_eq!(
            patch["reason"],
            "BY:verifier-abc123 REASON:Checksum mismatch"
        );
        assert!(patch["work_priority_timestamp"].is_string());
    }
}
