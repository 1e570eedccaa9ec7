pub mod bundler;
pub mod catalog;
pub mod deleter;
pub mod error;
pub mod finisher;
pub mod manifest;
pub mod mover;
pub mod picker;
pub mod replicator;
pub mod retriever;
pub mod stager;
pub mod transport;
pub mod unpacker;
pub mod verifier;

use lta_common::BundleStatus;

use crate::error::StageError;

/// Parse a stage's `INPUT_STATUS`/`OUTPUT_STATUS` config value into the
/// typed enum the REST client's pop/patch calls expect.
pub fn parse_bundle_status(raw: &str) -> Result<BundleStatus, StageError> {
    serde_json::from_value(serde_json::Value::String(raw.to_lowercase()))
        .map_err(|_| StageError::Manifest(format!("'{raw}' is not a recognized bundle status")))
}

/// `original_status` on a quarantine patch is always the status the item
/// held right before it was claimed — a `&'static str` since it's one of a
/// fixed, known set of values.
pub trait BundleStatusExt {
    fn as_static_str(&self) -> &'static str;
}

impl BundleStatusExt for BundleStatus {
    fn as_static_str(&self) -> &'static str {
        match self {
            BundleStatus::Specified => "specified",
            BundleStatus::Created => "created",
            BundleStatus::Staged => "staged",
            BundleStatus::Transferring => "transferring",
            BundleStatus::Taping => "taping",
            BundleStatus::Verifying => "verifying",
            BundleStatus::Completed => "completed",
            BundleStatus::Detached => "detached",
            BundleStatus::Deleted => "deleted",
            BundleStatus::Finished => "finished",
            BundleStatus::Requested => "requested",
            BundleStatus::Located => "located",
            BundleStatus::Unpacking => "unpacking",
            BundleStatus::Quarantined => "quarantined",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_known_statuses() {
        assert_eq!(parse_bundle_status("staged").unwrap(), BundleStatus::Staged);
        assert_eq!(parse_bundle_status("TAPING").unwrap(), BundleStatus::Taping);
    }

    #[test]
    fn rejects_unknown_status() {
        assert!(parse_bundle_status("not-a-status").is_err());
    }
}
