//! Finisher: claims a `deleted` bundle and checks whether every sibling
//! bundle under the same `TransferRequest` has also reached a terminal
//! status. If not, it re-queues itself for a later pass. If so, it marks
//! the transfer request `completed` and every sibling bundle `finished` in
//! one sweep. Grounded line-for-line on `transfer_request_finisher.py`'s
//! three PATCH body shapes.

use async_trait::async_trait;
use chrono::Utc;
use lta_client::LtaClient;
use lta_common::{format_timestamp, BundleStatus};
use lta_worker::{Outcome, StageHandler, WorkerConfig};
use serde_json::{json, Map, Value};

use crate::parse_bundle_status;

/// Whether any sibling bundle under the same request hasn't reached a
/// terminal status yet. Split out from `do_work_claim` so the re-queue vs.
/// finish decision is testable without a REST round trip.
fn has_nonterminal_sibling(siblings: &[lta_common::Bundle]) -> bool {
    siblings.iter().any(|s| !s.status.is_terminal())
}

pub struct Finisher;

#[async_trait]
impl StageHandler for Finisher {
    fn component_type(&self) -> &'static str {
        "finisher"
    }

    async fn do_work_claim(&self, client: &LtaClient, config: &WorkerConfig) -> anyhow::Result<Outcome> {
        let input_status = parse_bundle_status(config.input_status())?;
        let claimant = config.component_name();
        let bundle = match client
            .pop_bundle(config.source_site(), config.dest_site(), input_status, claimant)
            .await?
        {
            Some(b) => b,
            None => return Ok(Outcome::NothingClaimed),
        };

        let siblings = client.list_bundles_for_request(bundle.request).await?;
        let any_nonterminal = has_nonterminal_sibling(&siblings);

        let now = format_timestamp(&Utc::now());

        if any_nonterminal {
            let mut patch: Map<String, Value> = Map::new();
            patch.insert("claimed".to_string(), json!(false));
            patch.insert("update_timestamp".to_string(), json!(now.clone()));
            patch.insert("work_priority_timestamp".to_string(), json!(now));
            client.patch_bundle(bundle.uuid, &patch).await?;
            return Ok(Outcome::Successful);
        }

        let mut request_patch: Map<String, Value> = Map::new();
        request_patch.insert("claimant".to_string(), json!(claimant));
        request_patch.insert("claimed".to_string(), json!(false));
        request_patch.insert("claim_timestamp".to_string(), json!(now.clone()));
        request_patch.insert("status".to_string(), json!("completed"));
        request_patch.insert("reason".to_string(), json!(""));
        request_patch.insert("update_timestamp".to_string(), json!(now.clone()));
        client.patch_transfer_request(bundle.request, &request_patch).await?;

        for sibling in &siblings {
            let mut bundle_patch: Map<String, Value> = Map::new();
            bundle_patch.insert("claimant".to_string(), json!(claimant));
            bundle_patch.insert("claimed".to_string(), json!(false));
            bundle_patch.insert("claim_timestamp".to_string(), json!(now.clone()));
            bundle_patch.insert("status".to_string(), json!(serde_json::to_value(BundleStatus::Finished)?));
            bundle_patch.insert("reason".to_string(), json!(""));
            bundle_patch.insert("update_timestamp".to_string(), json!(now.clone()));
            client.patch_bundle(sibling.uuid, &bundle_patch).await?;
        }

        Ok(Outcome::Successful)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lta_common::Bundle;
    use uuid::Uuid;

    fn bundle_with_status(status: BundleStatus) -> Bundle {
        let mut b = Bundle::new(Uuid::new_v4(), "WIPAC".to_string(), "DESY".to_string(), "/data/exp".to_string());
        b.status = status;
        b
    }

    #[test]
    fn all_terminal_siblings_means_finish() {
        let siblings = vec![bundle_with_status(BundleStatus::Deleted), bundle_with_status(BundleStatus::Finished)];
        assert!(!has_nonterminal_sibling(&siblings));
    }

    #[test]
    fn one_in_flight_sibling_blocks_finishing() {
        let siblings = vec![bundle_with_status(BundleStatus::Deleted), bundle_with_status(BundleStatus::Transferring)];
        assert!(has_nonterminal_sibling(&siblings));
    }

    #[test]
    fn empty_sibling_list_is_vacuously_done() {
        assert!(!has_nonterminal_sibling(&[]));
    }
}
