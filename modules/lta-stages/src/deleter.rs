//! Deleter: claims a `completed` bundle (archive-path, already catalog
//! registered) and removes its local disk artifact now that the tape copy
//! and catalog entry are the durable record. Grounded on `deleter.py`.

use async_trait::async_trait;
use lta_client::LtaClient;
use lta_worker::{Outcome, StageHandler, WorkerConfig};
use serde_json::{json, Map, Value};
use tracing::warn;

use crate::parse_bundle_status;

pub struct Deleter;

#[async_trait]
impl StageHandler for Deleter {
    fn component_type(&self) -> &'static str {
        "deleter"
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

        if let Some(bundle_path) = &bundle.bundle_path {
            match tokio::fs::remove_file(bundle_path).await {
                Ok(()) => {}
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                    // Already gone — a prior claim got this far before crashing.
                }
                Err(e) => return Err(e.into()),
            }
        } else {
            warn!(bundle = %bundle.uuid, "deleting a bundle with no local artifact recorded");
        }

        let mut patch: Map<String, Value> = Map::new();
        patch.insert("status".to_string(), json!(config.output_status().to_lowercase()));
        patch.insert("claimed".to_string(), json!(false));
        client.patch_bundle(bundle.uuid, &patch).await?;
        Ok(Outcome::Successful)
    }
}
