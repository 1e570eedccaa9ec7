//! Retriever: claims a `requested` bundle (an operator-initiated restore)
//! and fetches its tape-resident artifact back to local disk via HPSS
//! `hsi get`. Grounded on `nersc_retriever.py`.

use std::path::PathBuf;

use async_trait::async_trait;
use lta_client::LtaClient;
use lta_worker::{Outcome, StageHandler, WorkerConfig};
use serde_json::{json, Map, Value};

use crate::error::quarantine_bundle;
use crate::transport::hsi_get;
use crate::{parse_bundle_status, BundleStatusExt as _};

pub struct Retriever;

#[async_trait]
impl StageHandler for Retriever {
    fn component_type(&self) -> &'static str {
        "retriever"
    }

    fn expected_config(&self) -> &'static [&'static str] {
        &["HSI_BINARY", "WORK_DIR"]
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

        let Some(final_location) = bundle.final_dest_location.clone() else {
            anyhow::bail!("bundle {} has no final_dest_location to retrieve from", bundle.uuid);
        };

        let work_dir = PathBuf::from(config.inner().get("WORK_DIR"));
        tokio::fs::create_dir_all(&work_dir).await?;
        let local_path = work_dir.join(format!("{}.metadata.ndjson", bundle.uuid));

        if let Err(e) = hsi_get(config.inner().get("HSI_BINARY"), &final_location.0.path, &local_path).await {
            return Ok(quarantine_bundle(bundle.uuid, bundle.status.as_static_str(), &e));
        }

        let mut patch: Map<String, Value> = Map::new();
        patch.insert("bundle_path".to_string(), json!(local_path.display().to_string()));
        patch.insert("status".to_string(), json!(config.output_status().to_lowercase()));
        patch.insert("claimed".to_string(), json!(false));
        client.patch_bundle(bundle.uuid, &patch).await?;
        Ok(Outcome::Successful)
    }
}
