//! Stager: a plain disk-transport stage — `mv` a bundle's local artifact
//! from its current working directory into the next stage's staging
//! directory. Config-driven input/output status means the same binary
//! serves both the archive path (`created` -> `staged`) and the retrieval
//! path (`located` -> `staged`), same as every other stage here; only the
//! env vars differ between the two deployments. Grounded on
//! `desy_stager.py`'s quota-check-then-`mv` shape, generalized off the
//! Rucio-specific HTTP half.

use std::path::PathBuf;

use async_trait::async_trait;
use lta_client::LtaClient;
use lta_worker::{Outcome, StageHandler, WorkerConfig};
use serde_json::{json, Map, Value};

use crate::parse_bundle_status;

pub struct Stager;

#[async_trait]
impl StageHandler for Stager {
    fn component_type(&self) -> &'static str {
        "stager"
    }

    fn expected_config(&self) -> &'static [&'static str] {
        &["STAGING_DIR", "QUOTA_BYTES"]
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

        let Some(bundle_path) = bundle.bundle_path.clone() else {
            anyhow::bail!("bundle {} has no bundle_path to stage", bundle.uuid);
        };
        let source = PathBuf::from(&bundle_path);
        let size = bundle.size.unwrap_or(0) as u64;

        let quota_bytes: u64 = config.inner().get("QUOTA_BYTES").parse().unwrap_or(u64::MAX);
        let staging_dir = PathBuf::from(config.inner().get("STAGING_DIR"));

        if size > quota_bytes {
            // Over the configured per-destination quota; release the claim
            // without changing status so the bundle is retried later,
            // same as the original's quota-exceeded re-queue.
            let mut patch: Map<String, Value> = Map::new();
            patch.insert("claimed".to_string(), json!(false));
            patch.insert(
                "work_priority_timestamp".to_string(),
                json!(lta_common::format_timestamp(&chrono::Utc::now())),
            );
            client.patch_bundle(bundle.uuid, &patch).await?;
            return Ok(Outcome::Successful);
        }

        tokio::fs::create_dir_all(&staging_dir).await?;
        let dest = staging_dir.join(
            source
                .file_name()
                .ok_or_else(|| anyhow::anyhow!("bundle_path {} has no filename", bundle_path))?,
        );
        tokio::fs::rename(&source, &dest).await?;

        let mut patch: Map<String, Value> = Map::new();
        patch.insert("bundle_path".to_string(), json!(dest.display().to_string()));
        patch.insert("status".to_string(), json!(config.output_status().to_lowercase()));
        patch.insert("claimed".to_string(), json!(false));
        client.patch_bundle(bundle.uuid, &patch).await?;
        Ok(Outcome::Successful)
    }
}
