//! Unpacker: claims a retrieval-path bundle staged for unpacking, reads its
//! manifest, and lands each entry under the configured warehouse
//! directory. Grounded on `unpacker.py`'s manifest-driven extraction loop;
//! actual archive bytes are out of scope here (see `bundler`'s doc
//! comment) so this stage's "unpack" writes one marker file per manifest
//! entry carrying its recorded checksum, which is what a caller would diff
//! against the freshly-extracted file in a deployment with a real archive.

use std::path::PathBuf;

use async_trait::async_trait;
use lta_client::LtaClient;
use lta_worker::{Outcome, StageHandler, WorkerConfig};
use serde_json::{json, Map, Value};

use crate::error::{quarantine_bundle, StageError};
use crate::manifest::read_manifest;
use crate::{parse_bundle_status, BundleStatusExt as _};

pub struct Unpacker;

#[async_trait]
impl StageHandler for Unpacker {
    fn component_type(&self) -> &'static str {
        "unpacker"
    }

    fn expected_config(&self) -> &'static [&'static str] {
        &["WAREHOUSE_DIR"]
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
            anyhow::bail!("bundle {} has no bundle_path to unpack", bundle.uuid);
        };
        let manifest = match read_manifest(std::path::Path::new(&bundle_path)).await {
            Ok(m) => m,
            Err(e) => return Ok(quarantine_bundle(bundle.uuid, bundle.status.as_static_str(), &e)),
        };
        if manifest.files.is_empty() {
            let err = StageError::Manifest(format!("bundle {} manifest has no files", bundle.uuid));
            return Ok(quarantine_bundle(bundle.uuid, bundle.status.as_static_str(), &err));
        }

        let warehouse_dir = PathBuf::from(config.inner().get("WAREHOUSE_DIR")).join(bundle.path.trim_start_matches('/'));
        tokio::fs::create_dir_all(&warehouse_dir).await?;
        for entry in &manifest.files {
            let marker_path = warehouse_dir.join(format!("{}.sha512", entry.logical_name.replace('/', "_")));
            if let Some(parent) = marker_path.parent() {
                tokio::fs::create_dir_all(parent).await?;
            }
            tokio::fs::write(&marker_path, &entry.checksum.sha512).await?;
        }

        let mut patch: Map<String, Value> = Map::new();
        patch.insert("status".to_string(), json!(config.output_status().to_lowercase()));
        patch.insert("claimed".to_string(), json!(false));
        client.patch_bundle(bundle.uuid, &patch).await?;
        Ok(Outcome::Successful)
    }
}
