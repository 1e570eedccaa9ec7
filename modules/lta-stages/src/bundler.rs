//! Bundler: claims a `specified` bundle, pulls its `Metadata` rows to learn
//! which catalog files it packs, writes the NDJSON manifest describing
//! them, and records the manifest's path, size and checksum on the bundle.
//! Grounded on the original's `bundler.py`, which built a ZIP archive
//! alongside the same manifest; packing the archive itself is out of scope
//! here (Non-goal: no filesystem warehouse is mounted in this exercise) —
//! the manifest file stands in as the bundle's persisted artifact, same as
//! `bundle_path` always pointed at *some* file for every downstream stage
//! to transport.

use std::path::PathBuf;

use async_trait::async_trait;
use lta_client::{FileCatalogClient, LtaClient};
use lta_common::Checksum;
use lta_worker::{Outcome, StageHandler, WorkerConfig};
use serde_json::{json, Map, Value};

use crate::error::quarantine_bundle;
use crate::manifest::{BundleManifest, ManifestEntry};
use crate::transport::checksum_file;
use crate::{parse_bundle_status, BundleStatusExt as _};

pub struct Bundler;

#[async_trait]
impl StageHandler for Bundler {
    fn component_type(&self) -> &'static str {
        "bundler"
    }

    fn expected_config(&self) -> &'static [&'static str] {
        &[
            "FILE_CATALOG_REST_URL",
            "FILE_CATALOG_CLIENT_ID",
            "FILE_CATALOG_CLIENT_SECRET",
            "WORK_DIR",
        ]
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

        let metadata_rows = client.list_metadata_for_bundle(bundle.uuid).await?;
        let catalog = FileCatalogClient::new(
            config.inner().get("FILE_CATALOG_REST_URL").to_string(),
            config.lta_auth_openid_url().to_string(),
            config.inner().get("FILE_CATALOG_CLIENT_ID").to_string(),
            config.inner().get("FILE_CATALOG_CLIENT_SECRET").to_string(),
        );

        let mut manifest = BundleManifest::new(bundle.uuid);
        for row in &metadata_rows {
            let record = match catalog.get_file(row.file_catalog_uuid).await {
                Ok(v) => v,
                Err(e) => {
                    let err = crate::error::StageError::Rest(e);
                    return Ok(quarantine_bundle(bundle.uuid, bundle.status.as_static_str(), &err));
                }
            };
            manifest.files.push(ManifestEntry {
                logical_name: record.get("logical_name").and_then(Value::as_str).unwrap_or_default().to_string(),
                file_size: record.get("file_size").and_then(Value::as_i64).unwrap_or(0),
                checksum: serde_json::from_value(record.get("checksum").cloned().unwrap_or_default())
                    .unwrap_or(Checksum { sha512: String::new(), adler32: None }),
                uuid: row.file_catalog_uuid,
            });
        }

        let work_dir = PathBuf::from(config.inner().get("WORK_DIR"));
        tokio::fs::create_dir_all(&work_dir).await?;
        let manifest_path = work_dir.join(format!("{}.metadata.ndjson", bundle.uuid));
        crate::manifest::write_manifest_v3(&manifest_path, &manifest).await?;

        let sha512 = match checksum_file(&manifest_path).await {
            Ok(s) => s,
            Err(e) => return Ok(quarantine_bundle(bundle.uuid, bundle.status.as_static_str(), &e)),
        };
        let size = tokio::fs::metadata(&manifest_path).await?.len() as i64;

        let mut patch: Map<String, Value> = Map::new();
        patch.insert("bundle_path".to_string(), json!(manifest_path.display().to_string()));
        patch.insert("size".to_string(), json!(size));
        patch.insert("checksum".to_string(), json!(Checksum { sha512, adler32: None }));
        patch.insert("status".to_string(), json!(config.output_status().to_lowercase()));
        patch.insert("claimed".to_string(), json!(false));

        client.patch_bundle(bundle.uuid, &patch).await?;
        Ok(Outcome::Successful)
    }
}
