//! Verifier: claims a bundle that finished transport, confirms its
//! checksum against the far side via [`Transport::verify`], registers its
//! constituent files with the file catalog, and drains the `Metadata` rows
//! that staged that registration. Grounded on `site_move_verifier.py` and
//! `nersc_verifier.py`'s shared two-part contract: checksum confirmation,
//! then catalog bookkeeping, both gating the same status advance.

use async_trait::async_trait;
use lta_client::{FileCatalogClient, LtaClient};
use lta_common::FinalDestLocation;
use lta_worker::{Outcome, StageHandler, WorkerConfig};
use serde_json::{json, Map, Value};

use crate::catalog::{drain_metadata_for_bundle, register_bundle_files};
use crate::error::quarantine_bundle;
use crate::manifest::read_manifest;
use crate::transport::Transport;
use crate::{parse_bundle_status, BundleStatusExt as _};

pub struct Verifier<T: Transport> {
    transport: T,
}

impl<T: Transport> Verifier<T> {
    pub fn new(transport: T) -> Self {
        Self { transport }
    }
}

#[async_trait]
impl<T: Transport> StageHandler for Verifier<T> {
    fn component_type(&self) -> &'static str {
        "verifier"
    }

    fn expected_config(&self) -> &'static [&'static str] {
        &["FILE_CATALOG_REST_URL", "FILE_CATALOG_CLIENT_ID", "FILE_CATALOG_CLIENT_SECRET"]
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

        let dest_path = bundle
            .transfer_dest_path
            .clone()
            .unwrap_or_else(|| format!("{}/{}", bundle.dest, bundle.uuid));

        if let Err(e) = self.transport.verify(&dest_path, &bundle.checksum.0.sha512).await {
            return Ok(quarantine_bundle(bundle.uuid, bundle.status.as_static_str(), &e));
        }

        let Some(bundle_path) = bundle.bundle_path.clone() else {
            anyhow::bail!("bundle {} has no bundle_path to read a manifest from", bundle.uuid);
        };
        let manifest = match read_manifest(std::path::Path::new(&bundle_path)).await {
            Ok(m) => m,
            Err(e) => return Ok(quarantine_bundle(bundle.uuid, bundle.status.as_static_str(), &e)),
        };

        let location = FinalDestLocation { site: bundle.dest.clone(), path: dest_path.clone() };
        let catalog = FileCatalogClient::new(
            config.inner().get("FILE_CATALOG_REST_URL").to_string(),
            config.lta_auth_openid_url().to_string(),
            config.inner().get("FILE_CATALOG_CLIENT_ID").to_string(),
            config.inner().get("FILE_CATALOG_CLIENT_SECRET").to_string(),
        );
        if let Err(e) = register_bundle_files(&catalog, &bundle, &manifest.files, &location).await {
            return Ok(quarantine_bundle(bundle.uuid, bundle.status.as_static_str(), &e));
        }

        let metadata_rows = client.list_metadata_for_bundle(bundle.uuid).await?;
        if let Err(e) = drain_metadata_for_bundle(client, bundle.uuid, &metadata_rows).await {
            return Ok(quarantine_bundle(bundle.uuid, bundle.status.as_static_str(), &e));
        }

        let mut patch: Map<String, Value> = Map::new();
        patch.insert("final_dest_location".to_string(), json!(location));
        patch.insert("status".to_string(), json!(config.output_status().to_lowercase()));
        patch.insert("claimed".to_string(), json!(false));
        client.patch_bundle(bundle.uuid, &patch).await?;
        Ok(Outcome::Successful)
    }
}
