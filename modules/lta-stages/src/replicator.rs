//! Replicator: claims a `staged` bundle and puts it to its destination site
//! over whichever [`Transport`] the deployment is wired with (WebDAV,
//! Globus, or GridFTP). Grounded on `globus_replicator.py`/
//! `gridftp_replicator.py`/`fts3_replicator.py`'s shared shape: compute the
//! destination path, start (or resume) the transfer, record the reference.

use std::path::PathBuf;

use async_trait::async_trait;
use lta_client::LtaClient;
use lta_worker::{Outcome, StageHandler, WorkerConfig};
use serde_json::{json, Map, Value};

use crate::error::quarantine_bundle;
use crate::transport::Transport;
use crate::{parse_bundle_status, BundleStatusExt as _};

/// Generic over [`Transport`] and parameterized by `component_type` so the
/// tape-bound `mover` stage can reuse this exact claim/put/patch shape
/// against an [`crate::transport::HpssTransport`] instead of duplicating it.
pub struct Replicator<T: Transport> {
    transport: T,
    component_type: &'static str,
}

impl<T: Transport> Replicator<T> {
    pub fn new(transport: T) -> Self {
        Self { transport, component_type: "replicator" }
    }

    pub fn with_component_type(transport: T, component_type: &'static str) -> Self {
        Self { transport, component_type }
    }
}

#[async_trait]
impl<T: Transport> StageHandler for Replicator<T> {
    fn component_type(&self) -> &'static str {
        self.component_type
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
            anyhow::bail!("bundle {} has no bundle_path to replicate", bundle.uuid);
        };

        // A transfer_reference already present means a prior claim started
        // the upload and crashed before patching status forward; resume by
        // trusting that reference instead of re-uploading.
        let transfer_reference = if let Some(existing) = &bundle.transfer_reference {
            existing.clone()
        } else {
            let dest_path = format!("{}/{}", bundle.dest, bundle.uuid);
            match self.transport.put(&PathBuf::from(&bundle_path), &dest_path).await {
                Ok(reference) => reference,
                Err(e) => return Ok(quarantine_bundle(bundle.uuid, bundle.status.as_static_str(), &e)),
            }
        };

        let mut patch: Map<String, Value> = Map::new();
        patch.insert("transfer_reference".to_string(), json!(transfer_reference));
        patch.insert("transfer_dest_path".to_string(), json!(format!("{}/{}", bundle.dest, bundle.uuid)));
        patch.insert("status".to_string(), json!(config.output_status().to_lowercase()));
        patch.insert("claimed".to_string(), json!(false));
        client.patch_bundle(bundle.uuid, &patch).await?;
        Ok(Outcome::Successful)
    }
}
