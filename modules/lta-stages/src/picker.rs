//! Picker: claims an unclaimed `TransferRequest`, asks the file catalog
//! which files live under its warehouse path, and fans that file list out
//! into one `Bundle` (plus its `Metadata` rows) per destination site.
//! Grounded on the original's `picker.py` `_do_work_claim`.

use async_trait::async_trait;
use lta_client::{FileCatalogClient, LtaClient};
use lta_common::{Bundle, Metadata};
use lta_worker::{Outcome, StageHandler, WorkerConfig};
use uuid::Uuid;

use crate::error::StageError;

pub struct Picker;

#[async_trait]
impl StageHandler for Picker {
    fn component_type(&self) -> &'static str {
        "picker"
    }

    fn expected_config(&self) -> &'static [&'static str] {
        &["FILE_CATALOG_REST_URL", "FILE_CATALOG_CLIENT_ID", "FILE_CATALOG_CLIENT_SECRET"]
    }

    async fn do_work_claim(&self, client: &LtaClient, config: &WorkerConfig) -> anyhow::Result<Outcome> {
        let claimant = config.component_name();
        let request = match client.pop_transfer_request(config.source_site(), claimant).await? {
            Some(r) => r,
            None => return Ok(Outcome::NothingClaimed),
        };

        let catalog = FileCatalogClient::new(
            config.inner().get("FILE_CATALOG_REST_URL").to_string(),
            config.lta_auth_openid_url().to_string(),
            config.inner().get("FILE_CATALOG_CLIENT_ID").to_string(),
            config.inner().get("FILE_CATALOG_CLIENT_SECRET").to_string(),
        );

        let files = match catalog.list_files_under(&request.path).await {
            Ok(files) => files,
            Err(e) => {
                let err = StageError::Rest(e);
                return Ok(lta_worker::Outcome::QuarantineNow {
                    target: lta_worker::QuarantineTarget::TransferRequest {
                        uuid: request.uuid,
                        original_status: "unclaimed",
                    },
                    cause: err.to_string(),
                    trace: format!("{err:?}"),
                });
            }
        };

        let file_uuids: Vec<Uuid> = files
            .iter()
            .filter_map(|f| f.get("uuid").and_then(|v| v.as_str()))
            .filter_map(|s| Uuid::parse_str(s).ok())
            .collect();

        for dest in &request.dest {
            let bundle = Bundle::new(request.uuid, request.source.clone(), dest.clone(), request.path.clone());
            let created = client.create_bundle(&bundle).await?;

            if !file_uuids.is_empty() {
                let metadata_rows: Vec<Metadata> = file_uuids.iter().map(|uuid| Metadata::new(created.uuid, *uuid)).collect();
                client.bulk_create_metadata(&metadata_rows).await?;
            }
        }

        Ok(Outcome::Successful)
    }
}
