pub mod auth;
pub mod rest;

pub use rest::{RestClient, RestError};

use lta_common::{Bundle, BundleStatus, Metadata, TransferRequest};
use serde_json::{json, Map, Value};
use uuid::Uuid;

/// Worker-side client for the LTA REST service. Workers never touch
/// Postgres directly; every claim and status update goes through this
/// client over HTTP, same as the original Python components talking to
/// `rest_server.py` via `ClientCredentialsAuth`/`RestClient`.
pub struct LtaClient {
    rest: RestClient,
}

impl LtaClient {
    pub fn new(base_url: String, token_url: String, client_id: String, client_secret: String) -> Self {
        Self {
            rest: RestClient::new(base_url, token_url, client_id, client_secret),
        }
    }

    pub async fn pop_bundle(
        &self,
        source: &str,
        dest: &str,
        status: BundleStatus,
        claimant: &str,
    ) -> Result<Option<Bundle>, RestError> {
        let body = json!({ "claimant": claimant });
        let status = serde_json::to_value(status)
            .ok()
            .and_then(|v| v.as_str().map(str::to_string))
            .unwrap_or_default();
        let path = format!("/Bundles/actions/pop?source={source}&dest={dest}&status={status}");
        let response: Value = self.rest.post(&path, &body).await?;
        Ok(parse_optional_bundle(response))
    }

    pub async fn pop_transfer_request(
        &self,
        source: &str,
        claimant: &str,
    ) -> Result<Option<TransferRequest>, RestError> {
        let body = json!({ "claimant": claimant });
        let path = format!("/TransferRequests/actions/pop?source={source}");
        let response: Value = self.rest.post(&path, &body).await?;
        match response.get("transfer_request") {
            Some(v) if !v.is_null() => Ok(serde_json::from_value(v.clone()).ok()),
            _ => Ok(None),
        }
    }

    pub async fn get_bundle(&self, uuid: Uuid) -> Result<Bundle, RestError> {
        self.rest.get(&format!("/Bundles/{uuid}")).await
    }

    pub async fn patch_bundle(&self, uuid: Uuid, patch: &Map<String, Value>) -> Result<Bundle, RestError> {
        self.rest.patch(&format!("/Bundles/{uuid}"), patch).await
    }

    pub async fn patch_transfer_request(
        &self,
        uuid: Uuid,
        patch: &Map<String, Value>,
    ) -> Result<TransferRequest, RestError> {
        self.rest.patch(&format!("/TransferRequests/{uuid}"), patch).await
    }

    pub async fn create_bundle(&self, bundle: &Bundle) -> Result<Bundle, RestError> {
        let response: Value = self.rest.post("/Bundles", bundle).await?;
        response
            .get("Bundle")
            .and_then(|v| v.as_str())
            .and_then(|s| Uuid::parse_str(s).ok())
            .filter(|uuid| *uuid == bundle.uuid)
            .ok_or_else(|| RestError::Decode("missing Bundle uuid in response".to_string()))?;
        Ok(bundle.clone())
    }

    pub async fn bulk_create_metadata(&self, rows: &[Metadata]) -> Result<Value, RestError> {
        let body = json!({ "metadata": rows });
        self.rest.post("/Metadata/actions/bulk_create", &body).await
    }

    pub async fn list_metadata_for_bundle(&self, bundle_uuid: Uuid) -> Result<Vec<Metadata>, RestError> {
        let response: Value = self.rest.get(&format!("/Bundles/{bundle_uuid}/Metadata")).await?;
        let rows = response
            .get("results")
            .cloned()
            .unwrap_or_else(|| json!([]));
        serde_json::from_value(rows).map_err(|e| RestError::Decode(e.to_string()))
    }

    pub async fn bulk_delete_metadata(&self, uuids: &[Uuid]) -> Result<usize, RestError> {
        let body = json!({ "metadata": uuids });
        let response: Value = self.rest.post("/Metadata/actions/bulk_delete", &body).await?;
        response
            .get("count")
            .and_then(|v| v.as_u64())
            .map(|n| n as usize)
            .ok_or_else(|| RestError::Decode("missing count in bulk_delete response".to_string()))
    }

    pub async fn list_bundles_for_request(&self, request: Uuid) -> Result<Vec<Bundle>, RestError> {
        let response: Value = self.rest.get(&format!("/Bundles?request={request}")).await?;
        let rows = response.get("results").cloned().unwrap_or_else(|| json!([]));
        serde_json::from_value(rows).map_err(|e| RestError::Decode(e.to_string()))
    }

    pub async fn bulk_create_bundles(&self, bundles: &[Bundle]) -> Result<Vec<Uuid>, RestError> {
        let body = json!({ "bundles": bundles });
        let response: Value = self.rest.post("/Bundles/actions/bulk_create", &body).await?;
        let raw = response.get("bundles").cloned().unwrap_or_else(|| json!([]));
        serde_json::from_value(raw).map_err(|e| RestError::Decode(e.to_string()))
    }

    pub async fn patch_status(&self, component: &str, counters: &Value) -> Result<(), RestError> {
        let body = json!({ "counters": counters });
        let _: Value = self.rest.patch(&format!("/status/{component}"), &body).await?;
        Ok(())
    }

    pub async fn create_transfer_request(&self, source: &str, dest: Vec<String>, path: &str) -> Result<Uuid, RestError> {
        let body = json!({ "source": source, "dest": dest, "path": path });
        let response: Value = self.rest.post("/TransferRequests", &body).await?;
        response
            .get("TransferRequest")
            .and_then(|v| v.as_str())
            .and_then(|s| Uuid::parse_str(s).ok())
            .ok_or_else(|| RestError::Decode("missing TransferRequest uuid in response".to_string()))
    }

    pub async fn list_transfer_requests(
        &self,
        source: Option<&str>,
        status: Option<&str>,
    ) -> Result<Vec<TransferRequest>, RestError> {
        let path = format!("/TransferRequests{}", query_string(&[("source", source), ("status", status)]));
        let response: Value = self.rest.get(&path).await?;
        let rows = response.get("results").cloned().unwrap_or_else(|| json!([]));
        serde_json::from_value(rows).map_err(|e| RestError::Decode(e.to_string()))
    }

    pub async fn list_bundles(
        &self,
        source: Option<&str>,
        dest: Option<&str>,
        status: Option<&str>,
    ) -> Result<Vec<Bundle>, RestError> {
        let path = format!(
            "/Bundles{}",
            query_string(&[("source", source), ("dest", dest), ("status", status)])
        );
        let response: Value = self.rest.get(&path).await?;
        let rows = response.get("results").cloned().unwrap_or_else(|| json!([]));
        serde_json::from_value(rows).map_err(|e| RestError::Decode(e.to_string()))
    }

    pub async fn status_overview(&self) -> Result<Value, RestError> {
        self.rest.get("/status").await
    }

    pub async fn get_status(&self, component: &str) -> Result<Value, RestError> {
        self.rest.get(&format!("/status/{component}")).await
    }
}

/// Build a `?k=v&k=v` query string from the present `(key, value)` pairs,
/// or an empty string if none are set.
fn query_string(pairs: &[(&str, Option<&str>)]) -> String {
    let parts: Vec<String> = pairs
        .iter()
        .filter_map(|(k, v)| v.map(|v| format!("{k}={v}")))
        .collect();
    if parts.is_empty() {
        String::new()
    } else {
        format!("?{}", parts.join("&"))
    }
}

fn parse_optional_bundle(response: Value) -> Option<Bundle> {
    match response.get("bundle") {
        Some(v) if !v.is_null() => serde_json::from_value(v.clone()).ok(),
        _ => None,
    }
}

/// Minimal client for the external file-catalog service: register a
/// bundle's constituent files and look an entry up by uuid.
pub struct FileCatalogClient {
    rest: RestClient,
}

impl FileCatalogClient {
    pub fn new(base_url: String, token_url: String, client_id: String, client_secret: String) -> Self {
        Self {
            rest: RestClient::new(base_url, token_url, client_id, client_secret),
        }
    }

    pub async fn register_file(&self, record: &Value) -> Result<Value, RestError> {
        self.rest.post("/api/files", record).await
    }

    pub async fn get_file(&self, uuid: Uuid) -> Result<Value, RestError> {
        self.rest.get(&format!("/api/files/{uuid}")).await
    }

    pub async fn list_files_under(&self, path: &str) -> Result<Vec<Value>, RestError> {
        let response: Value = self.rest.get(&format!("/api/files?path={path}")).await?;
        Ok(response
            .get("files")
            .and_then(|v| v.as_array())
            .cloned()
            .unwrap_or_default())
    }
}
