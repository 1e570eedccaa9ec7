use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json};
use lta_common::TransferRequest;
use lta_store::filter::TransferRequestFilter;
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::auth::{AdminAuth, AnyAuth, SystemAuth};
use crate::error::ApiError;
use crate::state::AppState;

#[derive(Deserialize)]
pub struct ListQuery {
    source: Option<String>,
    status: Option<String>,
    limit: Option<i64>,
}

pub async fn list(
    State(state): State<Arc<AppState>>,
    _auth: AnyAuth,
    Query(q): Query<ListQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let filter = TransferRequestFilter {
        source: q.source,
        status: q.status,
        limit: q.limit,
    };
    let results = state.store.list_transfer_requests(&filter).await?;
    Ok(Json(json!({ "results": results })))
}

#[derive(Deserialize)]
pub struct CreateBody {
    source: String,
    dest: Vec<String>,
    path: String,
}

pub async fn create(
    State(state): State<Arc<AppState>>,
    _auth: AnyAuth,
    Json(body): Json<CreateBody>,
) -> Result<impl IntoResponse, ApiError> {
    if body.source.is_empty() || body.path.is_empty() {
        return Err(ApiError::BadRequest("source and path must be non-empty".to_string()));
    }
    if body.dest.is_empty() || body.dest.iter().any(|d| d.is_empty()) {
        return Err(ApiError::BadRequest("dest must be a non-empty list of non-empty strings".to_string()));
    }
    let req = TransferRequest::new(body.source, body.dest, body.path);
    state.store.create_transfer_request(&req).await?;
    Ok((StatusCode::CREATED, Json(json!({ "TransferRequest": req.uuid }))))
}

pub async fn get_one(
    State(state): State<Arc<AppState>>,
    _auth: AnyAuth,
    Path(uuid): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let req = state.store.get_transfer_request(uuid).await?.ok_or(ApiError::NotFound)?;
    Ok(Json(req))
}

pub async fn patch_one(
    State(state): State<Arc<AppState>>,
    _auth: AnyAuth,
    Path(uuid): Path<Uuid>,
    Json(body): Json<Value>,
) -> Result<impl IntoResponse, ApiError> {
    let map = body
        .as_object()
        .ok_or_else(|| ApiError::BadRequest("patch body must be a JSON object".to_string()))?;
    if let Some(patched_uuid) = map.get("uuid") {
        if patched_uuid.as_str() != Some(&uuid.to_string()) {
            return Err(ApiError::BadRequest("patch body may not change uuid".to_string()));
        }
    }
    if state.store.get_transfer_request(uuid).await?.is_none() {
        return Err(ApiError::NotFound);
    }
    state.store.patch_transfer_request(uuid, map).await?;
    let req = state.store.get_transfer_request(uuid).await?.ok_or(ApiError::NotFound)?;
    Ok(Json(req))
}

pub async fn delete_one(
    State(state): State<Arc<AppState>>,
    _auth: AdminAuth,
    Path(uuid): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    state.store.delete_transfer_request(uuid).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Deserialize)]
pub struct PopQuery {
    source: String,
}

pub async fn pop(
    State(state): State<Arc<AppState>>,
    _auth: SystemAuth,
    Query(q): Query<PopQuery>,
    Json(body): Json<Value>,
) -> Result<impl IntoResponse, ApiError> {
    let claimant = body
        .get("claimant")
        .and_then(|v| v.as_str())
        .ok_or_else(|| ApiError::BadRequest("missing claimant field".to_string()))?;
    let claimed = state.store.pop_transfer_request(&q.source, claimant).await?;
    Ok(Json(json!({ "transfer_request": claimed })))
}
