use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json};
use lta_common::Metadata;
use lta_store::filter::MetadataFilter;
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

use crate::auth::{AnyAuth, SystemAuth};
use crate::error::ApiError;
use crate::state::AppState;

pub async fn list_for_bundle(
    State(state): State<Arc<AppState>>,
    _auth: AnyAuth,
    Path(bundle_uuid): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let results = state.store.list_metadata_for_bundle(bundle_uuid).await?;
    Ok(Json(json!({ "results": results })))
}

#[derive(Deserialize)]
pub struct ListQuery {
    bundle_uuid: Option<Uuid>,
    limit: Option<i64>,
}

pub async fn list(
    State(state): State<Arc<AppState>>,
    _auth: AnyAuth,
    Query(q): Query<ListQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let filter = MetadataFilter { bundle_uuid: q.bundle_uuid, limit: q.limit };
    let results = state.store.list_metadata(&filter).await?;
    Ok(Json(json!({ "results": results })))
}

pub async fn get_one(
    State(state): State<Arc<AppState>>,
    _auth: AnyAuth,
    Path(uuid): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let row = state.store.get_metadata(uuid).await?.ok_or(ApiError::NotFound)?;
    Ok(Json(row))
}

pub async fn delete_one(
    State(state): State<Arc<AppState>>,
    _auth: SystemAuth,
    Path(uuid): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    state.store.delete_metadata(uuid).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Deserialize)]
pub struct DeleteQuery {
    bundle_uuid: Uuid,
}

pub async fn delete_for_bundle(
    State(state): State<Arc<AppState>>,
    _auth: SystemAuth,
    Query(q): Query<DeleteQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let count = state.store.delete_metadata_for_bundle(q.bundle_uuid).await?;
    Ok(Json(json!({ "count": count })))
}

#[derive(Deserialize)]
pub struct BulkCreateBody {
    metadata: Vec<Metadata>,
}

pub async fn bulk_create(
    State(state): State<Arc<AppState>>,
    _auth: SystemAuth,
    Json(body): Json<BulkCreateBody>,
) -> Result<impl IntoResponse, ApiError> {
    if body.metadata.is_empty() {
        return Err(ApiError::BadRequest("metadata list must not be empty".to_string()));
    }
    state.store.bulk_create_metadata(&body.metadata).await?;
    let uuids: Vec<Uuid> = body.metadata.iter().map(|m| m.uuid).collect();
    Ok((StatusCode::CREATED, Json(json!({ "metadata": uuids }))))
}

#[derive(Deserialize)]
pub struct BulkDeleteBody {
    metadata: Vec<Uuid>,
}

pub async fn bulk_delete(
    State(state): State<Arc<AppState>>,
    _auth: SystemAuth,
    Json(body): Json<BulkDeleteBody>,
) -> Result<impl IntoResponse, ApiError> {
    if body.metadata.is_empty() {
        return Err(ApiError::BadRequest("metadata list must not be empty".to_string()));
    }
    let count = state.store.bulk_delete_metadata(&body.metadata).await?;
    Ok(Json(json!({ "metadata": body.metadata, "count": count })))
}
