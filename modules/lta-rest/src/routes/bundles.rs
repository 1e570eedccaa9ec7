use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json};
use lta_common::{Bundle, BundleStatus};
use lta_store::filter::BundleFilter;
use serde::Deserialize;
use serde_json::{json, Map, Value};
use uuid::Uuid;

use crate::auth::{AdminAuth, AnyAuth, SystemAuth};
use crate::error::ApiError;
use crate::state::AppState;

#[derive(Deserialize)]
pub struct ListQuery {
    source: Option<String>,
    dest: Option<String>,
    status: Option<String>,
    request: Option<Uuid>,
    location: Option<String>,
    limit: Option<i64>,
}

pub async fn list(
    State(state): State<Arc<AppState>>,
    _auth: AnyAuth,
    Query(q): Query<ListQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let filter = BundleFilter {
        source: q.source,
        dest: q.dest,
        status: q.status,
        request: q.request,
        location: q.location,
        limit: q.limit,
    };
    let results = state.store.list_bundles(&filter).await?;
    Ok(Json(json!({ "results": results })))
}

pub async fn create(
    State(state): State<Arc<AppState>>,
    _auth: AnyAuth,
    Json(bundle): Json<Bundle>,
) -> Result<impl IntoResponse, ApiError> {
    state.store.create_bundle(&bundle).await?;
    Ok((StatusCode::CREATED, Json(json!({ "Bundle": bundle.uuid }))))
}

pub async fn get_one(
    State(state): State<Arc<AppState>>,
    _auth: AnyAuth,
    Path(uuid): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let bundle = state.store.get_bundle(uuid).await?.ok_or(ApiError::NotFound)?;
    Ok(Json(bundle))
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
    if state.store.get_bundle(uuid).await?.is_none() {
        return Err(ApiError::NotFound);
    }
    state.store.patch_bundle(uuid, map).await?;
    let bundle = state.store.get_bundle(uuid).await?.ok_or(ApiError::NotFound)?;
    Ok(Json(bundle))
}

pub async fn delete_one(
    State(state): State<Arc<AppState>>,
    _auth: AdminAuth,
    Path(uuid): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    state.store.delete_bundle(uuid).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Deserialize)]
pub struct PopQuery {
    source: String,
    dest: String,
    status: BundleStatus,
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
    let claimed = state.store.pop_bundle(&q.source, &q.dest, q.status, claimant).await?;
    Ok(Json(json!({ "bundle": claimed })))
}

#[derive(Deserialize)]
pub struct BulkCreateBody {
    bundles: Vec<Bundle>,
}

pub async fn bulk_create(
    State(state): State<Arc<AppState>>,
    _auth: SystemAuth,
    Json(body): Json<BulkCreateBody>,
) -> Result<impl IntoResponse, ApiError> {
    if body.bundles.is_empty() {
        return Err(ApiError::BadRequest("bundles list must not be empty".to_string()));
    }
    state.store.bulk_create_bundles(&body.bundles).await?;
    let uuids: Vec<Uuid> = body.bundles.iter().map(|b| b.uuid).collect();
    Ok((StatusCode::CREATED, Json(json!({ "bundles": uuids }))))
}

#[derive(Deserialize)]
pub struct BulkUpdateBody {
    bundles: Vec<Uuid>,
    update: Map<String, Value>,
}

pub async fn bulk_update(
    State(state): State<Arc<AppState>>,
    _auth: SystemAuth,
    Json(body): Json<BulkUpdateBody>,
) -> Result<impl IntoResponse, ApiError> {
    if body.bundles.is_empty() {
        return Err(ApiError::BadRequest("bundles list must not be empty".to_string()));
    }
    if body.update.is_empty() {
        return Err(ApiError::BadRequest("update must be a non-empty object".to_string()));
    }
    let count = state.store.bulk_update_bundles(&body.bundles, &body.update).await?;
    Ok(Json(json!({ "bundles": body.bundles, "count": count })))
}

#[derive(Deserialize)]
pub struct BulkDeleteBody {
    bundles: Vec<Uuid>,
}

pub async fn bulk_delete(
    State(state): State<Arc<AppState>>,
    _auth: SystemAuth,
    Json(body): Json<BulkDeleteBody>,
) -> Result<impl IntoResponse, ApiError> {
    if body.bundles.is_empty() {
        return Err(ApiError::BadRequest("bundles list must not be empty".to_string()));
    }
    state.store.bulk_delete_bundles(&body.bundles).await?;
    Ok(Json(json!({ "bundles": body.bundles })))
}
