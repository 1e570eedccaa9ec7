use std::sync::Arc;

use axum::extract::{Path, State};
use axum::response::{IntoResponse, Json};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::auth::{AnyAuth, SystemAuth};
use crate::error::ApiError;
use crate::state::AppState;

pub async fn overview(
    State(state): State<Arc<AppState>>,
    _auth: AnyAuth,
) -> Result<impl IntoResponse, ApiError> {
    let statuses = state.store.list_statuses().await?;
    let health = state.store.overall_health().await?;
    Ok(Json(json!({ "health": health, "components": statuses })))
}

pub async fn get_one(
    State(state): State<Arc<AppState>>,
    _auth: AnyAuth,
    Path(component): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let status = state.store.get_status(&component).await?.ok_or(ApiError::NotFound)?;
    Ok(Json(status))
}

#[derive(Deserialize)]
pub struct HeartbeatBody {
    #[serde(default = "default_counters")]
    counters: Value,
}

fn default_counters() -> Value {
    json!({})
}

pub async fn heartbeat(
    State(state): State<Arc<AppState>>,
    _auth: SystemAuth,
    Path(component): Path<String>,
    Json(body): Json<HeartbeatBody>,
) -> Result<impl IntoResponse, ApiError> {
    state.store.upsert_status(&component, &body.counters).await?;
    Ok(Json(json!({})))
}
