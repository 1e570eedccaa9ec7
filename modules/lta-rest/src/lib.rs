pub mod auth;
pub mod error;
pub mod metrics;
pub mod routes;
pub mod state;

use std::sync::Arc;

use axum::http::{header, HeaderValue, Method};
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::set_header::SetResponseHeaderLayer;
use tower_http::trace::TraceLayer;

use state::AppState;

async fn root() -> &'static str {
    "ok"
}

/// Assemble the full route tree and middleware stack. Split out of `main`
/// so integration tests can drive the router in-process with
/// `tower::ServiceExt::oneshot` against a testcontainers-backed `AppState`.
pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/metrics", get(metrics::metrics_handler))
        .route(
            "/TransferRequests",
            get(routes::transfer_requests::list).post(routes::transfer_requests::create),
        )
        .route(
            "/TransferRequests/actions/pop",
            post(routes::transfer_requests::pop),
        )
        .route(
            "/TransferRequests/{uuid}",
            get(routes::transfer_requests::get_one)
                .patch(routes::transfer_requests::patch_one)
                .delete(routes::transfer_requests::delete_one),
        )
        .route("/Bundles", get(routes::bundles::list).post(routes::bundles::create))
        .route("/Bundles/actions/pop", post(routes::bundles::pop))
        .route("/Bundles/actions/bulk_create", post(routes::bundles::bulk_create))
        .route("/Bundles/actions/bulk_update", post(routes::bundles::bulk_update))
        .route("/Bundles/actions/bulk_delete", post(routes::bundles::bulk_delete))
        .route(
            "/Bundles/{uuid}",
            get(routes::bundles::get_one)
                .patch(routes::bundles::patch_one)
                .delete(routes::bundles::delete_one),
        )
        .route(
            "/Bundles/{uuid}/Metadata",
            get(routes::metadata::list_for_bundle),
        )
        .route(
            "/Metadata",
            get(routes::metadata::list).delete(routes::metadata::delete_for_bundle),
        )
        .route(
            "/Metadata/{uuid}",
            get(routes::metadata::get_one).delete(routes::metadata::delete_one),
        )
        .route("/Metadata/actions/bulk_create", post(routes::metadata::bulk_create))
        .route("/Metadata/actions/bulk_delete", post(routes::metadata::bulk_delete))
        .route("/status", get(routes::status::overview))
        .route(
            "/status/{component}",
            get(routes::status::get_one).patch(routes::status::heartbeat),
        )
        .with_state(state.clone())
        .layer(axum::extract::DefaultBodyLimit::max(
            state.metadata_bulk_body_limit_bytes,
        ))
        .layer(if cfg!(debug_assertions) {
            CorsLayer::new()
                .allow_origin(tower_http::cors::Any)
                .allow_methods([Method::GET, Method::POST, Method::PATCH, Method::DELETE])
                .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
        } else {
            let origins: Vec<HeaderValue> = std::env::var("LTA_CORS_ORIGINS")
                .unwrap_or_default()
                .split(',')
                .filter_map(|s| s.trim().parse().ok())
                .collect();
            CorsLayer::new()
                .allow_origin(origins)
                .allow_methods([Method::GET, Method::POST, Method::PATCH, Method::DELETE])
                .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
        })
        .layer(SetResponseHeaderLayer::overriding(
            header::HeaderName::from_static("x-frame-options"),
            HeaderValue::from_static("DENY"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::HeaderName::from_static("x-content-type-options"),
            HeaderValue::from_static("nosniff"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::CACHE_CONTROL,
            HeaderValue::from_static("no-store"),
        ))
        .layer(
            TraceLayer::new_for_http().make_span_with(|request: &axum::http::Request<_>| {
                tracing::info_span!(
                    "http_request",
                    method = %request.method(),
                    path = %request.uri().path(),
                )
            }),
        )
}
