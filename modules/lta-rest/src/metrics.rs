use axum::extract::State;
use axum::response::IntoResponse;
use prometheus::{Encoder, IntCounterVec, Opts, Registry, TextEncoder};
use std::sync::Arc;

use crate::state::AppState;

/// Per-route request counters, labeled by route and status class, mirroring
/// the original's `monitoring.py` promsite counters but scoped to the REST
/// surface rather than the worker components.
pub struct RestMetrics {
    pub requests: IntCounterVec,
}

impl RestMetrics {
    pub fn new(registry: &Registry) -> Self {
        let requests = IntCounterVec::new(
            Opts::new("lta_rest_requests_total", "REST requests by route and status class"),
            &["route", "status_class"],
        )
        .expect("valid metric");
        registry.register(Box::new(requests.clone())).ok();
        Self { requests }
    }

    pub fn record(&self, route: &str, status: axum::http::StatusCode) {
        let class = match status.as_u16() {
            200..=299 => "2xx",
            300..=399 => "3xx",
            400..=499 => "4xx",
            _ => "5xx",
        };
        self.requests.with_label_values(&[route, class]).inc();
    }
}

pub async fn metrics_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let families = state.registry.gather();
    let mut buf = Vec::new();
    TextEncoder::new().encode(&families, &mut buf).ok();
    (
        [(axum::http::header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        buf,
    )
}
