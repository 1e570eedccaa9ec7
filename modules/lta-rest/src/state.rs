use lta_common::config::RestConfig;
use lta_store::Store;
use prometheus::Registry;

use crate::metrics::RestMetrics;

pub struct AppState {
    pub store: Store,
    pub auth_secret: String,
    pub auth_issuer: String,
    pub metadata_bulk_body_limit_bytes: usize,
    pub registry: Registry,
    pub metrics: RestMetrics,
}

impl AppState {
    pub fn new(store: Store, config: &RestConfig) -> Self {
        let registry = Registry::new();
        let metrics = RestMetrics::new(&registry);
        Self {
            store,
            auth_secret: config.auth_secret.clone(),
            auth_issuer: config.auth_issuer.clone(),
            metadata_bulk_body_limit_bytes: config.metadata_bulk_body_limit_bytes,
            registry,
            metrics,
        }
    }
}
