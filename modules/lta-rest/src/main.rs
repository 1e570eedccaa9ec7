use std::sync::Arc;

use anyhow::Result;
use lta_common::config::RestConfig;
use tracing::info;
use tracing_subscriber::EnvFilter;

use lta_rest::{build_router, state::AppState};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("lta=info".parse()?))
        .init();

    let config = RestConfig::from_env().map_err(|e| anyhow::anyhow!(e))?;
    config.log_redacted();

    let pool = lta_store::connect_and_migrate(&config.database_url).await?;
    let store = lta_store::Store::new(pool);
    let state = Arc::new(AppState::new(store, &config));

    let app = build_router(state);

    let addr = format!("{}:{}", config.host, config.port);
    info!("LTA REST service starting on {addr}");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
