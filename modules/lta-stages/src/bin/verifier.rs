use std::env;

use anyhow::{anyhow, Result};
use lta_client::LtaClient;
use lta_stages::transport::{GlobusTransport, GridFtpTransport, HpssTransport, WebDavTransport};
use lta_stages::verifier::Verifier;
use lta_worker::{Worker, WorkerConfig};
use prometheus::Registry;
use tracing_subscriber::EnvFilter;

/// Verifies against whichever backend moved the bundle there, chosen via
/// `VERIFIER_TRANSPORT` the same way `replicator`'s is.
#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("lta=info".parse()?))
        .init();

    let config = WorkerConfig::load(&[
        "VERIFIER_TRANSPORT",
        "FILE_CATALOG_REST_URL",
        "FILE_CATALOG_CLIENT_ID",
        "FILE_CATALOG_CLIENT_SECRET",
    ])
    .map_err(|e| anyhow!(e))?;
    config.inner().log_redacted();

    let client = LtaClient::new(
        config.lta_rest_url().to_string(),
        config.lta_auth_openid_url().to_string(),
        config.client_id().to_string(),
        config.client_secret().to_string(),
    );
    let registry = Registry::new();

    match config.inner().get("VERIFIER_TRANSPORT") {
        "webdav" => {
            let base_url = env::var("WEBDAV_BASE_URL").map_err(|_| anyhow!("WEBDAV_BASE_URL is required"))?;
            let max_parallel: usize = env::var("MAX_PARALLEL").ok().and_then(|v| v.parse().ok()).unwrap_or(4);
            let stage = Verifier::new(WebDavTransport::new(base_url, max_parallel));
            let mut worker = Worker::new(config, client, stage, &registry);
            worker.run_forever().await
        }
        "globus" => {
            let stage = Verifier::new(GlobusTransport::new(
                env::var("GLOBUS_TRANSFER_API_BASE").map_err(|_| anyhow!("GLOBUS_TRANSFER_API_BASE is required"))?,
                env::var("GLOBUS_SOURCE_ENDPOINT").map_err(|_| anyhow!("GLOBUS_SOURCE_ENDPOINT is required"))?,
                env::var("GLOBUS_DEST_ENDPOINT").map_err(|_| anyhow!("GLOBUS_DEST_ENDPOINT is required"))?,
                env::var("GLOBUS_BEARER_TOKEN").map_err(|_| anyhow!("GLOBUS_BEARER_TOKEN is required"))?,
            ));
            let mut worker = Worker::new(config, client, stage, &registry);
            worker.run_forever().await
        }
        "gridftp" => {
            let stage = Verifier::new(GridFtpTransport::new(
                env::var("GRIDFTP_REMOTE_HOST").map_err(|_| anyhow!("GRIDFTP_REMOTE_HOST is required"))?,
            ));
            let mut worker = Worker::new(config, client, stage, &registry);
            worker.run_forever().await
        }
        "hpss" => {
            let stage = Verifier::new(HpssTransport::new(
                env::var("HSI_BINARY").unwrap_or_else(|_| "hsi".to_string()),
            ));
            let mut worker = Worker::new(config, client, stage, &registry);
            worker.run_forever().await
        }
        other => Err(anyhow!("unrecognized VERIFIER_TRANSPORT '{other}'")),
    }
}
