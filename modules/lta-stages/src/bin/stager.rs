use anyhow::Result;
use lta_client::LtaClient;
use lta_worker::{StageHandler, Worker, WorkerConfig};
use prometheus::Registry;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("lta=info".parse()?))
        .init();

    let stage = lta_stages::stager::Stager;
    let config = WorkerConfig::load(stage.expected_config()).map_err(|e| anyhow::anyhow!(e))?;
    config.inner().log_redacted();

    let client = LtaClient::new(
        config.lta_rest_url().to_string(),
        config.lta_auth_openid_url().to_string(),
        config.client_id().to_string(),
        config.client_secret().to_string(),
    );

    let registry = Registry::new();
    let mut worker = Worker::new(config, client, stage, &registry);
    worker.run_forever().await
}
