use lta_common::Config;
use std::time::Duration;

/// Typed view over the common worker configuration keys, loaded via
/// [`Config::from_env`] with a stage's `expected_config()` unioned in.
pub struct WorkerConfig {
    inner: Config,
}

impl WorkerConfig {
    pub fn load(expected: &[&str]) -> Result<Self, String> {
        let inner = Config::from_env(expected)?;
        Ok(Self { inner })
    }

    pub fn inner(&self) -> &Config {
        &self.inner
    }

    pub fn component_name(&self) -> &str {
        self.inner.get("COMPONENT_NAME")
    }

    pub fn source_site(&self) -> &str {
        self.inner.get("SOURCE_SITE")
    }

    pub fn dest_site(&self) -> &str {
        self.inner.get("DEST_SITE")
    }

    pub fn input_status(&self) -> &str {
        self.inner.get("INPUT_STATUS")
    }

    pub fn output_status(&self) -> &str {
        self.inner.get("OUTPUT_STATUS")
    }

    pub fn lta_rest_url(&self) -> &str {
        self.inner.get("LTA_REST_URL")
    }

    pub fn lta_auth_openid_url(&self) -> &str {
        self.inner.get("LTA_AUTH_OPENID_URL")
    }

    pub fn client_id(&self) -> &str {
        self.inner.get("CLIENT_ID")
    }

    pub fn client_secret(&self) -> &str {
        self.inner.get("CLIENT_SECRET")
    }

    pub fn work_sleep_duration(&self) -> Duration {
        Duration::from_secs(self.inner.get_u64("WORK_SLEEP_DURATION_SECONDS", 60))
    }

    pub fn work_timeout(&self) -> Duration {
        Duration::from_secs(self.inner.get_u64("WORK_TIMEOUT_SECONDS", 30 * 60))
    }

    pub fn work_retries(&self) -> u64 {
        self.inner.get_u64("WORK_RETRIES", 3)
    }

    pub fn run_once_and_die(&self) -> bool {
        self.inner.get_bool("RUN_ONCE_AND_DIE")
    }

    pub fn run_until_no_work(&self) -> bool {
        self.inner.get_bool("RUN_UNTIL_NO_WORK")
    }
}
