use std::collections::BTreeMap;
use std::env;

/// Configuration keys required of every worker component, mirroring the
/// original `COMMON_CONFIG` table: every key here plus each stage's
/// `expected_config()` must resolve to a non-empty value or the component
/// refuses to start.
pub const COMMON_CONFIG_KEYS: &[&str] = &[
    "CLIENT_ID",
    "CLIENT_SECRET",
    "COMPONENT_NAME",
    "DEST_SITE",
    "INPUT_STATUS",
    "LOG_LEVEL",
    "LTA_AUTH_OPENID_URL",
    "LTA_REST_URL",
    "OUTPUT_STATUS",
    "PROMETHEUS_METRICS_PORT",
    "RUN_ONCE_AND_DIE",
    "RUN_UNTIL_NO_WORK",
    "SOURCE_SITE",
    "WORK_RETRIES",
    "WORK_SLEEP_DURATION_SECONDS",
    "WORK_TIMEOUT_SECONDS",
];

/// Config keys whose values must never be logged verbatim.
fn is_secret_key(name: &str) -> bool {
    name.ends_with("CLIENT_SECRET") || name.ends_with("FILE_CATALOG_CLIENT_SECRET")
}

/// A resolved, validated configuration map for a single process.
///
/// Required keys missing or empty is a hard startup failure, and every
/// resolved key/value pair is logged once at startup with secrets redacted.
#[derive(Debug, Clone)]
pub struct Config {
    values: BTreeMap<String, String>,
}

impl Config {
    /// Load configuration for a worker component: validates `COMMON_CONFIG_KEYS`
    /// plus `expected` (the stage's additional keys) are all present and
    /// non-empty in the process environment.
    pub fn from_env(expected: &[&str]) -> Result<Self, String> {
        let mut values = BTreeMap::new();
        let mut required: Vec<&str> = COMMON_CONFIG_KEYS.to_vec();
        required.extend_from_slice(expected);
        for name in required {
            let value = env::var(name).unwrap_or_default();
            if value.is_empty() {
                return Err(format!("missing expected configuration parameter: '{name}'"));
            }
            values.insert(name.to_string(), value);
        }
        Ok(Self { values })
    }

    /// Build a `Config` from an explicit map, skipping the environment — used
    /// by tests and by `lta-rest`'s own `EXPECTED_CONFIG` validation.
    pub fn from_map(map: BTreeMap<String, String>) -> Self {
        Self { values: map }
    }

    pub fn get(&self, key: &str) -> &str {
        self.values.get(key).map(String::as_str).unwrap_or("")
    }

    pub fn get_opt(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    pub fn get_bool(&self, key: &str) -> bool {
        matches!(self.get(key).to_lowercase().as_str(), "true" | "1" | "yes")
    }

    pub fn get_u64(&self, key: &str, default: u64) -> u64 {
        self.get(key).parse().unwrap_or(default)
    }

    pub fn get_f64(&self, key: &str, default: f64) -> f64 {
        self.get(key).parse().unwrap_or(default)
    }

    /// Log every configured key/value, redacting secret-shaped keys, the
    /// way every component logs its resolved configuration once at startup.
    pub fn log_redacted(&self) {
        for (name, value) in &self.values {
            if is_secret_key(name) {
                tracing::info!("{name} = <redacted>");
            } else {
                tracing::info!("{name} = {value}");
            }
        }
    }
}

fn required_env(key: &str) -> Result<String, String> {
    env::var(key).map_err(|_| format!("{key} environment variable is required"))
}

/// Configuration for the REST service itself (not a worker component).
#[derive(Debug, Clone)]
pub struct RestConfig {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    pub auth_secret: String,
    pub auth_issuer: String,
    pub metadata_bulk_body_limit_bytes: usize,
}

impl RestConfig {
    pub fn from_env() -> Result<Self, String> {
        Ok(Self {
            host: env::var("LTA_REST_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: env::var("LTA_REST_PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .map_err(|_| "LTA_REST_PORT must be a number".to_string())?,
            database_url: required_env("LTA_DATABASE_URL")?,
            auth_secret: required_env("LTA_AUTH_SECRET")?,
            auth_issuer: env::var("LTA_AUTH_ISSUER").unwrap_or_else(|_| "lta".to_string()),
            metadata_bulk_body_limit_bytes: env::var("LTA_BULK_BODY_LIMIT_BYTES")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(12 * 1024 * 1024),
        })
    }

    pub fn log_redacted(&self) {
        tracing::info!("LTA_REST_HOST = {}", self.host);
        tracing::info!("LTA_REST_PORT = {}", self.port);
        tracing::info!("LTA_DATABASE_URL = <redacted>");
        tracing::info!("LTA_AUTH_SECRET = <redacted>");
        tracing::info!("LTA_AUTH_ISSUER = {}", self.auth_issuer);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_required_key_is_an_error() {
        let err = Config::from_env(&["SOME_NONEXISTENT_KEY_XYZ"]).unwrap_err();
        assert!(err.contains("SOME_NONEXISTENT_KEY_XYZ") || err.contains("CLIENT_ID"));
    }

    #[test]
    fn redacts_client_secret_keys() {
        assert!(is_secret_key("CLIENT_SECRET"));
        assert!(is_secret_key("FILE_CATALOG_CLIENT_SECRET"));
        assert!(!is_secret_key("CLIENT_ID"));
        assert!(!is_secret_key("DEST_SITE"));
    }
}
