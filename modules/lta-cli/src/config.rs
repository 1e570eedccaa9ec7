//! The handful of environment variables this CLI needs to reach `lta-rest`,
//! read directly rather than through [`lta_common::Config::from_env`] —
//! that loader enforces the full worker contract (`COMPONENT_NAME`,
//! `INPUT_STATUS`, and the rest), which has no meaning for an operator
//! command invoked by hand.

use std::env;

const KEYS: &[&str] = &["LTA_REST_URL", "LTA_AUTH_OPENID_URL", "CLIENT_ID", "CLIENT_SECRET"];

pub struct CliConfig {
    pub lta_rest_url: String,
    pub lta_auth_openid_url: String,
    pub client_id: String,
    pub client_secret: String,
}

impl CliConfig {
    pub fn load() -> anyhow::Result<Self> {
        let _ = dotenvy::dotenv();
        Ok(Self {
            lta_rest_url: required("LTA_REST_URL")?,
            lta_auth_openid_url: required("LTA_AUTH_OPENID_URL")?,
            client_id: required("CLIENT_ID")?,
            client_secret: required("CLIENT_SECRET")?,
        })
    }

    pub fn client(&self) -> lta_client::LtaClient {
        lta_client::LtaClient::new(
            self.lta_rest_url.clone(),
            self.lta_auth_openid_url.clone(),
            self.client_id.clone(),
            self.client_secret.clone(),
        )
    }

    /// `{key: value}` view for `display-config`, secrets redacted.
    pub fn as_display_map(&self) -> serde_json::Value {
        serde_json::json!({
            "LTA_REST_URL": self.lta_rest_url,
            "LTA_AUTH_OPENID_URL": self.lta_auth_openid_url,
            "CLIENT_ID": self.client_id,
            "CLIENT_SECRET": "<redacted>",
        })
    }
}

fn required(key: &str) -> anyhow::Result<String> {
    env::var(key).map_err(|_| anyhow::anyhow!("missing expected configuration parameter: '{key}' (expected one of {KEYS:?})"))
}
