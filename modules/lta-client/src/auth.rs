//! OAuth2 client-credentials token acquisition, mirroring the original's
//! `rest_tools.client.ClientCredentialsAuth`: fetch a bearer token from the
//! configured OpenID token endpoint and cache it until shortly before expiry.

use std::sync::Mutex;
use std::time::{Duration, Instant};

use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("token request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("token endpoint returned status {0}")]
    Status(reqwest::StatusCode),
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default = "default_expires_in")]
    expires_in: u64,
}

fn default_expires_in() -> u64 {
    3600
}

/// Refresh this many seconds before the token's reported expiry, so a
/// request started just before expiry doesn't race a 401.
const EXPIRY_MARGIN_SECONDS: u64 = 30;

struct CachedToken {
    access_token: String,
    expires_at: Instant,
}

/// Fetches and caches a client-credentials bearer token.
pub struct ClientCredentialsAuth {
    http: reqwest::Client,
    token_url: String,
    client_id: String,
    client_secret: String,
    cached: Mutex<Option<CachedToken>>,
}

impl ClientCredentialsAuth {
    pub fn new(http: reqwest::Client, token_url: String, client_id: String, client_secret: String) -> Self {
        Self {
            http,
            token_url,
            client_id,
            client_secret,
            cached: Mutex::new(None),
        }
    }

    /// Return a valid bearer token, fetching a fresh one if the cached copy
    /// is absent or within `EXPIRY_MARGIN_SECONDS` of expiring.
    pub async fn token(&self) -> Result<String, AuthError> {
        if let Some(token) = self.cached_if_fresh() {
            return Ok(token);
        }

        let response = self
            .http
            .post(&self.token_url)
            .form(&[
                ("grant_type", "client_credentials"),
                ("client_id", self.client_id.as_str()),
                ("client_secret", self.client_secret.as_str()),
            ])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(AuthError::Status(response.status()));
        }

        let parsed: TokenResponse = response.json().await?;
        let expires_at = Instant::now() + Duration::from_secs(parsed.expires_in);
        let token = parsed.access_token.clone();

        *self.cached.lock().unwrap() = Some(CachedToken {
            access_token: parsed.access_token,
            expires_at,
        });

        Ok(token)
    }

    fn cached_if_fresh(&self) -> Option<String> {
        let guard = self.cached.lock().unwrap();
        let cached = guard.as_ref()?;
        let margin = Duration::from_secs(EXPIRY_MARGIN_SECONDS);
        if Instant::now() + margin < cached.expires_at {
            Some(cached.access_token.clone())
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn auth() -> ClientCredentialsAuth {
        ClientCredentialsAuth::new(
            reqwest::Client::new(),
            "https://example.test/token".to_string(),
            "client-id".to_string(),
            "client-secret".to_string(),
        )
    }

    #[test]
    fn no_cached_token_is_not_fresh() {
        assert!(auth().cached_if_fresh().is_none());
    }

    #[test]
    fn token_within_margin_of_expiry_is_not_fresh() {
        let a = auth();
        *a.cached.lock().unwrap() = Some(CachedToken {
            access_token: "abc".to_string(),
            expires_at: Instant::now() + Duration::from_secs(EXPIRY_MARGIN_SECONDS - 1),
        });
        assert!(a.cached_if_fresh().is_none());
    }

    #[test]
    fn token_well_before_expiry_is_fresh() {
        let a = auth();
        *a.cached.lock().unwrap() = Some(CachedToken {
            access_token: "abc".to_string(),
            expires_at: Instant::now() + Duration::from_secs(3600),
        });
        assert_eq!(a.cached_if_fresh(), Some("abc".to_string()));
    }
}
