//! Thin reqwest wrapper shared by the LTA REST client and the file-catalog
//! client, grounded on the bearer-header request shape used throughout the
//! provider clients this crate used to host.

use reqwest::{Method, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;
use tracing::debug;

use crate::auth::{AuthError, ClientCredentialsAuth};

#[derive(Debug, Error)]
pub enum RestError {
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("authentication failed: {0}")]
    Auth(#[from] AuthError),
    #[error("server returned {status}: {body}")]
    Server { status: StatusCode, body: String },
    #[error("failed to decode response shape: {0}")]
    Decode(String),
}

/// A generic bearer-authenticated JSON REST client.
pub struct RestClient {
    http: reqwest::Client,
    base_url: String,
    auth: ClientCredentialsAuth,
}

impl RestClient {
    pub fn new(base_url: String, token_url: String, client_id: String, client_secret: String) -> Self {
        let http = reqwest::Client::new();
        let auth = ClientCredentialsAuth::new(http.clone(), token_url, client_id, client_secret);
        Self { http, base_url, auth }
    }

    async fn send<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: Option<&Value>,
    ) -> Result<T, RestError> {
        let url = format!("{}{}", self.base_url, path);
        let token = self.auth.token().await?;

        debug!(%method, %url, "lta rest request");

        let mut request = self.http.request(method, &url).bearer_auth(token);
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(RestError::Server { status, body });
        }

        Ok(response.json().await?)
    }

    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, RestError> {
        self.send(Method::GET, path, None).await
    }

    pub async fn post<B: Serialize, T: DeserializeOwned>(&self, path: &str, body: &B) -> Result<T, RestError> {
        let value = serde_json::to_value(body).map_err(|e| RestError::Server {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            body: e.to_string(),
        })?;
        self.send(Method::POST, path, Some(&value)).await
    }

    pub async fn patch<B: Serialize, T: DeserializeOwned>(&self, path: &str, body: &B) -> Result<T, RestError> {
        let value = serde_json::to_value(body).map_err(|e| RestError::Server {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            body: e.to_string(),
        })?;
        self.send(Method::PATCH, path, Some(&value)).await
    }

    pub async fn delete(&self, path: &str) -> Result<(), RestError> {
        let url = format!("{}{}", self.base_url, path);
        let token = self.auth.token().await?;

        debug!(%url, "lta rest delete");

        let response = self.http.delete(&url).bearer_auth(token).send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(RestError::Server { status, body });
        }
        Ok(())
    }
}
