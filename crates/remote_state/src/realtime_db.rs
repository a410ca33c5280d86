use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde_json::Value;
use tracing::debug;
use url::Url;

use crate::{path_segments, RemoteStateClient, StoreError};

/// REST client for a Firebase-style realtime database: every key-path maps to
/// `{base}/{path}.json`, read with `GET` and overwritten with `PUT`.
#[derive(Clone)]
pub struct RealtimeDbClient {
    http: Client,
    base_url: Url,
    auth: Option<String>,
    timeout: Duration,
}

impl RealtimeDbClient {
    pub fn new(
        base_url: &str,
        auth: Option<String>,
        timeout: Duration,
    ) -> Result<Self, StoreError> {
        let base_url = Url::parse(base_url.trim())
            .map_err(|e| StoreError::Config(format!("invalid base url '{base_url}': {e}")))?;
        if base_url.cannot_be_a_base() {
            return Err(StoreError::Config(format!(
                "base url '{base_url}' cannot carry a path"
            )));
        }
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| StoreError::Config(e.to_string()))?;
        Ok(Self {
            http,
            base_url,
            auth: auth.filter(|token| !token.trim().is_empty()),
            timeout,
        })
    }

    fn endpoint(&self, path: &str) -> Result<Url, StoreError> {
        let segments = path_segments(path)?;
        let mut url = self.base_url.clone();
        let base_path = url.path().trim_end_matches('/').to_string();
        url.set_path(&format!("{base_path}/{}.json", segments.join("/")));
        url.set_query(None);
        if let Some(token) = &self.auth {
            url.query_pairs_mut().append_pair("auth", token);
        }
        Ok(url)
    }

    fn request_error(&self, err: reqwest::Error) -> StoreError {
        if err.is_timeout() {
            StoreError::Timeout(self.timeout)
        } else {
            StoreError::Transport(err.to_string())
        }
    }

    async fn status_error(response: reqwest::Response) -> StoreError {
        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();
        StoreError::Status { status, body }
    }
}

#[async_trait]
impl RemoteStateClient for RealtimeDbClient {
    async fn get(&self, path: &str) -> Result<Option<Value>, StoreError> {
        let url = self.endpoint(path)?;
        debug!(%path, "realtime db get");
        let response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| self.request_error(e))?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !response.status().is_success() {
            return Err(Self::status_error(response).await);
        }

        let value: Value = response.json().await.map_err(|e| {
            if e.is_timeout() {
                StoreError::Timeout(self.timeout)
            } else {
                StoreError::Decode(e.to_string())
            }
        })?;
        Ok(if value.is_null() { None } else { Some(value) })
    }

    async fn set(&self, path: &str, value: Value) -> Result<(), StoreError> {
        let url = self.endpoint(path)?;
        debug!(%path, "realtime db set");
        let response = self
            .http
            .put(url)
            .json(&value)
            .send()
            .await
            .map_err(|e| self.request_error(e))?;

        if !response.status().is_success() {
            return Err(Self::status_error(response).await);
        }
        Ok(())
    }
}
