//! Shared JSON-over-HTTP plumbing for the node and indexer facades.

use crate::RpcError;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::Duration;

/// Thin JSON HTTP client bound to one base URL.
#[derive(Clone, Debug)]
pub struct HttpClient {
    client: Client,
    base_url: String,
}

impl HttpClient {
    /// Create a client for `base_url` with conservative timeouts.
    ///
    /// # Errors
    ///
    /// `Http` when the underlying client cannot be constructed.
    pub fn new(base_url: impl Into<String>) -> Result<Self, RpcError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .connect_timeout(Duration::from_secs(5))
            .build()
            .map_err(RpcError::Http)?;

        let mut base_url = base_url.into();
        while base_url.ends_with('/') {
            base_url.pop();
        }

        Ok(Self { client, base_url })
    }

    /// The base URL this client is bound to.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// GET `path` (with optional query pairs) and parse the JSON body.
    pub async fn get<R: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<R, RpcError> {
        let url = format!("{}{}", self.base_url, path);
        let response = self
            .client
            .get(&url)
            .query(query)
            .send()
            .await
            .map_err(|e| Self::classify(e, &url))?;
        Self::parse(response).await
    }

    /// POST a JSON `body` to `path` and parse the JSON response.
    pub async fn post<B: Serialize + ?Sized, R: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
        body: &B,
    ) -> Result<R, RpcError> {
        let url = format!("{}{}", self.base_url, path);
        let response = self
            .client
            .post(&url)
            .query(query)
            .json(body)
            .send()
            .await
            .map_err(|e| Self::classify(e, &url))?;
        Self::parse(response).await
    }

    fn classify(error: reqwest::Error, url: &str) -> RpcError {
        if error.is_connect() {
            RpcError::Connection(format!("Cannot connect to {}", url))
        } else {
            RpcError::Http(error)
        }
    }

    async fn parse<R: DeserializeOwned>(response: reqwest::Response) -> Result<R, RpcError> {
        let status = response.status();
        let text = response.text().await.map_err(RpcError::Http)?;

        if text.trim().is_empty() {
            return Err(RpcError::EmptyResponse);
        }

        if !status.is_success() {
            return Err(RpcError::Protocol(Self::error_message(&text)));
        }

        serde_json::from_str(&text).map_err(|e| RpcError::Parse(e.to_string()))
    }

    /// Node errors come back as a JSON array of `{kind, id, msg?}` records;
    /// fall back to the raw body when the shape is unfamiliar.
    fn error_message(body: &str) -> String {
        if let Ok(errors) = serde_json::from_str::<Vec<serde_json::Value>>(body) {
            let ids: Vec<String> = errors
                .iter()
                .filter_map(|e| {
                    e.get("msg")
                        .or_else(|| e.get("id"))
                        .and_then(|v| v.as_str())
                        .map(String::from)
                })
                .collect();
            if !ids.is_empty() {
                return ids.join("; ");
            }
        }
        body.chars().take(512).collect()
    }
}
