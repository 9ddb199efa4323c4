//! HTTP gateway to the Cloud Controller
//!
//! Managers build paths and typed payloads; the gateway sends them and maps
//! the Cloud Controller error envelope into `CloudFoundryError::Api`.

use crate::cfapi::types::CcErrorEnvelope;
use crate::error::{CloudFoundryError, Result};
use async_trait::async_trait;
use cfinfra_config::CfConfig;
use reqwest::header::ACCEPT;
use reqwest::{RequestBuilder, StatusCode};
use serde_json::Value;
use std::time::Duration;

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// Transport used by every manager
///
/// Read calls take a full URL (they may carry query strings or come from a
/// `pagination.next.href`); write calls take the API endpoint and a path.
#[async_trait]
pub trait Gateway: Send + Sync {
    async fn get_resource(&self, url: &str) -> Result<Value>;

    /// POST `body`; returns the response body if there was one
    async fn create_resource(&self, endpoint: &str, path: &str, body: Value)
    -> Result<Option<Value>>;

    /// PATCH `body`; returns the response body if there was one
    async fn patch_resource(&self, endpoint: &str, path: &str, body: Value)
    -> Result<Option<Value>>;

    async fn delete_resource(&self, endpoint: &str, path: &str) -> Result<()>;

    /// Collect `resources` from every page, following `pagination.next.href`
    async fn list_resources(&self, url: &str) -> Result<Vec<Value>> {
        let mut resources = Vec::new();
        let mut next = Some(url.to_string());

        while let Some(page_url) = next {
            let page = self.get_resource(&page_url).await?;
            if let Some(items) = page.get("resources").and_then(Value::as_array) {
                resources.extend(items.iter().cloned());
            }
            next = page
                .pointer("/pagination/next/href")
                .and_then(Value::as_str)
                .map(str::to_string);
        }

        Ok(resources)
    }
}

/// Join an API endpoint and an absolute path
pub fn join_url(endpoint: &str, path: &str) -> String {
    format!("{}{}", endpoint.trim_end_matches('/'), path)
}

/// `Gateway` backed by reqwest, authenticating with the cf CLI token
pub struct CloudControllerGateway {
    client: reqwest::Client,
    token: String,
}

impl CloudControllerGateway {
    pub fn new(config: &CfConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(DEFAULT_TIMEOUT)
            .user_agent(concat!("cfinfra/", env!("CARGO_PKG_VERSION")))
            .danger_accept_invalid_certs(config.ssl_disabled)
            .build()?;

        if config.ssl_disabled {
            tracing::warn!("TLS certificate validation is disabled for {}", config.api_endpoint);
        }

        Ok(Self {
            client,
            token: config.bearer_token().to_string(),
        })
    }

    async fn send(&self, request: RequestBuilder, url: &str) -> Result<Option<Value>> {
        let response = request
            .bearer_auth(&self.token)
            .header(ACCEPT, "application/json")
            .send()
            .await?;

        let status = response.status();
        let body = response.bytes().await?;

        if !status.is_success() {
            return Err(api_error(status, &body));
        }

        if body.iter().all(u8::is_ascii_whitespace) {
            return Ok(None);
        }

        serde_json::from_slice(&body)
            .map(Some)
            .map_err(|e| CloudFoundryError::UnexpectedResponse {
                url: url.to_string(),
                message: e.to_string(),
            })
    }
}

#[async_trait]
impl Gateway for CloudControllerGateway {
    async fn get_resource(&self, url: &str) -> Result<Value> {
        tracing::debug!("GET {}", url);
        self.send(self.client.get(url), url)
            .await?
            .ok_or_else(|| CloudFoundryError::UnexpectedResponse {
                url: url.to_string(),
                message: "empty response body".to_string(),
            })
    }

    async fn create_resource(
        &self,
        endpoint: &str,
        path: &str,
        body: Value,
    ) -> Result<Option<Value>> {
        let url = join_url(endpoint, path);
        tracing::debug!("POST {}", url);
        self.send(self.client.post(&url).json(&body), &url).await
    }

    async fn patch_resource(
        &self,
        endpoint: &str,
        path: &str,
        body: Value,
    ) -> Result<Option<Value>> {
        let url = join_url(endpoint, path);
        tracing::debug!("PATCH {}", url);
        self.send(self.client.patch(&url).json(&body), &url).await
    }

    async fn delete_resource(&self, endpoint: &str, path: &str) -> Result<()> {
        let url = join_url(endpoint, path);
        tracing::debug!("DELETE {}", url);
        self.send(self.client.delete(&url), &url).await?;
        Ok(())
    }
}

/// Build an `Api` error from a non-2xx response
fn api_error(status: StatusCode, body: &[u8]) -> CloudFoundryError {
    let envelope: CcErrorEnvelope = serde_json::from_slice(body).unwrap_or_default();

    match envelope.errors.into_iter().next() {
        Some(entry) => CloudFoundryError::Api {
            status: status.as_u16(),
            code: entry.code,
            title: entry.title,
            detail: entry.detail,
        },
        None => CloudFoundryError::Api {
            status: status.as_u16(),
            code: 0,
            title: status.canonical_reason().unwrap_or("Unknown").to_string(),
            detail: String::from_utf8_lossy(body).chars().take(200).collect(),
        },
    }
}
