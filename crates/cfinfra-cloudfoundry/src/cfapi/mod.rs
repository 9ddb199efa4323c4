//! Thin managers over the Cloud Controller v3 API
//!
//! Each manager maps one method to one HTTP request: build the path, marshal
//! the payload, delegate to the shared [`Gateway`], unmarshal the response.

pub mod domain;
pub mod gateway;
pub mod org;
pub mod segment;
pub mod session;
pub mod types;

pub use domain::{CcDomain, DomainManager};
pub use gateway::{CloudControllerGateway, Gateway};
pub use org::{CcOrg, OrgManager};
pub use segment::{CcSegment, SegmentManager};
pub use session::Session;

use crate::error::{CloudFoundryError, Result};
use cfinfra_config::CfConfig;
use serde::de::DeserializeOwned;
use serde_json::Value;

/// API endpoint from the config, rejecting an empty one
pub(crate) fn api_endpoint(config: &CfConfig) -> Result<String> {
    let endpoint = config.api_endpoint().trim_end_matches('/');
    if endpoint.is_empty() {
        return Err(CloudFoundryError::MissingApiEndpoint);
    }
    Ok(endpoint.to_string())
}

/// `{endpoint}{path}?{key}={value}` with the value percent-encoded
pub(crate) fn url_with_query(endpoint: &str, path: &str, key: &str, value: &str) -> Result<String> {
    let base = gateway::join_url(endpoint, path);
    reqwest::Url::parse_with_params(&base, &[(key, value)])
        .map(String::from)
        .map_err(|e| CloudFoundryError::InvalidUrl(format!("{base}: {e}")))
}

/// Deserialize a write response that must carry a body
pub(crate) fn expect_body<T: DeserializeOwned>(body: Option<Value>, path: &str) -> Result<T> {
    let value = body.ok_or_else(|| CloudFoundryError::UnexpectedResponse {
        url: path.to_string(),
        message: "empty response body".to_string(),
    })?;
    Ok(serde_json::from_value(value)?)
}
