//! Cloud Foundry provider error types

use cfinfra_cloud::CloudError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CloudFoundryError {
    #[error("API endpoint missing from config file")]
    MissingApiEndpoint,

    #[error("{kind} '{name}' not found")]
    NotFound { kind: &'static str, name: String },

    #[error("Cloud Controller returned {status} {title}: {detail}")]
    Api {
        status: u16,
        code: i64,
        title: String,
        detail: String,
    },

    #[error("unexpected response from {url}: {message}")]
    UnexpectedResponse { url: String, message: String },

    #[error("invalid resource id '{0}', expected '<org_guid>/<domain_guid>'")]
    InvalidResourceId(String),

    #[error("invalid URL: {0}")]
    InvalidUrl(String),

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Config error: {0}")]
    Config(#[from] cfinfra_config::ConfigError),

    #[error("Cloud error: {0}")]
    Cloud(#[from] CloudError),
}

impl CloudFoundryError {
    /// True for lookups that came back empty and for HTTP 404
    pub fn is_not_found(&self) -> bool {
        match self {
            CloudFoundryError::NotFound { .. } => true,
            CloudFoundryError::Api { status, .. } => *status == 404,
            _ => false,
        }
    }

    /// True for HTTP 401/403
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, CloudFoundryError::Api { status, .. } if *status == 401 || *status == 403)
    }
}

impl From<CloudFoundryError> for CloudError {
    fn from(err: CloudFoundryError) -> Self {
        match err {
            CloudFoundryError::Cloud(inner) => inner,
            CloudFoundryError::NotFound { .. } => CloudError::ResourceNotFound(err.to_string()),
            CloudFoundryError::MissingApiEndpoint | CloudFoundryError::Config(_) => {
                CloudError::InvalidConfig(err.to_string())
            }
            e if e.is_unauthorized() => CloudError::AuthenticationFailed(e.to_string()),
            e => CloudError::ApiError(e.to_string()),
        }
    }
}

pub type Result<T> = std::result::Result<T, CloudFoundryError>;
