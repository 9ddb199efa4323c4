//! Reader for the Cloud Foundry CLI configuration (`~/.cf/config.json`)
//!
//! `cf login` writes the API endpoint and a bearer token to this file. The
//! provider reuses them instead of running its own OAuth flow.

use crate::error::{ConfigError, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Environment variable overriding the API endpoint from config.json
pub const ENV_API: &str = "CF_API";
/// Environment variable overriding the access token from config.json
pub const ENV_ACCESS_TOKEN: &str = "CF_ACCESS_TOKEN";
/// Same meaning as for the cf CLI: directory containing `.cf/`
pub const ENV_CF_HOME: &str = "CF_HOME";

/// Connection settings for the Cloud Controller
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CfConfig {
    /// Cloud Controller API endpoint, e.g. `https://api.sys.example.com`
    pub api_endpoint: String,
    /// Access token, with or without the `bearer ` prefix
    pub access_token: String,
    pub refresh_token: Option<String>,
    /// Skip TLS certificate validation (`cf api --skip-ssl-validation`)
    pub ssl_disabled: bool,
}

/// Subset of the cf CLI config.json we care about
#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct RawCfConfig {
    #[serde(default)]
    target: String,
    #[serde(default)]
    access_token: String,
    #[serde(default)]
    refresh_token: String,
    #[serde(default, rename = "SSLDisabled")]
    ssl_disabled: bool,
}

impl CfConfig {
    pub fn new(api_endpoint: impl Into<String>, access_token: impl Into<String>) -> Self {
        Self {
            api_endpoint: api_endpoint.into(),
            access_token: access_token.into(),
            refresh_token: None,
            ssl_disabled: false,
        }
    }

    /// Path of the cf CLI config file, honouring `CF_HOME`
    pub fn default_path() -> Result<PathBuf> {
        let home = match std::env::var_os(ENV_CF_HOME) {
            Some(dir) => PathBuf::from(dir),
            None => dirs::home_dir().ok_or(ConfigError::HomeDirNotFound)?,
        };
        Ok(home.join(".cf").join("config.json"))
    }

    /// Load config.json from the default location and apply env overrides
    pub fn load() -> Result<Self> {
        let path = Self::default_path()?;
        if !path.exists() {
            // Fully env-driven setups (CI) don't need a config file
            if let (Ok(api), Ok(token)) = (std::env::var(ENV_API), std::env::var(ENV_ACCESS_TOKEN))
            {
                tracing::debug!("No cf config at {}, using environment", path.display());
                return Ok(Self::new(api, token));
            }
            return Err(ConfigError::CfConfigNotFound(path));
        }

        let mut config = Self::load_from(&path)?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Load config.json from an explicit path, without env overrides
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let raw: RawCfConfig =
            serde_json::from_str(&content).map_err(|source| ConfigError::Parse {
                path: path.to_path_buf(),
                source,
            })?;

        tracing::debug!("Loaded cf config from {}", path.display());
        Ok(Self {
            api_endpoint: raw.target.trim_end_matches('/').to_string(),
            access_token: raw.access_token,
            refresh_token: Some(raw.refresh_token).filter(|t| !t.is_empty()),
            ssl_disabled: raw.ssl_disabled,
        })
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(api) = std::env::var(ENV_API) {
            self.api_endpoint = api.trim_end_matches('/').to_string();
        }
        if let Ok(token) = std::env::var(ENV_ACCESS_TOKEN) {
            self.access_token = token;
        }
    }

    /// API endpoint without trailing slash
    pub fn api_endpoint(&self) -> &str {
        &self.api_endpoint
    }

    /// Token without the `bearer ` prefix the cf CLI stores
    pub fn bearer_token(&self) -> &str {
        let token = self.access_token.trim();
        match token.split_once(' ') {
            Some((scheme, rest)) if scheme.eq_ignore_ascii_case("bearer") => rest.trim(),
            _ => token,
        }
    }

    pub fn has_token(&self) -> bool {
        !self.bearer_token().is_empty()
    }
}
