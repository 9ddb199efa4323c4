//! Provider trait definition

use crate::action::{ApplyResult, Plan};
use crate::error::Result;
use crate::state::ProviderState;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Declarative resource provider
///
/// The host owns the definitions and the state file; a provider turns the
/// difference between them into API calls. Every method that changes remote
/// objects also updates the `ProviderState` it is handed so the host can
/// persist it afterwards.
#[async_trait]
pub trait CloudProvider: Send + Sync {
    /// Provider name used as state key prefix (e.g. "cloudfoundry")
    fn name(&self) -> &str;

    fn display_name(&self) -> &str;

    /// Resource types this provider understands
    fn resource_types(&self) -> &[&'static str];

    /// Check that the configured credentials are accepted
    async fn check_auth(&self) -> Result<AuthStatus>;

    /// Re-read every resource in `state` from the remote API
    ///
    /// Resources that no longer exist remotely are dropped from the result.
    async fn refresh(&self, state: &ProviderState) -> Result<ProviderState>;

    /// Compute the actions turning `current` into `desired`
    async fn plan(&self, desired: &ResourceSet, current: &ProviderState) -> Result<Plan>;

    /// Apply a plan, recording successful actions in `state`
    async fn apply(&self, plan: &Plan, state: &mut ProviderState) -> Result<ApplyResult>;

    /// Destroy one resource by address
    async fn destroy(&self, address: &str, state: &mut ProviderState) -> Result<()>;

    /// Destroy everything recorded in `state`, dependents first
    async fn destroy_all(&self, state: &mut ProviderState) -> Result<ApplyResult>;
}

/// Authentication status
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthStatus {
    pub authenticated: bool,

    /// Account/endpoint information if available
    pub account_info: Option<String>,

    pub error: Option<String>,
}

impl AuthStatus {
    pub fn ok(account_info: impl Into<String>) -> Self {
        Self {
            authenticated: true,
            account_info: Some(account_info.into()),
            error: None,
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            authenticated: false,
            account_info: None,
            error: Some(error.into()),
        }
    }
}

/// Desired resources, keyed by address
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ResourceSet {
    pub resources: BTreeMap<String, ResourceConfig>,
}

impl ResourceSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a resource; returns false if the address was already taken
    pub fn add(&mut self, resource: ResourceConfig) -> bool {
        let address = resource.address();
        if self.resources.contains_key(&address) {
            return false;
        }
        self.resources.insert(address, resource);
        true
    }

    pub fn get(&self, resource_type: &str, name: &str) -> Option<&ResourceConfig> {
        self.resources.get(&format!("{}.{}", resource_type, name))
    }

    pub fn get_address(&self, address: &str) -> Option<&ResourceConfig> {
        self.resources.get(address)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ResourceConfig> {
        self.resources.values()
    }

    pub fn by_type(&self, resource_type: &str) -> Vec<&ResourceConfig> {
        self.resources
            .values()
            .filter(|r| r.resource_type == resource_type)
            .collect()
    }

    pub fn len(&self) -> usize {
        self.resources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }
}

/// One resource from the definitions
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResourceConfig {
    /// Resource type (e.g. "cloudfoundry_isolation_segment")
    pub resource_type: String,

    /// Name given in the definitions
    pub name: String,

    pub provider: String,

    /// Resource-specific configuration
    pub config: serde_json::Value,
}

impl ResourceConfig {
    pub fn new(
        resource_type: impl Into<String>,
        name: impl Into<String>,
        provider: impl Into<String>,
        config: serde_json::Value,
    ) -> Self {
        Self {
            resource_type: resource_type.into(),
            name: name.into(),
            provider: provider.into(),
            config,
        }
    }

    /// Resource address (`type.name`)
    pub fn address(&self) -> String {
        format!("{}.{}", self.resource_type, self.name)
    }

    pub fn get_config<T: serde::de::DeserializeOwned>(&self, key: &str) -> Option<T> {
        self.config
            .get(key)
            .and_then(|v| serde_json::from_value(v.clone()).ok())
    }
}
