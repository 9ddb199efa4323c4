//! Resource types understood by the Cloud Foundry provider

use cfinfra_cloud::{CloudError, ProviderState, ResourceConfig};
use serde::{Deserialize, Serialize};

pub const PROVIDER_NAME: &str = "cloudfoundry";

pub const ORG: &str = "cloudfoundry_org";
pub const DOMAIN: &str = "cloudfoundry_domain";
pub const ISOLATION_SEGMENT: &str = "cloudfoundry_isolation_segment";
pub const PRIVATE_DOMAIN_ACCESS: &str = "cloudfoundry_private_domain_access";

/// All resource types in dependency order
pub const RESOURCE_TYPES: [&str; 4] = [ORG, DOMAIN, ISOLATION_SEGMENT, PRIVATE_DOMAIN_ACCESS];

/// Position in dependency order; unknown types sort last
pub fn dependency_rank(resource_type: &str) -> usize {
    RESOURCE_TYPES
        .iter()
        .position(|t| *t == resource_type)
        .unwrap_or(RESOURCE_TYPES.len())
}

/// Pointer to another object: a managed resource by name, or a literal GUID
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Reference {
    Resource(String),
    Guid(String),
}

impl Reference {
    /// Address of the referenced resource, if it is a managed one
    pub fn address(&self, target_type: &str) -> Option<String> {
        match self {
            Reference::Resource(name) => Some(format!("{}.{}", target_type, name)),
            Reference::Guid(_) => None,
        }
    }

    /// GUID this reference points at, given the current state
    pub fn resolve(&self, target_type: &str, state: &ProviderState) -> Option<String> {
        match self {
            Reference::Guid(guid) => Some(guid.clone()),
            Reference::Resource(name) => state
                .get(&format!("{}.{}", target_type, name))
                .map(|r| r.id.clone()),
        }
    }
}

impl std::fmt::Display for Reference {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Reference::Resource(name) => write!(f, "{}", name),
            Reference::Guid(guid) => write!(f, "guid:{}", guid),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrgSpec {
    pub name: String,
}

/// Private domain owned by `org`; the full name is `sub_domain.domain`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DomainSpec {
    #[serde(default)]
    pub sub_domain: Option<String>,
    pub domain: String,
    pub org: Reference,
}

impl DomainSpec {
    pub fn full_name(&self) -> String {
        match &self.sub_domain {
            Some(sub) if !sub.is_empty() => format!("{}.{}", sub, self.domain),
            _ => self.domain.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SegmentSpec {
    pub name: String,
    #[serde(default)]
    pub orgs: Vec<Reference>,
}

/// Sharing of a private `domain` with `org`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessSpec {
    pub domain: Reference,
    pub org: Reference,
}

/// Typed view of a `ResourceConfig`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResourceSpec {
    Org(OrgSpec),
    Domain(DomainSpec),
    IsolationSegment(SegmentSpec),
    PrivateDomainAccess(AccessSpec),
}

impl ResourceSpec {
    pub fn resource_type(&self) -> &'static str {
        match self {
            ResourceSpec::Org(_) => ORG,
            ResourceSpec::Domain(_) => DOMAIN,
            ResourceSpec::IsolationSegment(_) => ISOLATION_SEGMENT,
            ResourceSpec::PrivateDomainAccess(_) => PRIVATE_DOMAIN_ACCESS,
        }
    }

    pub fn from_config(resource: &ResourceConfig) -> cfinfra_cloud::Result<Self> {
        let config = resource.config.clone();
        let spec = match resource.resource_type.as_str() {
            ORG => ResourceSpec::Org(serde_json::from_value(config)?),
            DOMAIN => ResourceSpec::Domain(serde_json::from_value(config)?),
            ISOLATION_SEGMENT => ResourceSpec::IsolationSegment(serde_json::from_value(config)?),
            PRIVATE_DOMAIN_ACCESS => {
                ResourceSpec::PrivateDomainAccess(serde_json::from_value(config)?)
            }
            other => return Err(CloudError::UnsupportedResourceType(other.to_string())),
        };
        Ok(spec)
    }

    pub fn to_config(&self, name: impl Into<String>) -> cfinfra_cloud::Result<ResourceConfig> {
        let config = match self {
            ResourceSpec::Org(spec) => serde_json::to_value(spec)?,
            ResourceSpec::Domain(spec) => serde_json::to_value(spec)?,
            ResourceSpec::IsolationSegment(spec) => serde_json::to_value(spec)?,
            ResourceSpec::PrivateDomainAccess(spec) => serde_json::to_value(spec)?,
        };
        Ok(ResourceConfig::new(
            self.resource_type(),
            name,
            PROVIDER_NAME,
            config,
        ))
    }

    /// Outgoing references as `(target type, reference)`
    pub fn references(&self) -> Vec<(&'static str, &Reference)> {
        match self {
            ResourceSpec::Org(_) => Vec::new(),
            ResourceSpec::Domain(spec) => vec![(ORG, &spec.org)],
            ResourceSpec::IsolationSegment(spec) => spec.orgs.iter().map(|r| (ORG, r)).collect(),
            ResourceSpec::PrivateDomainAccess(spec) => vec![(DOMAIN, &spec.domain), (ORG, &spec.org)],
        }
    }
}
