//! Domain manager: private domains and sharing them with other orgs

use super::gateway::{Gateway, join_url};
use super::types::{CcPaginated, CcToMany, CcToOne};
use super::{api_endpoint, expect_body, url_with_query};
use crate::error::{CloudFoundryError, Result};
use cfinfra_config::CfConfig;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;

const DOMAINS_PATH: &str = "/v3/domains";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CcDomain {
    pub guid: String,
    pub name: String,
    #[serde(default)]
    pub internal: bool,
    #[serde(default)]
    pub relationships: CcDomainRelationships,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CcDomainRelationships {
    /// Owning org; empty for shared domains
    #[serde(default)]
    pub organization: CcToOne,
    #[serde(default)]
    pub shared_organizations: CcToMany,
}

impl CcDomain {
    pub fn owner_guid(&self) -> Option<&str> {
        self.relationships
            .organization
            .data
            .as_ref()
            .map(|g| g.guid.as_str())
    }

    pub fn is_private(&self) -> bool {
        self.owner_guid().is_some()
    }

    pub fn is_shared_with(&self, org_id: &str) -> bool {
        self.relationships.shared_organizations.contains(org_id)
    }
}

/// Identifier of a private domain access: `<org_guid>/<domain_guid>`
pub fn access_id(org_id: &str, domain_id: &str) -> String {
    format!("{}/{}", org_id, domain_id)
}

/// Split an access identifier into `(org_guid, domain_guid)`
pub fn parse_access_id(id: &str) -> Result<(String, String)> {
    match id.split_once('/') {
        Some((org, domain)) if !org.is_empty() && !domain.is_empty() && !domain.contains('/') => {
            Ok((org.to_string(), domain.to_string()))
        }
        _ => Err(CloudFoundryError::InvalidResourceId(id.to_string())),
    }
}

/// Domains under `/v3/domains`
pub struct DomainManager {
    gateway: Arc<dyn Gateway>,
    api_endpoint: String,
}

impl DomainManager {
    pub fn new(config: &CfConfig, gateway: Arc<dyn Gateway>) -> Result<Self> {
        Ok(Self {
            gateway,
            api_endpoint: api_endpoint(config)?,
        })
    }

    pub async fn read_domain(&self, id: &str) -> Result<CcDomain> {
        let url = format!("{}{}/{}", self.api_endpoint, DOMAINS_PATH, id);
        let value = self.gateway.get_resource(&url).await?;
        Ok(serde_json::from_value(value)?)
    }

    pub async fn find_domain(&self, name: &str) -> Result<CcDomain> {
        let url = url_with_query(&self.api_endpoint, DOMAINS_PATH, "names", name)?;
        let value = self.gateway.get_resource(&url).await?;
        let page: CcPaginated<CcDomain> = serde_json::from_value(value)?;

        page.resources
            .into_iter()
            .next()
            .ok_or_else(|| CloudFoundryError::NotFound {
                kind: "domain",
                name: name.to_string(),
            })
    }

    /// Create a domain owned by `org_id`
    pub async fn create_private_domain(&self, name: &str, org_id: &str) -> Result<CcDomain> {
        let payload = json!({
            "name": name,
            "internal": false,
            "relationships": {
                "organization": { "data": { "guid": org_id } }
            }
        });
        let body = self
            .gateway
            .create_resource(&self.api_endpoint, DOMAINS_PATH, payload)
            .await?;
        let domain: CcDomain = expect_body(body, DOMAINS_PATH)?;
        tracing::info!("Created private domain {} ({})", domain.name, domain.guid);
        Ok(domain)
    }

    pub async fn delete_domain(&self, id: &str) -> Result<()> {
        let path = format!("{}/{}", DOMAINS_PATH, id);
        self.gateway.delete_resource(&self.api_endpoint, &path).await?;
        tracing::info!("Deleted domain {}", id);
        Ok(())
    }

    /// First shared (org-less, non-internal) domain; usually the apps domain
    pub async fn default_shared_domain(&self) -> Result<CcDomain> {
        let url = join_url(&self.api_endpoint, DOMAINS_PATH);
        for value in self.gateway.list_resources(&url).await? {
            let domain: CcDomain = serde_json::from_value(value)?;
            if !domain.is_private() && !domain.internal {
                return Ok(domain);
            }
        }
        Err(CloudFoundryError::NotFound {
            kind: "shared_domain",
            name: "default".to_string(),
        })
    }

    /// Whether the private domain is shared with the org
    pub async fn has_private_domain_access(&self, org_id: &str, domain_id: &str) -> Result<bool> {
        let domain = self.read_domain(domain_id).await?;
        Ok(domain.is_shared_with(org_id))
    }

    /// Share the private domain with the org
    pub async fn create_private_domain_access(&self, org_id: &str, domain_id: &str) -> Result<()> {
        let path = format!(
            "{}/{}/relationships/shared_organizations",
            DOMAINS_PATH, domain_id
        );
        let payload = CcToMany::from_guids([org_id]);
        self.gateway
            .create_resource(&self.api_endpoint, &path, serde_json::to_value(payload)?)
            .await?;
        tracing::info!("Shared domain {} with org {}", domain_id, org_id);
        Ok(())
    }

    /// Stop sharing the private domain with the org
    pub async fn delete_private_domain_access(&self, org_id: &str, domain_id: &str) -> Result<()> {
        let path = format!(
            "{}/{}/relationships/shared_organizations/{}",
            DOMAINS_PATH, domain_id, org_id
        );
        self.gateway.delete_resource(&self.api_endpoint, &path).await?;
        tracing::info!("Unshared domain {} from org {}", domain_id, org_id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_access_id_roundtrip() {
        let id = access_id("org-guid", "domain-guid");
        assert_eq!(id, "org-guid/domain-guid");
        assert_eq!(
            parse_access_id(&id).unwrap(),
            ("org-guid".to_string(), "domain-guid".to_string())
        );
    }

    #[test]
    fn test_parse_access_id_rejects_malformed() {
        for bad in ["", "no-slash", "/domain", "org/", "a/b/c"] {
            assert!(
                matches!(
                    parse_access_id(bad),
                    Err(CloudFoundryError::InvalidResourceId(_))
                ),
                "{bad} should be rejected"
            );
        }
    }

    #[test]
    fn test_domain_relationships_deserialize() {
        let domain: CcDomain = serde_json::from_value(json!({
            "guid": "d1",
            "name": "private.apps.example.com",
            "internal": false,
            "relationships": {
                "organization": { "data": { "guid": "org1" } },
                "shared_organizations": { "data": [{ "guid": "org2" }] }
            }
        }))
        .unwrap();

        assert_eq!(domain.owner_guid(), Some("org1"));
        assert!(domain.is_shared_with("org2"));
        assert!(!domain.is_shared_with("org3"));

        let shared: CcDomain = serde_json::from_value(json!({
            "guid": "d2",
            "name": "apps.example.com",
            "relationships": { "organization": { "data": null } }
        }))
        .unwrap();
        assert!(!shared.is_private());
    }
}
