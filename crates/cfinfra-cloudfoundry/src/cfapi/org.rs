//! Organization manager

use super::gateway::Gateway;
use super::types::CcPaginated;
use super::{api_endpoint, expect_body, url_with_query};
use crate::error::{CloudFoundryError, Result};
use cfinfra_config::CfConfig;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;

const ORGS_PATH: &str = "/v3/organizations";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CcOrg {
    pub guid: String,
    pub name: String,
    #[serde(default)]
    pub suspended: bool,
}

/// CRUD for `/v3/organizations`
pub struct OrgManager {
    gateway: Arc<dyn Gateway>,
    api_endpoint: String,
}

impl OrgManager {
    pub fn new(config: &CfConfig, gateway: Arc<dyn Gateway>) -> Result<Self> {
        Ok(Self {
            gateway,
            api_endpoint: api_endpoint(config)?,
        })
    }

    pub async fn create_org(&self, name: &str) -> Result<CcOrg> {
        let body = self
            .gateway
            .create_resource(&self.api_endpoint, ORGS_PATH, json!({ "name": name }))
            .await?;
        let org: CcOrg = expect_body(body, ORGS_PATH)?;
        tracing::info!("Created org {} ({})", org.name, org.guid);
        Ok(org)
    }

    pub async fn read_org(&self, id: &str) -> Result<CcOrg> {
        let url = format!("{}{}/{}", self.api_endpoint, ORGS_PATH, id);
        let value = self.gateway.get_resource(&url).await?;
        Ok(serde_json::from_value(value)?)
    }

    pub async fn update_org(&self, id: &str, name: &str) -> Result<CcOrg> {
        let path = format!("{}/{}", ORGS_PATH, id);
        let body = self
            .gateway
            .patch_resource(&self.api_endpoint, &path, json!({ "name": name }))
            .await?;
        expect_body(body, &path)
    }

    pub async fn find_org(&self, name: &str) -> Result<CcOrg> {
        let url = url_with_query(&self.api_endpoint, ORGS_PATH, "names", name)?;
        let value = self.gateway.get_resource(&url).await?;
        let page: CcPaginated<CcOrg> = serde_json::from_value(value)?;

        page.resources
            .into_iter()
            .next()
            .ok_or_else(|| CloudFoundryError::NotFound {
                kind: "organization",
                name: name.to_string(),
            })
    }

    /// Deletion runs as an asynchronous job on the Cloud Controller side
    pub async fn delete_org(&self, id: &str) -> Result<()> {
        let path = format!("{}/{}", ORGS_PATH, id);
        self.gateway.delete_resource(&self.api_endpoint, &path).await?;
        tracing::info!("Deleted org {}", id);
        Ok(())
    }
}
