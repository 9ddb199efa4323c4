//! Session: one gateway shared by all managers

use super::gateway::{CloudControllerGateway, Gateway};
use super::{DomainManager, OrgManager, SegmentManager, api_endpoint, url_with_query};
use crate::error::Result;
use cfinfra_config::CfConfig;
use std::sync::Arc;

pub struct Session {
    api_endpoint: String,
    gateway: Arc<dyn Gateway>,
    segments: SegmentManager,
    orgs: OrgManager,
    domains: DomainManager,
}

impl Session {
    /// Connect to the Cloud Controller described by `config`
    pub fn new(config: &CfConfig) -> Result<Self> {
        // Validate before building an HTTP client for nothing
        api_endpoint(config)?;
        let gateway = Arc::new(CloudControllerGateway::new(config)?);
        Self::with_gateway(config, gateway)
    }

    /// Build a session on top of any gateway
    pub fn with_gateway(config: &CfConfig, gateway: Arc<dyn Gateway>) -> Result<Self> {
        Ok(Self {
            api_endpoint: api_endpoint(config)?,
            segments: SegmentManager::new(config, gateway.clone())?,
            orgs: OrgManager::new(config, gateway.clone())?,
            domains: DomainManager::new(config, gateway.clone())?,
            gateway,
        })
    }

    pub fn api_endpoint(&self) -> &str {
        &self.api_endpoint
    }

    pub fn segment_manager(&self) -> &SegmentManager {
        &self.segments
    }

    pub fn org_manager(&self) -> &OrgManager {
        &self.orgs
    }

    pub fn domain_manager(&self) -> &DomainManager {
        &self.domains
    }

    /// One authenticated request to confirm the token is accepted
    pub async fn check_auth(&self) -> Result<()> {
        let url = url_with_query(&self.api_endpoint, "/v3/organizations", "per_page", "1")?;
        self.gateway.get_resource(&url).await?;
        Ok(())
    }
}
