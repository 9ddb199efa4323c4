//! Isolation segment manager

use super::gateway::Gateway;
use super::types::{CcPaginated, CcToMany};
use super::{api_endpoint, expect_body, url_with_query};
use crate::error::{CloudFoundryError, Result};
use cfinfra_config::CfConfig;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;

const SEGMENTS_PATH: &str = "/v3/isolation_segments";

/// Isolation segment as returned by the Cloud Controller
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CcSegment {
    pub name: String,
    pub guid: String,
}

/// CRUD and org entitlement for `/v3/isolation_segments`
pub struct SegmentManager {
    gateway: Arc<dyn Gateway>,
    api_endpoint: String,
}

impl SegmentManager {
    pub fn new(config: &CfConfig, gateway: Arc<dyn Gateway>) -> Result<Self> {
        Ok(Self {
            gateway,
            api_endpoint: api_endpoint(config)?,
        })
    }

    pub async fn read_segment(&self, seg_id: &str) -> Result<CcSegment> {
        let url = format!("{}{}/{}", self.api_endpoint, SEGMENTS_PATH, seg_id);
        let value = self.gateway.get_resource(&url).await?;
        Ok(serde_json::from_value(value)?)
    }

    pub async fn create_segment(&self, name: &str) -> Result<CcSegment> {
        let body = self
            .gateway
            .create_resource(&self.api_endpoint, SEGMENTS_PATH, json!({ "name": name }))
            .await?;
        let segment: CcSegment = expect_body(body, SEGMENTS_PATH)?;
        tracing::info!("Created isolation segment {} ({})", segment.name, segment.guid);
        Ok(segment)
    }

    pub async fn update_segment(&self, id: &str, name: &str) -> Result<CcSegment> {
        let path = format!("{}/{}", SEGMENTS_PATH, id);
        let body = self
            .gateway
            .patch_resource(&self.api_endpoint, &path, json!({ "name": name }))
            .await?;
        expect_body(body, &path)
    }

    /// Look a segment up by name
    ///
    /// Names are unique in the Cloud Controller, so only the first page is
    /// read and the first match returned.
    pub async fn find_segment(&self, name: &str) -> Result<CcSegment> {
        let url = url_with_query(&self.api_endpoint, SEGMENTS_PATH, "names", name)?;
        let value = self.gateway.get_resource(&url).await?;
        let page: CcPaginated<CcSegment> = serde_json::from_value(value)?;

        page.resources
            .into_iter()
            .next()
            .ok_or_else(|| CloudFoundryError::NotFound {
                kind: "isolation_segment",
                name: name.to_string(),
            })
    }

    pub async fn delete_segment(&self, id: &str) -> Result<()> {
        let path = format!("{}/{}", SEGMENTS_PATH, id);
        self.gateway.delete_resource(&self.api_endpoint, &path).await?;
        tracing::info!("Deleted isolation segment {}", id);
        Ok(())
    }

    /// Entitle orgs to the segment; does nothing for an empty list
    pub async fn set_segment_orgs(&self, id: &str, orgs: &[String]) -> Result<()> {
        if orgs.is_empty() {
            return Ok(());
        }

        let payload = CcToMany::from_guids(orgs.iter().cloned());
        let path = format!("{}/{}/relationships/organizations", SEGMENTS_PATH, id);
        self.gateway
            .create_resource(&self.api_endpoint, &path, serde_json::to_value(payload)?)
            .await?;
        Ok(())
    }

    /// GUIDs of the orgs entitled to the segment
    pub async fn get_segment_orgs(&self, id: &str) -> Result<Vec<String>> {
        let url = format!(
            "{}{}/{}/relationships/organizations",
            self.api_endpoint, SEGMENTS_PATH, id
        );
        let value = self.gateway.get_resource(&url).await?;
        let orgs: CcToMany = serde_json::from_value(value)?;
        Ok(orgs.guids())
    }

    /// Revoke one org's entitlement
    pub async fn remove_segment_org(&self, id: &str, org: &str) -> Result<()> {
        let path = format!(
            "{}/{}/relationships/organizations/{}",
            SEGMENTS_PATH, id, org
        );
        self.gateway.delete_resource(&self.api_endpoint, &path).await
    }
}
