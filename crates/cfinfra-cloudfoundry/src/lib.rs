//! Cloud Foundry provider for cfinfra
//!
//! Implements [`CloudProvider`](cfinfra_cloud::CloudProvider) on top of the
//! Cloud Controller v3 API.
//!
//! # Resources
//!
//! - `cloudfoundry_org`: organizations
//! - `cloudfoundry_domain`: private domains owned by an org
//! - `cloudfoundry_isolation_segment`: isolation segments and their entitled orgs
//! - `cloudfoundry_private_domain_access`: sharing a private domain with another org
//!
//! # Requirements
//!
//! A logged-in cf CLI (`cf login`), or `CF_API` and `CF_ACCESS_TOKEN` set in
//! the environment.
//!
//! # Example
//!
//! ```ignore
//! use cfinfra_cloud::CloudProvider;
//! use cfinfra_cloudfoundry::CloudFoundryProvider;
//! use cfinfra_config::CfConfig;
//!
//! let provider = CloudFoundryProvider::from_config(&CfConfig::load()?)?;
//!
//! let auth = provider.check_auth().await?;
//! if !auth.authenticated {
//!     panic!("Not authenticated: {:?}", auth.error);
//! }
//!
//! let segment = provider
//!     .session()
//!     .segment_manager()
//!     .find_segment("production")
//!     .await?;
//! ```

pub mod cfapi;
pub mod error;
pub mod planner;
pub mod provider;
pub mod resource;

pub use cfapi::{
    CcDomain, CcOrg, CcSegment, CloudControllerGateway, DomainManager, Gateway, OrgManager,
    SegmentManager, Session,
};
pub use error::{CloudFoundryError, Result};
pub use provider::CloudFoundryProvider;
pub use resource::{
    AccessSpec, DomainSpec, OrgSpec, PROVIDER_NAME, Reference, ResourceSpec, SegmentSpec,
};
