//! Cloud Foundry provider implementation

use crate::cfapi::Session;
use crate::cfapi::domain::{access_id, parse_access_id};
use crate::error::Result;
use crate::planner::{
    self, ATTR_DOMAIN_GUID, ATTR_NAME, ATTR_ORG_GUID, ATTR_ORG_GUIDS, DETAIL_CONFIG,
};
use crate::resource::{
    DOMAIN, ISOLATION_SEGMENT, ORG, PRIVATE_DOMAIN_ACCESS, PROVIDER_NAME, RESOURCE_TYPES,
    Reference, ResourceSpec, dependency_rank,
};
use async_trait::async_trait;
use cfinfra_cloud::{
    Action, ActionType, ApplyResult, AuthStatus, CloudError, CloudProvider, Plan, ProviderState,
    ResourceConfig, ResourceSet, ResourceState, ResourceStatus,
};
use cfinfra_config::CfConfig;
use serde_json::{Value, json};
use std::cmp::Reverse;
use std::collections::{BTreeSet, HashSet};
use std::time::Instant;

/// Provider for orgs, private domains, domain sharing and isolation segments
pub struct CloudFoundryProvider {
    session: Session,
}

impl CloudFoundryProvider {
    pub fn new(session: Session) -> Self {
        Self { session }
    }

    pub fn from_config(config: &CfConfig) -> Result<Self> {
        Ok(Self::new(Session::new(config)?))
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Create the remote object for a Create/Replace action and record it
    async fn create(&self, action: &Action, state: &mut ProviderState) -> Result<String> {
        let address = action.address();
        let spec = action_spec(action)?;

        match spec {
            ResourceSpec::Org(org) => {
                let created = self.session.org_manager().create_org(&org.name).await?;
                state.add(
                    address.clone(),
                    ResourceState::new(&created.guid, ORG)
                        .with_status(ResourceStatus::Ready)
                        .with_attribute(ATTR_NAME, json!(created.name)),
                );
                Ok(format!("created {} ({})", address, created.guid))
            }
            ResourceSpec::Domain(domain) => {
                let org_guid = resolve(&address, ORG, &domain.org, state)?;
                let created = self
                    .session
                    .domain_manager()
                    .create_private_domain(&domain.full_name(), &org_guid)
                    .await?;
                state.add(
                    address.clone(),
                    ResourceState::new(&created.guid, DOMAIN)
                        .with_status(ResourceStatus::Ready)
                        .with_attribute(ATTR_NAME, json!(created.name))
                        .with_attribute(ATTR_ORG_GUID, json!(org_guid)),
                );
                Ok(format!("created {} ({})", address, created.guid))
            }
            ResourceSpec::IsolationSegment(segment) => {
                let org_guids = sorted(resolve_all(&address, ORG, &segment.orgs, state)?);
                let segments = self.session.segment_manager();
                let created = segments.create_segment(&segment.name).await?;

                // Recorded before entitling orgs so a failure leaves a tainted
                // entry instead of an untracked segment
                state.add(
                    address.clone(),
                    ResourceState::new(&created.guid, ISOLATION_SEGMENT)
                        .with_status(ResourceStatus::Tainted)
                        .with_attribute(ATTR_NAME, json!(created.name))
                        .with_attribute(ATTR_ORG_GUIDS, json!(Vec::<String>::new())),
                );
                segments.set_segment_orgs(&created.guid, &org_guids).await?;

                if let Some(recorded) = state.get_mut(&address) {
                    recorded.status = ResourceStatus::Ready;
                    recorded.set_attribute(ATTR_ORG_GUIDS, json!(org_guids));
                }
                Ok(format!("created {} ({})", address, created.guid))
            }
            ResourceSpec::PrivateDomainAccess(access) => {
                let domain_guid = resolve(&address, DOMAIN, &access.domain, state)?;
                let org_guid = resolve(&address, ORG, &access.org, state)?;
                self.session
                    .domain_manager()
                    .create_private_domain_access(&org_guid, &domain_guid)
                    .await?;

                let id = access_id(&org_guid, &domain_guid);
                state.add(
                    address.clone(),
                    ResourceState::new(&id, PRIVATE_DOMAIN_ACCESS)
                        .with_status(ResourceStatus::Ready)
                        .with_attribute(ATTR_DOMAIN_GUID, json!(domain_guid))
                        .with_attribute(ATTR_ORG_GUID, json!(org_guid)),
                );
                Ok(format!("created {} ({})", address, id))
            }
        }
    }

    /// In-place update; only orgs and isolation segments support it
    async fn update(&self, action: &Action, state: &mut ProviderState) -> Result<String> {
        let address = action.address();
        let spec = action_spec(action)?;
        let existing = state
            .get(&address)
            .cloned()
            .ok_or_else(|| CloudError::ResourceNotFound(address.clone()))?;

        match spec {
            ResourceSpec::Org(org) => {
                let updated = self
                    .session
                    .org_manager()
                    .update_org(&existing.id, &org.name)
                    .await?;
                if let Some(recorded) = state.get_mut(&address) {
                    recorded.set_attribute(ATTR_NAME, json!(updated.name));
                }
            }
            ResourceSpec::IsolationSegment(segment) => {
                let wanted: BTreeSet<String> = resolve_all(&address, ORG, &segment.orgs, state)?
                    .into_iter()
                    .collect();
                let segments = self.session.segment_manager();

                if existing.get_attribute::<String>(ATTR_NAME).as_deref()
                    != Some(segment.name.as_str())
                {
                    segments.update_segment(&existing.id, &segment.name).await?;
                }

                let entitled: BTreeSet<String> = segments
                    .get_segment_orgs(&existing.id)
                    .await?
                    .into_iter()
                    .collect();
                let added: Vec<String> = wanted.difference(&entitled).cloned().collect();
                segments.set_segment_orgs(&existing.id, &added).await?;
                for org in entitled.difference(&wanted) {
                    segments.remove_segment_org(&existing.id, org).await?;
                }

                if let Some(recorded) = state.get_mut(&address) {
                    recorded.set_attribute(ATTR_NAME, json!(segment.name));
                    recorded.set_attribute(ATTR_ORG_GUIDS, json!(wanted));
                }
            }
            other => {
                return Err(CloudError::InvalidConfig(format!(
                    "{} cannot be updated in place",
                    other.resource_type()
                ))
                .into());
            }
        }

        Ok(format!("updated {}", address))
    }

    /// Delete the remote object behind a state entry
    ///
    /// An org is first revoked from every recorded segment that entitles it.
    async fn delete_recorded(
        &self,
        recorded: &ResourceState,
        state: &mut ProviderState,
    ) -> Result<()> {
        if recorded.resource_type == ORG {
            self.revoke_segment_entitlements(&recorded.id, state).await?;
        }
        self.delete_remote(&recorded.resource_type, &recorded.id).await
    }

    async fn revoke_segment_entitlements(
        &self,
        org_guid: &str,
        state: &mut ProviderState,
    ) -> Result<()> {
        let entitling: Vec<(String, String)> = state
            .iter()
            .filter(|(_, recorded)| recorded.resource_type == ISOLATION_SEGMENT)
            .filter(|(_, recorded)| {
                recorded
                    .get_attribute::<Vec<String>>(ATTR_ORG_GUIDS)
                    .is_some_and(|orgs| orgs.iter().any(|o| o == org_guid))
            })
            .map(|(address, recorded)| (address.clone(), recorded.id.clone()))
            .collect();

        let segments = self.session.segment_manager();
        for (address, segment_id) in entitling {
            tracing::info!("Revoking {} from {} before deleting it", org_guid, address);
            match segments.remove_segment_org(&segment_id, org_guid).await {
                Err(e) if !e.is_not_found() => return Err(e),
                _ => {}
            }
            if let Some(recorded) = state.get_mut(&address) {
                let mut orgs: Vec<String> =
                    recorded.get_attribute(ATTR_ORG_GUIDS).unwrap_or_default();
                orgs.retain(|o| o != org_guid);
                recorded.set_attribute(ATTR_ORG_GUIDS, json!(orgs));
            }
        }
        Ok(())
    }

    /// Delete a remote object; one that is already gone counts as deleted
    async fn delete_remote(&self, resource_type: &str, id: &str) -> Result<()> {
        let result = match resource_type {
            ORG => self.session.org_manager().delete_org(id).await,
            DOMAIN => self.session.domain_manager().delete_domain(id).await,
            ISOLATION_SEGMENT => self.delete_segment(id).await,
            PRIVATE_DOMAIN_ACCESS => {
                let (org, domain) = parse_access_id(id)?;
                self.session
                    .domain_manager()
                    .delete_private_domain_access(&org, &domain)
                    .await
            }
            other => return Err(CloudError::UnsupportedResourceType(other.to_string()).into()),
        };

        match result {
            Err(e) if e.is_not_found() => {
                tracing::info!("{} {} is already gone", resource_type, id);
                Ok(())
            }
            other => other,
        }
    }

    /// The Cloud Controller refuses to delete a segment with entitled orgs
    async fn delete_segment(&self, id: &str) -> Result<()> {
        let segments = self.session.segment_manager();
        for org in segments.get_segment_orgs(id).await? {
            segments.remove_segment_org(id, &org).await?;
        }
        segments.delete_segment(id).await
    }

    /// Current remote view of a recorded resource; `None` if it disappeared
    async fn read_remote(&self, recorded: &ResourceState) -> Result<Option<ResourceState>> {
        let mut current = recorded.clone();

        match recorded.resource_type.as_str() {
            ORG => {
                let org = self.session.org_manager().read_org(&recorded.id).await?;
                sync_attribute(&mut current, ATTR_NAME, json!(org.name));
            }
            DOMAIN => {
                let domain = self.session.domain_manager().read_domain(&recorded.id).await?;
                sync_attribute(&mut current, ATTR_NAME, json!(domain.name));
                sync_attribute(&mut current, ATTR_ORG_GUID, json!(domain.owner_guid()));
            }
            ISOLATION_SEGMENT => {
                let segments = self.session.segment_manager();
                let segment = segments.read_segment(&recorded.id).await?;
                let orgs = segments.get_segment_orgs(&recorded.id).await?;
                sync_attribute(&mut current, ATTR_NAME, json!(segment.name));
                sync_attribute(&mut current, ATTR_ORG_GUIDS, json!(sorted(orgs)));
            }
            PRIVATE_DOMAIN_ACCESS => {
                let (org, domain) = parse_access_id(&recorded.id)?;
                let shared = self
                    .session
                    .domain_manager()
                    .has_private_domain_access(&org, &domain)
                    .await?;
                if !shared {
                    return Ok(None);
                }
            }
            other => {
                tracing::warn!("Not refreshing unknown resource type {}", other);
            }
        }

        Ok(Some(current))
    }
}

#[async_trait]
impl CloudProvider for CloudFoundryProvider {
    fn name(&self) -> &str {
        PROVIDER_NAME
    }

    fn display_name(&self) -> &str {
        "Cloud Foundry"
    }

    fn resource_types(&self) -> &[&'static str] {
        &RESOURCE_TYPES
    }

    async fn check_auth(&self) -> cfinfra_cloud::Result<AuthStatus> {
        match self.session.check_auth().await {
            Ok(()) => Ok(AuthStatus::ok(self.session.api_endpoint())),
            Err(e) if e.is_unauthorized() => Ok(AuthStatus::failed(format!(
                "token rejected by {}, run `cf login` again",
                self.session.api_endpoint()
            ))),
            Err(e) => Ok(AuthStatus::failed(e.to_string())),
        }
    }

    async fn refresh(&self, state: &ProviderState) -> cfinfra_cloud::Result<ProviderState> {
        let mut refreshed = ProviderState::new();

        for (address, recorded) in state.iter() {
            match self.read_remote(recorded).await {
                Ok(Some(current)) => refreshed.add(address.clone(), current),
                Ok(None) => {
                    tracing::info!("{} no longer exists, dropping it from state", address);
                }
                Err(e) if e.is_not_found() => {
                    tracing::info!("{} no longer exists, dropping it from state", address);
                }
                Err(e) => return Err(e.into()),
            }
        }

        Ok(refreshed)
    }

    async fn plan(
        &self,
        desired: &ResourceSet,
        current: &ProviderState,
    ) -> cfinfra_cloud::Result<Plan> {
        planner::plan(desired, current)
    }

    async fn apply(
        &self,
        plan: &Plan,
        state: &mut ProviderState,
    ) -> cfinfra_cloud::Result<ApplyResult> {
        let mut result = ApplyResult::new();
        let start = Instant::now();

        // Replacements whose delete half failed must not be recreated
        let mut blocked: HashSet<String> = HashSet::new();

        let mut removals: Vec<&Action> = plan
            .actions
            .iter()
            .filter(|a| matches!(a.action_type, ActionType::Delete | ActionType::Replace))
            .collect();
        removals.sort_by_key(|a| Reverse(dependency_rank(&a.resource_type)));

        for action in removals {
            let address = action.address();
            let Some(existing) = state.get(&address).cloned() else {
                if action.action_type == ActionType::Delete {
                    result.add_success(action.id.clone(), format!("{} already absent", address));
                }
                continue;
            };

            tracing::info!("Destroying {}", address);
            match self.delete_recorded(&existing, state).await {
                Ok(()) => {
                    state.remove(&address);
                    if action.action_type == ActionType::Delete {
                        result.add_success(action.id.clone(), format!("destroyed {}", address));
                    }
                }
                Err(e) => {
                    blocked.insert(action.id.clone());
                    result.add_failure(action.id.clone(), e.to_string());
                }
            }
        }

        let mut changes: Vec<&Action> = plan
            .actions
            .iter()
            .filter(|a| {
                matches!(
                    a.action_type,
                    ActionType::Create | ActionType::Update | ActionType::Replace
                )
            })
            .collect();
        changes.sort_by_key(|a| dependency_rank(&a.resource_type));

        for action in changes {
            if blocked.contains(&action.id) {
                continue;
            }

            tracing::info!("Applying {} to {}", action.action_type, action.address());
            let outcome = match action.action_type {
                ActionType::Update => self.update(action, state).await,
                _ => self.create(action, state).await,
            };
            match outcome {
                Ok(message) => result.add_success(action.id.clone(), message),
                Err(e) => {
                    tracing::warn!("{} failed: {}", action.id, e);
                    result.add_failure(action.id.clone(), e.to_string());
                }
            }
        }

        result.duration_ms = start.elapsed().as_millis() as u64;
        Ok(result)
    }

    async fn destroy(&self, address: &str, state: &mut ProviderState) -> cfinfra_cloud::Result<()> {
        let existing = state
            .get(address)
            .cloned()
            .ok_or_else(|| CloudError::ResourceNotFound(address.to_string()))?;

        self.delete_recorded(&existing, state).await?;
        state.remove(address);
        Ok(())
    }

    async fn destroy_all(&self, state: &mut ProviderState) -> cfinfra_cloud::Result<ApplyResult> {
        let mut result = ApplyResult::new();
        let start = Instant::now();

        let mut entries: Vec<(String, ResourceState)> = state
            .iter()
            .map(|(address, recorded)| (address.clone(), recorded.clone()))
            .collect();
        entries.sort_by_key(|(address, recorded)| {
            (Reverse(dependency_rank(&recorded.resource_type)), address.clone())
        });

        for (address, recorded) in entries {
            let action_id = format!("{}-{}", ActionType::Delete, address);
            match self.delete_recorded(&recorded, state).await {
                Ok(()) => {
                    state.remove(&address);
                    result.add_success(action_id, format!("destroyed {}", address));
                }
                Err(e) => result.add_failure(action_id, e.to_string()),
            }
        }

        result.duration_ms = start.elapsed().as_millis() as u64;
        Ok(result)
    }
}

/// Typed spec of the configuration carried by a planned action
fn action_spec(action: &Action) -> cfinfra_cloud::Result<ResourceSpec> {
    let config: Value = action.detail(DETAIL_CONFIG).ok_or_else(|| {
        CloudError::InvalidConfig(format!("action {} carries no configuration", action.id))
    })?;
    ResourceSpec::from_config(&ResourceConfig::new(
        &action.resource_type,
        &action.resource_name,
        PROVIDER_NAME,
        config,
    ))
}

fn resolve(
    address: &str,
    target_type: &str,
    reference: &Reference,
    state: &ProviderState,
) -> cfinfra_cloud::Result<String> {
    reference
        .resolve(target_type, state)
        .ok_or_else(|| CloudError::UnresolvedReference {
            address: address.to_string(),
            reference: reference
                .address(target_type)
                .unwrap_or_else(|| reference.to_string()),
        })
}

fn resolve_all(
    address: &str,
    target_type: &str,
    references: &[Reference],
    state: &ProviderState,
) -> cfinfra_cloud::Result<Vec<String>> {
    references
        .iter()
        .map(|r| resolve(address, target_type, r, state))
        .collect()
}

/// Sorted and without repeats
fn sorted(mut guids: Vec<String>) -> Vec<String> {
    guids.sort();
    guids.dedup();
    guids
}

fn sync_attribute(state: &mut ResourceState, key: &str, value: Value) {
    if state.attributes.get(key) != Some(&value) {
        state.set_attribute(key, value);
    }
}
