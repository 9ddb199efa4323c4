//! Diff between definitions and state
//!
//! The plan lists deletes first (dependents before their dependencies), then
//! creates, updates and replacements in dependency order.

use crate::resource::{DOMAIN, ORG, Reference, ResourceSpec, dependency_rank};
use cfinfra_cloud::{
    Action, ActionType, CloudError, Plan, ProviderState, ResourceConfig, ResourceSet,
    ResourceState, ResourceStatus, Result,
};
use serde_json::json;
use std::collections::{BTreeSet, HashSet};

pub(crate) const ATTR_NAME: &str = "name";
pub(crate) const ATTR_ORG_GUID: &str = "org_guid";
pub(crate) const ATTR_ORG_GUIDS: &str = "org_guids";
pub(crate) const ATTR_DOMAIN_GUID: &str = "domain_guid";

/// Detail keys carried by planned actions
pub(crate) const DETAIL_CONFIG: &str = "config";
pub(crate) const DETAIL_CHANGES: &str = "changes";
pub(crate) const DETAIL_ID: &str = "id";

pub fn plan(desired: &ResourceSet, current: &ProviderState) -> Result<Plan> {
    let mut specs = Vec::with_capacity(desired.len());
    for resource in desired.iter() {
        let spec = ResourceSpec::from_config(resource)?;
        for (target_type, reference) in spec.references() {
            if let Some(target) = reference.address(target_type) {
                if desired.get_address(&target).is_none() {
                    return Err(CloudError::UnresolvedReference {
                        address: resource.address(),
                        reference: target,
                    });
                }
            }
        }
        specs.push((resource, spec));
    }
    specs.sort_by(|(a, _), (b, _)| {
        dependency_rank(&a.resource_type)
            .cmp(&dependency_rank(&b.resource_type))
            .then_with(|| a.name.cmp(&b.name))
    });

    let mut actions = Vec::new();

    let mut orphans: Vec<(&String, &ResourceState)> = current
        .iter()
        .filter(|(address, _)| desired.get_address(address).is_none())
        .collect();
    orphans.sort_by(|(a, ra), (b, rb)| {
        dependency_rank(&rb.resource_type)
            .cmp(&dependency_rank(&ra.resource_type))
            .then_with(|| a.cmp(b))
    });
    for (address, existing) in orphans {
        let name = address
            .split_once('.')
            .map(|(_, name)| name)
            .unwrap_or(address.as_str());
        actions.push(
            Action::new(
                ActionType::Delete,
                &existing.resource_type,
                name,
                format!("{} will be destroyed", address),
            )
            .with_detail(DETAIL_ID, json!(existing.id)),
        );
    }

    // Addresses whose GUID will change during this apply
    let mut pending: HashSet<String> = HashSet::new();

    for (resource, spec) in &specs {
        let address = resource.address();
        let action = match current.get(&address) {
            None => new_action(ActionType::Create, resource, format!("{} will be created", address)),
            Some(existing) if existing.status == ResourceStatus::Tainted => new_action(
                ActionType::Replace,
                resource,
                format!("{} is tainted and will be replaced", address),
            )
            .with_detail(DETAIL_ID, json!(existing.id)),
            Some(existing) => {
                let changes = diff(spec, existing, current, &pending);
                if changes.is_empty() {
                    new_action(ActionType::NoOp, resource, format!("{} is up to date", address))
                } else {
                    let action_type = if forces_replacement(spec) {
                        ActionType::Replace
                    } else {
                        ActionType::Update
                    };
                    new_action(
                        action_type,
                        resource,
                        format!("{} will be {}d ({})", address, action_type, changes.join(", ")),
                    )
                    .with_detail(DETAIL_ID, json!(existing.id))
                    .with_detail(DETAIL_CHANGES, json!(changes))
                }
            }
        };

        if matches!(action.action_type, ActionType::Create | ActionType::Replace) {
            pending.insert(address);
        }
        actions.push(action);
    }

    Ok(Plan::new(actions))
}

fn new_action(action_type: ActionType, resource: &ResourceConfig, description: String) -> Action {
    Action::new(action_type, &resource.resource_type, &resource.name, description)
        .with_detail(DETAIL_CONFIG, resource.config.clone())
}

/// Domains and accesses have no mutable attributes on the Cloud Controller
fn forces_replacement(spec: &ResourceSpec) -> bool {
    matches!(
        spec,
        ResourceSpec::Domain(_) | ResourceSpec::PrivateDomainAccess(_)
    )
}

/// Changed fields between the definition and the recorded state
fn diff(
    spec: &ResourceSpec,
    existing: &ResourceState,
    current: &ProviderState,
    pending: &HashSet<String>,
) -> Vec<&'static str> {
    // None when the target is being (re)created in this plan
    let resolve = |target_type: &str, reference: &Reference| -> Option<String> {
        if let Some(address) = reference.address(target_type) {
            if pending.contains(&address) {
                return None;
            }
        }
        reference.resolve(target_type, current)
    };
    let attribute = |key: &str| existing.get_attribute::<String>(key);
    let differs = |key: &str, desired: Option<String>| desired.is_none() || attribute(key) != desired;

    let mut changes = Vec::new();
    match spec {
        ResourceSpec::Org(org) => {
            if differs(ATTR_NAME, Some(org.name.clone())) {
                changes.push("name");
            }
        }
        ResourceSpec::Domain(domain) => {
            if differs(ATTR_NAME, Some(domain.full_name())) {
                changes.push("name");
            }
            if differs(ATTR_ORG_GUID, resolve(ORG, &domain.org)) {
                changes.push("org");
            }
        }
        ResourceSpec::IsolationSegment(segment) => {
            if differs(ATTR_NAME, Some(segment.name.clone())) {
                changes.push("name");
            }
            let wanted: Option<BTreeSet<String>> =
                segment.orgs.iter().map(|r| resolve(ORG, r)).collect();
            let recorded: BTreeSet<String> = existing
                .get_attribute::<Vec<String>>(ATTR_ORG_GUIDS)
                .unwrap_or_default()
                .into_iter()
                .collect();
            if wanted.as_ref() != Some(&recorded) {
                changes.push("orgs");
            }
        }
        ResourceSpec::PrivateDomainAccess(access) => {
            if differs(ATTR_DOMAIN_GUID, resolve(DOMAIN, &access.domain)) {
                changes.push("domain");
            }
            if differs(ATTR_ORG_GUID, resolve(ORG, &access.org)) {
                changes.push("org");
            }
        }
    }

    changes
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resource::{
        AccessSpec, DomainSpec, ISOLATION_SEGMENT, OrgSpec, PRIVATE_DOMAIN_ACCESS, SegmentSpec,
    };

    fn org(name: &str) -> ResourceConfig {
        ResourceSpec::Org(OrgSpec {
            name: name.to_string(),
        })
        .to_config(name)
        .unwrap()
    }

    fn access(name: &str, domain: &str, org: &str) -> ResourceConfig {
        ResourceSpec::PrivateDomainAccess(AccessSpec {
            domain: Reference::Resource(domain.to_string()),
            org: Reference::Resource(org.to_string()),
        })
        .to_config(name)
        .unwrap()
    }

    fn domain(name: &str, org: &str) -> ResourceConfig {
        ResourceSpec::Domain(DomainSpec {
            sub_domain: Some(name.to_string()),
            domain: "apps.example.com".to_string(),
            org: Reference::Resource(org.to_string()),
        })
        .to_config(name)
        .unwrap()
    }

    fn ready(id: &str, resource_type: &str) -> ResourceState {
        ResourceState::new(id, resource_type).with_status(ResourceStatus::Ready)
    }

    fn applied_state() -> ProviderState {
        let mut state = ProviderState::new();
        for (name, guid) in [("org1", "g-org1"), ("org2", "g-org2"), ("org3", "g-org3")] {
            state.add(
                format!("{}.{}", ORG, name),
                ready(guid, ORG).with_attribute(ATTR_NAME, json!(name)),
            );
        }
        state.add(
            format!("{}.private", DOMAIN),
            ready("g-domain", DOMAIN)
                .with_attribute(ATTR_NAME, json!("private.apps.example.com"))
                .with_attribute(ATTR_ORG_GUID, json!("g-org1")),
        );
        state.add(
            format!("{}.access-to-org", PRIVATE_DOMAIN_ACCESS),
            ready("g-org2/g-domain", PRIVATE_DOMAIN_ACCESS)
                .with_attribute(ATTR_DOMAIN_GUID, json!("g-domain"))
                .with_attribute(ATTR_ORG_GUID, json!("g-org2")),
        );
        state
    }

    fn desired(resources: Vec<ResourceConfig>) -> ResourceSet {
        let mut set = ResourceSet::new();
        for r in resources {
            set.add(r);
        }
        set
    }

    #[test]
    fn test_plan_from_empty_state_creates_in_dependency_order() {
        let set = desired(vec![
            access("access-to-org", "private", "org2"),
            domain("private", "org1"),
            org("org2"),
            org("org1"),
        ]);

        let plan = plan(&set, &ProviderState::new()).unwrap();
        let order: Vec<String> = plan.actions.iter().map(|a| a.address()).collect();
        assert_eq!(
            order,
            vec![
                "cloudfoundry_org.org1",
                "cloudfoundry_org.org2",
                "cloudfoundry_domain.private",
                "cloudfoundry_private_domain_access.access-to-org",
            ]
        );
        assert_eq!(plan.summary().create, 4);
    }

    #[test]
    fn test_plan_without_changes_is_noop() {
        let set = desired(vec![
            org("org1"),
            org("org2"),
            org("org3"),
            domain("private", "org1"),
            access("access-to-org", "private", "org2"),
        ]);

        let plan = plan(&set, &applied_state()).unwrap();
        assert!(!plan.has_changes, "{:?}", plan.actions);
    }

    #[test]
    fn test_plan_changing_access_org_replaces() {
        let set = desired(vec![
            org("org1"),
            org("org2"),
            org("org3"),
            domain("private", "org1"),
            access("access-to-org", "private", "org3"),
        ]);

        let plan = plan(&set, &applied_state()).unwrap();
        let action = plan
            .action_for("cloudfoundry_private_domain_access.access-to-org")
            .unwrap();
        assert_eq!(action.action_type, ActionType::Replace);
        assert_eq!(action.detail::<Vec<String>>(DETAIL_CHANGES).unwrap(), vec!["org"]);
        assert_eq!(plan.summary().replace, 1);
    }

    #[test]
    fn test_plan_removed_access_is_deleted_first() {
        let set = desired(vec![org("org1"), domain("private", "org1")]);

        let plan = plan(&set, &applied_state()).unwrap();
        let deletes: Vec<String> = plan
            .actions_by_type(ActionType::Delete)
            .iter()
            .map(|a| a.address())
            .collect();
        assert_eq!(
            deletes,
            vec![
                "cloudfoundry_private_domain_access.access-to-org",
                "cloudfoundry_org.org2",
                "cloudfoundry_org.org3",
            ]
        );
        assert_eq!(plan.actions[0].action_type, ActionType::Delete);
        assert_eq!(
            plan.actions[0].detail::<String>(DETAIL_ID).as_deref(),
            Some("g-org2/g-domain")
        );
    }

    #[test]
    fn test_plan_org_rename_is_update() {
        let mut state = ProviderState::new();
        state.add(
            "cloudfoundry_org.main".to_string(),
            ready("g-main", ORG).with_attribute(ATTR_NAME, json!("old-name")),
        );
        let set = desired(vec![
            ResourceSpec::Org(OrgSpec {
                name: "new-name".to_string(),
            })
            .to_config("main")
            .unwrap(),
        ]);

        let plan = plan(&set, &state).unwrap();
        assert_eq!(plan.actions.len(), 1);
        assert_eq!(plan.actions[0].action_type, ActionType::Update);
    }

    #[test]
    fn test_plan_replaced_org_cascades_to_dependents() {
        let mut state = applied_state();
        state.get_mut("cloudfoundry_org.org1").unwrap().status = ResourceStatus::Tainted;
        let set = desired(vec![
            org("org1"),
            org("org2"),
            org("org3"),
            domain("private", "org1"),
            access("access-to-org", "private", "org2"),
        ]);

        let plan = plan(&set, &state).unwrap();
        let types: Vec<(String, ActionType)> = plan
            .actions
            .iter()
            .filter(|a| a.action_type != ActionType::NoOp)
            .map(|a| (a.address(), a.action_type))
            .collect();
        assert_eq!(
            types,
            vec![
                ("cloudfoundry_org.org1".to_string(), ActionType::Replace),
                ("cloudfoundry_domain.private".to_string(), ActionType::Replace),
                (
                    "cloudfoundry_private_domain_access.access-to-org".to_string(),
                    ActionType::Replace
                ),
            ]
        );
    }

    #[test]
    fn test_plan_segment_org_change_is_update() {
        let mut state = applied_state();
        state.add(
            format!("{}.seg", ISOLATION_SEGMENT),
            ready("g-seg", ISOLATION_SEGMENT)
                .with_attribute(ATTR_NAME, json!("seg"))
                .with_attribute(ATTR_ORG_GUIDS, json!(["g-org1"])),
        );
        let segment = ResourceSpec::IsolationSegment(SegmentSpec {
            name: "seg".to_string(),
            orgs: vec![
                Reference::Resource("org2".to_string()),
                Reference::Resource("org1".to_string()),
            ],
        })
        .to_config("seg")
        .unwrap();
        let set = desired(vec![
            org("org1"),
            org("org2"),
            org("org3"),
            domain("private", "org1"),
            access("access-to-org", "private", "org2"),
            segment,
        ]);

        let plan = plan(&set, &state).unwrap();
        let action = plan.action_for("cloudfoundry_isolation_segment.seg").unwrap();
        assert_eq!(action.action_type, ActionType::Update);
        assert_eq!(action.detail::<Vec<String>>(DETAIL_CHANGES).unwrap(), vec!["orgs"]);
    }

    #[test]
    fn test_plan_rejects_dangling_reference() {
        let set = desired(vec![access("a", "missing-domain", "org1"), org("org1")]);
        let err = plan(&set, &ProviderState::new()).unwrap_err();
        assert!(matches!(err, CloudError::UnresolvedReference { .. }));
    }

    #[test]
    fn test_plan_accepts_literal_guid_reference() {
        let set = desired(vec![
            ResourceSpec::PrivateDomainAccess(AccessSpec {
                domain: Reference::Guid("existing-domain".to_string()),
                org: Reference::Guid("existing-org".to_string()),
            })
            .to_config("external")
            .unwrap(),
        ]);
        let plan = plan(&set, &ProviderState::new()).unwrap();
        assert_eq!(plan.summary().create, 1);
    }
}
