//! KDL definition parser
//!
//! ```kdl
//! org "org1"
//!
//! domain "private" {
//!     sub-domain "private"
//!     domain "apps.example.com"
//!     org "org1"
//! }
//!
//! isolation-segment "production" {
//!     orgs "org1" "org2"
//! }
//!
//! private-domain-access "access-to-org" {
//!     domain "private"
//!     org-guid "1b0a3d76-2b89-4da5-8b6e-5ad1e2b0b2bd"
//! }
//! ```
//!
//! Fields naming another resource (`org`, `orgs`, `domain`) refer to it by
//! its node name; the `-guid` variants take a literal GUID for objects
//! managed elsewhere.

use anyhow::{Context, anyhow, bail};
use cfinfra_cloud::ResourceSet;
use cfinfra_cloudfoundry::{
    AccessSpec, DomainSpec, OrgSpec, Reference, ResourceSpec, SegmentSpec,
};
use kdl::{KdlDocument, KdlNode};
use std::path::Path;

pub fn parse_definition_file(path: &Path) -> anyhow::Result<ResourceSet> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    parse_definitions(&content).with_context(|| format!("invalid definitions in {}", path.display()))
}

pub fn parse_definitions(content: &str) -> anyhow::Result<ResourceSet> {
    let doc: KdlDocument = content.parse()?;
    let mut resources = ResourceSet::new();

    for node in doc.nodes() {
        let name = node_name(node)?;
        let spec = match node.name().value() {
            "org" => parse_org(node, &name)?,
            "domain" => parse_domain(node, &name)?,
            "isolation-segment" => parse_segment(node, &name)?,
            "private-domain-access" => parse_access(node, &name)?,
            other => bail!("unknown node '{}'", other),
        };

        let config = spec.to_config(name)?;
        let address = config.address();
        if !resources.add(config) {
            bail!("{} is defined more than once", address);
        }
    }

    Ok(resources)
}

fn node_name(node: &KdlNode) -> anyhow::Result<String> {
    first_string(node)
        .map(str::to_string)
        .ok_or_else(|| anyhow!("{} requires a name", node.name().value()))
}

fn first_string(node: &KdlNode) -> Option<&str> {
    node.entries().first().and_then(|e| e.value().as_string())
}

fn all_strings(node: &KdlNode) -> Vec<String> {
    node.entries()
        .iter()
        .filter(|e| e.name().is_none())
        .filter_map(|e| e.value().as_string())
        .map(str::to_string)
        .collect()
}

fn children(node: &KdlNode) -> impl Iterator<Item = &KdlNode> {
    node.children().into_iter().flat_map(|doc| doc.nodes())
}

fn required_string(parent: &str, child: &KdlNode) -> anyhow::Result<String> {
    first_string(child).map(str::to_string).ok_or_else(|| {
        anyhow!(
            "{}: {} requires a string value",
            parent,
            child.name().value()
        )
    })
}

/// Remember a reference, rejecting a second one for the same field
fn set_reference(
    slot: &mut Option<Reference>,
    reference: Reference,
    parent: &str,
    field: &str,
) -> anyhow::Result<()> {
    if slot.is_some() {
        bail!("{}: {} is set more than once", parent, field);
    }
    *slot = Some(reference);
    Ok(())
}

fn parse_org(node: &KdlNode, name: &str) -> anyhow::Result<ResourceSpec> {
    let mut org = OrgSpec {
        name: name.to_string(),
    };

    for child in children(node) {
        match child.name().value() {
            "name" => org.name = required_string(name, child)?,
            other => bail!("org {}: unknown field '{}'", name, other),
        }
    }

    Ok(ResourceSpec::Org(org))
}

fn parse_domain(node: &KdlNode, name: &str) -> anyhow::Result<ResourceSpec> {
    let mut sub_domain = None;
    let mut domain = None;
    let mut org = None;

    for child in children(node) {
        match child.name().value() {
            "sub-domain" => sub_domain = Some(required_string(name, child)?),
            "domain" => domain = Some(required_string(name, child)?),
            "org" => set_reference(
                &mut org,
                Reference::Resource(required_string(name, child)?),
                name,
                "org",
            )?,
            "org-guid" => set_reference(
                &mut org,
                Reference::Guid(required_string(name, child)?),
                name,
                "org",
            )?,
            other => bail!("domain {}: unknown field '{}'", name, other),
        }
    }

    Ok(ResourceSpec::Domain(DomainSpec {
        sub_domain,
        domain: domain.ok_or_else(|| anyhow!("domain {}: domain is required", name))?,
        org: org.ok_or_else(|| anyhow!("domain {}: org or org-guid is required", name))?,
    }))
}

fn parse_segment(node: &KdlNode, name: &str) -> anyhow::Result<ResourceSpec> {
    let mut segment = SegmentSpec {
        name: name.to_string(),
        orgs: Vec::new(),
    };

    for child in children(node) {
        match child.name().value() {
            "name" => segment.name = required_string(name, child)?,
            "orgs" => segment
                .orgs
                .extend(all_strings(child).into_iter().map(Reference::Resource)),
            "org-guids" => segment
                .orgs
                .extend(all_strings(child).into_iter().map(Reference::Guid)),
            other => bail!("isolation-segment {}: unknown field '{}'", name, other),
        }
    }

    for (i, org) in segment.orgs.iter().enumerate() {
        if segment.orgs[..i].contains(org) {
            bail!(
                "isolation-segment {}: org '{}' is listed more than once",
                name,
                org
            );
        }
    }

    Ok(ResourceSpec::IsolationSegment(segment))
}

fn parse_access(node: &KdlNode, name: &str) -> anyhow::Result<ResourceSpec> {
    let mut domain = None;
    let mut org = None;

    for child in children(node) {
        let field = child.name().value();
        let value = required_string(name, child)?;
        match field {
            "domain" => set_reference(&mut domain, Reference::Resource(value), name, "domain")?,
            "domain-guid" => set_reference(&mut domain, Reference::Guid(value), name, "domain")?,
            "org" => set_reference(&mut org, Reference::Resource(value), name, "org")?,
            "org-guid" => set_reference(&mut org, Reference::Guid(value), name, "org")?,
            other => bail!("private-domain-access {}: unknown field '{}'", name, other),
        }
    }

    Ok(ResourceSpec::PrivateDomainAccess(AccessSpec {
        domain: domain.ok_or_else(|| {
            anyhow!("private-domain-access {}: domain or domain-guid is required", name)
        })?,
        org: org.ok_or_else(|| {
            anyhow!("private-domain-access {}: org or org-guid is required", name)
        })?,
    }))
}
