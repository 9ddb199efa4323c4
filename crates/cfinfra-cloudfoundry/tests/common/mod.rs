//! In-memory Cloud Controller used by the lifecycle tests

#![allow(dead_code)]

use async_trait::async_trait;
use cfinfra_cloudfoundry::{CloudFoundryError, Gateway, Result, Session};
use cfinfra_config::CfConfig;
use serde_json::{Value, json};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Arc, Mutex};

pub const API: &str = "https://api.cf.test";

#[derive(Default)]
struct FakeDomain {
    name: String,
    owner: Option<String>,
    shared: BTreeSet<String>,
}

#[derive(Default)]
struct FakeSegment {
    name: String,
    orgs: BTreeSet<String>,
}

#[derive(Default)]
struct Inner {
    next_id: u64,
    orgs: BTreeMap<String, String>,
    domains: BTreeMap<String, FakeDomain>,
    segments: BTreeMap<String, FakeSegment>,
    requests: Vec<String>,
    entitlement_posts: Vec<Vec<String>>,
    undeletable: BTreeSet<String>,
}

impl Inner {
    fn guid(&mut self, prefix: &str) -> String {
        self.next_id += 1;
        format!("{}-{:04}", prefix, self.next_id)
    }
}

#[derive(Default)]
pub struct FakeCloudController {
    inner: Mutex<Inner>,
}

fn not_found(what: &str) -> CloudFoundryError {
    CloudFoundryError::Api {
        status: 404,
        code: 10010,
        title: "CF-ResourceNotFound".to_string(),
        detail: format!("{} not found", what),
    }
}

fn unprocessable(detail: &str) -> CloudFoundryError {
    CloudFoundryError::Api {
        status: 422,
        code: 10008,
        title: "CF-UnprocessableEntity".to_string(),
        detail: detail.to_string(),
    }
}

fn split(url: &str) -> (Vec<String>, BTreeMap<String, String>) {
    let relative = url.strip_prefix(API).unwrap_or(url);
    let (path, query) = relative.split_once('?').unwrap_or((relative, ""));
    let segments = path
        .trim_matches('/')
        .split('/')
        .map(str::to_string)
        .collect();
    let params = query
        .split('&')
        .filter_map(|pair| pair.split_once('='))
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    (segments, params)
}

fn guids(body: &Value) -> Vec<String> {
    body["data"]
        .as_array()
        .map(|items| {
            items
                .iter()
                .filter_map(|item| item["guid"].as_str().map(str::to_string))
                .collect()
        })
        .unwrap_or_default()
}

fn org_json(guid: &str, name: &str) -> Value {
    json!({ "guid": guid, "name": name, "suspended": false })
}

fn domain_json(guid: &str, domain: &FakeDomain) -> Value {
    let shared: Vec<Value> = domain.shared.iter().map(|g| json!({ "guid": g })).collect();
    json!({
        "guid": guid,
        "name": domain.name,
        "internal": false,
        "relationships": {
            "organization": { "data": domain.owner.as_ref().map(|g| json!({ "guid": g })) },
            "shared_organizations": { "data": shared }
        }
    })
}

fn segment_json(guid: &str, segment: &FakeSegment) -> Value {
    json!({ "guid": guid, "name": segment.name })
}

fn page(resources: Vec<Value>) -> Value {
    json!({ "pagination": { "next": null }, "resources": resources })
}

impl FakeCloudController {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn session(self: &Arc<Self>) -> Session {
        let config = CfConfig::new(API, "bearer test-token");
        Session::with_gateway(&config, self.clone()).expect("session")
    }

    /// Org created outside of cfinfra
    pub fn seed_org(&self, name: &str) -> String {
        let mut inner = self.inner.lock().unwrap();
        let guid = inner.guid("org");
        inner.orgs.insert(guid.clone(), name.to_string());
        guid
    }

    /// Shared (org-less) domain created outside of cfinfra
    pub fn seed_shared_domain(&self, name: &str) -> String {
        let mut inner = self.inner.lock().unwrap();
        let guid = inner.guid("domain");
        inner.domains.insert(
            guid.clone(),
            FakeDomain {
                name: name.to_string(),
                ..FakeDomain::default()
            },
        );
        guid
    }

    pub fn org_guid(&self, name: &str) -> Option<String> {
        let inner = self.inner.lock().unwrap();
        inner
            .orgs
            .iter()
            .find(|(_, n)| n.as_str() == name)
            .map(|(g, _)| g.clone())
    }

    pub fn org_count(&self) -> usize {
        self.inner.lock().unwrap().orgs.len()
    }

    pub fn domain_guid(&self, name: &str) -> Option<String> {
        let inner = self.inner.lock().unwrap();
        inner
            .domains
            .iter()
            .find(|(_, d)| d.name == name)
            .map(|(g, _)| g.clone())
    }

    pub fn domain_shared_with(&self, domain: &str, org: &str) -> bool {
        let inner = self.inner.lock().unwrap();
        inner
            .domains
            .get(domain)
            .map(|d| d.shared.contains(org))
            .unwrap_or(false)
    }

    pub fn segment_guid(&self, name: &str) -> Option<String> {
        let inner = self.inner.lock().unwrap();
        inner
            .segments
            .iter()
            .find(|(_, s)| s.name == name)
            .map(|(g, _)| g.clone())
    }

    pub fn segment_orgs(&self, segment: &str) -> Vec<String> {
        let inner = self.inner.lock().unwrap();
        inner
            .segments
            .get(segment)
            .map(|s| s.orgs.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Simulate someone running `cf delete-org` behind our back
    pub fn remove_org(&self, guid: &str) {
        self.inner.lock().unwrap().orgs.remove(guid);
    }

    pub fn unshare_domain(&self, domain: &str, org: &str) {
        let mut inner = self.inner.lock().unwrap();
        if let Some(d) = inner.domains.get_mut(domain) {
            d.shared.remove(org);
        }
    }

    /// Make every delete of `guid` fail with a 422
    pub fn refuse_delete(&self, guid: &str) {
        self.inner.lock().unwrap().undeletable.insert(guid.to_string());
    }

    /// Org GUID lists POSTed to segment entitlements, in request order
    pub fn entitlement_posts(&self) -> Vec<Vec<String>> {
        self.inner.lock().unwrap().entitlement_posts.clone()
    }

    /// Requests seen so far, as `METHOD /path`
    pub fn requests(&self) -> Vec<String> {
        self.inner.lock().unwrap().requests.clone()
    }

    fn record(&self, method: &str, url: &str) {
        let relative = url.strip_prefix(API).unwrap_or(url).to_string();
        self.inner
            .lock()
            .unwrap()
            .requests
            .push(format!("{} {}", method, relative));
    }
}

#[async_trait]
impl Gateway for FakeCloudController {
    async fn get_resource(&self, url: &str) -> Result<Value> {
        self.record("GET", url);
        let (path, params) = split(url);
        let inner = self.inner.lock().unwrap();
        let path: Vec<&str> = path.iter().map(String::as_str).collect();
        let name_filter = params.get("names");

        match path.as_slice() {
            ["v3", "organizations"] => Ok(page(
                inner
                    .orgs
                    .iter()
                    .filter(|(_, n)| name_filter.is_none_or(|f| f == *n))
                    .map(|(g, n)| org_json(g, n))
                    .collect(),
            )),
            ["v3", "organizations", id] => inner
                .orgs
                .get(*id)
                .map(|n| org_json(id, n))
                .ok_or_else(|| not_found("Organization")),
            ["v3", "domains"] => Ok(page(
                inner
                    .domains
                    .iter()
                    .filter(|(_, d)| name_filter.is_none_or(|f| *f == d.name))
                    .map(|(g, d)| domain_json(g, d))
                    .collect(),
            )),
            ["v3", "domains", id] => inner
                .domains
                .get(*id)
                .map(|d| domain_json(id, d))
                .ok_or_else(|| not_found("Domain")),
            ["v3", "isolation_segments"] => Ok(page(
                inner
                    .segments
                    .iter()
                    .filter(|(_, s)| name_filter.is_none_or(|f| *f == s.name))
                    .map(|(g, s)| segment_json(g, s))
                    .collect(),
            )),
            ["v3", "isolation_segments", id] => inner
                .segments
                .get(*id)
                .map(|s| segment_json(id, s))
                .ok_or_else(|| not_found("Isolation segment")),
            ["v3", "isolation_segments", id, "relationships", "organizations"] => inner
                .segments
                .get(*id)
                .map(|s| {
                    let data: Vec<Value> = s.orgs.iter().map(|g| json!({ "guid": g })).collect();
                    json!({ "data": data })
                })
                .ok_or_else(|| not_found("Isolation segment")),
            _ => Err(not_found(url)),
        }
    }

    async fn create_resource(&self, endpoint: &str, path: &str, body: Value) -> Result<Option<Value>> {
        let url = format!("{}{}", endpoint, path);
        self.record("POST", &url);
        let (path, _) = split(&url);
        let mut inner = self.inner.lock().unwrap();
        let path: Vec<&str> = path.iter().map(String::as_str).collect();
        let name = body["name"].as_str().unwrap_or_default().to_string();

        match path.as_slice() {
            ["v3", "organizations"] => {
                if inner.orgs.values().any(|n| *n == name) {
                    return Err(unprocessable("Organization name must be unique"));
                }
                let guid = inner.guid("org");
                inner.orgs.insert(guid.clone(), name.clone());
                Ok(Some(org_json(&guid, &name)))
            }
            ["v3", "domains"] => {
                let owner = body
                    .pointer("/relationships/organization/data/guid")
                    .and_then(Value::as_str)
                    .map(str::to_string);
                if let Some(org) = &owner {
                    if !inner.orgs.contains_key(org) {
                        return Err(unprocessable("Organization is invalid"));
                    }
                }
                let guid = inner.guid("domain");
                let domain = FakeDomain {
                    name,
                    owner,
                    shared: BTreeSet::new(),
                };
                let json = domain_json(&guid, &domain);
                inner.domains.insert(guid, domain);
                Ok(Some(json))
            }
            ["v3", "domains", id, "relationships", "shared_organizations"] => {
                let orgs = guids(&body);
                if orgs.iter().any(|o| !inner.orgs.contains_key(o)) {
                    return Err(unprocessable("Organization is invalid"));
                }
                let domain = inner
                    .domains
                    .get_mut(*id)
                    .ok_or_else(|| not_found("Domain"))?;
                if domain.owner.is_none() {
                    return Err(unprocessable("Domains can not be shared with other organizations unless they are scoped to an organization"));
                }
                domain.shared.extend(orgs);
                let data: Vec<Value> = domain.shared.iter().map(|g| json!({ "guid": g })).collect();
                Ok(Some(json!({ "data": data })))
            }
            ["v3", "isolation_segments"] => {
                if inner.segments.values().any(|s| s.name == name) {
                    return Err(unprocessable("Name must be unique"));
                }
                let guid = inner.guid("segment");
                let segment = FakeSegment {
                    name,
                    orgs: BTreeSet::new(),
                };
                let json = segment_json(&guid, &segment);
                inner.segments.insert(guid, segment);
                Ok(Some(json))
            }
            ["v3", "isolation_segments", id, "relationships", "organizations"] => {
                let orgs = guids(&body);
                inner.entitlement_posts.push(orgs.clone());
                if orgs.iter().any(|o| !inner.orgs.contains_key(o)) {
                    return Err(unprocessable("Organization is invalid"));
                }
                let segment = inner
                    .segments
                    .get_mut(*id)
                    .ok_or_else(|| not_found("Isolation segment"))?;
                segment.orgs.extend(orgs);
                let data: Vec<Value> = segment.orgs.iter().map(|g| json!({ "guid": g })).collect();
                Ok(Some(json!({ "data": data })))
            }
            _ => Err(not_found(&url)),
        }
    }

    async fn patch_resource(&self, endpoint: &str, path: &str, body: Value) -> Result<Option<Value>> {
        let url = format!("{}{}", endpoint, path);
        self.record("PATCH", &url);
        let (path, _) = split(&url);
        let mut inner = self.inner.lock().unwrap();
        let path: Vec<&str> = path.iter().map(String::as_str).collect();
        let name = body["name"].as_str().unwrap_or_default().to_string();

        match path.as_slice() {
            ["v3", "organizations", id] => {
                let org = inner.orgs.get_mut(*id).ok_or_else(|| not_found("Organization"))?;
                *org = name.clone();
                Ok(Some(org_json(id, &name)))
            }
            ["v3", "isolation_segments", id] => {
                let segment = inner
                    .segments
                    .get_mut(*id)
                    .ok_or_else(|| not_found("Isolation segment"))?;
                segment.name = name;
                Ok(Some(segment_json(id, segment)))
            }
            _ => Err(not_found(&url)),
        }
    }

    async fn delete_resource(&self, endpoint: &str, path: &str) -> Result<()> {
        let url = format!("{}{}", endpoint, path);
        self.record("DELETE", &url);
        let (path, _) = split(&url);
        let mut inner = self.inner.lock().unwrap();
        let path: Vec<&str> = path.iter().map(String::as_str).collect();

        if path.iter().any(|part| inner.undeletable.contains(*part)) {
            return Err(unprocessable("Resource is in use"));
        }

        match path.as_slice() {
            ["v3", "organizations", id] => {
                let owns_domain = inner.domains.values().any(|d| d.owner.as_deref() == Some(*id));
                if owns_domain {
                    return Err(unprocessable("Organization still owns private domains"));
                }
                inner
                    .orgs
                    .remove(*id)
                    .map(|_| ())
                    .ok_or_else(|| not_found("Organization"))
            }
            ["v3", "domains", id] => inner
                .domains
                .remove(*id)
                .map(|_| ())
                .ok_or_else(|| not_found("Domain")),
            ["v3", "domains", id, "relationships", "shared_organizations", org] => {
                let domain = inner
                    .domains
                    .get_mut(*id)
                    .ok_or_else(|| not_found("Domain"))?;
                domain.shared.remove(*org);
                Ok(())
            }
            ["v3", "isolation_segments", id] => {
                let segment = inner
                    .segments
                    .get(*id)
                    .ok_or_else(|| not_found("Isolation segment"))?;
                if !segment.orgs.is_empty() {
                    return Err(unprocessable(
                        "Cannot delete Isolation Segments with entitled organizations",
                    ));
                }
                inner.segments.remove(*id);
                Ok(())
            }
            ["v3", "isolation_segments", id, "relationships", "organizations", org] => {
                let segment = inner
                    .segments
                    .get_mut(*id)
                    .ok_or_else(|| not_found("Isolation segment"))?;
                segment.orgs.remove(*org);
                Ok(())
            }
            _ => Err(not_found(&url)),
        }
    }
}
