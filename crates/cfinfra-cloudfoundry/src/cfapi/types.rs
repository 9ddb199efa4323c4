//! Cloud Controller v3 payload shapes shared by the managers

use serde::{Deserialize, Serialize};

/// `{"guid": "..."}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CcGuid {
    pub guid: String,
}

impl CcGuid {
    pub fn new(guid: impl Into<String>) -> Self {
        Self { guid: guid.into() }
    }
}

/// To-many relationship: `{"data": [{"guid": ...}, ...]}`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CcToMany {
    #[serde(default)]
    pub data: Vec<CcGuid>,
}

impl CcToMany {
    pub fn from_guids<I, S>(guids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            data: guids.into_iter().map(CcGuid::new).collect(),
        }
    }

    pub fn guids(&self) -> Vec<String> {
        self.data.iter().map(|g| g.guid.clone()).collect()
    }

    pub fn contains(&self, guid: &str) -> bool {
        self.data.iter().any(|g| g.guid == guid)
    }
}

/// To-one relationship: `{"data": {"guid": ...}}` or `{"data": null}`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CcToOne {
    #[serde(default)]
    pub data: Option<CcGuid>,
}

/// Paginated list response; only the first page is read here
#[derive(Debug, Deserialize)]
pub struct CcPaginated<T> {
    #[serde(default = "Vec::new")]
    pub resources: Vec<T>,
}

/// Error envelope returned with non-2xx responses
#[derive(Debug, Default, Deserialize)]
pub struct CcErrorEnvelope {
    #[serde(default)]
    pub errors: Vec<CcErrorEntry>,
}

#[derive(Debug, Default, Deserialize)]
pub struct CcErrorEntry {
    #[serde(default)]
    pub code: i64,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub detail: String,
}
