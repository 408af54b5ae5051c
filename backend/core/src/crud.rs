//! CRUD-map schema returned by the management API and its flattening into
//! permission strings.
//!
//! The backend answers permission queries with a JSON object keyed by
//! resource name. Each value is either an array of single-letter action
//! codes (`["C", "R"]`) or a compact letter string (`"CRUD"`).

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::types::{PermissionString, Scope};

/// The actions granted on one resource.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CrudGrant {
    List(Vec<String>),
    Letters(String),
}

impl CrudGrant {
    /// Individual action codes, lowercased; blanks are skipped.
    pub fn codes(&self) -> Vec<String> {
        match self {
            CrudGrant::List(items) => items
                .iter()
                .map(|c| c.trim().to_lowercase())
                .filter(|c| !c.is_empty())
                .collect(),
            CrudGrant::Letters(letters) => letters
                .chars()
                .filter(|c| !c.is_whitespace())
                .map(|c| c.to_lowercase().to_string())
                .collect(),
        }
    }
}

/// Resource name → granted actions.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CrudMap(pub BTreeMap<String, CrudGrant>);

impl CrudMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, resource: impl Into<String>, grant: CrudGrant) {
        self.0.insert(resource.into(), grant);
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Parse a raw backend payload, rejecting anything that is not an
    /// object of arrays-or-strings.
    pub fn from_json(value: serde_json::Value) -> Result<Self, serde_json::Error> {
        serde_json::from_value(value)
    }

    /// Number of permission strings `flatten` will produce.
    pub fn grant_count(&self) -> usize {
        self.0.values().map(|g| g.codes().len()).sum()
    }
}

impl<R: Into<String>> FromIterator<(R, CrudGrant)> for CrudMap {
    fn from_iter<T: IntoIterator<Item = (R, CrudGrant)>>(iter: T) -> Self {
        CrudMap(iter.into_iter().map(|(r, g)| (r.into(), g)).collect())
    }
}

/// Produce one `scope-resource-code` token per (resource, code) pair.
pub fn flatten(scope: Scope, map: &CrudMap) -> Vec<PermissionString> {
    map.0
        .iter()
        .flat_map(|(resource, grant)| {
            grant
                .codes()
                .into_iter()
                .map(move |code| PermissionString::new(scope, resource, &code))
        })
        .collect()
}
