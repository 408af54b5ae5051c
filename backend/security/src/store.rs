//! Permission store: one partition per scope plus a static testing override.
//!
//! A partition is replaced wholesale or not at all. Loading environment
//! permissions for `env-b` discards whatever was loaded for `env-a`.

use std::collections::{BTreeSet, HashMap};

use portcullis_core::{PermissionString, Scope};
use serde::Serialize;

/// The permissions currently held for one scope.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Partition {
    /// Scope instance the tokens were loaded for; `None` for organization
    /// and for cleared partitions.
    pub scope_id: Option<String>,
    pub permissions: BTreeSet<PermissionString>,
}

impl Partition {
    pub fn is_empty(&self) -> bool {
        self.permissions.is_empty()
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct PermissionStore {
    partitions: HashMap<Scope, Partition>,
    testing_override: BTreeSet<PermissionString>,
}

impl PermissionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store whose evaluator always also consults `tokens`.
    pub fn with_testing_override<I>(tokens: I) -> Self
    where
        I: IntoIterator<Item = PermissionString>,
    {
        Self {
            partitions: HashMap::new(),
            testing_override: tokens.into_iter().collect(),
        }
    }

    /// Replace the partition for `scope`. Never merges with previous content.
    pub fn replace<I>(&mut self, scope: Scope, scope_id: Option<String>, tokens: I)
    where
        I: IntoIterator<Item = PermissionString>,
    {
        self.partitions.insert(
            scope,
            Partition {
                scope_id,
                permissions: tokens.into_iter().collect(),
            },
        );
    }

    pub fn clear(&mut self, scope: Scope) {
        self.partitions.remove(&scope);
    }

    pub fn partition(&self, scope: Scope) -> Option<&Partition> {
        self.partitions.get(&scope)
    }

    /// Id the active partition of `scope` was loaded for.
    pub fn active_scope_id(&self, scope: Scope) -> Option<&str> {
        self.partitions.get(&scope)?.scope_id.as_deref()
    }

    pub fn testing_override(&self) -> &BTreeSet<PermissionString> {
        &self.testing_override
    }

    /// Union of every partition and the testing override.
    pub fn permissions(&self) -> BTreeSet<PermissionString> {
        self.partitions
            .values()
            .flat_map(|p| p.permissions.iter())
            .chain(self.testing_override.iter())
            .cloned()
            .collect()
    }

    fn holds(&self, token: &PermissionString) -> bool {
        self.testing_override.contains(token)
            || self.partitions.values().any(|p| p.permissions.contains(token))
    }

    /// True iff at least one of `required` is held. Empty input is denied.
    pub fn has_any_matching(&self, required: &[PermissionString]) -> bool {
        required.iter().any(|token| self.holds(token))
    }

    /// `None` is treated like an empty requirement: denied.
    pub fn has_any_matching_opt(&self, required: Option<&[PermissionString]>) -> bool {
        required.is_some_and(|r| self.has_any_matching(r))
    }

    /// True iff every one of `required` is held. Empty input is denied.
    pub fn has_all_matching(&self, required: &[PermissionString]) -> bool {
        !required.is_empty() && required.iter().all(|token| self.holds(token))
    }

    /// True iff none of `required` is held.
    pub fn has_none_matching(&self, required: &[PermissionString]) -> bool {
        !self.has_any_matching(required)
    }
}
