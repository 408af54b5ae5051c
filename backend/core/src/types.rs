use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::PortcullisError;

/// A permission namespace, one per resource type the console navigates into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Scope {
    Organization,
    Environment,
    Api,
    Application,
    Integration,
}

impl Scope {
    pub const ALL: [Scope; 5] = [
        Scope::Organization,
        Scope::Environment,
        Scope::Api,
        Scope::Application,
        Scope::Integration,
    ];

    /// Lowercase prefix used in permission strings (`api-plan-r`).
    pub fn prefix(&self) -> &'static str {
        match self {
            Scope::Organization => "organization",
            Scope::Environment => "environment",
            Scope::Api => "api",
            Scope::Application => "application",
            Scope::Integration => "integration",
        }
    }

    /// Scopes whose instances live under an environment.
    pub fn is_environment_relative(&self) -> bool {
        matches!(self, Scope::Api | Scope::Application | Scope::Integration)
    }

    /// Uppercase form used by backend role objects.
    pub fn wire_name(&self) -> &'static str {
        match self {
            Scope::Organization => "ORGANIZATION",
            Scope::Environment => "ENVIRONMENT",
            Scope::Api => "API",
            Scope::Application => "APPLICATION",
            Scope::Integration => "INTEGRATION",
        }
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.prefix())
    }
}

impl FromStr for Scope {
    type Err = PortcullisError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Scope::ALL
            .into_iter()
            .find(|scope| scope.prefix().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| PortcullisError::InvalidPermission {
                value: s.to_string(),
                reason: "unknown scope".to_string(),
            })
    }
}

/// A lowercase `<scope>-<resource>-<crud-letter>` token, e.g. `api-notification-u`.
///
/// Tokens are normalized to lowercase on construction, so two tokens that
/// differ only in case compare equal.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct PermissionString(String);

impl PermissionString {
    /// Build a token from its parts.
    pub fn new(scope: Scope, resource: &str, action: &str) -> Self {
        Self::from(format!("{}-{}-{}", scope.prefix(), resource.trim(), action.trim()))
    }

    /// Strict constructor: requires at least three non-empty `-` separated
    /// segments, the last of which is a single ASCII letter.
    pub fn parse(raw: &str) -> Result<Self, PortcullisError> {
        let token = Self::from(raw);
        let segments: Vec<&str> = token.0.split('-').collect();
        let invalid = |reason: &str| PortcullisError::InvalidPermission {
            value: raw.to_string(),
            reason: reason.to_string(),
        };

        if segments.len() < 3 {
            return Err(invalid("expected <scope>-<resource>-<action>"));
        }
        if segments.iter().any(|s| s.is_empty()) {
            return Err(invalid("empty segment"));
        }
        let action = segments[segments.len() - 1];
        if action.len() != 1 || !action.chars().all(|c| c.is_ascii_alphabetic()) {
            return Err(invalid("action must be a single letter"));
        }
        Ok(token)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The scope prefix, if the token starts with a known one.
    pub fn scope(&self) -> Option<Scope> {
        let prefix = self.0.split('-').next()?;
        prefix.parse().ok()
    }
}

impl From<&str> for PermissionString {
    fn from(raw: &str) -> Self {
        PermissionString(raw.trim().to_lowercase())
    }
}

impl From<String> for PermissionString {
    fn from(raw: String) -> Self {
        PermissionString::from(raw.as_str())
    }
}

impl From<PermissionString> for String {
    fn from(token: PermissionString) -> Self {
        token.0
    }
}

impl fmt::Display for PermissionString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Convenience: turn a slice of string literals into tokens.
pub fn permissions<S: AsRef<str>>(raw: &[S]) -> Vec<PermissionString> {
    raw.iter().map(|s| PermissionString::from(s.as_ref())).collect()
}

/// An environment known to the management API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Environment {
    pub id: String,
    /// Human-readable aliases, first one preferred in URLs.
    #[serde(default)]
    pub hrids: Vec<String>,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub organization_id: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

impl Environment {
    pub fn new(id: impl Into<String>, hrids: &[&str]) -> Self {
        let id = id.into();
        Self {
            name: id.clone(),
            id,
            hrids: hrids.iter().map(|h| h.to_string()).collect(),
            organization_id: None,
            description: None,
        }
    }

    /// Id or alias, case-insensitively.
    pub fn matches(&self, token: &str) -> bool {
        self.id.eq_ignore_ascii_case(token)
            || self.hrids.iter().any(|h| h.eq_ignore_ascii_case(token))
    }

    /// The identifier that should appear in URLs: first alias, else id.
    pub fn preferred_ref(&self) -> &str {
        self.hrids.first().map(String::as_str).unwrap_or(&self.id)
    }
}
