use thiserror::Error;

use crate::types::Scope;

/// Top-level error type for permission loading and evaluation.
#[derive(Debug, Error)]
pub enum PortcullisError {
    #[error("no environment found")]
    NoEnvironments,

    #[error("failed to load {scope} permissions for '{scope_id}': {message}")]
    Load {
        scope: Scope,
        scope_id: String,
        message: String,
    },

    #[error("invalid permission '{value}': {reason}")]
    InvalidPermission { value: String, reason: String },

    #[error("invalid response: {0}")]
    InvalidResponse(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl PortcullisError {
    /// Wrap a source failure as a load error for `scope`/`scope_id`.
    pub fn load(scope: Scope, scope_id: impl Into<String>, err: impl std::fmt::Display) -> Self {
        PortcullisError::Load {
            scope,
            scope_id: scope_id.into(),
            message: err.to_string(),
        }
    }
}

pub type Result<T, E = PortcullisError> = std::result::Result<T, E>;
