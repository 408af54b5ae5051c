use async_trait::async_trait;

use crate::crud::CrudMap;
use crate::error::Result;
use crate::types::{Environment, Scope};
use crate::user::User;

/// Backend that grants permissions for a scope instance.
///
/// Implemented by the management API client; tests use in-memory fakes.
#[async_trait]
pub trait PermissionSource: Send + Sync {
    /// Fetch the CRUD map granted to the current user on `scope_id`.
    ///
    /// `environment` is the environment the session has committed, passed
    /// for the environment-relative scopes (api, application, integration)
    /// and `None` otherwise.
    async fn fetch_permissions(
        &self,
        scope: Scope,
        scope_id: &str,
        environment: Option<&str>,
    ) -> Result<CrudMap>;
}

/// Backend that knows every environment of the organization.
#[async_trait]
pub trait EnvironmentSource: Send + Sync {
    async fn list_environments(&self) -> Result<Vec<Environment>>;
}

/// Backend that returns the authenticated user.
#[async_trait]
pub trait UserSource: Send + Sync {
    async fn current_user(&self) -> Result<User>;
}
