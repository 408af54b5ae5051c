use std::sync::RwLock;
use std::time::{Duration, Instant};

use anyhow::{anyhow, Context};
use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use tracing::debug;

use portcullis_core::{
    CrudMap, Environment, EnvironmentSource, PermissionSource, PortcullisError, Result, Scope,
    User, UserSource,
};

/// Connection settings for the management API.
#[derive(Debug, Clone)]
pub struct ClientSettings {
    /// e.g. `http://localhost:8083/management`
    pub base_url: String,
    pub organization_id: String,
    pub token: Option<String>,
    pub timeout: Duration,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8083/management".to_string(),
            organization_id: "DEFAULT".to_string(),
            token: None,
            timeout: Duration::from_secs(30),
        }
    }
}

/// Management API client.
///
/// API, application and integration permissions live under an environment.
/// Fetches use the environment passed by the caller (the session's committed
/// environment) and fall back to one selected with `set_environment`.
pub struct ManagementClient {
    client: Client,
    settings: ClientSettings,
    current_environment: RwLock<Option<String>>,
}

impl ManagementClient {
    pub fn new(settings: ClientSettings) -> Result<Self> {
        let client = Client::builder()
            .timeout(settings.timeout)
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self {
            client,
            settings,
            current_environment: RwLock::new(None),
        })
    }

    pub fn with_environment(self, env_id: impl Into<String>) -> Self {
        self.set_environment(env_id);
        self
    }

    pub fn set_environment(&self, env_id: impl Into<String>) {
        if let Ok(mut current) = self.current_environment.write() {
            *current = Some(env_id.into());
        }
    }

    pub fn current_environment(&self) -> Option<String> {
        self.current_environment.read().ok().and_then(|c| c.clone())
    }

    fn organization_url(&self) -> String {
        format!(
            "{}/organizations/{}",
            self.settings.base_url.trim_end_matches('/'),
            self.settings.organization_id
        )
    }

    /// Permission endpoint for a scope instance.
    pub fn permissions_url(
        &self,
        scope: Scope,
        scope_id: &str,
        environment: Option<&str>,
    ) -> Result<String> {
        let org = self.organization_url();
        if scope == Scope::Environment {
            return Ok(format!("{org}/environments/{scope_id}/permissions"));
        }
        if scope == Scope::Organization {
            return Err(PortcullisError::InvalidResponse(
                "organization permissions are carried by the user".to_string(),
            ));
        }

        let env = environment
            .map(str::to_string)
            .or_else(|| self.current_environment())
            .ok_or_else(|| PortcullisError::load(scope, scope_id, "no environment selected"))?;
        let env_url = format!("{org}/environments/{env}");
        Ok(match scope {
            Scope::Api => format!("{env_url}/apis/{scope_id}/members/permissions"),
            Scope::Application => format!("{env_url}/applications/{scope_id}/members/permissions"),
            _ => format!("{env_url}/integrations/{scope_id}/permissions"),
        })
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T> {
        let start = Instant::now();
        let mut request = self.client.get(url);
        if let Some(token) = &self.settings.token {
            request = request.bearer_auth(token);
        }

        let response = request
            .send()
            .await
            .with_context(|| format!("Management API request failed: GET {url}"))?;

        let status = response.status();
        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();
            return Err(PortcullisError::InvalidResponse(format!(
                "GET {url} returned {status}: {error_body}"
            )));
        }

        let body = response
            .json::<T>()
            .await
            .map_err(|e| PortcullisError::InvalidResponse(format!("GET {url}: {e}")))?;
        debug!(url, latency_ms = start.elapsed().as_millis() as u64, "Management API call");
        Ok(body)
    }
}

#[async_trait]
impl PermissionSource for ManagementClient {
    async fn fetch_permissions(
        &self,
        scope: Scope,
        scope_id: &str,
        environment: Option<&str>,
    ) -> Result<CrudMap> {
        let url = self.permissions_url(scope, scope_id, environment)?;
        self.get_json::<CrudMap>(&url)
            .await
            .map_err(|e| PortcullisError::load(scope, scope_id, e))
    }
}

#[async_trait]
impl EnvironmentSource for ManagementClient {
    async fn list_environments(&self) -> Result<Vec<Environment>> {
        let url = format!("{}/environments", self.organization_url());
        self.get_json(&url).await
    }
}

#[async_trait]
impl UserSource for ManagementClient {
    async fn current_user(&self) -> Result<User> {
        let url = format!("{}/user", self.organization_url());
        let user: User = self.get_json(&url).await?;
        if user.id.is_empty() {
            return Err(PortcullisError::Other(anyhow!("user payload has no id")));
        }
        Ok(user)
    }
}
