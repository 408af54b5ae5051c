//! Environment entry guard: resolves the environment token in the URL,
//! loads its permissions, evaluates the route, and issues the canonical
//! alias redirect when the URL used the raw id.

use std::sync::Arc;

use async_trait::async_trait;
use portcullis_core::{EnvironmentSource, Result, Scope};
use portcullis_security::PermissionSession;
use tracing::debug;

use crate::environment::{resolve_environment, EnvironmentResolution};
use crate::guard::{
    decide, load_with_policy, GuardDecision, GuardOptions, Prepared, RouteData, RouteGuard,
};
use crate::navigation::{Navigation, ENV_PARAM};

pub struct EnvironmentGuard {
    environments: Arc<dyn EnvironmentSource>,
    session: Arc<PermissionSession>,
    options: GuardOptions,
    param: String,
}

impl EnvironmentGuard {
    pub fn new(
        environments: Arc<dyn EnvironmentSource>,
        session: Arc<PermissionSession>,
        options: GuardOptions,
    ) -> Self {
        Self {
            environments,
            session,
            options,
            param: ENV_PARAM.to_string(),
        }
    }

    /// Read the environment token from a differently named route param.
    pub fn with_param(mut self, param: impl Into<String>) -> Self {
        self.param = param.into();
        self
    }
}

#[async_trait]
impl RouteGuard for EnvironmentGuard {
    fn name(&self) -> &str {
        "environment"
    }

    /// Resolve the token and load the environment. An unknown token stops
    /// the navigation without loading; an id token leaves a pending rewrite
    /// to the alias URL.
    async fn prepare(&self, nav: &Navigation) -> Result<Prepared> {
        let Some(token) = nav.param(&self.param) else {
            return Ok(Prepared::default());
        };

        let environments = self.environments.list_environments().await?;
        let resolution = resolve_environment(&environments, token, nav)?;

        if let EnvironmentResolution::Fallback { url, .. } = resolution {
            return Ok(Prepared {
                stop: Some(url),
                rewrite: None,
            });
        }

        let environment = resolution.environment();
        debug!(token, env = %environment.id, "Resolved environment");
        load_with_policy(&self.session, &self.options, Scope::Environment, &environment.id).await?;

        Ok(Prepared {
            stop: None,
            rewrite: resolution.redirect_url().map(str::to_string),
        })
    }

    async fn can_activate(&self, route: &RouteData, nav: &Navigation) -> Result<GuardDecision> {
        let prepared = self.prepare(nav).await?;
        Ok(decide(self.name(), &self.session, &self.options, prepared, route, nav).await)
    }

    async fn can_deactivate(&self, _nav: &Navigation) -> Result<GuardDecision> {
        self.session.clear_environment_permissions().await;
        Ok(GuardDecision::Allow)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::guard::tests::{FakeSource, FixedEnvironments};
    use portcullis_core::{permissions, Environment, PortcullisError};
    use serde_json::json;

    fn guard(envs: Vec<Environment>, source: FakeSource) -> (EnvironmentGuard, Arc<PermissionSession>) {
        let session = Arc::new(PermissionSession::new(Arc::new(source)));
        let guard = EnvironmentGuard::new(
            Arc::new(FixedEnvironments(envs)),
            session.clone(),
            GuardOptions::default(),
        );
        (guard, session)
    }

    fn default_env() -> Vec<Environment> {
        vec![Environment::new("default", &["fr-apim-master-dev"])]
    }

    #[tokio::test]
    async fn id_in_url_redirects_to_alias_after_loading() {
        let source = FakeSource::default()
            .with(Scope::Environment, "default", json!({ "API": ["R"] }));
        let (guard, session) = guard(default_env(), source);
        let nav = Navigation::new("/default").with_param(ENV_PARAM, "DEFAULT");

        let decision = guard.can_activate(&RouteData::unrestricted(), &nav).await.unwrap();
        assert_eq!(decision, GuardDecision::Redirect("/fr-apim-master-dev".to_string()));
        assert!(session.has_any_matching(&permissions(&["environment-api-r"])).await);
    }

    #[tokio::test]
    async fn alias_in_url_is_allowed_in_place() {
        let source = FakeSource::default()
            .with(Scope::Environment, "default", json!({ "API": ["R"] }));
        let (guard, _) = guard(default_env(), source);
        let nav = Navigation::new("/fr-apim-master-dev/apis").with_param(ENV_PARAM, "fr-apim-master-dev");

        let decision = guard
            .can_activate(&RouteData::requiring(&["environment-api-r"]), &nav)
            .await
            .unwrap();
        assert_eq!(decision, GuardDecision::Allow);
    }

    #[tokio::test]
    async fn denied_route_redirects_to_login_before_canonicalizing() {
        let source = FakeSource::default()
            .with(Scope::Environment, "default", json!({ "API": ["R"] }));
        let (guard, _) = guard(default_env(), source);
        let nav = Navigation::new("/default/settings").with_param(ENV_PARAM, "default");

        let decision = guard
            .can_activate(&RouteData::requiring(&["environment-settings-u"]), &nav)
            .await
            .unwrap();
        assert_eq!(decision, GuardDecision::Redirect("/_login".to_string()));
    }

    #[tokio::test]
    async fn unknown_environment_falls_back_without_loading() {
        let (guard, session) = guard(default_env(), FakeSource::default());
        let nav = Navigation::new("/nope").with_param(ENV_PARAM, "nope");

        let decision = guard.can_activate(&RouteData::unrestricted(), &nav).await.unwrap();
        assert_eq!(decision, GuardDecision::Redirect("/fr-apim-master-dev".to_string()));
        assert!(session.active_scope_id(Scope::Environment).await.is_none());
    }

    #[tokio::test]
    async fn no_environment_aborts_navigation() {
        let (guard, _) = guard(vec![], FakeSource::default());
        let nav = Navigation::new("/default").with_param(ENV_PARAM, "default");
        let err = guard.can_activate(&RouteData::unrestricted(), &nav).await.unwrap_err();
        assert!(matches!(err, PortcullisError::NoEnvironments));
    }

    #[tokio::test]
    async fn leaving_environment_clears_its_permissions() {
        let source = FakeSource::default()
            .with(Scope::Environment, "prod", json!({ "X": ["R"] }));
        let (guard, session) = guard(vec![Environment::new("prod", &[])], source);
        let nav = Navigation::new("/prod").with_param(ENV_PARAM, "prod");

        assert!(guard.can_activate(&RouteData::unrestricted(), &nav).await.unwrap().is_allowed());
        assert!(session.has_any_matching(&permissions(&["environment-x-r"])).await);

        guard.can_deactivate(&nav).await.unwrap();
        assert!(!session.has_any_matching(&permissions(&["environment-x-r"])).await);
    }
}
