//! Route guards: gate navigation on the permissions held by a session.
//!
//! A route with no declared requirement is always allowed. A route that
//! declares one is allowed only when the session holds at least one of the
//! listed permissions; otherwise the navigation is redirected to the login
//! route.

use std::sync::Arc;

use async_trait::async_trait;
use logging::{AccessEvent, AccessLogger};
use portcullis_core::{PermissionString, Result, Scope};
use portcullis_security::PermissionSession;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::navigation::{Navigation, API_PARAM, APPLICATION_PARAM, INTEGRATION_PARAM};

pub const DEFAULT_LOGIN_PATH: &str = "/_login";

/// `data.permissions` of a route definition.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoutePermissions {
    #[serde(default)]
    pub only: Vec<PermissionString>,
}

/// Static data attached to a route.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub permissions: Option<RoutePermissions>,
}

impl RouteData {
    /// Route open to everyone.
    pub fn unrestricted() -> Self {
        Self::default()
    }

    /// Route requiring any one of `tokens`.
    pub fn requiring(tokens: &[&str]) -> Self {
        Self {
            permissions: Some(RoutePermissions {
                only: portcullis_core::permissions(tokens),
            }),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardDecision {
    Allow,
    Redirect(String),
}

impl GuardDecision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, GuardDecision::Allow)
    }
}

/// What a guard does when a permission load fails.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LoadFailurePolicy {
    /// Abort the navigation with the load error.
    #[default]
    Abort,
    /// Keep the previous partition and evaluate against it.
    Deny,
}

#[derive(Debug, Clone)]
pub struct GuardOptions {
    pub login_path: String,
    pub on_load_failure: LoadFailurePolicy,
}

impl Default for GuardOptions {
    fn default() -> Self {
        Self {
            login_path: DEFAULT_LOGIN_PATH.to_string(),
            on_load_failure: LoadFailurePolicy::default(),
        }
    }
}

/// Result of a guard's load phase.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Prepared {
    /// Ends the navigation before any evaluation (environment fallback).
    pub stop: Option<String>,
    /// Applied only once the route is allowed (canonical URL rewrite).
    pub rewrite: Option<String>,
}

impl Prepared {
    /// Fold a later guard's result in; the first rewrite is kept.
    pub fn merge(&mut self, other: Prepared) {
        if self.stop.is_none() {
            self.stop = other.stop;
        }
        if self.rewrite.is_none() {
            self.rewrite = other.rewrite;
        }
    }
}

#[async_trait]
pub trait RouteGuard: Send + Sync {
    fn name(&self) -> &str;

    /// Load phase: trigger and await the loads implied by the navigation's
    /// params. Does not evaluate the route's requirement.
    async fn prepare(&self, _nav: &Navigation) -> Result<Prepared> {
        Ok(Prepared::default())
    }

    async fn can_activate(&self, route: &RouteData, nav: &Navigation) -> Result<GuardDecision>;

    async fn can_activate_child(
        &self,
        route: &RouteData,
        nav: &Navigation,
    ) -> Result<GuardDecision> {
        self.can_activate(route, nav).await
    }

    /// Called when navigating away from the guarded route.
    async fn can_deactivate(&self, _nav: &Navigation) -> Result<GuardDecision> {
        Ok(GuardDecision::Allow)
    }
}

/// Evaluate a route's declared requirement against the session.
pub(crate) async fn evaluate(
    guard: &str,
    session: &PermissionSession,
    options: &GuardOptions,
    route: &RouteData,
    nav: &Navigation,
) -> GuardDecision {
    let Some(required) = &route.permissions else {
        return GuardDecision::Allow;
    };

    let session_id = session.id().to_string();
    if session.has_any_matching(&required.only).await {
        AccessLogger::log_event(
            &session_id,
            AccessEvent::Allowed {
                url: nav.url.clone(),
                guard: guard.to_string(),
            },
        );
        GuardDecision::Allow
    } else {
        AccessLogger::log_event(
            &session_id,
            AccessEvent::Denied {
                url: nav.url.clone(),
                guard: guard.to_string(),
                required: required.only.iter().map(ToString::to_string).collect(),
                redirect: options.login_path.clone(),
            },
        );
        GuardDecision::Redirect(options.login_path.clone())
    }
}

/// Emit a redirect decision.
pub(crate) fn redirect(session: &PermissionSession, nav: &Navigation, to: &str) -> GuardDecision {
    AccessLogger::log_event(
        &session.id().to_string(),
        AccessEvent::Redirected {
            from: nav.url.clone(),
            to: to.to_string(),
        },
    );
    GuardDecision::Redirect(to.to_string())
}

/// Evaluate phase: stop, evaluate, then apply the pending rewrite if allowed.
pub(crate) async fn decide(
    guard: &str,
    session: &PermissionSession,
    options: &GuardOptions,
    prepared: Prepared,
    route: &RouteData,
    nav: &Navigation,
) -> GuardDecision {
    if let Some(url) = prepared.stop {
        return redirect(session, nav, &url);
    }
    match evaluate(guard, session, options, route, nav).await {
        GuardDecision::Allow => match prepared.rewrite {
            Some(url) => redirect(session, nav, &url),
            None => GuardDecision::Allow,
        },
        denied => denied,
    }
}

/// Load a scope, applying the failure policy.
pub(crate) async fn load_with_policy(
    session: &PermissionSession,
    options: &GuardOptions,
    scope: Scope,
    scope_id: &str,
) -> Result<()> {
    match session.ensure_loaded(scope, scope_id).await {
        Ok(_) => Ok(()),
        Err(e) if options.on_load_failure == LoadFailurePolicy::Deny => {
            warn!(%scope, scope_id, error = %e, "Permission load failed; evaluating previous grants");
            Ok(())
        }
        Err(e) => Err(e),
    }
}

// ---------------------------------------------------------------------------
// Organization
// ---------------------------------------------------------------------------

/// Evaluates against already loaded partitions; never triggers a load.
pub struct OrganizationPermissionGuard {
    session: Arc<PermissionSession>,
    options: GuardOptions,
}

impl OrganizationPermissionGuard {
    pub fn new(session: Arc<PermissionSession>, options: GuardOptions) -> Self {
        Self { session, options }
    }
}

#[async_trait]
impl RouteGuard for OrganizationPermissionGuard {
    fn name(&self) -> &str {
        "organization"
    }

    async fn can_activate(&self, route: &RouteData, nav: &Navigation) -> Result<GuardDecision> {
        Ok(evaluate(self.name(), &self.session, &self.options, route, nav).await)
    }
}

// ---------------------------------------------------------------------------
// Scoped (api, application, integration)
// ---------------------------------------------------------------------------

/// Loads the scope named by a route param before evaluating, and clears it
/// when the route is left.
pub struct ScopedPermissionGuard {
    name: String,
    scope: Scope,
    param: String,
    session: Arc<PermissionSession>,
    options: GuardOptions,
}

impl ScopedPermissionGuard {
    pub fn new(
        scope: Scope,
        param: impl Into<String>,
        session: Arc<PermissionSession>,
        options: GuardOptions,
    ) -> Self {
        Self {
            name: scope.to_string(),
            scope,
            param: param.into(),
            session,
            options,
        }
    }

    pub fn api(session: Arc<PermissionSession>, options: GuardOptions) -> Self {
        Self::new(Scope::Api, API_PARAM, session, options)
    }

    pub fn application(session: Arc<PermissionSession>, options: GuardOptions) -> Self {
        Self::new(Scope::Application, APPLICATION_PARAM, session, options)
    }

    pub fn integration(session: Arc<PermissionSession>, options: GuardOptions) -> Self {
        Self::new(Scope::Integration, INTEGRATION_PARAM, session, options)
    }
}

#[async_trait]
impl RouteGuard for ScopedPermissionGuard {
    fn name(&self) -> &str {
        &self.name
    }

    async fn prepare(&self, nav: &Navigation) -> Result<Prepared> {
        if let Some(scope_id) = nav.param(&self.param) {
            load_with_policy(&self.session, &self.options, self.scope, scope_id).await?;
        }
        Ok(Prepared::default())
    }

    async fn can_activate(&self, route: &RouteData, nav: &Navigation) -> Result<GuardDecision> {
        let prepared = self.prepare(nav).await?;
        Ok(decide(self.name(), &self.session, &self.options, prepared, route, nav).await)
    }

    async fn can_deactivate(&self, _nav: &Navigation) -> Result<GuardDecision> {
        self.session.clear(self.scope).await;
        Ok(GuardDecision::Allow)
    }
}
