//! Per-user permission session: owns the store and the loaders that fill it.
//!
//! Every load and every clear takes a ticket from a per-scope counter before
//! it awaits anything. A fetched result is committed only if its ticket is
//! still the newest for that scope, so the last request issued wins no
//! matter in which order responses arrive.

use std::collections::HashMap;
use std::sync::Arc;

use logging::{AccessEvent, AccessLogger};
use portcullis_core::{
    flatten, PermissionSource, PermissionString, PortcullisError, Result, Scope, User,
};
use tokio::sync::RwLock;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::store::PermissionStore;

/// What happened to a load once its response arrived.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    /// The partition was replaced with `count` tokens.
    Applied { count: usize },
    /// A newer load or clear for the same scope was issued meanwhile; the
    /// result was dropped.
    Superseded,
    /// The partition was already loaded for this scope id.
    AlreadyLoaded,
}

#[derive(Default)]
struct SessionState {
    store: PermissionStore,
    tickets: HashMap<Scope, u64>,
}

impl SessionState {
    fn issue_ticket(&mut self, scope: Scope) -> u64 {
        let ticket = self.tickets.entry(scope).or_insert(0);
        *ticket += 1;
        *ticket
    }

    fn is_current(&self, scope: Scope, ticket: u64) -> bool {
        self.tickets.get(&scope).copied() == Some(ticket)
    }
}

pub struct PermissionSession {
    id: Uuid,
    source: Arc<dyn PermissionSource>,
    state: RwLock<SessionState>,
}

impl PermissionSession {
    pub fn new(source: Arc<dyn PermissionSource>) -> Self {
        Self::with_store(source, PermissionStore::new())
    }

    /// Start from a prepared store, e.g. one carrying a testing override.
    pub fn with_store(source: Arc<dyn PermissionSource>, store: PermissionStore) -> Self {
        Self {
            id: Uuid::new_v4(),
            source,
            state: RwLock::new(SessionState {
                store,
                tickets: HashMap::new(),
            }),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Replace the organization partition from the user's organization roles.
    pub async fn load_organization_permissions(&self, user: &User) -> LoadOutcome {
        let tokens = user.organization_permissions();
        let count = tokens.len();
        let mut state = self.state.write().await;
        state.issue_ticket(Scope::Organization);
        state.store.replace(Scope::Organization, None, tokens);
        info!(user = %user.id, count, "Loaded organization permissions");
        LoadOutcome::Applied { count }
    }

    pub async fn load_environment_permissions(&self, env_id: &str) -> Result<LoadOutcome> {
        self.load_scope(Scope::Environment, env_id).await
    }

    pub async fn load_api_permissions(&self, api_id: &str) -> Result<LoadOutcome> {
        self.load_scope(Scope::Api, api_id).await
    }

    pub async fn load_application_permissions(&self, app_id: &str) -> Result<LoadOutcome> {
        self.load_scope(Scope::Application, app_id).await
    }

    pub async fn load_integration_permissions(&self, integration_id: &str) -> Result<LoadOutcome> {
        self.load_scope(Scope::Integration, integration_id).await
    }

    /// Fetch `scope_id`'s CRUD map and replace the scope's partition.
    ///
    /// Api, application and integration loads are resolved against the
    /// committed environment partition at the time the load is issued. On
    /// failure the previous partition is left untouched.
    pub async fn load_scope(&self, scope: Scope, scope_id: &str) -> Result<LoadOutcome> {
        let (ticket, environment) = {
            let mut state = self.state.write().await;
            let environment = scope
                .is_environment_relative()
                .then(|| state.store.active_scope_id(Scope::Environment).map(str::to_string))
                .flatten();
            (state.issue_ticket(scope), environment)
        };
        debug!(%scope, scope_id, ticket, environment = ?environment, "Loading permissions");

        let fetched = self
            .source
            .fetch_permissions(scope, scope_id, environment.as_deref())
            .await;
        let map = match fetched {
            Ok(map) => map,
            Err(e) => {
                let err = match e {
                    e @ PortcullisError::Load { .. } => e,
                    other => PortcullisError::load(scope, scope_id, other),
                };
                AccessLogger::log_event(
                    &self.id.to_string(),
                    AccessEvent::LoadFailed {
                        scope: scope.to_string(),
                        scope_id: scope_id.to_string(),
                        error: err.to_string(),
                    },
                );
                return Err(err);
            }
        };

        let tokens = flatten(scope, &map);
        let count = tokens.len();

        let mut state = self.state.write().await;
        if !state.is_current(scope, ticket) {
            warn!(%scope, scope_id, ticket, "Dropping superseded permission load");
            AccessLogger::log_event(
                &self.id.to_string(),
                AccessEvent::LoadSuperseded {
                    scope: scope.to_string(),
                    scope_id: scope_id.to_string(),
                },
            );
            return Ok(LoadOutcome::Superseded);
        }
        state.store.replace(scope, Some(scope_id.to_string()), tokens);
        info!(%scope, scope_id, count, "Replaced permission partition");
        Ok(LoadOutcome::Applied { count })
    }

    /// Load only if the active partition belongs to a different scope id.
    pub async fn ensure_loaded(&self, scope: Scope, scope_id: &str) -> Result<LoadOutcome> {
        if self.state.read().await.store.active_scope_id(scope) == Some(scope_id) {
            return Ok(LoadOutcome::AlreadyLoaded);
        }
        self.load_scope(scope, scope_id).await
    }

    /// Empty the scope's partition and invalidate loads still in flight.
    pub async fn clear(&self, scope: Scope) {
        let mut state = self.state.write().await;
        state.issue_ticket(scope);
        state.store.clear(scope);
        debug!(%scope, "Cleared permission partition");
    }

    pub async fn clear_environment_permissions(&self) {
        self.clear(Scope::Environment).await;
    }

    pub async fn clear_api_permissions(&self) {
        self.clear(Scope::Api).await;
    }

    pub async fn clear_application_permissions(&self) {
        self.clear(Scope::Application).await;
    }

    pub async fn clear_integration_permissions(&self) {
        self.clear(Scope::Integration).await;
    }

    pub async fn has_any_matching(&self, required: &[PermissionString]) -> bool {
        self.state.read().await.store.has_any_matching(required)
    }

    pub async fn active_scope_id(&self, scope: Scope) -> Option<String> {
        self.state
            .read()
            .await
            .store
            .active_scope_id(scope)
            .map(str::to_string)
    }

    /// Copy of the current store, for display and diagnostics.
    pub async fn snapshot(&self) -> PermissionStore {
        self.state.read().await.store.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use portcullis_core::{permissions, CrudGrant, CrudMap};
    use serde_json::json;
    use std::sync::Mutex;
    use tokio::sync::oneshot;

    /// Serves canned CRUD maps keyed by (scope, id); unknown keys fail.
    #[derive(Default)]
    struct StaticSource {
        grants: HashMap<(Scope, String), CrudMap>,
    }

    impl StaticSource {
        fn with(mut self, scope: Scope, id: &str, payload: serde_json::Value) -> Self {
            self.grants
                .insert((scope, id.to_string()), CrudMap::from_json(payload).unwrap());
            self
        }
    }

    #[async_trait]
    impl PermissionSource for StaticSource {
        async fn fetch_permissions(
            &self,
            scope: Scope,
            scope_id: &str,
            _environment: Option<&str>,
        ) -> Result<CrudMap> {
            self.grants
                .get(&(scope, scope_id.to_string()))
                .cloned()
                .ok_or_else(|| PortcullisError::InvalidResponse(format!("404 for {scope_id}")))
        }
    }

    fn session(source: StaticSource) -> PermissionSession {
        PermissionSession::new(Arc::new(source))
    }

    #[tokio::test]
    async fn environment_load_replaces_previous_environment() {
        let session = session(
            StaticSource::default()
                .with(Scope::Environment, "env-a", json!({ "API": ["C"] }))
                .with(Scope::Environment, "env-b", json!({ "X": ["R"] })),
        );

        session.load_environment_permissions("env-a").await.unwrap();
        assert!(session.has_any_matching(&permissions(&["environment-api-c"])).await);

        let outcome = session.load_environment_permissions("env-b").await.unwrap();
        assert_eq!(outcome, LoadOutcome::Applied { count: 1 });
        assert!(session.has_any_matching(&permissions(&["environment-x-r"])).await);
        assert!(!session.has_any_matching(&permissions(&["environment-api-c"])).await);
    }

    #[tokio::test]
    async fn failed_load_keeps_previous_partition() {
        let session = session(
            StaticSource::default().with(Scope::Api, "api-1", json!({ "PLAN": "R" })),
        );
        session.load_api_permissions("api-1").await.unwrap();

        let err = session.load_api_permissions("missing").await.unwrap_err();
        assert!(matches!(err, PortcullisError::Load { scope: Scope::Api, .. }));
        assert!(session.has_any_matching(&permissions(&["api-plan-r"])).await);
        assert_eq!(session.active_scope_id(Scope::Api).await.as_deref(), Some("api-1"));
    }

    #[tokio::test]
    async fn clear_denies_environment_tokens() {
        let session = session(
            StaticSource::default().with(Scope::Environment, "default", json!({ "X": ["R"] })),
        );
        session.load_environment_permissions("default").await.unwrap();
        session.clear_environment_permissions().await;
        assert!(!session.has_any_matching(&permissions(&["environment-x-r"])).await);
    }

    #[tokio::test]
    async fn organization_permissions_come_from_user() {
        let session = session(StaticSource::default());
        let user: User = serde_json::from_value(json!({
            "id": "admin",
            "roles": [{ "scope": "ORGANIZATION", "permissions": { "ENVIRONMENT": ["R"] } }]
        }))
        .unwrap();

        let outcome = session.load_organization_permissions(&user).await;
        assert_eq!(outcome, LoadOutcome::Applied { count: 1 });
        assert!(session.has_any_matching(&permissions(&["organization-environment-r"])).await);

        session.load_organization_permissions(&User { roles: vec![], ..user }).await;
        assert!(!session.has_any_matching(&permissions(&["organization-environment-r"])).await);
    }

    #[tokio::test]
    async fn ensure_loaded_skips_same_scope_id() {
        let session = session(
            StaticSource::default().with(Scope::Application, "app-1", json!({ "ANALYTICS": ["R"] })),
        );
        assert_eq!(
            session.ensure_loaded(Scope::Application, "app-1").await.unwrap(),
            LoadOutcome::Applied { count: 1 }
        );
        assert_eq!(
            session.ensure_loaded(Scope::Application, "app-1").await.unwrap(),
            LoadOutcome::AlreadyLoaded
        );
    }

    /// Holds the response for one id until released, so tests can control
    /// which response arrives first. Records the environment each nested
    /// scope fetch was issued against.
    struct GatedSource {
        gates: Mutex<HashMap<String, oneshot::Receiver<()>>>,
        environments: Mutex<Vec<(String, Option<String>)>>,
    }

    impl GatedSource {
        fn gated(id: &str, gate: oneshot::Receiver<()>) -> Self {
            Self {
                gates: Mutex::new(HashMap::from([(id.to_string(), gate)])),
                environments: Mutex::new(Vec::new()),
            }
        }

        fn environment_of(&self, id: &str) -> Option<Option<String>> {
            self.environments
                .lock()
                .unwrap()
                .iter()
                .find(|(seen, _)| seen == id)
                .map(|(_, env)| env.clone())
        }
    }

    #[async_trait]
    impl PermissionSource for GatedSource {
        async fn fetch_permissions(
            &self,
            scope: Scope,
            scope_id: &str,
            environment: Option<&str>,
        ) -> Result<CrudMap> {
            if scope.is_environment_relative() {
                self.environments
                    .lock()
                    .unwrap()
                    .push((scope_id.to_string(), environment.map(str::to_string)));
            }
            let gate = self.gates.lock().unwrap().remove(scope_id);
            if let Some(gate) = gate {
                let _ = gate.await;
            }
            let resource = format!("from_{}", scope_id.replace('-', "_"));
            Ok(std::iter::once((resource, CrudGrant::Letters("r".to_string()))).collect())
        }
    }

    #[tokio::test]
    async fn newest_request_wins_over_late_response() {
        let (release_old, old_gate) = oneshot::channel();
        let source = Arc::new(GatedSource::gated("env-old", old_gate));
        let session = Arc::new(PermissionSession::new(source.clone()));

        let slow = {
            let session = session.clone();
            tokio::spawn(async move { session.load_environment_permissions("env-old").await })
        };
        tokio::task::yield_now().await;
        while session.state.read().await.tickets.get(&Scope::Environment).is_none() {
            tokio::task::yield_now().await;
        }

        let fresh = session.load_environment_permissions("env-new").await.unwrap();
        assert_eq!(fresh, LoadOutcome::Applied { count: 1 });

        release_old.send(()).unwrap();
        let stale = slow.await.unwrap().unwrap();
        assert_eq!(stale, LoadOutcome::Superseded);

        assert_eq!(
            session.active_scope_id(Scope::Environment).await.as_deref(),
            Some("env-new")
        );
        assert!(session.has_any_matching(&permissions(&["environment-from_env_new-r"])).await);
        assert!(!session.has_any_matching(&permissions(&["environment-from_env_old-r"])).await);

        // Nested scopes follow the committed environment, not the last response.
        session.load_api_permissions("a1").await.unwrap();
        assert_eq!(source.environment_of("a1"), Some(Some("env-new".to_string())));
    }

    #[tokio::test]
    async fn nested_scopes_lose_environment_after_clear() {
        let (_release, gate) = oneshot::channel();
        let source = Arc::new(GatedSource::gated("never-used", gate));
        let session = PermissionSession::new(source.clone());

        session.load_environment_permissions("prod").await.unwrap();
        session.load_application_permissions("app-1").await.unwrap();
        assert_eq!(source.environment_of("app-1"), Some(Some("prod".to_string())));

        session.clear_environment_permissions().await;
        session.load_integration_permissions("int-1").await.unwrap();
        assert_eq!(source.environment_of("int-1"), Some(None));
    }

    #[tokio::test]
    async fn clear_invalidates_in_flight_load() {
        let (release, gate) = oneshot::channel();
        let source = GatedSource::gated("int-1", gate);
        let session = Arc::new(PermissionSession::new(Arc::new(source)));

        let pending = {
            let session = session.clone();
            tokio::spawn(async move { session.load_integration_permissions("int-1").await })
        };
        while session.state.read().await.tickets.get(&Scope::Integration).is_none() {
            tokio::task::yield_now().await;
        }
        session.clear_integration_permissions().await;
        release.send(()).unwrap();

        assert_eq!(pending.await.unwrap().unwrap(), LoadOutcome::Superseded);
        assert!(session.active_scope_id(Scope::Integration).await.is_none());
    }
}
