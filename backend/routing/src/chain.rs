//! Guard chain: every guard's load phase runs first, in declaration order;
//! the route's requirement is then evaluated once against everything
//! loaded, and a pending canonical rewrite is applied last.

use std::sync::Arc;

use portcullis_core::Result;
use portcullis_security::PermissionSession;
use tracing::debug;

use crate::guard::{decide, GuardDecision, GuardOptions, Prepared, RouteData, RouteGuard};
use crate::navigation::Navigation;

#[derive(Clone)]
pub struct GuardChain {
    session: Arc<PermissionSession>,
    options: GuardOptions,
    guards: Vec<Arc<dyn RouteGuard>>,
}

impl GuardChain {
    pub fn new(session: Arc<PermissionSession>, options: GuardOptions) -> Self {
        Self {
            session,
            options,
            guards: Vec::new(),
        }
    }

    pub fn with(mut self, guard: Arc<dyn RouteGuard>) -> Self {
        self.guards.push(guard);
        self
    }

    pub fn len(&self) -> usize {
        self.guards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.guards.is_empty()
    }

    async fn prepare(&self, nav: &Navigation) -> Result<Prepared> {
        let mut prepared = Prepared::default();
        for guard in &self.guards {
            prepared.merge(guard.prepare(nav).await?);
            if prepared.stop.is_some() {
                debug!("[Guards] {} stopped {} before evaluation", guard.name(), nav);
                break;
            }
        }
        Ok(prepared)
    }

    pub async fn activate(&self, route: &RouteData, nav: &Navigation) -> Result<GuardDecision> {
        let prepared = self.prepare(nav).await?;
        Ok(decide("chain", &self.session, &self.options, prepared, route, nav).await)
    }

    /// Loads are skipped for scopes already loaded for the same id, so
    /// re-running the load phase for a child route is cheap.
    pub async fn activate_child(&self, route: &RouteData, nav: &Navigation) -> Result<GuardDecision> {
        self.activate(route, nav).await
    }

    /// Run every guard's deactivation hook, innermost scope first.
    pub async fn deactivate(&self, nav: &Navigation) -> Result<GuardDecision> {
        for guard in self.guards.iter().rev() {
            let decision = guard.can_deactivate(nav).await?;
            if !decision.is_allowed() {
                return Ok(decision);
            }
        }
        Ok(GuardDecision::Allow)
    }
}
