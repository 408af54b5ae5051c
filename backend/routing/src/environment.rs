//! Environment resolution: map a route token (id or alias) to an
//! environment and to the URL the browser should end up on.
//!
//! Resolution is idempotent: resolving the URL it produces again yields a
//! plain match with no further rewrite.

use portcullis_core::{Environment, PortcullisError, Result};
use tracing::{debug, info};

use crate::navigation::Navigation;

// ---------------------------------------------------------------------------
// Resolution result
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnvironmentResolution {
    /// The token already is the preferred reference (or the environment has
    /// no alias): no rewrite.
    Matched { environment: Environment },
    /// The token is the id of an environment that has an alias: same
    /// environment, URL rewritten to use the alias.
    Canonicalize { environment: Environment, url: String },
    /// Nothing matched: silent fallback to the first environment.
    Fallback { environment: Environment, url: String },
}

impl EnvironmentResolution {
    pub fn environment(&self) -> &Environment {
        match self {
            EnvironmentResolution::Matched { environment }
            | EnvironmentResolution::Canonicalize { environment, .. }
            | EnvironmentResolution::Fallback { environment, .. } => environment,
        }
    }

    pub fn redirect_url(&self) -> Option<&str> {
        match self {
            EnvironmentResolution::Matched { .. } => None,
            EnvironmentResolution::Canonicalize { url, .. }
            | EnvironmentResolution::Fallback { url, .. } => Some(url),
        }
    }
}

// ---------------------------------------------------------------------------
// Resolver
// ---------------------------------------------------------------------------

/// Resolve `token` against `environments` for a navigation to `nav`.
///
/// Fails only when there are no environments at all.
pub fn resolve_environment(
    environments: &[Environment],
    token: &str,
    nav: &Navigation,
) -> Result<EnvironmentResolution> {
    let Some(first) = environments.first() else {
        return Err(PortcullisError::NoEnvironments);
    };

    let Some(environment) = environments.iter().find(|env| env.matches(token)) else {
        let url = format!("/{}", first.preferred_ref());
        info!("[Env] '{}' not found, falling back to {}", token, url);
        return Ok(EnvironmentResolution::Fallback {
            environment: first.clone(),
            url,
        });
    };

    let requested_by_id = environment.id.eq_ignore_ascii_case(token);
    match environment.hrids.first() {
        Some(alias) if requested_by_id => {
            let url = nav
                .replace_segment(token, alias)
                .unwrap_or_else(|| format!("/{alias}"));
            debug!("[Env] {} → canonical {}", nav, url);
            Ok(EnvironmentResolution::Canonicalize {
                environment: environment.clone(),
                url,
            })
        }
        _ => Ok(EnvironmentResolution::Matched {
            environment: environment.clone(),
        }),
    }
}
