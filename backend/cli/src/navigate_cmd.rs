//! CLI Navigate Command
//!
//! Runs the console guard chain (environment, api, application,
//! integration) for one navigation and prints the decision.

use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Result;
use clap::Args;
use portcullis_core::PermissionString;
use portcullis_routing::navigation::{API_PARAM, APPLICATION_PARAM, ENV_PARAM, INTEGRATION_PARAM};
use portcullis_routing::{
    EnvironmentGuard, GuardChain, GuardDecision, Navigation, RouteData, RoutePermissions,
    ScopedPermissionGuard,
};

use crate::terminal_output::{note_denied, note_success, note_warn};
use crate::Context;

#[derive(Args, Debug)]
pub struct NavigateArgs {
    /// Target URL, e.g. `/DEFAULT/apis/42`
    pub url: String,
    #[arg(long)]
    pub env: Option<String>,
    #[arg(long)]
    pub api: Option<String>,
    #[arg(long)]
    pub application: Option<String>,
    #[arg(long)]
    pub integration: Option<String>,
    /// Permission the route requires (repeatable; any one is enough)
    #[arg(long = "require")]
    pub require: Vec<String>,
}

impl NavigateArgs {
    fn navigation(&self) -> Navigation {
        let params = [
            (ENV_PARAM, &self.env),
            (API_PARAM, &self.api),
            (APPLICATION_PARAM, &self.application),
            (INTEGRATION_PARAM, &self.integration),
        ];
        params
            .into_iter()
            .fold(Navigation::new(&self.url), |nav, (name, value)| match value {
                Some(value) => nav.with_param(name, value),
                None => nav,
            })
    }

    /// No `--require` flag means an unrestricted route. Tokens are parsed
    /// strictly.
    fn route(&self) -> portcullis_core::Result<RouteData> {
        if self.require.is_empty() {
            return Ok(RouteData::unrestricted());
        }
        let only = self
            .require
            .iter()
            .map(|raw| PermissionString::parse(raw))
            .collect::<portcullis_core::Result<Vec<_>>>()?;
        Ok(RouteData {
            permissions: Some(RoutePermissions { only }),
        })
    }
}

pub async fn run(ctx: &Context, args: NavigateArgs) -> Result<ExitCode> {
    let route = args.route()?;
    let options = ctx.settings.guard_options();
    let session = ctx.session.clone();
    let chain = GuardChain::new(session.clone(), options.clone())
        .with(Arc::new(EnvironmentGuard::new(ctx.client.clone(), session.clone(), options.clone())))
        .with(Arc::new(ScopedPermissionGuard::api(session.clone(), options.clone())))
        .with(Arc::new(ScopedPermissionGuard::application(session.clone(), options.clone())))
        .with(Arc::new(ScopedPermissionGuard::integration(session, options)));

    let nav = args.navigation();
    match chain.activate(&route, &nav).await? {
        GuardDecision::Allow => {
            note_success(&format!("{nav}: allowed"));
            Ok(ExitCode::SUCCESS)
        }
        GuardDecision::Redirect(to) if to == ctx.settings.login_path => {
            note_denied(&format!("{nav}: denied, redirect to {to}"));
            Ok(ExitCode::FAILURE)
        }
        GuardDecision::Redirect(to) => {
            note_warn(&format!("{nav}: redirect to {to}"));
            Ok(ExitCode::SUCCESS)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(require: &[&str]) -> NavigateArgs {
        NavigateArgs {
            url: "/DEFAULT/apis/42".to_string(),
            env: Some("DEFAULT".to_string()),
            api: Some("42".to_string()),
            application: None,
            integration: None,
            require: require.iter().map(|s| s.to_string()).collect(),
        }
    }

    #[test]
    fn builds_params_from_flags() {
        let nav = args(&[]).navigation();
        assert_eq!(nav.param(ENV_PARAM), Some("DEFAULT"));
        assert_eq!(nav.param(API_PARAM), Some("42"));
        assert_eq!(nav.param(APPLICATION_PARAM), None);
    }

    #[test]
    fn no_require_flag_means_unrestricted() {
        assert_eq!(args(&[]).route().unwrap(), RouteData::unrestricted());
        let route = args(&["API-Definition-R"]).route().unwrap();
        assert_eq!(route, RouteData::requiring(&["api-definition-r"]));
    }

    #[test]
    fn malformed_require_token_is_rejected() {
        assert!(args(&["api-plan-rw"]).route().is_err());
        assert!(args(&["api-plan-r", "plan"]).route().is_err());
    }
}
