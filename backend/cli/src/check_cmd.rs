//! CLI Check Command
//!
//! Loads the requested scopes and reports whether the session holds any of
//! the given permissions. Exits non-zero on deny.

use std::process::ExitCode;

use anyhow::{bail, Result};
use clap::Args;
use portcullis_core::{EnvironmentSource, PermissionString, UserSource};
use portcullis_routing::{resolve_environment, EnvironmentResolution, Navigation};
use portcullis_security::LoadOutcome;
use tracing::info;

use crate::terminal_output::{note_denied, note_info, note_success};
use crate::Context;

#[derive(Args, Debug)]
pub struct CheckArgs {
    /// Environment id or alias
    #[arg(long)]
    pub env: Option<String>,
    #[arg(long)]
    pub api: Option<String>,
    #[arg(long)]
    pub application: Option<String>,
    #[arg(long)]
    pub integration: Option<String>,
    /// Don't load organization permissions from the current user
    #[arg(long)]
    pub skip_user: bool,
    /// Permissions to test, e.g. `environment-api-c`
    #[arg(required = true)]
    pub perms: Vec<String>,
}

pub async fn run(ctx: &Context, args: CheckArgs) -> Result<ExitCode> {
    let required = args
        .perms
        .iter()
        .map(|raw| PermissionString::parse(raw))
        .collect::<portcullis_core::Result<Vec<_>>>()?;

    if !args.skip_user {
        let user = ctx.client.current_user().await?;
        ctx.session.load_organization_permissions(&user).await;
    }

    if let Some(token) = &args.env {
        let environments = ctx.client.list_environments().await?;
        let resolution = resolve_environment(&environments, token, &Navigation::new(format!("/{token}")))?;
        if let EnvironmentResolution::Fallback { .. } = resolution {
            bail!("unknown environment '{token}'");
        }
        let env_id = resolution.environment().id.clone();
        report(&env_id, ctx.session.load_environment_permissions(&env_id).await?);
    }

    if let Some(id) = &args.api {
        report(id, ctx.session.load_api_permissions(id).await?);
    }
    if let Some(id) = &args.application {
        report(id, ctx.session.load_application_permissions(id).await?);
    }
    if let Some(id) = &args.integration {
        report(id, ctx.session.load_integration_permissions(id).await?);
    }

    let allowed = ctx.session.has_any_matching(&required).await;
    let listed = args.perms.join(", ");
    info!(allowed, required = %listed, "Permission check");
    if allowed {
        note_success(&format!("allowed: holds one of [{listed}]"));
        Ok(ExitCode::SUCCESS)
    } else {
        note_denied(&format!("none of [{listed}] is held"));
        Ok(ExitCode::FAILURE)
    }
}

fn report(scope_id: &str, outcome: LoadOutcome) {
    match outcome {
        LoadOutcome::Applied { count } => note_info(&format!("{scope_id}: {count} permission(s) loaded")),
        LoadOutcome::AlreadyLoaded => note_info(&format!("{scope_id}: already loaded")),
        LoadOutcome::Superseded => note_info(&format!("{scope_id}: superseded by a newer load")),
    }
}
