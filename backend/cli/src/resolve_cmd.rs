//! CLI Resolve Command

use std::process::ExitCode;

use anyhow::Result;
use clap::Args;
use portcullis_core::EnvironmentSource;
use portcullis_routing::{resolve_environment, EnvironmentResolution, Navigation};

use crate::terminal_output::{note_info, note_success, note_warn};
use crate::Context;

#[derive(Args, Debug)]
pub struct ResolveArgs {
    /// Environment id or alias
    pub token: String,
    /// URL the token appears in (defaults to `/<token>`)
    #[arg(long)]
    pub url: Option<String>,
}

pub async fn run(ctx: &Context, args: ResolveArgs) -> Result<ExitCode> {
    let url = args.url.clone().unwrap_or_else(|| format!("/{}", args.token));
    let environments = ctx.client.list_environments().await?;
    let resolution = resolve_environment(&environments, &args.token, &Navigation::new(url))?;

    let env = resolution.environment();
    match &resolution {
        EnvironmentResolution::Matched { .. } => {
            note_success(&format!("{} matches environment {}", args.token, env.id));
        }
        EnvironmentResolution::Canonicalize { url, .. } => {
            note_info(&format!("{} is environment {}; canonical URL {url}", args.token, env.id));
        }
        EnvironmentResolution::Fallback { url, .. } => {
            note_warn(&format!("{} not found; falls back to {url}", args.token));
        }
    }
    Ok(ExitCode::SUCCESS)
}
