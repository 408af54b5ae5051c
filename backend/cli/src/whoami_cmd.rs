//! CLI Whoami Command
//!
//! Loads the current user and prints the organization permissions it grants.

use std::process::ExitCode;

use anyhow::Result;
use portcullis_core::UserSource;

use crate::terminal_output::{note_info, permission_rows, render_table};
use crate::Context;

pub async fn run(ctx: &Context) -> Result<ExitCode> {
    let user = ctx.client.current_user().await?;
    ctx.session.load_organization_permissions(&user).await;

    note_info(&format!("{} ({})", user.display_name, user.id));
    let store = ctx.session.snapshot().await;
    print!("{}", render_table(["Scope", "Id", "Permission"], &permission_rows(&store)));
    Ok(ExitCode::SUCCESS)
}
