//! CLI Config Command
//!
//! Prints the effective config as YAML with secrets masked.

use std::process::ExitCode;

use anyhow::Result;
use clap::Subcommand;

use crate::Context;

#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    /// Print the effective config with secrets masked
    Show,
}

pub fn run(ctx: &Context, command: ConfigCommand) -> Result<ExitCode> {
    match command {
        ConfigCommand::Show => show(ctx),
    }
}

fn show(ctx: &Context) -> Result<ExitCode> {
    let value = serde_json::to_value(&ctx.config)?;
    let redacted = portcullis_config::redact(&value);
    print!("{}", serde_yaml::to_string(&redacted)?);
    Ok(ExitCode::SUCCESS)
}
