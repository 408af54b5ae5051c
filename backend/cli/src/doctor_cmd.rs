//! CLI Doctor Command
//!
//! Validates the loaded config and probes each management endpoint the
//! guards depend on.

use std::process::ExitCode;

use anyhow::Result;
use portcullis_config::PortcullisConfig;
use portcullis_core::{EnvironmentSource, UserSource};

use crate::terminal_output::{note_denied, note_info, note_success, note_warn};
use crate::Context;

pub async fn run(ctx: &Context) -> Result<ExitCode> {
    println!("\nRunning Portcullis doctor...\n");

    let config_ok = check_config(ctx);
    let api_ok = check_management(ctx).await;

    println!();
    if config_ok && api_ok {
        note_success("All checks passed.");
        Ok(ExitCode::SUCCESS)
    } else {
        note_denied("Some checks failed. Fix the errors above.");
        Ok(ExitCode::FAILURE)
    }
}

#[derive(Debug, PartialEq, Eq)]
enum Finding {
    Warn(String),
    Error(String),
}

/// One line per validation warning and error, warnings first.
fn config_findings(config: &PortcullisConfig) -> Vec<Finding> {
    let report = portcullis_config::validate(config);
    let warnings = report
        .warnings
        .iter()
        .map(|w| Finding::Warn(format!("{}: {}", w.path, w.message)));
    let errors = report
        .errors
        .iter()
        .map(|e| Finding::Error(format!("{}: {}", e.path, e.message)));
    warnings.chain(errors).collect()
}

fn check_config(ctx: &Context) -> bool {
    println!("Config:");
    let mut ok = true;
    for finding in config_findings(&ctx.config) {
        match finding {
            Finding::Warn(msg) => note_warn(&msg),
            Finding::Error(msg) => {
                note_denied(&msg);
                ok = false;
            }
        }
    }
    if ok {
        note_success(&format!("management API at {}", ctx.settings.base_url));
    }
    ok
}

async fn check_management(ctx: &Context) -> bool {
    println!("Management API:");
    let mut ok = true;

    match ctx.client.current_user().await {
        Ok(user) => note_success(&format!(
            "current user {} with {} role(s)",
            user.display_name,
            user.roles.len()
        )),
        Err(e) => {
            note_denied(&format!("current user: {e}"));
            ok = false;
        }
    }

    match ctx.client.list_environments().await {
        Ok(envs) if envs.is_empty() => {
            note_denied("organization has no environments");
            ok = false;
        }
        Ok(envs) => {
            note_success(&format!("{} environment(s)", envs.len()));
            for env in &envs {
                note_info(&format!("{} ({})", env.id, env.preferred_ref()));
            }
        }
        Err(e) => {
            note_denied(&format!("environments: {e}"));
            ok = false;
        }
    }
    ok
}

#[cfg(test)]
mod tests {
    use super::*;
    use portcullis_config::{apply_all_defaults, parse_config};

    #[test]
    fn missing_token_is_reported_once() {
        let config = apply_all_defaults(PortcullisConfig::default());
        let findings = config_findings(&config);
        let token_lines = findings
            .iter()
            .filter(|f| matches!(f, Finding::Warn(msg) if msg.starts_with("management.token")))
            .count();
        assert_eq!(token_lines, 1);
        assert!(!findings.iter().any(|f| matches!(f, Finding::Error(_))));
    }

    #[test]
    fn errors_follow_warnings() {
        let config = parse_config("guards:\n  loginPath: nowhere\n").unwrap();
        let findings = config_findings(&apply_all_defaults(config));
        assert!(matches!(findings.first(), Some(Finding::Warn(_))));
        assert!(matches!(findings.last(), Some(Finding::Error(msg)) if msg.starts_with("guards.loginPath")));
    }
}
