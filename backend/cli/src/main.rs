mod check_cmd;
mod config;
mod config_cmd;
mod doctor_cmd;
mod navigate_cmd;
mod resolve_cmd;
mod terminal_output;
mod whoami_cmd;

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::debug;

use portcullis_client::ManagementClient;
use portcullis_config::PortcullisConfig;
use portcullis_security::{PermissionSession, PermissionStore};

use config::Settings;

#[derive(Parser)]
#[command(name = "portcullis")]
#[command(about = "Portcullis: console permission evaluation against the management API")]
#[command(version)]
struct Cli {
    /// Config file (defaults to ~/.portcullis/config.yaml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the current user and its organization permissions
    Whoami,
    /// Load scopes and test whether any of the given permissions is held
    Check(check_cmd::CheckArgs),
    /// Run the route guards for a navigation and print the decision
    Navigate(navigate_cmd::NavigateArgs),
    /// Resolve an environment id or alias to its canonical URL
    Resolve(resolve_cmd::ResolveArgs),
    /// Validate the config and probe the management API
    Doctor,
    /// Inspect the effective config
    Config {
        #[command(subcommand)]
        command: config_cmd::ConfigCommand,
    },
}

/// Management client and permission session shared by the commands.
pub struct Context {
    pub settings: Settings,
    pub config: PortcullisConfig,
    pub client: Arc<ManagementClient>,
    pub session: Arc<PermissionSession>,
}

impl Context {
    fn new(settings: Settings, config: PortcullisConfig) -> Result<Self> {
        let client = Arc::new(ManagementClient::new(settings.client_settings())?);
        let store = PermissionStore::with_testing_override(settings.testing_override.clone());
        let session = Arc::new(PermissionSession::with_store(client.clone(), store));
        debug!(session = %session.id(), "Created permission session");
        Ok(Self {
            settings,
            config,
            client,
            session,
        })
    }
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    let path = cli
        .config
        .unwrap_or_else(|| portcullis_config::config_file_path(&portcullis_config::config_dir()));
    let config = portcullis_config::load_and_prepare(&path).await?;
    let settings = Settings::from_config(&config)?;

    logging::init_logger(&settings.logger_options());

    let ctx = Context::new(settings, config)?;

    match cli.command {
        Commands::Whoami => whoami_cmd::run(&ctx).await,
        Commands::Check(args) => check_cmd::run(&ctx, args).await,
        Commands::Navigate(args) => navigate_cmd::run(&ctx, args).await,
        Commands::Resolve(args) => resolve_cmd::run(&ctx, args).await,
        Commands::Doctor => doctor_cmd::run(&ctx).await,
        Commands::Config { command } => config_cmd::run(&ctx, command),
    }
}
