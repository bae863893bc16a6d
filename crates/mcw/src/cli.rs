//! Command-line interface.
//!
//! Exit codes: 0 success, 1 generic failure, 2 configuration error,
//! 3 transport bind failure.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};

use mcw_domain::error::Error;
use mcw_domain::ops::{SyncAction, SyncDataArgs, SyncResult};
use mcw_domain::value_objects::Namespace;
use mcw_infrastructure::config::{validate_config, ConfigLoader};
use mcw_infrastructure::{AppContext, TransportMode};

/// Exit code for configuration errors.
const EXIT_CONFIG: u8 = 2;
/// Exit code for transport bind failures.
const EXIT_TRANSPORT: u8 = 3;

/// Work-management MCP server.
#[derive(Debug, Parser)]
#[command(name = "mcw", version, about)]
pub struct Cli {
    /// Configuration file (defaults to ./mcw.toml when present)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Server lifecycle
    Server {
        #[command(subcommand)]
        command: ServerCommand,
    },
    /// Operational tools
    Tools {
        #[command(subcommand)]
        command: ToolsCommand,
    },
}

#[derive(Debug, Subcommand)]
enum ServerCommand {
    /// Start the server
    Start {
        /// Transport selection
        #[arg(long)]
        mode: Option<TransportMode>,
        /// Bind address
        #[arg(long)]
        host: Option<String>,
        /// Bind port
        #[arg(long)]
        port: Option<u16>,
        /// Default namespace for stdio sessions
        #[arg(long)]
        namespace: Option<String>,
    },
}

#[derive(Debug, Subcommand)]
enum ToolsCommand {
    /// Probe a running server's health endpoint
    HealthCheck {
        /// Server base URL (defaults to the configured bind address)
        #[arg(long)]
        url: Option<String>,
    },
    /// Check the configuration and report every violation
    ValidateConfig,
    /// Namespace backups
    Backup {
        #[command(subcommand)]
        command: BackupCommand,
    },
}

#[derive(Debug, Subcommand)]
enum BackupCommand {
    /// Archive a namespace
    Create {
        /// Namespace to archive
        #[arg(long, default_value = "default")]
        namespace: String,
    },
    /// Restore a namespace from an archive
    Restore {
        /// Namespace to restore into
        #[arg(long, default_value = "default")]
        namespace: String,
        /// Archive name as printed by `backup create` or `backup list`
        archive: String,
    },
    /// List available archives
    List,
}

fn loader(cli: &Cli) -> ConfigLoader {
    match &cli.config {
        Some(path) => ConfigLoader::new().with_config_path(path),
        None => ConfigLoader::new(),
    }
}

fn exit_code_for(error: &Error) -> ExitCode {
    match error {
        Error::Config { .. } => ExitCode::from(EXIT_CONFIG),
        Error::Transport { .. } => ExitCode::from(EXIT_TRANSPORT),
        _ => ExitCode::FAILURE,
    }
}

/// Parse arguments and run. Returns the process exit code.
pub async fn run() -> ExitCode {
    let cli = Cli::parse();
    match dispatch(&cli).await {
        Ok(code) => code,
        Err(error) => {
            tracing::error!(%error, "command failed");
            eprintln!("error: {error}");
            exit_code_for(&error)
        }
    }
}

async fn dispatch(cli: &Cli) -> Result<ExitCode, Error> {
    match &cli.command {
        Command::Server {
            command: ServerCommand::Start {
                mode,
                host,
                port,
                namespace,
            },
        } => {
            let mut config = loader(cli).load()?;
            if let Some(mode) = mode {
                config.server.mode = *mode;
            }
            if let Some(host) = host {
                config.server.host = host.clone();
            }
            if let Some(port) = port {
                config.server.port = *port;
            }
            if let Some(namespace) = namespace {
                Namespace::parse(namespace)
                    .map_err(|e| Error::config(format!("--namespace: {e}")))?;
                config.namespace_default = namespace.clone();
            }
            mcw_infrastructure::logging::init(&config.log_level);
            let ctx = AppContext::build(config)?;
            mcw_server::transport::serve(ctx).await?;
            Ok(ExitCode::SUCCESS)
        }
        Command::Tools { command } => tools(cli, command).await,
    }
}

async fn tools(cli: &Cli, command: &ToolsCommand) -> Result<ExitCode, Error> {
    match command {
        ToolsCommand::HealthCheck { url } => {
            let config = loader(cli).load()?;
            let url = url.clone().unwrap_or_else(|| {
                format!("http://{}:{}/health", config.server.host, config.server.port)
            });
            let response = reqwest::get(&url)
                .await
                .map_err(|e| Error::transport(format!("health check failed: {e}")))?;
            if !response.status().is_success() {
                eprintln!("unhealthy: {} returned {}", url, response.status());
                return Ok(ExitCode::FAILURE);
            }
            let body: serde_json::Value = response
                .json()
                .await
                .map_err(|e| Error::transport(format!("health body malformed: {e}")))?;
            println!("{body}");
            Ok(ExitCode::SUCCESS)
        }
        ToolsCommand::ValidateConfig => {
            let config = loader(cli).load_unvalidated()?;
            let violations = validate_config(&config);
            if violations.is_empty() {
                println!("configuration valid");
                Ok(ExitCode::SUCCESS)
            } else {
                for violation in &violations {
                    eprintln!("invalid: {violation}");
                }
                Ok(ExitCode::from(EXIT_CONFIG))
            }
        }
        ToolsCommand::Backup { command } => {
            let config = loader(cli).load()?;
            mcw_infrastructure::logging::init(&config.log_level);
            let ctx = AppContext::build(config)?;
            backup(&ctx, command).await
        }
    }
}

async fn backup(ctx: &AppContext, command: &BackupCommand) -> Result<ExitCode, Error> {
    match command {
        BackupCommand::Create { namespace } => {
            let namespace = Namespace::parse(namespace)?;
            let result = ctx
                .sync
                .sync(&namespace, SyncDataArgs { action: SyncAction::Backup })
                .await?;
            if let SyncResult::Backup(descriptor) = result {
                println!("{}", serde_json::to_string_pretty(&descriptor)?);
            }
            Ok(ExitCode::SUCCESS)
        }
        BackupCommand::Restore { namespace, archive } => {
            let namespace = Namespace::parse(namespace)?;
            let result = ctx
                .sync
                .sync(
                    &namespace,
                    SyncDataArgs {
                        action: SyncAction::Restore {
                            archive: archive.clone(),
                        },
                    },
                )
                .await?;
            if let SyncResult::Restore(report) = result {
                println!("{}", serde_json::to_string_pretty(&report)?);
            }
            Ok(ExitCode::SUCCESS)
        }
        BackupCommand::List => {
            let backups = ctx.sync.list_backups().await?;
            println!("{}", serde_json::to_string_pretty(&backups)?);
            Ok(ExitCode::SUCCESS)
        }
    }
}
