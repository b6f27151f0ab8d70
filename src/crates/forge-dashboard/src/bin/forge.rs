//! Forge CLI - dashboard and task commands for the test-automation backend
//!
//! Main entry point for the `forge` command-line tool.

use anyhow::Context;
use clap::{Parser, Subcommand};
use forge_dashboard::cli;
use forge_dashboard::logging::{init_logging, LogTarget};
use forge_dashboard::tui::{run_tui, App};
use forge_dashboard::{
    version_info, ConfigSource, Dashboard, DashboardSettings, ForgeConfig, HttpTaskClient, Route,
    ShutdownCoordinator, TaskApi, TaskStatus,
};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::time::Instant;

#[derive(Parser)]
#[command(name = "forge")]
#[command(about = "Forge - dashboard for YAML-defined browser test tasks", long_about = None)]
#[command(version = env!("CARGO_PKG_VERSION"))]
struct Cli {
    /// Read configuration from this file instead of ~/.forge and ./.forge
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Backend origin, e.g. http://localhost:8000
    #[arg(long, env = "FORGE_BACKEND_URL", global = true)]
    backend_url: Option<String>,

    /// Poll interval for active tasks, in milliseconds
    #[arg(long, global = true)]
    poll_interval_ms: Option<u64>,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Open the terminal dashboard (default)
    Dashboard {
        /// Start on this route: /tasks or /tasks/<id>
        #[arg(short, long, default_value = "/tasks")]
        route: Route,
    },

    /// Task management commands
    #[command(subcommand)]
    Tasks(TaskCommands),

    /// Check backend health
    Status {
        /// Output format: text (default), json
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Configuration commands
    #[command(subcommand)]
    Config(ConfigCommands),

    /// Show version information
    Version,
}

#[derive(Subcommand)]
enum TaskCommands {
    /// List all tasks, newest first
    List,
    /// Show a task with its steps and execution state
    Show {
        /// Task ID
        id: String,
    },
    /// Create a new task
    Create {
        /// Task name
        name: String,
        /// Task description
        #[arg(short, long)]
        description: Option<String>,
        /// Read the YAML definition from this file
        #[arg(short, long)]
        yaml_file: Option<PathBuf>,
        /// Test case file path known to the backend
        #[arg(short, long)]
        testcase_file: Option<String>,
    },
    /// Delete a task
    Delete {
        /// Task ID
        id: String,
    },
    /// Start a task
    Start {
        /// Task ID
        id: String,
        /// Keep polling until the task settles
        #[arg(short, long)]
        watch: bool,
    },
    /// Follow a task until it settles
    Watch {
        /// Task ID
        id: String,
    },
}

#[derive(Subcommand)]
enum ConfigCommands {
    /// Write a commented default configuration file
    Init {
        /// Write ./.forge/forge.toml instead of ~/.forge/forge.toml
        #[arg(short, long)]
        project: bool,
        /// Overwrite an existing file
        #[arg(short, long)]
        force: bool,
    },
    /// Print the effective configuration
    Show,
}

async fn load(cli: &Cli) -> anyhow::Result<(ForgeConfig, ConfigSource)> {
    let source = ConfigSource::resolve(cli.config.as_deref())?;
    let mut config = source.load().await?;

    if let Some(url) = &cli.backend_url {
        config.backend.base_url = url.clone();
    }
    if let Some(interval) = cli.poll_interval_ms {
        config.polling.interval_ms = interval;
    }
    Ok((config, source))
}

fn client_for(config: &ForgeConfig) -> anyhow::Result<Arc<HttpTaskClient>> {
    let client = HttpTaskClient::new(&config.backend).context("Failed to create backend client")?;
    Ok(Arc::new(client))
}

async fn run_dashboard(config: &ForgeConfig, verbose: u8, route: Route) -> anyhow::Result<()> {
    // the dashboard owns the terminal, so logs go to a file
    let target = match config.log_file_path() {
        Some(path) => LogTarget::File(path),
        None => LogTarget::Stderr,
    };
    init_logging(&config.logging, verbose, target)?;

    let client = client_for(config)?;
    let mut dashboard = Dashboard::new(client, DashboardSettings::from(config));
    dashboard.navigate(route, Instant::now());

    let mut app = App::new(dashboard, config.ui.open_in_browser);
    run_tui(&mut app).await?;
    Ok(())
}

async fn run_tasks(command: TaskCommands, config: &ForgeConfig) -> anyhow::Result<()> {
    let client = client_for(config)?;
    let api: &dyn TaskApi = client.as_ref();

    match command {
        TaskCommands::List => cli::task::handle_list(api).await?,
        TaskCommands::Show { id } => cli::task::handle_show(api, &id).await?,
        TaskCommands::Create {
            name,
            description,
            yaml_file,
            testcase_file,
        } => {
            cli::task::handle_create(api, name, description, yaml_file.as_deref(), testcase_file).await?;
        }
        TaskCommands::Delete { id } => cli::task::handle_delete(api, &id).await?,
        TaskCommands::Start { id, watch: false } => cli::task::handle_start(api, &id).await?,
        TaskCommands::Start { id, watch: true } => watch(client, config, &id, true).await?,
        TaskCommands::Watch { id } => watch(client, config, &id, false).await?,
    }
    Ok(())
}

async fn watch(client: Arc<HttpTaskClient>, config: &ForgeConfig, id: &str, start: bool) -> anyhow::Result<()> {
    let shutdown = ShutdownCoordinator::new();
    let _signals = shutdown.install_signal_handlers();

    let status = cli::watch_task(client, DashboardSettings::from(config), id, start, &shutdown).await?;
    match status {
        Some(TaskStatus::Failed) | Some(TaskStatus::Error) => anyhow::bail!("Task {} did not pass", id),
        _ => Ok(()),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match &cli.command {
        Some(Commands::Version) => {
            println!("{}", version_info());
            return Ok(());
        }
        Some(Commands::Config(ConfigCommands::Init { project, force })) => {
            cli::config::handle_init(*project, *force)?;
            return Ok(());
        }
        _ => {}
    }

    let (config, source) = load(&cli).await?;

    match cli.command {
        None => run_dashboard(&config, cli.verbose, Route::Tasks).await,
        Some(Commands::Dashboard { route }) => run_dashboard(&config, cli.verbose, route).await,
        Some(command) => {
            init_logging(&config.logging, cli.verbose, LogTarget::Stderr)?;
            match command {
                Commands::Tasks(task_cmd) => run_tasks(task_cmd, &config).await,
                Commands::Status { format } => {
                    let client = client_for(&config)?;
                    cli::status::handle_status(&client, &format).await?;
                    Ok(())
                }
                Commands::Config(ConfigCommands::Show) => {
                    cli::config::handle_show(&config, &source)?;
                    Ok(())
                }
                Commands::Dashboard { .. } | Commands::Version | Commands::Config(ConfigCommands::Init { .. }) => Ok(()),
            }
        }
    }
}
