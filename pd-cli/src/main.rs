//! prodev CLI - runs the messaging API and the database and GitHub demos.

mod commands;

use std::path::Path;

use clap::{Parser, Subcommand};
use tracing::info;

use pd_core::config::AppConfig;
use pd_core::error::PdResult;
use pd_core::logging;

/// prodev - messaging API and database toolkit.
#[derive(Parser)]
#[command(
    name = "prodev",
    version,
    about = "prodev messaging API and database toolkit",
    long_about = "Serve the messaging REST API, inspect GitHub organisations and\n\
                  run the SQLite demos against users.db and user_data."
)]
struct Cli {
    /// Path to the configuration file.
    #[arg(short, long, global = true)]
    config: Option<String>,

    /// Enable verbose logging (debug level).
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Output format (text, json).
    #[arg(short = 'f', long, global = true, default_value = "text")]
    format: OutputFormat,

    #[command(subcommand)]
    command: Commands,
}

/// Output format for CLI responses.
#[derive(Debug, Clone, Copy, clap::ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text output.
    Text,
    /// JSON output for scripting.
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the messaging REST API.
    Serve {
        /// Address to listen on (overrides config).
        #[arg(short, long)]
        bind: Option<String>,
    },
    /// Query GitHub organisations.
    Github {
        #[command(subcommand)]
        action: commands::github::GithubAction,
    },
    /// Demos against the users.db `users` table.
    Users {
        #[command(subcommand)]
        action: commands::users::UsersAction,
    },
    /// Seed and stream the `user_data` table.
    Data {
        #[command(subcommand)]
        action: commands::data::DataAction,
    },
    /// Messaging database management.
    Db {
        #[command(subcommand)]
        action: commands::db::DbAction,
    },
}

fn load_config(path: Option<&str>) -> PdResult<AppConfig> {
    let config = match path {
        Some(path) => AppConfig::load_from_file(Path::new(path))?,
        None => AppConfig::load_default()?,
    };
    config.validate()?;
    Ok(config)
}

#[tokio::main]
async fn main() -> PdResult<()> {
    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref())?;

    let log_level = if cli.verbose { "debug".to_string() } else { config.logging.level.clone() };

    // The server logs to rotating files; short commands log to stderr only.
    let command = cli.command;
    if !matches!(command, Commands::Serve { .. }) {
        logging::init_console_logging(&log_level);
    }

    match command {
        Commands::Serve { bind } => {
            let log_dir = config.effective_log_dir()?;
            let _guard = logging::init_logging(&log_level, &log_dir, config.logging.json_output)?;
            info!("prodev v{}", pd_core::constants::APP_VERSION);
            commands::serve::run(config, bind).await
        }
        Commands::Github { action } => commands::github::run(&config, action, cli.format).await,
        Commands::Users { action } => commands::users::run(&config, action, cli.format).await,
        Commands::Data { action } => commands::data::run(&config, action, cli.format),
        Commands::Db { action } => commands::db::run(&config, action, cli.format),
    }
}
