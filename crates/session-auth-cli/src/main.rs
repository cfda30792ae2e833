//! session-auth - command-line client for JSON auth APIs.

mod api;
mod commands;
mod output;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::debug;

/// Sign in to a JSON auth API and make authorized requests.
#[derive(Parser)]
#[command(name = "session-auth")]
#[command(about = "Session manager for JSON auth APIs")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Base URL of the API
    #[arg(long, env = "SESSION_AUTH_API_URL", global = true, default_value = "http://localhost:8080")]
    api_url: String,

    /// Session store file (defaults to the platform data directory)
    #[arg(long, env = "SESSION_AUTH_STORE", global = true)]
    store: Option<PathBuf>,

    /// Output format (text or json)
    #[arg(short, long, default_value = "text", global = true)]
    format: output::OutputFormat,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "SESSION_AUTH_LOG_LEVEL", default_value = "warn", global = true)]
    log_level: String,

    /// Also write JSON-lines logs to this file
    #[arg(long, env = "SESSION_AUTH_LOG_FILE", global = true)]
    log_file: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Login with email and password
    Login {
        /// Account email (prompted if omitted)
        #[arg(short, long)]
        email: Option<String>,

        /// Read the password from stdin instead of prompting
        #[arg(long)]
        password_stdin: bool,
    },

    /// Logout and clear the stored session
    Logout,

    /// Show the current session
    Status,

    /// Refresh the access token now
    Refresh,

    /// Send an authorized request to the API
    Request {
        /// Path relative to the API URL
        path: String,

        /// HTTP method
        #[arg(short = 'X', long, default_value = "GET")]
        method: String,

        /// JSON request body
        #[arg(short, long)]
        data: Option<String>,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if let Err(e) = observability::init_with_config(observability::LogConfig {
        service_name: "session-auth".into(),
        default_level: cli.log_level.clone(),
        log_path: cli.log_file.clone(),
        also_stderr: true,
    }) {
        eprintln!("Warning: logging disabled: {}", e);
    }

    let result = run(cli).await;

    if let Err(e) = result {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let ctx = commands::Context::new(&cli.api_url, cli.store, cli.format)?;
    debug!(store = %ctx.store_path().display(), "Using session store");

    match cli.command {
        Commands::Login {
            email,
            password_stdin,
        } => commands::login(&ctx, email, password_stdin).await,
        Commands::Logout => commands::logout(&ctx).await,
        Commands::Status => commands::status(&ctx).await,
        Commands::Refresh => commands::refresh(&ctx).await,
        Commands::Request { path, method, data } => {
            commands::request(&ctx, &method, &path, data.as_deref()).await
        }
    }
}
