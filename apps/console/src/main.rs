use std::{path::PathBuf, process::ExitCode};

use anyhow::Result;
use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

mod commands;
mod config;
mod render;

use commands::Command;
use config::{load_settings, normalize_server_url};

#[derive(Parser, Debug)]
#[command(name = "devco-console", about = "Manage devco projects and workspaces")]
struct Args {
    /// Workspace service base URL; overrides config and environment.
    #[arg(long)]
    server_url: Option<String>,
    /// TOML config file; defaults to ./console.toml when present.
    #[arg(long)]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

fn init_tracing(default_filter: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let args = Args::parse();
    let mut settings = load_settings(args.config.as_deref())?;
    if let Some(server_url) = &args.server_url {
        settings.server_url = normalize_server_url(server_url)?;
    }
    init_tracing(&settings.log_filter);

    let store = client_core::connect(
        &settings.server_url,
        settings.request_timeout(),
        settings.store_options(),
    )?;
    info!(
        server_url = %settings.server_url,
        command = args.command.name(),
        "console: running command"
    );

    let outcome = commands::execute(&store, &args.command).await;
    store.dispose().await;

    match outcome {
        Ok(output) => {
            print!("{output}");
            Ok(ExitCode::SUCCESS)
        }
        Err(err) => {
            warn!(command = args.command.name(), error = %err, "console: command failed");
            eprintln!("error: {err}");
            Ok(ExitCode::FAILURE)
        }
    }
}
