use anyhow::Result;
use clap::Parser;
use tokio::signal;
use tracing_subscriber::EnvFilter;

use docqa::cli::commands::{handle_ask, handle_chat, handle_chunks, handle_index, handle_status};
use docqa::cli::{Cli, Commands};
use docqa::models::Config;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_filter = if cli.verbose { "docqa=debug" } else { "docqa=warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = Config::load_or_default();
    let format = cli.format.unwrap_or(config.query.default_format);
    let verbose = cli.verbose;

    tokio::select! {
        result = run_command(cli.command, format, verbose) => {
            result?;
        }
        _ = shutdown_signal() => {
            eprintln!("\nReceived shutdown signal, cleaning up...");
            tokio::time::sleep(tokio::time::Duration::from_millis(100)).await;
        }
    }

    Ok(())
}

async fn run_command(
    command: Commands,
    format: docqa::models::OutputFormat,
    verbose: bool,
) -> Result<()> {
    match command {
        Commands::Index(args) => {
            handle_index(args, format, verbose).await?;
        }
        Commands::Ask(args) => {
            handle_ask(args, format, verbose).await?;
        }
        Commands::Chat(args) => {
            handle_chat(args, format, verbose).await?;
        }
        Commands::Chunks(args) => {
            handle_chunks(args, format, verbose).await?;
        }
        Commands::Status => {
            handle_status(format, verbose).await?;
        }
    }

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
