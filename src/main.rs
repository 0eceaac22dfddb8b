use anyhow::Result;
use clap::Parser;
use tokio::signal;
use tokio_util::sync::CancellationToken;
use tracing::debug;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use docqa::cli::commands::{handle_ask, handle_config, handle_ingest, handle_serve, handle_status};
use docqa::cli::output::{describe_error, get_formatter};
use docqa::cli::{Cli, Commands};
use docqa::models::{Config, OutputFormat};

/// Logs go to stderr so stdout stays clean for `--format json`.
fn init_tracing(verbose: bool, serving: bool) {
    let default_level = match (verbose, serving) {
        (true, _) => "docqa=debug",
        (false, true) => "docqa=info",
        (false, false) => "docqa=warn",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .with(filter)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    init_tracing(cli.verbose, matches!(cli.command, Commands::Serve(_)));

    let format = cli
        .format
        .unwrap_or_else(|| Config::load().unwrap_or_default().output.default_format);
    let verbose = cli.verbose;

    let cancel = CancellationToken::new();
    let watcher = tokio::spawn({
        let cancel = cancel.clone();
        async move {
            shutdown_signal().await;
            eprintln!("\nReceived shutdown signal, cancelling...");
            cancel.cancel();
        }
    });

    let result = run_command(cli.command, format, verbose, cancel).await;
    watcher.abort();

    if let Err(err) = result {
        debug!(error = ?err, "command failed");
        let formatter = get_formatter(format);
        eprintln!("{}", formatter.format_error(&describe_error(&err)).trim_end());
        std::process::exit(1);
    }
    Ok(())
}

async fn run_command(
    command: Commands,
    format: OutputFormat,
    verbose: bool,
    cancel: CancellationToken,
) -> Result<()> {
    match command {
        Commands::Ingest(args) => {
            handle_ingest(args, format, verbose, cancel).await?;
        }
        Commands::Ask(args) => {
            handle_ask(args, format, verbose, cancel).await?;
        }
        Commands::Serve(args) => {
            handle_serve(args, cancel).await?;
        }
        Commands::Status => {
            handle_status(format, verbose).await?;
        }
        Commands::Config(cmd) => {
            handle_config(cmd, format, verbose).await?;
        }
    }

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if signal::ctrl_c().await.is_err() {
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(_) => std::future::pending::<()>().await,
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
