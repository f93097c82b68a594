#![allow(clippy::must_use_candidate, clippy::missing_errors_doc)]

mod args;

use std::process::ExitCode;

use anyhow::Context;
use args::Args;
use clap::Parser;
use faultline_config::Config;
use faultline_core::ErrorHandler;
use faultline_server::Server;
use faultline_supervisor::{ProcessTerminator, Supervisor};
use tokio_util::sync::CancellationToken;

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let args = Args::parse();

    // Load configuration
    let mut config = Config::load(&args.config)?;
    if let Some(listen) = args.listen {
        config.server.listen_address = Some(listen);
    }

    if args.check {
        println!("{}: configuration is valid", args.config.display());
        return Ok(ExitCode::SUCCESS);
    }

    // Initialize telemetry
    let telemetry_guard = faultline_telemetry::init(config.telemetry.as_ref())?;

    tracing::info!(
        config_path = %args.config.display(),
        "starting faultline"
    );

    // A fatal failure cancels the same token as a shutdown signal
    let shutdown = CancellationToken::new();
    let terminator = ProcessTerminator::new(shutdown.clone());

    let handler = ErrorHandler::new();
    let supervisor = Supervisor::from_config(&config.supervisor, handler, terminator.clone())
        .context("invalid supervisor configuration")?;
    supervisor.install_panic_hook();

    let server = Server::new(&config.server, handler, supervisor.clone())?;

    let signal_shutdown = shutdown.clone();
    tokio::spawn(async move {
        shutdown_signal().await;
        signal_shutdown.cancel();
    });

    let served = server.serve(shutdown).await;

    let code = terminator.exit_code();
    tracing::info!(exit_code = code, "faultline stopped");

    // Exporter shutdown may block; a fatal exit keeps the abort watchdog armed
    supervisor.finish(move || drop(telemetry_guard));
    served?;

    Ok(ExitCode::from(code))
}

/// Wait for a shutdown signal (`SIGINT` or `SIGTERM`)
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("failed to listen for Ctrl+C: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("failed to install SIGTERM handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {}
        () = terminate => {}
    }

    tracing::info!("shutdown signal received");
}
