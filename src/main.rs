use std::process::ExitCode;
use std::sync::Arc;

use clap::error::ErrorKind;
use clap::Parser;
use reachping::app::{self, FAILURE_EXIT_CODE};
use reachping::{Args, PlatformReachability, TerminalConsole};

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    env_logger::init();

    let args = match Args::try_parse() {
        Ok(args) => args,
        Err(err) => {
            let _ = err.print();
            return match err.kind() {
                ErrorKind::DisplayVersion => ExitCode::SUCCESS,
                _ => ExitCode::from(FAILURE_EXIT_CODE),
            };
        }
    };

    let console = Arc::new(TerminalConsole);
    match app::execute(
        &args,
        PlatformReachability::new(),
        console.clone(),
        shutdown_signal(),
    )
    .await
    {
        Ok(_) => ExitCode::SUCCESS,
        Err(err) => ExitCode::from(app::report_failure(&err, &*console)),
    }
}

/// Resolves on Ctrl+C, or on SIGTERM where supported.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            log::warn!("failed to listen for Ctrl+C: {}", err);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                log::warn!("failed to listen for SIGTERM: {}", err);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            log::debug!("received Ctrl+C");
        }
        _ = terminate => {
            log::debug!("received terminate signal");
        }
    }
}
