//! Keyprobe application shell
//!
//! Loads configuration, wires the scanner to the notifier through the shared
//! discovery queue, and runs everything until the keyspace is exhausted or
//! the process is interrupted. Core logic lives in the `crates/` directory.

pub mod cli;
pub mod liveness;
pub mod state;

pub use cli::Cli;
pub use state::AppState;

use anyhow::Context;
use keyprobe_core::{AppConfig, ConfigError, LivenessConfig};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// Exit status for invalid or unreadable configuration.
pub const EXIT_CONFIG: u8 = 2;
/// Exit status for any other fatal error.
pub const EXIT_FAILURE: u8 = 1;

/// Initialize tracing subscriber for logging
pub fn init_tracing() {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,keyprobe=debug"));

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(true))
        .with(filter)
        .init();
}

/// Process exit status for a fatal error.
#[must_use]
pub fn exit_code(err: &anyhow::Error) -> u8 {
    if err.chain().any(|cause| cause.is::<ConfigError>()) {
        EXIT_CONFIG
    } else {
        EXIT_FAILURE
    }
}

/// Run the scanner, the dispatcher and the liveness endpoint.
///
/// Returns once the scan has ended and the dispatcher has delivered what
/// was still queued. Ctrl-C stops the scan after in-flight probes finish.
///
/// # Errors
/// Returns error if the configuration is invalid, the liveness endpoint
/// cannot bind, or a scan worker dies.
pub async fn run(cli: Cli) -> anyhow::Result<()> {
    info!("Starting keyprobe v{}", env!("CARGO_PKG_VERSION"));

    let config = AppConfig::load_with_env(cli.config.as_deref())?;
    let state = AppState::new(config)?;
    if cli.check_config {
        info!("Configuration is valid");
        return Ok(());
    }

    let driver = state.scan_driver()?;
    let dispatcher = state.dispatcher();

    // Stops the scan: Ctrl-C.
    let shutdown = CancellationToken::new();
    // Stops the dispatcher and liveness endpoint once the scan is over.
    let background = CancellationToken::new();

    let liveness = start_liveness(&state.config.liveness, background.clone()).await?;
    let dispatch_task = tokio::spawn({
        let background = background.clone();
        async move { dispatcher.run(background).await }
    });
    tokio::spawn(cancel_on_ctrl_c(shutdown.clone()));

    let outcome = driver.run(shutdown.clone()).await;
    shutdown.cancel();
    background.cancel();

    let report = dispatch_task.await.context("dispatcher task panicked")?;
    info!(
        drained = report.drained,
        delivered = report.delivered,
        failed = report.failed,
        discarded = report.discarded,
        "Notifications flushed"
    );
    if let Some(handle) = liveness {
        match handle.await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => warn!("Liveness endpoint failed: {e}"),
            Err(e) => warn!("Liveness task panicked: {e}"),
        }
    }

    let summary = outcome.context("scan aborted")?;
    info!(
        checked = summary.checked,
        discoveries = summary.discoveries,
        failures = summary.failures,
        batches = summary.batches,
        passes = summary.passes,
        cancelled = summary.cancelled,
        "Scan finished"
    );
    Ok(())
}

async fn start_liveness(
    config: &LivenessConfig,
    cancel: CancellationToken,
) -> anyhow::Result<Option<JoinHandle<std::io::Result<()>>>> {
    if !config.enabled {
        return Ok(None);
    }

    let addr = config.socket_addr()?;
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("binding liveness endpoint to {addr}"))?;
    Ok(Some(tokio::spawn(liveness::serve(listener, cancel))))
}

async fn cancel_on_ctrl_c(shutdown: CancellationToken) {
    tokio::select! {
        result = tokio::signal::ctrl_c() => match result {
            Ok(()) => {
                info!("Interrupted, finishing in-flight probes");
                shutdown.cancel();
            }
            Err(e) => warn!("Unable to listen for Ctrl-C: {e}"),
        },
        () = shutdown.cancelled() => {}
    }
}
