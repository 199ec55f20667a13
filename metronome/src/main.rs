//! # Metronome
//!
//! Emits one random integer per heartbeat on standard output. Values come
//! from RANDOM.ORG when an API key is configured and from a local
//! generator otherwise, or whenever the service misbehaves. Diagnostics go
//! to standard error.

mod cli;

use std::io::{self, IsTerminal};

use anyhow::Context;
use clap::Parser;
use metronome_core::{
    heartbeat::Heartbeat,
    selector::FallbackSelector,
    sink::LineSink,
    source::{LocalIntegerSource, RandomOrgClient},
};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::cli::Cli;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Missing .env is fine; the key may come from the shell or flags.
    let env_file = dotenvy::dotenv().ok();
    let cli = Cli::parse();

    init_logging();

    if let Some(path) = env_file {
        debug!(path = %path.display(), "loaded .env file");
    }

    let config = cli.into_configuration().context("invalid configuration")?;
    let remote = RandomOrgClient::new(&config.remote)
        .context("failed to initialise RANDOM.ORG client")?;
    let endpoint = remote.endpoint().to_string();
    let selector = FallbackSelector::new(
        config.credential.clone(),
        remote,
        LocalIntegerSource::from_seed(config.seed),
    )
    .with_remote_timeout(config.remote.timeout);

    info!(
        range = %config.range,
        interval_secs = config.interval.as_secs(),
        remote = selector.remote_enabled(),
        endpoint = %endpoint,
        "configuration loaded"
    );

    let mut heartbeat = Heartbeat::new(
        &config,
        selector,
        LineSink::new(io::stdout()),
        CancellationToken::new(),
    );
    spawn_shutdown_listener(heartbeat.cancellation_token());

    heartbeat
        .run()
        .await
        .context("failed to write to standard output")?;

    Ok(())
}

fn init_logging() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(io::stderr)
                .with_ansi(io::stderr().is_terminal()),
        )
        .init();
}

fn spawn_shutdown_listener(cancel: CancellationToken) {
    tokio::spawn(async move {
        shutdown_signal().await;
        info!("shutdown requested");
        cancel.cancel();
    });
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            warn!(error = %err, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};

        match signal(SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(err) => {
                warn!(error = %err, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
}
