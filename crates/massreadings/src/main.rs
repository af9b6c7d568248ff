mod app;
mod cache;
mod config;
mod handlers;
mod state;
mod upstream;

use std::{sync::Arc, time::Duration};

use anyhow::Result;
use clap::{Parser, ValueEnum};
use listenfd::ListenFd;
use tokio::{net::TcpListener, signal};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use massreadings_core::{cache::ReadingFetcher, mass::MassReading};

use crate::{
    app::create_app,
    config::Config,
    state::AppState,
    upstream::{MockFetcher, UsccbFetcher},
};

/// Where readings are fetched from on a cache miss.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Upstream {
    /// The USCCB daily readings pages
    Usccb,
    /// Canned readings, no network access
    Mock,
}

/// massreadings - Daily Catholic mass readings over HTTP
#[derive(Parser, Debug)]
#[command(name = "massreadings")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Host address to bind the server to
    #[arg(long, short = 'H', default_value = "0.0.0.0", env = "HOST")]
    host: String,

    /// Port to listen on
    #[arg(long, short, default_value = "8000", env = "PORT")]
    port: u16,

    /// Readings source
    #[arg(long, value_enum, default_value_t = Upstream::Usccb, env = "UPSTREAM")]
    upstream: Upstream,

    /// Simulated latency of the mock upstream, in milliseconds
    #[arg(long, default_value = "0", env = "MOCK_LATENCY_MS")]
    mock_latency_ms: u64,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_tracing();

    let config = Config::from_env();
    let policy = config.cache_policy();

    tracing::info!(
        upstream = ?cli.upstream,
        max_entries = policy.max_entries,
        shards = policy.shard_count(),
        ready_ttl = ?policy.ready_ttl,
        historical_ttl = ?policy.historical_ttl,
        failed_cooldown = ?policy.failed_cooldown,
        fetch_timeout = ?policy.fetch_timeout,
        "Initializing readings cache"
    );

    let fetcher: Arc<dyn ReadingFetcher<MassReading>> = match cli.upstream {
        Upstream::Usccb => Arc::new(UsccbFetcher::new(config.usccb_base_url.clone())?),
        Upstream::Mock => Arc::new(MockFetcher::with_latency(Duration::from_millis(
            cli.mock_latency_ms,
        ))),
    };

    let state = AppState::new(fetcher, policy);
    let sweeper = config
        .sweep_interval()
        .map(|period| state.readings.spawn_sweeper(period));

    // Build the application router
    let app = create_app(state);

    // Auto-reload support via listenfd
    let mut listenfd = ListenFd::from_env();
    let listener = match listenfd.take_tcp_listener(0)? {
        // If we are given a tcp listener on listen fd 0, use that one
        Some(listener) => {
            listener.set_nonblocking(true)?;
            TcpListener::from_std(listener)?
        }
        // Otherwise fall back to CLI-specified host:port
        None => {
            let addr = format!("{}:{}", cli.host, cli.port);
            TcpListener::bind(&addr).await?
        }
    };

    tracing::info!("listening on {}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    if let Some(sweeper) = sweeper {
        sweeper.abort();
    }

    tracing::info!("Server stopped");
    Ok(())
}

/// Installs the global subscriber. `LOG_FORMAT=json` switches to JSON lines.
fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "massreadings=debug,tower_http=debug".into());
    let json = std::env::var("LOG_FORMAT").is_ok_and(|format| format.eq_ignore_ascii_case("json"));

    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

/// Wait for shutdown signals (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = signal::ctrl_c().await {
            tracing::error!(error = %err, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(err) => {
                tracing::error!(error = %err, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, shutting down...");
        }
        _ = terminate => {
            tracing::info!("Received SIGTERM, shutting down...");
        }
    }
}
