//! floodmeter server
//!
//! - `GET /attack` counts a hit
//! - `/feed` streams `(cumulative, interval, peak)` once per second
//! - peak per-second count persisted in `stats.json`
//! - `CI=1` binds, then shuts down cleanly (smoke test)

use std::future::Future;
use std::pin::Pin;
use std::process::ExitCode;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use floodmeter_server::{app_state::AppState, config, lifecycle};

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cfg = match config::load() {
        Ok(cfg) => cfg,
        Err(e) => {
            tracing::error!(kind = e.kind().as_str(), error = %e, "config load failed");
            return ExitCode::FAILURE;
        }
    };

    let listen = cfg.listen_addr();
    let listener = match lifecycle::bind(&listen).await {
        Ok(l) => l,
        Err(e) => {
            tracing::error!(kind = e.kind().as_str(), error = %e, "server error");
            return ExitCode::FAILURE;
        }
    };
    tracing::info!(%listen, stats = %cfg.stats.path, "server listening");

    let grace = cfg.server.drain_grace();
    let trigger: Pin<Box<dyn Future<Output = ()> + Send>> = if cfg.server.ci {
        tracing::info!("running in CI environment, server started successfully, exiting gracefully");
        Box::pin(std::future::ready(()))
    } else {
        Box::pin(lifecycle::shutdown_signal())
    };

    let state = AppState::new(cfg);
    match lifecycle::serve(state, listener, trigger, grace).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(kind = e.kind().as_str(), error = %e, "shutdown failed");
            ExitCode::FAILURE
        }
    }
}
