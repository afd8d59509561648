//! Process lifecycle: bind, serve, and the ordered graceful shutdown.
//!
//! Shutdown order once the trigger fires:
//! 1. stop the sampler and the daily reset (aborted if stuck past the grace period)
//! 2. mark draining and close every feed session
//! 3. stop accepting, wait for in-flight HTTP connections
//!
//! The grace period is counted from the trigger and covers all three steps.
//! Running over it, or having to abort a task, ends with `DrainTimeout`.

use std::future::{Future, IntoFuture};
use std::time::Duration;

use tokio::net::TcpListener;
use tokio::sync::{oneshot, watch};

use floodmeter_core::error::{FloodError, Result};

use crate::app_state::AppState;
use crate::router;
use crate::tasks::PeriodicTasks;

/// Bind the configured listen address.
pub async fn bind(addr: &str) -> Result<TcpListener> {
    TcpListener::bind(addr).await.map_err(|source| FloodError::Bind {
        addr: addr.to_string(),
        source,
    })
}

/// Serve until `trigger` resolves, then shut down in order.
pub async fn serve<F>(state: AppState, listener: TcpListener, trigger: F, grace: Duration) -> Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let tasks = PeriodicTasks::spawn(&state);
    let (triggered_tx, triggered_rx) = watch::channel(false);
    let (stopped_tx, mut stopped_rx) = oneshot::channel::<bool>();

    let shutdown_state = state.clone();
    let shutdown = async move {
        trigger.await;
        let _ = triggered_tx.send(true);
        let clean = tasks.stop(grace).await;
        let _ = stopped_tx.send(clean);
        shutdown_state.begin_drain();
    };

    let app = router::build_router(state);
    let server = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .into_future();

    wait_drained(server, triggered_rx, grace).await?;

    if let Ok(false) = stopped_rx.try_recv() {
        let grace_ms = u64::try_from(grace.as_millis()).unwrap_or(u64::MAX);
        tracing::error!(grace_ms, "periodic tasks had to be aborted during shutdown");
        return Err(FloodError::DrainTimeout { grace_ms });
    }
    Ok(())
}

/// Drive `server` to completion, but give up `grace` after the trigger fires.
async fn wait_drained<S>(server: S, mut triggered_rx: watch::Receiver<bool>, grace: Duration) -> Result<()>
where
    S: Future<Output = std::io::Result<()>>,
{
    tokio::pin!(server);

    let grace_ms = u64::try_from(grace.as_millis()).unwrap_or(u64::MAX);
    let deadline = async {
        if triggered_rx.wait_for(|triggered| *triggered).await.is_err() {
            std::future::pending::<()>().await;
        }
        tokio::time::sleep(grace).await;
    };

    tokio::select! {
        res = &mut server => {
            res.map_err(|e| FloodError::Internal(format!("server failed: {e}")))?;
            tracing::info!("server closed");
            Ok(())
        }
        _ = deadline => {
            tracing::error!(grace_ms, "could not close connections in time, forcing shutdown");
            Err(FloodError::DrainTimeout { grace_ms })
        }
    }
}

/// Resolves on SIGINT (Ctrl+C) or SIGTERM.
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    tracing::info!("received shutdown signal, closing server");
}
