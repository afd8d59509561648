//! Shared application state.
//!
//! One `AppState` owns the counters, the peak store, the subscriber set and
//! the metrics registry; handlers and periodic tasks get cheap clones.

use std::sync::Arc;

use crate::config::ServerConfig;
use crate::counter::CounterState;
use crate::obs::metrics::ServerMetrics;
use crate::realtime::Broadcaster;
use crate::store::{FilePeakStore, PeakStore, RecoveringStore};

#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    cfg: ServerConfig,
    counters: Arc<CounterState>,
    store: RecoveringStore,
    broadcaster: Arc<Broadcaster>,
    metrics: Arc<ServerMetrics>,
}

impl AppState {
    /// Build state backed by the configured `stats.json` file.
    pub fn new(cfg: ServerConfig) -> Self {
        let store = Arc::new(FilePeakStore::new(cfg.stats.path.clone()));
        Self::with_store(cfg, store)
    }

    /// Build state over any peak store.
    pub fn with_store(cfg: ServerConfig, store: Arc<dyn PeakStore>) -> Self {
        let metrics = Arc::new(ServerMetrics::default());
        Self {
            inner: Arc::new(AppStateInner {
                store: RecoveringStore::new(store, Arc::clone(&metrics)),
                broadcaster: Arc::new(Broadcaster::new(Arc::clone(&metrics))),
                counters: Arc::new(CounterState::new()),
                metrics,
                cfg,
            }),
        }
    }

    pub fn cfg(&self) -> &ServerConfig {
        &self.inner.cfg
    }

    pub fn counters(&self) -> Arc<CounterState> {
        Arc::clone(&self.inner.counters)
    }

    pub fn store(&self) -> &RecoveringStore {
        &self.inner.store
    }

    pub fn broadcaster(&self) -> Arc<Broadcaster> {
        Arc::clone(&self.inner.broadcaster)
    }

    pub fn metrics(&self) -> Arc<ServerMetrics> {
        Arc::clone(&self.inner.metrics)
    }

    pub fn is_draining(&self) -> bool {
        self.inner.metrics.is_draining()
    }

    /// Stop advertising readiness and end every feed session.
    pub fn begin_drain(&self) {
        self.inner.metrics.set_draining();
        let closed = self.inner.broadcaster.close_all();
        tracing::info!(subscribers = closed, "draining: feed sessions closed");
    }

    /// Live counter values appended to `/metrics`.
    pub fn metrics_extra(&self) -> Vec<(&'static str, u64)> {
        let counts = self.inner.counters.snapshot();
        vec![
            ("floodmeter_cumulative_requests", counts.cumulative),
            ("floodmeter_interval_requests", counts.interval),
        ]
    }
}
