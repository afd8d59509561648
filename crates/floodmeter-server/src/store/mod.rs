//! Durable peak storage.
//!
//! `PeakStore` implementations report every failure. `RecoveringStore` is the
//! boundary the sampler talks to: it logs and counts failures and hands back a
//! default (load) or a `false` (store) instead of an error.

mod file;
mod memory;

use std::sync::Arc;

use async_trait::async_trait;

use floodmeter_core::error::Result;
use floodmeter_core::protocol::stats::PeakRecord;

use crate::obs::metrics::ServerMetrics;

pub use file::FilePeakStore;
pub use memory::MemoryPeakStore;

/// Single-record store for the all-time peak.
#[async_trait]
pub trait PeakStore: Send + Sync {
    /// Human-readable location, used in logs.
    fn location(&self) -> &str;

    /// Read the record. A missing record is created with zero and returned.
    async fn try_load(&self) -> Result<PeakRecord>;

    /// Overwrite the record.
    async fn try_store(&self, record: PeakRecord) -> Result<()>;
}

/// Log-and-default wrapper around a [`PeakStore`].
#[derive(Clone)]
pub struct RecoveringStore {
    inner: Arc<dyn PeakStore>,
    metrics: Arc<ServerMetrics>,
}

impl RecoveringStore {
    pub fn new(inner: Arc<dyn PeakStore>, metrics: Arc<ServerMetrics>) -> Self {
        Self { inner, metrics }
    }

    pub fn location(&self) -> &str {
        self.inner.location()
    }

    /// Load the record, or `{0}` if it cannot be read or parsed.
    /// A corrupt record is left on disk untouched.
    pub async fn load(&self) -> PeakRecord {
        match self.inner.try_load().await {
            Ok(record) => record,
            Err(e) => {
                tracing::error!(
                    op = "load",
                    path = %self.inner.location(),
                    kind = e.kind().as_str(),
                    error = %e,
                    "peak record unavailable, using default"
                );
                self.metrics.store_errors.inc(&[("op", "load"), ("kind", e.kind().as_str())]);
                PeakRecord::default()
            }
        }
    }

    /// Overwrite the record. Returns `false` if the write failed; callers may ignore it.
    pub async fn store(&self, record: PeakRecord) -> bool {
        match self.inner.try_store(record).await {
            Ok(()) => true,
            Err(e) => {
                tracing::error!(
                    op = "store",
                    path = %self.inner.location(),
                    kind = e.kind().as_str(),
                    max_requests = record.max_requests,
                    error = %e,
                    "peak record write failed"
                );
                self.metrics.store_errors.inc(&[("op", "store"), ("kind", e.kind().as_str())]);
                false
            }
        }
    }
}
