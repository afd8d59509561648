use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;

use floodmeter_core::error::Result;
use floodmeter_core::protocol::stats::PeakRecord;

use super::PeakStore;

/// In-process store. Same contract as the file store, nothing survives a restart.
#[derive(Debug, Default)]
pub struct MemoryPeakStore {
    record: Mutex<Option<PeakRecord>>,
    writes: AtomicU64,
}

impl MemoryPeakStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_record(record: PeakRecord) -> Self {
        Self {
            record: Mutex::new(Some(record)),
            writes: AtomicU64::new(0),
        }
    }

    /// Current record, `None` until the first load or store.
    pub fn current(&self) -> Option<PeakRecord> {
        *self.record.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Number of successful `try_store` calls.
    pub fn writes(&self) -> u64 {
        self.writes.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl PeakStore for MemoryPeakStore {
    fn location(&self) -> &str {
        "memory"
    }

    async fn try_load(&self) -> Result<PeakRecord> {
        let mut slot = self.record.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(*slot.get_or_insert_with(PeakRecord::default))
    }

    async fn try_store(&self, record: PeakRecord) -> Result<()> {
        *self.record.lock().unwrap_or_else(PoisonError::into_inner) = Some(record);
        self.writes.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }
}
