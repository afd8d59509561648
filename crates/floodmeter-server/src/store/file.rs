use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs;
use tokio::io::AsyncWriteExt;

use floodmeter_core::error::{FloodError, Result};
use floodmeter_core::protocol::stats::PeakRecord;

use super::PeakStore;

/// JSON file store (`stats.json`).
///
/// Writes go to `<path>.tmp` first and are renamed over the target, so a
/// crash mid-write leaves either the previous or the new record on disk.
#[derive(Debug, Clone)]
pub struct FilePeakStore {
    path: PathBuf,
    tmp_path: PathBuf,
    display: String,
}

impl FilePeakStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let mut tmp = path.clone().into_os_string();
        tmp.push(".tmp");
        Self {
            display: path.display().to_string(),
            tmp_path: PathBuf::from(tmp),
            path,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_err(&self, op: &'static str, source: std::io::Error) -> FloodError {
        FloodError::StoreIo {
            op,
            path: self.display.clone(),
            source,
        }
    }

    async fn write_atomic(&self, op: &'static str, record: PeakRecord) -> Result<()> {
        let body = record.to_pretty_json()?;

        if let Err(e) = self.replace_with(body.as_bytes()).await {
            // best effort; the target is untouched either way
            let _ = fs::remove_file(&self.tmp_path).await;
            return Err(self.io_err(op, e));
        }
        Ok(())
    }

    async fn replace_with(&self, body: &[u8]) -> std::io::Result<()> {
        let mut f = fs::File::create(&self.tmp_path).await?;
        f.write_all(body).await?;
        f.flush().await?;
        f.sync_all().await?;
        drop(f);

        fs::rename(&self.tmp_path, &self.path).await
    }
}

#[async_trait]
impl PeakStore for FilePeakStore {
    fn location(&self) -> &str {
        &self.display
    }

    async fn try_load(&self) -> Result<PeakRecord> {
        match fs::read_to_string(&self.path).await {
            Ok(s) => PeakRecord::parse(&s, &self.display),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                tracing::info!(path = %self.display, "stats file not found, creating with default values");
                let record = PeakRecord::default();
                self.write_atomic("create", record).await?;
                Ok(record)
            }
            Err(e) => Err(self.io_err("read", e)),
        }
    }

    async fn try_store(&self, record: PeakRecord) -> Result<()> {
        self.write_atomic("write", record).await
    }
}
