//! Durable peak record (`stats.json`).
//!
//! The file holds one object, `{"max_requests": N}`, pretty-printed with a
//! two-space indent. A missing or `null` field reads as zero; unknown fields
//! are ignored.

use serde::{Deserialize, Deserializer, Serialize};

use crate::error::{FloodError, Result};

/// Highest per-interval hit count ever observed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PeakRecord {
    #[serde(default, deserialize_with = "null_as_zero")]
    pub max_requests: u64,
}

fn null_as_zero<'de, D>(de: D) -> std::result::Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<u64>::deserialize(de)?.unwrap_or(0))
}

impl PeakRecord {
    pub fn new(max_requests: u64) -> Self {
        Self { max_requests }
    }

    /// Render the on-disk representation.
    pub fn to_pretty_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self)
            .map_err(|e| FloodError::Internal(format!("stats encode failed: {e}")))
    }

    /// Parse the on-disk representation. `path` is only used for error context.
    pub fn parse(s: &str, path: &str) -> Result<Self> {
        serde_json::from_str(s).map_err(|source| FloodError::StoreCorrupt {
            path: path.to_string(),
            source,
        })
    }
}
