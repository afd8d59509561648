//! Real-time feed frame (JSON text).
//!
//! Frame layout: `{"event":"requests","data":[cumulative, interval, peak]}`.
//! The three numbers are positional, mirroring an event emitted with three
//! arguments.

use serde::{Deserialize, Serialize};

use crate::error::{FloodError, Result};

/// Event name carried by every counter frame.
pub const REQUESTS_EVENT: &str = "requests";

/// One sampled counter triple.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RequestsEvent {
    /// Hits since the last daily reset.
    pub cumulative: u64,
    /// Hits during the sampled interval.
    pub interval: u64,
    /// Highest interval count on record.
    pub peak: u64,
}

#[derive(Serialize)]
struct FrameOut<'a> {
    event: &'a str,
    data: (u64, u64, u64),
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct FrameIn {
    event: String,
    data: (u64, u64, u64),
}

impl RequestsEvent {
    pub fn new(cumulative: u64, interval: u64, peak: u64) -> Self {
        Self {
            cumulative,
            interval,
            peak,
        }
    }

    /// Encode as a feed text frame.
    pub fn to_text(&self) -> Result<String> {
        let frame = FrameOut {
            event: REQUESTS_EVENT,
            data: (self.cumulative, self.interval, self.peak),
        };
        serde_json::to_string(&frame)
            .map_err(|e| FloodError::Internal(format!("feed encode failed: {e}")))
    }

    /// Decode a feed text frame. Frames for other events are rejected.
    pub fn from_text(s: &str) -> Result<Self> {
        let frame: FrameIn = serde_json::from_str(s)
            .map_err(|e| FloodError::Decode(format!("invalid feed frame: {e}")))?;
        if frame.event != REQUESTS_EVENT {
            return Err(FloodError::Decode(format!(
                "unexpected event: {}",
                frame.event
            )));
        }
        let (cumulative, interval, peak) = frame.data;
        Ok(Self::new(cumulative, interval, peak))
    }
}
