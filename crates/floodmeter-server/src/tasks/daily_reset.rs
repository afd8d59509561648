use std::sync::Arc;

use tokio::sync::watch;
use tokio::time::{interval_at, Duration, Instant};

use crate::app_state::AppState;
use crate::counter::CounterState;
use crate::obs::metrics::ServerMetrics;

use super::stopped;

/// Zeroes the cumulative count once per period. Interval and peak are untouched.
pub struct DailyReset {
    counters: Arc<CounterState>,
    metrics: Arc<ServerMetrics>,
}

impl DailyReset {
    pub fn new(state: &AppState) -> Self {
        Self {
            counters: state.counters(),
            metrics: state.metrics(),
        }
    }

    pub fn reset(&self) {
        tracing::info!("resetting daily request count");
        self.counters.reset_cumulative();
        self.metrics.daily_resets.inc(&[]);
    }

    /// Reset every `period`, counted from start, until `stop` flips.
    pub async fn run(self, period: Duration, mut stop: watch::Receiver<bool>) {
        let mut ticker = interval_at(Instant::now() + period, period);

        loop {
            tokio::select! {
                biased;
                _ = stopped(&mut stop) => break,
                _ = ticker.tick() => self.reset(),
            }
        }
    }
}
