use std::sync::Arc;

use tokio::sync::watch;
use tokio::time::{interval_at, Duration, Instant, MissedTickBehavior};

use floodmeter_core::protocol::feed::RequestsEvent;
use floodmeter_core::protocol::stats::PeakRecord;

use crate::app_state::AppState;
use crate::counter::CounterState;
use crate::obs::metrics::ServerMetrics;
use crate::realtime::Broadcaster;
use crate::store::RecoveringStore;

use super::stopped;

/// Samples the interval bucket, maintains the durable peak and publishes the tick.
pub struct Sampler {
    counters: Arc<CounterState>,
    store: RecoveringStore,
    broadcaster: Arc<Broadcaster>,
    metrics: Arc<ServerMetrics>,
}

impl Sampler {
    pub fn new(state: &AppState) -> Self {
        Self {
            counters: state.counters(),
            store: state.store().clone(),
            broadcaster: state.broadcaster(),
            metrics: state.metrics(),
        }
    }

    /// Run one tick and return what was published.
    ///
    /// A tie with the stored peak rewrites the record too. Store failures
    /// degrade the tick (stale or zero peak) but never skip the reset or the
    /// publish.
    pub async fn tick(&self) -> RequestsEvent {
        let started = Instant::now();

        let record = self.store.load().await;
        let counts = self.counters.take_interval();
        let observed = counts.interval;

        let mut peak = record.max_requests;
        if observed >= peak {
            if observed > peak {
                tracing::info!(from = peak, to = observed, "updating max requests");
            }
            if self.store.store(PeakRecord::new(observed)).await {
                self.metrics.peak_writes.inc(&[]);
            }
            peak = observed;
        }

        let event = RequestsEvent::new(counts.cumulative, observed, peak);
        match self.broadcaster.publish(&event) {
            Ok(report) if report.dropped > 0 => {
                tracing::debug!(dropped = report.dropped, delivered = report.delivered, "slow subscribers missed a tick");
            }
            Ok(_) => {}
            Err(e) => tracing::warn!(error = %e, "publish failed"),
        }

        self.metrics.last_peak.set(&[], i64::try_from(peak).unwrap_or(i64::MAX));
        self.metrics.sample_tick.observe(&[], started.elapsed());
        event
    }

    /// Tick every `period` until `stop` flips. The first tick fires one period
    /// after start; missed ticks are skipped rather than bunched up.
    pub async fn run(self, period: Duration, mut stop: watch::Receiver<bool>) {
        let mut ticker = interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                biased;
                _ = stopped(&mut stop) => break,
                _ = ticker.tick() => {
                    self.tick().await;
                }
            }
        }
    }
}
