//! Periodic background work: the 1 Hz sampler and the daily reset.
//!
//! Both loops run on their own tokio task and share a `watch` stop flag.
//! `PeriodicTasks::stop` flips the flag and waits, up to a limit, for both
//! loops to return. A loop stuck in a tick (e.g. a hung store write) is
//! aborted once the limit passes.

mod daily_reset;
mod sampler;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{Duration, Instant};

use crate::app_state::AppState;

pub use daily_reset::DailyReset;
pub use sampler::Sampler;

/// Resolves once the stop flag is set or its sender is gone.
///
/// The `watch::Ref` from `wait_for` holds a read guard and is `!Send`; it is
/// dropped here so the loops stay spawnable.
async fn stopped(stop: &mut watch::Receiver<bool>) {
    let _ = stop.wait_for(|stopped| *stopped).await;
}

pub struct PeriodicTasks {
    stop: watch::Sender<bool>,
    handles: Vec<(&'static str, JoinHandle<()>)>,
}

impl PeriodicTasks {
    /// Start the sampler and the daily reset with the configured periods.
    pub fn spawn(state: &AppState) -> Self {
        let (stop, stop_rx) = watch::channel(false);
        let timers = &state.cfg().timers;

        let sampler = Sampler::new(state);
        let sample_every = timers.sample_interval();
        let sampler_stop = stop_rx.clone();
        let sampler_handle = tokio::spawn(async move { sampler.run(sample_every, sampler_stop).await });

        let daily = DailyReset::new(state);
        let reset_every = timers.daily_reset();
        let daily_handle = tokio::spawn(async move { daily.run(reset_every, stop_rx).await });

        tracing::info!(
            sample_ms = timers.sample_interval_ms,
            daily_reset_ms = timers.daily_reset_ms,
            "periodic tasks started"
        );

        Self {
            stop,
            handles: vec![("sampler", sampler_handle), ("daily_reset", daily_handle)],
        }
    }

    /// Signal both loops and wait up to `limit` for them to return.
    ///
    /// Returns `false` when a loop had to be aborted.
    pub async fn stop(mut self, limit: Duration) -> bool {
        let _ = self.stop.send(true);
        let deadline = Instant::now() + limit;
        let mut clean = true;

        for (task, handle) in self.handles.iter_mut() {
            match tokio::time::timeout_at(deadline, &mut *handle).await {
                Ok(Ok(())) => {}
                Ok(Err(e)) => tracing::warn!(task = *task, error = %e, "periodic task ended abnormally"),
                Err(_) => {
                    tracing::warn!(task = *task, "periodic task did not stop in time, aborting");
                    handle.abort();
                    clean = false;
                }
            }
        }
        self.handles.clear();

        if clean {
            tracing::info!("periodic tasks stopped");
        }
        clean
    }
}

impl Drop for PeriodicTasks {
    fn drop(&mut self) {
        for (_, handle) in &self.handles {
            handle.abort();
        }
    }
}
