use std::time::Duration;

use serde::Deserialize;
use floodmeter_core::error::{FloodError, Result};

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ServerConfig {
    pub version: u32,

    #[serde(default)]
    pub server: ServerSection,

    #[serde(default)]
    pub feed: FeedSection,

    #[serde(default)]
    pub stats: StatsSection,

    #[serde(default)]
    pub timers: TimerSection,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            version: 1,
            server: ServerSection::default(),
            feed: FeedSection::default(),
            stats: StatsSection::default(),
            timers: TimerSection::default(),
        }
    }
}

impl ServerConfig {
    pub fn validate(&self) -> Result<()> {
        if self.version != 1 {
            return Err(FloodError::UnsupportedVersion);
        }

        self.server.validate()?;
        self.feed.validate()?;
        self.stats.validate()?;
        self.timers.validate()?;

        Ok(())
    }

    /// `host:port` string handed to the listener.
    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ServerSection {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_shutdown_grace_ms")]
    pub shutdown_grace_ms: u64,

    #[serde(default = "default_ci_exit_grace_ms")]
    pub ci_exit_grace_ms: u64,

    /// Smoke-test mode: bind, then shut down immediately. Usually set via `CI`.
    #[serde(default)]
    pub ci: bool,
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            shutdown_grace_ms: default_shutdown_grace_ms(),
            ci_exit_grace_ms: default_ci_exit_grace_ms(),
            ci: false,
        }
    }
}

impl ServerSection {
    pub fn validate(&self) -> Result<()> {
        if self.host.trim().is_empty() {
            return Err(FloodError::BadConfig("server.host must not be empty".into()));
        }
        if !(1..=120000).contains(&self.shutdown_grace_ms) {
            return Err(FloodError::BadConfig(
                "server.shutdown_grace_ms must be between 1 and 120000".into(),
            ));
        }
        if !(1..=120000).contains(&self.ci_exit_grace_ms) {
            return Err(FloodError::BadConfig(
                "server.ci_exit_grace_ms must be between 1 and 120000".into(),
            ));
        }
        Ok(())
    }

    /// Grace period for the active shutdown path (CI smoke test or signal).
    pub fn drain_grace(&self) -> Duration {
        if self.ci {
            Duration::from_millis(self.ci_exit_grace_ms)
        } else {
            Duration::from_millis(self.shutdown_grace_ms)
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FeedSection {
    #[serde(default = "default_ping_interval_ms")]
    pub ping_interval_ms: u64,

    #[serde(default = "default_idle_timeout_ms")]
    pub idle_timeout_ms: u64,

    /// Outbound queue depth per subscriber. A full queue drops ticks.
    #[serde(default = "default_subscriber_queue")]
    pub subscriber_queue: usize,
}

impl Default for FeedSection {
    fn default() -> Self {
        Self {
            ping_interval_ms: default_ping_interval_ms(),
            idle_timeout_ms: default_idle_timeout_ms(),
            subscriber_queue: default_subscriber_queue(),
        }
    }
}

impl FeedSection {
    pub fn validate(&self) -> Result<()> {
        if !(5000..=120000).contains(&self.ping_interval_ms) {
            return Err(FloodError::BadConfig(
                "feed.ping_interval_ms must be between 5000 and 120000".into(),
            ));
        }
        if !(10000..=600000).contains(&self.idle_timeout_ms) {
            return Err(FloodError::BadConfig(
                "feed.idle_timeout_ms must be between 10000 and 600000".into(),
            ));
        }
        if self.idle_timeout_ms <= self.ping_interval_ms {
            return Err(FloodError::BadConfig(
                "feed.idle_timeout_ms must be greater than ping_interval_ms".into(),
            ));
        }
        if !(1..=4096).contains(&self.subscriber_queue) {
            return Err(FloodError::BadConfig(
                "feed.subscriber_queue must be between 1 and 4096".into(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StatsSection {
    #[serde(default = "default_stats_path")]
    pub path: String,
}

impl Default for StatsSection {
    fn default() -> Self {
        Self {
            path: default_stats_path(),
        }
    }
}

impl StatsSection {
    pub fn validate(&self) -> Result<()> {
        if self.path.trim().is_empty() {
            return Err(FloodError::BadConfig("stats.path must not be empty".into()));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TimerSection {
    #[serde(default = "default_sample_interval_ms")]
    pub sample_interval_ms: u64,

    #[serde(default = "default_daily_reset_ms")]
    pub daily_reset_ms: u64,
}

impl Default for TimerSection {
    fn default() -> Self {
        Self {
            sample_interval_ms: default_sample_interval_ms(),
            daily_reset_ms: default_daily_reset_ms(),
        }
    }
}

impl TimerSection {
    pub fn validate(&self) -> Result<()> {
        if !(100..=60000).contains(&self.sample_interval_ms) {
            return Err(FloodError::BadConfig(
                "timers.sample_interval_ms must be between 100 and 60000".into(),
            ));
        }
        if self.daily_reset_ms < self.sample_interval_ms {
            return Err(FloodError::BadConfig(
                "timers.daily_reset_ms must not be shorter than sample_interval_ms".into(),
            ));
        }
        Ok(())
    }

    pub fn sample_interval(&self) -> Duration {
        Duration::from_millis(self.sample_interval_ms)
    }

    pub fn daily_reset(&self) -> Duration {
        Duration::from_millis(self.daily_reset_ms)
    }
}

fn default_host() -> String {
    "0.0.0.0".into()
}
fn default_port() -> u16 {
    3000
}
fn default_shutdown_grace_ms() -> u64 {
    10000
}
fn default_ci_exit_grace_ms() -> u64 {
    5000
}
fn default_ping_interval_ms() -> u64 {
    20000
}
fn default_idle_timeout_ms() -> u64 {
    60000
}
fn default_subscriber_queue() -> usize {
    16
}
fn default_stats_path() -> String {
    "stats.json".into()
}
fn default_sample_interval_ms() -> u64 {
    1000
}
fn default_daily_reset_ms() -> u64 {
    86_400_000
}
