//! Minimal metrics registry for the server.
//!
//! Counter/gauge/histogram types with dynamic labels backed by `DashMap`.
//! Labels are flattened into sorted key vectors so a series always maps to the
//! same entry. Histogram buckets are fixed in microseconds.

use dashmap::DashMap;
use std::fmt::Write;
use std::sync::atomic::{AtomicBool, AtomicI64, AtomicU64, Ordering};
use std::time::Duration;

/// Helper to escape label values.
fn escape_label(v: &str) -> String {
    v.replace('\\', "\\\\").replace('"', "\\\"").replace('\n', "\\n")
}

type LabelKey = Vec<(String, String)>;

fn label_key(labels: &[(&str, &str)]) -> LabelKey {
    let mut key: LabelKey = labels
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    key.sort();
    key
}

fn label_str(key: &LabelKey) -> String {
    key.iter()
        .map(|(k, v)| format!("{}=\"{}\"", k, escape_label(v)))
        .collect::<Vec<_>>()
        .join(",")
}

/// `name{labels}` or bare `name` when there are no labels.
fn series(name: &str, key: &LabelKey) -> String {
    if key.is_empty() {
        name.to_string()
    } else {
        format!("{}{{{}}}", name, label_str(key))
    }
}

#[derive(Default)]
pub struct CounterVec {
    map: DashMap<LabelKey, AtomicU64>,
}

impl CounterVec {
    /// Increment by 1.
    pub fn inc(&self, labels: &[(&str, &str)]) {
        self.add(labels, 1);
    }

    /// Increment by an arbitrary value.
    pub fn add(&self, labels: &[(&str, &str)], v: u64) {
        let counter = self.map.entry(label_key(labels)).or_insert_with(|| AtomicU64::new(0));
        counter.fetch_add(v, Ordering::Relaxed);
    }

    /// Current value of one series (0 if never touched).
    pub fn get(&self, labels: &[(&str, &str)]) -> u64 {
        self.map
            .get(&label_key(labels))
            .map(|c| c.value().load(Ordering::Relaxed))
            .unwrap_or(0)
    }

    /// Render in Prometheus text exposition format.
    fn render(&self, name: &str, out: &mut String) {
        let _ = writeln!(out, "# TYPE {} counter", name);
        for r in self.map.iter() {
            let val = r.value().load(Ordering::Relaxed);
            let _ = writeln!(out, "{} {}", series(name, r.key()), val);
        }
    }
}

#[derive(Default)]
pub struct GaugeVec {
    map: DashMap<LabelKey, AtomicI64>,
}

impl GaugeVec {
    /// Increment by 1.
    pub fn inc(&self, labels: &[(&str, &str)]) { self.add(labels, 1); }
    /// Decrement by 1.
    pub fn dec(&self, labels: &[(&str, &str)]) { self.add(labels, -1); }

    /// Add an arbitrary signed delta.
    pub fn add(&self, labels: &[(&str, &str)], v: i64) {
        let gauge = self.map.entry(label_key(labels)).or_insert_with(|| AtomicI64::new(0));
        gauge.fetch_add(v, Ordering::Relaxed);
    }

    /// Overwrite the value.
    pub fn set(&self, labels: &[(&str, &str)], v: i64) {
        let gauge = self.map.entry(label_key(labels)).or_insert_with(|| AtomicI64::new(0));
        gauge.store(v, Ordering::Relaxed);
    }

    /// Current value of one series (0 if never touched).
    pub fn get(&self, labels: &[(&str, &str)]) -> i64 {
        self.map
            .get(&label_key(labels))
            .map(|g| g.value().load(Ordering::Relaxed))
            .unwrap_or(0)
    }

    /// Render in Prometheus text exposition format.
    fn render(&self, name: &str, out: &mut String) {
        let _ = writeln!(out, "# TYPE {} gauge", name);
        for r in self.map.iter() {
            let val = r.value().load(Ordering::Relaxed);
            let _ = writeln!(out, "{} {}", series(name, r.key()), val);
        }
    }
}

// Fixed buckets in microseconds: 100us .. 1s
const BUCKETS_MICROS: [u64; 9] = [100, 500, 1_000, 5_000, 10_000, 50_000, 100_000, 500_000, 1_000_000];

#[derive(Default)]
struct AtomicHistogram {
    count: AtomicU64,
    sum: AtomicU64,
    buckets: [AtomicU64; 9],
}

#[derive(Default)]
pub struct HistogramVec {
    map: DashMap<LabelKey, AtomicHistogram>,
}

impl HistogramVec {
    /// Observe a duration and increment cumulative buckets (microsecond scale).
    pub fn observe(&self, labels: &[(&str, &str)], duration: Duration) {
        let hist = self.map.entry(label_key(labels)).or_insert_with(AtomicHistogram::default);
        let micros = u64::try_from(duration.as_micros()).unwrap_or(u64::MAX);

        hist.count.fetch_add(1, Ordering::Relaxed);
        hist.sum.fetch_add(micros, Ordering::Relaxed);

        for (i, &b) in BUCKETS_MICROS.iter().enumerate() {
            if micros <= b {
                hist.buckets[i].fetch_add(1, Ordering::Relaxed);
            }
        }
    }

    /// Number of observations in one series.
    pub fn count(&self, labels: &[(&str, &str)]) -> u64 {
        self.map
            .get(&label_key(labels))
            .map(|h| h.value().count.load(Ordering::Relaxed))
            .unwrap_or(0)
    }

    /// Render in Prometheus text exposition format (unit: microseconds).
    fn render(&self, name: &str, out: &mut String) {
        let _ = writeln!(out, "# TYPE {} histogram", name);
        for r in self.map.iter() {
            let hist = r.value();
            let labels = label_str(r.key());
            let prefix = if labels.is_empty() { String::new() } else { format!("{},", labels) };

            for (i, &le) in BUCKETS_MICROS.iter().enumerate() {
                let count = hist.buckets[i].load(Ordering::Relaxed);
                let _ = writeln!(out, "{}_bucket{{{}le=\"{}\"}} {}", name, prefix, le, count);
            }
            let count = hist.count.load(Ordering::Relaxed);
            let _ = writeln!(out, "{}_bucket{{{}le=\"+Inf\"}} {}", name, prefix, count);

            let sum = hist.sum.load(Ordering::Relaxed);
            let _ = writeln!(out, "{} {}", series(&format!("{name}_sum"), r.key()), sum);
            let _ = writeln!(out, "{} {}", series(&format!("{name}_count"), r.key()), count);
        }
    }
}

#[derive(Default)]
pub struct ServerMetrics {
    pub feed_upgrades: CounterVec,
    pub feed_subscribers: GaugeVec,
    pub peak_writes: CounterVec,
    pub store_errors: CounterVec,
    pub broadcast_drops: CounterVec,
    pub daily_resets: CounterVec,
    pub sample_tick: HistogramVec, // In Microseconds
    pub last_peak: GaugeVec,
    draining: AtomicBool,
}

impl ServerMetrics {
    /// Mark draining state.
    pub fn set_draining(&self) { self.draining.store(true, Ordering::Relaxed); }
    /// Return whether draining is active.
    pub fn is_draining(&self) -> bool { self.draining.load(Ordering::Relaxed) }

    /// Render all registered metrics plus any extra lines provided by callers.
    pub fn render(&self, extra: &[(&str, u64)]) -> String {
        let mut out = String::new();
        self.feed_upgrades.render("floodmeter_feed_upgrades_total", &mut out);
        self.feed_subscribers.render("floodmeter_feed_subscribers", &mut out);
        self.peak_writes.render("floodmeter_peak_writes_total", &mut out);
        self.store_errors.render("floodmeter_store_errors_total", &mut out);
        self.broadcast_drops.render("floodmeter_broadcast_drops_total", &mut out);
        self.daily_resets.render("floodmeter_daily_resets_total", &mut out);
        self.sample_tick.render("floodmeter_sample_tick_micros", &mut out);
        self.last_peak.render("floodmeter_peak_requests", &mut out);

        let _ = writeln!(out, "# TYPE floodmeter_draining gauge\nfloodmeter_draining {}", if self.is_draining() { 1 } else { 0 });
        for (k, v) in extra {
            let _ = writeln!(out, "# TYPE {} gauge\n{} {}", k, k, v);
        }
        out
    }
}
