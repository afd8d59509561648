//! Lightweight in-process metrics.
//!
//! Metrics are stored as atomics in `DashMap`s and rendered in Prometheus text
//! format by the `/metrics` handler; no exporter crate is involved.

pub mod metrics;
