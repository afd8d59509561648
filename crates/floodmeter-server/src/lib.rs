//! floodmeter server library entry.
//!
//! Wires the hit counters, the durable peak store, the periodic sampler and
//! daily reset, and the WebSocket feed into one axum service. Consumed by the
//! binary (`main.rs`) and by integration tests.

pub mod app_state;
pub mod config;
pub mod counter;
pub mod lifecycle;
pub mod obs;
pub mod ops;
pub mod realtime;
pub mod router;
pub mod store;
pub mod tasks;
pub mod transport;
