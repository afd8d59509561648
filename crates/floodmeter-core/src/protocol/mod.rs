//! Wire formats.
//!
//! - Feed: the `requests` text frame pushed to every subscriber once per tick.
//! - Stats: the single durable peak record (`stats.json`).
//!
//! All parsers are panic-free: malformed input is reported as `FloodError`
//! instead of panicking, so a hostile client or a damaged file cannot take the
//! server down.

pub mod feed;
pub mod stats;
