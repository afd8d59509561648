//! floodmeter core: error types and the wire formats shared by the server
//! and any client tooling.
//!
//! This crate carries no transport or runtime dependencies. It only knows how
//! the peak record looks on disk and how a `requests` feed frame looks on the
//! wire.
//!
//! # Defensive guarantees
//! Panics, `unwrap`, and `expect` are compile-denied here
//! (`#![deny(clippy::panic, clippy::unwrap_used, clippy::expect_used)]`).
//! All fallible paths must surface as `FloodError`/`Result`.

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

pub mod error;
pub mod protocol;

/// Shared result type.
pub use error::{ErrorKind, FloodError, Result};
