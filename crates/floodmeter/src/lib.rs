//! Top-level facade crate for floodmeter.
//!
//! Re-exports the core wire types and the server library so users can depend on a single crate.

pub mod core {
    pub use floodmeter_core::*;
}

pub mod server {
    pub use floodmeter_server::*;
}
