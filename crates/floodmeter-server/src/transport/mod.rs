//! Transport layer: the `/attack` hit endpoint and the `/feed` WebSocket.

pub mod http;
pub mod ws;
