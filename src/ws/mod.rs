//! WebSocket transport: wire protocol and per-connection handler

pub mod handler;
pub mod protocol;

pub use handler::ws_handler;
pub use protocol::{ClientMsg, ServerMsg};
