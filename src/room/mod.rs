//! Rooms: codes, the per-room session state machine, the registry and the
//! service that connects them to WebSocket connections

pub mod code;
pub mod registry;
pub mod service;
pub mod session;

pub use code::RoomCode;
pub use registry::{RoomHandle, RoomRegistry};
pub use service::{Outbox, RoomService};
pub use session::{RoomState, RoomSummary, Session, SessionError};
