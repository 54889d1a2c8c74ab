//! Duel Arena - room server and combat engine for a two-player arena fighter
//!
//! The server owns rooms, seats, the coin economy and battle settlement, and
//! relays combat intents between the two peers. The `game` module is the
//! deterministic simulation both peers run from the same battle start.

pub mod app;
pub mod catalog;
pub mod config;
pub mod game;
pub mod http;
pub mod player;
pub mod room;
pub mod util;
pub mod ws;
