//! Time utilities for the room server and the simulation

use std::sync::OnceLock;
use std::time::Instant;

/// Server start time for uptime tracking
static SERVER_START: OnceLock<Instant> = OnceLock::new();

/// Initialize server start time (call once at startup)
pub fn init_server_time() {
    SERVER_START.get_or_init(Instant::now);
}

/// Get server uptime in seconds
pub fn uptime_secs() -> u64 {
    SERVER_START
        .get()
        .map(|start| start.elapsed().as_secs())
        .unwrap_or(0)
}

/// Simulation rate. Every timer in the combat engine counts these ticks.
pub const TICKS_PER_SECOND: u32 = 60;

/// Convert a duration in whole seconds to simulation ticks
pub fn secs_to_ticks(secs: u32) -> u32 {
    secs * TICKS_PER_SECOND
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ten_seconds_is_six_hundred_ticks() {
        assert_eq!(secs_to_ticks(10), 600);
    }

    #[test]
    fn uptime_counts_from_init() {
        init_server_time();
        assert!(uptime_secs() < 5);
    }
}
