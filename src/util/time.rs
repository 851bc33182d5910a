//! Time utilities for game simulation

use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

/// Get current Unix timestamp in milliseconds
pub fn unix_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or(Duration::ZERO)
        .as_millis() as u64
}

/// Server start time for uptime tracking
static SERVER_START: std::sync::OnceLock<Instant> = std::sync::OnceLock::new();

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

/// Measures wall time between ticks, clamped so a stalled room does not
/// simulate one huge step when it wakes up
#[derive(Debug, Clone)]
pub struct TickClock {
    last: Instant,
    max_delta: Duration,
}

impl TickClock {
    pub fn new(max_delta: Duration) -> Self {
        Self {
            last: Instant::now(),
            max_delta,
        }
    }

    /// Seconds since the previous call, at most `max_delta`
    pub fn delta_at(&mut self, now: Instant) -> f32 {
        let elapsed = now.saturating_duration_since(self.last);
        self.last = now;
        elapsed.min(self.max_delta).as_secs_f32()
    }

    pub fn delta(&mut self) -> f32 {
        self.delta_at(Instant::now())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tick_clock_clamps_stalls() {
        let start = Instant::now();
        let mut clock = TickClock {
            last: start,
            max_delta: Duration::from_millis(250),
        };

        let dt = clock.delta_at(start + Duration::from_millis(50));
        assert!((dt - 0.05).abs() < 1e-6);

        let dt = clock.delta_at(start + Duration::from_secs(10));
        assert!((dt - 0.25).abs() < 1e-6);

        // Clock going backwards yields zero rather than panicking
        assert_eq!(clock.delta_at(start), 0.0);
    }

    #[test]
    fn unix_millis_is_after_2020() {
        assert!(unix_millis() > 1_577_836_800_000);
    }
}
