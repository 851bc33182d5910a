//! Per-connection message rate limiting

use governor::{
    clock::DefaultClock,
    state::{InMemoryState, NotKeyed},
    Quota, RateLimiter,
};
use std::num::NonZeroU32;

type Limiter = RateLimiter<NotKeyed, InMemoryState, DefaultClock>;

/// Max client messages per second on one socket
pub const INPUT_RATE_LIMIT: u32 = 30;

/// Drops client messages beyond a steady per-second quota
pub struct InputRateLimiter {
    limiter: Limiter,
}

impl InputRateLimiter {
    pub fn new(per_second: u32) -> Self {
        let quota = Quota::per_second(NonZeroU32::new(per_second).unwrap_or(NonZeroU32::MIN));
        Self {
            limiter: RateLimiter::direct(quota),
        }
    }

    /// True if the message may be processed
    pub fn check(&self) -> bool {
        self.limiter.check().is_ok()
    }
}

impl Default for InputRateLimiter {
    fn default() -> Self {
        Self::new(INPUT_RATE_LIMIT)
    }
}
