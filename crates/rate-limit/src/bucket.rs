use std::time::{Duration, Instant};

/// Per-client token bucket state.
///
/// Refill is lazy: tokens are credited on access from the elapsed wall time,
/// never by a timer. The fill level stays within `0..=capacity`; a refill
/// rate of zero simply stops crediting tokens, so a misconfigured limiter
/// starves after the initial burst instead of dividing by zero.
#[derive(Debug, Clone, Copy)]
pub(crate) struct TokenBucket {
    capacity: u32,
    refill_per_second: f64,
    tokens: f64,
    last_refill: Instant,
    last_seen: Instant,
}

impl TokenBucket {
    /// A fresh bucket starts full so a new client gets its burst immediately.
    pub(crate) fn full(capacity: u32, refill_per_second: f64, now: Instant) -> Self {
        Self {
            capacity,
            refill_per_second,
            tokens: f64::from(capacity),
            last_refill: now,
            last_seen: now,
        }
    }

    /// Credits elapsed refill, then tries to take one token.
    ///
    /// Rejection is immediate; this never queues or blocks.
    pub(crate) fn consume(&mut self, now: Instant) -> bool {
        self.refill(now);
        self.last_seen = now;

        if self.tokens >= 1.0 {
            self.tokens -= 1.0;
            true
        } else {
            false
        }
    }

    fn refill(&mut self, now: Instant) {
        let elapsed = now.saturating_duration_since(self.last_refill).as_secs_f64();
        self.tokens = (self.tokens + elapsed * self.refill_per_second).min(f64::from(self.capacity));
        self.last_refill = now;
    }

    pub(crate) fn idle_for(&self, now: Instant) -> Duration {
        now.saturating_duration_since(self.last_seen)
    }
}
