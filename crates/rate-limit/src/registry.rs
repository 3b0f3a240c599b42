use std::time::{Duration, Instant};

use config::LimiterConfig;
use dashmap::DashMap;

use crate::bucket::TokenBucket;

/// Concurrency-safe map of client key to token bucket.
///
/// Entries are created on first access and removed by [`sweep_at`] once idle
/// for longer than `max_idle`. Fetch-or-create and consume happen under a
/// single shard entry guard, so two concurrent first requests for the same
/// key cannot create duplicate buckets, and the sweep only serializes with
/// admission checks that hash to the same shard.
///
/// [`sweep_at`]: ClientRegistry::sweep_at
pub struct ClientRegistry {
    buckets: DashMap<String, TokenBucket>,
    config: LimiterConfig,
}

impl ClientRegistry {
    pub fn new(config: LimiterConfig) -> Self {
        Self {
            buckets: DashMap::new(),
            config,
        }
    }

    /// Admission check against the wall clock.
    pub fn allow(&self, key: &str) -> bool {
        self.allow_at(key, Instant::now())
    }

    /// Admission check at an explicit point in time.
    pub fn allow_at(&self, key: &str, now: Instant) -> bool {
        let mut entry = self
            .buckets
            .entry(key.to_owned())
            .or_insert_with(|| TokenBucket::full(self.config.burst, self.config.refill_per_second, now));

        entry.consume(now)
    }

    /// Evicts entries idle for longer than `max_idle`; returns how many.
    pub fn sweep_at(&self, now: Instant) -> usize {
        let mut evicted = 0;

        self.buckets.retain(|_, bucket| {
            let keep = bucket.idle_for(now) <= self.config.max_idle;
            if !keep {
                evicted += 1;
            }
            keep
        });

        evicted
    }

    /// Back-off hint for rejected callers: the time one token takes to
    /// accrue, never below one second. The registry itself schedules nothing.
    pub fn retry_after(&self) -> Duration {
        let secs = (1.0 / self.config.refill_per_second).ceil();

        if secs.is_finite() {
            Duration::from_secs_f64(secs.max(1.0))
        } else {
            self.config.max_idle
        }
    }

    pub fn sweep_interval(&self) -> Duration {
        self.config.sweep_interval
    }

    pub fn len(&self) -> usize {
        self.buckets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }
}
