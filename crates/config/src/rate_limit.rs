//! Admission rate limiter configuration.

use std::time::Duration;

use serde::Deserialize;

/// Two independent registries: a lenient one applied to all traffic and a
/// strict one applied only to the login endpoint. A client blocked by one is
/// not necessarily blocked by the other.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RateLimitConfig {
    pub global: LimiterConfig,
    pub login: LimiterConfig,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            global: LimiterConfig::default(),
            login: LimiterConfig::login(),
        }
    }
}

/// Settings for one client registry.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LimiterConfig {
    /// Tokens restored per second.
    pub refill_per_second: f64,
    /// Bucket capacity; the burst a fresh client is granted immediately.
    pub burst: u32,
    /// How often the background sweep runs.
    #[serde(deserialize_with = "duration_str::deserialize_duration")]
    pub sweep_interval: Duration,
    /// Entries idle for longer than this are evicted by the sweep.
    #[serde(deserialize_with = "duration_str::deserialize_duration")]
    pub max_idle: Duration,
}

impl Default for LimiterConfig {
    fn default() -> Self {
        Self {
            refill_per_second: 10.0,
            burst: 20,
            sweep_interval: Duration::from_secs(60),
            max_idle: Duration::from_secs(3 * 60),
        }
    }
}

impl LimiterConfig {
    /// Stricter profile for the login endpoint to blunt credential guessing.
    pub fn login() -> Self {
        Self {
            refill_per_second: 1.0,
            burst: 5,
            max_idle: Duration::from_secs(5 * 60),
            ..Self::default()
        }
    }
}
