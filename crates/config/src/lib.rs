mod auth;
mod client_ip;
mod geofence;
mod loader;
mod rate_limit;
mod server;

use std::path::Path;

use serde::Deserialize;

pub use auth::{AuthConfig, StaticUserConfig};
pub use client_ip::ClientIpConfig;
pub use geofence::{GeofenceConfig, ZoneConfig};
pub use rate_limit::{LimiterConfig, RateLimitConfig};
pub use server::{ServerConfig, TlsConfig};

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub server: ServerConfig,
    pub rate_limit: RateLimitConfig,
    pub auth: AuthConfig,
    pub geofence: GeofenceConfig,
}

impl Config {
    /// Reads and validates the configuration from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Config> {
        loader::load(path)
    }
}
