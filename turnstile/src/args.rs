use std::{net::SocketAddr, path::PathBuf};

use clap::Parser;

/// Attendance admission service: rate limiting, identity tokens, geofenced
/// check-ins.
#[derive(Debug, Parser)]
#[command(name = "turnstile", version)]
pub(crate) struct Args {
    /// Path to the TOML configuration file.
    #[arg(short, long, env = "TURNSTILE_CONFIG", default_value = "turnstile.toml")]
    pub(crate) config: PathBuf,

    /// Socket address to listen on, overriding the configuration file.
    #[arg(short, long, env = "TURNSTILE_LISTEN_ADDRESS")]
    pub(crate) listen_address: Option<SocketAddr>,

    /// Log filter, e.g. "info" or "server=debug,rate_limit=debug".
    #[arg(long, env = "TURNSTILE_LOG", default_value = "info")]
    pub(crate) log_filter: String,
}
