//! HTTP server configuration settings.

use std::{net::SocketAddr, path::PathBuf};

use serde::Deserialize;

use crate::ClientIpConfig;

#[derive(Default, Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServerConfig {
    /// The socket address the server should listen on.
    pub listen_address: Option<SocketAddr>,
    /// TLS configuration for secure connections.
    pub tls: Option<TlsConfig>,
    /// Client IP extraction for rate-limit keying.
    pub client_ip: ClientIpConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TlsConfig {
    pub certificate: PathBuf,
    pub key: PathBuf,
}
