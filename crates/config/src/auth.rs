//! Identity token and static user directory configuration.

use std::time::Duration;

use secrecy::SecretString;
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AuthConfig {
    /// Symmetric secret used to sign and verify identity tokens.
    pub secret: SecretString,
    /// Validity window of access tokens.
    #[serde(deserialize_with = "duration_str::deserialize_duration")]
    pub access_token_ttl: Duration,
    /// Validity window of refresh tokens.
    #[serde(deserialize_with = "duration_str::deserialize_duration")]
    pub refresh_token_ttl: Duration,
    /// Users provisioned through configuration, served by the static
    /// directory. Deployments with a real user store leave this empty.
    pub users: Vec<StaticUserConfig>,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            secret: SecretString::from(String::new()),
            access_token_ttl: Duration::from_secs(24 * 60 * 60),
            refresh_token_ttl: Duration::from_secs(7 * 24 * 60 * 60),
            users: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StaticUserConfig {
    pub id: String,
    pub email: String,
    /// Lowercase hex SHA-256 digest of the user's password.
    pub password_sha256: String,
    pub role: String,
}
