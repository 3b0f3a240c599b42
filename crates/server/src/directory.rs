use std::fmt::Write as _;

use async_trait::async_trait;
use config::StaticUserConfig;
use sha2::{Digest, Sha256};

/// A user as the login endpoint needs it.
#[derive(Debug, Clone)]
pub struct UserRecord {
    pub id: String,
    pub email: String,
    pub role: String,
}

#[derive(Debug, thiserror::Error)]
#[error("user directory unavailable: {reason}")]
pub struct DirectoryError {
    reason: String,
}

impl DirectoryError {
    pub fn new(reason: impl Into<String>) -> Self {
        Self { reason: reason.into() }
    }
}

/// External user lookup consulted by the login endpoint. The real user
/// store lives behind this boundary; implementations own their hashing
/// scheme and transport.
#[async_trait]
pub trait UserDirectory: Send + Sync {
    /// The matching record when the supplied credentials are correct,
    /// `None` when they are not. Lookup failure is a store error, never a
    /// silent `None`.
    async fn verify_credentials(&self, email: &str, password: &str) -> Result<Option<UserRecord>, DirectoryError>;
}

/// Directory backed by users provisioned in configuration, compared against
/// SHA-256 password digests.
pub struct StaticUserDirectory {
    users: Vec<StaticUserConfig>,
}

impl StaticUserDirectory {
    pub fn new(users: Vec<StaticUserConfig>) -> Self {
        Self { users }
    }
}

#[async_trait]
impl UserDirectory for StaticUserDirectory {
    async fn verify_credentials(&self, email: &str, password: &str) -> Result<Option<UserRecord>, DirectoryError> {
        let digest = hex_digest(password);

        Ok(self
            .users
            .iter()
            .find(|user| user.email == email && user.password_sha256.eq_ignore_ascii_case(&digest))
            .map(|user| UserRecord {
                id: user.id.clone(),
                email: user.email.clone(),
                role: user.role.clone(),
            }))
    }
}

fn hex_digest(password: &str) -> String {
    let digest = Sha256::digest(password.as_bytes());
    let mut out = String::with_capacity(digest.len() * 2);

    for byte in digest {
        let _ = write!(out, "{byte:02x}");
    }

    out
}
