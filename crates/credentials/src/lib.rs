//! Issuance and validation of signed, time-bounded identity tokens.
//!
//! Tokens move through one state machine: issued, valid while `now` lies in
//! `[nbf, exp)`, then expired. There is no revocation; a token stays valid
//! until its window closes. Issuance and validation share no mutable state,
//! so both are safe under unrestricted concurrency.

use chrono::{DateTime, Duration, Utc};
use context::{Claims, TokenType};
use jwt_compact::{
    AlgorithmExt, Header, Token, UntrustedToken,
    alg::{Hs256, Hs256Key},
};
use secrecy::{ExposeSecret, SecretString};

/// Validation failure, split so callers can surface "expired" (prompt a new
/// login) differently from "tampered or malformed" (report abuse).
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum CredentialError {
    /// Bad signature, foreign signing algorithm, malformed structure, or a
    /// not-yet-mature token.
    #[error("token is not valid")]
    Invalid,
    /// Correctly signed, but the validity window has closed.
    #[error("token has expired")]
    Expired,
}

#[derive(Debug, thiserror::Error)]
pub enum IssueError {
    #[error("failed to sign token: {0}")]
    Sign(#[from] jwt_compact::CreationError),
}

/// Issues and validates HMAC-signed identity tokens.
pub struct CredentialManager {
    key: Hs256Key,
    access_ttl: Duration,
    refresh_ttl: Duration,
}

impl CredentialManager {
    pub fn new(secret: &SecretString, access_ttl: std::time::Duration, refresh_ttl: std::time::Duration) -> Self {
        Self {
            key: Hs256Key::new(secret.expose_secret().as_bytes()),
            access_ttl: clamp_ttl(access_ttl),
            refresh_ttl: clamp_ttl(refresh_ttl),
        }
    }

    pub fn access_ttl(&self) -> std::time::Duration {
        self.access_ttl.to_std().unwrap_or(std::time::Duration::MAX)
    }

    /// Signs an access token with `iat = nbf = now` and `exp = now + ttl`.
    pub fn issue_access_token(
        &self,
        subject_id: &str,
        email: &str,
        role: &str,
        now: DateTime<Utc>,
    ) -> Result<String, IssueError> {
        self.issue(subject_id, email, role, TokenType::Access, self.access_ttl, now)
    }

    /// Signs a refresh token. Longer-lived, same claims shape; there is no
    /// rotation scheme.
    pub fn issue_refresh_token(
        &self,
        subject_id: &str,
        email: &str,
        role: &str,
        now: DateTime<Utc>,
    ) -> Result<String, IssueError> {
        self.issue(subject_id, email, role, TokenType::Refresh, self.refresh_ttl, now)
    }

    fn issue(
        &self,
        subject_id: &str,
        email: &str,
        role: &str,
        token_type: TokenType,
        ttl: Duration,
        now: DateTime<Utc>,
    ) -> Result<String, IssueError> {
        let custom = Claims {
            subject_id: subject_id.to_owned(),
            email: email.to_owned(),
            role: role.to_owned(),
            token_type,
        };

        let options = jwt_compact::TimeOptions::new(Duration::zero(), move || now);

        let claims = jwt_compact::Claims::new(custom)
            .set_duration_and_issuance(&options, ttl)
            .set_not_before(now);

        Ok(Hs256.token(&Header::empty(), &claims, &self.key)?)
    }

    /// Verifies signature and validity window, returning the trusted claims.
    ///
    /// The validator is pinned to the HMAC family; a token signed with any
    /// other algorithm fails as [`CredentialError::Invalid`] rather than
    /// being dispatched on its own header. The expiry bound is exclusive:
    /// `now == exp` is already expired.
    pub fn validate(&self, token: &str, now: DateTime<Utc>) -> Result<Claims, CredentialError> {
        let untrusted = UntrustedToken::new(token).map_err(|_| CredentialError::Invalid)?;

        let token: Token<Claims> = Hs256
            .validator(&self.key)
            .validate(&untrusted)
            .map_err(|_| CredentialError::Invalid)?;

        let claims = token.claims();

        let expires_at = claims.expiration.ok_or(CredentialError::Invalid)?;

        if now >= expires_at {
            return Err(CredentialError::Expired);
        }

        if let Some(not_before) = claims.not_before
            && now < not_before
        {
            return Err(CredentialError::Invalid);
        }

        Ok(claims.custom.clone())
    }
}

fn clamp_ttl(ttl: std::time::Duration) -> Duration {
    Duration::from_std(ttl).unwrap_or(Duration::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn manager() -> CredentialManager {
        CredentialManager::new(
            &SecretString::from("a-sufficiently-long-test-secret"),
            std::time::Duration::from_secs(24 * 60 * 60),
            std::time::Duration::from_secs(7 * 24 * 60 * 60),
        )
    }

    fn at(timestamp: i64) -> DateTime<Utc> {
        DateTime::from_timestamp(timestamp, 0).unwrap()
    }

    #[test]
    fn issued_claims_round_trip_without_loss() {
        let manager = manager();
        let now = at(1_700_000_000);

        let token = manager
            .issue_access_token("u-42", "jane@example.com", "employee", now)
            .unwrap();

        let claims = manager.validate(&token, now).unwrap();

        assert_eq!(
            claims,
            Claims {
                subject_id: "u-42".to_owned(),
                email: "jane@example.com".to_owned(),
                role: "employee".to_owned(),
                token_type: TokenType::Access,
            }
        );
    }

    #[test]
    fn refresh_tokens_carry_their_type() {
        let manager = manager();
        let now = at(1_700_000_000);

        let token = manager.issue_refresh_token("u-42", "jane@example.com", "admin", now).unwrap();
        let claims = manager.validate(&token, now).unwrap();

        assert_eq!(claims.token_type, TokenType::Refresh);
    }

    #[test]
    fn expiry_boundary_is_exclusive() {
        let manager = manager();
        let issued = at(1_700_000_000);
        let expires = at(1_700_000_000 + 24 * 60 * 60);

        let token = manager.issue_access_token("u-1", "a@example.com", "employee", issued).unwrap();

        // One second before the boundary: still valid.
        assert!(manager.validate(&token, expires - Duration::seconds(1)).is_ok());

        // Exactly at the boundary: expired, distinct from a tampered token.
        assert_eq!(manager.validate(&token, expires), Err(CredentialError::Expired));
        assert_eq!(
            manager.validate(&token, expires + Duration::seconds(3600)),
            Err(CredentialError::Expired)
        );
    }

    #[test]
    fn token_before_not_before_is_invalid() {
        let manager = manager();
        let issued = at(1_700_000_000);

        let token = manager.issue_access_token("u-1", "a@example.com", "employee", issued).unwrap();

        assert_eq!(
            manager.validate(&token, issued - Duration::seconds(60)),
            Err(CredentialError::Invalid)
        );
    }

    #[test]
    fn tampered_token_is_invalid() {
        let manager = manager();
        let now = at(1_700_000_000);

        let token = manager.issue_access_token("u-1", "a@example.com", "employee", now).unwrap();

        // Flip a character inside the payload segment.
        let mut tampered = token.into_bytes();
        let middle = tampered.len() / 2;
        tampered[middle] = if tampered[middle] == b'A' { b'B' } else { b'A' };
        let tampered = String::from_utf8(tampered).unwrap();

        assert_eq!(manager.validate(&tampered, now), Err(CredentialError::Invalid));
    }

    #[test]
    fn token_signed_with_other_secret_is_invalid() {
        let manager = manager();
        let other = CredentialManager::new(
            &SecretString::from("a-completely-different-secret"),
            std::time::Duration::from_secs(3600),
            std::time::Duration::from_secs(3600),
        );
        let now = at(1_700_000_000);

        let token = other.issue_access_token("u-1", "a@example.com", "employee", now).unwrap();

        assert_eq!(manager.validate(&token, now), Err(CredentialError::Invalid));
    }

    #[test]
    fn garbage_is_invalid_not_expired() {
        let manager = manager();

        assert_eq!(
            manager.validate("definitely-not-a-token", at(1_700_000_000)),
            Err(CredentialError::Invalid)
        );
        assert_eq!(manager.validate("", at(1_700_000_000)), Err(CredentialError::Invalid));
    }

    #[test]
    fn token_with_unsigned_alg_header_is_invalid() {
        let manager = manager();
        let now = at(1_700_000_000);

        // alg: none with a forged payload must not validate.
        let forged = concat!(
            "eyJhbGciOiJub25lIiwidHlwIjoiSldUIn0.",
            "eyJ1c2VyX2lkIjoidS0xIiwiZW1haWwiOiJhQGV4YW1wbGUuY29tIiwicm9sZSI6ImFkbWluIiwidG9rZW5fdHlwZSI6ImFjY2VzcyIsImV4cCI6NDEwMjQ0NDgwMH0.",
        );

        assert_eq!(manager.validate(forged, now), Err(CredentialError::Invalid));
    }
}
