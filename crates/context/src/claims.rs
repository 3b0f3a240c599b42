use serde::{Deserialize, Serialize};

/// Distinguishes short-lived access tokens from long-lived refresh tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenType {
    Access,
    Refresh,
}

/// Application payload carried inside a signed identity token.
///
/// Registered claims (`iat`, `nbf`, `exp`) are managed by the signing layer;
/// this struct holds only the fields the service itself asserts. A `Claims`
/// value is trustworthy only after signature and validity-window checks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Identifier of the authenticated subject.
    #[serde(rename = "user_id")]
    pub subject_id: String,
    pub email: String,
    pub role: String,
    pub token_type: TokenType,
}
