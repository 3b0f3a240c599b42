use credentials::CredentialError;

/// Authentication failures, all answered with 401. Expiry keeps its own
/// variant so the client can prompt a re-login instead of reporting a bad
/// token.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("authorization header is required")]
    MissingHeader,
    #[error("authorization header is not a bearer token")]
    MalformedHeader,
    #[error("token is not valid")]
    InvalidToken,
    #[error("token has expired")]
    ExpiredToken,
}

impl From<CredentialError> for AuthError {
    fn from(error: CredentialError) -> Self {
        match error {
            CredentialError::Invalid => AuthError::InvalidToken,
            CredentialError::Expired => AuthError::ExpiredToken,
        }
    }
}
