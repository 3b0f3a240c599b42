use crate::Claims;

/// The authenticated caller, attached to a request after token validation.
///
/// This value travels through request extensions as a typed struct; handlers
/// and audit writers read it from there. Nothing in the service looks
/// identity up through string-keyed ambient state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestIdentity {
    pub subject_id: String,
    pub email: String,
    pub role: String,
}

impl RequestIdentity {
    /// Role check layered on top of authentication. An empty role set
    /// authorizes nobody.
    pub fn is_authorized(&self, required_roles: &[&str]) -> bool {
        required_roles.contains(&self.role.as_str())
    }
}

impl From<&Claims> for RequestIdentity {
    fn from(claims: &Claims) -> Self {
        Self {
            subject_id: claims.subject_id.clone(),
            email: claims.email.clone(),
            role: claims.role.clone(),
        }
    }
}
