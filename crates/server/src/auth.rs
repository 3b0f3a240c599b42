mod error;
mod layer;

pub(crate) use layer::{AuthLayer, RequireRoleLayer};

type AuthResult<T> = Result<T, error::AuthError>;
