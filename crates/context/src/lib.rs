mod claims;
mod identity;

pub use claims::{Claims, TokenType};
pub use identity::RequestIdentity;
