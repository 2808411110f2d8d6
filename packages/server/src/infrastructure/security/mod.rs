//! Credential machinery: password hashing, JWT issuing, token verification.

pub mod password;
pub mod token;
pub mod verifier;

pub use password::{hash_password, verify_password};
pub use token::{Claims, TOKEN_TYPE_REFRESH, TokenError, TokenPair, TokenService};
pub use verifier::JwtIdentityVerifier;
