// Authentication capabilities
// Password hashing and signed tokens, behind traits so services stay testable

pub mod jwt;
pub mod password;

use thiserror::Error;
use uuid::Uuid;

pub use jwt::{Claims, JwtService, TokenKind};
pub use password::BcryptPasswordHasher;

/// Failures raised by the hashing and token capabilities
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    #[error("Invalid or expired token")]
    InvalidToken,

    #[error("Password hashing failed: {0}")]
    Hashing(String),

    #[error("Token encoding failed: {0}")]
    Encoding(String),
}

/// One-way password hashing
pub trait PasswordHasher: Send + Sync {
    fn hash(&self, password: &str) -> Result<String, AuthError>;

    /// True if `password` matches `digest`
    fn verify(&self, password: &str, digest: &str) -> Result<bool, AuthError>;
}

/// Issues and checks signed bearer tokens
pub trait TokenService: Send + Sync {
    fn issue(&self, user_id: Uuid, kind: TokenKind) -> Result<String, AuthError>;

    /// Decodes `token`, rejecting it unless it is valid and of `expected` kind
    fn decode(&self, token: &str, expected: TokenKind) -> Result<Claims, AuthError>;
}
