// Password hashing utilities
// Uses bcrypt for secure password hashing

use bcrypt::{hash, verify, DEFAULT_COST};

use super::{AuthError, PasswordHasher};

/// bcrypt-backed [`PasswordHasher`]
///
/// # Example
/// ```
/// use devcollab_api::auth::{BcryptPasswordHasher, PasswordHasher};
///
/// let hasher = BcryptPasswordHasher::new(4);
/// let digest = hasher.hash("my_password").unwrap();
/// assert!(hasher.verify("my_password", &digest).unwrap());
/// ```
#[derive(Debug, Clone, Copy)]
pub struct BcryptPasswordHasher {
    cost: u32,
}

impl BcryptPasswordHasher {
    /// Creates a hasher with the given bcrypt work factor (4..=31)
    pub fn new(cost: u32) -> Self {
        Self { cost }
    }

    pub fn cost(&self) -> u32 {
        self.cost
    }
}

impl Default for BcryptPasswordHasher {
    fn default() -> Self {
        Self::new(DEFAULT_COST)
    }
}

impl PasswordHasher for BcryptPasswordHasher {
    fn hash(&self, password: &str) -> Result<String, AuthError> {
        hash(password, self.cost).map_err(|e| AuthError::Hashing(e.to_string()))
    }

    /// Verifies a password against a bcrypt hash
    ///
    /// # Returns
    /// * `Ok(bool)` - True if password matches, false otherwise
    /// * `Err(AuthError::Hashing)` - If the digest is malformed
    fn verify(&self, password: &str, digest: &str) -> Result<bool, AuthError> {
        verify(password, digest).map_err(|e| AuthError::Hashing(e.to_string()))
    }
}
