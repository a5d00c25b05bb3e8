use thiserror::Error;

/// bcrypt only reads this many bytes of its input; longer passwords are refused
/// rather than silently truncated.
pub const MAX_PASSWORD_BYTES: usize = 72;

#[derive(Debug, Error)]
pub enum PasswordError {
    #[error("password hashing failed: {0}")]
    Hashing(#[from] bcrypt::BcryptError),
    #[error("password is longer than {MAX_PASSWORD_BYTES} bytes")]
    TooLong,
}

/// PasswordHasher
///
/// Salted one-way hashing of user passwords with bcrypt. The salt and cost are
/// embedded in the produced hash string, so verification needs no extra state.
#[derive(Debug, Clone, Copy)]
pub struct PasswordHasher {
    cost: u32,
}

impl PasswordHasher {
    pub const fn new(cost: u32) -> Self {
        Self { cost }
    }

    pub fn hash(&self, plaintext: &str) -> Result<String, PasswordError> {
        if plaintext.len() > MAX_PASSWORD_BYTES {
            return Err(PasswordError::TooLong);
        }
        Ok(bcrypt::hash(plaintext, self.cost)?)
    }

    /// Compares `plaintext` against a stored hash. A stored value that is not a
    /// bcrypt hash never verifies.
    pub fn verify(&self, hash: &str, plaintext: &str) -> bool {
        bcrypt::verify(plaintext, hash).unwrap_or(false)
    }
}
