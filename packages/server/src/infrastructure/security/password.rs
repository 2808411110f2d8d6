//! Password hashing.

use bcrypt::DEFAULT_COST;

/// Hash a plaintext password for storage.
pub fn hash_password(plain: &str) -> Result<String, bcrypt::BcryptError> {
    bcrypt::hash(plain, DEFAULT_COST)
}

/// Check a plaintext password against a stored hash.
pub fn verify_password(plain: &str, hashed: &str) -> Result<bool, bcrypt::BcryptError> {
    bcrypt::verify(plain, hashed)
}
