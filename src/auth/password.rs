//! bcrypt password hashing.

use bcrypt::BcryptError;

pub use bcrypt::DEFAULT_COST;

/// Work factor bounds accepted by bcrypt.
pub const MIN_COST: u32 = 4;
pub const MAX_COST: u32 = 31;

/// Hash `password` with a fresh salt at the given work factor.
pub fn hash_password(password: &str, cost: u32) -> Result<String, BcryptError> {
    bcrypt::hash(password, cost)
}

/// Check `password` against a stored hash. Malformed hashes never match.
pub fn verify_password(password: &str, stored: &str) -> bool {
    match bcrypt::verify(password, stored) {
        Ok(matched) => matched,
        Err(e) => {
            tracing::debug!("Stored password hash rejected: {}", e);
            false
        }
    }
}
