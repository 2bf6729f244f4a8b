//! Password hashing with bcrypt.
//!
//! bcrypt only reads the first 72 bytes of input, so anything longer is
//! truncated before hashing. The truncation is applied identically on hash
//! and verify; replacing it with an explicit length rejection would be a
//! breaking change for existing accounts.

use bcrypt::{hash, verify, BcryptError, DEFAULT_COST};

const BCRYPT_MAX_BYTES: usize = 72;

/// Truncate to the bcrypt input limit without splitting a UTF-8 character.
fn truncate(plain: &str) -> &str {
    if plain.len() <= BCRYPT_MAX_BYTES {
        return plain;
    }
    let mut end = BCRYPT_MAX_BYTES;
    while !plain.is_char_boundary(end) {
        end -= 1;
    }
    &plain[..end]
}

/// Hash a plain-text password with a fresh random salt. The returned string
/// is self-describing: it embeds the algorithm, cost, salt and digest.
pub fn hash_password(plain: &str) -> Result<String, BcryptError> {
    hash(truncate(plain), DEFAULT_COST)
}

/// Verify a plain-text attempt against a stored hash. A corrupted stored
/// hash is a verification failure, not an error.
pub fn verify_password(plain: &str, stored: &str) -> bool {
    verify(truncate(plain), stored).unwrap_or(false)
}
