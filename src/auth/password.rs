//! Bcrypt hashes for the panel's single access password.
//!
//! New hashes are written with the `$2y$` prefix so an `.env` can be shared
//! with PHP tooling; `$2a$`, `$2b$` and `$2x$` hashes verify as well.

use crate::auth::AuthError;
use bcrypt::Version;

pub use bcrypt::DEFAULT_COST;

/// Shortest password the setup wizard accepts
pub const MIN_PASSWORD_LENGTH: usize = 6;

/// Hash a password with a fresh random salt at [`DEFAULT_COST`]
pub fn hash_password(password: &str) -> Result<String, AuthError> {
    hash_password_with_cost(password, DEFAULT_COST)
}

/// Hash with an explicit work factor (4..=31)
pub fn hash_password_with_cost(password: &str, cost: u32) -> Result<String, AuthError> {
    let parts = bcrypt::hash_with_result(password, cost)?;
    Ok(parts.format_for_version(Version::TwoY))
}

/// Check a candidate password against a stored hash
pub fn verify_password(password: &str, stored: &str) -> Result<bool, AuthError> {
    bcrypt::verify(password, stored.trim()).map_err(|_| AuthError::MalformedHash)
}
