pub mod password;
pub mod session;

pub use password::{DEFAULT_COST, MIN_PASSWORD_LENGTH, hash_password, hash_password_with_cost, verify_password};
pub use session::{AuthSession, SESSION_COOKIE, SessionCodec, now_epoch};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Stored password hash is malformed")]
    MalformedHash,

    #[error("Failed to hash password: {0}")]
    Hashing(#[from] bcrypt::BcryptError),

    #[error("Invalid key material: {0}")]
    InvalidKey(String),
}
