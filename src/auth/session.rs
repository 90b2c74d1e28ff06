use crate::auth::AuthError;
use hmac::{Hmac, Mac};
use rand::RngCore;
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Name of the cookie carrying the signed session token
pub const SESSION_COOKIE: &str = "gitpanel_session";

/// Domain separator mixed into every session MAC
const TOKEN_CONTEXT: &str = "gitpanel-session:";

/// Seconds since the Unix epoch
pub fn now_epoch() -> i64 {
    chrono::Utc::now().timestamp()
}

/// Per-visitor authentication state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AuthSession {
    pub authenticated: bool,
    pub authenticated_at: i64,
}

impl AuthSession {
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn started_at(epoch: i64) -> Self {
        Self {
            authenticated: true,
            authenticated_at: epoch,
        }
    }

    /// Epoch second at which the session lapses
    pub fn expires_at(&self, duration_minutes: u64) -> i64 {
        let window = i64::try_from(duration_minutes.saturating_mul(60)).unwrap_or(i64::MAX);
        self.authenticated_at.saturating_add(window)
    }

    /// Authenticated and still inside its window at `now`
    pub fn is_active(&self, now: i64, duration_minutes: u64) -> bool {
        self.authenticated && now < self.expires_at(duration_minutes)
    }
}

/// Signs and checks session tokens of the form `<epoch>.<hex mac>`.
///
/// The token only proves when the password was last presented; the expiry
/// window is applied by the caller against current settings.
#[derive(Clone)]
pub struct SessionCodec {
    key: Vec<u8>,
}

impl SessionCodec {
    pub fn new(secret: &[u8]) -> Result<Self, AuthError> {
        if secret.is_empty() {
            return Err(AuthError::InvalidKey("session secret is empty".to_string()));
        }
        Ok(Self { key: secret.to_vec() })
    }

    /// Codec with a process-lifetime random key; sessions end on restart
    pub fn random() -> Self {
        let mut key = vec![0u8; 32];
        rand::rng().fill_bytes(&mut key);
        Self { key }
    }

    pub fn encode(&self, session: &AuthSession) -> Result<String, AuthError> {
        let mac = self.sign(session.authenticated_at)?;
        Ok(format!("{}.{}", session.authenticated_at, hex::encode(mac)))
    }

    /// Recover the session from a token; anything unverifiable is anonymous
    pub fn decode(&self, token: &str) -> AuthSession {
        let Some((at, mac_hex)) = token.trim().split_once('.') else {
            return AuthSession::anonymous();
        };
        let (Ok(at), Ok(expected)) = (at.parse::<i64>(), hex::decode(mac_hex)) else {
            return AuthSession::anonymous();
        };

        let Ok(mut mac) = HmacSha256::new_from_slice(&self.key) else {
            return AuthSession::anonymous();
        };
        mac.update(format!("{}{}", TOKEN_CONTEXT, at).as_bytes());

        if mac.verify_slice(&expected).is_ok() {
            AuthSession::started_at(at)
        } else {
            AuthSession::anonymous()
        }
    }

    fn sign(&self, at: i64) -> Result<Vec<u8>, AuthError> {
        let mut mac = HmacSha256::new_from_slice(&self.key).map_err(|e| AuthError::InvalidKey(e.to_string()))?;
        mac.update(format!("{}{}", TOKEN_CONTEXT, at).as_bytes());
        Ok(mac.finalize().into_bytes().to_vec())
    }
}
