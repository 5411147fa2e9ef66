//! User tokens for the HTTP API.
//!
//! The engine only ever sees a user id. The server derives it from a bearer
//! token of the form `ironplan_ut_<user_id>_<hmac_hex>`, where the HMAC-SHA256
//! is computed over `user:<user_id>` with the configured secret.

use hmac::{Hmac, Mac};
use sha2::Sha256;
use uuid::Uuid;

type HmacSha256 = Hmac<Sha256>;

const TOKEN_PREFIX: &str = "ironplan_ut_";

/// Length of a hyphenated UUID.
const UUID_LEN: usize = 36;

#[derive(Debug, thiserror::Error)]
pub enum TokenError {
    #[error("invalid token format: {0}")]
    InvalidFormat(String),

    #[error("invalid user ID in token: {0}")]
    InvalidUserId(String),

    #[error("token HMAC verification failed")]
    HmacMismatch,

    #[error("missing token secret")]
    MissingSecret,

    #[error("token secret is not valid hex: {0}")]
    InvalidSecret(String),
}

/// The HMAC key used to sign and verify user tokens.
#[derive(Clone)]
pub struct TokenConfig {
    secret: Vec<u8>,
}

impl TokenConfig {
    pub fn new(secret: Vec<u8>) -> Result<Self, TokenError> {
        if secret.is_empty() {
            return Err(TokenError::MissingSecret);
        }
        Ok(Self { secret })
    }

    /// Build from the hex string stored in the config file.
    pub fn from_hex(secret_hex: &str) -> Result<Self, TokenError> {
        let secret =
            hex::decode(secret_hex.trim()).map_err(|e| TokenError::InvalidSecret(e.to_string()))?;
        Self::new(secret)
    }

    fn mac(&self, user_id: Uuid) -> Result<HmacSha256, TokenError> {
        let mut mac = HmacSha256::new_from_slice(&self.secret)
            .map_err(|e| TokenError::InvalidSecret(e.to_string()))?;
        mac.update(format!("user:{user_id}").as_bytes());
        Ok(mac)
    }
}

impl std::fmt::Debug for TokenConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenConfig")
            .field("secret", &"<redacted>")
            .finish()
    }
}

/// Issue a token identifying `user_id`.
pub fn generate_user_token(config: &TokenConfig, user_id: Uuid) -> Result<String, TokenError> {
    let mac = config.mac(user_id)?;
    let hmac_hex = hex::encode(mac.finalize().into_bytes());
    Ok(format!("{TOKEN_PREFIX}{user_id}_{hmac_hex}"))
}

/// Verify a token and return the user it identifies.
///
/// The HMAC comparison is constant-time.
pub fn validate_user_token(config: &TokenConfig, token: &str) -> Result<Uuid, TokenError> {
    let rest = token.strip_prefix(TOKEN_PREFIX).ok_or_else(|| {
        TokenError::InvalidFormat(format!("token must start with {TOKEN_PREFIX:?}"))
    })?;

    if rest.len() < UUID_LEN || !rest.is_char_boundary(UUID_LEN) {
        return Err(TokenError::InvalidFormat(
            "token too short to contain a user ID".to_owned(),
        ));
    }
    let (user_id_str, after_user_id) = rest.split_at(UUID_LEN);
    let user_id =
        Uuid::parse_str(user_id_str).map_err(|e| TokenError::InvalidUserId(e.to_string()))?;

    let hmac_hex = after_user_id.strip_prefix('_').ok_or_else(|| {
        TokenError::InvalidFormat("expected underscore after user ID".to_owned())
    })?;
    let provided = hex::decode(hmac_hex)
        .map_err(|e| TokenError::InvalidFormat(format!("invalid hex in hmac: {e}")))?;

    config
        .mac(user_id)?
        .verify_slice(&provided)
        .map_err(|_| TokenError::HmacMismatch)?;

    Ok(user_id)
}
