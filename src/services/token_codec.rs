use std::sync::Arc;

use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{de::DeserializeOwned, Serialize};

use crate::{models::auth::ExpiringClaims, services::clock::Clock};

#[derive(Debug, thiserror::Error)]
pub enum TokenError {
    #[error("Token signing secret is not configured")]
    MissingSecret,
    #[error("Invalid token: {0}")]
    Invalid(String),
    #[error("Token expired")]
    Expired,
    #[error("Token lifetime of {0}s does not fit in a unix timestamp")]
    LifetimeOutOfRange(u64),
    #[error("Failed to sign token: {0}")]
    Signing(#[source] jsonwebtoken::errors::Error),
}

pub type TokenResult<T> = Result<T, TokenError>;

/// HS256 JWT sealing shared by nonce and session tokens.
///
/// Expiry is checked against the injected [`Clock`] with no leeway instead of
/// the library's wall-clock check, so a token is valid strictly before `exp`.
#[derive(Clone)]
pub struct TokenCodec {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    clock: Arc<dyn Clock>,
}

impl TokenCodec {
    pub fn new(secret: &str, clock: Arc<dyn Clock>) -> TokenResult<Self> {
        if secret.trim().is_empty() {
            return Err(TokenError::MissingSecret);
        }

        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        validation.leeway = 0;

        Ok(Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
            clock,
        })
    }

    pub fn now(&self) -> i64 {
        self.clock.now().timestamp()
    }

    /// `exp` for a token issued at `iat` that lives `ttl_seconds`.
    pub fn expiry(iat: i64, ttl_seconds: u64) -> TokenResult<i64> {
        i64::try_from(ttl_seconds)
            .ok()
            .and_then(|ttl| iat.checked_add(ttl))
            .ok_or(TokenError::LifetimeOutOfRange(ttl_seconds))
    }

    pub fn encode<T: Serialize>(&self, claims: &T) -> TokenResult<String> {
        encode(&Header::new(Algorithm::HS256), claims, &self.encoding_key).map_err(TokenError::Signing)
    }

    pub fn decode<T>(&self, token: &str) -> TokenResult<T>
    where
        T: DeserializeOwned + ExpiringClaims,
    {
        let claims = decode::<T>(token, &self.decoding_key, &self.validation)
            .map_err(|e| TokenError::Invalid(e.to_string()))?
            .claims;

        if self.now() >= claims.expires_at() {
            return Err(TokenError::Expired);
        }

        Ok(claims)
    }
}
