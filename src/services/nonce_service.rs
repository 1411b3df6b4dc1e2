use rand::Rng;
use tracing::{error, info};

use crate::{
    errors::AuthError,
    models::auth::{NonceChallenge, NonceClaims},
    services::token_codec::{TokenCodec, TokenResult},
};

pub const NONCE_LEN: usize = 24;
const NONCE_ALPHABET: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";

/// Random base-36 nonce from the thread-local CSPRNG.
pub fn generate_nonce() -> String {
    let mut rng = rand::rng();
    (0..NONCE_LEN)
        .map(|_| NONCE_ALPHABET[rng.random_range(0..NONCE_ALPHABET.len())] as char)
        .collect()
}

/// The exact text a wallet signs. Issuance and verification must both build
/// it through this function.
pub fn sign_in_message(origin: &str, nonce: &str, ttl_seconds: u64) -> String {
    format!("Sign-in to {}\n\nNonce: {}\nExpires-in: {}s", origin, nonce, ttl_seconds)
}

#[derive(Debug, Clone)]
pub struct IssuedNonce {
    pub nonce_token: String,
    pub message: String,
    pub challenge: NonceChallenge,
}

#[derive(Clone)]
pub struct NonceService {
    codec: TokenCodec,
    ttl_seconds: u64,
}

impl NonceService {
    pub fn new(codec: TokenCodec, ttl_seconds: u64) -> Self {
        Self { codec, ttl_seconds }
    }

    pub fn encode(&self, challenge: &NonceChallenge) -> TokenResult<String> {
        let claims = NonceClaims {
            nonce: challenge.nonce.clone(),
            address: challenge.address.clone(),
            iat: challenge.issued_at,
            exp: challenge.expires_at,
        };
        self.codec.encode(&claims)
    }

    pub fn decode(&self, token: &str) -> TokenResult<NonceChallenge> {
        self.codec.decode::<NonceClaims>(token).map(NonceClaims::into_challenge)
    }

    pub fn message_for(&self, origin: &str, nonce: &str) -> String {
        sign_in_message(origin, nonce, self.ttl_seconds)
    }

    pub fn issue(&self, address: Option<&str>, origin: &str) -> Result<IssuedNonce, AuthError> {
        let address = address
            .map(str::trim)
            .filter(|a| !a.is_empty())
            .map(str::to_lowercase);

        let issued_at = self.codec.now();
        let challenge = TokenCodec::expiry(issued_at, self.ttl_seconds)
            .map(|expires_at| NonceChallenge {
                nonce: generate_nonce(),
                address,
                issued_at,
                expires_at,
            })
            .map_err(|e| {
                error!(error = %e, "Nonce lifetime misconfigured");
                AuthError::Internal(e.to_string())
            })?;

        let nonce_token = self.encode(&challenge).map_err(|e| {
            error!(error = %e, "Failed to sign nonce token");
            AuthError::Internal(e.to_string())
        })?;
        let message = self.message_for(origin, &challenge.nonce);

        info!(
            bound = challenge.address.is_some(),
            origin = %origin,
            ttl_seconds = self.ttl_seconds,
            "Issued sign-in nonce"
        );

        Ok(IssuedNonce {
            nonce_token,
            message,
            challenge,
        })
    }
}
