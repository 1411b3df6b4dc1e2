use serde::{Deserialize, Serialize};

/// A sign-in challenge before it is sealed into a nonce token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NonceChallenge {
    pub nonce: String,
    /// Lowercased address the challenge is bound to, if the client supplied one.
    pub address: Option<String>,
    pub issued_at: i64,
    pub expires_at: i64,
}

/// Claims carried by a nonce token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NonceClaims {
    pub nonce: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    pub iat: i64,
    pub exp: i64,
}

impl NonceClaims {
    pub fn into_challenge(self) -> NonceChallenge {
        NonceChallenge {
            nonce: self.nonce,
            address: self.address,
            issued_at: self.iat,
            expires_at: self.exp,
        }
    }
}

/// Claims carried by a session token. `jti` is random per mint, so two
/// sessions for one address in the same second are still distinct.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionClaims {
    pub sub: String,
    pub jti: String,
    pub iat: i64,
    pub exp: i64,
}

/// Claims that expire at a unix timestamp.
pub trait ExpiringClaims {
    fn expires_at(&self) -> i64;
}

impl ExpiringClaims for NonceClaims {
    fn expires_at(&self) -> i64 {
        self.exp
    }
}

impl ExpiringClaims for SessionClaims {
    fn expires_at(&self) -> i64 {
        self.exp
    }
}

#[derive(Debug, Deserialize)]
pub struct NonceQuery {
    pub address: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NonceResponse {
    pub nonce_token: String,
    pub message: String,
}

/// Body of `POST /verify`. Fields are optional so that missing inputs surface
/// as a protocol error instead of an extractor rejection.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyRequest {
    pub address: Option<String>,
    pub signature: Option<String>,
    pub nonce_token: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct VerifyResponse {
    pub ok: bool,
    pub token: String,
    pub payload: SessionClaims,
    pub address: String,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum MeResponse {
    Authenticated {
        authenticated: bool,
        address: String,
        token: String,
        payload: SessionClaims,
    },
    Anonymous {
        authenticated: bool,
    },
}

impl MeResponse {
    pub fn authenticated(token: String, payload: SessionClaims) -> Self {
        MeResponse::Authenticated {
            authenticated: true,
            address: payload.sub.clone(),
            token,
            payload,
        }
    }

    pub fn anonymous() -> Self {
        MeResponse::Anonymous { authenticated: false }
    }

    pub fn is_authenticated(&self) -> bool {
        matches!(self, MeResponse::Authenticated { .. })
    }
}

#[derive(Debug, Serialize)]
pub struct LogoutResponse {
    pub ok: bool,
}
