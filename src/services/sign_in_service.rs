use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::{
    errors::AuthError,
    models::auth::VerifyRequest,
    services::{
        nonce_service::NonceService,
        replay_guard::ExpiringSet,
        session_service::{IssuedSession, SessionService},
        signature_service::{SigServiceError, SignatureService},
        token_codec::TokenError,
    },
    utils::eth_address_validator::is_valid_eth_address,
};

/// Inputs of a sign-in attempt after presence checks.
#[derive(Debug, Clone)]
pub struct SignInAttempt {
    pub address: String,
    pub signature: String,
    pub nonce_token: String,
}

impl TryFrom<VerifyRequest> for SignInAttempt {
    type Error = AuthError;

    fn try_from(body: VerifyRequest) -> Result<Self, Self::Error> {
        let present = |v: Option<String>| v.map(|s| s.trim().to_string()).filter(|s| !s.is_empty());

        match (present(body.address), present(body.signature), present(body.nonce_token)) {
            (Some(address), Some(signature), Some(nonce_token)) => Ok(Self {
                address,
                signature,
                nonce_token,
            }),
            _ => Err(AuthError::BadRequest(
                "address, signature and nonceToken required".to_string(),
            )),
        }
    }
}

#[derive(Debug, Clone)]
pub struct CompletedSignIn {
    pub address: String,
    pub session: IssuedSession,
}

/// Runs the verify step of the sign-in protocol. Each gate fails closed.
#[derive(Clone)]
pub struct SignInService {
    nonces: NonceService,
    sessions: SessionService,
    consumed: Option<Arc<ExpiringSet>>,
}

impl SignInService {
    pub fn new(nonces: NonceService, sessions: SessionService, single_use_nonces: bool) -> Self {
        Self {
            nonces,
            sessions,
            consumed: single_use_nonces.then(|| Arc::new(ExpiringSet::new())),
        }
    }

    pub fn complete_sign_in(&self, attempt: SignInAttempt, origin: &str) -> Result<CompletedSignIn, AuthError> {
        if !is_valid_eth_address(&attempt.address) {
            return Err(AuthError::BadRequest("address is not a valid account address".to_string()));
        }
        let claimed = attempt.address.to_lowercase();

        let challenge = self.nonces.decode(&attempt.nonce_token).map_err(|e| {
            match &e {
                TokenError::Expired => debug!(address = %claimed, "Nonce token expired"),
                other => debug!(address = %claimed, error = %other, "Nonce token rejected"),
            }
            AuthError::InvalidOrExpiredNonce
        })?;

        if let Some(bound) = &challenge.address {
            if !bound.eq_ignore_ascii_case(&claimed) {
                warn!(bound = %bound, claimed = %claimed, "Nonce token bound to a different address");
                return Err(AuthError::AddressBindingMismatch);
            }
        }

        let message = self.nonces.message_for(origin, &challenge.nonce);
        let recovered = SignatureService::recover_address(message.as_bytes(), &attempt.signature).map_err(
            |e: SigServiceError| {
                debug!(error = %e, "Unparseable signature");
                AuthError::MalformedSignature
            },
        )?;

        if !recovered.eq_ignore_ascii_case(&claimed) {
            warn!(claimed = %claimed, recovered = %recovered, origin = %origin, "Signature verification failed");
            return Err(AuthError::SignatureVerificationFailed);
        }

        if let Some(consumed) = &self.consumed {
            if !consumed.insert_if_absent(&challenge.nonce, challenge.expires_at, self.sessions.now()) {
                warn!(address = %claimed, "Nonce already consumed");
                return Err(AuthError::InvalidOrExpiredNonce);
            }
        }

        let session = self.sessions.mint(&claimed)?;
        info!(address = %claimed, "Sign-in completed");

        Ok(CompletedSignIn {
            address: claimed,
            session,
        })
    }
}
