use std::sync::Arc;

use tower_cookies::{
    cookie::{time::Duration, SameSite},
    Cookie,
};
use tracing::{debug, error, info};

use crate::{
    config::CookieConfig,
    errors::AuthError,
    models::auth::{MeResponse, SessionClaims},
    services::{nonce_service::generate_nonce, replay_guard::ExpiringSet, token_codec::TokenCodec},
};

#[derive(Debug, Clone)]
pub struct IssuedSession {
    pub token: String,
    pub claims: SessionClaims,
}

/// Mints, verifies and transports session tokens.
#[derive(Clone)]
pub struct SessionService {
    codec: TokenCodec,
    ttl_seconds: u64,
    cookie: CookieConfig,
    revoked: Option<Arc<ExpiringSet>>,
}

impl SessionService {
    pub fn new(codec: TokenCodec, ttl_seconds: u64, cookie: CookieConfig, revoke_on_logout: bool) -> Self {
        Self {
            codec,
            ttl_seconds,
            cookie,
            revoked: revoke_on_logout.then(|| Arc::new(ExpiringSet::new())),
        }
    }

    pub fn now(&self) -> i64 {
        self.codec.now()
    }

    pub fn cookie_name(&self) -> &str {
        &self.cookie.name
    }

    pub fn mint(&self, address: &str) -> Result<IssuedSession, AuthError> {
        let iat = self.codec.now();
        let exp = TokenCodec::expiry(iat, self.ttl_seconds).map_err(|e| {
            error!(error = %e, "Session lifetime misconfigured");
            AuthError::Internal(e.to_string())
        })?;
        let claims = SessionClaims {
            sub: address.to_lowercase(),
            jti: generate_nonce(),
            iat,
            exp,
        };

        let token = self.codec.encode(&claims).map_err(|e| {
            error!(error = %e, "Failed to sign session token");
            AuthError::Internal(e.to_string())
        })?;

        info!(address = %claims.sub, exp = claims.exp, "Minted session");
        Ok(IssuedSession { token, claims })
    }

    /// Verifies a session token. Every failure collapses to `Unauthenticated`.
    pub fn verify(&self, token: &str) -> Result<SessionClaims, AuthError> {
        let claims = self.codec.decode::<SessionClaims>(token).map_err(|e| {
            debug!(error = %e, "Rejected session token");
            AuthError::Unauthenticated
        })?;

        if let Some(revoked) = &self.revoked {
            if revoked.contains(&claims.jti, self.codec.now()) {
                debug!(address = %claims.sub, "Rejected revoked session token");
                return Err(AuthError::Unauthenticated);
            }
        }

        Ok(claims)
    }

    pub fn who_am_i(&self, token: Option<&str>) -> MeResponse {
        let Some(token) = token.filter(|t| !t.is_empty()) else {
            return MeResponse::anonymous();
        };

        match self.verify(token) {
            Ok(claims) => MeResponse::authenticated(token.to_string(), claims),
            Err(_) => MeResponse::anonymous(),
        }
    }

    /// Remembers a still-valid session's `jti` as revoked until it would have expired.
    /// Returns `false` when the token was not a live session or revocation is disabled.
    pub fn revoke(&self, token: &str) -> bool {
        let Some(revoked) = &self.revoked else {
            return false;
        };
        let Ok(claims) = self.codec.decode::<SessionClaims>(token) else {
            return false;
        };

        let inserted = revoked.insert_if_absent(&claims.jti, claims.exp, self.codec.now());
        if inserted {
            info!(address = %claims.sub, "Revoked session");
        }
        inserted
    }

    pub fn attach(&self, token: String) -> Cookie<'static> {
        self.base_cookie(token)
            .max_age(Duration::seconds(i64::try_from(self.ttl_seconds).unwrap_or(i64::MAX)))
            .build()
    }

    pub fn clear(&self) -> Cookie<'static> {
        self.base_cookie(String::new()).max_age(Duration::ZERO).build()
    }

    fn base_cookie(&self, value: String) -> tower_cookies::cookie::CookieBuilder<'static> {
        Cookie::build((self.cookie.name.clone(), value))
            .http_only(true)
            .path("/")
            .same_site(SameSite::Lax)
            .secure(self.cookie.secure)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{config::Config, services::clock::MockClock};
    use chrono::{TimeZone, Utc};
    use std::sync::atomic::{AtomicI64, Ordering};

    fn service(now: Arc<AtomicI64>, revoke_on_logout: bool) -> SessionService {
        let mut clock = MockClock::new();
        clock
            .expect_now()
            .returning(move || Utc.timestamp_opt(now.load(Ordering::SeqCst), 0).unwrap());
        let codec = TokenCodec::new("session-secret", Arc::new(clock)).unwrap();
        SessionService::new(codec, 3600, Config::default().cookie, revoke_on_logout)
    }

    #[test]
    fn mint_lowercases_subject_and_sets_expiry() {
        let service = service(Arc::new(AtomicI64::new(1_000)), true);
        let issued = service.mint("0xABCDEF").unwrap();
        assert_eq!(issued.claims.sub, "0xabcdef");
        assert_eq!(issued.claims.iat, 1_000);
        assert_eq!(issued.claims.exp, 4_600);
        assert_eq!(service.verify(&issued.token).unwrap(), issued.claims);
    }

    #[test]
    fn expired_or_foreign_tokens_are_unauthenticated() {
        let now = Arc::new(AtomicI64::new(1_000));
        let service = service(now.clone(), true);
        let issued = service.mint("0xabc").unwrap();

        now.store(4_600, Ordering::SeqCst);
        assert!(matches!(service.verify(&issued.token), Err(AuthError::Unauthenticated)));
        assert!(matches!(service.verify("garbage"), Err(AuthError::Unauthenticated)));
    }

    #[test]
    fn who_am_i_reports_claims_or_anonymous() {
        let service = service(Arc::new(AtomicI64::new(1_000)), true);
        let issued = service.mint("0xabc").unwrap();

        assert!(!service.who_am_i(None).is_authenticated());
        assert!(!service.who_am_i(Some("")).is_authenticated());
        assert!(!service.who_am_i(Some("tampered")).is_authenticated());

        match service.who_am_i(Some(&issued.token)) {
            MeResponse::Authenticated { address, payload, .. } => {
                assert_eq!(address, "0xabc");
                assert_eq!(payload, issued.claims);
            }
            MeResponse::Anonymous { .. } => panic!("expected authenticated session"),
        }
    }

    #[test]
    fn revoked_tokens_stop_verifying() {
        let service = service(Arc::new(AtomicI64::new(1_000)), true);
        let issued = service.mint("0xabc").unwrap();

        assert!(service.revoke(&issued.token));
        assert!(!service.revoke(&issued.token));
        assert!(matches!(service.verify(&issued.token), Err(AuthError::Unauthenticated)));

        let other = service.mint("0xdef").unwrap();
        assert!(service.verify(&other.token).is_ok());
    }

    #[test]
    fn relogin_in_the_same_second_survives_earlier_logout() {
        let service = service(Arc::new(AtomicI64::new(1_000)), true);
        let first = service.mint("0xabc").unwrap();
        assert!(service.revoke(&first.token));

        let second = service.mint("0xabc").unwrap();
        assert_ne!(first.token, second.token);
        assert_ne!(first.claims.jti, second.claims.jti);
        assert!(service.verify(&second.token).is_ok());
        assert!(service.verify(&first.token).is_err());
    }

    #[test]
    fn mint_fails_cleanly_when_lifetime_overflows() {
        let mut clock = MockClock::new();
        clock
            .expect_now()
            .returning(|| Utc.timestamp_opt(1_000, 0).unwrap());
        let codec = TokenCodec::new("session-secret", Arc::new(clock)).unwrap();
        let service = SessionService::new(codec, i64::MAX as u64, Config::default().cookie, true);

        assert!(matches!(service.mint("0xabc"), Err(AuthError::Internal(_))));
    }

    #[test]
    fn revocation_can_be_disabled() {
        let service = service(Arc::new(AtomicI64::new(1_000)), false);
        let issued = service.mint("0xabc").unwrap();
        assert!(!service.revoke(&issued.token));
        assert!(service.verify(&issued.token).is_ok());
    }

    #[test]
    fn attach_sets_session_cookie_attributes() {
        let service = service(Arc::new(AtomicI64::new(1_000)), true);
        let header = service.attach("jwt-value".to_string()).to_string();

        assert!(header.starts_with("token=jwt-value"));
        assert!(header.contains("HttpOnly"));
        assert!(header.contains("Path=/"));
        assert!(header.contains("Max-Age=3600"));
        assert!(header.contains("SameSite=Lax"));
        assert!(header.contains("Secure"));
    }

    #[test]
    fn clear_expires_cookie_immediately() {
        let service = service(Arc::new(AtomicI64::new(1_000)), true);
        let header = service.clear().to_string();

        assert!(header.starts_with("token=;"));
        assert!(header.contains("Max-Age=0"));
        assert!(header.contains("HttpOnly"));
        assert!(header.contains("Path=/"));
    }
}
