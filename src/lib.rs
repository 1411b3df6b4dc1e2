//! # Wallet Auth
//!
//! Sign-in with an Ethereum-style wallet. The server hands out signed,
//! short-lived nonce challenges, recovers the signer of the EIP-191 personal
//! message built from a challenge, and on success issues a session token that
//! travels in an HttpOnly cookie.

pub mod config;
pub mod errors;
pub mod handlers;
pub mod http_server;
pub mod metrics;
pub mod models;
pub mod routes;
pub mod services;
pub mod utils;

// Re-export commonly used types
pub use config::Config;
pub use http_server::{create_router, start_server, AppState};
pub use services::{
    nonce_service::NonceService, session_service::SessionService, sign_in_service::SignInService,
    signature_service::SignatureService,
};

// Re-export errors
pub use errors::{AppError, AuthError};
pub use services::token_codec::TokenError;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }

    #[test]
    fn test_name() {
        assert_eq!(NAME, "wallet-auth");
    }
}
