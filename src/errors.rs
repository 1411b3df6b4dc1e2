use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::services::token_codec::TokenError;

/// Failures of the sign-in protocol, one per rejection the client can observe.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("{0}")]
    BadRequest(String),
    #[error("invalid or expired nonce token")]
    InvalidOrExpiredNonce,
    #[error("nonce token bound to a different address")]
    AddressBindingMismatch,
    #[error("invalid signature format")]
    MalformedSignature,
    #[error("signature verification failed")]
    SignatureVerificationFailed,
    #[error("not authenticated")]
    Unauthenticated,
    #[error("internal error: {0}")]
    Internal(String),
}

impl AuthError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AuthError::BadRequest(_)
            | AuthError::InvalidOrExpiredNonce
            | AuthError::AddressBindingMismatch
            | AuthError::MalformedSignature => StatusCode::BAD_REQUEST,
            AuthError::SignatureVerificationFailed | AuthError::Unauthenticated => StatusCode::UNAUTHORIZED,
            AuthError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Stable label for logs and metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            AuthError::BadRequest(_) => "bad_request",
            AuthError::InvalidOrExpiredNonce => "invalid_or_expired_nonce",
            AuthError::AddressBindingMismatch => "address_binding_mismatch",
            AuthError::MalformedSignature => "malformed_signature",
            AuthError::SignatureVerificationFailed => "signature_verification_failed",
            AuthError::Unauthenticated => "unauthenticated",
            AuthError::Internal(_) => "internal_error",
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let error = match &self {
            AuthError::Internal(detail) => {
                tracing::error!(error = %detail, "Internal server error");
                "server error".to_string()
            }
            other => other.to_string(),
        };

        (status, Json(ErrorResponse { error })).into_response()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Token error: {0}")]
    Token(#[from] TokenError),
    #[error("Auth error: {0}")]
    Auth(#[from] AuthError),
    #[error("Server error: {0}")]
    Server(String),
}

pub type AppResult<T> = Result<T, AppError>;

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match self {
            AppError::Auth(err) => err.into_response(),
            other => AuthError::Internal(other.to_string()).into_response(),
        }
    }
}
