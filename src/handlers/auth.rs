use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Query, State,
    },
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Json, Response},
};
use tower_cookies::Cookies;
use tracing::{debug, info};

use crate::{
    errors::AuthError,
    http_server::AppState,
    metrics::{record_sign_in, AUTH_NONCES_ISSUED_TOTAL, AUTH_SESSIONS_REVOKED_TOTAL},
    models::auth::{LogoutResponse, MeResponse, NonceQuery, NonceResponse, VerifyRequest, VerifyResponse},
    services::sign_in_service::{CompletedSignIn, SignInAttempt},
    utils::request_origin::request_origin,
};

impl IntoResponse for MeResponse {
    fn into_response(self) -> Response {
        let status = if self.is_authenticated() {
            StatusCode::OK
        } else {
            StatusCode::UNAUTHORIZED
        };
        (status, Json(self)).into_response()
    }
}

pub async fn handle_nonce(
    State(state): State<AppState>,
    headers: HeaderMap,
    query: Result<Query<NonceQuery>, QueryRejection>,
) -> Result<Json<NonceResponse>, AuthError> {
    let Query(query) = query.map_err(|rejection| {
        debug!(error = %rejection.body_text(), "Rejected nonce query");
        AuthError::BadRequest("invalid query string".to_string())
    })?;
    let origin = request_origin(&headers, &state.config.server.public_origin);
    let issued = state.nonces.issue(query.address.as_deref(), &origin)?;
    AUTH_NONCES_ISSUED_TOTAL.inc();

    Ok(Json(NonceResponse {
        nonce_token: issued.nonce_token,
        message: issued.message,
    }))
}

pub async fn handle_verify(
    State(state): State<AppState>,
    headers: HeaderMap,
    cookies: Cookies,
    body: Result<Json<VerifyRequest>, JsonRejection>,
) -> Result<Json<VerifyResponse>, AuthError> {
    match complete_sign_in(&state, &headers, body) {
        Ok(done) => {
            record_sign_in("success");
            cookies.add(state.sessions.attach(done.session.token.clone()));

            Ok(Json(VerifyResponse {
                ok: true,
                token: done.session.token,
                payload: done.session.claims,
                address: done.address,
            }))
        }
        Err(e) => {
            record_sign_in(e.kind());
            info!(reason = e.kind(), "Sign-in rejected");
            Err(e)
        }
    }
}

fn complete_sign_in(
    state: &AppState,
    headers: &HeaderMap,
    body: Result<Json<VerifyRequest>, JsonRejection>,
) -> Result<CompletedSignIn, AuthError> {
    let Json(body) = body.map_err(|rejection| {
        debug!(error = %rejection.body_text(), "Rejected verify body");
        AuthError::BadRequest("address, signature and nonceToken required".to_string())
    })?;
    let attempt = SignInAttempt::try_from(body)?;
    let origin = request_origin(headers, &state.config.server.public_origin);

    state.sign_in.complete_sign_in(attempt, &origin)
}

pub async fn handle_me(State(state): State<AppState>, cookies: Cookies) -> MeResponse {
    let token = cookies
        .get(state.sessions.cookie_name())
        .map(|cookie| cookie.value().to_string());

    state.sessions.who_am_i(token.as_deref())
}

pub async fn handle_logout(State(state): State<AppState>, cookies: Cookies) -> Json<LogoutResponse> {
    if let Some(cookie) = cookies.get(state.sessions.cookie_name()) {
        if state.sessions.revoke(cookie.value()) {
            AUTH_SESSIONS_REVOKED_TOTAL.inc();
        }
    }

    cookies.add(state.sessions.clear());
    info!("Session cookie cleared");

    Json(LogoutResponse { ok: true })
}
