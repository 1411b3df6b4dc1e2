use crate::{
    handlers::auth::{handle_logout, handle_me, handle_nonce, handle_verify},
    http_server::AppState,
};
use axum::{
    routing::{get, post},
    Router,
};

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/nonce", get(handle_nonce))
        .route("/verify", post(handle_verify))
        .route("/me", get(handle_me))
        .route("/logout", post(handle_logout))
}
