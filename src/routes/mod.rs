use auth::auth_routes;
use axum::Router;

use crate::http_server::AppState;

pub mod auth;

pub fn api_routes() -> Router<AppState> {
    Router::new().merge(auth_routes())
}
