use axum::{
    http::{header, HeaderValue, Method},
    middleware,
    response::Json,
    routing::get,
    Router,
};
use serde::Serialize;
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_cookies::CookieManagerLayer;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{
    config::Config,
    errors::{AppError, AppResult},
    metrics::{metrics_handler, track_metrics, Metrics},
    routes::api_routes,
    services::{
        clock::{Clock, SystemClock},
        nonce_service::NonceService,
        session_service::SessionService,
        sign_in_service::SignInService,
        token_codec::{TokenCodec, TokenResult},
    },
};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub metrics: Arc<Metrics>,
    pub nonces: Arc<NonceService>,
    pub sessions: Arc<SessionService>,
    pub sign_in: Arc<SignInService>,
}

impl AppState {
    /// Wires every component from an explicit configuration and time source.
    pub fn new(config: Config, clock: Arc<dyn Clock>) -> TokenResult<Self> {
        let codec = TokenCodec::new(&config.auth.jwt_secret, clock)?;

        let nonces = NonceService::new(codec.clone(), config.auth.nonce_ttl_seconds);
        let sessions = SessionService::new(
            codec,
            config.auth.session_ttl_seconds,
            config.cookie.clone(),
            config.auth.revoke_on_logout,
        );
        let sign_in = SignInService::new(nonces.clone(), sessions.clone(), config.auth.single_use_nonces);

        Ok(Self {
            config: Arc::new(config),
            metrics: Arc::new(Metrics::new()),
            nonces: Arc::new(nonces),
            sessions: Arc::new(sessions),
            sign_in: Arc::new(sign_in),
        })
    }

    pub fn with_system_clock(config: Config) -> TokenResult<Self> {
        Self::new(config, Arc::new(SystemClock))
    }
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub healthy: bool,
    pub service: String,
    pub version: String,
    pub timestamp: String,
}

/// Create the HTTP server router
pub fn create_router(state: AppState) -> Router {
    let cors = cors_layer(&state.config);

    let router = Router::new()
        .route("/health", get(health_check))
        .route("/metrics", get(metrics_handler))
        .merge(api_routes())
        .route_layer(middleware::from_fn(track_metrics))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CookieManagerLayer::new()),
        );

    let router = match cors {
        Some(cors) => router.layer(cors),
        None => router,
    };

    router.with_state(state)
}

fn cors_layer(config: &Config) -> Option<CorsLayer> {
    let origins: Vec<HeaderValue> = config
        .server
        .cors_origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    if origins.is_empty() {
        return None;
    }

    Some(
        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods([Method::GET, Method::POST])
            .allow_headers([header::CONTENT_TYPE])
            .allow_credentials(true),
    )
}

async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        healthy: true,
        service: "wallet-auth".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: chrono::Utc::now().to_rfc3339(),
    })
}

pub async fn start_server(state: AppState, bind_address: &str) -> AppResult<()> {
    let app = create_router(state);

    tracing::info!("Starting HTTP server on {}", bind_address);

    let listener = tokio::net::TcpListener::bind(bind_address).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(AppError::Io)?;

    tracing::info!("HTTP server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl-C: {}", e);
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => tracing::error!("Failed to listen for SIGTERM: {}", e),
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}
