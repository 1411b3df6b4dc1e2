use clap::Parser;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use wallet_auth::{
    errors::{AppError, AppResult},
    http_server::{start_server, AppState},
    Config,
};

mod args;

use args::Args;

#[tokio::main]
async fn main() -> AppResult<()> {
    let args = Args::parse();

    // Load configuration from --config path (defaults to config/default.toml)
    let mut config = Config::load(&args.config).map_err(AppError::Config)?;

    // Apply CLI overrides
    if let Some(host) = args.host {
        config.server.host = host;
    }
    if let Some(port) = args.port {
        config.server.port = port;
    }
    if let Some(public_origin) = args.public_origin {
        config.server.public_origin = public_origin;
    }

    init_logging(&config.logging.level)?;

    info!("🚀 Starting wallet-auth v{}", env!("CARGO_PKG_VERSION"));
    info!("Configuration loaded from: {}", args.config);
    info!(
        "Nonce TTL: {}s, session TTL: {}s, single-use nonces: {}, revoke on logout: {}",
        config.auth.nonce_ttl_seconds,
        config.auth.session_ttl_seconds,
        config.auth.single_use_nonces,
        config.auth.revoke_on_logout
    );
    if !config.cookie.secure {
        tracing::warn!("Session cookie is not marked Secure; only use this over plain HTTP in development");
    }

    let server_address = config.get_server_address();
    let state = AppState::with_system_clock(config)?;

    info!("HTTP API available at: http://{}", server_address);
    start_server(state, &server_address).await?;

    info!("wallet-auth stopped");
    Ok(())
}

fn init_logging(level: &str) -> AppResult<()> {
    let log_level = match level.to_lowercase().as_str() {
        "error" => tracing::Level::ERROR,
        "warn" => tracing::Level::WARN,
        "info" => tracing::Level::INFO,
        "debug" => tracing::Level::DEBUG,
        "trace" => tracing::Level::TRACE,
        _ => {
            eprintln!("Invalid log level: {}, defaulting to info", level);
            tracing::Level::INFO
        }
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("wallet_auth={},tower_http={}", log_level, log_level).into()),
        )
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    Ok(())
}
