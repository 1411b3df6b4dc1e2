use serde::{Deserialize, Serialize};

/// Environment variables honoured on top of the file and `WALLET_AUTH__*` sources.
pub const SECRET_ENV: &str = "JWT_SECRET";
pub const NONCE_TTL_ENV: &str = "NONCE_TOKEN_TTL_SECONDS";
pub const SESSION_TTL_ENV: &str = "AUTH_JWT_EXPIRES_IN_SECONDS";

/// Upper bound for either token lifetime (one year).
pub const MAX_TTL_SECONDS: u64 = 365 * 24 * 60 * 60;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub auth: AuthConfig,
    pub cookie: CookieConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Origin used in the sign-in message when the request carries no `Origin` header.
    pub public_origin: String,
    /// Cross-origin callers allowed to send credentials. Empty disables CORS.
    #[serde(default)]
    pub cors_origins: Vec<String>,
}

#[derive(Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    pub jwt_secret: String,
    pub nonce_ttl_seconds: u64,
    pub session_ttl_seconds: u64,
    pub single_use_nonces: bool,
    pub revoke_on_logout: bool,
}

impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthConfig")
            .field("jwt_secret", &"[REDACTED]")
            .field("nonce_ttl_seconds", &self.nonce_ttl_seconds)
            .field("session_ttl_seconds", &self.session_ttl_seconds)
            .field("single_use_nonces", &self.single_use_nonces)
            .field("revoke_on_logout", &self.revoke_on_logout)
            .finish()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CookieConfig {
    pub name: String,
    pub secure: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
}

impl Config {
    pub fn load(config_path: &str) -> Result<Self, config::ConfigError> {
        let defaults = config::Config::try_from(&Config::default())?;

        let settings = config::Config::builder()
            .add_source(defaults)
            .add_source(config::File::new(config_path, config::FileFormat::Toml).required(false))
            .add_source(config::Environment::with_prefix("WALLET_AUTH").separator("__").try_parsing(true))
            .set_override_option("auth.jwt_secret", std::env::var(SECRET_ENV).ok())?
            .set_override_option("auth.nonce_ttl_seconds", read_seconds_env(NONCE_TTL_ENV)?)?
            .set_override_option("auth.session_ttl_seconds", read_seconds_env(SESSION_TTL_ENV)?)?
            .build()?;

        let config: Config = settings.try_deserialize()?;
        config.validate()?;

        Ok(config)
    }

    pub fn validate(&self) -> Result<(), config::ConfigError> {
        if self.auth.jwt_secret.trim().is_empty() {
            return Err(config::ConfigError::Message(format!(
                "auth.jwt_secret is required (set {} or WALLET_AUTH__AUTH__JWT_SECRET)",
                SECRET_ENV
            )));
        }
        for (key, ttl) in [
            ("auth.nonce_ttl_seconds", self.auth.nonce_ttl_seconds),
            ("auth.session_ttl_seconds", self.auth.session_ttl_seconds),
        ] {
            if ttl == 0 || ttl > MAX_TTL_SECONDS {
                return Err(config::ConfigError::Message(format!(
                    "{} must be between 1 and {} seconds, got {}",
                    key, MAX_TTL_SECONDS, ttl
                )));
            }
        }

        Ok(())
    }

    pub fn get_server_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }

    #[cfg(test)]
    pub fn for_tests() -> Self {
        let mut config = Config::default();
        config.auth.jwt_secret = "test-secret-do-not-use".to_string();
        config.server.public_origin = "http://localhost:3000".to_string();
        config
    }
}

fn read_seconds_env(name: &str) -> Result<Option<u64>, config::ConfigError> {
    match std::env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse::<u64>()
            .map(Some)
            .map_err(|e| config::ConfigError::Message(format!("{} must be a number of seconds: {}", name, e))),
        Err(_) => Ok(None),
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 3000,
                public_origin: "http://127.0.0.1:3000".to_string(),
                cors_origins: Vec::new(),
            },
            auth: AuthConfig {
                jwt_secret: String::new(),
                nonce_ttl_seconds: 120,
                session_ttl_seconds: 3600,
                single_use_nonces: true,
                revoke_on_logout: true,
            },
            cookie: CookieConfig {
                name: "token".to_string(),
                secure: true,
            },
            logging: LoggingConfig {
                level: "info".to_string(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::{path::PathBuf, sync::Mutex};

    // Environment variables are process-wide; tests touching them run one at a time.
    static ENV_LOCK: Mutex<()> = Mutex::new(());

    const OVERRIDE_VARS: [&str; 3] = [SECRET_ENV, NONCE_TTL_ENV, SESSION_TTL_ENV];

    fn clear_overrides() {
        for name in OVERRIDE_VARS {
            std::env::remove_var(name);
        }
    }

    fn write_config(name: &str, contents: &str) -> PathBuf {
        let path = std::env::temp_dir().join(format!("wallet-auth-{}-{}.toml", std::process::id(), name));
        std::fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn defaults_match_documented_ttls() {
        let config = Config::default();
        assert_eq!(config.auth.nonce_ttl_seconds, 120);
        assert_eq!(config.auth.session_ttl_seconds, 3600);
        assert_eq!(config.cookie.name, "token");
        assert!(config.cookie.secure);
    }

    #[test]
    fn validate_rejects_missing_secret() {
        let config = Config::default();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("jwt_secret"));
    }

    #[test]
    fn validate_rejects_zero_ttl() {
        let mut config = Config::for_tests();
        config.auth.nonce_ttl_seconds = 0;
        assert!(config.validate().is_err());

        let mut config = Config::for_tests();
        config.auth.session_ttl_seconds = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_ttl_beyond_ceiling() {
        let mut config = Config::for_tests();
        config.auth.session_ttl_seconds = i64::MAX as u64;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("auth.session_ttl_seconds"));

        let mut config = Config::for_tests();
        config.auth.nonce_ttl_seconds = MAX_TTL_SECONDS + 1;
        assert!(config.validate().is_err());

        let mut config = Config::for_tests();
        config.auth.session_ttl_seconds = MAX_TTL_SECONDS;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn load_layers_file_under_env_overrides() {
        let _guard = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        clear_overrides();
        let path = write_config(
            "layered",
            r#"
[server]
port = 4000
public_origin = "https://file.example"

[auth]
jwt_secret = "from-file"
nonce_ttl_seconds = 60
"#,
        );

        std::env::set_var(SECRET_ENV, "from-env");
        std::env::set_var(SESSION_TTL_ENV, "900");
        let loaded = Config::load(path.to_str().unwrap());
        clear_overrides();
        std::fs::remove_file(&path).ok();

        let config = loaded.unwrap();
        assert_eq!(config.server.port, 4000);
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.public_origin, "https://file.example");
        assert_eq!(config.auth.jwt_secret, "from-env");
        assert_eq!(config.auth.nonce_ttl_seconds, 60);
        assert_eq!(config.auth.session_ttl_seconds, 900);
        assert!(config.auth.single_use_nonces);
    }

    #[test]
    fn load_rejects_non_numeric_ttl_env() {
        let _guard = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        clear_overrides();

        std::env::set_var(SECRET_ENV, "from-env");
        std::env::set_var(NONCE_TTL_ENV, "abc");
        let loaded = Config::load("does-not-exist.toml");
        clear_overrides();

        let err = loaded.unwrap_err();
        assert!(err.to_string().contains(NONCE_TTL_ENV));
    }

    #[test]
    fn load_requires_secret() {
        let _guard = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        clear_overrides();

        let err = Config::load("does-not-exist.toml").unwrap_err();
        assert!(err.to_string().contains("jwt_secret"));
    }

    #[test]
    fn debug_output_redacts_secret() {
        let config = Config::for_tests();
        let rendered = format!("{:?}", config);
        assert!(!rendered.contains("test-secret-do-not-use"));
        assert!(rendered.contains("[REDACTED]"));
    }

    #[test]
    fn server_address_joins_host_and_port() {
        assert_eq!(Config::default().get_server_address(), "127.0.0.1:3000");
    }
}
