use std::env;
use std::path::PathBuf;
use std::str::FromStr;

use folio_core::auth::AuthConfig;
use folio_core::media::DEFAULT_MAX_FILE_BYTES;
use thiserror::Error;
use uuid::Uuid;

/// Extra room on top of the upload limit for multipart framing and text fields.
const MULTIPART_OVERHEAD: usize = 64 * 1024;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("{var} has an invalid value: {value:?}")]
    Invalid { var: &'static str, value: String },
}

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Server host to bind to.
    pub host: String,
    /// Server port to bind to.
    pub port: u16,
    /// PostgreSQL connection URL.
    pub database_url: String,
    /// Maximum database connections in the pool.
    pub db_max_connections: u32,
    /// Minimum database connections in the pool.
    pub db_min_connections: u32,
    /// JWT signing secret.
    pub jwt_secret: String,
    /// Lifetime of an operator session, in seconds.
    pub session_ttl_secs: i64,
    /// Operator account. Sign-in is disabled unless both are set.
    pub admin_email: Option<String>,
    pub admin_password_hash: Option<String>,
    /// Directory uploaded media is written to and served from.
    pub media_dir: PathBuf,
    /// Public URL prefix under which `media_dir` is reachable.
    pub media_public_url: String,
    /// Largest accepted media file, in bytes.
    pub max_upload_bytes: usize,
    /// Event bus channel capacity.
    pub event_bus_capacity: usize,
    /// Insert the default sections into an empty database on startup.
    pub seed_default_sections: bool,
    /// Log level (e.g., "info", "debug", "trace").
    pub log_level: String,
}

impl AppConfig {
    /// Load configuration from environment variables with sensible defaults.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let var = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());

        let admin_email = var("ADMIN_EMAIL");
        let admin_password_hash = var("ADMIN_PASSWORD_HASH");
        let jwt_secret = match var("JWT_SECRET") {
            Some(secret) => secret,
            None if admin_email.is_some() || admin_password_hash.is_some() => {
                return Err(ConfigError::Missing("JWT_SECRET"));
            }
            // No operator account: nothing can sign in, and no token survives a restart.
            None => format!("{}{}", Uuid::new_v4().simple(), Uuid::new_v4().simple()),
        };

        Ok(Self {
            host: var("HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
            port: parse_or(&var, "PORT", 3030)?,
            database_url: var("DATABASE_URL").ok_or(ConfigError::Missing("DATABASE_URL"))?,
            db_max_connections: parse_or(&var, "DB_MAX_CONNECTIONS", 20)?,
            db_min_connections: parse_or(&var, "DB_MIN_CONNECTIONS", 5)?,
            jwt_secret,
            session_ttl_secs: parse_or(&var, "SESSION_TTL_SECS", 86_400)?,
            admin_email,
            admin_password_hash,
            media_dir: var("MEDIA_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("./media")),
            media_public_url: var("MEDIA_PUBLIC_URL")
                .unwrap_or_else(|| "http://localhost:3030/media".to_string()),
            max_upload_bytes: parse_or(&var, "MAX_UPLOAD_BYTES", DEFAULT_MAX_FILE_BYTES)?,
            event_bus_capacity: parse_or(&var, "EVENT_BUS_CAPACITY", 1024)?,
            seed_default_sections: parse_or(&var, "SEED_DEFAULT_SECTIONS", true)?,
            log_level: var("LOG_LEVEL").unwrap_or_else(|| "info".to_string()),
        })
    }

    /// Build the socket address string.
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn auth(&self) -> AuthConfig {
        AuthConfig {
            admin_email: self.admin_email.clone(),
            admin_password_hash: self.admin_password_hash.clone(),
            jwt_secret: self.jwt_secret.clone(),
            session_ttl: chrono::Duration::seconds(self.session_ttl_secs),
        }
    }

    /// Request body limit: one upload plus its multipart framing.
    pub fn body_limit(&self) -> usize {
        self.max_upload_bytes.saturating_add(MULTIPART_OVERHEAD)
    }
}

fn parse_or<T: FromStr>(
    var: impl Fn(&str) -> Option<String>,
    name: &'static str,
    default: T,
) -> Result<T, ConfigError> {
    match var(name) {
        None => Ok(default),
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { var: name, value }),
    }
}
