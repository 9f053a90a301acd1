use rocket::figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use std::fmt;

pub const DEFAULT_API_BASE_PATH: &str = "/api";

/// Seven days.
pub const DEFAULT_SESSION_TTL_SECONDS: i64 = 7 * 24 * 60 * 60;

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct Config {
    pub database: DatabaseConfig,
    pub server: ServerConfig,
    pub logging: LoggingConfig,
    pub session: SessionConfig,
    pub admin: AdminConfig,
    pub rate_limit: RateLimitConfig,
    pub cors: CorsConfig,
    pub api: ApiConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
    pub acquire_timeout: u64,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ServerConfig {
    pub port: u16,
    pub address: String,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct LoggingConfig {
    pub level: String,
    pub json_format: bool,
}

#[derive(Deserialize, Serialize, Clone)]
pub struct SessionConfig {
    /// HMAC key for session tokens. Provisioned out-of-band, never logged.
    pub secret: String,
    pub ttl_seconds: i64,
    /// How often the in-process task deletes expired sessions. Zero disables it.
    pub sweep_interval_seconds: u64,
}

#[derive(Deserialize, Serialize, Clone, Default)]
pub struct AdminConfig {
    /// Argon2 PHC string for the single admin password.
    pub password_hash: String,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct RateLimitConfig {
    pub login_limit: u32,
    pub window_seconds: u64,
    pub cleanup_interval_seconds: u64,
    pub require_client_ip: bool,
    /// Header carrying the client address set by a trusted reverse proxy, e.g. `CF-Connecting-IP`.
    /// When unset the peer address is used and forwarding headers are ignored.
    pub trusted_ip_header: Option<String>,
}

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct CorsConfig {
    pub allowed_origins: Vec<String>,
    pub allow_credentials: bool,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ApiConfig {
    pub base_path: String,
    pub enable_swagger: bool,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "postgres://localhost/sitenav".to_string(),
            max_connections: 8,
            min_connections: 1,
            acquire_timeout: 5,
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 8000,
            address: "127.0.0.1".to_string(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json_format: false,
        }
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            secret: String::new(),
            ttl_seconds: DEFAULT_SESSION_TTL_SECONDS,
            sweep_interval_seconds: 3600,
        }
    }
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            login_limit: 5,
            window_seconds: 60,
            cleanup_interval_seconds: 300,
            require_client_ip: false,
            trusted_ip_header: None,
        }
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_path: DEFAULT_API_BASE_PATH.to_string(),
            enable_swagger: true,
        }
    }
}

impl fmt::Debug for SessionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionConfig")
            .field("secret", &"<redacted>")
            .field("ttl_seconds", &self.ttl_seconds)
            .field("sweep_interval_seconds", &self.sweep_interval_seconds)
            .finish()
    }
}

impl fmt::Debug for AdminConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AdminConfig").field("password_hash", &"<redacted>").finish()
    }
}

impl Config {
    /// Load configuration from multiple sources in priority order:
    /// 1. Built-in defaults
    /// 2. Sitenav.toml (base configuration file)
    /// 3. Environment variables prefixed with SITENAV_, nested on `__`
    ///    (e.g. SITENAV_SESSION__TTL_SECONDS)
    /// 4. DATABASE_URL, SESSION_SECRET and ADMIN_PASSWORD_HASH as set by the hosting platform
    pub fn load() -> Result<Self, figment::Error> {
        Self::figment().extract()
    }

    fn figment() -> Figment {
        Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Toml::file("Sitenav.toml").nested())
            .merge(Env::prefixed("SITENAV_").split("__"))
            .merge(Env::raw().only(&["DATABASE_URL"]).map(|_| "database.url".into()))
            .merge(Env::raw().only(&["SESSION_SECRET"]).map(|_| "session.secret".into()))
            .merge(Env::raw().only(&["ADMIN_PASSWORD_HASH"]).map(|_| "admin.password_hash".into()))
    }
}
