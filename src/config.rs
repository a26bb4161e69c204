/*
 * Responsibility
 * - Load settings from the environment (.env first, via dotenvy)
 * - Validate values up front (missing / malformed -> startup fails)
 * - Expose typed choices for the persistence and cache backends
 */
use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;

use thiserror::Error;
use url::Url;

use crate::services::auth::gate::MAX_CACHE_TTL;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnv {
    Development,
    Production,
}

impl AppEnv {
    pub fn from_env() -> Self {
        Self::parse(&std::env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()))
    }

    fn parse(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "production" | "prod" => Self::Production,
            _ => Self::Development,
        }
    }

    pub fn is_production(&self) -> bool {
        matches!(self, Self::Production)
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("missing configuration: {0}")]
    Missing(&'static str),
    #[error("invalid configuration: {0}")]
    Invalid(&'static str),
}

/// Which `PatientRepo` implementation to build at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DatabaseProvider {
    Postgres,
    Sqlite,
    Memory,
}

impl FromStr for DatabaseProvider {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "postgres" | "postgresql" => Ok(Self::Postgres),
            "sqlite" => Ok(Self::Sqlite),
            "memory" => Ok(Self::Memory),
            _ => Err(ConfigError::Invalid("DATABASE_PROVIDER")),
        }
    }
}

/// Which `CacheClient` implementation backs the token cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheBackend {
    Valkey,
    Memory,
}

impl FromStr for CacheBackend {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "valkey" | "redis" => Ok(Self::Valkey),
            "memory" => Ok(Self::Memory),
            _ => Err(ConfigError::Invalid("CACHE_BACKEND")),
        }
    }
}

/// How bearer tokens are turned into cache keys.
///
/// `Raw` stores the credential itself as the key, which is what the legacy
/// deployment did. `Hashed` stores a SHA-256 digest instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKeyMode {
    Hashed,
    Raw,
}

impl FromStr for TokenKeyMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "hashed" | "sha256" => Ok(Self::Hashed),
            "raw" => Ok(Self::Raw),
            _ => Err(ConfigError::Invalid("TOKEN_CACHE_KEY_MODE")),
        }
    }
}

#[derive(Clone)]
pub struct DatabaseConfig {
    pub provider: DatabaseProvider,
    pub url: String,
    pub max_connections: u32,
}

#[derive(Clone)]
pub struct CacheConfig {
    pub backend: CacheBackend,
    pub url: String,
    pub key_prefix: String,
}

// Connection strings may carry credentials: print them with the password masked.
impl std::fmt::Debug for DatabaseConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DatabaseConfig")
            .field("provider", &self.provider)
            .field("url", &redact_url(&self.url))
            .field("max_connections", &self.max_connections)
            .finish()
    }
}

impl std::fmt::Debug for CacheConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CacheConfig")
            .field("backend", &self.backend)
            .field("url", &redact_url(&self.url))
            .field("key_prefix", &self.key_prefix)
            .finish()
    }
}

fn redact_url(raw: &str) -> String {
    if raw.is_empty() {
        return String::new();
    }
    match Url::parse(raw) {
        Ok(mut url) => {
            if url.password().is_some() && url.set_password(Some("***")).is_err() {
                return "<redacted>".to_string();
            }
            url.to_string()
        }
        Err(_) => "<redacted>".to_string(),
    }
}

#[derive(Clone)]
pub struct IntrospectionConfig {
    pub endpoint: Url,
    pub timeout: Duration,
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
    pub key_mode: TokenKeyMode,
    pub default_ttl: Duration,
    pub max_ttl: Duration,
}

impl std::fmt::Debug for IntrospectionConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // client_secret stays out of logs
        f.debug_struct("IntrospectionConfig")
            .field("endpoint", &self.endpoint.as_str())
            .field("timeout", &self.timeout)
            .field("client_id", &self.client_id)
            .field("key_mode", &self.key_mode)
            .field("default_ttl", &self.default_ttl)
            .field("max_ttl", &self.max_ttl)
            .finish()
    }
}

#[derive(Debug, Clone)]
pub struct AuditConfig {
    pub endpoint: Option<Url>,
    pub timeout: Duration,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub addr: SocketAddr,
    pub app_env: AppEnv,
    pub cors_allowed_origins: Vec<String>,
    pub request_timeout: Duration,
    pub body_limit_bytes: usize,

    pub database: DatabaseConfig,
    pub cache: CacheConfig,
    pub introspection: IntrospectionConfig,
    pub audit: AuditConfig,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let port: u16 = parse_or("PORT", 3000)?;
        let addr: SocketAddr = SocketAddr::from_str(&format!("0.0.0.0:{}", port))
            .map_err(|_| ConfigError::Invalid("PORT"))?;

        let app_env = AppEnv::from_env();

        let cors_allowed_origins = std::env::var("CORS_ALLOWED_ORIGINS")
            .unwrap_or_default()
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>();

        let request_timeout = Duration::from_secs(parse_or("HTTP_REQUEST_TIMEOUT_SECONDS", 30)?);
        let body_limit_bytes: usize = parse_or("HTTP_BODY_LIMIT_BYTES", 1024 * 1024)?;

        let provider = match optional("DATABASE_PROVIDER") {
            Some(raw) => raw.parse::<DatabaseProvider>()?,
            None => DatabaseProvider::Sqlite,
        };
        let database_url = match (provider, optional("DATABASE_URL")) {
            (_, Some(url)) => url,
            (DatabaseProvider::Sqlite, None) => "sqlite://patients.db?mode=rwc".to_string(),
            (DatabaseProvider::Memory, None) => String::new(),
            (DatabaseProvider::Postgres, None) => {
                return Err(ConfigError::Missing("DATABASE_URL"));
            }
        };
        let database = DatabaseConfig {
            provider,
            url: database_url,
            max_connections: parse_or("DATABASE_MAX_CONNECTIONS", 10)?,
        };

        let cache = CacheConfig {
            backend: match optional("CACHE_BACKEND") {
                Some(raw) => raw.parse::<CacheBackend>()?,
                None => CacheBackend::Valkey,
            },
            url: optional("CACHE_URL").unwrap_or_else(|| "redis://127.0.0.1:6379".to_string()),
            key_prefix: optional("CACHE_KEY_PREFIX").unwrap_or_else(|| "patient-api:".to_string()),
        };

        let endpoint = optional("INTROSPECTION_ENDPOINT")
            .ok_or(ConfigError::Missing("INTROSPECTION_ENDPOINT"))?;
        let introspection = IntrospectionConfig {
            endpoint: parse_http_url(&endpoint, "INTROSPECTION_ENDPOINT")?,
            timeout: Duration::from_secs(parse_or("INTROSPECTION_TIMEOUT_SECONDS", 10)?),
            client_id: optional("INTROSPECTION_CLIENT_ID"),
            client_secret: optional("INTROSPECTION_CLIENT_SECRET"),
            key_mode: match optional("TOKEN_CACHE_KEY_MODE") {
                Some(raw) => raw.parse::<TokenKeyMode>()?,
                None => TokenKeyMode::Hashed,
            },
            default_ttl: cache_ttl(
                "TOKEN_CACHE_DEFAULT_TTL_SECONDS",
                parse_or("TOKEN_CACHE_DEFAULT_TTL_SECONDS", 300)?,
            )?,
            max_ttl: cache_ttl(
                "TOKEN_CACHE_MAX_TTL_SECONDS",
                parse_or("TOKEN_CACHE_MAX_TTL_SECONDS", MAX_CACHE_TTL.as_secs())?,
            )?,
        };

        let audit = AuditConfig {
            endpoint: optional("AUDIT_ENDPOINT")
                .map(|raw| parse_http_url(&raw, "AUDIT_ENDPOINT"))
                .transpose()?,
            timeout: Duration::from_secs(parse_or("AUDIT_TIMEOUT_SECONDS", 5)?),
        };

        Ok(Self {
            addr,
            app_env,
            cors_allowed_origins,
            request_timeout,
            body_limit_bytes,
            database,
            cache,
            introspection,
            audit,
        })
    }
}

/// Non-empty, trimmed env value.
fn optional(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn parse_or<T: FromStr>(key: &'static str, default: T) -> Result<T, ConfigError> {
    match optional(key) {
        Some(raw) => raw.parse::<T>().map_err(|_| ConfigError::Invalid(key)),
        None => Ok(default),
    }
}

/// Token cache TTLs must lie in `1..=604800` seconds.
fn cache_ttl(key: &'static str, secs: u64) -> Result<Duration, ConfigError> {
    let ttl = Duration::from_secs(secs);
    if ttl.is_zero() || ttl > MAX_CACHE_TTL {
        return Err(ConfigError::Invalid(key));
    }
    Ok(ttl)
}

fn parse_http_url(raw: &str, key: &'static str) -> Result<Url, ConfigError> {
    let url = Url::parse(raw).map_err(|_| ConfigError::Invalid(key))?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        _ => Err(ConfigError::Invalid(key)),
    }
}
