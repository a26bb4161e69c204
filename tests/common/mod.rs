//! Shared fixtures for integration tests.
#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use patient_api::config::{
    AppEnv, AuditConfig, CacheBackend, CacheConfig, Config, DatabaseConfig, DatabaseProvider,
    IntrospectionConfig, TokenKeyMode,
};
use patient_api::services::auth::{IntrospectionClient, TokenCache, TokenGate, TtlPolicy};
use patient_api::services::cache::client::CacheResult;
use patient_api::services::cache::{CacheClient, CacheError, MemoryCache};
use serde_json::{Value, json};
use url::Url;
use wiremock::matchers::{body_string_contains, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const INTROSPECT_PATH: &str = "/connect/introspect";
pub const AUDIT_PATH: &str = "/audit";
pub const KEY_PREFIX: &str = "test:";

pub fn introspection_config(server: &MockServer) -> IntrospectionConfig {
    IntrospectionConfig {
        endpoint: Url::parse(&format!("{}{}", server.uri(), INTROSPECT_PATH)).unwrap(),
        timeout: Duration::from_secs(2),
        client_id: None,
        client_secret: None,
        key_mode: TokenKeyMode::Hashed,
        default_ttl: Duration::from_secs(300),
        max_ttl: Duration::from_secs(7 * 24 * 3600),
    }
}

pub fn test_config(introspection: IntrospectionConfig, audit_endpoint: Option<Url>) -> Config {
    Config {
        addr: SocketAddr::from(([127, 0, 0, 1], 0)),
        app_env: AppEnv::Development,
        cors_allowed_origins: Vec::new(),
        request_timeout: Duration::from_secs(5),
        body_limit_bytes: 64 * 1024,
        database: DatabaseConfig {
            provider: DatabaseProvider::Memory,
            url: String::new(),
            max_connections: 1,
        },
        cache: CacheConfig {
            backend: CacheBackend::Memory,
            url: String::new(),
            key_prefix: KEY_PREFIX.to_string(),
        },
        introspection,
        audit: AuditConfig {
            endpoint: audit_endpoint,
            timeout: Duration::from_secs(2),
        },
    }
}

pub fn gate_with(config: &IntrospectionConfig, cache: Arc<dyn CacheClient>) -> TokenGate {
    let introspection = IntrospectionClient::new(config).unwrap();
    let token_cache = TokenCache::new(cache, KEY_PREFIX, config.key_mode);
    let ttl = TtlPolicy {
        default_ttl: config.default_ttl,
        max_ttl: config.max_ttl,
    };
    TokenGate::new(token_cache, introspection, ttl)
}

pub fn memory_cache() -> Arc<dyn CacheClient> {
    Arc::new(MemoryCache::new())
}

pub fn active(username: &str, roles: &[&str]) -> Value {
    json!({
        "active": true,
        "username": username,
        "roles": roles,
    })
}

/// Introspection answer for one specific token.
pub fn introspection_mock(token: &str, body: Value) -> Mock {
    Mock::given(method("POST"))
        .and(path(INTROSPECT_PATH))
        .and(body_string_contains(format!("token={token}")))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
}

/// Cache wrapper that records every TTL handed to `set_with_ttl`.
#[derive(Default)]
pub struct RecordingCache {
    inner: MemoryCache,
    pub ttls: Mutex<Vec<Duration>>,
}

#[async_trait]
impl CacheClient for RecordingCache {
    fn backend_name(&self) -> &'static str {
        "recording"
    }

    async fn get_string(&self, key: &str) -> CacheResult<Option<String>> {
        self.inner.get_string(key).await
    }

    async fn set_with_ttl(&self, key: &str, value: &str, ttl: Duration) -> CacheResult<()> {
        self.ttls.lock().unwrap().push(ttl);
        self.inner.set_with_ttl(key, value, ttl).await
    }

    async fn del(&self, key: &str) -> CacheResult<u64> {
        self.inner.del(key).await
    }
}

/// Backend that is always down.
pub struct BrokenCache;

#[async_trait]
impl CacheClient for BrokenCache {
    fn backend_name(&self) -> &'static str {
        "broken"
    }

    async fn get_string(&self, _key: &str) -> CacheResult<Option<String>> {
        Err(CacheError::BackendConnection("connection refused".into()))
    }

    async fn set_with_ttl(&self, _key: &str, _value: &str, _ttl: Duration) -> CacheResult<()> {
        Err(CacheError::BackendConnection("connection refused".into()))
    }

    async fn del(&self, _key: &str) -> CacheResult<u64> {
        Err(CacheError::BackendConnection("connection refused".into()))
    }
}
