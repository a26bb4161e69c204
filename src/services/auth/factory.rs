/// Factory: build `TokenGate` from application `Config`.
use std::sync::Arc;

use crate::config::Config;
use crate::error::AppError;
use crate::services::auth::{IntrospectionClient, TokenCache, TokenGate, TtlPolicy};
use crate::services::cache::CacheClient;

pub fn build_token_gate(
    config: &Config,
    cache: Arc<dyn CacheClient>,
) -> Result<Arc<TokenGate>, AppError> {
    let introspection = IntrospectionClient::new(&config.introspection).map_err(|e| {
        tracing::error!(error = %e, "failed to build introspection HTTP client");
        AppError::Internal
    })?;

    let token_cache = TokenCache::new(
        cache,
        config.cache.key_prefix.clone(),
        config.introspection.key_mode,
    );

    let ttl = TtlPolicy {
        default_ttl: config.introspection.default_ttl,
        max_ttl: config.introspection.max_ttl,
    };

    Ok(Arc::new(TokenGate::new(token_cache, introspection, ttl)))
}
