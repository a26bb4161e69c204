/// Factory: build the configured `CacheClient`.
use std::sync::Arc;

use crate::config::{CacheBackend, CacheConfig};
use crate::services::cache::{CacheClient, CacheError, MemoryCache, ValkeyClient};

pub async fn build_cache_client(config: &CacheConfig) -> Result<Arc<dyn CacheClient>, CacheError> {
    let client: Arc<dyn CacheClient> = match config.backend {
        CacheBackend::Valkey => Arc::new(ValkeyClient::new(&config.url).await?),
        CacheBackend::Memory => Arc::new(MemoryCache::new()),
    };

    tracing::info!(backend = client.backend_name(), "cache client ready");
    Ok(client)
}
