pub mod client;
pub mod factory;
pub mod memory;
pub mod valkey;

pub use client::{CacheClient, CacheError};
pub use factory::build_cache_client;
pub use memory::MemoryCache;
pub use valkey::ValkeyClient;
