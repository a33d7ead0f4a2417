pub mod cache;
pub mod memory;
pub mod postgres;
pub mod redis;

mod macros;

pub use cache::{CacheKey, CacheStore, RecommendationCache, CACHE_TTL};
pub use memory::{CacheEntry, InMemoryCache, InMemoryHistory};
pub use postgres::{create_pool, PgHistoryStore};
pub use self::redis::{create_redis_client, CacheWriterHandle, RedisCache};
