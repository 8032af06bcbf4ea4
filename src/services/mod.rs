// Service exports
pub mod cache;
pub mod memory;
pub mod postgres;
pub mod store;

pub use cache::{CacheError, CacheKey, CacheLookup, CacheManager, MatchListCache};
pub use memory::MemoryStore;
pub use postgres::PostgresClient;
pub use store::{MatchStore, MessageStore, StoreError, UserStore};
