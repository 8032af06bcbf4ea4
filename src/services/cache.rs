use async_trait::async_trait;
use redis::aio::ConnectionManager;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::Mutex;

use crate::models::{MatchResponse, UserId};

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("Redis error: {0}")]
    RedisError(#[from] redis::RedisError),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}

/// Result of a match-list lookup
#[derive(Debug, Clone, PartialEq)]
pub enum CacheLookup {
    Hit(Vec<MatchResponse>),
    /// Nothing cached. `generation` must be handed back to
    /// [`MatchListCache::store_matches`] so a list computed before a
    /// concurrent invalidation is never written.
    Miss { generation: u64 },
}

/// Cache of each user's mutual match list
///
/// Every user has a generation counter. Invalidation bumps it, and a store
/// only succeeds while the counter still equals the generation returned by
/// the lookup that preceded the store.
#[async_trait]
pub trait MatchListCache: Send + Sync {
    async fn lookup(&self, user: UserId) -> Result<CacheLookup, CacheError>;

    /// Returns `false` when the list was dropped because the user's
    /// generation moved on
    async fn store_matches(
        &self,
        user: UserId,
        generation: u64,
        matches: &[MatchResponse],
    ) -> Result<bool, CacheError>;

    async fn invalidate_matches(&self, users: &[UserId]) -> Result<(), CacheError>;
}

// KEYS[1] list, KEYS[2] generation; ARGV[1] expected generation, ARGV[2] ttl, ARGV[3] payload
const STORE_IF_CURRENT: &str = r#"
local current = tonumber(redis.call('GET', KEYS[2]) or '0')
if current ~= tonumber(ARGV[1]) then
    return 0
end
redis.call('SETEX', KEYS[1], ARGV[2], ARGV[3])
return 1
"#;

/// Two-tier match-list cache
///
/// L2 is Redis and shared across instances; it holds the lists and the
/// generation counters. L1 is an in-process moka cache keyed by
/// `(user, generation)`, so an entry stops being served as soon as any
/// instance bumps the generation. Each lookup costs one Redis round trip
/// (`MGET` of counter and list); L1 saves the decode.
pub struct CacheManager {
    redis: Arc<Mutex<ConnectionManager>>,
    local: moka::future::Cache<(UserId, u64), Arc<Vec<MatchResponse>>>,
    store_script: redis::Script,
    ttl_secs: u64,
}

impl CacheManager {
    pub async fn new(redis_url: &str, l1_size: u64, ttl_secs: u64) -> Result<Self, CacheError> {
        let client = redis::Client::open(redis_url)?;
        let redis = ConnectionManager::new(client).await?;

        let local = moka::future::CacheBuilder::new(l1_size)
            .time_to_live(Duration::from_secs(ttl_secs))
            .build();

        Ok(Self {
            redis: Arc::new(Mutex::new(redis)),
            local,
            store_script: redis::Script::new(STORE_IF_CURRENT),
            ttl_secs,
        })
    }
}

#[async_trait]
impl MatchListCache for CacheManager {
    async fn lookup(&self, user: UserId) -> Result<CacheLookup, CacheError> {
        let (generation, payload): (Option<u64>, Option<String>) = {
            let mut conn = self.redis.lock().await;
            redis::cmd("MGET")
                .arg(CacheKey::generation(user))
                .arg(CacheKey::matches(user))
                .query_async(&mut *conn)
                .await?
        };
        let generation = generation.unwrap_or(0);

        if let Some(hit) = self.local.get(&(user, generation)).await {
            tracing::trace!("L1 match cache hit for user {} (generation {})", user, generation);
            return Ok(CacheLookup::Hit(hit.as_ref().clone()));
        }

        let Some(payload) = payload else {
            tracing::trace!("Match cache miss for user {} (generation {})", user, generation);
            return Ok(CacheLookup::Miss { generation });
        };

        let matches: Vec<MatchResponse> = serde_json::from_str(&payload)?;
        self.local
            .insert((user, generation), Arc::new(matches.clone()))
            .await;
        tracing::trace!("L2 match cache hit for user {}", user);
        Ok(CacheLookup::Hit(matches))
    }

    async fn store_matches(
        &self,
        user: UserId,
        generation: u64,
        matches: &[MatchResponse],
    ) -> Result<bool, CacheError> {
        let payload = serde_json::to_string(matches)?;

        let stored: i32 = {
            let mut conn = self.redis.lock().await;
            self.store_script
                .key(CacheKey::matches(user))
                .key(CacheKey::generation(user))
                .arg(generation)
                .arg(self.ttl_secs)
                .arg(payload)
                .invoke_async(&mut *conn)
                .await?
        };

        if stored == 1 {
            self.local
                .insert((user, generation), Arc::new(matches.to_vec()))
                .await;
            Ok(true)
        } else {
            tracing::debug!("Skipped caching stale match list for user {} (generation {})", user, generation);
            Ok(false)
        }
    }

    /// Bump the generation and drop the list of every given user
    async fn invalidate_matches(&self, users: &[UserId]) -> Result<(), CacheError> {
        let mut pipe = redis::pipe();
        pipe.atomic();
        for user in users {
            pipe.cmd("INCR").arg(CacheKey::generation(*user)).ignore();
            pipe.cmd("DEL").arg(CacheKey::matches(*user)).ignore();
        }

        let mut conn = self.redis.lock().await;
        pipe.query_async::<()>(&mut *conn).await?;

        tracing::debug!("Invalidated match caches for users {:?}", users);
        Ok(())
    }
}

/// Redis key builder
pub struct CacheKey;

impl CacheKey {
    pub fn matches(user: UserId) -> String {
        format!("matches:{}", user)
    }

    pub fn generation(user: UserId) -> String {
        format!("matches:gen:{}", user)
    }
}
