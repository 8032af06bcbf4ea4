//! Persistence ports consumed by the core.
//!
//! The core only talks to storage through these traits so that the
//! PostgreSQL store and the in-memory store are interchangeable.

use async_trait::async_trait;
use thiserror::Error;

use crate::models::{
    Match, MatchId, Message, MessageId, NewMessage, NewUser, PairKey, Preferences, ProfileDetails, User,
    UserId,
};

/// Errors raised by store implementations
#[derive(Debug, Error)]
pub enum StoreError {
    /// A uniqueness constraint rejected the write
    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migrate(#[from] sqlx::migrate::MigrateError),

    /// A stored row could not be mapped back to a domain value
    #[error("Corrupt record: {0}")]
    Corrupt(String),
}

/// User lookup and profile persistence
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_by_id(&self, id: UserId) -> Result<Option<User>, StoreError>;

    async fn find_all(&self) -> Result<Vec<User>, StoreError>;

    async fn create(&self, new_user: NewUser) -> Result<User, StoreError>;

    /// Replace description, image and profile attributes; `None` when the
    /// user does not exist
    async fn update_profile(&self, id: UserId, details: &ProfileDetails) -> Result<Option<User>, StoreError>;

    /// Replace preference attributes; `None` when the user does not exist
    async fn update_preferences(
        &self,
        id: UserId,
        preferences: &Preferences,
    ) -> Result<Option<User>, StoreError>;
}

/// Match persistence keyed by the unordered user pair
///
/// Implementations must guarantee at most one record per [`PairKey`] and
/// report a violated uniqueness constraint as [`StoreError::Conflict`].
#[async_trait]
pub trait MatchStore: Send + Sync {
    async fn find_by_id(&self, id: MatchId) -> Result<Option<Match>, StoreError>;

    async fn find_by_pair(&self, pair: PairKey) -> Result<Option<Match>, StoreError>;

    /// Insert a one-way like from `from` to `to`
    async fn insert_pending(&self, from: UserId, to: UserId) -> Result<Match, StoreError>;

    /// Flip a pending record to matched.
    ///
    /// Only succeeds while the record is still pending. Returns `None` when the
    /// record is already matched or gone, so the transition happens once.
    async fn mark_matched(&self, id: MatchId) -> Result<Option<Match>, StoreError>;

    /// All mutual matches the user participates in
    async fn find_matched_for_user(&self, user: UserId) -> Result<Vec<Match>, StoreError>;

    async fn health_check(&self) -> Result<bool, StoreError>;
}

/// Message persistence
#[async_trait]
pub trait MessageStore: Send + Sync {
    /// Store a message, assigning id and creation time
    async fn insert(&self, message: NewMessage) -> Result<Message, StoreError>;

    async fn find_by_id(&self, id: MessageId) -> Result<Option<Message>, StoreError>;

    /// Messages of a match, oldest first
    async fn find_by_match(&self, match_id: MatchId) -> Result<Vec<Message>, StoreError>;
}
