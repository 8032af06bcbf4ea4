use async_trait::async_trait;
use chrono::Utc;
use std::collections::{BTreeMap, HashMap};
use tokio::sync::RwLock;

use crate::models::{
    Match, MatchId, MatchState, Message, MessageId, NewMessage, NewUser, PairKey, Preferences,
    Profile, ProfileDetails, User, UserId,
};
use crate::services::store::{MatchStore, MessageStore, StoreError, UserStore};

#[derive(Default)]
struct Tables {
    users: BTreeMap<UserId, User>,
    matches: BTreeMap<MatchId, Match>,
    // unique index on the unordered pair
    pairs: HashMap<PairKey, MatchId>,
    messages: BTreeMap<MessageId, Message>,
    next_user: i64,
    next_match: i64,
    next_message: i64,
}

/// In-process store backing all three persistence ports
///
/// All tables live behind one lock so that a uniqueness check and the insert
/// it guards are a single atomic step, like a unique index in PostgreSQL.
#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of match records stored for a pair (0 or 1)
    pub async fn count_for_pair(&self, pair: PairKey) -> usize {
        let tables = self.tables.read().await;
        tables.matches.values().filter(|m| m.pair() == pair).count()
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn find_by_id(&self, id: UserId) -> Result<Option<User>, StoreError> {
        Ok(self.tables.read().await.users.get(&id).cloned())
    }

    async fn find_all(&self) -> Result<Vec<User>, StoreError> {
        Ok(self.tables.read().await.users.values().cloned().collect())
    }

    async fn create(&self, new_user: NewUser) -> Result<User, StoreError> {
        let mut tables = self.tables.write().await;

        let taken = tables
            .users
            .values()
            .any(|u| u.username == new_user.username || u.email == new_user.email);
        if taken {
            return Err(StoreError::Conflict(format!(
                "username or email already registered: {}",
                new_user.username
            )));
        }

        tables.next_user += 1;
        let user = User {
            id: UserId(tables.next_user),
            username: new_user.username,
            email: new_user.email,
            description: None,
            image_url: None,
            profile: Profile::default(),
            preferences: Preferences::default(),
        };
        tables.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn update_profile(&self, id: UserId, details: &ProfileDetails) -> Result<Option<User>, StoreError> {
        let mut tables = self.tables.write().await;
        Ok(tables.users.get_mut(&id).map(|user| {
            user.description = details.description.clone();
            user.image_url = details.image_url.clone();
            user.profile = details.profile.clone();
            user.clone()
        }))
    }

    async fn update_preferences(
        &self,
        id: UserId,
        preferences: &Preferences,
    ) -> Result<Option<User>, StoreError> {
        let mut tables = self.tables.write().await;
        Ok(tables.users.get_mut(&id).map(|user| {
            user.preferences = preferences.clone();
            user.clone()
        }))
    }
}

#[async_trait]
impl MatchStore for MemoryStore {
    async fn find_by_id(&self, id: MatchId) -> Result<Option<Match>, StoreError> {
        Ok(self.tables.read().await.matches.get(&id).cloned())
    }

    async fn find_by_pair(&self, pair: PairKey) -> Result<Option<Match>, StoreError> {
        let tables = self.tables.read().await;
        Ok(tables
            .pairs
            .get(&pair)
            .and_then(|id| tables.matches.get(id))
            .cloned())
    }

    async fn insert_pending(&self, from: UserId, to: UserId) -> Result<Match, StoreError> {
        let pair = PairKey::new(from, to)
            .ok_or_else(|| StoreError::Conflict(format!("self pair for user {}", from)))?;

        let mut tables = self.tables.write().await;
        if tables.pairs.contains_key(&pair) {
            return Err(StoreError::Conflict(format!(
                "match already exists for users {} and {}",
                pair.low, pair.high
            )));
        }

        tables.next_match += 1;
        let record = Match {
            id: MatchId(tables.next_match),
            state: MatchState::Pending { from, to },
            created_at: Utc::now(),
            matched_at: None,
        };
        tables.pairs.insert(pair, record.id);
        tables.matches.insert(record.id, record.clone());
        Ok(record)
    }

    async fn mark_matched(&self, id: MatchId) -> Result<Option<Match>, StoreError> {
        let mut tables = self.tables.write().await;
        let Some(record) = tables.matches.get_mut(&id) else {
            return Ok(None);
        };

        match record.state {
            MatchState::Pending { from, to } => {
                record.state = MatchState::Matched {
                    first: from,
                    second: to,
                };
                record.matched_at = Some(Utc::now());
                Ok(Some(record.clone()))
            }
            MatchState::Matched { .. } => Ok(None),
        }
    }

    async fn find_matched_for_user(&self, user: UserId) -> Result<Vec<Match>, StoreError> {
        let tables = self.tables.read().await;
        Ok(tables
            .matches
            .values()
            .filter(|m| m.is_matched() && m.involves(user))
            .cloned()
            .collect())
    }

    async fn health_check(&self) -> Result<bool, StoreError> {
        Ok(true)
    }
}

#[async_trait]
impl MessageStore for MemoryStore {
    async fn insert(&self, message: NewMessage) -> Result<Message, StoreError> {
        let mut tables = self.tables.write().await;
        tables.next_message += 1;
        let stored = Message {
            id: MessageId(tables.next_message),
            match_id: message.match_id,
            sender_id: message.sender_id,
            content: message.content,
            created_at: Utc::now(),
        };
        tables.messages.insert(stored.id, stored.clone());
        Ok(stored)
    }

    async fn find_by_id(&self, id: MessageId) -> Result<Option<Message>, StoreError> {
        Ok(self.tables.read().await.messages.get(&id).cloned())
    }

    async fn find_by_match(&self, match_id: MatchId) -> Result<Vec<Message>, StoreError> {
        let tables = self.tables.read().await;
        let mut messages: Vec<Message> = tables
            .messages
            .values()
            .filter(|m| m.match_id == match_id)
            .cloned()
            .collect();
        messages.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        Ok(messages)
    }
}
