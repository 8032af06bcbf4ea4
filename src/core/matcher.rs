use std::sync::Arc;

use crate::core::error::CoreError;
use crate::models::{LikeOutcome, Match, MatchId, MatchState, PairKey, UserId};
use crate::services::MatchStore;

/// Result of a like: the outcome and the record as it now stands
#[derive(Debug, Clone)]
pub struct LikeResult {
    pub outcome: LikeOutcome,
    pub record: Match,
}

/// Owner of the like → match state machine
///
/// # Transitions
/// - no record → `Pending { from: liker, to: liked }`
/// - `Pending { from: liked, .. }` → `Matched` (the reciprocal like)
/// - `Pending { from: liker, .. }` and `Matched` are left untouched
///
/// The read-then-write in [`MatchingEngine::like_user`] relies on the store's
/// unique pair constraint. Losing an insert race yields a conflict, after which
/// the decision is taken once more against the record that won.
#[derive(Clone)]
pub struct MatchingEngine {
    matches: Arc<dyn MatchStore>,
}

impl MatchingEngine {
    pub fn new(matches: Arc<dyn MatchStore>) -> Self {
        Self { matches }
    }

    /// Record that `liker` swiped right on `liked`
    pub async fn like_user(&self, liker: UserId, liked: UserId) -> Result<LikeResult, CoreError> {
        let pair = PairKey::new(liker, liked)
            .ok_or_else(|| CoreError::invalid_argument("a user cannot like themselves"))?;

        match self.apply_like(pair, liker, liked).await {
            Err(e) if e.is_conflict() => {
                tracing::debug!(
                    "Concurrent write on pair ({}, {}), retrying like {} -> {}",
                    pair.low,
                    pair.high,
                    liker,
                    liked
                );
                self.apply_like(pair, liker, liked).await
            }
            other => other,
        }
    }

    async fn apply_like(
        &self,
        pair: PairKey,
        liker: UserId,
        liked: UserId,
    ) -> Result<LikeResult, CoreError> {
        let Some(existing) = self.matches.find_by_pair(pair).await? else {
            let record = self.matches.insert_pending(liker, liked).await?;
            tracing::info!("One-way like: user {} -> user {} (match {})", liker, liked, record.id);
            return Ok(LikeResult {
                outcome: LikeOutcome::Pending,
                record,
            });
        };

        match existing.state {
            MatchState::Matched { .. } => Ok(LikeResult {
                outcome: LikeOutcome::AlreadyMatched,
                record: existing,
            }),
            MatchState::Pending { from, .. } if from == liked => {
                match self.matches.mark_matched(existing.id).await? {
                    Some(record) => {
                        tracing::info!("Match created: user {} <-> user {} (match {})", liker, liked, record.id);
                        Ok(LikeResult {
                            outcome: LikeOutcome::Matched,
                            record,
                        })
                    }
                    // another request completed the transition first
                    None => Ok(LikeResult {
                        outcome: LikeOutcome::AlreadyMatched,
                        record: self.get_match(existing.id).await?,
                    }),
                }
            }
            MatchState::Pending { .. } => {
                tracing::debug!("User {} already liked user {}", liker, liked);
                Ok(LikeResult {
                    outcome: LikeOutcome::AlreadyLiked,
                    record: existing,
                })
            }
        }
    }

    /// Create a one-way record directly, failing if the pair has any record
    pub async fn create_match(&self, user1: UserId, user2: UserId) -> Result<Match, CoreError> {
        let pair = PairKey::new(user1, user2)
            .ok_or_else(|| CoreError::invalid_argument("cannot match a user with themselves"))?;

        let already_exists =
            || CoreError::already_exists(format!("Match already exists between users {} and {}", user1, user2));

        if self.matches.find_by_pair(pair).await?.is_some() {
            return Err(already_exists());
        }

        match self.matches.insert_pending(user1, user2).await {
            Ok(record) => Ok(record),
            Err(crate::services::StoreError::Conflict(_)) => Err(already_exists()),
            Err(e) => Err(e.into()),
        }
    }

    pub async fn get_match(&self, id: MatchId) -> Result<Match, CoreError> {
        self.matches
            .find_by_id(id)
            .await?
            .ok_or_else(|| CoreError::not_found(format!("Match with id {} not found", id)))
    }

    /// True if any record, pending or matched, exists for the pair
    pub async fn check_match_exists(&self, u1: UserId, u2: UserId) -> Result<bool, CoreError> {
        Ok(self.find_pair(u1, u2).await?.is_some())
    }

    pub async fn are_users_matched(&self, u1: UserId, u2: UserId) -> Result<bool, CoreError> {
        Ok(self.find_pair(u1, u2).await?.is_some_and(|m| m.is_matched()))
    }

    /// True if `liker` has a pending like on `liked`, or the two are matched
    pub async fn has_user_liked_user(&self, liker: UserId, liked: UserId) -> Result<bool, CoreError> {
        Ok(match self.find_pair(liker, liked).await? {
            Some(m) => match m.state {
                MatchState::Pending { from, .. } => from == liker,
                MatchState::Matched { .. } => true,
            },
            None => false,
        })
    }

    /// Mutual matches of a user; one-way likes are never listed
    pub async fn get_matches_for_user(&self, user: UserId) -> Result<Vec<Match>, CoreError> {
        let matches = self.matches.find_matched_for_user(user).await?;
        Ok(matches.into_iter().filter(|m| m.is_matched()).collect())
    }

    async fn find_pair(&self, u1: UserId, u2: UserId) -> Result<Option<Match>, CoreError> {
        match PairKey::new(u1, u2) {
            Some(pair) => Ok(self.matches.find_by_pair(pair).await?),
            None => Ok(None),
        }
    }
}
