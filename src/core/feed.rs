use std::collections::HashSet;
use std::sync::Arc;

use crate::core::error::CoreError;
use crate::core::filters::{matches_preferences, shared_humour_tags};
use crate::models::{HumourTag, User, UserId};
use crate::services::{MatchStore, UserStore};

/// A user eligible for the requester's swipe feed
#[derive(Debug, Clone)]
pub struct FeedCandidate {
    pub user: User,
    pub shared_humour_tags: Vec<HumourTag>,
}

/// Builds a feed from a snapshot of users and the requester's matches
///
/// # Pipeline Stages
/// 1. Drop the requester and everyone mutually matched with them
/// 2. Gender and age-range preference predicates
/// 3. Humour-tag affinity, used only for ordering
///
/// Ordering: most shared humour tags first, then ascending user id.
pub fn build_feed(
    requester: &User,
    population: Vec<User>,
    matched_with: &HashSet<UserId>,
) -> Vec<FeedCandidate> {
    let preferences = &requester.preferences;

    let mut feed: Vec<FeedCandidate> = population
        .into_iter()
        .filter(|candidate| candidate.id != requester.id)
        .filter(|candidate| !matched_with.contains(&candidate.id))
        .filter(|candidate| matches_preferences(candidate, preferences))
        .map(|candidate| {
            let shared = shared_humour_tags(&candidate, preferences);
            FeedCandidate {
                user: candidate,
                shared_humour_tags: shared,
            }
        })
        .collect();

    feed.sort_by(|a, b| {
        b.shared_humour_tags
            .len()
            .cmp(&a.shared_humour_tags.len())
            .then_with(|| a.user.id.cmp(&b.user.id))
    });

    feed
}

/// Read-only feed computation over current store contents
#[derive(Clone)]
pub struct FeedFilter {
    users: Arc<dyn UserStore>,
    matches: Arc<dyn MatchStore>,
}

impl FeedFilter {
    pub fn new(users: Arc<dyn UserStore>, matches: Arc<dyn MatchStore>) -> Self {
        Self { users, matches }
    }

    /// Candidates for `user_id` to swipe on
    ///
    /// The requester is reloaded on every call so preference edits apply
    /// immediately.
    pub async fn get_users_for_feed(&self, user_id: UserId) -> Result<Vec<FeedCandidate>, CoreError> {
        let requester = self
            .users
            .find_by_id(user_id)
            .await?
            .ok_or_else(|| CoreError::not_found(format!("User with id {} not found", user_id)))?;

        let matched_with: HashSet<UserId> = self
            .matches
            .find_matched_for_user(user_id)
            .await?
            .iter()
            .filter(|m| m.is_matched())
            .filter_map(|m| m.partner_of(user_id))
            .collect();

        let population = self.users.find_all().await?;
        let total = population.len();
        let feed = build_feed(&requester, population, &matched_with);

        tracing::debug!(
            "Feed for user {}: {} of {} users ({} excluded by match)",
            user_id,
            feed.len(),
            total,
            matched_with.len()
        );

        Ok(feed)
    }
}
