// Route exports
pub mod auth;
pub mod error;
pub mod matches;
pub mod messages;
pub mod users;

use actix_web::web;
use std::sync::Arc;
use validator::Validate;

use crate::core::{FeedFilter, MatchingEngine, MessagingGate, UserDirectory};
use crate::models::UserId;
use crate::services::{MatchListCache, MatchStore, MessageStore, UserStore};
use auth::TokenVerifier;
use error::ApiError;

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub directory: UserDirectory,
    pub engine: MatchingEngine,
    pub feed: FeedFilter,
    pub messaging: MessagingGate,
    pub store_health: Arc<dyn MatchStore>,
    pub cache: Option<Arc<dyn MatchListCache>>,
    pub tokens: TokenVerifier,
}

impl AppState {
    /// Wire the core components onto the given stores
    pub fn new(
        users: Arc<dyn UserStore>,
        matches: Arc<dyn MatchStore>,
        messages: Arc<dyn MessageStore>,
        cache: Option<Arc<dyn MatchListCache>>,
        tokens: TokenVerifier,
    ) -> Self {
        Self {
            directory: UserDirectory::new(users.clone()),
            engine: MatchingEngine::new(matches.clone()),
            feed: FeedFilter::new(users.clone(), matches.clone()),
            messaging: MessagingGate::new(matches.clone(), users, messages),
            store_health: matches,
            cache,
            tokens,
        }
    }

    /// Best-effort invalidation of cached match lists
    pub async fn invalidate_matches(&self, users: &[UserId]) {
        if let Some(cache) = &self.cache {
            if let Err(e) = cache.invalidate_matches(users).await {
                tracing::warn!("Failed to invalidate match cache: {}", e);
            }
        }
    }
}

pub(crate) fn validate<T: Validate>(req: &T) -> Result<(), ApiError> {
    req.validate().map_err(|errors| {
        tracing::info!("Validation failed: field_errors={:?}", errors);
        ApiError::Validation(errors.to_string())
    })
}

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/v1")
            .configure(matches::configure)
            .configure(messages::configure)
            .configure(users::configure),
    );
}
