//! MeMatch - matching, feed and messaging service for the MeMatch dating app
//!
//! Swipe-right likes become mutual matches exactly once, even when both
//! users like each other at the same moment. Feeds are filtered by the
//! requester's gender and age preferences and ranked by shared humour tags.
//! Messages may only be written inside a mutual match.

pub mod config;
pub mod core;
pub mod models;
pub mod routes;
pub mod services;

// Re-export commonly used types
pub use crate::core::{CoreError, FeedFilter, LikeOutcome, MatchingEngine, MessagingGate, UserDirectory};
pub use crate::models::{Match, MatchId, MatchState, Message, MessageId, PairKey, User, UserId};
pub use crate::routes::{configure_routes, AppState};
