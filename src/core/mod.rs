// Core matching exports
pub mod directory;
pub mod error;
pub mod feed;
pub mod filters;
pub mod matcher;
pub mod messaging;

pub use directory::{PreferencesUpdate, ProfileUpdate, UserDirectory};
pub use error::CoreError;
pub use feed::{build_feed, FeedCandidate, FeedFilter};
pub use filters::{matches_age_range, matches_gender, matches_preferences, shared_humour_tags};
pub use crate::models::LikeOutcome;
pub use matcher::{LikeResult, MatchingEngine};
pub use messaging::MessagingGate;
