use serde::{Deserialize, Serialize};
use crate::models::domain::{HumourTag, LikeOutcome, Match, User};

/// Flat view of a match record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchResponse {
    pub id: i64,
    pub user1_id: i64,
    pub user2_id: i64,
    pub matched: bool,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub matched_at: Option<chrono::DateTime<chrono::Utc>>,
}

impl From<&Match> for MatchResponse {
    fn from(m: &Match) -> Self {
        Self {
            id: m.id.0,
            user1_id: m.user1().0,
            user2_id: m.user2().0,
            matched: m.is_matched(),
            created_at: m.created_at,
            matched_at: m.matched_at,
        }
    }
}

/// Response for the like endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LikeResponse {
    pub outcome: LikeOutcome,
    #[serde(rename = "match")]
    pub record: MatchResponse,
}

/// Relationship flags between the caller and another user
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchStatusResponse {
    pub user_id: i64,
    pub exists: bool,
    pub liked: bool,
    pub matched: bool,
}

/// Single feed entry
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedEntry {
    pub user: User,
    pub shared_humour_tags: Vec<HumourTag>,
}

/// Response for the feed endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedResponse {
    pub users: Vec<FeedEntry>,
    pub total_results: usize,
}

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

/// Error response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
    pub status_code: u16,
}
