// Model exports
pub mod domain;
pub mod requests;
pub mod responses;

pub use domain::{
    HumourTag, LikeOutcome, Match, MatchId, MatchState, Message, MessageId, NewMessage, NewUser, PairKey,
    Preferences, Profile, ProfileDetails, User, UserId,
};
pub use requests::{CreateMatchRequest, SendMessageRequest, UpdatePreferencesRequest, UpdateProfileRequest};
pub use responses::{
    ErrorResponse, FeedEntry, FeedResponse, HealthResponse, LikeResponse, MatchResponse,
    MatchStatusResponse,
};
