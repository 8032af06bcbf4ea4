use serde::{Deserialize, Serialize};
use validator::Validate;

/// Request to create an explicit match record between two users
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateMatchRequest {
    #[validate(range(min = 1))]
    #[serde(alias = "user1_id", rename = "user1Id")]
    pub user1_id: i64,
    #[validate(range(min = 1))]
    #[serde(alias = "user2_id", rename = "user2Id")]
    pub user2_id: i64,
}

/// Request to send a message inside a match
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct SendMessageRequest {
    #[validate(length(min = 1, max = 4000))]
    pub content: String,
}

/// Request to replace profile details
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct UpdateProfileRequest {
    #[validate(length(max = 1000))]
    pub description: Option<String>,
    #[validate(url, length(max = 2048))]
    #[serde(alias = "image_url", rename = "imageUrl")]
    pub image_url: Option<String>,
    #[validate(range(min = 0, max = 150))]
    pub age: Option<i32>,
    #[validate(length(max = 64))]
    pub gender: Option<String>,
    #[validate(length(max = 128))]
    pub city: Option<String>,
    #[validate(length(max = 128))]
    pub country: Option<String>,
    #[serde(default, alias = "humour_tags", rename = "humourTags")]
    pub humour_tags: Vec<String>,
}

/// Request to replace feed preferences
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct UpdatePreferencesRequest {
    #[validate(length(max = 64))]
    #[serde(alias = "gender_preference", rename = "genderPreference")]
    pub gender_preference: Option<String>,
    #[validate(range(min = 0, max = 150))]
    #[serde(alias = "age_min", rename = "ageMin")]
    pub age_min: Option<i32>,
    #[validate(range(min = 0, max = 150))]
    #[serde(alias = "age_max", rename = "ageMax")]
    pub age_max: Option<i32>,
    #[serde(default, alias = "humour_tags", rename = "humourTags")]
    pub humour_tags: Vec<String>,
}
