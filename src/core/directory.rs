use std::sync::Arc;

use crate::core::error::CoreError;
use crate::models::{HumourTag, NewUser, Preferences, Profile, ProfileDetails, User, UserId};
use crate::services::UserStore;

/// Replacement profile attributes
#[derive(Debug, Clone, Default)]
pub struct ProfileUpdate {
    pub description: Option<String>,
    pub image_url: Option<String>,
    pub age: Option<i32>,
    pub gender: Option<String>,
    pub city: Option<String>,
    pub country: Option<String>,
    pub humour_tags: Vec<String>,
}

/// Replacement feed preferences
#[derive(Debug, Clone, Default)]
pub struct PreferencesUpdate {
    pub gender: Option<String>,
    pub age_min: Option<i32>,
    pub age_max: Option<i32>,
    pub humour_tags: Vec<String>,
}

const MAX_AGE: i32 = 150;

/// Front door to user records
///
/// Every entry point resolves the user ids it receives through
/// [`UserDirectory::require`], so missing users are reported once, here.
#[derive(Clone)]
pub struct UserDirectory {
    users: Arc<dyn UserStore>,
}

impl UserDirectory {
    pub fn new(users: Arc<dyn UserStore>) -> Self {
        Self { users }
    }

    /// Load a user or fail with `NotFound`
    pub async fn require(&self, id: UserId) -> Result<User, CoreError> {
        self.users
            .find_by_id(id)
            .await?
            .ok_or_else(|| CoreError::not_found(format!("User with id {} not found", id)))
    }

    pub async fn list(&self) -> Result<Vec<User>, CoreError> {
        Ok(self.users.find_all().await?)
    }

    pub async fn register(&self, new_user: NewUser) -> Result<User, CoreError> {
        if new_user.username.trim().is_empty() {
            return Err(CoreError::invalid_argument("username must not be blank"));
        }
        let user = self.users.create(new_user).await.map_err(|e| match e {
            crate::services::StoreError::Conflict(msg) => CoreError::already_exists(msg),
            other => other.into(),
        })?;
        tracing::info!("Registered user {} ({})", user.id, user.username);
        Ok(user)
    }

    pub async fn update_profile(&self, id: UserId, update: ProfileUpdate) -> Result<User, CoreError> {
        if let Some(age) = update.age {
            if !(0..=MAX_AGE).contains(&age) {
                return Err(CoreError::invalid_argument(format!("age {} is out of range", age)));
            }
        }

        let details = ProfileDetails {
            description: trimmed(update.description),
            image_url: trimmed(update.image_url),
            profile: Profile {
                age: update.age,
                gender: update.gender,
                city: update.city,
                country: update.country,
                humour_tags: update.humour_tags.iter().map(HumourTag::new).collect(),
            },
        };

        self.users
            .update_profile(id, &details)
            .await?
            .ok_or_else(|| CoreError::not_found(format!("User with id {} not found", id)))
    }

    pub async fn update_preferences(
        &self,
        id: UserId,
        update: PreferencesUpdate,
    ) -> Result<User, CoreError> {
        for bound in [update.age_min, update.age_max].into_iter().flatten() {
            if !(0..=MAX_AGE).contains(&bound) {
                return Err(CoreError::invalid_argument(format!("age bound {} is out of range", bound)));
            }
        }
        if let (Some(min), Some(max)) = (update.age_min, update.age_max) {
            if min > max {
                return Err(CoreError::invalid_argument(format!(
                    "minimum age {} exceeds maximum age {}",
                    min, max
                )));
            }
        }

        let preferences = Preferences {
            gender: update.gender,
            age_min: update.age_min,
            age_max: update.age_max,
            humour_tags: update.humour_tags.iter().map(HumourTag::new).collect(),
        };

        self.users
            .update_preferences(id, &preferences)
            .await?
            .ok_or_else(|| CoreError::not_found(format!("User with id {} not found", id)))
    }
}

/// Blank free-text fields are stored as absent
fn trimmed(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
