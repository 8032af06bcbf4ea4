use async_trait::async_trait;
use sqlx::postgres::{PgPoolOptions, PgRow};
use sqlx::{PgPool, Row};
use std::collections::BTreeSet;
use std::time::Duration;

use crate::models::{
    HumourTag, Match, MatchId, MatchState, Message, MessageId, NewMessage, NewUser, PairKey,
    Preferences, Profile, ProfileDetails, User, UserId,
};
use crate::services::store::{MatchStore, MessageStore, StoreError, UserStore};

const USER_COLUMNS: &str = r#"
    id, username, email, description, image_url,
    age, gender, city, country, humour_tags,
    gender_preference, age_min_preference, age_max_preference, humour_tags_preference
"#;

const MATCH_COLUMNS: &str = "id, user1_id, user2_id, matched, created_at, matched_at";

/// PostgreSQL implementation of the persistence ports
///
/// The unordered-pair unique index on `matches` is what makes concurrent
/// likes safe across service instances; a violation surfaces as
/// [`StoreError::Conflict`].
pub struct PostgresClient {
    pool: PgPool,
}

impl PostgresClient {
    /// Create a new PostgreSQL client from a connection string
    pub async fn new(
        database_url: &str,
        max_connections: u32,
        min_connections: u32,
        acquire_timeout: Duration,
        idle_timeout: Duration,
    ) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .min_connections(min_connections)
            .acquire_timeout(acquire_timeout)
            .idle_timeout(idle_timeout)
            .test_before_acquire(true)
            .connect(database_url)
            .await?;

        // Run migrations on startup
        sqlx::migrate!("./migrations").run(&pool).await?;

        Ok(Self { pool })
    }

    /// Create a new PostgreSQL client from settings
    pub async fn from_settings(
        url: &str,
        max_connections: Option<u32>,
        min_connections: Option<u32>,
        acquire_timeout_secs: Option<u64>,
        idle_timeout_secs: Option<u64>,
    ) -> Result<Self, StoreError> {
        tracing::info!("Connecting to PostgreSQL");

        Self::new(
            url,
            max_connections.unwrap_or(10),
            min_connections.unwrap_or(1),
            Duration::from_secs(acquire_timeout_secs.unwrap_or(5)),
            Duration::from_secs(idle_timeout_secs.unwrap_or(600)),
        )
        .await
    }
}

fn map_write_error(err: sqlx::Error) -> StoreError {
    match &err {
        sqlx::Error::Database(db) if db.is_unique_violation() => {
            StoreError::Conflict(db.message().to_string())
        }
        _ => StoreError::Database(err),
    }
}

fn tags(values: Vec<String>) -> BTreeSet<HumourTag> {
    values.into_iter().map(HumourTag::new).collect()
}

fn tag_strings(values: &BTreeSet<HumourTag>) -> Vec<String> {
    values.iter().map(|t| t.as_str().to_string()).collect()
}

fn user_from_row(row: &PgRow) -> Result<User, StoreError> {
    Ok(User {
        id: UserId(row.try_get("id")?),
        username: row.try_get("username")?,
        email: row.try_get("email")?,
        description: row.try_get("description")?,
        image_url: row.try_get("image_url")?,
        profile: Profile {
            age: row.try_get("age")?,
            gender: row.try_get("gender")?,
            city: row.try_get("city")?,
            country: row.try_get("country")?,
            humour_tags: tags(row.try_get("humour_tags")?),
        },
        preferences: Preferences {
            gender: row.try_get("gender_preference")?,
            age_min: row.try_get("age_min_preference")?,
            age_max: row.try_get("age_max_preference")?,
            humour_tags: tags(row.try_get("humour_tags_preference")?),
        },
    })
}

fn match_from_row(row: &PgRow) -> Result<Match, StoreError> {
    let id: i64 = row.try_get("id")?;
    let user1 = UserId(row.try_get("user1_id")?);
    let user2 = UserId(row.try_get("user2_id")?);
    let matched: bool = row.try_get("matched")?;

    if user1 == user2 {
        return Err(StoreError::Corrupt(format!("match {} pairs user {} with itself", id, user1)));
    }

    let state = if matched {
        MatchState::Matched { first: user1, second: user2 }
    } else {
        MatchState::Pending { from: user1, to: user2 }
    };

    Ok(Match {
        id: MatchId(id),
        state,
        created_at: row.try_get("created_at")?,
        matched_at: row.try_get("matched_at")?,
    })
}

fn message_from_row(row: &PgRow) -> Result<Message, StoreError> {
    Ok(Message {
        id: MessageId(row.try_get("id")?),
        match_id: MatchId(row.try_get("match_id")?),
        sender_id: UserId(row.try_get("sender_id")?),
        content: row.try_get("content")?,
        created_at: row.try_get("created_at")?,
    })
}

#[async_trait]
impl UserStore for PostgresClient {
    async fn find_by_id(&self, id: UserId) -> Result<Option<User>, StoreError> {
        let query = format!("SELECT {} FROM users WHERE id = $1", USER_COLUMNS);
        let row = sqlx::query(&query).bind(id.0).fetch_optional(&self.pool).await?;
        row.as_ref().map(user_from_row).transpose()
    }

    async fn find_all(&self) -> Result<Vec<User>, StoreError> {
        let query = format!("SELECT {} FROM users ORDER BY id", USER_COLUMNS);
        let rows = sqlx::query(&query).fetch_all(&self.pool).await?;
        rows.iter().map(user_from_row).collect()
    }

    async fn create(&self, new_user: NewUser) -> Result<User, StoreError> {
        let query = format!(
            "INSERT INTO users (username, email) VALUES ($1, $2) RETURNING {}",
            USER_COLUMNS
        );
        let row = sqlx::query(&query)
            .bind(&new_user.username)
            .bind(&new_user.email)
            .fetch_one(&self.pool)
            .await
            .map_err(map_write_error)?;
        user_from_row(&row)
    }

    async fn update_profile(&self, id: UserId, details: &ProfileDetails) -> Result<Option<User>, StoreError> {
        let profile = &details.profile;
        let query = format!(
            r#"
            UPDATE users
            SET age = $2, gender = $3, city = $4, country = $5, humour_tags = $6,
                description = $7, image_url = $8
            WHERE id = $1
            RETURNING {}
            "#,
            USER_COLUMNS
        );
        let row = sqlx::query(&query)
            .bind(id.0)
            .bind(profile.age)
            .bind(&profile.gender)
            .bind(&profile.city)
            .bind(&profile.country)
            .bind(tag_strings(&profile.humour_tags))
            .bind(&details.description)
            .bind(&details.image_url)
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(user_from_row).transpose()
    }

    async fn update_preferences(
        &self,
        id: UserId,
        preferences: &Preferences,
    ) -> Result<Option<User>, StoreError> {
        let query = format!(
            r#"
            UPDATE users
            SET gender_preference = $2, age_min_preference = $3,
                age_max_preference = $4, humour_tags_preference = $5
            WHERE id = $1
            RETURNING {}
            "#,
            USER_COLUMNS
        );
        let row = sqlx::query(&query)
            .bind(id.0)
            .bind(&preferences.gender)
            .bind(preferences.age_min)
            .bind(preferences.age_max)
            .bind(tag_strings(&preferences.humour_tags))
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(user_from_row).transpose()
    }
}

#[async_trait]
impl MatchStore for PostgresClient {
    async fn find_by_id(&self, id: MatchId) -> Result<Option<Match>, StoreError> {
        let query = format!("SELECT {} FROM matches WHERE id = $1", MATCH_COLUMNS);
        let row = sqlx::query(&query).bind(id.0).fetch_optional(&self.pool).await?;
        row.as_ref().map(match_from_row).transpose()
    }

    async fn find_by_pair(&self, pair: PairKey) -> Result<Option<Match>, StoreError> {
        let query = format!(
            r#"
            SELECT {}
            FROM matches
            WHERE LEAST(user1_id, user2_id) = $1 AND GREATEST(user1_id, user2_id) = $2
            "#,
            MATCH_COLUMNS
        );
        let row = sqlx::query(&query)
            .bind(pair.low.0)
            .bind(pair.high.0)
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(match_from_row).transpose()
    }

    async fn insert_pending(&self, from: UserId, to: UserId) -> Result<Match, StoreError> {
        let query = format!(
            "INSERT INTO matches (user1_id, user2_id, matched) VALUES ($1, $2, FALSE) RETURNING {}",
            MATCH_COLUMNS
        );
        let row = sqlx::query(&query)
            .bind(from.0)
            .bind(to.0)
            .fetch_one(&self.pool)
            .await
            .map_err(map_write_error)?;

        tracing::debug!("Inserted pending match: {} -> {}", from, to);
        match_from_row(&row)
    }

    async fn mark_matched(&self, id: MatchId) -> Result<Option<Match>, StoreError> {
        let query = format!(
            r#"
            UPDATE matches
            SET matched = TRUE, matched_at = NOW()
            WHERE id = $1 AND matched = FALSE
            RETURNING {}
            "#,
            MATCH_COLUMNS
        );
        let row = sqlx::query(&query).bind(id.0).fetch_optional(&self.pool).await?;
        row.as_ref().map(match_from_row).transpose()
    }

    async fn find_matched_for_user(&self, user: UserId) -> Result<Vec<Match>, StoreError> {
        let query = format!(
            r#"
            SELECT {}
            FROM matches
            WHERE matched = TRUE AND (user1_id = $1 OR user2_id = $1)
            ORDER BY matched_at DESC NULLS LAST, id
            "#,
            MATCH_COLUMNS
        );
        let rows = sqlx::query(&query).bind(user.0).fetch_all(&self.pool).await?;
        rows.iter().map(match_from_row).collect()
    }

    /// Health check for the database connection
    async fn health_check(&self) -> Result<bool, StoreError> {
        sqlx::query("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .map(|_| true)
            .map_err(Into::into)
    }
}

#[async_trait]
impl MessageStore for PostgresClient {
    async fn insert(&self, message: NewMessage) -> Result<Message, StoreError> {
        let row = sqlx::query(
            r#"
            INSERT INTO messages (match_id, sender_id, content, created_at)
            VALUES ($1, $2, $3, NOW())
            RETURNING id, match_id, sender_id, content, created_at
            "#,
        )
        .bind(message.match_id.0)
        .bind(message.sender_id.0)
        .bind(&message.content)
        .fetch_one(&self.pool)
        .await?;
        message_from_row(&row)
    }

    async fn find_by_id(&self, id: MessageId) -> Result<Option<Message>, StoreError> {
        let row = sqlx::query(
            "SELECT id, match_id, sender_id, content, created_at FROM messages WHERE id = $1",
        )
        .bind(id.0)
        .fetch_optional(&self.pool)
        .await?;
        row.as_ref().map(message_from_row).transpose()
    }

    async fn find_by_match(&self, match_id: MatchId) -> Result<Vec<Message>, StoreError> {
        let rows = sqlx::query(
            r#"
            SELECT id, match_id, sender_id, content, created_at
            FROM messages
            WHERE match_id = $1
            ORDER BY created_at ASC, id ASC
            "#,
        )
        .bind(match_id.0)
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(message_from_row).collect()
    }
}
