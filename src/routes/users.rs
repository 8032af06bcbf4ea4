use actix_web::{web, HttpResponse};

use crate::core::{PreferencesUpdate, ProfileUpdate};
use crate::models::{FeedEntry, FeedResponse, UpdatePreferencesRequest, UpdateProfileRequest, UserId};
use crate::routes::auth::AuthenticatedUser;
use crate::routes::error::ApiError;
use crate::routes::{validate, AppState};

/// Literal segments are registered ahead of `/users/{user_id}`
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg
        .route("/users", web::get().to(list_users))
        .route("/users/feed", web::get().to(get_feed))
        .route("/users/me/profile", web::put().to(update_profile))
        .route("/users/me/preferences", web::put().to(update_preferences))
        .route("/users/{user_id}", web::get().to(get_user));
}

/// Swipe feed for the caller
///
/// GET /api/v1/users/feed
async fn get_feed(
    state: web::Data<AppState>,
    auth: AuthenticatedUser,
) -> Result<HttpResponse, ApiError> {
    let start = std::time::Instant::now();
    let candidates = state.feed.get_users_for_feed(auth.user_id).await?;

    let users: Vec<FeedEntry> = candidates
        .into_iter()
        .map(|c| FeedEntry {
            user: c.user,
            shared_humour_tags: c.shared_humour_tags,
        })
        .collect();

    tracing::info!(
        "Feed for user {} returned {} users in {}ms",
        auth.user_id,
        users.len(),
        start.elapsed().as_millis()
    );

    Ok(HttpResponse::Ok().json(FeedResponse {
        total_results: users.len(),
        users,
    }))
}

/// GET /api/v1/users
async fn list_users(
    state: web::Data<AppState>,
    _auth: AuthenticatedUser,
) -> Result<HttpResponse, ApiError> {
    let users = state.directory.list().await?;
    Ok(HttpResponse::Ok().json(users))
}

/// GET /api/v1/users/{userId}
async fn get_user(
    state: web::Data<AppState>,
    _auth: AuthenticatedUser,
    path: web::Path<i64>,
) -> Result<HttpResponse, ApiError> {
    let user = state.directory.require(UserId(path.into_inner())).await?;
    Ok(HttpResponse::Ok().json(user))
}

/// Replace the caller's profile attributes
///
/// PUT /api/v1/users/me/profile
async fn update_profile(
    state: web::Data<AppState>,
    auth: AuthenticatedUser,
    req: web::Json<UpdateProfileRequest>,
) -> Result<HttpResponse, ApiError> {
    validate(&*req)?;
    let req = req.into_inner();

    let user = state
        .directory
        .update_profile(
            auth.user_id,
            ProfileUpdate {
                description: req.description,
                image_url: req.image_url,
                age: req.age,
                gender: req.gender,
                city: req.city,
                country: req.country,
                humour_tags: req.humour_tags,
            },
        )
        .await?;

    tracing::info!("User {} updated profile", user.id);
    Ok(HttpResponse::Ok().json(user))
}

/// Replace the caller's feed preferences
///
/// PUT /api/v1/users/me/preferences
async fn update_preferences(
    state: web::Data<AppState>,
    auth: AuthenticatedUser,
    req: web::Json<UpdatePreferencesRequest>,
) -> Result<HttpResponse, ApiError> {
    validate(&*req)?;
    let req = req.into_inner();

    let user = state
        .directory
        .update_preferences(
            auth.user_id,
            PreferencesUpdate {
                gender: req.gender_preference,
                age_min: req.age_min,
                age_max: req.age_max,
                humour_tags: req.humour_tags,
            },
        )
        .await?;

    tracing::info!("User {} updated preferences", user.id);
    Ok(HttpResponse::Ok().json(user))
}
