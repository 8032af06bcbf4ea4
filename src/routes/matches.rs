use actix_web::{http::StatusCode, web, HttpResponse};

use crate::core::LikeOutcome;
use crate::models::{
    CreateMatchRequest, HealthResponse, LikeResponse, MatchId, MatchResponse, MatchStatusResponse,
    UserId,
};
use crate::routes::auth::AuthenticatedUser;
use crate::routes::error::ApiError;
use crate::routes::{validate, AppState};
use crate::services::CacheLookup;

/// Configure all match-related routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg
        .route("/health", web::get().to(health_check))
        .route("/matches", web::get().to(list_matches))
        .route("/matches", web::post().to(create_match))
        .route("/matches/like/{liked_id}", web::post().to(like_user))
        .route("/matches/status/{other_id}", web::get().to(match_status))
        .route("/matches/{match_id}", web::get().to(get_match));
}

/// Health check endpoint
async fn health_check(state: web::Data<AppState>) -> HttpResponse {
    let healthy = state.store_health.health_check().await.unwrap_or(false);
    let status = if healthy { "healthy" } else { "degraded" };

    HttpResponse::Ok().json(HealthResponse {
        status: status.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: chrono::Utc::now(),
    })
}

/// Swipe right on another user
///
/// POST /api/v1/matches/like/{likedId}
///
/// Responds 202 for a new one-way like, 201 when the like completes a
/// match, and 200 when nothing changed.
async fn like_user(
    state: web::Data<AppState>,
    auth: AuthenticatedUser,
    path: web::Path<i64>,
) -> Result<HttpResponse, ApiError> {
    let liker = state.directory.require(auth.user_id).await?;
    let liked = state.directory.require(UserId(path.into_inner())).await?;

    let result = state.engine.like_user(liker.id, liked.id).await?;

    if result.outcome.changed_state() {
        state.invalidate_matches(&[liker.id, liked.id]).await;
    }

    let status = match result.outcome {
        LikeOutcome::Pending => StatusCode::ACCEPTED,
        LikeOutcome::Matched => StatusCode::CREATED,
        LikeOutcome::AlreadyMatched | LikeOutcome::AlreadyLiked => StatusCode::OK,
    };

    Ok(HttpResponse::build(status).json(LikeResponse {
        outcome: result.outcome,
        record: MatchResponse::from(&result.record),
    }))
}

/// Create a match record directly (admin only)
///
/// POST /api/v1/matches
///
/// Request body:
/// ```json
/// { "user1Id": 1, "user2Id": 2 }
/// ```
async fn create_match(
    state: web::Data<AppState>,
    auth: AuthenticatedUser,
    req: web::Json<CreateMatchRequest>,
) -> Result<HttpResponse, ApiError> {
    auth.require_admin()?;
    validate(&*req)?;

    let user1 = state.directory.require(UserId(req.user1_id)).await?;
    let user2 = state.directory.require(UserId(req.user2_id)).await?;

    let record = state.engine.create_match(user1.id, user2.id).await?;
    state.invalidate_matches(&[user1.id, user2.id]).await;

    tracing::info!("Admin {} created match {} for users {} and {}", auth.user_id, record.id, user1.id, user2.id);
    Ok(HttpResponse::Created().json(MatchResponse::from(&record)))
}

/// Mutual matches of the caller
///
/// GET /api/v1/matches
async fn list_matches(
    state: web::Data<AppState>,
    auth: AuthenticatedUser,
) -> Result<HttpResponse, ApiError> {
    let user = state.directory.require(auth.user_id).await?;

    // generation seen before the store read; None skips the write-back
    let mut generation = None;
    if let Some(cache) = &state.cache {
        match cache.lookup(user.id).await {
            Ok(CacheLookup::Hit(cached)) => return Ok(HttpResponse::Ok().json(cached)),
            Ok(CacheLookup::Miss { generation: seen }) => generation = Some(seen),
            Err(e) => tracing::warn!("Match cache read failed for user {}: {}", user.id, e),
        }
    }

    let matches: Vec<MatchResponse> = state
        .engine
        .get_matches_for_user(user.id)
        .await?
        .iter()
        .map(MatchResponse::from)
        .collect();

    if let (Some(cache), Some(generation)) = (&state.cache, generation) {
        if let Err(e) = cache.store_matches(user.id, generation, &matches).await {
            tracing::warn!("Match cache write failed for user {}: {}", user.id, e);
        }
    }

    Ok(HttpResponse::Ok().json(matches))
}

/// A single match the caller takes part in
///
/// GET /api/v1/matches/{matchId}
async fn get_match(
    state: web::Data<AppState>,
    auth: AuthenticatedUser,
    path: web::Path<i64>,
) -> Result<HttpResponse, ApiError> {
    let record = state.engine.get_match(MatchId(path.into_inner())).await?;
    if !record.involves(auth.user_id) {
        return Err(ApiError::Forbidden(format!("not a participant of match {}", record.id)));
    }
    Ok(HttpResponse::Ok().json(MatchResponse::from(&record)))
}

/// Relationship flags between the caller and another user
///
/// GET /api/v1/matches/status/{otherId}
async fn match_status(
    state: web::Data<AppState>,
    auth: AuthenticatedUser,
    path: web::Path<i64>,
) -> Result<HttpResponse, ApiError> {
    let me = state.directory.require(auth.user_id).await?;
    let other = state.directory.require(UserId(path.into_inner())).await?;

    Ok(HttpResponse::Ok().json(MatchStatusResponse {
        user_id: other.id.0,
        exists: state.engine.check_match_exists(me.id, other.id).await?,
        liked: state.engine.has_user_liked_user(me.id, other.id).await?,
        matched: state.engine.are_users_matched(me.id, other.id).await?,
    }))
}
