use actix_web::{web, HttpResponse};

use crate::models::{MatchId, MessageId, SendMessageRequest};
use crate::routes::auth::AuthenticatedUser;
use crate::routes::error::ApiError;
use crate::routes::{validate, AppState};

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg
        .route("/matches/{match_id}/messages", web::post().to(send_message))
        .route("/matches/{match_id}/messages", web::get().to(list_messages))
        .route("/messages/{message_id}", web::get().to(get_message));
}

/// Send a message inside a mutual match
///
/// POST /api/v1/matches/{matchId}/messages
///
/// Request body:
/// ```json
/// { "content": "knock knock" }
/// ```
async fn send_message(
    state: web::Data<AppState>,
    auth: AuthenticatedUser,
    path: web::Path<i64>,
    req: web::Json<SendMessageRequest>,
) -> Result<HttpResponse, ApiError> {
    validate(&*req)?;
    let match_id = MatchId(path.into_inner());

    let message = state
        .messaging
        .create_message(match_id, auth.user_id, &req.content)
        .await?;

    tracing::info!("User {} sent message {} in match {}", auth.user_id, message.id, match_id);
    Ok(HttpResponse::Created().json(message))
}

/// Conversation of a match, oldest first
///
/// GET /api/v1/matches/{matchId}/messages
async fn list_messages(
    state: web::Data<AppState>,
    auth: AuthenticatedUser,
    path: web::Path<i64>,
) -> Result<HttpResponse, ApiError> {
    let record = state.engine.get_match(MatchId(path.into_inner())).await?;
    if !record.involves(auth.user_id) {
        return Err(ApiError::Forbidden(format!("not a participant of match {}", record.id)));
    }

    let messages = state.messaging.get_messages_by_match_id(record.id).await?;
    Ok(HttpResponse::Ok().json(messages))
}

/// GET /api/v1/messages/{messageId}
async fn get_message(
    state: web::Data<AppState>,
    auth: AuthenticatedUser,
    path: web::Path<i64>,
) -> Result<HttpResponse, ApiError> {
    let message = state.messaging.get_message(MessageId(path.into_inner())).await?;
    let record = state.engine.get_match(message.match_id).await?;
    if !record.involves(auth.user_id) {
        return Err(ApiError::Forbidden(format!("not a participant of match {}", record.id)));
    }

    Ok(HttpResponse::Ok().json(message))
}
