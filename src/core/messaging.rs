use std::sync::Arc;

use crate::core::error::CoreError;
use crate::models::{MatchId, Message, MessageId, NewMessage, UserId};
use crate::services::{MatchStore, MessageStore, UserStore};

/// Lets only mutually matched participants write into a match
#[derive(Clone)]
pub struct MessagingGate {
    matches: Arc<dyn MatchStore>,
    users: Arc<dyn UserStore>,
    messages: Arc<dyn MessageStore>,
}

impl MessagingGate {
    pub fn new(
        matches: Arc<dyn MatchStore>,
        users: Arc<dyn UserStore>,
        messages: Arc<dyn MessageStore>,
    ) -> Self {
        Self {
            matches,
            users,
            messages,
        }
    }

    /// Send `content` from `sender_id` inside a match
    ///
    /// Checks run in order: match exists, match is mutual, sender exists,
    /// sender takes part in the match.
    pub async fn create_message(
        &self,
        match_id: MatchId,
        sender_id: UserId,
        content: &str,
    ) -> Result<Message, CoreError> {
        let record = self
            .matches
            .find_by_id(match_id)
            .await?
            .ok_or_else(|| CoreError::not_found(format!("Match with id {} not found", match_id)))?;

        if !record.is_matched() {
            return Err(CoreError::invalid_state("Cannot send messages to unmatched users"));
        }

        self.users
            .find_by_id(sender_id)
            .await?
            .ok_or_else(|| CoreError::not_found(format!("User with id {} not found", sender_id)))?;

        if !record.involves(sender_id) {
            return Err(CoreError::invalid_argument(format!(
                "User {} is not part of match {}",
                sender_id, match_id
            )));
        }

        if content.trim().is_empty() {
            return Err(CoreError::invalid_argument("message content must not be blank"));
        }

        let message = self
            .messages
            .insert(NewMessage {
                match_id,
                sender_id,
                content: content.to_string(),
            })
            .await?;

        tracing::debug!("Message {} sent by user {} in match {}", message.id, sender_id, match_id);
        Ok(message)
    }

    /// Messages of a match, oldest first. No access check is done here.
    pub async fn get_messages_by_match_id(&self, match_id: MatchId) -> Result<Vec<Message>, CoreError> {
        Ok(self.messages.find_by_match(match_id).await?)
    }

    pub async fn get_message(&self, id: MessageId) -> Result<Message, CoreError> {
        self.messages
            .find_by_id(id)
            .await?
            .ok_or_else(|| CoreError::not_found(format!("Message with id {} not found", id)))
    }
}
