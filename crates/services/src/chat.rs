use std::sync::Arc;

use bson::DateTime;
use burrow_config::ChatSettings;
use burrow_db::models::ChatMessage;
use tracing::debug;
use uuid::Uuid;

use crate::error::{ServiceError, ServiceResult};
use crate::store::ChatMessageStore;

/// One page of a meeting's chat, newest first.
#[derive(Debug, Clone)]
pub struct ChatHistory {
    pub page: u64,
    /// Total messages divided by page size, rounded down.
    pub page_count: u64,
    pub messages: Vec<ChatMessage>,
}

/// Persistence-facing half of the chat: create, edit, delete and page
/// through a meeting's messages.
#[derive(Clone)]
pub struct ChatHistoryService {
    messages: Arc<dyn ChatMessageStore>,
    page_size: u64,
    min_len: usize,
    max_len: usize,
}

impl ChatHistoryService {
    pub fn new(messages: Arc<dyn ChatMessageStore>, settings: &ChatSettings) -> Self {
        Self {
            messages,
            page_size: settings.page_size.max(1),
            min_len: settings.message_min_len,
            max_len: settings.message_max_len,
        }
    }

    pub fn page_size(&self) -> u64 {
        self.page_size
    }

    /// Length is counted in characters, not bytes.
    pub fn validate_message(&self, text: &str) -> ServiceResult<()> {
        let len = text.chars().count();
        if len < self.min_len || len > self.max_len {
            return Err(ServiceError::Validation("Invalid message.".to_string()));
        }
        Ok(())
    }

    pub async fn create(
        &self,
        meeting_id: &str,
        user_id: &str,
        text: &str,
    ) -> ServiceResult<ChatMessage> {
        self.validate_message(text)?;

        // v7 ids sort by creation time, which breaks date ties in paging.
        let message = ChatMessage {
            message_id: Uuid::now_v7().to_string(),
            meeting_id: meeting_id.to_string(),
            user_id: user_id.to_string(),
            message: text.to_string(),
            date: DateTime::now(),
        };
        self.messages.insert(&message).await?;

        debug!(meeting_id, user_id, message_id = %message.message_id, "Chat message stored");
        Ok(message)
    }

    pub async fn get(&self, meeting_id: &str, message_id: &str) -> ServiceResult<Option<ChatMessage>> {
        Ok(self.messages.get(meeting_id, message_id).await?)
    }

    pub async fn edit(&self, meeting_id: &str, message_id: &str, text: &str) -> ServiceResult<()> {
        self.validate_message(text)?;
        if !self.messages.update_text(meeting_id, message_id, text).await? {
            return Err(ServiceError::NotFound("Invalid message ID.".to_string()));
        }
        Ok(())
    }

    pub async fn delete(&self, meeting_id: &str, message_id: &str) -> ServiceResult<()> {
        if !self.messages.delete(meeting_id, message_id).await? {
            return Err(ServiceError::NotFound("Invalid message ID.".to_string()));
        }
        Ok(())
    }

    pub async fn history(&self, meeting_id: &str, page: u64) -> ServiceResult<ChatHistory> {
        let offset = page.saturating_mul(self.page_size);
        let messages = self.messages.page(meeting_id, offset, self.page_size).await?;
        let total = self.messages.count(meeting_id).await?;

        Ok(ChatHistory {
            page,
            page_count: total / self.page_size,
            messages,
        })
    }
}
