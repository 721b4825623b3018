use async_trait::async_trait;
use bson::doc;
use burrow_db::models::ChatMessage;
use mongodb::Database;

use super::base::{BaseDao, DaoResult};
use crate::store::ChatMessageStore;

pub struct ChatMessageDao {
    pub base: BaseDao<ChatMessage>,
}

impl ChatMessageDao {
    pub fn new(db: &Database) -> Self {
        Self {
            base: BaseDao::new(db, ChatMessage::COLLECTION),
        }
    }
}

#[async_trait]
impl ChatMessageStore for ChatMessageDao {
    async fn insert(&self, message: &ChatMessage) -> DaoResult<()> {
        self.base.insert_one(message).await
    }

    async fn update_text(&self, meeting_id: &str, message_id: &str, text: &str) -> DaoResult<bool> {
        self.base
            .update_one(
                doc! { "_id": message_id, "meeting_id": meeting_id },
                doc! { "$set": { "message": text } },
            )
            .await
    }

    async fn delete(&self, meeting_id: &str, message_id: &str) -> DaoResult<bool> {
        self.base
            .delete_one(doc! { "_id": message_id, "meeting_id": meeting_id })
            .await
    }

    async fn get(&self, meeting_id: &str, message_id: &str) -> DaoResult<Option<ChatMessage>> {
        self.base
            .find_one(doc! { "_id": message_id, "meeting_id": meeting_id })
            .await
    }

    async fn page(&self, meeting_id: &str, offset: u64, limit: u64) -> DaoResult<Vec<ChatMessage>> {
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        self.base
            .find_window(
                doc! { "meeting_id": meeting_id },
                doc! { "date": -1, "_id": -1 },
                offset,
                limit,
            )
            .await
    }

    async fn count(&self, meeting_id: &str) -> DaoResult<u64> {
        self.base.count(doc! { "meeting_id": meeting_id }).await
    }
}
