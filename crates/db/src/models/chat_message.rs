use bson::DateTime;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    #[serde(rename = "_id")]
    pub message_id: String,
    pub meeting_id: String,
    pub user_id: String,
    pub message: String,
    pub date: DateTime,
}

impl ChatMessage {
    pub const COLLECTION: &'static str = "chat_messages";
}
