//! JSON frames exchanged over a meeting's chat socket.
//!
//! Clients send flat objects tagged by `action`; the server answers with
//! `{"action": TAG, "payload": ...}`.

use burrow_db::models::ChatMessage;
use burrow_services::{ChatHistory, ChatMember};
use serde::{Deserialize, Deserializer, Serialize};

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "action", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ClientAction {
    Authorize {
        #[serde(default)]
        token: Option<String>,
    },
    CreateMessage {
        #[serde(default)]
        message: Option<String>,
    },
    EditMessage {
        #[serde(default)]
        id: Option<String>,
        #[serde(default)]
        contents: Option<String>,
    },
    DeleteMessage {
        #[serde(default)]
        id: Option<String>,
    },
    ReceiveHistory {
        #[serde(default, deserialize_with = "lenient_page")]
        page: u64,
    },
    #[serde(other)]
    Unknown,
}

impl ClientAction {
    /// Returns `None` for frames that are not JSON objects. Action names are
    /// matched case-insensitively; objects without a usable action decode
    /// to [`ClientAction::Unknown`].
    pub fn decode(text: &str) -> Option<Self> {
        let mut value: serde_json::Value = serde_json::from_str(text).ok()?;
        let object = value.as_object_mut()?;

        match object.get("action").and_then(|a| a.as_str()) {
            Some(action) => {
                let upper = action.to_ascii_uppercase();
                object.insert("action".to_string(), serde_json::Value::String(upper));
            }
            None => return Some(ClientAction::Unknown),
        }

        Some(serde_json::from_value(value).unwrap_or(ClientAction::Unknown))
    }
}

/// Accepts `3`, `"3"` or anything else as page 0.
fn lenient_page<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(match value {
        serde_json::Value::Number(n) => n.as_u64().unwrap_or(0),
        serde_json::Value::String(s) => s.trim().parse().unwrap_or(0),
        _ => 0,
    })
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", content = "payload", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ServerEvent {
    Error(String),
    History(HistoryPayload),
    Members(Vec<MemberPayload>),
    NewMessage(MessagePayload),
    MessageUpdated(MessageUpdatedPayload),
    MessageDeleted(MessageDeletedPayload),
}

impl ServerEvent {
    pub fn error(message: impl Into<String>) -> Self {
        ServerEvent::Error(message.into())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessagePayload {
    pub message_id: String,
    pub meeting_id: String,
    pub user_id: String,
    pub message: String,
    /// Epoch milliseconds.
    pub date: i64,
}

impl From<ChatMessage> for MessagePayload {
    fn from(m: ChatMessage) -> Self {
        Self {
            message_id: m.message_id,
            meeting_id: m.meeting_id,
            user_id: m.user_id,
            message: m.message,
            date: m.date.timestamp_millis(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryPayload {
    pub page: u64,
    pub page_count: u64,
    pub messages: Vec<MessagePayload>,
}

impl From<ChatHistory> for HistoryPayload {
    fn from(h: ChatHistory) -> Self {
        Self {
            page: h.page,
            page_count: h.page_count,
            messages: h.messages.into_iter().map(MessagePayload::from).collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberPayload {
    pub user_id: String,
    pub name: String,
}

impl From<ChatMember> for MemberPayload {
    fn from(m: ChatMember) -> Self {
        Self {
            user_id: m.user_id,
            name: m.name,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageUpdatedPayload {
    pub message_id: String,
    pub new_message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageDeletedPayload {
    pub message_id: String,
}
