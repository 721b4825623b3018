use axum::extract::ws::Message;
use bson::DateTime;
use dashmap::DashMap;
use tokio::sync::mpsc;
use tracing::{debug, warn};

use super::protocol::ServerEvent;

/// Outbound half of a socket. A writer task drains it into the sink.
pub type SessionSender = mpsc::UnboundedSender<Message>;

/// One authorized connection inside a meeting's chat room.
#[derive(Debug, Clone)]
pub struct ChatSession {
    pub user_id: String,
    pub connection_id: String,
    pub sender: SessionSender,
    pub joined_at: DateTime,
}

/// Live chat rooms keyed by meeting id. A user may hold several sessions
/// in the same room (tabs, devices).
pub struct RoomRegistry {
    rooms: DashMap<String, Vec<ChatSession>>,
}

impl RoomRegistry {
    pub fn new() -> Self {
        Self {
            rooms: DashMap::new(),
        }
    }

    pub fn join(&self, meeting_id: &str, session: ChatSession) {
        debug!(
            meeting_id,
            user_id = %session.user_id,
            connection_id = %session.connection_id,
            "Session joined room"
        );
        self.rooms
            .entry(meeting_id.to_string())
            .or_default()
            .push(session);
    }

    /// Removes every session the user holds in the room and drops the room
    /// once it is empty. Returns how many sessions were removed.
    pub fn leave(&self, meeting_id: &str, user_id: &str) -> usize {
        let removed = match self.rooms.get_mut(meeting_id) {
            Some(mut sessions) => {
                let before = sessions.len();
                sessions.retain(|s| s.user_id != user_id);
                before - sessions.len()
            }
            None => 0,
        };
        self.rooms.remove_if(meeting_id, |_, sessions| sessions.is_empty());

        debug!(meeting_id, user_id, removed, "Sessions left room");
        removed
    }

    /// Delivers to every session present when the call started. Returns the
    /// number of sessions that accepted the event.
    pub fn broadcast(&self, meeting_id: &str, event: &ServerEvent) -> usize {
        let Some(message) = encode(event) else {
            return 0;
        };
        let targets: Vec<ChatSession> = self
            .rooms
            .get(meeting_id)
            .map(|sessions| sessions.clone())
            .unwrap_or_default();

        let mut delivered = 0;
        for session in targets {
            if session.sender.send(message.clone()).is_err() {
                debug!(
                    meeting_id,
                    connection_id = %session.connection_id,
                    "Dropping event for closed session"
                );
            } else {
                delivered += 1;
            }
        }
        delivered
    }

    pub fn send_to_connection(&self, meeting_id: &str, connection_id: &str, event: &ServerEvent) -> bool {
        let sender = self.rooms.get(meeting_id).and_then(|sessions| {
            sessions
                .iter()
                .find(|s| s.connection_id == connection_id)
                .map(|s| s.sender.clone())
        });
        match (sender, encode(event)) {
            (Some(sender), Some(message)) => sender.send(message).is_ok(),
            _ => false,
        }
    }

    pub fn room_count(&self) -> usize {
        self.rooms.len()
    }

    pub fn session_count(&self, meeting_id: &str) -> usize {
        self.rooms.get(meeting_id).map(|s| s.len()).unwrap_or(0)
    }
}

impl Default for RoomRegistry {
    fn default() -> Self {
        Self::new()
    }
}

pub(crate) fn encode(event: &ServerEvent) -> Option<Message> {
    match serde_json::to_string(event) {
        Ok(text) => Some(Message::text(text)),
        Err(e) => {
            warn!(%e, "Failed to encode chat event");
            None
        }
    }
}
