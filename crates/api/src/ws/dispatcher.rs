use std::sync::Arc;

use axum::extract::ws::Message;
use bson::DateTime;
use burrow_services::{ChatHistoryService, MembershipManager, ServiceError, TokenVerifier};
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::protocol::{
    ClientAction, MemberPayload, MessageDeletedPayload, MessagePayload, MessageUpdatedPayload,
    ServerEvent,
};
use super::registry::{ChatSession, RoomRegistry, SessionSender, encode};
use crate::state::AppState;

pub const NOT_AUTHORIZED: &str = "You are not authorized.";
pub const INVALID_TOKEN: &str = "Invalid token.";
pub const NOT_IN_MEETING: &str = "You are not in this meeting!";
pub const INVALID_MESSAGE: &str = "Invalid message.";
pub const INVALID_ARGUMENTS: &str = "Invalid arguments.";
pub const INVALID_MESSAGE_ID: &str = "Invalid message ID.";
pub const CANNOT_EDIT: &str = "You do not have permission to edit this message.";
pub const CANNOT_DELETE: &str = "You do not have permission to delete this message.";
pub const SOMETHING_WENT_WRONG: &str = "Something went wrong.";

/// Everything a chat connection needs from the running service.
#[derive(Clone)]
pub struct ChatContext {
    pub verifier: Arc<dyn TokenVerifier>,
    pub memberships: MembershipManager,
    pub chat: ChatHistoryService,
    pub registry: Arc<RoomRegistry>,
}

impl From<&AppState> for ChatContext {
    fn from(state: &AppState) -> Self {
        Self {
            verifier: state.auth.clone(),
            memberships: state.memberships.clone(),
            chat: state.chat.clone(),
            registry: state.registry.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
enum ConnectionState {
    Unauthenticated,
    Authenticated { user_id: String },
    Terminated,
}

/// Per-socket protocol state machine. Frames are handled one at a time in
/// the order they arrive.
pub struct ChatConnection {
    ctx: ChatContext,
    meeting_id: String,
    connection_id: String,
    sender: SessionSender,
    state: ConnectionState,
}

impl ChatConnection {
    pub fn new(ctx: ChatContext, meeting_id: impl Into<String>, sender: SessionSender) -> Self {
        Self {
            ctx,
            meeting_id: meeting_id.into(),
            connection_id: Uuid::new_v4().to_string(),
            sender,
            state: ConnectionState::Unauthenticated,
        }
    }

    pub fn connection_id(&self) -> &str {
        &self.connection_id
    }

    pub fn user_id(&self) -> Option<&str> {
        match &self.state {
            ConnectionState::Authenticated { user_id } => Some(user_id),
            _ => None,
        }
    }

    pub async fn handle_text(&mut self, text: &str) {
        let Some(action) = ClientAction::decode(text) else {
            debug!(connection_id = %self.connection_id, "Ignoring non-object frame");
            return;
        };

        let user_id = match &self.state {
            ConnectionState::Terminated => return,
            ConnectionState::Unauthenticated => None,
            ConnectionState::Authenticated { user_id } => Some(user_id.clone()),
        };
        let Some(user_id) = user_id else {
            match action {
                ClientAction::Authorize { token } => self.authorize(token).await,
                _ => self.reply(ServerEvent::error(NOT_AUTHORIZED)),
            }
            return;
        };

        let result = match action {
            ClientAction::Authorize { .. } => {
                debug!(connection_id = %self.connection_id, "Already authorized");
                Ok(())
            }
            ClientAction::CreateMessage { message } => self.create_message(&user_id, message).await,
            ClientAction::EditMessage { id, contents } => {
                self.edit_message(&user_id, id, contents).await
            }
            ClientAction::DeleteMessage { id } => self.delete_message(&user_id, id).await,
            ClientAction::ReceiveHistory { page } => self.receive_history(page).await,
            ClientAction::Unknown => Ok(()),
        };

        if let Err(e) = result {
            warn!(
                meeting_id = %self.meeting_id,
                connection_id = %self.connection_id,
                error = %e,
                "Chat action failed"
            );
            self.reply(ServerEvent::error(SOMETHING_WENT_WRONG));
        }
    }

    /// Leaves the room if the connection had joined it. Safe to call twice.
    pub fn close(&mut self) {
        if let ConnectionState::Authenticated { user_id } = &self.state {
            self.ctx.registry.leave(&self.meeting_id, user_id);
            info!(
                meeting_id = %self.meeting_id,
                user_id = %user_id,
                connection_id = %self.connection_id,
                "Left chat"
            );
        }
        self.state = ConnectionState::Terminated;
    }

    // ── Actions ─────────────────────────────────────────────────

    async fn authorize(&mut self, token: Option<String>) {
        let verified = token.as_deref().map(|t| self.ctx.verifier.verify(t));
        let user_id = match verified {
            Some(Ok(user_id)) => user_id,
            _ => {
                self.reply(ServerEvent::error(INVALID_TOKEN));
                return;
            }
        };

        match self.ctx.memberships.is_member(&user_id, &self.meeting_id).await {
            Ok(true) => {}
            Ok(false) => {
                self.reply(ServerEvent::error(NOT_IN_MEETING));
                return;
            }
            Err(e) => {
                warn!(meeting_id = %self.meeting_id, error = %e, "Membership lookup failed");
                self.reply(ServerEvent::error(SOMETHING_WENT_WRONG));
                return;
            }
        }

        self.state = ConnectionState::Authenticated {
            user_id: user_id.clone(),
        };
        self.ctx.registry.join(
            &self.meeting_id,
            ChatSession {
                user_id: user_id.clone(),
                connection_id: self.connection_id.clone(),
                sender: self.sender.clone(),
                joined_at: DateTime::now(),
            },
        );
        info!(
            meeting_id = %self.meeting_id,
            user_id = %user_id,
            connection_id = %self.connection_id,
            "Joined chat"
        );

        if let Err(e) = self.announce_arrival().await {
            warn!(meeting_id = %self.meeting_id, error = %e, "Failed to greet session");
            self.reply(ServerEvent::error(SOMETHING_WENT_WRONG));
        }
    }

    async fn announce_arrival(&self) -> Result<(), ServiceError> {
        let members = self.ctx.memberships.chat_members(&self.meeting_id).await?;
        self.ctx.registry.broadcast(
            &self.meeting_id,
            &ServerEvent::Members(members.into_iter().map(MemberPayload::from).collect()),
        );

        let history = self.ctx.chat.history(&self.meeting_id, 0).await?;
        self.ctx.registry.send_to_connection(
            &self.meeting_id,
            &self.connection_id,
            &ServerEvent::History(history.into()),
        );
        Ok(())
    }

    async fn create_message(&self, user_id: &str, message: Option<String>) -> Result<(), ServiceError> {
        let Some(text) = message.filter(|m| self.ctx.chat.validate_message(m).is_ok()) else {
            self.reply(ServerEvent::error(INVALID_MESSAGE));
            return Ok(());
        };

        let stored = self.ctx.chat.create(&self.meeting_id, user_id, &text).await?;
        self.ctx
            .registry
            .broadcast(&self.meeting_id, &ServerEvent::NewMessage(MessagePayload::from(stored)));
        Ok(())
    }

    async fn edit_message(
        &self,
        user_id: &str,
        id: Option<String>,
        contents: Option<String>,
    ) -> Result<(), ServiceError> {
        let (Some(message_id), Some(contents)) = (parse_message_id(id), contents) else {
            self.reply(ServerEvent::error(INVALID_ARGUMENTS));
            return Ok(());
        };
        if self.ctx.chat.validate_message(&contents).is_err() {
            self.reply(ServerEvent::error(INVALID_MESSAGE));
            return Ok(());
        }

        let membership = self.ctx.memberships.membership(&self.meeting_id, user_id).await?;
        let message = self.ctx.chat.get(&self.meeting_id, &message_id).await?;
        let (Some(_), Some(message)) = (membership, message) else {
            self.reply(ServerEvent::error(INVALID_MESSAGE_ID));
            return Ok(());
        };
        if message.user_id != user_id {
            self.reply(ServerEvent::error(CANNOT_EDIT));
            return Ok(());
        }

        match self.ctx.chat.edit(&self.meeting_id, &message_id, &contents).await {
            Ok(()) => {}
            Err(ServiceError::NotFound(_)) => {
                self.reply(ServerEvent::error(INVALID_MESSAGE_ID));
                return Ok(());
            }
            Err(e) => return Err(e),
        }

        self.ctx.registry.broadcast(
            &self.meeting_id,
            &ServerEvent::MessageUpdated(MessageUpdatedPayload {
                message_id,
                new_message: contents,
            }),
        );
        Ok(())
    }

    async fn delete_message(&self, user_id: &str, id: Option<String>) -> Result<(), ServiceError> {
        let Some(message_id) = parse_message_id(id) else {
            self.reply(ServerEvent::error(INVALID_MESSAGE_ID));
            return Ok(());
        };

        let membership = self.ctx.memberships.membership(&self.meeting_id, user_id).await?;
        let message = self.ctx.chat.get(&self.meeting_id, &message_id).await?;
        let (Some(membership), Some(message)) = (membership, message) else {
            self.reply(ServerEvent::error(INVALID_MESSAGE_ID));
            return Ok(());
        };
        if message.user_id != user_id && !membership.is_moderator() {
            self.reply(ServerEvent::error(CANNOT_DELETE));
            return Ok(());
        }

        match self.ctx.chat.delete(&self.meeting_id, &message_id).await {
            Ok(()) => {}
            Err(ServiceError::NotFound(_)) => {
                self.reply(ServerEvent::error(INVALID_MESSAGE_ID));
                return Ok(());
            }
            Err(e) => return Err(e),
        }

        self.ctx.registry.broadcast(
            &self.meeting_id,
            &ServerEvent::MessageDeleted(MessageDeletedPayload { message_id }),
        );
        Ok(())
    }

    async fn receive_history(&self, page: u64) -> Result<(), ServiceError> {
        let history = self.ctx.chat.history(&self.meeting_id, page).await?;
        self.reply(ServerEvent::History(history.into()));
        Ok(())
    }

    // ── Helpers ─────────────────────────────────────────────────

    fn reply(&self, event: ServerEvent) {
        if let Some(message) = encode(&event) {
            send_or_log(&self.sender, message, &self.connection_id);
        }
    }
}

/// Normalizes to the hyphenated lowercase form ids are stored under.
fn parse_message_id(id: Option<String>) -> Option<String> {
    id.and_then(|raw| Uuid::parse_str(raw.trim()).ok())
        .map(|uuid| uuid.to_string())
}

fn send_or_log(sender: &SessionSender, message: Message, connection_id: &str) {
    if sender.send(message).is_err() {
        debug!(connection_id, "Reply dropped, socket writer gone");
    }
}
