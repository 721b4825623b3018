use std::collections::HashMap;

use async_trait::async_trait;
use burrow_db::models::{ChatMessage, Meeting, MemberStatus, Membership, User};
use parking_lot::RwLock;

use super::{ChatMessageStore, MeetingStore, MembershipStore, UserDirectory};
use crate::dao::base::{DaoError, DaoResult};

/// Process-local backend used by tests and the `memory` storage mode.
#[derive(Default)]
pub struct MemoryStore {
    meetings: RwLock<HashMap<String, Meeting>>,
    memberships: RwLock<HashMap<(String, String), Membership>>,
    messages: RwLock<Vec<ChatMessage>>,
    users: RwLock<HashMap<String, User>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_user(&self, user: User) {
        self.users.write().insert(user.id.clone(), user);
    }
}

#[async_trait]
impl MeetingStore for MemoryStore {
    async fn get(&self, meeting_id: &str) -> DaoResult<Option<Meeting>> {
        Ok(self.meetings.read().get(meeting_id).cloned())
    }

    async fn insert(&self, meeting: &Meeting, host: &Membership) -> DaoResult<()> {
        let mut meetings = self.meetings.write();
        if meetings.contains_key(&meeting.id) {
            return Err(DaoError::DuplicateKey(meeting.id.clone()));
        }
        meetings.insert(meeting.id.clone(), meeting.clone());
        self.memberships.write().insert(
            (host.meeting_id.clone(), host.user_id.clone()),
            host.clone(),
        );
        Ok(())
    }
}

#[async_trait]
impl MembershipStore for MemoryStore {
    async fn get(&self, meeting_id: &str, user_id: &str) -> DaoResult<Option<Membership>> {
        Ok(self
            .memberships
            .read()
            .get(&(meeting_id.to_string(), user_id.to_string()))
            .cloned())
    }

    async fn upsert(&self, membership: &Membership) -> DaoResult<()> {
        self.memberships.write().insert(
            (membership.meeting_id.clone(), membership.user_id.clone()),
            membership.clone(),
        );
        Ok(())
    }

    async fn list_by_meeting(&self, meeting_id: &str) -> DaoResult<Vec<Membership>> {
        let mut rows: Vec<Membership> = self
            .memberships
            .read()
            .values()
            .filter(|m| m.meeting_id == meeting_id)
            .cloned()
            .collect();
        rows.sort_by_key(|m| m.joined_at);
        Ok(rows)
    }

    async fn count_by_status(&self, meeting_id: &str, status: MemberStatus) -> DaoResult<u64> {
        Ok(self
            .memberships
            .read()
            .values()
            .filter(|m| m.meeting_id == meeting_id && m.status == status)
            .count() as u64)
    }
}

#[async_trait]
impl ChatMessageStore for MemoryStore {
    async fn insert(&self, message: &ChatMessage) -> DaoResult<()> {
        let mut messages = self.messages.write();
        if messages.iter().any(|m| m.message_id == message.message_id) {
            return Err(DaoError::DuplicateKey(message.message_id.clone()));
        }
        messages.push(message.clone());
        Ok(())
    }

    async fn update_text(&self, meeting_id: &str, message_id: &str, text: &str) -> DaoResult<bool> {
        let mut messages = self.messages.write();
        match messages
            .iter_mut()
            .find(|m| m.meeting_id == meeting_id && m.message_id == message_id)
        {
            Some(m) => {
                m.message = text.to_string();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete(&self, meeting_id: &str, message_id: &str) -> DaoResult<bool> {
        let mut messages = self.messages.write();
        let before = messages.len();
        messages.retain(|m| !(m.meeting_id == meeting_id && m.message_id == message_id));
        Ok(messages.len() != before)
    }

    async fn get(&self, meeting_id: &str, message_id: &str) -> DaoResult<Option<ChatMessage>> {
        Ok(self
            .messages
            .read()
            .iter()
            .find(|m| m.meeting_id == meeting_id && m.message_id == message_id)
            .cloned())
    }

    async fn page(&self, meeting_id: &str, offset: u64, limit: u64) -> DaoResult<Vec<ChatMessage>> {
        // Same order as the Mongo sort: date, then id, both descending.
        let mut rows: Vec<ChatMessage> = self
            .messages
            .read()
            .iter()
            .filter(|m| m.meeting_id == meeting_id)
            .cloned()
            .collect();
        rows.sort_by(|a, b| {
            b.date
                .cmp(&a.date)
                .then_with(|| b.message_id.cmp(&a.message_id))
        });
        Ok(rows
            .into_iter()
            .skip(usize::try_from(offset).unwrap_or(usize::MAX))
            .take(usize::try_from(limit).unwrap_or(usize::MAX))
            .collect())
    }

    async fn count(&self, meeting_id: &str) -> DaoResult<u64> {
        Ok(self
            .messages
            .read()
            .iter()
            .filter(|m| m.meeting_id == meeting_id)
            .count() as u64)
    }
}

#[async_trait]
impl UserDirectory for MemoryStore {
    async fn find_many(&self, user_ids: &[String]) -> DaoResult<Vec<User>> {
        let users = self.users.read();
        Ok(user_ids
            .iter()
            .filter_map(|id| users.get(id).cloned())
            .collect())
    }
}
