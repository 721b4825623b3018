//! Narrow persistence seams consumed by the membership and chat services.
//!
//! Each trait has a MongoDB implementation in [`crate::dao`] and an
//! in-process one in [`memory::MemoryStore`].

pub mod memory;

use std::sync::Arc;

use async_trait::async_trait;
use burrow_db::models::{ChatMessage, Meeting, MemberStatus, Membership, User};
use mongodb::Database;

use crate::dao::{ChatMessageDao, MeetingDao, MembershipDao, UserDao};
use crate::dao::base::DaoResult;
pub use memory::MemoryStore;

#[async_trait]
pub trait MeetingStore: Send + Sync {
    async fn get(&self, meeting_id: &str) -> DaoResult<Option<Meeting>>;

    /// Stores a new meeting together with its host's membership row.
    async fn insert(&self, meeting: &Meeting, host: &Membership) -> DaoResult<()>;
}

#[async_trait]
pub trait MembershipStore: Send + Sync {
    async fn get(&self, meeting_id: &str, user_id: &str) -> DaoResult<Option<Membership>>;

    /// Inserts or replaces the row keyed by (meeting_id, user_id).
    async fn upsert(&self, membership: &Membership) -> DaoResult<()>;

    async fn list_by_meeting(&self, meeting_id: &str) -> DaoResult<Vec<Membership>>;

    async fn count_by_status(&self, meeting_id: &str, status: MemberStatus) -> DaoResult<u64>;
}

#[async_trait]
pub trait ChatMessageStore: Send + Sync {
    async fn insert(&self, message: &ChatMessage) -> DaoResult<()>;

    async fn update_text(&self, meeting_id: &str, message_id: &str, text: &str) -> DaoResult<bool>;

    async fn delete(&self, meeting_id: &str, message_id: &str) -> DaoResult<bool>;

    async fn get(&self, meeting_id: &str, message_id: &str) -> DaoResult<Option<ChatMessage>>;

    /// Newest first.
    async fn page(&self, meeting_id: &str, offset: u64, limit: u64) -> DaoResult<Vec<ChatMessage>>;

    async fn count(&self, meeting_id: &str) -> DaoResult<u64>;
}

#[async_trait]
pub trait UserDirectory: Send + Sync {
    async fn find_many(&self, user_ids: &[String]) -> DaoResult<Vec<User>>;
}

/// The full set of stores a running service needs.
#[derive(Clone)]
pub struct Stores {
    pub meetings: Arc<dyn MeetingStore>,
    pub memberships: Arc<dyn MembershipStore>,
    pub messages: Arc<dyn ChatMessageStore>,
    pub users: Arc<dyn UserDirectory>,
}

impl Stores {
    pub fn mongo(db: &Database) -> Self {
        Self {
            meetings: Arc::new(MeetingDao::new(db)),
            memberships: Arc::new(MembershipDao::new(db)),
            messages: Arc::new(ChatMessageDao::new(db)),
            users: Arc::new(UserDao::new(db)),
        }
    }

    pub fn memory(store: Arc<MemoryStore>) -> Self {
        Self {
            meetings: store.clone(),
            memberships: store.clone(),
            messages: store.clone(),
            users: store,
        }
    }
}
