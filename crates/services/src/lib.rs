pub mod auth;
pub mod chat;
pub mod dao;
pub mod error;
pub mod membership;
pub mod store;

pub use auth::{AuthError, AuthService, TokenVerifier};
pub use chat::{ChatHistory, ChatHistoryService};
pub use error::{ServiceError, ServiceResult};
pub use membership::{Attendee, ChatMember, MeetingDraft, MeetingOverview, MembershipManager};
pub use store::{MemoryStore, Stores};
