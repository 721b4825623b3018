pub mod chat_message;
pub mod meeting;
pub mod membership;
pub mod user;

pub use chat_message::ChatMessage;
pub use meeting::Meeting;
pub use membership::{MeetingRole, MemberStatus, Membership};
pub use user::User;
