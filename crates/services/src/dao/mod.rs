pub mod base;
pub mod chat_message;
pub mod meeting;
pub mod membership;
pub mod user;

pub use base::BaseDao;
pub use chat_message::ChatMessageDao;
pub use meeting::MeetingDao;
pub use membership::MembershipDao;
pub use user::UserDao;
