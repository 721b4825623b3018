use bson::{oid::ObjectId, DateTime};
use serde::{Deserialize, Serialize};

/// One user's standing in one meeting. There is exactly one row per
/// (meeting_id, user_id); state changes rewrite it in place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Membership {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub meeting_id: String,
    pub user_id: String,
    pub role: MeetingRole,
    pub status: MemberStatus,
    pub joined_at: DateTime,
    pub left_at: Option<DateTime>,
}

impl Membership {
    pub const COLLECTION: &'static str = "memberships";

    pub fn new(
        meeting_id: impl Into<String>,
        user_id: impl Into<String>,
        role: MeetingRole,
        status: MemberStatus,
    ) -> Self {
        Self {
            id: None,
            meeting_id: meeting_id.into(),
            user_id: user_id.into(),
            role,
            status,
            joined_at: DateTime::now(),
            left_at: None,
        }
    }

    pub fn is_moderator(&self) -> bool {
        matches!(self.role, MeetingRole::Host | MeetingRole::Moderator)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MeetingRole {
    Member,
    Moderator,
    Host,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MemberStatus {
    Joined,
    Left,
    Waitlisted,
    Banned,
}

impl MemberStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            MemberStatus::Joined => "JOINED",
            MemberStatus::Left => "LEFT",
            MemberStatus::Waitlisted => "WAITLISTED",
            MemberStatus::Banned => "BANNED",
        }
    }
}
