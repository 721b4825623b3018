use std::collections::HashMap;
use std::sync::Arc;

use bson::DateTime;
use burrow_db::models::{Meeting, MeetingRole, MemberStatus, Membership, User};
use tracing::{info, warn};

use crate::error::{ServiceError, ServiceResult};
use crate::store::{MeetingStore, MembershipStore, Stores, UserDirectory};

const MEETING_ID_LEN: usize = 8;
const MIN_MEETING_MILLIS: i64 = 15 * 60 * 1000;
const DAY_MILLIS: i64 = 24 * 60 * 60 * 1000;

pub const MAX_TITLE_LEN: usize = 32;
pub const MAX_DESCRIPTION_LEN: usize = 256;
pub const MAX_LOCATION_LEN: usize = 64;
pub const MAX_TAGS: usize = 10;
pub const MAX_TAG_LEN: usize = 10;
pub const MAX_CAPACITY: u32 = 100;

/// An unchecked meeting submission.
#[derive(Debug, Clone)]
pub struct MeetingDraft {
    pub title: String,
    pub description: String,
    pub location: String,
    pub tags: Vec<String>,
    pub capacity: u32,
    pub beginning_time: DateTime,
    pub end_time: DateTime,
}

impl MeetingDraft {
    /// Every rule the draft breaks, in a stable order. Calendar days are UTC.
    pub fn problems(&self, now: DateTime) -> Vec<String> {
        let mut problems = Vec::new();

        let title_len = self.title.chars().count();
        if title_len == 0 || title_len > MAX_TITLE_LEN {
            problems.push(format!("Title must be between 1 and {MAX_TITLE_LEN} characters."));
        }
        if self.description.chars().count() > MAX_DESCRIPTION_LEN {
            problems.push(format!(
                "Description must be empty or at most {MAX_DESCRIPTION_LEN} characters."
            ));
        }
        if self.location.chars().count() > MAX_LOCATION_LEN {
            problems.push(format!(
                "Location must be empty or at most {MAX_LOCATION_LEN} characters."
            ));
        }
        if self.tags.len() > MAX_TAGS {
            problems.push(format!("At most {MAX_TAGS} tags are allowed."));
        }
        if self.tags.iter().any(|t| t.chars().count() > MAX_TAG_LEN) {
            problems.push(format!("Tags must be at most {MAX_TAG_LEN} characters."));
        }
        if self.capacity > MAX_CAPACITY {
            problems.push(format!("Capacity must be at most {MAX_CAPACITY}."));
        }

        let begin = self.beginning_time.timestamp_millis();
        let end = self.end_time.timestamp_millis();
        if begin <= now.timestamp_millis() {
            problems.push("Beginning time must be in the future.".to_string());
        }
        if end <= begin {
            problems.push("End time must be after the beginning time.".to_string());
        }
        if end - begin <= MIN_MEETING_MILLIS {
            problems.push("The meeting must last more than 15 minutes.".to_string());
        }
        if begin.div_euclid(DAY_MILLIS) != end.div_euclid(DAY_MILLIS) {
            problems.push("End time must be on the same day as the beginning time.".to_string());
        }

        problems
    }
}

/// A membership row with the identity it belongs to, when known.
#[derive(Debug, Clone)]
pub struct Attendee {
    pub membership: Membership,
    pub user: Option<User>,
}

/// Roster entry pushed to chat clients.
#[derive(Debug, Clone, PartialEq)]
pub struct ChatMember {
    pub user_id: String,
    pub name: String,
}

#[derive(Debug, Clone)]
pub struct MeetingOverview {
    pub meeting: Meeting,
    pub joined: u64,
    pub waiting: u64,
    pub membership: Option<Membership>,
}

/// Owns every membership state transition: join, leave with waitlist
/// promotion, ban and unban.
#[derive(Clone)]
pub struct MembershipManager {
    meetings: Arc<dyn MeetingStore>,
    memberships: Arc<dyn MembershipStore>,
    users: Arc<dyn UserDirectory>,
}

impl MembershipManager {
    pub fn new(stores: &Stores) -> Self {
        Self {
            meetings: stores.meetings.clone(),
            memberships: stores.memberships.clone(),
            users: stores.users.clone(),
        }
    }

    // ── Meetings ────────────────────────────────────────────────

    pub async fn create_meeting(&self, owner_id: &str, draft: MeetingDraft) -> ServiceResult<Meeting> {
        let now = DateTime::now();
        let problems = draft.problems(now);
        if !problems.is_empty() {
            return Err(ServiceError::Validation(problems.join(" ")));
        }

        let meeting = Meeting {
            id: nanoid::nanoid!(MEETING_ID_LEN),
            owner_id: owner_id.to_string(),
            title: draft.title,
            description: draft.description,
            location: draft.location,
            tags: draft.tags,
            capacity: draft.capacity,
            beginning_time: draft.beginning_time,
            end_time: draft.end_time,
            created_at: now,
        };
        let host = Membership::new(&meeting.id, owner_id, MeetingRole::Host, MemberStatus::Joined);
        self.meetings.insert(&meeting, &host).await?;

        info!(meeting_id = %meeting.id, owner_id, "Meeting created");
        Ok(meeting)
    }

    pub async fn meeting_overview(
        &self,
        meeting_id: &str,
        viewer_id: &str,
    ) -> ServiceResult<MeetingOverview> {
        let meeting = self.require_meeting(meeting_id).await?;
        let joined = self
            .memberships
            .count_by_status(meeting_id, MemberStatus::Joined)
            .await?;
        let waiting = self
            .memberships
            .count_by_status(meeting_id, MemberStatus::Waitlisted)
            .await?;
        let membership = self.memberships.get(meeting_id, viewer_id).await?;

        Ok(MeetingOverview {
            meeting,
            joined,
            waiting,
            membership,
        })
    }

    // ── Transitions ─────────────────────────────────────────────

    pub async fn join(&self, user_id: &str, meeting_id: &str) -> ServiceResult<Membership> {
        let meeting = self.require_meeting(meeting_id).await?;

        let mut row = match self.memberships.get(meeting_id, user_id).await? {
            None => Membership::new(meeting_id, user_id, MeetingRole::Member, MemberStatus::Joined),
            Some(row) => match row.status {
                MemberStatus::Banned => {
                    return Err(ServiceError::Forbidden(
                        "You are not authorized to join this meeting.".to_string(),
                    ));
                }
                MemberStatus::Joined | MemberStatus::Waitlisted => {
                    return Err(ServiceError::InvalidState(
                        "You cannot join this meeting again.".to_string(),
                    ));
                }
                MemberStatus::Left => row,
            },
        };

        row.status = self.admission_status(&meeting).await?;
        row.joined_at = DateTime::now();
        row.left_at = None;
        self.memberships.upsert(&row).await?;

        info!(meeting_id, user_id, status = row.status.as_str(), "Member joined");
        Ok(row)
    }

    /// Returns the waitlisted membership promoted into the freed seat, if any.
    pub async fn leave(&self, user_id: &str, meeting_id: &str) -> ServiceResult<Option<Membership>> {
        let mut row = match self.memberships.get(meeting_id, user_id).await? {
            Some(row) if row.status == MemberStatus::Joined => row,
            _ => {
                return Err(ServiceError::NotFound(
                    "You are not in this meeting.".to_string(),
                ));
            }
        };

        if row.role == MeetingRole::Host {
            return Err(ServiceError::InvalidState(
                "The host cannot leave their own meeting.".to_string(),
            ));
        }

        row.status = MemberStatus::Left;
        row.role = MeetingRole::Member;
        row.left_at = Some(DateTime::now());
        self.memberships.upsert(&row).await?;
        info!(meeting_id, user_id, "Member left");

        match self.promote_next(meeting_id).await {
            Ok(promoted) => Ok(promoted),
            Err(e) => {
                warn!(meeting_id, error = %e, "Waitlist promotion failed");
                Ok(None)
            }
        }
    }

    pub async fn ban(
        &self,
        moderator_id: &str,
        target_id: &str,
        meeting_id: &str,
    ) -> ServiceResult<Membership> {
        let moderator = self.memberships.get(meeting_id, moderator_id).await?;
        let target = self.memberships.get(meeting_id, target_id).await?;
        let (Some(moderator), Some(mut target)) = (moderator, target) else {
            return Err(ServiceError::InvalidState(
                "Both users must be part of the meeting.".to_string(),
            ));
        };

        if moderator.role == target.role {
            return Err(ServiceError::Forbidden(
                "You cannot ban a user with the same role.".to_string(),
            ));
        }
        if target.role == MeetingRole::Host {
            return Err(ServiceError::Forbidden(
                "You cannot ban the host of the meeting.".to_string(),
            ));
        }

        target.status = MemberStatus::Banned;
        target.role = MeetingRole::Member;
        target.left_at = Some(DateTime::now());
        self.memberships.upsert(&target).await?;

        info!(meeting_id, moderator_id, target_id, "Member banned");
        Ok(target)
    }

    pub async fn unban(&self, user_id: &str, meeting_id: &str) -> ServiceResult<Membership> {
        let mut row = match self.memberships.get(meeting_id, user_id).await? {
            Some(row) if row.status == MemberStatus::Banned => row,
            _ => {
                return Err(ServiceError::InvalidState(
                    "The user is not banned from this meeting.".to_string(),
                ));
            }
        };

        row.status = MemberStatus::Left;
        self.memberships.upsert(&row).await?;

        info!(meeting_id, user_id, "Member unbanned");
        Ok(row)
    }

    // ── Queries ─────────────────────────────────────────────────

    pub async fn membership(
        &self,
        meeting_id: &str,
        user_id: &str,
    ) -> ServiceResult<Option<Membership>> {
        Ok(self.memberships.get(meeting_id, user_id).await?)
    }

    /// Any row counts, whatever its status.
    pub async fn is_member(&self, user_id: &str, meeting_id: &str) -> ServiceResult<bool> {
        Ok(self.memberships.get(meeting_id, user_id).await?.is_some())
    }

    pub async fn attendees(&self, meeting_id: &str) -> ServiceResult<Vec<Attendee>> {
        let rows = self.memberships.list_by_meeting(meeting_id).await?;
        let mut users = self.users_by_id(&rows).await?;

        Ok(rows
            .into_iter()
            .map(|membership| {
                let user = users.remove(&membership.user_id);
                Attendee { membership, user }
            })
            .collect())
    }

    /// Roster for chat clients. Users without a directory entry are listed
    /// under their id.
    pub async fn chat_members(&self, meeting_id: &str) -> ServiceResult<Vec<ChatMember>> {
        let rows = self.memberships.list_by_meeting(meeting_id).await?;
        let users = self.users_by_id(&rows).await?;

        Ok(rows
            .into_iter()
            .map(|m| {
                let name = users
                    .get(&m.user_id)
                    .map(|u| u.name.clone())
                    .unwrap_or_else(|| m.user_id.clone());
                ChatMember {
                    user_id: m.user_id,
                    name,
                }
            })
            .collect())
    }

    // ── Internals ───────────────────────────────────────────────

    async fn require_meeting(&self, meeting_id: &str) -> ServiceResult<Meeting> {
        self.meetings
            .get(meeting_id)
            .await?
            .ok_or_else(|| ServiceError::NotFound("Meeting not found.".to_string()))
    }

    /// Capacity caps non-host seats only; the host's own JOINED row is
    /// never counted, so JOINED may reach capacity + 1.
    async fn admission_status(&self, meeting: &Meeting) -> ServiceResult<MemberStatus> {
        if meeting.is_unlimited() {
            return Ok(MemberStatus::Joined);
        }
        let seated = self
            .memberships
            .list_by_meeting(&meeting.id)
            .await?
            .iter()
            .filter(|m| m.status == MemberStatus::Joined && m.role != MeetingRole::Host)
            .count();
        if seated >= meeting.capacity as usize {
            Ok(MemberStatus::Waitlisted)
        } else {
            Ok(MemberStatus::Joined)
        }
    }

    /// Most recently waitlisted goes first.
    async fn promote_next(&self, meeting_id: &str) -> ServiceResult<Option<Membership>> {
        let next = self
            .memberships
            .list_by_meeting(meeting_id)
            .await?
            .into_iter()
            .filter(|m| m.status == MemberStatus::Waitlisted)
            .max_by_key(|m| m.joined_at);

        let Some(mut next) = next else {
            return Ok(None);
        };
        next.status = MemberStatus::Joined;
        self.memberships.upsert(&next).await?;

        info!(meeting_id, user_id = %next.user_id, "Promoted from waitlist");
        Ok(Some(next))
    }

    async fn users_by_id(&self, rows: &[Membership]) -> ServiceResult<HashMap<String, User>> {
        let ids: Vec<String> = rows.iter().map(|m| m.user_id.clone()).collect();
        Ok(self
            .users
            .find_many(&ids)
            .await?
            .into_iter()
            .map(|u| (u.id.clone(), u))
            .collect())
    }
}
