use axum::{
    Json,
    extract::{Path, State},
};
use burrow_db::models::{MeetingRole, MemberStatus, Membership};
use burrow_services::Attendee;
use serde::Serialize;

use crate::{error::ApiError, extractors::auth::AuthUser, state::AppState};

#[derive(Debug, Serialize)]
pub struct MembershipResponse {
    pub meeting_id: String,
    pub user_id: String,
    pub role: MeetingRole,
    pub status: MemberStatus,
    pub joined_at: i64,
    pub left_at: Option<i64>,
}

impl From<Membership> for MembershipResponse {
    fn from(m: Membership) -> Self {
        Self {
            meeting_id: m.meeting_id,
            user_id: m.user_id,
            role: m.role,
            status: m.status,
            joined_at: m.joined_at.timestamp_millis(),
            left_at: m.left_at.map(|t| t.timestamp_millis()),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct AttendeeUser {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Serialize)]
pub struct AttendeeResponse {
    pub membership: MembershipResponse,
    pub user: Option<AttendeeUser>,
}

#[derive(Debug, Serialize)]
pub struct LeaveResponse {
    pub left: bool,
    pub promoted: Option<MembershipResponse>,
}

pub async fn join(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(meeting_id): Path<String>,
) -> Result<Json<MembershipResponse>, ApiError> {
    let membership = state.memberships.join(&auth.user_id, &meeting_id).await?;
    Ok(Json(membership.into()))
}

pub async fn leave(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(meeting_id): Path<String>,
) -> Result<Json<LeaveResponse>, ApiError> {
    let promoted = state.memberships.leave(&auth.user_id, &meeting_id).await?;
    Ok(Json(LeaveResponse {
        left: true,
        promoted: promoted.map(MembershipResponse::from),
    }))
}

pub async fn ban(
    State(state): State<AppState>,
    auth: AuthUser,
    Path((meeting_id, user_id)): Path<(String, String)>,
) -> Result<Json<MembershipResponse>, ApiError> {
    require_moderator(&state, &meeting_id, &auth.user_id).await?;

    let membership = state
        .memberships
        .ban(&auth.user_id, &user_id, &meeting_id)
        .await?;
    Ok(Json(membership.into()))
}

pub async fn unban(
    State(state): State<AppState>,
    auth: AuthUser,
    Path((meeting_id, user_id)): Path<(String, String)>,
) -> Result<Json<MembershipResponse>, ApiError> {
    require_moderator(&state, &meeting_id, &auth.user_id).await?;

    let membership = state.memberships.unban(&user_id, &meeting_id).await?;
    Ok(Json(membership.into()))
}

pub async fn attendees(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(meeting_id): Path<String>,
) -> Result<Json<Vec<AttendeeResponse>>, ApiError> {
    let caller = state.memberships.membership(&meeting_id, &auth.user_id).await?;
    if !caller.is_some_and(|m| m.status == MemberStatus::Joined) {
        return Err(ApiError::Forbidden(
            "You must be in this meeting to view its attendees.".to_string(),
        ));
    }

    let attendees = state.memberships.attendees(&meeting_id).await?;
    Ok(Json(attendees.into_iter().map(to_attendee).collect()))
}

async fn require_moderator(state: &AppState, meeting_id: &str, user_id: &str) -> Result<(), ApiError> {
    let caller = state.memberships.membership(meeting_id, user_id).await?;
    match caller {
        Some(m) if m.is_moderator() => Ok(()),
        _ => Err(ApiError::Forbidden(
            "You do not have permission to moderate this meeting.".to_string(),
        )),
    }
}

fn to_attendee(attendee: Attendee) -> AttendeeResponse {
    AttendeeResponse {
        membership: attendee.membership.into(),
        user: attendee.user.map(|u| AttendeeUser {
            id: u.id,
            name: u.name,
        }),
    }
}
