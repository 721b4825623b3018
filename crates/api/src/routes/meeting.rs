use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use bson::DateTime;
use burrow_services::{MeetingDraft, MeetingOverview};
use serde::{Deserialize, Serialize};
use validator::Validate;

use super::membership::MembershipResponse;
use crate::{error::ApiError, extractors::auth::AuthUser, state::AppState};

#[derive(Debug, Deserialize, Validate)]
pub struct CreateMeetingRequest {
    #[validate(length(min = 1, max = 32))]
    pub title: String,
    #[serde(default)]
    #[validate(length(max = 256))]
    pub description: String,
    #[serde(default)]
    #[validate(length(max = 64))]
    pub location: String,
    #[serde(default)]
    #[validate(length(max = 10))]
    pub tags: Vec<String>,
    #[serde(default)]
    #[validate(range(max = 100))]
    pub capacity: u32,
    /// Epoch milliseconds.
    pub beginning_time: i64,
    pub end_time: i64,
}

#[derive(Debug, Serialize)]
pub struct MeetingResponse {
    pub id: String,
    pub owner_id: String,
    pub title: String,
    pub description: String,
    pub location: String,
    pub tags: Vec<String>,
    pub capacity: u32,
    pub beginning_time: i64,
    pub end_time: i64,
    pub created_at: i64,
    pub joined: u64,
    pub waiting: u64,
    pub membership: Option<MembershipResponse>,
}

pub async fn create(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(body): Json<CreateMeetingRequest>,
) -> Result<(StatusCode, Json<MeetingResponse>), ApiError> {
    body.validate()?;

    let draft = MeetingDraft {
        title: body.title,
        description: body.description,
        location: body.location,
        tags: body.tags,
        capacity: body.capacity,
        beginning_time: DateTime::from_millis(body.beginning_time),
        end_time: DateTime::from_millis(body.end_time),
    };
    let meeting = state.memberships.create_meeting(&auth.user_id, draft).await?;
    let overview = state
        .memberships
        .meeting_overview(&meeting.id, &auth.user_id)
        .await?;

    Ok((StatusCode::CREATED, Json(to_response(overview))))
}

pub async fn get(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(meeting_id): Path<String>,
) -> Result<Json<MeetingResponse>, ApiError> {
    let overview = state
        .memberships
        .meeting_overview(&meeting_id, &auth.user_id)
        .await?;
    Ok(Json(to_response(overview)))
}

fn to_response(overview: MeetingOverview) -> MeetingResponse {
    let MeetingOverview {
        meeting,
        joined,
        waiting,
        membership,
    } = overview;

    MeetingResponse {
        id: meeting.id,
        owner_id: meeting.owner_id,
        title: meeting.title,
        description: meeting.description,
        location: meeting.location,
        tags: meeting.tags,
        capacity: meeting.capacity,
        beginning_time: meeting.beginning_time.timestamp_millis(),
        end_time: meeting.end_time.timestamp_millis(),
        created_at: meeting.created_at.timestamp_millis(),
        joined,
        waiting,
        membership: membership.map(MembershipResponse::from),
    }
}
