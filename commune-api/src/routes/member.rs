//! Member endpoints — the privileged membership operations
//!
//! # Endpoints
//!
//! - `POST /v1/member` - Add a user to a community (owner only)
//! - `DELETE /v1/member/:id` - Remove a member (owner or moderator)
//!
//! Both endpoints require a bearer token; the authority rules live in
//! `commune_shared::auth::authorization`.

use axum::{
    extract::{Path, State},
    Extension, Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    middleware::auth::CurrentUser,
    response::{Ack, ApiResponse},
};
use commune_shared::auth::authorization::{authorize_member_addition, authorize_member_removal};
use commune_shared::models::community::Community;
use commune_shared::models::member::{CreateMember, Member};
use commune_shared::models::role::Role;
use commune_shared::models::user::User;

/// Add member request body
///
/// Ids arrive as opaque strings; one that does not parse can never match a
/// row, so it reports the same not-found error as a well-formed unknown id.
#[derive(Debug, Deserialize)]
pub struct AddMemberRequest {
    pub community: String,
    pub user: String,
    pub role: String,
}

/// Member as returned by the API
#[derive(Debug, Serialize)]
pub struct MemberData {
    pub id: Uuid,
    pub community: Uuid,
    pub user: Uuid,
    pub role: Uuid,
    pub created_at: DateTime<Utc>,
}

impl From<Member> for MemberData {
    fn from(m: Member) -> Self {
        Self {
            id: m.id,
            community: m.community_id,
            user: m.user_id,
            role: m.role_id,
            created_at: m.created_at,
        }
    }
}

fn missing(param: &'static str, message: &str) -> ApiError {
    ApiError::MissingReference {
        param: Some(param),
        message: message.to_string(),
    }
}

/// Add a user to a community
///
/// Only the community owner may add members; holders of "Community Admin"
/// or "Community Moderator" may not.
///
/// # Endpoint
///
/// ```text
/// POST /v1/member
/// Authorization: Bearer <token>
/// Content-Type: application/json
///
/// { "community": "<id>", "user": "<id>", "role": "<id>" }
/// ```
///
/// # Errors
///
/// - `400 RESOURCE_NOT_FOUND`: community, user, or role does not exist
///   (param names the field)
/// - `403 NOT_ALLOWED_ACCESS`: caller is not the community owner
/// - `400 RESOURCE_EXISTS`: the user is already a member
pub async fn add_member(
    State(state): State<AppState>,
    Extension(CurrentUser(acting_user)): Extension<CurrentUser>,
    Json(req): Json<AddMemberRequest>,
) -> ApiResult<Json<ApiResponse<MemberData>>> {
    let community_id = Uuid::parse_str(&req.community)
        .map_err(|_| missing("community", "Community not found."))?;
    let community = Community::find_by_id(&state.db, community_id)
        .await?
        .ok_or_else(|| missing("community", "Community not found."))?;

    let user_id = Uuid::parse_str(&req.user).map_err(|_| missing("user", "User not found."))?;
    let user = User::find_by_id(&state.db, user_id)
        .await?
        .ok_or_else(|| missing("user", "User not found."))?;

    let role_id = Uuid::parse_str(&req.role).map_err(|_| missing("role", "Role not found."))?;
    let role = Role::find_by_id(&state.db, role_id)
        .await?
        .ok_or_else(|| missing("role", "Role not found."))?;

    authorize_member_addition(&community, acting_user.id)?;

    // Friendlier error than the unique-constraint violation; the constraint
    // still catches a concurrent add racing past this check.
    if Member::find_by_community_and_user(&state.db, community.id, user.id)
        .await?
        .is_some()
    {
        return Err(ApiError::AlreadyExists {
            param: None,
            message: "User is already added in the community.".to_string(),
        });
    }

    let member = Member::create(
        &state.db,
        CreateMember {
            community_id: community.id,
            user_id: user.id,
            role_id: role.id,
        },
    )
    .await?;

    tracing::info!(
        member_id = %member.id,
        community_id = %community.id,
        user_id = %user.id,
        "member added"
    );

    Ok(Json(ApiResponse::data(MemberData::from(member))))
}

/// Remove a member from a community
///
/// Allowed to the owner of the member's community, or to a holder of the
/// "Community Moderator" role in that community.
///
/// # Endpoint
///
/// ```text
/// DELETE /v1/member/:id
/// Authorization: Bearer <token>
/// ```
///
/// # Errors
///
/// - `400 RESOURCE_NOT_FOUND`: no such member
/// - `403 NOT_ALLOWED_ACCESS`: caller is neither owner nor moderator
pub async fn remove_member(
    State(state): State<AppState>,
    Extension(CurrentUser(acting_user)): Extension<CurrentUser>,
    Path(id): Path<String>,
) -> ApiResult<Json<Ack>> {
    let member_id = Uuid::parse_str(&id).map_err(|_| ApiError::MissingReference {
        param: None,
        message: "Member not found.".to_string(),
    })?;
    let member = Member::find_by_id(&state.db, member_id)
        .await?
        .ok_or_else(|| ApiError::MissingReference {
            param: None,
            message: "Member not found.".to_string(),
        })?;

    authorize_member_removal(&state.db, &member, acting_user.id).await?;

    Member::delete(&state.db, member.id).await?;

    tracing::info!(
        member_id = %member.id,
        community_id = %member.community_id,
        removed_by = %acting_user.id,
        "member removed"
    );

    Ok(Json(Ack::ok()))
}
