//! Role endpoints
//!
//! # Endpoints
//!
//! - `POST /v1/role` - Create a role
//! - `GET /v1/role` - List roles
//!
//! Role names are unique; the `roles.name` index is the source of truth and
//! a duplicate create maps to `RESOURCE_EXISTS` with no pre-check.

use axum::{
    extract::{Query, State},
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    response::ApiResponse,
    routes::PageQuery,
};
use commune_shared::models::role::Role;

/// Create role request body
#[derive(Debug, Deserialize, Validate)]
pub struct CreateRoleRequest {
    #[validate(length(min = 2, max = 64, message = "Name should be at least 2 characters."))]
    pub name: String,
}

/// Role as returned by the API
#[derive(Debug, Serialize)]
pub struct RoleData {
    pub id: Uuid,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Role> for RoleData {
    fn from(role: Role) -> Self {
        Self {
            id: role.id,
            name: role.name,
            created_at: role.created_at,
            updated_at: role.updated_at,
        }
    }
}

/// Create a role
///
/// # Endpoint
///
/// ```text
/// POST /v1/role
/// Content-Type: application/json
///
/// { "name": "Community Moderator" }
/// ```
///
/// # Errors
///
/// - `400 INVALID_INPUT`: validation failed
/// - `400 RESOURCE_EXISTS`: role name already exists
pub async fn create_role(
    State(state): State<AppState>,
    Json(req): Json<CreateRoleRequest>,
) -> ApiResult<Json<ApiResponse<RoleData>>> {
    req.validate().map_err(ApiError::from_validation)?;

    let role = Role::create(&state.db, &req.name).await?;

    tracing::info!(role_id = %role.id, name = %role.name, "role created");

    Ok(Json(ApiResponse::data(RoleData::from(role))))
}

/// List roles
///
/// # Endpoint
///
/// ```text
/// GET /v1/role?page=1&perPage=10
/// ```
pub async fn list_roles(
    State(state): State<AppState>,
    Query(page): Query<PageQuery>,
) -> ApiResult<Json<ApiResponse<Vec<RoleData>>>> {
    let total = Role::count(&state.db).await?;
    let roles = Role::list(&state.db, page.limit(), page.offset()).await?;

    let data = roles.into_iter().map(RoleData::from).collect();

    Ok(Json(ApiResponse::with_meta(data, page.meta(total))))
}
