//! Authentication endpoints
//!
//! # Endpoints
//!
//! - `POST /v1/auth/signup` - Create an account
//! - `POST /v1/auth/signin` - Sign in and receive a bearer token
//! - `GET /v1/auth/me` - The caller's profile (requires bearer token)

use axum::{extract::State, Extension, Json};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    middleware::auth::CurrentUser,
    response::{ApiResponse, Meta},
};
use commune_shared::auth::{jwt, password};
use commune_shared::models::user::{CreateUser, User};

/// Signup / signin request body
///
/// Both endpoints accept the same shape; `name` is only stored on signup.
#[derive(Debug, Deserialize, Validate)]
pub struct CredentialsRequest {
    /// Optional display name
    #[validate(length(min = 2, max = 64, message = "Name should be at least 2 characters."))]
    pub name: Option<String>,

    /// Email address
    #[validate(
        email(message = "Invalid email format."),
        length(max = 128, message = "Email must be at most 128 characters.")
    )]
    pub email: String,

    /// Plaintext password, hashed before storage
    #[validate(length(min = 6, max = 64, message = "Password should be at least 6 characters."))]
    pub password: String,
}

/// Public view of a user, returned by every auth endpoint
#[derive(Debug, Serialize)]
pub struct UserData {
    pub id: Uuid,
    pub name: Option<String>,
    pub email: String,
    pub created_at: DateTime<Utc>,
}

impl From<User> for UserData {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            name: user.name,
            email: user.email,
            created_at: user.created_at,
        }
    }
}

/// Create an account
///
/// # Endpoint
///
/// ```text
/// POST /v1/auth/signup
/// Content-Type: application/json
///
/// { "name": "Jane Doe", "email": "jane@example.com", "password": "secret1" }
/// ```
///
/// # Errors
///
/// - `400 INVALID_INPUT`: validation failed
/// - `400 RESOURCE_EXISTS`: email already registered
pub async fn signup(
    State(state): State<AppState>,
    Json(req): Json<CredentialsRequest>,
) -> ApiResult<Json<ApiResponse<UserData>>> {
    req.validate().map_err(ApiError::from_validation)?;

    // Friendlier error than the unique-index violation the insert would hit.
    if User::find_by_email(&state.db, &req.email).await?.is_some() {
        return Err(ApiError::AlreadyExists {
            param: Some("email"),
            message: "User with this email address already exists.".to_string(),
        });
    }

    let password_hash = password::hash_password(&req.password)?;

    let user = User::create(
        &state.db,
        CreateUser {
            name: req.name,
            email: req.email,
            password_hash,
        },
    )
    .await?;

    tracing::info!(user_id = %user.id, "user signed up");

    Ok(Json(ApiResponse::data(UserData::from(user))))
}

/// Sign in and receive a bearer token
///
/// # Endpoint
///
/// ```text
/// POST /v1/auth/signin
/// Content-Type: application/json
///
/// { "email": "jane@example.com", "password": "secret1" }
/// ```
///
/// The issued token expires one hour after signin.
///
/// # Errors
///
/// - `400 INVALID_INPUT`: validation failed
/// - `400 INVALID_CREDENTIALS`: unknown email or wrong password
pub async fn signin(
    State(state): State<AppState>,
    Json(req): Json<CredentialsRequest>,
) -> ApiResult<Json<ApiResponse<UserData>>> {
    req.validate().map_err(ApiError::from_validation)?;

    let user = User::find_by_email(&state.db, &req.email)
        .await?
        .ok_or(ApiError::InvalidCredentials { param: "email" })?;

    let valid = password::verify_password(&req.password, &user.password_hash)?;
    if !valid {
        return Err(ApiError::InvalidCredentials { param: "password" });
    }

    let claims = jwt::Claims::new(user.id, &user.email);
    let access_token = jwt::create_token(&claims, state.jwt_secret())?;

    tracing::info!(user_id = %user.id, "user signed in");

    Ok(Json(ApiResponse::with_meta(
        UserData::from(user),
        Meta::Token { access_token },
    )))
}

/// The caller's profile
///
/// # Endpoint
///
/// ```text
/// GET /v1/auth/me
/// Authorization: Bearer <token>
/// ```
pub async fn me(
    Extension(CurrentUser(user)): Extension<CurrentUser>,
) -> ApiResult<Json<ApiResponse<UserData>>> {
    Ok(Json(ApiResponse::data(UserData::from(user))))
}
