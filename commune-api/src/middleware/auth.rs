//! Bearer-credential guard
//!
//! Axum middleware wrapping the resolution chain in
//! `commune_shared::auth::middleware`. On success the resolved user is
//! attached to the request as [`CurrentUser`]; on failure the request is
//! rejected with 401 and never reaches the handler.

use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::Response,
};

use crate::{app::AppState, error::ApiError};
use commune_shared::auth::middleware::resolve_bearer_user;
use commune_shared::models::user::User;

/// The authenticated user, attached to request extensions by [`require_auth`]
///
/// Handlers extract it with `Extension<CurrentUser>`.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub User);

/// Authentication middleware for protected routes
///
/// Resolves the `Authorization: Bearer <token>` header to a stored user and
/// inserts [`CurrentUser`] into request extensions.
///
/// # Errors
///
/// - 401 `NOT_SIGNEDIN`: header missing, malformed, or empty token
/// - 401 `INVALID_ACCESS_TOKEN`: verification failed or identity mismatch
pub async fn require_auth(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let auth_header = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok());

    let user = resolve_bearer_user(&state.db, state.jwt_secret(), auth_header).await?;

    req.extensions_mut().insert(CurrentUser(user));

    Ok(next.run(req).await)
}
