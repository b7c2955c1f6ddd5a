//! Bearer credential resolution
//!
//! Turns a request's `Authorization` header into a stored [`User`], or a
//! terminal [`AuthError`]. The chain is strictly linear — each step either
//! passes the request on or rejects it:
//!
//! 1. header absent or not `Bearer <token>` → [`AuthError::NotSignedIn`]
//! 2. empty token portion → [`AuthError::NotSignedIn`]
//! 3. signature/format/expiry failure → [`AuthError::InvalidToken`]
//! 4. no user with the payload's email → [`AuthError::InvalidToken`]
//! 5. stored id does not match the payload's user id → [`AuthError::InvalidToken`]
//!
//! Step 4 re-resolves the identity from the store rather than trusting the
//! payload, and step 5 guards against tokens minted for a since-rotated id.
//! The API crate wraps this in an axum middleware layer that attaches the
//! resolved user to the request.

use sqlx::PgPool;

use super::jwt::validate_token;
use crate::models::user::User;

/// Error type for bearer credential resolution
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// No usable bearer credential on the request
    #[error("You need to sign in to proceed.")]
    NotSignedIn,

    /// The credential failed verification or no longer maps to a user
    #[error("Auth token is invalid.")]
    InvalidToken,

    /// Database error during identity resolution
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Extracts the token portion of a `Bearer <token>` header value
pub fn parse_bearer(auth_header: Option<&str>) -> Result<&str, AuthError> {
    let header = auth_header.ok_or(AuthError::NotSignedIn)?;

    let token = header
        .strip_prefix("Bearer ")
        .ok_or(AuthError::NotSignedIn)?;

    if token.trim().is_empty() {
        return Err(AuthError::NotSignedIn);
    }

    Ok(token)
}

/// Resolves a bearer credential to the stored user it identifies
///
/// # Errors
///
/// Returns `NotSignedIn` or `InvalidToken` per the chain above; `Database`
/// only for store failures (surfaced as an internal error, not a 401).
pub async fn resolve_bearer_user(
    pool: &PgPool,
    secret: &str,
    auth_header: Option<&str>,
) -> Result<User, AuthError> {
    let token = parse_bearer(auth_header)?;

    let claims = validate_token(token, secret).map_err(|_| AuthError::InvalidToken)?;

    let user = User::find_by_email(pool, &claims.email)
        .await?
        .ok_or(AuthError::InvalidToken)?;

    if user.id != claims.sub {
        return Err(AuthError::InvalidToken);
    }

    Ok(user)
}
