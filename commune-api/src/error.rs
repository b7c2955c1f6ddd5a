//! Error handling for the API server
//!
//! One unified error type that maps to HTTP responses. Handlers return
//! `Result<T, ApiError>` and use `?` throughout; the `From` impls at the
//! bottom turn store, auth, and authority failures into the right response.
//!
//! Validation and domain failures render the envelope
//! `{"status": false, "errors": [{"param"?, "message", "code"}]}`.
//! Internal failures are logged and render the fixed body
//! `{"error": "Internal server error"}` without leaking detail.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::fmt;

use commune_shared::auth::authorization::AuthzError;
use commune_shared::auth::jwt::JwtError;
use commune_shared::auth::middleware::AuthError;
use commune_shared::auth::password::PasswordError;

/// API result type alias
pub type ApiResult<T> = Result<T, ApiError>;

/// A single entry in a failure envelope's `errors` array
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorDetail {
    /// Request field the error refers to, when there is one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub param: Option<String>,

    /// Human-readable error message
    pub message: String,

    /// Machine-readable error code
    pub code: String,
}

/// Unified API error type
#[derive(Debug)]
pub enum ApiError {
    /// Request shape validation failed (400, `INVALID_INPUT` per field)
    Validation(Vec<ErrorDetail>),

    /// Signin credentials did not match (400, `INVALID_CREDENTIALS`)
    InvalidCredentials {
        /// Field the mismatch was detected on ("email" or "password")
        param: &'static str,
    },

    /// No usable bearer credential (401, `NOT_SIGNEDIN`)
    NotSignedIn,

    /// Bearer credential failed verification (401, `INVALID_ACCESS_TOKEN`)
    InvalidToken,

    /// A referenced entity does not exist (400, `RESOURCE_NOT_FOUND`)
    MissingReference {
        param: Option<&'static str>,
        message: String,
    },

    /// The addressed resource does not exist (404, `RESOURCE_NOT_FOUND`)
    NotFound(String),

    /// A uniqueness rule was violated (400, `RESOURCE_EXISTS`)
    AlreadyExists {
        param: Option<&'static str>,
        message: String,
    },

    /// The acting user lacks the required authority (403, `NOT_ALLOWED_ACCESS`)
    NotAllowed,

    /// Rate limit exceeded (429)
    TooManyRequests {
        /// Seconds until the client may retry
        retry_after: u64,
    },

    /// Unexpected failure (500, generic body)
    Internal(String),
}

impl ApiError {
    /// Builds the validation variant from `validator` output
    pub fn from_validation(errors: validator::ValidationErrors) -> Self {
        let details: Vec<ErrorDetail> = errors
            .field_errors()
            .iter()
            .flat_map(|(field, errors)| {
                errors.iter().map(move |error| ErrorDetail {
                    param: Some(field.to_string()),
                    message: error
                        .message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| "Validation failed".to_string()),
                    code: "INVALID_INPUT".to_string(),
                })
            })
            .collect();
        ApiError::Validation(details)
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::Validation(errors) => {
                write!(f, "Validation failed: {} errors", errors.len())
            }
            ApiError::InvalidCredentials { param } => {
                write!(f, "Invalid credentials: {}", param)
            }
            ApiError::NotSignedIn => write!(f, "Not signed in"),
            ApiError::InvalidToken => write!(f, "Invalid access token"),
            ApiError::MissingReference { message, .. } => write!(f, "Missing reference: {}", message),
            ApiError::NotFound(msg) => write!(f, "Not found: {}", msg),
            ApiError::AlreadyExists { message, .. } => write!(f, "Already exists: {}", message),
            ApiError::NotAllowed => write!(f, "Not allowed"),
            ApiError::TooManyRequests { .. } => write!(f, "Too many requests"),
            ApiError::Internal(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl std::error::Error for ApiError {}

/// Renders a `{"status": false, "errors": [...]}` failure envelope
fn failure(status: StatusCode, errors: Vec<ErrorDetail>) -> Response {
    let body = Json(json!({
        "status": false,
        "errors": errors,
    }));
    (status, body).into_response()
}

fn detail(param: Option<&str>, message: &str, code: &str) -> ErrorDetail {
    ErrorDetail {
        param: param.map(|p| p.to_string()),
        message: message.to_string(),
        code: code.to_string(),
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::Validation(errors) => failure(StatusCode::BAD_REQUEST, errors),
            ApiError::InvalidCredentials { param } => failure(
                StatusCode::BAD_REQUEST,
                vec![detail(
                    Some(param),
                    "The credentials you provided are invalid.",
                    "INVALID_CREDENTIALS",
                )],
            ),
            ApiError::NotSignedIn => failure(
                StatusCode::UNAUTHORIZED,
                vec![detail(None, "You need to sign in to proceed.", "NOT_SIGNEDIN")],
            ),
            ApiError::InvalidToken => failure(
                StatusCode::UNAUTHORIZED,
                vec![detail(None, "Auth token is invalid.", "INVALID_ACCESS_TOKEN")],
            ),
            ApiError::MissingReference { param, message } => failure(
                StatusCode::BAD_REQUEST,
                vec![detail(param, &message, "RESOURCE_NOT_FOUND")],
            ),
            ApiError::NotFound(message) => failure(
                StatusCode::NOT_FOUND,
                vec![detail(None, &message, "RESOURCE_NOT_FOUND")],
            ),
            ApiError::AlreadyExists { param, message } => failure(
                StatusCode::BAD_REQUEST,
                vec![detail(param, &message, "RESOURCE_EXISTS")],
            ),
            ApiError::NotAllowed => failure(
                StatusCode::FORBIDDEN,
                vec![detail(
                    Some("user"),
                    "You are not authorized to perform this action.",
                    "NOT_ALLOWED_ACCESS",
                )],
            ),
            ApiError::TooManyRequests { retry_after } => {
                let mut response = failure(
                    StatusCode::TOO_MANY_REQUESTS,
                    vec![detail(None, "Too many requests", "TOO_MANY_REQUESTS")],
                );
                if let Ok(value) = axum::http::HeaderValue::from_str(&retry_after.to_string()) {
                    response.headers_mut().insert("Retry-After", value);
                }
                response
            }
            ApiError::Internal(msg) => {
                // Log internal errors but never expose details to clients
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({ "error": "Internal server error" })),
                )
                    .into_response()
            }
        }
    }
}

/// Convert sqlx errors to API errors
///
/// Unique-constraint violations are the storage layer acting as the source
/// of truth for uniqueness invariants; each known constraint maps to the
/// same conflict error the handler pre-checks produce.
impl From<sqlx::Error> for ApiError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => ApiError::NotFound("Resource not found.".to_string()),
            sqlx::Error::Database(db_err) => {
                if let Some(constraint) = db_err.constraint() {
                    return match constraint {
                        "users_email_key" => ApiError::AlreadyExists {
                            param: Some("email"),
                            message: "User with this email address already exists.".to_string(),
                        },
                        "communities_slug_key" => ApiError::AlreadyExists {
                            param: Some("name"),
                            message: "Community with this name already exists.".to_string(),
                        },
                        "roles_name_key" => ApiError::AlreadyExists {
                            param: Some("name"),
                            message: "Role with this name already exists.".to_string(),
                        },
                        "members_community_id_user_id_key" => ApiError::AlreadyExists {
                            param: None,
                            message: "User is already added in the community.".to_string(),
                        },
                        c if c.ends_with("_fkey") => ApiError::MissingReference {
                            param: None,
                            message: "Referenced resource not found.".to_string(),
                        },
                        c => ApiError::AlreadyExists {
                            param: None,
                            message: format!("Constraint violation: {}", c),
                        },
                    };
                }

                ApiError::Internal(format!("Database error: {}", db_err))
            }
            _ => ApiError::Internal(format!("Database error: {}", err)),
        }
    }
}

/// Convert bearer-resolution errors to API errors
impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::NotSignedIn => ApiError::NotSignedIn,
            AuthError::InvalidToken => ApiError::InvalidToken,
            AuthError::Database(e) => ApiError::Internal(format!("Database error: {}", e)),
        }
    }
}

/// Convert membership-authority errors to API errors
impl From<AuthzError> for ApiError {
    fn from(err: AuthzError) -> Self {
        match err {
            AuthzError::NotAllowed => ApiError::NotAllowed,
            AuthzError::Database(e) => ApiError::Internal(format!("Database error: {}", e)),
        }
    }
}

/// Convert token-creation errors to API errors
impl From<JwtError> for ApiError {
    fn from(err: JwtError) -> Self {
        ApiError::Internal(format!("Token operation failed: {}", err))
    }
}

/// Convert password errors to API errors
impl From<PasswordError> for ApiError {
    fn from(err: PasswordError) -> Self {
        ApiError::Internal(format!("Password operation failed: {}", err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ApiError::NotFound("Community not found.".to_string());
        assert_eq!(err.to_string(), "Not found: Community not found.");

        let err = ApiError::NotAllowed;
        assert_eq!(err.to_string(), "Not allowed");
    }

    #[test]
    fn test_error_detail_omits_absent_param() {
        let with_param = detail(Some("email"), "taken", "RESOURCE_EXISTS");
        let json = serde_json::to_string(&with_param).unwrap();
        assert!(json.contains("\"param\":\"email\""));

        let without_param = detail(None, "denied", "NOT_ALLOWED_ACCESS");
        let json = serde_json::to_string(&without_param).unwrap();
        assert!(!json.contains("param"));
    }

    #[test]
    fn test_status_codes() {
        assert_eq!(
            ApiError::NotSignedIn.into_response().status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            ApiError::InvalidToken.into_response().status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            ApiError::NotAllowed.into_response().status(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            ApiError::NotFound("x".into()).into_response().status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ApiError::AlreadyExists {
                param: None,
                message: "x".into()
            }
            .into_response()
            .status(),
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn test_rate_limit_response_carries_retry_after() {
        let response = ApiError::TooManyRequests { retry_after: 7 }.into_response();
        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(response.headers().get("Retry-After").unwrap(), "7");
    }
}
