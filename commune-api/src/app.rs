//! Application state and router builder
//!
//! # Router Layout
//!
//! ```text
//! /
//! ├── /health                        # Health check (public)
//! └── /v1/                           # API v1 (versioned)
//!     ├── /auth/
//!     │   ├── POST /signup           # Create account
//!     │   ├── POST /signin           # Sign in, receive bearer token
//!     │   └── GET  /me               # Caller profile (bearer)
//!     ├── /community/
//!     │   ├── POST /                 # Create community (bearer)
//!     │   ├── GET  /                 # List communities
//!     │   ├── GET  /:slug/members    # List a community's members
//!     │   ├── GET  /me/owner         # Owned communities (bearer)
//!     │   └── GET  /me/member        # Joined communities (bearer)
//!     ├── /role/
//!     │   ├── POST /                 # Create role
//!     │   └── GET  /                 # List roles
//!     └── /member/
//!         ├── POST   /               # Add member (bearer)
//!         └── DELETE /:id            # Remove member (bearer)
//! ```
//!
//! Unmatched routes render `{"error": "Page not found"}`. The rate limiter
//! wraps the whole router, the trace and CORS layers sit outside it.

use axum::{
    http::StatusCode,
    middleware::from_fn_with_state,
    response::IntoResponse,
    routing::{delete, get, post},
    Json, Router,
};
use serde_json::json;
use sqlx::PgPool;
use std::sync::Arc;
use std::time::Duration;
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

use crate::{
    config::Config,
    middleware::{auth::require_auth, rate_limit::RateLimiter},
    routes,
};

/// Shared application state
///
/// Cloned into each handler via Axum's `State` extractor; `Arc`s keep the
/// clone cheap.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool
    pub db: PgPool,

    /// Application configuration
    pub config: Arc<Config>,

    /// In-process request limiter
    pub rate_limiter: Arc<RateLimiter>,
}

impl AppState {
    /// Creates new application state
    pub fn new(db: PgPool, config: Config) -> Self {
        let rate_limiter = Arc::new(RateLimiter::new(
            config.rate_limit.max_requests as usize,
            Duration::from_secs(config.rate_limit.window_seconds),
        ));
        Self {
            db,
            config: Arc::new(config),
            rate_limiter,
        }
    }

    /// Gets the JWT secret for token operations
    pub fn jwt_secret(&self) -> &str {
        &self.config.jwt.secret
    }
}

/// Builds the complete Axum router with all routes and middleware
pub fn build_router(state: AppState) -> Router {
    let health_routes = Router::new().route("/health", get(routes::health::health_check));

    // Signup and signin are public; the profile requires a bearer token.
    let auth_routes = Router::new()
        .route("/signup", post(routes::auth::signup))
        .route("/signin", post(routes::auth::signin))
        .merge(
            Router::new()
                .route("/me", get(routes::auth::me))
                .layer(from_fn_with_state(state.clone(), require_auth)),
        );

    // Listings are public; creation and the caller-scoped listings are not.
    let community_routes = Router::new()
        .route("/", get(routes::community::list_communities))
        .route(
            "/:slug/members",
            get(routes::community::list_community_members),
        )
        .merge(
            Router::new()
                .route("/", post(routes::community::create_community))
                .route("/me/owner", get(routes::community::list_owned_communities))
                .route("/me/member", get(routes::community::list_joined_communities))
                .layer(from_fn_with_state(state.clone(), require_auth)),
        );

    let role_routes = Router::new().route(
        "/",
        post(routes::role::create_role).get(routes::role::list_roles),
    );

    let member_routes = Router::new()
        .route("/", post(routes::member::add_member))
        .route("/:id", delete(routes::member::remove_member))
        .layer(from_fn_with_state(state.clone(), require_auth));

    let v1_routes = Router::new()
        .nest("/auth", auth_routes)
        .nest("/community", community_routes)
        .nest("/role", role_routes)
        .nest("/member", member_routes);

    Router::new()
        .merge(health_routes)
        .nest("/v1", v1_routes)
        .fallback(page_not_found)
        .layer(from_fn_with_state(
            state.clone(),
            crate::middleware::rate_limit::rate_limit_layer,
        ))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Fallback for unmatched routes
async fn page_not_found() -> impl IntoResponse {
    (
        StatusCode::NOT_FOUND,
        Json(json!({ "error": "Page not found" })),
    )
}
