//! Integration tests for the Commune API
//!
//! These tests drive the full router against a live PostgreSQL database
//! (`DATABASE_URL`), covering:
//! - Signup/signin flows and the bearer guard
//! - Community creation with its founding-admin side effect
//! - Membership authority (owner-only add, owner-or-moderator remove)
//! - Pagination, the 404 fallback, and rate limiting

mod common;

use axum::http::StatusCode;
use common::{
    first_error_code, unique_community_name, unique_email, unique_role_name, TestContext,
    TEST_JWT_SECRET,
};
use serde_json::json;
use uuid::Uuid;

use commune_shared::auth::jwt::validate_token;
use commune_shared::models::community::slugify;
use commune_shared::models::role::{Role, WellKnownRole};

/// Signup returns the created user and never the password
#[tokio::test]
async fn test_signup_returns_user_without_password() {
    let ctx = TestContext::new().await.unwrap();
    let email = unique_email();

    let (status, body) = ctx
        .send(
            "POST",
            "/v1/auth/signup",
            None,
            Some(json!({"name": "Jane Doe", "email": email, "password": "secret1"})),
        )
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], json!(true));
    assert_eq!(body["content"]["data"]["email"], json!(email));
    assert!(body["content"]["data"]["id"].is_string());

    let rendered = body.to_string();
    assert!(!rendered.contains("password"));
    assert!(!rendered.contains("secret1"));
}

/// A second signup with the same email is a conflict
#[tokio::test]
async fn test_signup_duplicate_email_conflicts() {
    let ctx = TestContext::new().await.unwrap();
    let email = unique_email();
    let payload = json!({"email": email, "password": "secret1"});

    let (status, _) = ctx
        .send("POST", "/v1/auth/signup", None, Some(payload.clone()))
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = ctx
        .send("POST", "/v1/auth/signup", None, Some(payload))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["status"], json!(false));
    assert_eq!(first_error_code(&body), "RESOURCE_EXISTS");
    assert_eq!(body["errors"][0]["param"], json!("email"));
}

/// Validation failures name the offending field
#[tokio::test]
async fn test_signup_validation_failure() {
    let ctx = TestContext::new().await.unwrap();

    let (status, body) = ctx
        .send(
            "POST",
            "/v1/auth/signup",
            None,
            Some(json!({"email": unique_email(), "password": "short"})),
        )
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(first_error_code(&body), "INVALID_INPUT");
    assert_eq!(body["errors"][0]["param"], json!("password"));
}

/// Signin rejects a wrong password and issues a verifiable token otherwise
#[tokio::test]
async fn test_signin_flow() {
    let ctx = TestContext::new().await.unwrap();
    let email = unique_email();

    let (status, signup_body) = ctx
        .send(
            "POST",
            "/v1/auth/signup",
            None,
            Some(json!({"email": email, "password": "secret1"})),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    let user_id = signup_body["content"]["data"]["id"].as_str().unwrap();

    // Wrong password
    let (status, body) = ctx
        .send(
            "POST",
            "/v1/auth/signin",
            None,
            Some(json!({"email": email, "password": "wrong-password"})),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(first_error_code(&body), "INVALID_CREDENTIALS");

    // Correct password: the token verifies back to the same identity
    let (status, body) = ctx
        .send(
            "POST",
            "/v1/auth/signin",
            None,
            Some(json!({"email": email, "password": "secret1"})),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let token = body["content"]["meta"]["access_token"].as_str().unwrap();
    let claims = validate_token(token, TEST_JWT_SECRET).unwrap();
    assert_eq!(claims.sub.to_string(), user_id);
    assert_eq!(claims.email, email);

    // The token works against the guard
    let (status, body) = ctx.send("GET", "/v1/auth/me", Some(token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["content"]["data"]["email"], json!(email));
}

/// The bearer guard rejects missing and invalid credentials differently
#[tokio::test]
async fn test_bearer_guard_rejections() {
    let ctx = TestContext::new().await.unwrap();

    let (status, body) = ctx.send("GET", "/v1/auth/me", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(first_error_code(&body), "NOT_SIGNEDIN");

    let (status, body) = ctx
        .send("GET", "/v1/auth/me", Some("not-a-real-token"), None)
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(first_error_code(&body), "INVALID_ACCESS_TOKEN");
}

/// Community creation derives the slug and seeds the founding admin member
#[tokio::test]
async fn test_create_community_with_founding_admin() {
    let ctx = TestContext::new().await.unwrap();
    let (owner, token) = ctx.seed_user("Community Owner").await.unwrap();
    let name = unique_community_name();
    let expected_slug = slugify(&name);

    let (status, body) = ctx
        .send(
            "POST",
            "/v1/community",
            Some(&token),
            Some(json!({"name": name})),
        )
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["content"]["data"]["slug"], json!(expected_slug));
    assert_eq!(
        body["content"]["data"]["owner"],
        json!(owner.id.to_string())
    );

    // The creator is the sole member, holding "Community Admin"
    let (status, body) = ctx
        .send(
            "GET",
            &format!("/v1/community/{}/members", expected_slug),
            None,
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["content"]["meta"]["total"], json!(1));
    assert_eq!(
        body["content"]["data"][0]["user"]["id"],
        json!(owner.id.to_string())
    );
    assert_eq!(
        body["content"]["data"][0]["role"]["name"],
        json!("Community Admin")
    );
}

/// Member listing for an unknown slug is a 404
#[tokio::test]
async fn test_community_members_unknown_slug() {
    let ctx = TestContext::new().await.unwrap();

    let (status, body) = ctx
        .send(
            "GET",
            &format!("/v1/community/no-such-slug-{}/members", Uuid::new_v4()),
            None,
            None,
        )
        .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(first_error_code(&body), "RESOURCE_NOT_FOUND");
}

/// Only the community owner may add members
#[tokio::test]
async fn test_add_member_is_owner_only() {
    let ctx = TestContext::new().await.unwrap();
    let (_owner, owner_token) = ctx.seed_user("Owner").await.unwrap();
    let (outsider, outsider_token) = ctx.seed_user("Outsider").await.unwrap();
    let (target, _) = ctx.seed_user("Target").await.unwrap();

    let (_, body) = ctx
        .send(
            "POST",
            "/v1/community",
            Some(&owner_token),
            Some(json!({"name": unique_community_name()})),
        )
        .await;
    let community_id = body["content"]["data"]["id"].as_str().unwrap().to_string();

    let (_, body) = ctx
        .send(
            "POST",
            "/v1/role",
            None,
            Some(json!({"name": unique_role_name()})),
        )
        .await;
    let role_id = body["content"]["data"]["id"].as_str().unwrap().to_string();

    // A non-owner is refused, even though they are authenticated
    let (status, body) = ctx
        .send(
            "POST",
            "/v1/member",
            Some(&outsider_token),
            Some(json!({"community": community_id, "user": target.id, "role": role_id})),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(first_error_code(&body), "NOT_ALLOWED_ACCESS");

    // The owner succeeds
    let (status, body) = ctx
        .send(
            "POST",
            "/v1/member",
            Some(&owner_token),
            Some(json!({"community": community_id, "user": target.id, "role": role_id})),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body["content"]["data"]["user"],
        json!(target.id.to_string())
    );

    // Adding the same pair again is a conflict
    let (status, body) = ctx
        .send(
            "POST",
            "/v1/member",
            Some(&owner_token),
            Some(json!({"community": community_id, "user": target.id, "role": role_id})),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(first_error_code(&body), "RESOURCE_EXISTS");

    // An unknown referent names the failing field
    let (status, body) = ctx
        .send(
            "POST",
            "/v1/member",
            Some(&owner_token),
            Some(json!({"community": Uuid::new_v4(), "user": outsider.id, "role": role_id})),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(first_error_code(&body), "RESOURCE_NOT_FOUND");
    assert_eq!(body["errors"][0]["param"], json!("community"));
}

/// Removal is allowed to the owner and to a community moderator, nobody else
#[tokio::test]
async fn test_remove_member_authority() {
    let ctx = TestContext::new().await.unwrap();
    let (_owner, owner_token) = ctx.seed_user("Owner").await.unwrap();
    let (member_b, member_b_token) = ctx.seed_user("Plain Member").await.unwrap();
    let (member_x, _) = ctx.seed_user("Removable Member").await.unwrap();
    let (moderator, moderator_token) = ctx.seed_user("Moderator").await.unwrap();

    let (_, body) = ctx
        .send(
            "POST",
            "/v1/community",
            Some(&owner_token),
            Some(json!({"name": unique_community_name()})),
        )
        .await;
    let community_id = body["content"]["data"]["id"].as_str().unwrap().to_string();

    let (_, body) = ctx
        .send(
            "POST",
            "/v1/role",
            None,
            Some(json!({"name": unique_role_name()})),
        )
        .await;
    let plain_role_id = body["content"]["data"]["id"].as_str().unwrap().to_string();

    let moderator_role = Role::ensure_well_known(&ctx.db, WellKnownRole::CommunityModerator)
        .await
        .unwrap();
    let moderator_role_id = moderator_role.id.to_string();

    let mut member_ids = std::collections::HashMap::new();
    for (user, role_id) in [
        (&member_b, plain_role_id.as_str()),
        (&member_x, plain_role_id.as_str()),
        (&moderator, moderator_role_id.as_str()),
    ] {
        let (status, body) = ctx
            .send(
                "POST",
                "/v1/member",
                Some(&owner_token),
                Some(json!({"community": community_id, "user": user.id, "role": role_id})),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        member_ids.insert(
            user.id,
            body["content"]["data"]["id"].as_str().unwrap().to_string(),
        );
    }

    // A plain member may not remove anyone
    let (status, body) = ctx
        .send(
            "DELETE",
            &format!("/v1/member/{}", member_ids[&member_x.id]),
            Some(&member_b_token),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(first_error_code(&body), "NOT_ALLOWED_ACCESS");

    // A moderator of the same community may
    let (status, body) = ctx
        .send(
            "DELETE",
            &format!("/v1/member/{}", member_ids[&member_x.id]),
            Some(&moderator_token),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"status": true}));

    // The owner may remove any member
    let (status, body) = ctx
        .send(
            "DELETE",
            &format!("/v1/member/{}", member_ids[&member_b.id]),
            Some(&owner_token),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"status": true}));

    // A removed member is gone
    let (status, body) = ctx
        .send(
            "DELETE",
            &format!("/v1/member/{}", member_ids[&member_b.id]),
            Some(&owner_token),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(first_error_code(&body), "RESOURCE_NOT_FOUND");
}

/// Member listings paginate deterministically in insertion order
#[tokio::test]
async fn test_member_listing_pagination() {
    let ctx = TestContext::new().await.unwrap();
    let (_owner, owner_token) = ctx.seed_user("Owner").await.unwrap();

    let name = unique_community_name();
    let (_, body) = ctx
        .send(
            "POST",
            "/v1/community",
            Some(&owner_token),
            Some(json!({"name": name})),
        )
        .await;
    let community_id = body["content"]["data"]["id"].as_str().unwrap().to_string();
    let slug = body["content"]["data"]["slug"].as_str().unwrap().to_string();

    let (_, body) = ctx
        .send(
            "POST",
            "/v1/role",
            None,
            Some(json!({"name": unique_role_name()})),
        )
        .await;
    let role_id = body["content"]["data"]["id"].as_str().unwrap().to_string();

    // Founding admin is member 1; add four more for five total
    let mut added = Vec::new();
    for i in 0..4 {
        let (user, _) = ctx.seed_user(&format!("Member {}", i)).await.unwrap();
        let (status, _) = ctx
            .send(
                "POST",
                "/v1/member",
                Some(&owner_token),
                Some(json!({"community": community_id, "user": user.id, "role": role_id})),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        added.push(user.id);
    }

    let (status, body) = ctx
        .send(
            "GET",
            &format!("/v1/community/{}/members?perPage=2&page=2", slug),
            None,
            None,
        )
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["content"]["meta"]["total"], json!(5));
    assert_eq!(body["content"]["meta"]["pages"], json!(3));
    assert_eq!(body["content"]["meta"]["page"], json!(2));

    // Page 2 of 5 rows at two per page holds rows 3 and 4: the second and
    // third added members (the founding admin is row 1).
    let rows = body["content"]["data"].as_array().unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0]["user"]["id"], json!(added[1].to_string()));
    assert_eq!(rows[1]["user"]["id"], json!(added[2].to_string()));
}

/// Unmatched routes render the fixed not-found body
#[tokio::test]
async fn test_unmatched_route_renders_page_not_found() {
    let ctx = TestContext::new().await.unwrap();

    let (status, body) = ctx.send("GET", "/v1/no-such-resource", None, None).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, json!({"error": "Page not found"}));
}

/// Requests past the per-client limit are rejected with 429
#[tokio::test]
async fn test_rate_limiter_rejects_excess_requests() {
    let ctx = TestContext::with_rate_limit(2).await.unwrap();

    for _ in 0..2 {
        let (status, _) = ctx.send("GET", "/health", None, None).await;
        assert_eq!(status, StatusCode::OK);
    }

    let (status, body) = ctx.send("GET", "/health", None, None).await;
    assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(first_error_code(&body), "TOO_MANY_REQUESTS");
}
