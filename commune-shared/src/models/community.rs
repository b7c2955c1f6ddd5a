//! Community model and database operations
//!
//! # Schema
//!
//! ```sql
//! CREATE TABLE communities (
//!     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
//!     name TEXT NOT NULL,
//!     slug TEXT NOT NULL UNIQUE,
//!     owner UUID NOT NULL REFERENCES users(id),
//!     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
//!     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
//! );
//! ```
//!
//! The slug is derived from the name at creation time and is the public
//! lookup key for member listings. The unique index on `slug` is the source
//! of truth for slug collisions; two names that normalize to the same slug
//! fail at the storage layer, not in application code. The owner is fixed at
//! creation and never reassigned.

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::PgPool;
use uuid::Uuid;

/// Community record
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Community {
    /// Unique community ID
    pub id: Uuid,

    /// Display name
    pub name: String,

    /// URL-safe unique identifier derived from the name
    pub slug: String,

    /// User ID of the community owner
    pub owner: Uuid,

    /// When the community was created
    pub created_at: DateTime<Utc>,

    /// When the community was last updated
    pub updated_at: DateTime<Utc>,
}

/// Community row joined with the owner's display name, for listings
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct CommunityWithOwner {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
    pub owner: Uuid,
    pub owner_name: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a new community
#[derive(Debug, Clone)]
pub struct CreateCommunity {
    /// Display name
    pub name: String,

    /// Derived slug (see [`slugify`])
    pub slug: String,

    /// Owner's user ID
    pub owner: Uuid,
}

/// Derives a community slug from its name
///
/// Lowercases the name and collapses every whitespace run into a single
/// hyphen. The derivation is deterministic, so two names that normalize to
/// the same slug collide on the `communities.slug` unique index.
pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    let mut in_whitespace = false;
    for ch in name.to_lowercase().chars() {
        if ch.is_whitespace() {
            if !in_whitespace {
                slug.push('-');
            }
            in_whitespace = true;
        } else {
            slug.push(ch);
            in_whitespace = false;
        }
    }
    slug
}

impl Community {
    /// Creates a new community
    ///
    /// # Errors
    ///
    /// Returns an error if the slug already exists (unique constraint
    /// violation) or the owner does not exist (foreign key violation).
    pub async fn create(pool: &PgPool, data: CreateCommunity) -> Result<Self, sqlx::Error> {
        let community = sqlx::query_as::<_, Community>(
            r#"
            INSERT INTO communities (name, slug, owner)
            VALUES ($1, $2, $3)
            RETURNING id, name, slug, owner, created_at, updated_at
            "#,
        )
        .bind(data.name)
        .bind(data.slug)
        .bind(data.owner)
        .fetch_one(pool)
        .await?;

        Ok(community)
    }

    /// Finds a community by ID
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let community = sqlx::query_as::<_, Community>(
            r#"
            SELECT id, name, slug, owner, created_at, updated_at
            FROM communities
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(pool)
        .await?;

        Ok(community)
    }

    /// Finds a community by its slug
    pub async fn find_by_slug(pool: &PgPool, slug: &str) -> Result<Option<Self>, sqlx::Error> {
        let community = sqlx::query_as::<_, Community>(
            r#"
            SELECT id, name, slug, owner, created_at, updated_at
            FROM communities
            WHERE slug = $1
            "#,
        )
        .bind(slug)
        .fetch_optional(pool)
        .await?;

        Ok(community)
    }

    /// Checks whether `user_id` owns the community with `community_id`
    pub async fn is_owned_by(
        pool: &PgPool,
        community_id: Uuid,
        user_id: Uuid,
    ) -> Result<bool, sqlx::Error> {
        let exists: bool = sqlx::query_scalar(
            r#"
            SELECT EXISTS(
                SELECT 1 FROM communities
                WHERE id = $1 AND owner = $2
            )
            "#,
        )
        .bind(community_id)
        .bind(user_id)
        .fetch_one(pool)
        .await?;

        Ok(exists)
    }

    /// Lists communities with their owner's name, oldest first
    pub async fn list(
        pool: &PgPool,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<CommunityWithOwner>, sqlx::Error> {
        let communities = sqlx::query_as::<_, CommunityWithOwner>(
            r#"
            SELECT c.id, c.name, c.slug, c.owner, u.name AS owner_name,
                   c.created_at, c.updated_at
            FROM communities c
            JOIN users u ON u.id = c.owner
            ORDER BY c.created_at, c.id
            LIMIT $1 OFFSET $2
            "#,
        )
        .bind(limit)
        .bind(offset)
        .fetch_all(pool)
        .await?;

        Ok(communities)
    }

    /// Counts all communities
    pub async fn count(pool: &PgPool) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar("SELECT COUNT(*) FROM communities")
            .fetch_one(pool)
            .await
    }

    /// Lists communities owned by a user, oldest first
    pub async fn list_owned_by(
        pool: &PgPool,
        owner: Uuid,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Self>, sqlx::Error> {
        let communities = sqlx::query_as::<_, Community>(
            r#"
            SELECT id, name, slug, owner, created_at, updated_at
            FROM communities
            WHERE owner = $1
            ORDER BY created_at, id
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(owner)
        .bind(limit)
        .bind(offset)
        .fetch_all(pool)
        .await?;

        Ok(communities)
    }

    /// Counts communities owned by a user
    pub async fn count_owned_by(pool: &PgPool, owner: Uuid) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar("SELECT COUNT(*) FROM communities WHERE owner = $1")
            .bind(owner)
            .fetch_one(pool)
            .await
    }

    /// Lists communities the user has a membership in, oldest first
    pub async fn list_joined_by(
        pool: &PgPool,
        user_id: Uuid,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<CommunityWithOwner>, sqlx::Error> {
        let communities = sqlx::query_as::<_, CommunityWithOwner>(
            r#"
            SELECT c.id, c.name, c.slug, c.owner, u.name AS owner_name,
                   c.created_at, c.updated_at
            FROM communities c
            JOIN members m ON m.community_id = c.id
            JOIN users u ON u.id = c.owner
            WHERE m.user_id = $1
            ORDER BY c.created_at, c.id
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(user_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(pool)
        .await?;

        Ok(communities)
    }

    /// Counts communities the user has a membership in
    pub async fn count_joined_by(pool: &PgPool, user_id: Uuid) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar("SELECT COUNT(*) FROM members WHERE user_id = $1")
            .bind(user_id)
            .fetch_one(pool)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slugify_lowercases() {
        assert_eq!(slugify("MyCommunity"), "mycommunity");
    }

    #[test]
    fn test_slugify_replaces_whitespace_with_hyphen() {
        assert_eq!(slugify("My Community"), "my-community");
    }

    #[test]
    fn test_slugify_collapses_whitespace_runs() {
        assert_eq!(slugify("Mixed   Case \t Name"), "mixed-case-name");
    }

    #[test]
    fn test_slugify_is_deterministic() {
        assert_eq!(slugify("Rust  Users"), slugify("rust users"));
    }
}
