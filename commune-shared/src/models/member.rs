//! Member model and database operations
//!
//! A member row binds a user to a community with an assigned role.
//!
//! # Schema
//!
//! ```sql
//! CREATE TABLE members (
//!     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
//!     community_id UUID NOT NULL REFERENCES communities(id),
//!     user_id UUID NOT NULL REFERENCES users(id),
//!     role_id UUID NOT NULL REFERENCES roles(id),
//!     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
//!     CONSTRAINT members_community_id_user_id_key UNIQUE (community_id, user_id)
//! );
//! ```
//!
//! The composite unique constraint enforces at most one member row per
//! (community, user) pair. Concurrent inserts for the same pair can both pass
//! the handler's pre-check; the constraint is the real safety net, and its
//! violation is mapped to the same conflict error the pre-check produces.

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::PgPool;
use uuid::Uuid;

/// Member record
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Member {
    /// Unique member ID
    pub id: Uuid,

    /// Community the user belongs to
    pub community_id: Uuid,

    /// The user bound to the community
    pub user_id: Uuid,

    /// Role assigned within this community
    pub role_id: Uuid,

    /// When the membership was created
    pub created_at: DateTime<Utc>,
}

/// Member row joined with user and role names, for member listings
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct MemberWithNames {
    pub id: Uuid,
    pub community_id: Uuid,
    pub user_id: Uuid,
    pub user_name: Option<String>,
    pub role_id: Uuid,
    pub role_name: String,
    pub created_at: DateTime<Utc>,
}

/// Input for creating a new member
#[derive(Debug, Clone)]
pub struct CreateMember {
    pub community_id: Uuid,
    pub user_id: Uuid,
    pub role_id: Uuid,
}

impl Member {
    /// Creates a new member row
    ///
    /// # Errors
    ///
    /// Returns an error if the (community, user) pair already has a member
    /// row (unique constraint violation) or a referenced entity does not
    /// exist (foreign key violation).
    pub async fn create(pool: &PgPool, data: CreateMember) -> Result<Self, sqlx::Error> {
        let member = sqlx::query_as::<_, Member>(
            r#"
            INSERT INTO members (community_id, user_id, role_id)
            VALUES ($1, $2, $3)
            RETURNING id, community_id, user_id, role_id, created_at
            "#,
        )
        .bind(data.community_id)
        .bind(data.user_id)
        .bind(data.role_id)
        .fetch_one(pool)
        .await?;

        Ok(member)
    }

    /// Finds a member by ID
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let member = sqlx::query_as::<_, Member>(
            r#"
            SELECT id, community_id, user_id, role_id, created_at
            FROM members
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(pool)
        .await?;

        Ok(member)
    }

    /// Finds the member row for a (community, user) pair
    pub async fn find_by_community_and_user(
        pool: &PgPool,
        community_id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        let member = sqlx::query_as::<_, Member>(
            r#"
            SELECT id, community_id, user_id, role_id, created_at
            FROM members
            WHERE community_id = $1 AND user_id = $2
            "#,
        )
        .bind(community_id)
        .bind(user_id)
        .fetch_optional(pool)
        .await?;

        Ok(member)
    }

    /// Checks whether a user holds a specific role within a community
    pub async fn holds_role(
        pool: &PgPool,
        community_id: Uuid,
        user_id: Uuid,
        role_id: Uuid,
    ) -> Result<bool, sqlx::Error> {
        let exists: bool = sqlx::query_scalar(
            r#"
            SELECT EXISTS(
                SELECT 1 FROM members
                WHERE community_id = $1 AND user_id = $2 AND role_id = $3
            )
            "#,
        )
        .bind(community_id)
        .bind(user_id)
        .bind(role_id)
        .fetch_one(pool)
        .await?;

        Ok(exists)
    }

    /// Deletes a member row
    ///
    /// Returns true if a row was deleted, false if no such member existed.
    pub async fn delete(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM members WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Lists a community's members with user and role names, oldest first
    pub async fn list_by_community(
        pool: &PgPool,
        community_id: Uuid,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<MemberWithNames>, sqlx::Error> {
        let members = sqlx::query_as::<_, MemberWithNames>(
            r#"
            SELECT m.id, m.community_id, m.user_id, u.name AS user_name,
                   m.role_id, r.name AS role_name, m.created_at
            FROM members m
            JOIN users u ON u.id = m.user_id
            JOIN roles r ON r.id = m.role_id
            WHERE m.community_id = $1
            ORDER BY m.created_at, m.id
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(community_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(pool)
        .await?;

        Ok(members)
    }

    /// Counts a community's members
    pub async fn count_by_community(
        pool: &PgPool,
        community_id: Uuid,
    ) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar("SELECT COUNT(*) FROM members WHERE community_id = $1")
            .bind(community_id)
            .fetch_one(pool)
            .await
    }
}
