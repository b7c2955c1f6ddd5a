//! Role model and database operations
//!
//! # Schema
//!
//! ```sql
//! CREATE TABLE roles (
//!     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
//!     name TEXT NOT NULL UNIQUE,
//!     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
//!     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
//! );
//! ```
//!
//! Roles are open-ended: any name can be created through the API. Two names
//! carry authority semantics and are modeled as the closed [`WellKnownRole`]
//! set rather than string literals scattered through handlers. They are still
//! ordinary rows in the `roles` table, resolved by the unique name.

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::PgPool;
use uuid::Uuid;

/// The roles whose names carry authority semantics
///
/// - `CommunityAdmin` is assigned to a community's owner when the community
///   is created.
/// - `CommunityModerator` grants member-removal authority within the
///   communities where it is held.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WellKnownRole {
    CommunityAdmin,
    CommunityModerator,
}

impl WellKnownRole {
    /// The role's name in the `roles` table
    pub fn role_name(&self) -> &'static str {
        match self {
            WellKnownRole::CommunityAdmin => "Community Admin",
            WellKnownRole::CommunityModerator => "Community Moderator",
        }
    }
}

/// Role record
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Role {
    /// Unique role ID
    pub id: Uuid,

    /// Role name, unique across all roles
    pub name: String,

    /// When the role was created
    pub created_at: DateTime<Utc>,

    /// When the role was last updated
    pub updated_at: DateTime<Utc>,
}

impl Role {
    /// Creates a new role
    ///
    /// # Errors
    ///
    /// Returns an error if the name already exists (unique constraint
    /// violation).
    pub async fn create(pool: &PgPool, name: &str) -> Result<Self, sqlx::Error> {
        let role = sqlx::query_as::<_, Role>(
            r#"
            INSERT INTO roles (name)
            VALUES ($1)
            RETURNING id, name, created_at, updated_at
            "#,
        )
        .bind(name)
        .fetch_one(pool)
        .await?;

        Ok(role)
    }

    /// Finds a role by ID
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let role = sqlx::query_as::<_, Role>(
            r#"
            SELECT id, name, created_at, updated_at
            FROM roles
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(pool)
        .await?;

        Ok(role)
    }

    /// Resolves a well-known role to its row, if it has been created
    pub async fn find_well_known(
        pool: &PgPool,
        well_known: WellKnownRole,
    ) -> Result<Option<Self>, sqlx::Error> {
        let role = sqlx::query_as::<_, Role>(
            r#"
            SELECT id, name, created_at, updated_at
            FROM roles
            WHERE name = $1
            "#,
        )
        .bind(well_known.role_name())
        .fetch_optional(pool)
        .await?;

        Ok(role)
    }

    /// Resolves a well-known role, creating its row if absent
    ///
    /// The upsert is keyed on the unique role name, so concurrent callers
    /// racing to create the same role converge on a single row.
    pub async fn ensure_well_known(
        pool: &PgPool,
        well_known: WellKnownRole,
    ) -> Result<Self, sqlx::Error> {
        let role = sqlx::query_as::<_, Role>(
            r#"
            INSERT INTO roles (name)
            VALUES ($1)
            ON CONFLICT (name) DO UPDATE SET name = EXCLUDED.name
            RETURNING id, name, created_at, updated_at
            "#,
        )
        .bind(well_known.role_name())
        .fetch_one(pool)
        .await?;

        Ok(role)
    }

    /// Lists roles, oldest first
    pub async fn list(pool: &PgPool, limit: i64, offset: i64) -> Result<Vec<Self>, sqlx::Error> {
        let roles = sqlx::query_as::<_, Role>(
            r#"
            SELECT id, name, created_at, updated_at
            FROM roles
            ORDER BY created_at, id
            LIMIT $1 OFFSET $2
            "#,
        )
        .bind(limit)
        .bind(offset)
        .fetch_all(pool)
        .await?;

        Ok(roles)
    }

    /// Counts all roles
    pub async fn count(pool: &PgPool) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar("SELECT COUNT(*) FROM roles")
            .fetch_one(pool)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_well_known_role_names() {
        assert_eq!(
            WellKnownRole::CommunityAdmin.role_name(),
            "Community Admin"
        );
        assert_eq!(
            WellKnownRole::CommunityModerator.role_name(),
            "Community Moderator"
        );
    }
}
