//! The membership authority
//!
//! This module decides whether an acting user may add or remove a member of
//! a community. It is the one piece of real domain logic in the system;
//! handlers delegate their permission checks here and only orchestrate
//! lookups and persistence around the answer.
//!
//! # Authority Model
//!
//! - **Adding a member** is owner-only. Holders of "Community Admin" or
//!   "Community Moderator" may NOT add members. The asymmetry with removal
//!   is deliberate and load-bearing: ownership is the sole source of
//!   invitation authority.
//! - **Removing a member** is allowed to the owner of the member's
//!   community, or to any user holding the well-known "Community Moderator"
//!   role in that same community. The owner rule is evaluated first.
//! - Moderator authority is scoped per community: holding the role in one
//!   community grants nothing in another.
//!
//! If the "Community Moderator" role row has never been created, the
//! moderator rule cannot match anyone and removal authority collapses to
//! owner-only. That case is an ordinary denial, not an internal error.

use sqlx::PgPool;
use uuid::Uuid;

use crate::models::community::Community;
use crate::models::member::Member;
use crate::models::role::{Role, WellKnownRole};

/// Error type for authority checks
#[derive(Debug, thiserror::Error)]
pub enum AuthzError {
    /// The acting user does not hold the required authority
    #[error("You are not authorized to perform this action.")]
    NotAllowed,

    /// Database error while evaluating authority
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Checks whether `acting_user` may add a member to `community`
///
/// Only the community owner may add members.
pub fn authorize_member_addition(
    community: &Community,
    acting_user: Uuid,
) -> Result<(), AuthzError> {
    if community.owner == acting_user {
        Ok(())
    } else {
        Err(AuthzError::NotAllowed)
    }
}

/// Checks whether `acting_user` may remove `member` from its community
///
/// Authorized if the acting user owns the member's community, or holds the
/// well-known "Community Moderator" role in that community. The owner check
/// runs first; the moderator check only runs for non-owners.
///
/// # Errors
///
/// Returns `NotAllowed` if neither rule holds — including when the
/// moderator role row does not exist — and `Database` on store failures.
pub async fn authorize_member_removal(
    pool: &PgPool,
    member: &Member,
    acting_user: Uuid,
) -> Result<(), AuthzError> {
    if Community::is_owned_by(pool, member.community_id, acting_user).await? {
        return Ok(());
    }

    // Without the moderator role row nobody can hold it, so the rule is
    // unsatisfiable and the non-owner is denied.
    let Some(moderator) = Role::find_well_known(pool, WellKnownRole::CommunityModerator).await?
    else {
        return Err(AuthzError::NotAllowed);
    };

    if Member::holds_role(pool, member.community_id, acting_user, moderator.id).await? {
        Ok(())
    } else {
        Err(AuthzError::NotAllowed)
    }
}
