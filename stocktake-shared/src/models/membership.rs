//! Membership model and database operations
//!
//! A membership links one user to one organization with a role. A user
//! belongs to at most one organization at a time.
//!
//! # Schema
//!
//! ```sql
//! CREATE TYPE membership_role AS ENUM ('owner', 'admin', 'member');
//!
//! CREATE TABLE memberships (
//!     organization_id UUID NOT NULL REFERENCES organizations(id) ON DELETE CASCADE,
//!     user_id UUID NOT NULL,
//!     role membership_role NOT NULL DEFAULT 'member',
//!     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
//!     PRIMARY KEY (organization_id, user_id)
//! );
//!
//! CREATE UNIQUE INDEX memberships_user_id_key ON memberships (user_id);
//! ```
//!
//! # Roles
//!
//! - **owner**: Full control, can transfer ownership
//! - **admin**: Can rename the organization and rotate its invite code
//! - **member**: Read access to the organization
//!
//! The query functions accept any [`PgExecutor`], so they run equally against
//! the pool or inside a transaction.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgExecutor;
use uuid::Uuid;

/// Name of the unique index that keeps a user in a single organization
pub const USER_UNIQUE_CONSTRAINT: &str = "memberships_user_id_key";

/// Roles within an organization
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "membership_role", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum MembershipRole {
    /// Created the organization or received ownership
    Owner,

    /// Manages organization settings
    Admin,

    /// Regular member
    Member,
}

impl MembershipRole {
    /// Converts role to string for display
    pub fn as_str(&self) -> &'static str {
        match self {
            MembershipRole::Owner => "owner",
            MembershipRole::Admin => "admin",
            MembershipRole::Member => "member",
        }
    }
}

impl std::fmt::Display for MembershipRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Membership row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Membership {
    /// Organization ID
    pub organization_id: Uuid,

    /// User ID
    pub user_id: Uuid,

    /// Role within the organization
    pub role: MembershipRole,

    /// When the user joined
    pub created_at: DateTime<Utc>,
}

/// Input for creating a new membership
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateMembership {
    /// Organization ID
    pub organization_id: Uuid,

    /// User ID
    pub user_id: Uuid,

    /// Role to assign (defaults to Member)
    #[serde(default = "default_role")]
    pub role: MembershipRole,
}

fn default_role() -> MembershipRole {
    MembershipRole::Member
}

impl Membership {
    /// Inserts a membership
    ///
    /// # Errors
    ///
    /// Fails with a unique violation on [`USER_UNIQUE_CONSTRAINT`] if the user
    /// already belongs to an organization.
    pub async fn create<'e, E>(executor: E, data: CreateMembership) -> Result<Self, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query_as::<_, Membership>(
            r#"
            INSERT INTO memberships (organization_id, user_id, role)
            VALUES ($1, $2, $3)
            RETURNING organization_id, user_id, role, created_at
            "#,
        )
        .bind(data.organization_id)
        .bind(data.user_id)
        .bind(data.role)
        .fetch_one(executor)
        .await
    }

    /// Finds the membership of a user, whichever organization it is in
    pub async fn find_by_user<'e, E>(executor: E, user_id: Uuid) -> Result<Option<Self>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query_as::<_, Membership>(
            r#"
            SELECT organization_id, user_id, role, created_at
            FROM memberships
            WHERE user_id = $1
            "#,
        )
        .bind(user_id)
        .fetch_optional(executor)
        .await
    }

    /// Updates a user's role in an organization
    ///
    /// Returns `None` if the membership doesn't exist.
    pub async fn update_role<'e, E>(
        executor: E,
        organization_id: Uuid,
        user_id: Uuid,
        role: MembershipRole,
    ) -> Result<Option<Self>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query_as::<_, Membership>(
            r#"
            UPDATE memberships
            SET role = $3
            WHERE organization_id = $1 AND user_id = $2
            RETURNING organization_id, user_id, role, created_at
            "#,
        )
        .bind(organization_id)
        .bind(user_id)
        .bind(role)
        .fetch_optional(executor)
        .await
    }

    /// Deletes a membership
    ///
    /// Returns true if a row was removed.
    pub async fn delete<'e, E>(executor: E, organization_id: Uuid, user_id: Uuid) -> Result<bool, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let result = sqlx::query("DELETE FROM memberships WHERE organization_id = $1 AND user_id = $2")
            .bind(organization_id)
            .bind(user_id)
            .execute(executor)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Lists all members of an organization, oldest first
    pub async fn list_by_organization<'e, E>(
        executor: E,
        organization_id: Uuid,
    ) -> Result<Vec<Self>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query_as::<_, Membership>(
            r#"
            SELECT organization_id, user_id, role, created_at
            FROM memberships
            WHERE organization_id = $1
            ORDER BY created_at ASC
            "#,
        )
        .bind(organization_id)
        .fetch_all(executor)
        .await
    }
}
