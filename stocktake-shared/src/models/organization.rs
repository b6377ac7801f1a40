//! Organization model and database operations
//!
//! An organization groups the users sharing one inventory. It is created by
//! its first owner and deleted when its last member leaves.
//!
//! # Schema
//!
//! ```sql
//! CREATE TABLE organizations (
//!     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
//!     name VARCHAR(100) NOT NULL,
//!     invite_code CHAR(6) NOT NULL,
//!     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
//!     CONSTRAINT organizations_invite_code_key UNIQUE (invite_code)
//! );
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgExecutor;
use uuid::Uuid;

/// Name of the unique constraint on invite codes
pub const INVITE_CODE_UNIQUE_CONSTRAINT: &str = "organizations_invite_code_key";

/// Organization row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Organization {
    /// Unique organization ID (UUID v4)
    pub id: Uuid,

    /// Display name
    pub name: String,

    /// Upper-case invite code, unique across organizations
    pub invite_code: String,

    /// When the organization was created
    pub created_at: DateTime<Utc>,
}

/// Input for creating a new organization
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateOrganization {
    /// Display name
    pub name: String,

    /// Pre-generated invite code
    pub invite_code: String,
}

/// Input for updating an organization
///
/// Only `Some` fields are written.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateOrganization {
    /// New name
    pub name: Option<String>,
}

impl Organization {
    /// Inserts an organization
    ///
    /// # Errors
    ///
    /// Fails with a unique violation on [`INVITE_CODE_UNIQUE_CONSTRAINT`] if
    /// the invite code is already taken.
    pub async fn create<'e, E>(executor: E, data: CreateOrganization) -> Result<Self, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query_as::<_, Organization>(
            r#"
            INSERT INTO organizations (name, invite_code)
            VALUES ($1, $2)
            RETURNING id, name, invite_code, created_at
            "#,
        )
        .bind(data.name)
        .bind(data.invite_code)
        .fetch_one(executor)
        .await
    }

    /// Finds an organization by ID
    pub async fn find_by_id<'e, E>(executor: E, id: Uuid) -> Result<Option<Self>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query_as::<_, Organization>(
            r#"
            SELECT id, name, invite_code, created_at
            FROM organizations
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(executor)
        .await
    }

    /// Finds an organization by its (already normalized) invite code
    pub async fn find_by_invite_code<'e, E>(executor: E, code: &str) -> Result<Option<Self>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query_as::<_, Organization>(
            r#"
            SELECT id, name, invite_code, created_at
            FROM organizations
            WHERE invite_code = $1
            "#,
        )
        .bind(code)
        .fetch_optional(executor)
        .await
    }

    /// Checks whether an invite code is in use
    pub async fn invite_code_exists<'e, E>(executor: E, code: &str) -> Result<bool, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM organizations WHERE invite_code = $1)")
            .bind(code)
            .fetch_one(executor)
            .await
    }

    /// Updates an organization
    ///
    /// Returns `None` if the organization doesn't exist. With no fields set
    /// the current row is returned unchanged.
    pub async fn update<'e, E>(
        executor: E,
        id: Uuid,
        data: UpdateOrganization,
    ) -> Result<Option<Self>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query_as::<_, Organization>(
            r#"
            UPDATE organizations
            SET name = COALESCE($2, name)
            WHERE id = $1
            RETURNING id, name, invite_code, created_at
            "#,
        )
        .bind(id)
        .bind(data.name)
        .fetch_optional(executor)
        .await
    }

    /// Replaces the invite code
    pub async fn update_invite_code<'e, E>(
        executor: E,
        id: Uuid,
        code: &str,
    ) -> Result<Option<Self>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query_as::<_, Organization>(
            r#"
            UPDATE organizations
            SET invite_code = $2
            WHERE id = $1
            RETURNING id, name, invite_code, created_at
            "#,
        )
        .bind(id)
        .bind(code)
        .fetch_optional(executor)
        .await
    }

    /// Deletes an organization
    ///
    /// Memberships cascade. Returns true if a row was removed.
    pub async fn delete<'e, E>(executor: E, id: Uuid) -> Result<bool, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let result = sqlx::query("DELETE FROM organizations WHERE id = $1")
            .bind(id)
            .execute(executor)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
