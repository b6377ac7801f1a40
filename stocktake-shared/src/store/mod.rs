//! Organization storage interface
//!
//! Service operations never reach for a global database handle. They receive
//! an [`OrganizationStore`] and go through it for every read and write, so
//! the same logic runs against PostgreSQL in production and an in-memory
//! store in tests.
//!
//! # Implementations
//!
//! - [`postgres::PgOrganizationStore`]: sqlx over a `PgPool`
//! - [`memory::InMemoryOrganizationStore`]: maps behind a `RwLock`
//!
//! Both enforce the same uniqueness rules (one invite code per organization,
//! one organization per user) and report violations as
//! [`StoreError::InviteCodeTaken`] and [`StoreError::AlreadyMember`].

use async_trait::async_trait;
use uuid::Uuid;

use crate::models::{
    membership::{Membership, MembershipRole, USER_UNIQUE_CONSTRAINT},
    organization::{Organization, UpdateOrganization, INVITE_CODE_UNIQUE_CONSTRAINT},
};

pub mod memory;
pub mod postgres;

pub use memory::InMemoryOrganizationStore;
pub use postgres::PgOrganizationStore;

/// PostgreSQL SQLSTATE for unique_violation
const UNIQUE_VIOLATION: &str = "23505";

/// Storage result type alias
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors raised by an organization store
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Another organization already uses the invite code
    #[error("Invite code already in use")]
    InviteCodeTaken,

    /// The user already has a membership
    #[error("User already belongs to an organization")]
    AlreadyMember,

    /// Any other storage failure
    #[error("Database error: {0}")]
    Database(sqlx::Error),
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db_err) = &err {
            if db_err.code().as_deref() == Some(UNIQUE_VIOLATION) {
                match db_err.constraint() {
                    Some(INVITE_CODE_UNIQUE_CONSTRAINT) => return StoreError::InviteCodeTaken,
                    Some(USER_UNIQUE_CONSTRAINT) | Some("memberships_pkey") => {
                        return StoreError::AlreadyMember
                    }
                    _ => {}
                }
            }
        }

        StoreError::Database(err)
    }
}

/// Persistent store for organizations and memberships
#[async_trait]
pub trait OrganizationStore: Send + Sync {
    /// Finds the membership of a user, if any
    async fn find_membership_by_user(&self, user_id: Uuid) -> StoreResult<Option<Membership>>;

    /// Finds an organization by ID
    async fn find_organization(&self, id: Uuid) -> StoreResult<Option<Organization>>;

    /// Finds an organization by normalized invite code
    async fn find_organization_by_invite_code(&self, code: &str) -> StoreResult<Option<Organization>>;

    /// Checks whether any organization uses the code
    async fn invite_code_exists(&self, code: &str) -> StoreResult<bool>;

    /// Lists the members of an organization, oldest first
    async fn list_members(&self, organization_id: Uuid) -> StoreResult<Vec<Membership>>;

    /// Creates an organization and its owner membership in one unit
    async fn create_organization_with_owner(
        &self,
        name: &str,
        invite_code: &str,
        owner_id: Uuid,
    ) -> StoreResult<(Organization, Membership)>;

    /// Adds a user to an organization
    async fn create_membership(
        &self,
        organization_id: Uuid,
        user_id: Uuid,
        role: MembershipRole,
    ) -> StoreResult<Membership>;

    /// Removes a user from an organization
    async fn delete_membership(&self, organization_id: Uuid, user_id: Uuid) -> StoreResult<bool>;

    /// Deletes an organization together with its memberships
    async fn delete_organization(&self, id: Uuid) -> StoreResult<bool>;

    /// Applies an update to an organization
    async fn update_organization(
        &self,
        id: Uuid,
        data: UpdateOrganization,
    ) -> StoreResult<Option<Organization>>;

    /// Replaces the invite code of an organization
    async fn update_invite_code(&self, id: Uuid, code: &str) -> StoreResult<Option<Organization>>;

    /// Promotes `to_user` to owner and demotes `from_user` to admin in one unit
    ///
    /// Returns false, without changing anything, if either user is not a
    /// member of the organization.
    async fn transfer_ownership(
        &self,
        organization_id: Uuid,
        from_user: Uuid,
        to_user: Uuid,
    ) -> StoreResult<bool>;

    /// Verifies the store is reachable
    async fn health_check(&self) -> StoreResult<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_row_not_found_is_database_error() {
        let err = StoreError::from(sqlx::Error::RowNotFound);
        assert!(matches!(err, StoreError::Database(_)));
    }

    #[test]
    fn test_store_error_display() {
        assert_eq!(StoreError::InviteCodeTaken.to_string(), "Invite code already in use");
        assert_eq!(
            StoreError::AlreadyMember.to_string(),
            "User already belongs to an organization"
        );
    }
}
