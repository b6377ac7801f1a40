//! PostgreSQL organization store
//!
//! Thin adapter from [`OrganizationStore`] to the query functions on the
//! models. Multi-statement operations run inside a transaction.
//!
//! # Example
//!
//! ```no_run
//! use stocktake_shared::db::pool::{create_pool, DatabaseConfig};
//! use stocktake_shared::store::{OrganizationStore, PgOrganizationStore};
//! use uuid::Uuid;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let pool = create_pool(DatabaseConfig::default()).await?;
//! let store = PgOrganizationStore::new(pool);
//!
//! let membership = store.find_membership_by_user(Uuid::new_v4()).await?;
//! assert!(membership.is_none());
//! # Ok(())
//! # }
//! ```

use async_trait::async_trait;
use sqlx::PgPool;
use tracing::debug;
use uuid::Uuid;

use super::{OrganizationStore, StoreResult};
use crate::models::{
    membership::{CreateMembership, Membership, MembershipRole},
    organization::{CreateOrganization, Organization, UpdateOrganization},
};

/// Organization store backed by a PostgreSQL pool
#[derive(Debug, Clone)]
pub struct PgOrganizationStore {
    pool: PgPool,
}

impl PgOrganizationStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Underlying connection pool
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl OrganizationStore for PgOrganizationStore {
    async fn find_membership_by_user(&self, user_id: Uuid) -> StoreResult<Option<Membership>> {
        Ok(Membership::find_by_user(&self.pool, user_id).await?)
    }

    async fn find_organization(&self, id: Uuid) -> StoreResult<Option<Organization>> {
        Ok(Organization::find_by_id(&self.pool, id).await?)
    }

    async fn find_organization_by_invite_code(&self, code: &str) -> StoreResult<Option<Organization>> {
        Ok(Organization::find_by_invite_code(&self.pool, code).await?)
    }

    async fn invite_code_exists(&self, code: &str) -> StoreResult<bool> {
        Ok(Organization::invite_code_exists(&self.pool, code).await?)
    }

    async fn list_members(&self, organization_id: Uuid) -> StoreResult<Vec<Membership>> {
        Ok(Membership::list_by_organization(&self.pool, organization_id).await?)
    }

    async fn create_organization_with_owner(
        &self,
        name: &str,
        invite_code: &str,
        owner_id: Uuid,
    ) -> StoreResult<(Organization, Membership)> {
        let mut tx = self.pool.begin().await?;

        let organization = Organization::create(
            &mut *tx,
            CreateOrganization {
                name: name.to_string(),
                invite_code: invite_code.to_string(),
            },
        )
        .await?;

        let membership = Membership::create(
            &mut *tx,
            CreateMembership {
                organization_id: organization.id,
                user_id: owner_id,
                role: MembershipRole::Owner,
            },
        )
        .await?;

        tx.commit().await?;

        debug!(organization_id = %organization.id, "Organization row committed");
        Ok((organization, membership))
    }

    async fn create_membership(
        &self,
        organization_id: Uuid,
        user_id: Uuid,
        role: MembershipRole,
    ) -> StoreResult<Membership> {
        Ok(Membership::create(
            &self.pool,
            CreateMembership {
                organization_id,
                user_id,
                role,
            },
        )
        .await?)
    }

    async fn delete_membership(&self, organization_id: Uuid, user_id: Uuid) -> StoreResult<bool> {
        Ok(Membership::delete(&self.pool, organization_id, user_id).await?)
    }

    async fn delete_organization(&self, id: Uuid) -> StoreResult<bool> {
        Ok(Organization::delete(&self.pool, id).await?)
    }

    async fn update_organization(
        &self,
        id: Uuid,
        data: UpdateOrganization,
    ) -> StoreResult<Option<Organization>> {
        Ok(Organization::update(&self.pool, id, data).await?)
    }

    async fn update_invite_code(&self, id: Uuid, code: &str) -> StoreResult<Option<Organization>> {
        Ok(Organization::update_invite_code(&self.pool, id, code).await?)
    }

    async fn transfer_ownership(
        &self,
        organization_id: Uuid,
        from_user: Uuid,
        to_user: Uuid,
    ) -> StoreResult<bool> {
        let mut tx = self.pool.begin().await?;

        let promoted =
            Membership::update_role(&mut *tx, organization_id, to_user, MembershipRole::Owner).await?;
        let demoted =
            Membership::update_role(&mut *tx, organization_id, from_user, MembershipRole::Admin).await?;

        if promoted.is_none() || demoted.is_none() {
            tx.rollback().await?;
            return Ok(false);
        }

        tx.commit().await?;
        Ok(true)
    }

    async fn health_check(&self) -> StoreResult<()> {
        Ok(crate::db::pool::health_check(&self.pool).await?)
    }
}
