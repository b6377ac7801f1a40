//! In-memory organization store
//!
//! Keeps organizations and memberships in process memory. Used by the test
//! suites and for running the API locally without PostgreSQL. It enforces
//! the same unique constraints as the database schema.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{OrganizationStore, StoreError, StoreResult};
use crate::models::{
    membership::{Membership, MembershipRole},
    organization::{Organization, UpdateOrganization},
};

#[derive(Debug, Default)]
struct State {
    organizations: HashMap<Uuid, Organization>,
    /// Insertion order doubles as join order
    memberships: Vec<Membership>,
}

impl State {
    fn code_taken(&self, code: &str, except: Option<Uuid>) -> bool {
        self.organizations
            .values()
            .any(|org| org.invite_code == code && Some(org.id) != except)
    }

    fn has_membership(&self, user_id: Uuid) -> bool {
        self.memberships.iter().any(|m| m.user_id == user_id)
    }
}

/// Organization store kept in memory
#[derive(Debug, Default)]
pub struct InMemoryOrganizationStore {
    state: RwLock<State>,
}

impl InMemoryOrganizationStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of organizations currently stored
    pub async fn organization_count(&self) -> usize {
        self.state.read().await.organizations.len()
    }
}

#[async_trait]
impl OrganizationStore for InMemoryOrganizationStore {
    async fn find_membership_by_user(&self, user_id: Uuid) -> StoreResult<Option<Membership>> {
        let state = self.state.read().await;
        Ok(state.memberships.iter().find(|m| m.user_id == user_id).cloned())
    }

    async fn find_organization(&self, id: Uuid) -> StoreResult<Option<Organization>> {
        Ok(self.state.read().await.organizations.get(&id).cloned())
    }

    async fn find_organization_by_invite_code(&self, code: &str) -> StoreResult<Option<Organization>> {
        let state = self.state.read().await;
        Ok(state
            .organizations
            .values()
            .find(|org| org.invite_code == code)
            .cloned())
    }

    async fn invite_code_exists(&self, code: &str) -> StoreResult<bool> {
        Ok(self.state.read().await.code_taken(code, None))
    }

    async fn list_members(&self, organization_id: Uuid) -> StoreResult<Vec<Membership>> {
        let state = self.state.read().await;
        Ok(state
            .memberships
            .iter()
            .filter(|m| m.organization_id == organization_id)
            .cloned()
            .collect())
    }

    async fn create_organization_with_owner(
        &self,
        name: &str,
        invite_code: &str,
        owner_id: Uuid,
    ) -> StoreResult<(Organization, Membership)> {
        let mut state = self.state.write().await;

        if state.code_taken(invite_code, None) {
            return Err(StoreError::InviteCodeTaken);
        }
        if state.has_membership(owner_id) {
            return Err(StoreError::AlreadyMember);
        }

        let now = Utc::now();
        let organization = Organization {
            id: Uuid::new_v4(),
            name: name.to_string(),
            invite_code: invite_code.to_string(),
            created_at: now,
        };
        let membership = Membership {
            organization_id: organization.id,
            user_id: owner_id,
            role: MembershipRole::Owner,
            created_at: now,
        };

        state.organizations.insert(organization.id, organization.clone());
        state.memberships.push(membership.clone());

        Ok((organization, membership))
    }

    async fn create_membership(
        &self,
        organization_id: Uuid,
        user_id: Uuid,
        role: MembershipRole,
    ) -> StoreResult<Membership> {
        let mut state = self.state.write().await;

        if state.has_membership(user_id) {
            return Err(StoreError::AlreadyMember);
        }
        if !state.organizations.contains_key(&organization_id) {
            // Mirrors the foreign key violation of the relational schema
            return Err(StoreError::Database(sqlx::Error::RowNotFound));
        }

        let membership = Membership {
            organization_id,
            user_id,
            role,
            created_at: Utc::now(),
        };
        state.memberships.push(membership.clone());

        Ok(membership)
    }

    async fn delete_membership(&self, organization_id: Uuid, user_id: Uuid) -> StoreResult<bool> {
        let mut state = self.state.write().await;
        let before = state.memberships.len();
        state
            .memberships
            .retain(|m| !(m.organization_id == organization_id && m.user_id == user_id));
        Ok(state.memberships.len() < before)
    }

    async fn delete_organization(&self, id: Uuid) -> StoreResult<bool> {
        let mut state = self.state.write().await;
        let removed = state.organizations.remove(&id).is_some();
        state.memberships.retain(|m| m.organization_id != id);
        Ok(removed)
    }

    async fn update_organization(
        &self,
        id: Uuid,
        data: UpdateOrganization,
    ) -> StoreResult<Option<Organization>> {
        let mut state = self.state.write().await;

        let Some(organization) = state.organizations.get_mut(&id) else {
            return Ok(None);
        };
        if let Some(name) = data.name {
            organization.name = name;
        }

        Ok(Some(organization.clone()))
    }

    async fn update_invite_code(&self, id: Uuid, code: &str) -> StoreResult<Option<Organization>> {
        let mut state = self.state.write().await;

        if state.code_taken(code, Some(id)) {
            return Err(StoreError::InviteCodeTaken);
        }

        Ok(state.organizations.get_mut(&id).map(|organization| {
            organization.invite_code = code.to_string();
            organization.clone()
        }))
    }

    async fn transfer_ownership(
        &self,
        organization_id: Uuid,
        from_user: Uuid,
        to_user: Uuid,
    ) -> StoreResult<bool> {
        let mut state = self.state.write().await;

        let position = |user_id: Uuid| {
            state
                .memberships
                .iter()
                .position(|m| m.organization_id == organization_id && m.user_id == user_id)
        };
        let (Some(from_idx), Some(to_idx)) = (position(from_user), position(to_user)) else {
            return Ok(false);
        };

        state.memberships[to_idx].role = MembershipRole::Owner;
        state.memberships[from_idx].role = MembershipRole::Admin;

        Ok(true)
    }

    async fn health_check(&self) -> StoreResult<()> {
        Ok(())
    }
}
