//! Organization membership service
//!
//! Every operation receives the store it works against and the ID of the
//! acting user. Roles are re-read from the store on each call.
//!
//! # Invite code allocation
//!
//! A fresh code is generated and pre-checked against existing codes; the
//! write itself is guarded by the store's unique constraint. A collision at
//! either step triggers another attempt, up to [`INVITE_CODE_MAX_ATTEMPTS`].
//! When every attempt collides the operation fails rather than persisting a
//! duplicate.
//!
//! # Example
//!
//! ```
//! use stocktake_shared::services::organization;
//! use stocktake_shared::store::InMemoryOrganizationStore;
//! use uuid::Uuid;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let store = InMemoryOrganizationStore::new();
//! let owner = Uuid::new_v4();
//!
//! let created = organization::create_organization(&store, owner, "Corner Cafe").await?;
//! let joined = organization::join_organization(
//!     &store,
//!     Uuid::new_v4(),
//!     &created.organization.invite_code.to_lowercase(),
//! )
//! .await?;
//! assert_eq!(joined.members.len(), 2);
//! # Ok(())
//! # }
//! ```

use serde::Serialize;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::auth::authorization::{require_manage, require_owner, AuthzError};
use crate::invite_code::{generate_invite_code, normalize_invite_code, INVITE_CODE_MAX_ATTEMPTS};
use crate::models::{
    membership::{Membership, MembershipRole},
    organization::{Organization, UpdateOrganization},
};
use crate::store::{OrganizationStore, StoreError};

/// Service result type alias
pub type OrganizationResult<T> = Result<T, OrganizationError>;

/// Errors raised by organization operations
#[derive(Debug, thiserror::Error)]
pub enum OrganizationError {
    /// The user has no membership
    #[error("You are not a member of an organization")]
    NotMember,

    /// The user already has a membership
    #[error("You are already a member of an organization")]
    AlreadyMember,

    /// No organization uses the submitted invite code
    #[error("Invalid invite code")]
    InviteCodeNotFound,

    /// Sole owner tried to leave while others remain
    #[error("Transfer ownership to another member before leaving")]
    OwnershipTransferRequired,

    /// Role is too low for the action
    #[error(transparent)]
    Forbidden(#[from] AuthzError),

    /// Ownership transfer to oneself
    #[error("{0}")]
    InvalidTransfer(String),

    /// Transfer target isn't in the caller's organization
    #[error("User is not a member of this organization")]
    TransferTargetNotMember,

    /// Every generated invite code collided
    #[error("Could not allocate a unique invite code after {0} attempts")]
    InviteCodeExhausted(usize),

    /// Membership points at an organization that no longer exists
    #[error("Organization {0} not found")]
    OrganizationMissing(Uuid),

    /// Storage failure
    #[error(transparent)]
    Store(StoreError),
}

impl From<StoreError> for OrganizationError {
    fn from(err: StoreError) -> Self {
        match err {
            // Lost a race against a concurrent create/join for the same user
            StoreError::AlreadyMember => OrganizationError::AlreadyMember,
            other => OrganizationError::Store(other),
        }
    }
}

/// Organization with its members
#[derive(Debug, Clone, Serialize)]
pub struct OrganizationDetails {
    pub organization: Organization,
    pub members: Vec<Membership>,
}

/// What leaving did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LeaveOutcome {
    /// The user was the last member; the organization is gone
    OrganizationDeleted,

    /// Only the user's membership was removed
    MembershipRemoved,
}

async fn load_details(
    store: &dyn OrganizationStore,
    organization_id: Uuid,
) -> OrganizationResult<OrganizationDetails> {
    let organization = store
        .find_organization(organization_id)
        .await?
        .ok_or(OrganizationError::OrganizationMissing(organization_id))?;
    let members = store.list_members(organization_id).await?;

    Ok(OrganizationDetails {
        organization,
        members,
    })
}

async fn require_membership(
    store: &dyn OrganizationStore,
    user_id: Uuid,
) -> OrganizationResult<Membership> {
    store
        .find_membership_by_user(user_id)
        .await?
        .ok_or(OrganizationError::NotMember)
}

async fn ensure_no_membership(store: &dyn OrganizationStore, user_id: Uuid) -> OrganizationResult<()> {
    if store.find_membership_by_user(user_id).await?.is_some() {
        return Err(OrganizationError::AlreadyMember);
    }

    Ok(())
}

/// Returns the user's organization with members, or `None` without a membership
pub async fn current_organization(
    store: &dyn OrganizationStore,
    user_id: Uuid,
) -> OrganizationResult<Option<OrganizationDetails>> {
    match store.find_membership_by_user(user_id).await? {
        Some(membership) => Ok(Some(load_details(store, membership.organization_id).await?)),
        None => Ok(None),
    }
}

/// Creates an organization owned by `user_id`
///
/// # Errors
///
/// - [`OrganizationError::AlreadyMember`] if the user has a membership
/// - [`OrganizationError::InviteCodeExhausted`] if no unique code was found
pub async fn create_organization(
    store: &dyn OrganizationStore,
    user_id: Uuid,
    name: &str,
) -> OrganizationResult<OrganizationDetails> {
    create_organization_with(store, user_id, name, generate_invite_code).await
}

pub(crate) async fn create_organization_with<F>(
    store: &dyn OrganizationStore,
    user_id: Uuid,
    name: &str,
    mut next_code: F,
) -> OrganizationResult<OrganizationDetails>
where
    F: FnMut() -> String + Send,
{
    ensure_no_membership(store, user_id).await?;
    let name = name.trim();

    for attempt in 1..=INVITE_CODE_MAX_ATTEMPTS {
        let code = next_code();

        if store.invite_code_exists(&code).await? {
            debug!(attempt, "Invite code collision on pre-check");
            continue;
        }

        match store.create_organization_with_owner(name, &code, user_id).await {
            Ok((organization, owner)) => {
                info!(
                    organization_id = %organization.id,
                    user_id = %user_id,
                    attempt,
                    "Organization created"
                );
                return Ok(OrganizationDetails {
                    organization,
                    members: vec![owner],
                });
            }
            Err(StoreError::InviteCodeTaken) => {
                debug!(attempt, "Invite code collision on insert");
            }
            Err(e) => return Err(e.into()),
        }
    }

    warn!(user_id = %user_id, "Invite code allocation exhausted");
    Err(OrganizationError::InviteCodeExhausted(INVITE_CODE_MAX_ATTEMPTS))
}

/// Adds `user_id` as a member of the organization owning `invite_code`
///
/// The code is matched case-insensitively.
pub async fn join_organization(
    store: &dyn OrganizationStore,
    user_id: Uuid,
    invite_code: &str,
) -> OrganizationResult<OrganizationDetails> {
    ensure_no_membership(store, user_id).await?;

    let code = normalize_invite_code(invite_code);
    let organization = store
        .find_organization_by_invite_code(&code)
        .await?
        .ok_or(OrganizationError::InviteCodeNotFound)?;

    store
        .create_membership(organization.id, user_id, MembershipRole::Member)
        .await?;

    info!(organization_id = %organization.id, user_id = %user_id, "User joined organization");

    let members = store.list_members(organization.id).await?;
    Ok(OrganizationDetails {
        organization,
        members,
    })
}

/// Removes `user_id` from their organization
///
/// The last member leaving deletes the organization. A sole owner can't
/// leave while other members remain.
pub async fn leave_organization(
    store: &dyn OrganizationStore,
    user_id: Uuid,
) -> OrganizationResult<LeaveOutcome> {
    let membership = require_membership(store, user_id).await?;
    let organization_id = membership.organization_id;
    let members = store.list_members(organization_id).await?;

    if membership.role == MembershipRole::Owner && members.len() > 1 {
        let owners = members
            .iter()
            .filter(|m| m.role == MembershipRole::Owner)
            .count();
        if owners <= 1 {
            return Err(OrganizationError::OwnershipTransferRequired);
        }
    }

    if members.len() <= 1 {
        store.delete_organization(organization_id).await?;
        info!(organization_id = %organization_id, "Last member left, organization deleted");
        return Ok(LeaveOutcome::OrganizationDeleted);
    }

    store.delete_membership(organization_id, user_id).await?;
    info!(organization_id = %organization_id, user_id = %user_id, "User left organization");

    Ok(LeaveOutcome::MembershipRemoved)
}

/// Applies `data` to the user's organization (owner or admin only)
pub async fn update_organization(
    store: &dyn OrganizationStore,
    user_id: Uuid,
    data: UpdateOrganization,
) -> OrganizationResult<Organization> {
    let membership = require_membership(store, user_id).await?;
    require_manage(membership.role)?;

    let data = UpdateOrganization {
        name: data.name.map(|name| name.trim().to_string()),
    };

    store
        .update_organization(membership.organization_id, data)
        .await?
        .ok_or(OrganizationError::OrganizationMissing(membership.organization_id))
}

/// Replaces the invite code of the user's organization (owner or admin only)
pub async fn regenerate_invite_code(
    store: &dyn OrganizationStore,
    user_id: Uuid,
) -> OrganizationResult<Organization> {
    regenerate_invite_code_with(store, user_id, generate_invite_code).await
}

pub(crate) async fn regenerate_invite_code_with<F>(
    store: &dyn OrganizationStore,
    user_id: Uuid,
    mut next_code: F,
) -> OrganizationResult<Organization>
where
    F: FnMut() -> String + Send,
{
    let membership = require_membership(store, user_id).await?;
    require_manage(membership.role)?;
    let organization_id = membership.organization_id;

    for attempt in 1..=INVITE_CODE_MAX_ATTEMPTS {
        let code = next_code();

        if store.invite_code_exists(&code).await? {
            debug!(attempt, "Invite code collision on pre-check");
            continue;
        }

        match store.update_invite_code(organization_id, &code).await {
            Ok(Some(organization)) => {
                info!(organization_id = %organization_id, attempt, "Invite code regenerated");
                return Ok(organization);
            }
            Ok(None) => return Err(OrganizationError::OrganizationMissing(organization_id)),
            Err(StoreError::InviteCodeTaken) => {
                debug!(attempt, "Invite code collision on update");
            }
            Err(e) => return Err(e.into()),
        }
    }

    warn!(organization_id = %organization_id, "Invite code allocation exhausted");
    Err(OrganizationError::InviteCodeExhausted(INVITE_CODE_MAX_ATTEMPTS))
}

/// Makes `new_owner` an owner; the caller (an owner) becomes an admin
pub async fn transfer_ownership(
    store: &dyn OrganizationStore,
    user_id: Uuid,
    new_owner: Uuid,
) -> OrganizationResult<()> {
    let membership = require_membership(store, user_id).await?;
    require_owner(membership.role)?;

    if new_owner == user_id {
        return Err(OrganizationError::InvalidTransfer(
            "You already own this organization".to_string(),
        ));
    }

    let organization_id = membership.organization_id;
    match store.find_membership_by_user(new_owner).await? {
        Some(target) if target.organization_id == organization_id => {}
        _ => return Err(OrganizationError::TransferTargetNotMember),
    }

    if !store
        .transfer_ownership(organization_id, user_id, new_owner)
        .await?
    {
        return Err(OrganizationError::TransferTargetNotMember);
    }

    info!(
        organization_id = %organization_id,
        from = %user_id,
        to = %new_owner,
        "Ownership transferred"
    );
    Ok(())
}
