//! Role-based authorization policy
//!
//! Pure functions over [`MembershipRole`], independent of HTTP and storage.
//! Callers load the role fresh from the store on every request and pass it
//! in; nothing here caches authorization state.
//!
//! # Example
//!
//! ```
//! use stocktake_shared::auth::authorization::{can_manage, require_manage};
//! use stocktake_shared::models::membership::MembershipRole;
//!
//! assert!(can_manage(MembershipRole::Admin));
//! assert!(require_manage(MembershipRole::Member).is_err());
//! ```

use crate::models::membership::MembershipRole;

/// Error type for authorization checks
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthzError {
    /// Role is below what the action needs
    #[error("Insufficient permissions: requires {required}, has {actual}")]
    InsufficientRole {
        required: MembershipRole,
        actual: MembershipRole,
    },
}

/// Whether a role may change organization settings (name, invite code)
pub fn can_manage(role: MembershipRole) -> bool {
    matches!(role, MembershipRole::Owner | MembershipRole::Admin)
}

/// Whether a role may hand ownership to another member
pub fn can_transfer_ownership(role: MembershipRole) -> bool {
    role == MembershipRole::Owner
}

/// Fails unless the role passes [`can_manage`]
pub fn require_manage(role: MembershipRole) -> Result<(), AuthzError> {
    if !can_manage(role) {
        return Err(AuthzError::InsufficientRole {
            required: MembershipRole::Admin,
            actual: role,
        });
    }

    Ok(())
}

/// Fails unless the role passes [`can_transfer_ownership`]
pub fn require_owner(role: MembershipRole) -> Result<(), AuthzError> {
    if !can_transfer_ownership(role) {
        return Err(AuthzError::InsufficientRole {
            required: MembershipRole::Owner,
            actual: role,
        });
    }

    Ok(())
}
