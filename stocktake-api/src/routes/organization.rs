/// Organization endpoints
///
/// Every endpoint acts on the organization of the authenticated user; a
/// user belongs to at most one.
///
/// # Endpoints
///
/// - `GET   /api/organization` - Current organization with members
/// - `POST  /api/organization` - Create an organization
/// - `PATCH /api/organization` - Rename (owner/admin)
/// - `POST  /api/organization/join` - Join by invite code
/// - `POST  /api/organization/leave` - Leave the organization
/// - `POST  /api/organization/regenerate-code` - New invite code (owner/admin)
/// - `POST  /api/organization/transfer-ownership` - Hand over ownership (owner)

use crate::{app::AppState, error::ApiResult};
use axum::{extract::rejection::JsonRejection, extract::State, Extension, Json};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use stocktake_shared::{
    auth::middleware::AuthContext,
    models::{
        membership::{Membership, MembershipRole},
        organization::{Organization, UpdateOrganization},
    },
    services::{organization as service, LeaveOutcome, OrganizationDetails},
};
use tracing::info;
use uuid::Uuid;
use validator::{Validate, ValidationError};

fn not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        let mut error = ValidationError::new("blank");
        error.message = Some("Name must not be blank".into());
        return Err(error);
    }
    Ok(())
}

/// Create organization request
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrganizationRequest {
    #[validate(
        length(min = 1, max = 100, message = "Name must be 1-100 characters"),
        custom(function = "not_blank")
    )]
    pub name: String,
}

/// Update organization request
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateOrganizationRequest {
    #[validate(
        length(min = 1, max = 100, message = "Name must be 1-100 characters"),
        custom(function = "not_blank")
    )]
    pub name: Option<String>,
}

/// Join organization request
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct JoinOrganizationRequest {
    #[validate(length(equal = 6, message = "Invite code must be 6 characters"))]
    pub invite_code: String,
}

/// Transfer ownership request
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferOwnershipRequest {
    pub user_id: Uuid,
}

/// Organization member
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberResponse {
    pub user_id: Uuid,
    pub role: MembershipRole,
    pub joined_at: DateTime<Utc>,
}

impl From<Membership> for MemberResponse {
    fn from(membership: Membership) -> Self {
        Self {
            user_id: membership.user_id,
            role: membership.role,
            joined_at: membership.created_at,
        }
    }
}

/// Organization with members
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrganizationResponse {
    pub id: Uuid,
    pub name: String,
    pub invite_code: String,
    pub created_at: DateTime<Utc>,
    pub members: Vec<MemberResponse>,
}

impl From<OrganizationDetails> for OrganizationResponse {
    fn from(details: OrganizationDetails) -> Self {
        let OrganizationDetails {
            organization,
            members,
        } = details;

        Self {
            id: organization.id,
            name: organization.name,
            invite_code: organization.invite_code,
            created_at: organization.created_at,
            members: members.into_iter().map(MemberResponse::from).collect(),
        }
    }
}

/// Current organization response
#[derive(Debug, Serialize, Deserialize)]
pub struct CurrentOrganizationResponse {
    pub organization: Option<OrganizationResponse>,
}

/// Organization summary after an update
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrganizationSummary {
    pub id: Uuid,
    pub name: String,
    pub invite_code: String,
}

impl From<Organization> for OrganizationSummary {
    fn from(organization: Organization) -> Self {
        Self {
            id: organization.id,
            name: organization.name,
            invite_code: organization.invite_code,
        }
    }
}

/// Invite code response
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InviteCodeResponse {
    pub invite_code: String,
}

/// Generic success response
#[derive(Debug, Serialize, Deserialize)]
pub struct SuccessResponse {
    pub success: bool,
}

/// Get the caller's organization
///
/// # Response
///
/// ```json
/// { "organization": null }
/// ```
///
/// or the organization with `id`, `name`, `inviteCode`, `createdAt` and
/// `members` (`userId`, `role`, `joinedAt`).
pub async fn get_organization(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<Json<CurrentOrganizationResponse>> {
    let details = service::current_organization(state.store.as_ref(), auth.user_id).await?;

    Ok(Json(CurrentOrganizationResponse {
        organization: details.map(OrganizationResponse::from),
    }))
}

/// Create an organization owned by the caller
///
/// # Errors
///
/// - `400 Bad Request`: Invalid name, or already a member of an organization
pub async fn create_organization(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    payload: Result<Json<CreateOrganizationRequest>, JsonRejection>,
) -> ApiResult<Json<OrganizationResponse>> {
    let Json(req) = payload?;
    req.validate()?;

    let details = service::create_organization(state.store.as_ref(), auth.user_id, &req.name).await?;

    info!(
        organization_id = %details.organization.id,
        user_id = %auth.user_id,
        "Organization created via API"
    );
    Ok(Json(details.into()))
}

/// Join an organization by invite code
///
/// # Errors
///
/// - `400 Bad Request`: Malformed code, or already a member
/// - `404 Not Found`: No organization with that code
pub async fn join_organization(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    payload: Result<Json<JoinOrganizationRequest>, JsonRejection>,
) -> ApiResult<Json<OrganizationResponse>> {
    let Json(req) = payload?;
    req.validate()?;

    let details =
        service::join_organization(state.store.as_ref(), auth.user_id, &req.invite_code).await?;

    Ok(Json(details.into()))
}

/// Leave the caller's organization
///
/// # Errors
///
/// - `400 Bad Request`: Not a member, or sole owner with other members
pub async fn leave_organization(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<Json<SuccessResponse>> {
    let outcome = service::leave_organization(state.store.as_ref(), auth.user_id).await?;

    if outcome == LeaveOutcome::OrganizationDeleted {
        info!(user_id = %auth.user_id, "Last member left; organization removed");
    }

    Ok(Json(SuccessResponse { success: true }))
}

/// Rename the caller's organization
///
/// # Errors
///
/// - `400 Bad Request`: Invalid name, or not a member
/// - `403 Forbidden`: Caller is neither owner nor admin
pub async fn update_organization(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    payload: Result<Json<UpdateOrganizationRequest>, JsonRejection>,
) -> ApiResult<Json<OrganizationSummary>> {
    let Json(req) = payload?;
    req.validate()?;

    let organization = service::update_organization(
        state.store.as_ref(),
        auth.user_id,
        UpdateOrganization { name: req.name },
    )
    .await?;

    Ok(Json(organization.into()))
}

/// Replace the invite code of the caller's organization
///
/// # Errors
///
/// - `400 Bad Request`: Not a member
/// - `403 Forbidden`: Caller is neither owner nor admin
pub async fn regenerate_invite_code(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<Json<InviteCodeResponse>> {
    let organization = service::regenerate_invite_code(state.store.as_ref(), auth.user_id).await?;

    Ok(Json(InviteCodeResponse {
        invite_code: organization.invite_code,
    }))
}

/// Make another member the owner; the caller becomes an admin
///
/// # Errors
///
/// - `400 Bad Request`: Target is the caller or not in the organization
/// - `403 Forbidden`: Caller is not an owner
pub async fn transfer_ownership(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    payload: Result<Json<TransferOwnershipRequest>, JsonRejection>,
) -> ApiResult<Json<SuccessResponse>> {
    let Json(req) = payload?;

    service::transfer_ownership(state.store.as_ref(), auth.user_id, req.user_id).await?;

    Ok(Json(SuccessResponse { success: true }))
}
