//! Invitation lifecycle routes.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;
use validator::Validate;

use crate::app::AppState;
use crate::error::ApiError;
use crate::extractors::CallerIdentity;
use domain::models::{
    CreateInvitationRequest, InvitationResponse, ListInvitationsQuery, ListInvitationsResponse,
};

/// Create a new invitation.
///
/// POST /api/v1/invitations
pub async fn create_invitation(
    State(state): State<AppState>,
    caller: CallerIdentity,
    Json(request): Json<CreateInvitationRequest>,
) -> Result<(StatusCode, Json<InvitationResponse>), ApiError> {
    request.validate()?;

    let response = state.lifecycle().create_invitation(request).await?;

    tracing::info!(
        invitation_id = %response.id,
        created_by = %caller.id,
        "Invitation created via API"
    );

    Ok((StatusCode::CREATED, Json(response)))
}

/// Fetch a single invitation. The status reflects lazy expiry.
///
/// GET /api/v1/invitations/:invitation_id
pub async fn get_invitation(
    State(state): State<AppState>,
    _caller: CallerIdentity,
    Path(invitation_id): Path<Uuid>,
) -> Result<Json<InvitationResponse>, ApiError> {
    let response = state.lifecycle().get(invitation_id).await?;
    Ok(Json(response))
}

/// List invitations, newest first.
///
/// GET /api/v1/invitations
pub async fn list_invitations(
    State(state): State<AppState>,
    _caller: CallerIdentity,
    Query(query): Query<ListInvitationsQuery>,
) -> Result<Json<ListInvitationsResponse>, ApiError> {
    let response = state.lifecycle().list(query).await?;
    Ok(Json(response))
}

/// Activate a pending invitation, issuing its QR entry token.
///
/// POST /api/v1/invitations/:invitation_id/activate
pub async fn activate_invitation(
    State(state): State<AppState>,
    caller: CallerIdentity,
    Path(invitation_id): Path<Uuid>,
) -> Result<Json<InvitationResponse>, ApiError> {
    let response = state.lifecycle().activate(invitation_id).await?;

    tracing::info!(
        invitation_id = %invitation_id,
        activated_by = %caller.id,
        "Invitation activated via API"
    );

    Ok(Json(response))
}

/// Reissue a fresh QR token for an expired invitation.
///
/// POST /api/v1/invitations/:invitation_id/reissue
pub async fn reissue_invitation(
    State(state): State<AppState>,
    caller: CallerIdentity,
    Path(invitation_id): Path<Uuid>,
) -> Result<Json<InvitationResponse>, ApiError> {
    let response = state.lifecycle().reissue(invitation_id).await?;

    tracing::info!(
        invitation_id = %invitation_id,
        reissued_by = %caller.id,
        "Invitation reissued via API"
    );

    Ok(Json(response))
}

/// Explicitly expire an activated invitation. Idempotent.
///
/// POST /api/v1/invitations/:invitation_id/expire
pub async fn expire_invitation(
    State(state): State<AppState>,
    _caller: CallerIdentity,
    Path(invitation_id): Path<Uuid>,
) -> Result<Json<InvitationResponse>, ApiError> {
    let response = state.lifecycle().mark_expired(invitation_id).await?;
    Ok(Json(response))
}
