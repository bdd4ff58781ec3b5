//! Guest self-service and staff guest-management routes.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;
use validator::Validate;

use crate::app::AppState;
use crate::error::ApiError;
use crate::extractors::CallerIdentity;
use domain::models::{GuestResponse, RegisterGuestRequest};

/// Guest self-service registration with an acceptance token.
///
/// POST /api/v1/guests/register
pub async fn register_guest(
    State(state): State<AppState>,
    Json(request): Json<RegisterGuestRequest>,
) -> Result<Json<GuestResponse>, ApiError> {
    request.validate()?;

    let response = state.lifecycle().register_guest(request).await?;
    Ok(Json(response))
}

/// Blacklist a guest.
///
/// POST /api/v1/guests/:guest_id/blacklist
pub async fn blacklist_guest(
    State(state): State<AppState>,
    caller: CallerIdentity,
    Path(guest_id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    state.lifecycle().blacklist_guest(guest_id).await?;

    tracing::warn!(guest_id = %guest_id, blacklisted_by = %caller.id, "Guest blacklisted via API");

    Ok(StatusCode::NO_CONTENT)
}

/// Clear a guest's blacklist stamp.
///
/// DELETE /api/v1/guests/:guest_id/blacklist
pub async fn unblacklist_guest(
    State(state): State<AppState>,
    _caller: CallerIdentity,
    Path(guest_id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    state.lifecycle().unblacklist_guest(guest_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Administrative purge of a guest and all dependent records.
///
/// DELETE /api/v1/guests/:guest_id
pub async fn purge_guest(
    State(state): State<AppState>,
    caller: CallerIdentity,
    Path(guest_id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    state.lifecycle().purge_guest(guest_id).await?;

    tracing::warn!(guest_id = %guest_id, purged_by = %caller.id, "Guest purged via API");

    Ok(StatusCode::NO_CONTENT)
}
