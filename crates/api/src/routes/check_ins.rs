//! Kiosk check-in and override routes.
//!
//! Policy denials come back as 200 envelopes with a structured verdict,
//! never as errors: the kiosk and the Override Authority branch on them.

use axum::{extract::State, Json};
use validator::Validate;

use crate::app::AppState;
use crate::error::ApiError;
use crate::extractors::CallerIdentity;
use domain::models::{CheckInRequest, CheckInResponse, OverrideCheckInRequest};

/// Present a QR entry token for admission.
///
/// POST /api/v1/check-ins
pub async fn check_in(
    State(state): State<AppState>,
    Json(request): Json<CheckInRequest>,
) -> Result<Json<CheckInResponse>, ApiError> {
    request.validate()?;

    let response = state.admission().check_in(request).await?;
    Ok(Json(response))
}

/// Bypass a host-capacity denial with the override credential.
///
/// POST /api/v1/check-ins/override
///
/// Requires the opaque caller identity header for the audit record.
pub async fn override_check_in(
    State(state): State<AppState>,
    caller: CallerIdentity,
    Json(request): Json<OverrideCheckInRequest>,
) -> Result<Json<CheckInResponse>, ApiError> {
    request.validate()?;

    let response = state
        .admission()
        .override_check_in(request, &caller.id)
        .await?;
    Ok(Json(response))
}
