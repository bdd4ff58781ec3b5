//! Visit routes.

use axum::{
    extract::{Path, State},
    Json,
};
use uuid::Uuid;

use crate::app::AppState;
use crate::error::ApiError;
use crate::extractors::CallerIdentity;
use domain::models::VisitResponse;

/// Check a guest out of the building.
///
/// POST /api/v1/visits/:visit_id/check-out
pub async fn check_out_visit(
    State(state): State<AppState>,
    caller: CallerIdentity,
    Path(visit_id): Path<Uuid>,
) -> Result<Json<VisitResponse>, ApiError> {
    let response = state.lifecycle().check_out(visit_id).await?;

    tracing::info!(visit_id = %visit_id, checked_out_by = %caller.id, "Visit checked out");

    Ok(Json(response))
}
