//! Effective permissions of the caller.

use axum::{extract::State, routing::get, Json, Router};
use sqlgate_core::PermissionSummary;

use crate::identity::Identity;
use crate::json::SuccessResponse;
use crate::AppState;

/// Permission routes.
pub fn routes() -> Router<AppState> {
    Router::new().route("/api/secure-permissions", get(handle_permissions))
}

/// Report what the caller's role may do.
async fn handle_permissions(
    State(state): State<AppState>,
    identity: Identity,
) -> Json<SuccessResponse<PermissionSummary>> {
    let summary = state.service.permissions(&identity.role);
    Json(SuccessResponse::new("permissions retrieved", summary))
}
