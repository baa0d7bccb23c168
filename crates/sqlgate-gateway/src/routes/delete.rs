//! Secure delete endpoint.

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    routing::delete,
    Json, Router,
};
use sqlgate_core::DeleteResult;

use crate::error::AppError;
use crate::identity::Identity;
use crate::json::{DeleteBody, SuccessResponse};
use crate::AppState;

/// Delete routes.
pub fn routes() -> Router<AppState> {
    Router::new().route("/api/secure-delete/:table", delete(handle_delete))
}

/// Delete rows matching `where`.
async fn handle_delete(
    State(state): State<AppState>,
    identity: Identity,
    Path(table): Path<String>,
    body: Result<Json<DeleteBody>, JsonRejection>,
) -> Result<Json<SuccessResponse<DeleteResult>>, AppError> {
    identity.require_user()?;
    let Json(body) = body?;
    let result = state
        .service
        .delete(&identity.role, &table, &body.conditions)
        .await
        .map_err(|e| state.fail(e))?;
    Ok(Json(SuccessResponse::new("records deleted", result)))
}
