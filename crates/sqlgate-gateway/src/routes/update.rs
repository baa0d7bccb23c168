//! Secure update endpoints.

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    routing::put,
    Json, Router,
};
use sqlgate_core::{BulkResult, UpdateEntry, UpdateResult};

use crate::error::AppError;
use crate::identity::Identity;
use crate::json::{BulkUpdateBody, SuccessResponse};
use crate::AppState;

/// Update routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/secure-update/:table", put(handle_update))
        .route("/api/secure-update/:table/bulk", put(handle_bulk_update))
}

/// Update rows matching `where`.
async fn handle_update(
    State(state): State<AppState>,
    identity: Identity,
    Path(table): Path<String>,
    body: Result<Json<UpdateEntry>, JsonRejection>,
) -> Result<Json<SuccessResponse<UpdateResult>>, AppError> {
    let user_id = identity.require_user()?;
    let Json(entry) = body?;
    let result = state
        .service
        .update(&identity.role, user_id, &table, &entry.conditions, &entry.data)
        .await
        .map_err(|e| state.fail(e))?;
    Ok(Json(SuccessResponse::new("records updated", result)))
}

/// Apply several updates atomically.
async fn handle_bulk_update(
    State(state): State<AppState>,
    identity: Identity,
    Path(table): Path<String>,
    body: Result<Json<BulkUpdateBody>, JsonRejection>,
) -> Result<Json<SuccessResponse<BulkResult>>, AppError> {
    let user_id = identity.require_user()?;
    let Json(body) = body?;
    let result = state
        .service
        .update_many(&identity.role, user_id, &table, &body.updates)
        .await
        .map_err(|e| state.fail(e))?;
    Ok(Json(SuccessResponse::new("records updated", result)))
}
