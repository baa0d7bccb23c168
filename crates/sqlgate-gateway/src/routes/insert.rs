//! Secure insert endpoints.

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    routing::post,
    Json, Router,
};
use sqlgate_core::{BulkResult, InsertResult};

use crate::error::AppError;
use crate::identity::Identity;
use crate::json::{BulkInsertBody, InsertBody, SuccessResponse};
use crate::AppState;

/// Insert routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/secure-insert/:table", post(handle_insert))
        .route("/api/secure-insert/:table/bulk", post(handle_bulk_insert))
}

/// Insert one record.
async fn handle_insert(
    State(state): State<AppState>,
    identity: Identity,
    Path(table): Path<String>,
    body: Result<Json<InsertBody>, JsonRejection>,
) -> Result<Json<SuccessResponse<InsertResult>>, AppError> {
    let user_id = identity.require_user()?;
    let Json(body) = body?;
    let result = state
        .service
        .insert(&identity.role, user_id, &table, &body.data)
        .await
        .map_err(|e| state.fail(e))?;
    Ok(Json(SuccessResponse::new("record created", result)))
}

/// Insert several records atomically.
async fn handle_bulk_insert(
    State(state): State<AppState>,
    identity: Identity,
    Path(table): Path<String>,
    body: Result<Json<BulkInsertBody>, JsonRejection>,
) -> Result<Json<SuccessResponse<BulkResult>>, AppError> {
    let user_id = identity.require_user()?;
    let Json(body) = body?;
    let result = state
        .service
        .insert_many(&identity.role, user_id, &table, &body.records)
        .await
        .map_err(|e| state.fail(e))?;
    Ok(Json(SuccessResponse::new("records created", result)))
}
