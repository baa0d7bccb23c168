//! Secure select endpoint.

use axum::{
    extract::{rejection::QueryRejection, Path, Query, State},
    routing::get,
    Json, Router,
};
use sqlgate_core::ReadResult;

use crate::error::AppError;
use crate::identity::Identity;
use crate::json::{SelectParams, SuccessResponse};
use crate::AppState;

/// Select routes.
pub fn routes() -> Router<AppState> {
    Router::new().route("/api/secure-select/:table", get(handle_select))
}

/// Read rows from a table.
async fn handle_select(
    State(state): State<AppState>,
    identity: Identity,
    Path(table): Path<String>,
    params: Result<Query<SelectParams>, QueryRejection>,
) -> Result<Json<SuccessResponse<ReadResult>>, AppError> {
    let Query(params) = params?;
    let read = params.into_read_request()?;
    let result = state
        .service
        .read(&identity.role, &table, &read)
        .await
        .map_err(|e| state.fail(e))?;
    Ok(Json(SuccessResponse::new("records retrieved", result)))
}
