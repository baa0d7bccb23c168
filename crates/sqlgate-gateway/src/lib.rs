//! sqlgate HTTP/JSON gateway.
//!
//! Exposes the secure data service as a generic REST surface. Callers name
//! the table in the path; what they may do there is decided entirely by the
//! policy store, keyed by the role in the `x-user-role` header.

pub mod config;
pub mod db;
pub mod error;
pub mod identity;
pub mod json;
pub mod routes;

pub use config::{Args, GatewayConfig};
pub use db::MySqlExecutor;
pub use error::AppError;
pub use identity::Identity;

use axum::Router;
use sqlgate_core::SecureDataService;
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

/// Application state shared across all routes.
#[derive(Clone)]
pub struct AppState {
    /// Policy-enforcing data service.
    pub service: SecureDataService,
    /// Gateway configuration.
    pub config: GatewayConfig,
}

impl AppState {
    /// Create new application state.
    pub fn new(service: SecureDataService, config: GatewayConfig) -> Self {
        Self { service, config }
    }

    /// Convert a core error into a response error, honoring the
    /// error-detail setting.
    pub fn fail(&self, error: sqlgate_core::Error) -> AppError {
        AppError::core(error, self.config.expose_error_details)
    }
}

/// Create the router with all routes.
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);
    let request_timeout = state.config.request_timeout;

    Router::new()
        .merge(routes::health::routes())
        .merge(routes::select::routes())
        .merge(routes::insert::routes())
        .merge(routes::update::routes())
        .merge(routes::delete::routes())
        .merge(routes::permissions::routes())
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(TimeoutLayer::new(request_timeout))
                .layer(cors),
        )
        .with_state(state)
}
