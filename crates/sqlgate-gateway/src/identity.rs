//! Caller identity, as set by the upstream authenticator.

use async_trait::async_trait;
use axum::{extract::FromRequestParts, http::request::Parts};

use crate::error::AppError;

/// Header carrying the caller's role.
pub const ROLE_HEADER: &str = "x-user-role";
/// Header carrying the caller's user id.
pub const USER_ID_HEADER: &str = "x-user-id";

/// Authenticated caller.
///
/// The gateway trusts these headers; it must sit behind something that
/// authenticates the request and sets them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    /// Role name.
    pub role: String,
    /// User id, required for writes.
    pub user_id: Option<String>,
}

impl Identity {
    /// User id for audit stamping; writes are refused without one.
    pub fn require_user(&self) -> Result<&str, AppError> {
        self.user_id
            .as_deref()
            .ok_or_else(|| AppError::Unauthenticated(format!("missing {} header", USER_ID_HEADER)))
    }
}

fn header(parts: &Parts, name: &str) -> Option<String> {
    parts
        .headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

#[async_trait]
impl<S> FromRequestParts<S> for Identity
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let role = header(parts, ROLE_HEADER)
            .ok_or_else(|| AppError::Unauthenticated(format!("missing {} header", ROLE_HEADER)))?;
        Ok(Self {
            role,
            user_id: header(parts, USER_ID_HEADER),
        })
    }
}
