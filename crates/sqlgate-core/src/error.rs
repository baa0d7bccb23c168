//! Core error types.
//!
//! Every failure the core reports falls in one of three classes: a policy
//! denial, a validation error, or an execution error raised by the database
//! collaborator. Denial messages never name a table or column.

use serde::Serialize;
use std::fmt;
use thiserror::Error;

/// Core errors.
#[derive(Debug, Error)]
pub enum Error {
    /// The role may not reference the table at all.
    #[error("access denied")]
    TableDenied,

    /// The role may reference the table but not perform the operation.
    #[error("operation not permitted")]
    OperationDenied,

    /// A write payload contained a column the role cannot write.
    #[error("one or more columns are not permitted")]
    ColumnDenied,

    /// A projection request had no column in common with the allow-list.
    #[error("no valid columns requested")]
    NoValidColumns,

    /// An update or delete arrived without a condition map.
    #[error("a where clause is required for this operation")]
    NoWhereClause,

    /// A filter or condition could not be compiled.
    #[error("invalid filter: {0}")]
    InvalidFilter(String),

    /// A write payload was structurally invalid.
    #[error("invalid payload: {0}")]
    InvalidPayload(String),

    /// The database collaborator failed to execute a statement.
    #[error("execution error: {0}")]
    Execution(String),
}

/// Result type for core operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Stable, machine-readable error kind carried in responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorKind {
    /// Table not accessible for the role.
    TableDenied,
    /// Operation not permitted for the role.
    OperationDenied,
    /// Column outside the role's allow-list.
    ColumnDenied,
    /// Update or delete without conditions.
    NoWhereClause,
    /// Filter or condition rejected.
    InvalidFilter,
    /// Payload rejected.
    InvalidPayload,
    /// Database failure.
    ExecutionFailed,
}

impl ErrorKind {
    /// The wire code of this kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::TableDenied => "TABLE_DENIED",
            ErrorKind::OperationDenied => "OPERATION_DENIED",
            ErrorKind::ColumnDenied => "COLUMN_DENIED",
            ErrorKind::NoWhereClause => "NO_WHERE_CLAUSE",
            ErrorKind::InvalidFilter => "INVALID_FILTER",
            ErrorKind::InvalidPayload => "INVALID_PAYLOAD",
            ErrorKind::ExecutionFailed => "EXECUTION_FAILED",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Coarse error class, used to pick a response status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// Not permitted for the role. Never retried.
    PolicyDenial,
    /// Malformed request. Never retried.
    Validation,
    /// Database failure. Not retried by the core.
    Execution,
}

impl Error {
    /// Get the error kind.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::TableDenied => ErrorKind::TableDenied,
            Error::OperationDenied => ErrorKind::OperationDenied,
            Error::ColumnDenied | Error::NoValidColumns => ErrorKind::ColumnDenied,
            Error::NoWhereClause => ErrorKind::NoWhereClause,
            Error::InvalidFilter(_) => ErrorKind::InvalidFilter,
            Error::InvalidPayload(_) => ErrorKind::InvalidPayload,
            Error::Execution(_) => ErrorKind::ExecutionFailed,
        }
    }

    /// Get the error class.
    pub fn class(&self) -> ErrorClass {
        match self {
            Error::TableDenied
            | Error::OperationDenied
            | Error::ColumnDenied
            | Error::NoValidColumns => ErrorClass::PolicyDenial,
            Error::NoWhereClause | Error::InvalidFilter(_) | Error::InvalidPayload(_) => {
                ErrorClass::Validation
            }
            Error::Execution(_) => ErrorClass::Execution,
        }
    }

    /// Message safe to show to any caller.
    ///
    /// Execution errors are reduced to a fixed string; the driver message
    /// stays available through `Display` for logs and debug deployments.
    pub fn public_message(&self) -> String {
        match self {
            Error::Execution(_) => "database operation failed".to_string(),
            other => other.to_string(),
        }
    }
}
