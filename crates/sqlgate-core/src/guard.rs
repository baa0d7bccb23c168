//! Request-level access gate.
//!
//! Every operation passes through [`AccessGuard::authorize`] before any SQL
//! is built:
//!
//! ```text
//! START -> TABLE_CHECK -> OPERATION_CHECK -> PROCEED
//!              |               |
//!              +----> DENY <---+
//! ```
//!
//! A [`GuardedRequest`] can only be obtained from a successful check, so the
//! builders that take one cannot run for a denied request.

use crate::error::{Error, Result};
use crate::ident::is_valid_identifier;
use crate::policy::{Operation, PaginationLimits, PolicyStore};
use tracing::{debug, warn};

/// Stage at which a request was denied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardStage {
    /// The table could not be referenced.
    TableCheck,
    /// The operation is not granted on the table.
    OperationCheck,
}

impl GuardStage {
    fn as_str(&self) -> &'static str {
        match self {
            GuardStage::TableCheck => "table_check",
            GuardStage::OperationCheck => "operation_check",
        }
    }

    fn denial(&self) -> Error {
        match self {
            GuardStage::TableCheck => Error::TableDenied,
            GuardStage::OperationCheck => Error::OperationDenied,
        }
    }
}

/// A request that passed the guard.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GuardedRequest {
    table: String,
    role: String,
    operation: Operation,
    pagination: PaginationLimits,
}

impl GuardedRequest {
    /// Target table.
    pub fn table(&self) -> &str {
        &self.table
    }

    /// Caller role.
    pub fn role(&self) -> &str {
        &self.role
    }

    /// Authorized operation.
    pub fn operation(&self) -> Operation {
        self.operation
    }

    /// Pagination limits of the role.
    pub fn pagination(&self) -> PaginationLimits {
        self.pagination
    }
}

/// Table then operation check against a policy store.
#[derive(Debug, Clone, Copy)]
pub struct AccessGuard<'a> {
    policy: &'a PolicyStore,
}

impl<'a> AccessGuard<'a> {
    /// Create a guard.
    pub fn new(policy: &'a PolicyStore) -> Self {
        Self { policy }
    }

    /// Run the checks for one request.
    pub fn authorize(&self, role: &str, table: &str, operation: Operation) -> Result<GuardedRequest> {
        if let Some(stage) = self.denied_at(role, table, operation) {
            warn!(
                role,
                table,
                operation = %operation,
                stage = stage.as_str(),
                "access denied"
            );
            return Err(stage.denial());
        }

        debug!(role, table, operation = %operation, "access granted");
        Ok(GuardedRequest {
            table: table.to_string(),
            role: role.to_string(),
            operation,
            pagination: self.policy.pagination_limits(role),
        })
    }

    /// Stage at which the request would be denied, if any.
    pub fn denied_at(&self, role: &str, table: &str, operation: Operation) -> Option<GuardStage> {
        if !is_valid_identifier(table) || !self.policy.can_access_table(role, table) {
            return Some(GuardStage::TableCheck);
        }
        if !self.policy.can_perform_operation(role, table, operation) {
            return Some(GuardStage::OperationCheck);
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::{Columns, FilterCapabilities, RolePolicy, TablePolicy};

    fn store() -> PolicyStore {
        PolicyStore::new().with_role(
            "staff",
            RolePolicy::new(FilterCapabilities::all(), PaginationLimits::new(100, 20, 1000))
                .with_table("bookings", TablePolicy::read_only(Columns::named(["id"])))
                .with_table("payroll", TablePolicy::denied()),
        )
    }

    #[test]
    fn test_proceed() {
        let s = store();
        let req = AccessGuard::new(&s)
            .authorize("staff", "bookings", Operation::Read)
            .unwrap();
        assert_eq!(req.table(), "bookings");
        assert_eq!(req.role(), "staff");
        assert_eq!(req.operation(), Operation::Read);
        assert_eq!(req.pagination().max_limit, 100);
    }

    #[test]
    fn test_table_denied_before_operation() {
        let s = store();
        let guard = AccessGuard::new(&s);
        assert_eq!(
            guard.denied_at("staff", "payroll", Operation::Delete),
            Some(GuardStage::TableCheck)
        );
        assert!(matches!(
            guard.authorize("staff", "unknown", Operation::Read),
            Err(Error::TableDenied)
        ));
        assert!(matches!(
            guard.authorize("ghost", "bookings", Operation::Read),
            Err(Error::TableDenied)
        ));
    }

    #[test]
    fn test_operation_denied() {
        let s = store();
        let err = AccessGuard::new(&s)
            .authorize("staff", "bookings", Operation::Update)
            .unwrap_err();
        assert!(matches!(err, Error::OperationDenied));
        assert_eq!(err.to_string(), "operation not permitted");
    }

    #[test]
    fn test_malformed_table_name_denied() {
        let s = store();
        let guard = AccessGuard::new(&s);
        for table in ["bookings; DROP TABLE users", "bookings b", "", "`bookings`"] {
            assert_eq!(
                guard.denied_at("staff", table, Operation::Read),
                Some(GuardStage::TableCheck)
            );
        }
    }
}
