//! Write path: INSERT, UPDATE and DELETE compilation.
//!
//! Every check here is strict. A column the role cannot write, a malformed
//! key or a missing condition map fails the request before any statement is
//! built; bulk variants compile every record first and fail the whole batch
//! on the first bad one.

pub mod audit;
mod conditions;
mod delete;
mod insert;
mod update;

pub use audit::AuditStamp;
pub use conditions::ID_COLUMN;
pub use insert::InsertPlan;
pub use update::UpdateEntry;

use crate::error::{Error, Result};
use crate::guard::GuardedRequest;
use crate::policy::{Columns, Operation, PolicyStore};

/// Compiles write statements for a guarded request.
pub struct MutationCompiler<'a> {
    policy: &'a PolicyStore,
    request: &'a GuardedRequest,
}

impl<'a> MutationCompiler<'a> {
    /// Create a compiler.
    pub fn new(policy: &'a PolicyStore, request: &'a GuardedRequest) -> Self {
        Self { policy, request }
    }

    fn columns(&self) -> &'a Columns {
        self.policy
            .allowed_columns(self.request.role(), self.request.table())
    }

    fn table(&self) -> &'a str {
        self.request.table()
    }

    fn expect_operation(&self, operation: Operation) -> Result<()> {
        if self.request.operation() == operation {
            Ok(())
        } else {
            Err(Error::OperationDenied)
        }
    }
}
