//! Policy store.
//!
//! Declarative, role-keyed tables that answer four questions for the rest of
//! the engine:
//! - may this role reference this table at all,
//! - which operations and columns does it have there,
//! - which classes of filter operators may it use,
//! - how large a page may it ask for.
//!
//! # Example
//!
//! ```
//! use sqlgate_core::policy::{Columns, Operation, PolicyStore, RolePolicy, TablePolicy};
//! use sqlgate_core::policy::{FilterCapabilities, PaginationLimits};
//!
//! let store = PolicyStore::new().with_role(
//!     "staff",
//!     RolePolicy::new(FilterCapabilities::all(), PaginationLimits::new(100, 20, 10_000))
//!         .with_table("bookings", TablePolicy::new(Columns::named(["id", "title"]), [Operation::Read])),
//! );
//!
//! assert!(store.can_perform_operation("staff", "bookings", Operation::Read));
//! assert!(!store.can_access_table("staff", "payroll"));
//! ```

mod builtin;
pub mod capability;
pub mod columns;
pub mod operation;
pub mod pagination;
pub mod store;

pub use capability::{FilterCapabilities, FilterClass};
pub use columns::Columns;
pub use operation::Operation;
pub use pagination::{PageWindow, PaginationLimits};
pub use store::{PolicyDocument, PolicyLoadError, PolicyStore, RolePolicy, TablePolicy};
