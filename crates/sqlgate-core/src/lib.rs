//! sqlgate core: role-based secure generic data access.
//!
//! This crate decides what a role may do against a relational database and
//! compiles what it may do into parameterized SQL. It does no I/O of its own;
//! statements are handed to an [`Executor`] supplied by the caller.
//!
//! The main pieces, leaf first:
//! - [`policy`]: immutable role-keyed policy tables
//! - [`filter`]: compilation of untrusted filter descriptors
//! - [`query`]: SELECT/COUNT construction for reads
//! - [`guard`]: table then operation check for every request
//! - [`mutation`]: strict INSERT/UPDATE/DELETE compilation
//! - [`service`]: the operations callers use, wiring the above together

pub mod error;
pub mod executor;
pub mod filter;
pub mod guard;
pub mod ident;
pub mod mutation;
pub mod policy;
pub mod query;
pub mod service;
pub mod value;

pub use error::{Error, ErrorClass, ErrorKind, Result};
pub use executor::{ExecOutcome, Executor};
pub use filter::{FilterCompiler, FilterDescriptor, FilterValue};
pub use guard::{AccessGuard, GuardedRequest};
pub use mutation::{AuditStamp, MutationCompiler, UpdateEntry};
pub use policy::{Columns, FilterCapabilities, FilterClass, Operation, PaginationLimits, PolicyStore};
pub use query::{CompiledQuery, LegacyWherePolicy, ReadRequest};
pub use service::{
    BulkResult, DeleteResult, InsertResult, PermissionSummary, ReadResult, SecureDataService,
    ServiceOptions, UpdateResult,
};
pub use value::{Record, Row, Scalar};
