//! Filter descriptors and their compilation to WHERE conditions.
//!
//! Descriptors arrive as JSON from the caller. The [`FilterCompiler`] checks
//! each one against the role's column visibility and filter capabilities
//! and emits parameterized SQL for the survivors.

pub mod compiler;
pub mod descriptor;
pub mod operator;

pub use compiler::{CompiledConditions, FilterCompiler, SkipReason, Skipped};
pub use descriptor::{FilterDescriptor, FilterValue, Logic};
pub use operator::Operator;
