//! Read-path statement construction.

pub mod compiled;
pub mod order;
pub mod select;

pub use compiled::CompiledQuery;
pub use order::{parse_order, OrderDirection, OrderTerm};
pub use select::{LegacyWherePolicy, ReadRequest, SelectBuilder, SelectPlan};
