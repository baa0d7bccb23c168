//! Compiled statements.

use crate::value::Scalar;
use std::fmt;

/// A parameterized SQL statement and its bound values.
///
/// Built by the query builder or the mutation path and moved into an
/// executor, which consumes it once. The number of `?` placeholders in
/// `sql` always equals `values.len()`.
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledQuery {
    /// SQL text with `?` placeholders.
    pub sql: String,
    /// Values in placeholder order.
    pub values: Vec<Scalar>,
}

impl CompiledQuery {
    /// Create a compiled statement.
    pub fn new(sql: impl Into<String>, values: Vec<Scalar>) -> Self {
        Self {
            sql: sql.into(),
            values,
        }
    }

    /// Number of `?` placeholders in the SQL text.
    pub fn placeholder_count(&self) -> usize {
        self.sql.matches('?').count()
    }
}

impl fmt::Display for CompiledQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} [{} params]", self.sql, self.values.len())
    }
}

/// Join conditions with AND, each wrapped in parentheses.
pub(crate) fn and_join(conditions: &[String]) -> String {
    conditions
        .iter()
        .map(|c| format!("({})", c))
        .collect::<Vec<_>>()
        .join(" AND ")
}
