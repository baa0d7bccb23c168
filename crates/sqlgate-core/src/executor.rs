//! Database collaborator interface.
//!
//! The core never talks to a database directly. It hands [`CompiledQuery`]
//! values to an [`Executor`], which owns connections and runs them. The
//! gateway provides a MySQL implementation; tests use in-memory ones.

use crate::error::Result;
use crate::query::CompiledQuery;
use crate::value::Row;
use async_trait::async_trait;

/// Outcome of a write statement.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExecOutcome {
    /// Rows changed by the statement.
    pub affected_rows: u64,
    /// Auto-increment id generated by an INSERT, if any.
    pub last_insert_id: Option<u64>,
}

/// Runs compiled statements.
///
/// Implementations report failures as [`crate::Error::Execution`] and never
/// retry. Every statement is consumed by value.
#[async_trait]
pub trait Executor: Send + Sync {
    /// Run a SELECT and return its rows.
    async fn fetch_all(&self, query: CompiledQuery) -> Result<Vec<Row>>;

    /// Run a `SELECT COUNT(*) AS total` statement.
    async fn fetch_count(&self, query: CompiledQuery) -> Result<u64>;

    /// Run a single write statement.
    async fn execute(&self, query: CompiledQuery) -> Result<ExecOutcome>;

    /// Run write statements as one unit: all of them apply or none do.
    async fn execute_batch(&self, queries: Vec<CompiledQuery>) -> Result<Vec<ExecOutcome>>;

    /// Check connectivity.
    async fn ping(&self) -> Result<()>;
}
