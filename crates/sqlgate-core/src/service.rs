//! Secure data service.
//!
//! Ties the pieces together for each operation: guard, compile, execute,
//! shape the result. Holds the shared policy store and executor and is
//! itself cheap to clone into request handlers.

use crate::error::Result;
use crate::executor::Executor;
use crate::guard::{AccessGuard, GuardedRequest};
use crate::mutation::{AuditStamp, MutationCompiler, UpdateEntry};
use crate::policy::{Columns, FilterCapabilities, Operation, PaginationLimits, PolicyStore};
use crate::query::{CompiledQuery, LegacyWherePolicy, ReadRequest, SelectBuilder};
use crate::value::{Record, Row, Scalar};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use tracing::{debug, info};

/// Service configuration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ServiceOptions {
    /// Handling of raw `where` text on reads.
    pub legacy_where: LegacyWherePolicy,
}

impl ServiceOptions {
    /// Set the raw `where` handling.
    pub fn with_legacy_where(mut self, policy: LegacyWherePolicy) -> Self {
        self.legacy_where = policy;
        self
    }
}

/// Pagination metadata attached to a read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaginationMeta {
    /// Effective LIMIT.
    pub limit: u64,
    /// Effective OFFSET.
    pub offset: u64,
    /// Page number, for page-based reads.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<u64>,
    /// Number of pages, when a count was run.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_pages: Option<u64>,
}

/// Result of a read.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReadResult {
    /// Returned rows.
    pub rows: Vec<Row>,
    /// Rows matching the conditions, when a count was run.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_count: Option<u64>,
    /// Effective window.
    pub pagination: PaginationMeta,
}

/// Result of an insert.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InsertResult {
    /// Caller-supplied `id`, or the generated key.
    pub inserted_id: Option<Scalar>,
    /// Columns written, audit columns included.
    pub written_columns: Vec<String>,
}

/// Result of an update.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateResult {
    /// Rows changed.
    pub affected_rows: u64,
}

/// Result of a delete.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteResult {
    /// Rows removed.
    pub affected_rows: u64,
}

/// Result of a bulk write.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkResult {
    /// Rows changed across the batch.
    pub affected_rows: u64,
    /// Statements executed.
    pub statements: usize,
}

/// What a role may do on one table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TablePermissions {
    /// Visible and writable columns.
    pub columns: Columns,
    /// Granted operations.
    pub operations: BTreeSet<Operation>,
}

/// Effective permissions of a role.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PermissionSummary {
    /// The role.
    pub role: String,
    /// Accessible tables.
    pub tables: BTreeMap<String, TablePermissions>,
    /// Filter grants.
    pub filters: FilterCapabilities,
    /// Pagination ceilings.
    pub pagination: PaginationLimits,
    /// Advisory hierarchy level.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub level: Option<u8>,
}

/// Policy-enforcing CRUD over an executor.
#[derive(Clone)]
pub struct SecureDataService {
    policy: Arc<PolicyStore>,
    executor: Arc<dyn Executor>,
    options: ServiceOptions,
}

impl SecureDataService {
    /// Create a service.
    pub fn new(policy: Arc<PolicyStore>, executor: Arc<dyn Executor>, options: ServiceOptions) -> Self {
        Self {
            policy,
            executor,
            options,
        }
    }

    /// The policy store.
    pub fn policy(&self) -> &PolicyStore {
        &self.policy
    }

    /// The executor.
    pub fn executor(&self) -> &Arc<dyn Executor> {
        &self.executor
    }

    /// The configured options.
    pub fn options(&self) -> ServiceOptions {
        self.options
    }

    fn authorize(&self, role: &str, table: &str, operation: Operation) -> Result<GuardedRequest> {
        AccessGuard::new(&self.policy).authorize(role, table, operation)
    }

    /// Read rows.
    pub async fn read(&self, role: &str, table: &str, read: &ReadRequest) -> Result<ReadResult> {
        let request = self.authorize(role, table, Operation::Read)?;
        let plan = SelectBuilder::new(&self.policy, &request)
            .with_legacy_where(self.options.legacy_where)
            .build(read)?;

        let rows = self.executor.fetch_all(plan.query).await?;
        let total_count = match plan.count {
            Some(count) => Some(self.executor.fetch_count(count).await?),
            None => None,
        };

        let window = plan.window;
        debug!(
            role,
            table,
            rows = rows.len(),
            dropped_filters = plan.skipped.len(),
            "read complete"
        );
        Ok(ReadResult {
            rows,
            total_count,
            pagination: PaginationMeta {
                limit: window.limit,
                offset: window.offset,
                page: window.page,
                total_pages: total_count.map(|total| total.div_ceil(window.limit.max(1))),
            },
        })
    }

    /// Insert one record.
    pub async fn insert(&self, role: &str, user_id: &str, table: &str, record: &Record) -> Result<InsertResult> {
        let request = self.authorize(role, table, Operation::Create)?;
        let stamp = AuditStamp::now(user_id);
        let plan = MutationCompiler::new(&self.policy, &request).insert(record, &stamp)?;

        let outcome = self.executor.execute(plan.query).await?;
        let inserted_id = plan.supplied_id.or_else(|| {
            outcome
                .last_insert_id
                .and_then(|id| i64::try_from(id).ok())
                .map(Scalar::Int)
        });
        info!(role, table, user_id, "record inserted");
        Ok(InsertResult {
            inserted_id,
            written_columns: plan.columns,
        })
    }

    /// Insert several records in one batch.
    pub async fn insert_many(&self, role: &str, user_id: &str, table: &str, records: &[Record]) -> Result<BulkResult> {
        let request = self.authorize(role, table, Operation::Create)?;
        let stamp = AuditStamp::now(user_id);
        let queries = MutationCompiler::new(&self.policy, &request)
            .insert_many(records, &stamp)?
            .into_iter()
            .map(|plan| plan.query)
            .collect();
        self.run_batch(role, table, queries).await
    }

    /// Update rows matching an equality condition map.
    pub async fn update(
        &self,
        role: &str,
        user_id: &str,
        table: &str,
        conditions: &Record,
        data: &Record,
    ) -> Result<UpdateResult> {
        let request = self.authorize(role, table, Operation::Update)?;
        let stamp = AuditStamp::now(user_id);
        let query = MutationCompiler::new(&self.policy, &request).update(conditions, data, &stamp)?;

        let outcome = self.executor.execute(query).await?;
        info!(role, table, user_id, affected = outcome.affected_rows, "rows updated");
        Ok(UpdateResult {
            affected_rows: outcome.affected_rows,
        })
    }

    /// Apply several updates in one batch.
    pub async fn update_many(&self, role: &str, user_id: &str, table: &str, entries: &[UpdateEntry]) -> Result<BulkResult> {
        let request = self.authorize(role, table, Operation::Update)?;
        let stamp = AuditStamp::now(user_id);
        let queries = MutationCompiler::new(&self.policy, &request).update_many(entries, &stamp)?;
        self.run_batch(role, table, queries).await
    }

    /// Delete rows matching an equality condition map.
    pub async fn delete(&self, role: &str, table: &str, conditions: &Record) -> Result<DeleteResult> {
        let request = self.authorize(role, table, Operation::Delete)?;
        let query = MutationCompiler::new(&self.policy, &request).delete(conditions)?;

        let outcome = self.executor.execute(query).await?;
        info!(role, table, affected = outcome.affected_rows, "rows deleted");
        Ok(DeleteResult {
            affected_rows: outcome.affected_rows,
        })
    }

    async fn run_batch(&self, role: &str, table: &str, queries: Vec<CompiledQuery>) -> Result<BulkResult> {
        let statements = queries.len();
        let outcomes = self.executor.execute_batch(queries).await?;
        let affected_rows = outcomes.iter().map(|o| o.affected_rows).sum();
        info!(role, table, statements, affected = affected_rows, "batch applied");
        Ok(BulkResult {
            affected_rows,
            statements,
        })
    }

    /// Effective permissions of a role. Unknown roles get an empty summary.
    pub fn permissions(&self, role: &str) -> PermissionSummary {
        let tables = self
            .policy
            .allowed_tables(role)
            .into_iter()
            .filter_map(|table| {
                let policy = self.policy.table_policy(role, &table)?;
                let permissions = TablePermissions {
                    columns: policy.columns.clone(),
                    operations: policy.operations.clone(),
                };
                Some((table, permissions))
            })
            .collect();

        PermissionSummary {
            role: role.to_string(),
            tables,
            filters: self.policy.filter_capabilities(role),
            pagination: self.policy.pagination_limits(role),
            level: self.policy.hierarchy_level(role),
        }
    }
}
