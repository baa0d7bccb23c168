//! SELECT and COUNT construction for the read path.

use super::compiled::{and_join, CompiledQuery};
use super::order::{parse_order, render_order};
use crate::error::{Error, Result};
use crate::filter::{FilterCompiler, FilterDescriptor, Skipped};
use crate::guard::GuardedRequest;
use crate::ident::is_valid_identifier;
use crate::policy::{Columns, PageWindow, PolicyStore};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::{debug, warn};

/// Handling of a raw `where` string on the read path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LegacyWherePolicy {
    /// Fail the request with `INVALID_FILTER`.
    #[default]
    Reject,
    /// Strip `;` and `-` and append the text as a condition.
    Passthrough,
}

impl FromStr for LegacyWherePolicy {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "reject" => Ok(LegacyWherePolicy::Reject),
            "passthrough" => Ok(LegacyWherePolicy::Passthrough),
            other => Err(format!(
                "unknown legacy where policy '{}', expected 'reject' or 'passthrough'",
                other
            )),
        }
    }
}

impl fmt::Display for LegacyWherePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LegacyWherePolicy::Reject => write!(f, "reject"),
            LegacyWherePolicy::Passthrough => write!(f, "passthrough"),
        }
    }
}

/// A read request, after the caller's input has been parsed.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ReadRequest {
    /// Requested projection. `None` selects every visible column.
    #[serde(default)]
    pub select: Option<Vec<String>>,
    /// Filter descriptors.
    #[serde(default)]
    pub filters: Vec<FilterDescriptor>,
    /// Raw condition text.
    #[serde(default, rename = "where")]
    pub raw_where: Option<String>,
    /// ORDER BY text.
    #[serde(default)]
    pub order: Option<String>,
    /// Page number, 1-based.
    #[serde(default)]
    pub page: Option<i64>,
    /// Requested page size.
    #[serde(default)]
    pub limit: Option<i64>,
    /// Requested row offset.
    #[serde(default)]
    pub offset: Option<i64>,
    /// Whether to also run a COUNT.
    #[serde(default)]
    pub include_count: bool,
}

impl ReadRequest {
    /// Create an empty read request.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the projection.
    pub fn with_select<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.select = Some(columns.into_iter().map(Into::into).collect());
        self
    }

    /// Add a filter descriptor.
    pub fn with_filter(mut self, filter: FilterDescriptor) -> Self {
        self.filters.push(filter);
        self
    }

    /// Set the raw condition text.
    pub fn with_where(mut self, raw: impl Into<String>) -> Self {
        self.raw_where = Some(raw.into());
        self
    }

    /// Set the ORDER BY text.
    pub fn with_order(mut self, order: impl Into<String>) -> Self {
        self.order = Some(order.into());
        self
    }

    /// Set the page number.
    pub fn with_page(mut self, page: i64) -> Self {
        self.page = Some(page);
        self
    }

    /// Set the page size.
    pub fn with_limit(mut self, limit: i64) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Set the row offset.
    pub fn with_offset(mut self, offset: i64) -> Self {
        self.offset = Some(offset);
        self
    }

    /// Request a total count.
    pub fn with_count(mut self) -> Self {
        self.include_count = true;
        self
    }

    /// Whether a COUNT statement is needed.
    pub fn wants_count(&self) -> bool {
        self.include_count || self.page.is_some()
    }
}

/// Statements for one read.
#[derive(Debug, Clone, PartialEq)]
pub struct SelectPlan {
    /// The SELECT.
    pub query: CompiledQuery,
    /// The COUNT, when requested.
    pub count: Option<CompiledQuery>,
    /// Effective LIMIT/OFFSET.
    pub window: PageWindow,
    /// Filter descriptors that were dropped.
    pub skipped: Vec<Skipped>,
}

/// Builds SELECT statements for a guarded read.
pub struct SelectBuilder<'a> {
    policy: &'a PolicyStore,
    request: &'a GuardedRequest,
    legacy_where: LegacyWherePolicy,
}

impl<'a> SelectBuilder<'a> {
    /// Create a builder.
    pub fn new(policy: &'a PolicyStore, request: &'a GuardedRequest) -> Self {
        Self {
            policy,
            request,
            legacy_where: LegacyWherePolicy::default(),
        }
    }

    /// Set the raw `where` handling.
    pub fn with_legacy_where(mut self, policy: LegacyWherePolicy) -> Self {
        self.legacy_where = policy;
        self
    }

    /// Build the statements for a read.
    pub fn build(&self, read: &ReadRequest) -> Result<SelectPlan> {
        let table = self.request.table();
        let role = self.request.role();
        let columns = self.policy.allowed_columns(role, table);

        let projection = projection(columns, read.select.as_deref())?;

        let mut conditions = Vec::new();
        if let Some(raw) = self.legacy_condition(read.raw_where.as_deref())? {
            conditions.push(raw);
        }
        let compiled = FilterCompiler::new(self.policy, role, table).compile(&read.filters);
        conditions.extend(compiled.conditions);
        let where_clause = if conditions.is_empty() {
            String::new()
        } else {
            format!(" WHERE {}", and_join(&conditions))
        };

        let order = read
            .order
            .as_deref()
            .map(|raw| parse_order(raw, columns))
            .unwrap_or_default();
        let order_clause = if order.is_empty() {
            String::new()
        } else {
            format!(" ORDER BY {}", render_order(&order))
        };

        let window = self
            .request
            .pagination()
            .window(read.limit, read.offset, read.page);

        let sql = format!(
            "SELECT {} FROM {}{}{} LIMIT {} OFFSET {}",
            projection, table, where_clause, order_clause, window.limit, window.offset
        );
        let count = read.wants_count().then(|| {
            CompiledQuery::new(
                format!("SELECT COUNT(*) AS total FROM {}{}", table, where_clause),
                compiled.values.clone(),
            )
        });

        debug!(role, table, sql = %sql, params = compiled.values.len(), "built select");
        Ok(SelectPlan {
            query: CompiledQuery::new(sql, compiled.values),
            count,
            window,
            skipped: compiled.skipped,
        })
    }

    fn legacy_condition(&self, raw: Option<&str>) -> Result<Option<String>> {
        let raw = match raw.map(str::trim) {
            Some(raw) if !raw.is_empty() => raw,
            _ => return Ok(None),
        };
        match self.legacy_where {
            LegacyWherePolicy::Reject => Err(Error::InvalidFilter(
                "raw where clauses are not accepted".to_string(),
            )),
            LegacyWherePolicy::Passthrough => {
                let cleaned: String = raw.chars().filter(|c| *c != ';' && *c != '-').collect();
                let cleaned = cleaned.trim();
                if cleaned.is_empty() {
                    return Ok(None);
                }
                warn!(
                    role = self.request.role(),
                    table = self.request.table(),
                    "passing raw where clause through"
                );
                Ok(Some(cleaned.to_string()))
            }
        }
    }
}

fn projection(columns: &Columns, requested: Option<&[String]>) -> Result<String> {
    let requested = requested.filter(|r| !(r.is_empty() || (r.len() == 1 && r[0] == "*")));

    let selected: Vec<String> = match (requested, columns) {
        (None, Columns::All) => return Ok("*".to_string()),
        (None, Columns::Named(names)) => names.iter().cloned().collect(),
        (Some(requested), _) => columns.intersect(
            requested
                .iter()
                .map(|c| c.trim())
                .filter(|c| is_valid_identifier(c)),
        ),
    };

    if selected.is_empty() {
        return Err(Error::NoValidColumns);
    }
    Ok(selected.join(", "))
}
