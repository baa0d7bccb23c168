//! Immutable, role-keyed policy tables.
//!
//! A [`PolicyStore`] is built once at startup (from the built-in tables or a
//! JSON document), wrapped in an `Arc`, and shared read-only by every
//! request. Every lookup is total: unknown roles and tables resolve to the
//! safest answer instead of an error.

use super::capability::{FilterCapabilities, FilterClass};
use super::columns::Columns;
use super::operation::Operation;
use super::pagination::PaginationLimits;
use crate::ident::is_valid_identifier;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::path::Path;
use thiserror::Error;

static NO_COLUMNS: Columns = Columns::Named(BTreeSet::new());

/// Errors raised while loading a policy document.
#[derive(Debug, Error)]
pub enum PolicyLoadError {
    /// The document could not be read.
    #[error("failed to read policy file: {0}")]
    Io(#[from] std::io::Error),

    /// The document is not valid JSON for the policy schema.
    #[error("failed to parse policy document: {0}")]
    Parse(#[from] serde_json::Error),

    /// The document parsed but violates a policy invariant.
    #[error("invalid policy for role '{role}': {reason}")]
    Invalid {
        /// Role whose entry is invalid.
        role: String,
        /// What is wrong with it.
        reason: String,
    },
}

/// Access policy of one role on one table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TablePolicy {
    /// Whether the role may reference the table at all.
    pub accessible: bool,
    /// Visible and writable columns.
    #[serde(default)]
    pub columns: Columns,
    /// Granted operations.
    #[serde(default)]
    pub operations: BTreeSet<Operation>,
}

impl TablePolicy {
    /// Create an accessible table policy.
    pub fn new(columns: Columns, operations: impl IntoIterator<Item = Operation>) -> Self {
        Self {
            accessible: true,
            columns,
            operations: operations.into_iter().collect(),
        }
    }

    /// Create an explicit denial entry.
    pub fn denied() -> Self {
        Self {
            accessible: false,
            columns: Columns::default(),
            operations: BTreeSet::new(),
        }
    }

    /// Full access: every column, every operation.
    pub fn full() -> Self {
        Self::new(Columns::All, Operation::ALL)
    }

    /// Read-only access to the given columns.
    pub fn read_only(columns: Columns) -> Self {
        Self::new(columns, [Operation::Read])
    }
}

/// Everything the store knows about one role.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RolePolicy {
    /// Per-table policies.
    #[serde(default)]
    pub tables: BTreeMap<String, TablePolicy>,
    /// Filter class grants.
    #[serde(default)]
    pub filters: FilterCapabilities,
    /// Pagination ceilings.
    #[serde(default)]
    pub pagination: PaginationLimits,
}

impl RolePolicy {
    /// Create an empty role policy.
    pub fn new(filters: FilterCapabilities, pagination: PaginationLimits) -> Self {
        Self {
            tables: BTreeMap::new(),
            filters,
            pagination,
        }
    }

    /// Add a table policy.
    pub fn with_table(mut self, table: impl Into<String>, policy: TablePolicy) -> Self {
        self.tables.insert(table.into(), policy);
        self
    }

    fn validate(&self, role: &str) -> Result<(), PolicyLoadError> {
        let invalid = |reason: String| PolicyLoadError::Invalid {
            role: role.to_string(),
            reason,
        };

        if self.pagination.max_limit < 1 {
            return Err(invalid("maxLimit must be at least 1".to_string()));
        }
        if self.pagination.default_limit > self.pagination.max_limit {
            return Err(invalid("defaultLimit exceeds maxLimit".to_string()));
        }
        for (table, policy) in &self.tables {
            if !is_valid_identifier(table) {
                return Err(invalid(format!("invalid table name '{}'", table)));
            }
            if let Columns::Named(names) = &policy.columns {
                if let Some(bad) = names.iter().find(|c| !is_valid_identifier(c)) {
                    return Err(invalid(format!(
                        "invalid column name '{}' on table '{}'",
                        bad, table
                    )));
                }
            }
        }
        Ok(())
    }
}

/// On-disk policy document.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PolicyDocument {
    /// Role policies keyed by role name.
    #[serde(default)]
    pub roles: BTreeMap<String, RolePolicy>,
    /// Advisory role levels, higher outranks lower.
    #[serde(default)]
    pub hierarchy: BTreeMap<String, u8>,
}

/// Immutable role-keyed policy tables.
#[derive(Debug, Clone, Default)]
pub struct PolicyStore {
    roles: HashMap<String, RolePolicy>,
    hierarchy: HashMap<String, u8>,
}

impl PolicyStore {
    /// Create an empty store. Every lookup denies.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a role policy.
    pub fn with_role(mut self, role: impl Into<String>, policy: RolePolicy) -> Self {
        self.roles.insert(role.into(), policy);
        self
    }

    /// Declare a role's advisory hierarchy level.
    pub fn with_level(mut self, role: impl Into<String>, level: u8) -> Self {
        self.hierarchy.insert(role.into(), level);
        self
    }

    /// Build a store from a parsed document, validating every role.
    pub fn from_document(doc: PolicyDocument) -> Result<Self, PolicyLoadError> {
        for (role, policy) in &doc.roles {
            policy.validate(role)?;
        }
        Ok(Self {
            roles: doc.roles.into_iter().collect(),
            hierarchy: doc.hierarchy.into_iter().collect(),
        })
    }

    /// Parse and validate a JSON policy document.
    pub fn from_json_str(json: &str) -> Result<Self, PolicyLoadError> {
        let doc: PolicyDocument = serde_json::from_str(json)?;
        Self::from_document(doc)
    }

    /// Read, parse and validate a JSON policy file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, PolicyLoadError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json_str(&content)
    }

    /// Export the store as a document.
    pub fn to_document(&self) -> PolicyDocument {
        PolicyDocument {
            roles: self
                .roles
                .iter()
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
            hierarchy: self
                .hierarchy
                .iter()
                .map(|(k, v)| (k.clone(), *v))
                .collect(),
        }
    }

    /// Names of all configured roles, sorted.
    pub fn roles(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.roles.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Get the raw policy entry for a role and table, if one exists.
    pub fn table_policy(&self, role: &str, table: &str) -> Option<&TablePolicy> {
        self.roles.get(role).and_then(|r| r.tables.get(table))
    }

    /// Accessible table policy, or `None` (default-deny).
    fn accessible(&self, role: &str, table: &str) -> Option<&TablePolicy> {
        self.table_policy(role, table).filter(|p| p.accessible)
    }

    /// Check whether the role may reference the table.
    pub fn can_access_table(&self, role: &str, table: &str) -> bool {
        self.accessible(role, table).is_some()
    }

    /// Check whether the role may perform the operation on the table.
    ///
    /// An inaccessible table never reaches the operation check.
    pub fn can_perform_operation(&self, role: &str, table: &str, op: Operation) -> bool {
        self.accessible(role, table)
            .map(|p| p.operations.contains(&op))
            .unwrap_or(false)
    }

    /// Columns the role may see or write on the table.
    ///
    /// Inaccessible or unknown tables yield an empty named set.
    pub fn allowed_columns(&self, role: &str, table: &str) -> &Columns {
        self.accessible(role, table)
            .map(|p| &p.columns)
            .unwrap_or(&NO_COLUMNS)
    }

    /// Check whether the role may use operators of the given class.
    pub fn can_use_filter_class(&self, role: &str, class: FilterClass) -> bool {
        self.roles
            .get(role)
            .map(|r| r.filters.allows(class))
            .unwrap_or(false)
    }

    /// Filter grants of the role; none for unknown roles.
    pub fn filter_capabilities(&self, role: &str) -> FilterCapabilities {
        self.roles
            .get(role)
            .map(|r| r.filters)
            .unwrap_or_else(FilterCapabilities::none)
    }

    /// Pagination limits of the role; restrictive limits for unknown roles.
    pub fn pagination_limits(&self, role: &str) -> PaginationLimits {
        self.roles
            .get(role)
            .map(|r| r.pagination)
            .unwrap_or_else(PaginationLimits::restrictive)
    }

    /// Tables the role may reference.
    pub fn allowed_tables(&self, role: &str) -> BTreeSet<String> {
        self.roles
            .get(role)
            .map(|r| {
                r.tables
                    .iter()
                    .filter(|(_, p)| p.accessible)
                    .map(|(t, _)| t.clone())
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Advisory hierarchy level of a role.
    ///
    /// Never consulted by the access guard.
    pub fn hierarchy_level(&self, role: &str) -> Option<u8> {
        self.hierarchy.get(role).copied()
    }

    /// Check whether `role` has a strictly higher declared level than `other`.
    pub fn outranks(&self, role: &str, other: &str) -> bool {
        match (self.hierarchy_level(role), self.hierarchy_level(other)) {
            (Some(a), Some(b)) => a > b,
            (Some(_), None) => true,
            _ => false,
        }
    }
}
