//! Strict WHERE compilation for update and delete.
//!
//! Unlike the read path nothing is dropped here: a bad key fails the whole
//! request, since silently widening an update or delete is never safe.

use crate::error::{Error, Result};
use crate::ident::is_valid_identifier;
use crate::policy::Columns;
use crate::value::{Record, Scalar};

/// Primary key column, always compared byte-wise.
pub const ID_COLUMN: &str = "id";

/// Compiled WHERE clause body and its values.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct WhereClause {
    pub sql: String,
    pub values: Vec<Scalar>,
}

/// Compile an equality condition map.
///
/// Identifiers and UUID-shaped values compare with `BINARY` on both sides,
/// so case-differing UUIDs never match under a case-insensitive collation.
pub(crate) fn compile_where(conditions: &Record, columns: &Columns) -> Result<WhereClause> {
    if conditions.is_empty() {
        return Err(Error::NoWhereClause);
    }

    let mut parts = Vec::with_capacity(conditions.len());
    let mut values = Vec::with_capacity(conditions.len());
    for (column, value) in conditions {
        if !is_valid_identifier(column) {
            return Err(Error::InvalidFilter("invalid column name".to_string()));
        }
        if !columns.allows(column) {
            return Err(Error::ColumnDenied);
        }
        if value.is_null() {
            parts.push(format!("{} IS NULL", column));
        } else if column == ID_COLUMN || value.looks_like_uuid() {
            parts.push(format!("BINARY {} = BINARY ?", column));
            values.push(value.clone());
        } else {
            parts.push(format!("{} = ?", column));
            values.push(value.clone());
        }
    }

    Ok(WhereClause {
        sql: parts.join(" AND "),
        values,
    })
}
