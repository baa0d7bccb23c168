use super::audit::{
    is_temporal_column, normalize_timestamp, AuditStamp, CREATED_AT, CREATED_BY, UPDATED_AT,
    UPDATED_BY,
};
use super::conditions::{compile_where, ID_COLUMN};
use super::MutationCompiler;
use crate::error::{Error, Result};
use crate::ident::is_valid_identifier;
use crate::policy::Operation;
use crate::query::CompiledQuery;
use crate::value::{Record, Scalar};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Columns never written by an update.
const SYSTEM_COLUMNS: [&str; 3] = [ID_COLUMN, CREATED_AT, CREATED_BY];

/// One entry of a bulk update.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UpdateEntry {
    /// Equality conditions.
    #[serde(rename = "where", default)]
    pub conditions: Record,
    /// New values.
    #[serde(default)]
    pub data: Record,
}

impl UpdateEntry {
    /// Create an entry.
    pub fn new(conditions: Record, data: Record) -> Self {
        Self { conditions, data }
    }
}

impl MutationCompiler<'_> {
    /// Compile a single UPDATE.
    pub fn update(&self, conditions: &Record, data: &Record, stamp: &AuditStamp) -> Result<CompiledQuery> {
        self.expect_operation(Operation::Update)?;
        let columns = self.columns();
        let clause = compile_where(conditions, columns)?;

        let mut assignments = Vec::with_capacity(data.len() + 2);
        let mut values = Vec::with_capacity(data.len() + 2 + clause.values.len());
        for (column, value) in data {
            let column = column.as_str();
            if SYSTEM_COLUMNS.contains(&column) || column == UPDATED_AT || column == UPDATED_BY {
                debug!(table = self.table(), column, "stripping system column from update");
                continue;
            }
            if !is_valid_identifier(column) || !columns.allows(column) {
                warn!(
                    role = self.request.role(),
                    table = self.table(),
                    column,
                    "update column rejected"
                );
                return Err(Error::ColumnDenied);
            }
            assignments.push(format!("{} = ?", column));
            values.push(normalize(column, value));
        }

        if assignments.is_empty() {
            return Err(Error::InvalidPayload("no writable columns".to_string()));
        }

        assignments.push(format!("{} = ?", UPDATED_AT));
        values.push(Scalar::Text(stamp.timestamp()));
        assignments.push(format!("{} = ?", UPDATED_BY));
        values.push(Scalar::Text(stamp.user_id.clone()));
        values.extend(clause.values);

        let sql = format!(
            "UPDATE {} SET {} WHERE {}",
            self.table(),
            assignments.join(", "),
            clause.sql
        );
        debug!(table = self.table(), sql = %sql, "built update");
        Ok(CompiledQuery::new(sql, values))
    }

    /// Compile a batch of UPDATEs. Any invalid entry fails the batch.
    pub fn update_many(&self, entries: &[UpdateEntry], stamp: &AuditStamp) -> Result<Vec<CompiledQuery>> {
        if entries.is_empty() {
            return Err(Error::InvalidPayload("no updates supplied".to_string()));
        }
        entries
            .iter()
            .enumerate()
            .map(|(index, entry)| {
                self.update(&entry.conditions, &entry.data, stamp)
                    .map_err(|e| {
                        warn!(table = self.table(), index, error = %e, "bulk update entry rejected");
                        e
                    })
            })
            .collect()
    }
}

fn normalize(column: &str, value: &Scalar) -> Scalar {
    match value {
        Scalar::Text(text) if is_temporal_column(column) => normalize_timestamp(text)
            .map(Scalar::Text)
            .unwrap_or_else(|| value.clone()),
        _ => value.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::guard::{AccessGuard, GuardedRequest};
    use crate::policy::{
        Columns, FilterCapabilities, PaginationLimits, PolicyStore, RolePolicy, TablePolicy,
    };
    use chrono::NaiveDate;

    fn store() -> PolicyStore {
        let caps = FilterCapabilities::all();
        let limits = PaginationLimits::new(100, 20, 1000);
        PolicyStore::new()
            .with_role(
                "staff",
                RolePolicy::new(caps, limits).with_table(
                    "bookings",
                    TablePolicy::new(
                        Columns::named(["id", "title", "start_time", "status"]),
                        [Operation::Read, Operation::Update],
                    ),
                ),
            )
            .with_role(
                "admin",
                RolePolicy::new(caps, limits).with_table("bookings", TablePolicy::full()),
            )
    }

    fn guarded(store: &PolicyStore, role: &str) -> GuardedRequest {
        AccessGuard::new(store)
            .authorize(role, "bookings", Operation::Update)
            .unwrap()
    }

    fn stamp() -> AuditStamp {
        let at = NaiveDate::from_ymd_opt(2024, 5, 2)
            .unwrap()
            .and_hms_opt(8, 0, 0)
            .unwrap();
        AuditStamp::at("u-1", at)
    }

    fn record(pairs: &[(&str, Scalar)]) -> Record {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    #[test]
    fn test_update_requires_where_for_every_role() {
        let s = store();
        for role in ["staff", "admin"] {
            let req = guarded(&s, role);
            let err = MutationCompiler::new(&s, &req)
                .update(
                    &Record::new(),
                    &record(&[("title", Scalar::from("x"))]),
                    &stamp(),
                )
                .unwrap_err();
            assert!(matches!(err, Error::NoWhereClause), "role {role}");
        }
    }

    #[test]
    fn test_update_statement() {
        let s = store();
        let req = guarded(&s, "staff");
        let q = MutationCompiler::new(&s, &req)
            .update(
                &record(&[("id", Scalar::Int(5))]),
                &record(&[
                    ("id", Scalar::Int(99)),
                    ("start_time", Scalar::from("2024-06-01T10:00:00.000Z")),
                    ("title", Scalar::from("Retro")),
                ]),
                &stamp(),
            )
            .unwrap();
        assert_eq!(
            q.sql,
            "UPDATE bookings SET start_time = ?, title = ?, updated_at = ?, updated_by = ? \
             WHERE BINARY id = BINARY ?"
        );
        assert_eq!(
            q.values,
            vec![
                Scalar::from("2024-06-01 10:00:00"),
                Scalar::from("Retro"),
                Scalar::from("2024-05-02 08:00:00"),
                Scalar::from("u-1"),
                Scalar::Int(5)
            ]
        );
    }

    #[test]
    fn test_non_temporal_text_untouched() {
        let s = store();
        let req = guarded(&s, "staff");
        let q = MutationCompiler::new(&s, &req)
            .update(
                &record(&[("id", Scalar::Int(5))]),
                &record(&[("status", Scalar::from("2024-06-01T10:00:00.000Z"))]),
                &stamp(),
            )
            .unwrap();
        assert_eq!(q.values[0], Scalar::from("2024-06-01T10:00:00.000Z"));
    }

    #[test]
    fn test_update_rejects_hidden_column() {
        let s = store();
        let req = guarded(&s, "staff");
        let err = MutationCompiler::new(&s, &req)
            .update(
                &record(&[("id", Scalar::Int(5))]),
                &record(&[("owner_id", Scalar::Int(1))]),
                &stamp(),
            )
            .unwrap_err();
        assert!(matches!(err, Error::ColumnDenied));
    }

    #[test]
    fn test_only_system_columns_is_invalid() {
        let s = store();
        let req = guarded(&s, "admin");
        let err = MutationCompiler::new(&s, &req)
            .update(
                &record(&[("id", Scalar::Int(5))]),
                &record(&[
                    ("id", Scalar::Int(6)),
                    ("created_by", Scalar::from("x")),
                    ("updated_at", Scalar::from("y")),
                ]),
                &stamp(),
            )
            .unwrap_err();
        assert!(matches!(err, Error::InvalidPayload(_)));
    }

    #[test]
    fn test_update_many() {
        let s = store();
        let req = guarded(&s, "staff");
        let compiler = MutationCompiler::new(&s, &req);
        let ok = UpdateEntry::new(
            record(&[("id", Scalar::Int(1))]),
            record(&[("title", Scalar::from("a"))]),
        );
        let no_where = UpdateEntry::new(Record::new(), record(&[("title", Scalar::from("b"))]));

        assert_eq!(compiler.update_many(&[ok.clone(), ok.clone()], &stamp()).unwrap().len(), 2);
        assert!(matches!(
            compiler.update_many(&[ok, no_where], &stamp()),
            Err(Error::NoWhereClause)
        ));
    }

    #[test]
    fn test_update_entry_wire_form() {
        let entry: UpdateEntry =
            serde_json::from_str(r#"{"where": {"id": 3}, "data": {"title": "x"}}"#).unwrap();
        assert_eq!(entry.conditions.get("id"), Some(&Scalar::Int(3)));
        assert_eq!(entry.data.len(), 1);
    }
}
