use super::audit::{AuditStamp, CREATED_AT, CREATED_BY, UPDATED_AT, UPDATED_BY};
use super::conditions::ID_COLUMN;
use super::MutationCompiler;
use crate::error::{Error, Result};
use crate::ident::is_valid_identifier;
use crate::policy::Operation;
use crate::query::CompiledQuery;
use crate::value::{Record, Scalar};
use tracing::{debug, warn};

/// A compiled INSERT.
#[derive(Debug, Clone, PartialEq)]
pub struct InsertPlan {
    /// The statement.
    pub query: CompiledQuery,
    /// Columns written, in statement order.
    pub columns: Vec<String>,
    /// Primary key supplied by the caller, if any.
    pub supplied_id: Option<Scalar>,
}

impl MutationCompiler<'_> {
    /// Compile a single-record INSERT.
    pub fn insert(&self, record: &Record, stamp: &AuditStamp) -> Result<InsertPlan> {
        self.expect_operation(Operation::Create)?;
        if record.is_empty() {
            return Err(Error::InvalidPayload("record is empty".to_string()));
        }

        let columns = self.columns();
        for key in record.keys() {
            if !is_valid_identifier(key) || !columns.allows(key) {
                warn!(
                    role = self.request.role(),
                    table = self.table(),
                    column = %key,
                    "insert column rejected"
                );
                return Err(Error::ColumnDenied);
            }
        }

        let mut row = record.clone();
        let timestamp = Scalar::Text(stamp.timestamp());
        let user = Scalar::Text(stamp.user_id.clone());
        for (column, value) in [
            (CREATED_AT, &timestamp),
            (UPDATED_AT, &timestamp),
            (CREATED_BY, &user),
            (UPDATED_BY, &user),
        ] {
            if columns.allows(column) {
                row.insert(column.to_string(), value.clone());
            }
        }

        let names: Vec<String> = row.keys().cloned().collect();
        let placeholders = vec!["?"; names.len()].join(", ");
        let sql = format!(
            "INSERT INTO {} ({}) VALUES ({})",
            self.table(),
            names.join(", "),
            placeholders
        );
        let supplied_id = row.get(ID_COLUMN).filter(|v| !v.is_null()).cloned();
        debug!(table = self.table(), sql = %sql, "built insert");

        Ok(InsertPlan {
            query: CompiledQuery::new(sql, row.into_values().collect()),
            columns: names,
            supplied_id,
        })
    }

    /// Compile a batch of INSERTs. Any invalid record fails the batch.
    pub fn insert_many(&self, records: &[Record], stamp: &AuditStamp) -> Result<Vec<InsertPlan>> {
        if records.is_empty() {
            return Err(Error::InvalidPayload("no records supplied".to_string()));
        }
        records
            .iter()
            .enumerate()
            .map(|(index, record)| {
                self.insert(record, stamp).map_err(|e| {
                    warn!(table = self.table(), index, error = %e, "bulk insert record rejected");
                    e
                })
            })
            .collect()
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
                        Columns::named(["id", "title", "created_at", "created_by"]),
                        [Operation::Create, Operation::Read],
                    ),
                ),
            )
            .with_role(
                "admin",
                RolePolicy::new(caps, limits).with_table("bookings", TablePolicy::full()),
            )
    }

    fn guarded(store: &PolicyStore, role: &str, op: Operation) -> GuardedRequest {
        AccessGuard::new(store).authorize(role, "bookings", op).unwrap()
    }

    fn stamp() -> AuditStamp {
        let at = NaiveDate::from_ymd_opt(2024, 5, 1)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap();
        AuditStamp::at("u-42", at)
    }

    fn record(pairs: &[(&str, Scalar)]) -> Record {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    #[test]
    fn test_insert_injects_allowed_audit_columns() {
        let s = store();
        let req = guarded(&s, "staff", Operation::Create);
        let plan = MutationCompiler::new(&s, &req)
            .insert(
                &record(&[
                    ("title", Scalar::from("Standup")),
                    ("created_by", Scalar::from("forged")),
                ]),
                &stamp(),
            )
            .unwrap();
        assert_eq!(
            plan.query.sql,
            "INSERT INTO bookings (created_at, created_by, title) VALUES (?, ?, ?)"
        );
        assert_eq!(
            plan.query.values,
            vec![
                Scalar::from("2024-05-01 12:00:00"),
                Scalar::from("u-42"),
                Scalar::from("Standup")
            ]
        );
        assert_eq!(plan.columns, vec!["created_at", "created_by", "title"]);
        assert_eq!(plan.supplied_id, None);
    }

    #[test]
    fn test_insert_rejects_disallowed_column() {
        let s = store();
        let req = guarded(&s, "staff", Operation::Create);
        let err = MutationCompiler::new(&s, &req)
            .insert(
                &record(&[("title", Scalar::from("x")), ("salary", Scalar::Int(1))]),
                &stamp(),
            )
            .unwrap_err();
        assert!(matches!(err, Error::ColumnDenied));
    }

    #[test]
    fn test_insert_rejects_bad_identifier_even_for_wildcard() {
        let s = store();
        let req = guarded(&s, "admin", Operation::Create);
        let err = MutationCompiler::new(&s, &req)
            .insert(&record(&[("title) VALUES (1); --", Scalar::Int(1))]), &stamp())
            .unwrap_err();
        assert!(matches!(err, Error::ColumnDenied));
    }

    #[test]
    fn test_wildcard_insert_gets_all_audit_columns() {
        let s = store();
        let req = guarded(&s, "admin", Operation::Create);
        let plan = MutationCompiler::new(&s, &req)
            .insert(
                &record(&[("id", Scalar::from("abc")), ("title", Scalar::from("x"))]),
                &stamp(),
            )
            .unwrap();
        assert_eq!(
            plan.columns,
            vec!["created_at", "created_by", "id", "title", "updated_at", "updated_by"]
        );
        assert_eq!(plan.query.placeholder_count(), 6);
        assert_eq!(plan.supplied_id, Some(Scalar::from("abc")));
    }

    #[test]
    fn test_empty_record() {
        let s = store();
        let req = guarded(&s, "staff", Operation::Create);
        let err = MutationCompiler::new(&s, &req)
            .insert(&Record::new(), &stamp())
            .unwrap_err();
        assert!(matches!(err, Error::InvalidPayload(_)));
    }

    #[test]
    fn test_insert_requires_create_grant() {
        let s = store();
        let req = guarded(&s, "staff", Operation::Read);
        let err = MutationCompiler::new(&s, &req)
            .insert(&record(&[("title", Scalar::from("x"))]), &stamp())
            .unwrap_err();
        assert!(matches!(err, Error::OperationDenied));
    }

    #[test]
    fn test_insert_many_all_or_nothing() {
        let s = store();
        let req = guarded(&s, "staff", Operation::Create);
        let compiler = MutationCompiler::new(&s, &req);
        let good = record(&[("title", Scalar::from("a"))]);
        let bad = record(&[("salary", Scalar::Int(1))]);

        let plans = compiler
            .insert_many(&[good.clone(), good.clone()], &stamp())
            .unwrap();
        assert_eq!(plans.len(), 2);

        let err = compiler
            .insert_many(&[good.clone(), bad, good], &stamp())
            .unwrap_err();
        assert!(matches!(err, Error::ColumnDenied));

        assert!(matches!(
            compiler.insert_many(&[], &stamp()),
            Err(Error::InvalidPayload(_))
        ));
    }
}
