//! Read-path filter compilation.
//!
//! Turns caller-supplied descriptors into parameterized WHERE conditions.
//! This path is permissive: a descriptor that fails any check is dropped on
//! its own and the rest still compile. Placeholders and bound values are
//! produced together, so they stay aligned no matter which descriptors are
//! dropped.

use super::descriptor::{FilterDescriptor, FilterValue};
use super::operator::Operator;
use crate::ident::is_valid_identifier;
use crate::policy::{FilterClass, PolicyStore};
use crate::value::Scalar;
use std::fmt;
use tracing::debug;

/// Why a descriptor was dropped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// The column is not a safe identifier.
    InvalidColumn,
    /// The column is not visible to the role.
    HiddenColumn,
    /// The operator's class is not granted to the role.
    ClassDenied(FilterClass),
    /// The operator tag is not recognized.
    UnknownOperator,
    /// The value has the wrong shape for the operator.
    MalformedValue,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::InvalidColumn => write!(f, "invalid column name"),
            SkipReason::HiddenColumn => write!(f, "column not visible"),
            SkipReason::ClassDenied(class) => write!(f, "filter class {} not granted", class),
            SkipReason::UnknownOperator => write!(f, "unknown operator"),
            SkipReason::MalformedValue => write!(f, "malformed value"),
        }
    }
}

/// A dropped descriptor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Skipped {
    /// Position of the descriptor in the input.
    pub index: usize,
    /// Why it was dropped.
    pub reason: SkipReason,
}

/// Compiled WHERE conditions.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CompiledConditions {
    /// SQL fragments, one per surviving descriptor, to be AND-joined.
    pub conditions: Vec<String>,
    /// Bound values in placeholder order.
    pub values: Vec<Scalar>,
    /// Descriptors that were dropped.
    pub skipped: Vec<Skipped>,
}

impl CompiledConditions {
    /// Check if no condition survived.
    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty()
    }

    fn push(&mut self, fragment: Fragment) {
        self.conditions.push(fragment.sql);
        self.values.extend(fragment.values);
    }
}

struct Fragment {
    sql: String,
    values: Vec<Scalar>,
}

impl Fragment {
    fn bare(sql: String) -> Self {
        Self {
            sql,
            values: Vec::new(),
        }
    }

    fn bound(sql: String, values: Vec<Scalar>) -> Self {
        Self { sql, values }
    }
}

/// Compiles filter descriptors for one role on one table.
pub struct FilterCompiler<'a> {
    policy: &'a PolicyStore,
    role: &'a str,
    table: &'a str,
}

impl<'a> FilterCompiler<'a> {
    /// Create a compiler.
    pub fn new(policy: &'a PolicyStore, role: &'a str, table: &'a str) -> Self {
        Self {
            policy,
            role,
            table,
        }
    }

    /// Compile descriptors in input order, dropping any that fail a check.
    pub fn compile(&self, filters: &[FilterDescriptor]) -> CompiledConditions {
        let mut out = CompiledConditions::default();
        for (index, filter) in filters.iter().enumerate() {
            match self.compile_one(filter) {
                Ok(fragment) => out.push(fragment),
                Err(reason) => {
                    debug!(
                        role = self.role,
                        table = self.table,
                        column = %filter.column,
                        operator = %filter.operator,
                        %reason,
                        "dropping filter"
                    );
                    out.skipped.push(Skipped { index, reason });
                }
            }
        }
        out
    }

    fn compile_one(&self, filter: &FilterDescriptor) -> Result<Fragment, SkipReason> {
        let column = filter.column.as_str();
        if !is_valid_identifier(column) {
            return Err(SkipReason::InvalidColumn);
        }
        if !self.policy.allowed_columns(self.role, self.table).allows(column) {
            return Err(SkipReason::HiddenColumn);
        }

        let class = Operator::class_of(&filter.operator);
        if !self.policy.can_use_filter_class(self.role, class) {
            return Err(SkipReason::ClassDenied(class));
        }

        let op = Operator::parse(&filter.operator).ok_or(SkipReason::UnknownOperator)?;
        emit(op, column, &filter.value).ok_or(SkipReason::MalformedValue)
    }
}

fn single(value: &FilterValue) -> Option<&Scalar> {
    match value {
        FilterValue::One(v) => Some(v),
        FilterValue::Many(_) => None,
    }
}

fn pair(value: &FilterValue) -> Option<(&Scalar, &Scalar)> {
    match value {
        FilterValue::Many(v) if v.len() == 2 => Some((&v[0], &v[1])),
        _ => None,
    }
}

fn pattern(value: &FilterValue, prefix: &str, suffix: &str) -> Option<String> {
    single(value)?
        .to_text()
        .map(|text| format!("{}{}{}", prefix, text, suffix))
}

fn placeholders(n: usize) -> String {
    vec!["?"; n].join(", ")
}

fn emit(op: Operator, col: &str, value: &FilterValue) -> Option<Fragment> {
    let fragment = match op {
        Operator::Like | Operator::Contains => Fragment::bound(
            format!("{} LIKE ?", col),
            vec![Scalar::Text(pattern(value, "%", "%")?)],
        ),
        Operator::StartsWith => Fragment::bound(
            format!("{} LIKE ?", col),
            vec![Scalar::Text(pattern(value, "", "%")?)],
        ),
        Operator::EndsWith => Fragment::bound(
            format!("{} LIKE ?", col),
            vec![Scalar::Text(pattern(value, "%", "")?)],
        ),
        Operator::ILike => Fragment::bound(
            format!("LOWER({}) LIKE ?", col),
            vec![Scalar::Text(pattern(value, "%", "%")?.to_lowercase())],
        ),
        Operator::Between | Operator::NotBetween => {
            let (low, high) = pair(value)?;
            let not = if op == Operator::NotBetween { "NOT " } else { "" };
            Fragment::bound(
                format!("{} {}BETWEEN ? AND ?", col, not),
                vec![low.clone(), high.clone()],
            )
        }
        Operator::DateBetween => {
            let (low, high) = pair(value)?;
            Fragment::bound(
                format!("DATE({}) BETWEEN ? AND ?", col),
                vec![low.clone(), high.clone()],
            )
        }
        Operator::DateEquals => {
            Fragment::bound(format!("DATE({}) = ?", col), vec![single(value)?.clone()])
        }
        Operator::In | Operator::NotIn => {
            let items = match value {
                FilterValue::Many(items) if !items.is_empty() => items,
                _ => return None,
            };
            let not = if op == Operator::NotIn { "NOT " } else { "" };
            Fragment::bound(
                format!("{} {}IN ({})", col, not, placeholders(items.len())),
                items.clone(),
            )
        }
        Operator::IsNull => Fragment::bare(format!("{} IS NULL", col)),
        Operator::IsNotNull => Fragment::bare(format!("{} IS NOT NULL", col)),
        Operator::IsTrue => Fragment::bare(format!("{} = TRUE", col)),
        Operator::IsFalse => Fragment::bare(format!("{} = FALSE", col)),
        Operator::Eq
        | Operator::Ne
        | Operator::Gt
        | Operator::Gte
        | Operator::Lt
        | Operator::Lte
        | Operator::GreaterThan
        | Operator::GreaterOrEqual
        | Operator::LessThan
        | Operator::LessOrEqual
        | Operator::DateAfter
        | Operator::DateBefore => {
            let symbol = op.comparison_symbol()?;
            Fragment::bound(format!("{} {} ?", col, symbol), vec![single(value)?.clone()])
        }
    };
    Some(fragment)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::{
        Columns, FilterCapabilities, Operation, PaginationLimits, RolePolicy, TablePolicy,
    };

    fn store(caps: FilterCapabilities, columns: Columns) -> PolicyStore {
        PolicyStore::new().with_role(
            "tester",
            RolePolicy::new(caps, PaginationLimits::new(100, 10, 1000))
                .with_table("people", TablePolicy::new(columns, [Operation::Read])),
        )
    }

    fn compile(store: &PolicyStore, filters: &[FilterDescriptor]) -> CompiledConditions {
        FilterCompiler::new(store, "tester", "people").compile(filters)
    }

    fn f(col: &str, op: &str, value: impl Into<FilterValue>) -> FilterDescriptor {
        FilterDescriptor::new(col, op, value)
    }

    fn s(v: &str) -> Scalar {
        Scalar::from(v)
    }

    #[test]
    fn test_text_operators() {
        let st = store(FilterCapabilities::all(), Columns::All);
        let out = compile(
            &st,
            &[
                f("name", "like", s("an")),
                f("name", "starts_with", s("An")),
                f("name", "ends_with", s("na")),
                f("name", "ilike", s("AnNa")),
            ],
        );
        assert_eq!(
            out.conditions,
            vec![
                "name LIKE ?",
                "name LIKE ?",
                "name LIKE ?",
                "LOWER(name) LIKE ?"
            ]
        );
        assert_eq!(
            out.values,
            vec![s("%an%"), s("An%"), s("%na"), s("%anna%")]
        );
    }

    #[test]
    fn test_between_and_in() {
        let st = store(FilterCapabilities::all(), Columns::All);
        let out = compile(
            &st,
            &[
                f("age", "between", vec![Scalar::Int(18), Scalar::Int(30)]),
                f("status", "in", vec![s("a"), s("b"), s("c")]),
                f("status", "not_in", vec![s("x")]),
                f("age", "not_between", vec![Scalar::Int(1), Scalar::Int(2)]),
            ],
        );
        assert_eq!(
            out.conditions,
            vec![
                "age BETWEEN ? AND ?",
                "status IN (?, ?, ?)",
                "status NOT IN (?)",
                "age NOT BETWEEN ? AND ?"
            ]
        );
        assert_eq!(out.values.len(), 8);
    }

    #[test]
    fn test_malformed_values_dropped() {
        let st = store(FilterCapabilities::all(), Columns::All);
        let out = compile(
            &st,
            &[
                f("age", "between", vec![Scalar::Int(18)]),
                f("age", "between", Scalar::Int(18)),
                f("status", "in", Vec::<Scalar>::new()),
                f("name", "like", vec![s("a")]),
                f("name", "like", Scalar::Null),
                f("age", "=", vec![Scalar::Int(1)]),
            ],
        );
        assert!(out.is_empty());
        assert!(out.values.is_empty());
        assert!(out
            .skipped
            .iter()
            .all(|s| s.reason == SkipReason::MalformedValue));
    }

    #[test]
    fn test_unary_operators_bind_nothing() {
        let st = store(FilterCapabilities::all(), Columns::All);
        let out = compile(
            &st,
            &[
                FilterDescriptor::unary("deleted_at", "is_null"),
                FilterDescriptor::unary("email", "is_not_null"),
                FilterDescriptor::unary("active", "is_true"),
                FilterDescriptor::unary("banned", "is_false"),
            ],
        );
        assert_eq!(
            out.conditions,
            vec![
                "deleted_at IS NULL",
                "email IS NOT NULL",
                "active = TRUE",
                "banned = FALSE"
            ]
        );
        assert!(out.values.is_empty());
    }

    #[test]
    fn test_date_operators() {
        let st = store(FilterCapabilities::all(), Columns::All);
        let out = compile(
            &st,
            &[
                f("start_time", "date_equals", s("2024-05-01")),
                f("start_time", "date_between", vec![s("2024-05-01"), s("2024-05-31")]),
                f("start_time", "date_after", s("2024-05-01")),
                f("start_time", "date_before", s("2024-06-01")),
            ],
        );
        assert_eq!(
            out.conditions,
            vec![
                "DATE(start_time) = ?",
                "DATE(start_time) BETWEEN ? AND ?",
                "start_time > ?",
                "start_time < ?"
            ]
        );
        assert_eq!(out.values.len(), 5);
    }

    #[test]
    fn test_comparisons() {
        let st = store(FilterCapabilities::all(), Columns::All);
        let out = compile(
            &st,
            &[
                f("age", "gt", Scalar::Int(1)),
                f("age", "gte", Scalar::Int(2)),
                f("age", "lt", Scalar::Int(3)),
                f("age", "lte", Scalar::Int(4)),
                f("age", "=", Scalar::Int(5)),
                f("age", "<>", Scalar::Int(6)),
                f("age", ">=", Scalar::Int(7)),
            ],
        );
        assert_eq!(
            out.conditions,
            vec![
                "age > ?", "age >= ?", "age < ?", "age <= ?", "age = ?", "age != ?", "age >= ?"
            ]
        );
        assert_eq!(out.values, (1..=7).map(Scalar::Int).collect::<Vec<_>>());
    }

    #[test]
    fn test_injection_in_column_dropped() {
        let st = store(FilterCapabilities::all(), Columns::All);
        let out = compile(
            &st,
            &[
                f("name = name OR 1", "=", Scalar::Int(1)),
                f("id", "=", Scalar::Int(2)),
            ],
        );
        assert_eq!(out.conditions, vec!["id = ?"]);
        assert_eq!(out.values, vec![Scalar::Int(2)]);
        assert_eq!(
            out.skipped,
            vec![Skipped {
                index: 0,
                reason: SkipReason::InvalidColumn
            }]
        );
    }

    #[test]
    fn test_hidden_column_dropped() {
        let st = store(FilterCapabilities::all(), Columns::named(["id", "name"]));
        let out = compile(
            &st,
            &[f("salary", ">", Scalar::Int(1)), f("name", "=", s("x"))],
        );
        assert_eq!(out.conditions, vec!["name = ?"]);
        assert_eq!(out.skipped[0].reason, SkipReason::HiddenColumn);
    }

    #[test]
    fn test_class_gating_keeps_unrelated_filters() {
        let caps = FilterCapabilities::all().with(FilterClass::NumericRange, false);
        let st = store(caps, Columns::All);
        let out = compile(
            &st,
            &[
                f("age", "between", vec![Scalar::Int(18), Scalar::Int(30)]),
                f("city", "=", s("Oslo")),
            ],
        );
        assert_eq!(out.conditions, vec!["city = ?"]);
        assert_eq!(out.values, vec![s("Oslo")]);
        assert_eq!(
            out.skipped[0].reason,
            SkipReason::ClassDenied(FilterClass::NumericRange)
        );
    }

    #[test]
    fn test_unknown_operator_checked_after_class() {
        let st = store(FilterCapabilities::all(), Columns::All);
        let out = compile(&st, &[f("name", "regexp", s(".*"))]);
        assert_eq!(out.skipped[0].reason, SkipReason::UnknownOperator);

        let caps = FilterCapabilities::all().with(FilterClass::CustomQueries, false);
        let st = store(caps, Columns::All);
        let out = compile(&st, &[f("name", "regexp", s(".*"))]);
        assert_eq!(
            out.skipped[0].reason,
            SkipReason::ClassDenied(FilterClass::CustomQueries)
        );
    }

    #[test]
    fn test_logic_is_ignored() {
        use super::super::descriptor::Logic;
        let st = store(FilterCapabilities::all(), Columns::All);
        let out = compile(
            &st,
            &[
                f("a", "=", Scalar::Int(1)),
                f("b", "=", Scalar::Int(2)).with_logic(Logic::Or),
            ],
        );
        assert_eq!(out.conditions, vec!["a = ?", "b = ?"]);
    }

    #[test]
    fn test_placeholders_match_values() {
        let st = store(
            FilterCapabilities::all().with(FilterClass::DateRange, false),
            Columns::named(["a", "b", "c"]),
        );
        let filters = vec![
            f("a", "in", vec![Scalar::Int(1), Scalar::Int(2), Scalar::Int(3)]),
            f("zzz", "=", Scalar::Int(9)),
            f("b", "between", vec![Scalar::Int(1), Scalar::Int(5)]),
            f("c", "date_between", vec![s("x"), s("y")]),
            FilterDescriptor::unary("c", "is_null"),
            f("a", "in", Vec::<Scalar>::new()),
            f("c", "like", s("q")),
            f("b", "!=", Scalar::Null),
        ];
        for end in 0..=filters.len() {
            let out = compile(&st, &filters[..end]);
            let placeholders: usize = out
                .conditions
                .iter()
                .map(|c| c.matches('?').count())
                .sum();
            assert_eq!(placeholders, out.values.len(), "prefix of length {end}");
        }
        let out = compile(&st, &filters);
        assert_eq!(
            out.values,
            vec![
                Scalar::Int(1),
                Scalar::Int(2),
                Scalar::Int(3),
                Scalar::Int(1),
                Scalar::Int(5),
                s("%q%"),
                Scalar::Null
            ]
        );
    }
}
