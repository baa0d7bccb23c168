//! Filter operators.

use crate::policy::FilterClass;
use std::fmt;

/// A recognized filter operator.
///
/// Request input names operators by tag; [`Operator::parse`] is the only way
/// in, so every operator the compiler handles is listed here and matched
/// exhaustively.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operator {
    /// `col LIKE '%v%'`.
    Like,
    /// `LOWER(col) LIKE lower('%v%')`.
    ILike,
    /// Same as [`Operator::Like`].
    Contains,
    /// `col LIKE 'v%'`.
    StartsWith,
    /// `col LIKE '%v'`.
    EndsWith,
    /// `col > v` (range class).
    Gt,
    /// `col >= v` (range class).
    Gte,
    /// `col < v` (range class).
    Lt,
    /// `col <= v` (range class).
    Lte,
    /// `col BETWEEN a AND b`.
    Between,
    /// `col NOT BETWEEN a AND b`.
    NotBetween,
    /// `DATE(col) = v`.
    DateEquals,
    /// `DATE(col) BETWEEN a AND b`.
    DateBetween,
    /// `col > v` on a date.
    DateAfter,
    /// `col < v` on a date.
    DateBefore,
    /// `col = TRUE`.
    IsTrue,
    /// `col = FALSE`.
    IsFalse,
    /// `col IN (...)`.
    In,
    /// `col NOT IN (...)`.
    NotIn,
    /// `col IS NULL`.
    IsNull,
    /// `col IS NOT NULL`.
    IsNotNull,
    /// `col = v`.
    Eq,
    /// `col != v`.
    Ne,
    /// `col > v`.
    GreaterThan,
    /// `col >= v`.
    GreaterOrEqual,
    /// `col < v`.
    LessThan,
    /// `col <= v`.
    LessOrEqual,
}

impl Operator {
    /// Parse an operator tag. Returns `None` for unrecognized tags.
    pub fn parse(tag: &str) -> Option<Self> {
        let op = match tag {
            "like" => Operator::Like,
            "ilike" => Operator::ILike,
            "contains" => Operator::Contains,
            "starts_with" => Operator::StartsWith,
            "ends_with" => Operator::EndsWith,
            "gt" => Operator::Gt,
            "gte" => Operator::Gte,
            "lt" => Operator::Lt,
            "lte" => Operator::Lte,
            "between" => Operator::Between,
            "not_between" => Operator::NotBetween,
            "date_equals" => Operator::DateEquals,
            "date_between" => Operator::DateBetween,
            "date_after" => Operator::DateAfter,
            "date_before" => Operator::DateBefore,
            "is_true" => Operator::IsTrue,
            "is_false" => Operator::IsFalse,
            "in" => Operator::In,
            "not_in" => Operator::NotIn,
            "is_null" => Operator::IsNull,
            "is_not_null" => Operator::IsNotNull,
            "=" | "eq" => Operator::Eq,
            "!=" | "<>" | "ne" => Operator::Ne,
            ">" => Operator::GreaterThan,
            ">=" => Operator::GreaterOrEqual,
            "<" => Operator::LessThan,
            "<=" => Operator::LessOrEqual,
            _ => return None,
        };
        Some(op)
    }

    /// Capability class of an operator tag.
    ///
    /// Unrecognized tags classify as custom queries.
    pub fn class_of(tag: &str) -> FilterClass {
        match tag {
            "like" | "ilike" | "contains" | "starts_with" | "ends_with" => FilterClass::TextSearch,
            "gt" | "gte" | "lt" | "lte" | "between" => FilterClass::NumericRange,
            "date_equals" | "date_between" | "date_after" | "date_before" => FilterClass::DateRange,
            "is_true" | "is_false" => FilterClass::BooleanFilter,
            "in" | "not_in" => FilterClass::ArrayFilter,
            "is_null" | "is_not_null" => FilterClass::NullCheck,
            _ => FilterClass::CustomQueries,
        }
    }

    /// Number of values the operator binds, or `None` for a variable list.
    pub fn arity(&self) -> Option<usize> {
        match self {
            Operator::IsTrue | Operator::IsFalse | Operator::IsNull | Operator::IsNotNull => {
                Some(0)
            }
            Operator::Between | Operator::NotBetween | Operator::DateBetween => Some(2),
            Operator::In | Operator::NotIn => None,
            _ => Some(1),
        }
    }

    /// SQL comparison symbol for single-value comparisons.
    pub(crate) fn comparison_symbol(&self) -> Option<&'static str> {
        match self {
            Operator::Eq => Some("="),
            Operator::Ne => Some("!="),
            Operator::Gt | Operator::GreaterThan | Operator::DateAfter => Some(">"),
            Operator::Gte | Operator::GreaterOrEqual => Some(">="),
            Operator::Lt | Operator::LessThan | Operator::DateBefore => Some("<"),
            Operator::Lte | Operator::LessOrEqual => Some("<="),
            _ => None,
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_class_table() {
        assert_eq!(Operator::class_of("ilike"), FilterClass::TextSearch);
        assert_eq!(Operator::class_of("between"), FilterClass::NumericRange);
        assert_eq!(Operator::class_of("date_after"), FilterClass::DateRange);
        assert_eq!(Operator::class_of("is_false"), FilterClass::BooleanFilter);
        assert_eq!(Operator::class_of("not_in"), FilterClass::ArrayFilter);
        assert_eq!(Operator::class_of("is_not_null"), FilterClass::NullCheck);
        assert_eq!(Operator::class_of("="), FilterClass::CustomQueries);
        assert_eq!(Operator::class_of("not_between"), FilterClass::CustomQueries);
        assert_eq!(Operator::class_of("regexp"), FilterClass::CustomQueries);
    }

    #[test]
    fn test_parse_aliases() {
        assert_eq!(Operator::parse("eq"), Some(Operator::Eq));
        assert_eq!(Operator::parse("<>"), Some(Operator::Ne));
        assert_eq!(Operator::parse("regexp"), None);
        assert_eq!(Operator::parse("LIKE"), None);
    }

    #[test]
    fn test_arity() {
        assert_eq!(Operator::IsNull.arity(), Some(0));
        assert_eq!(Operator::DateBetween.arity(), Some(2));
        assert_eq!(Operator::In.arity(), None);
        assert_eq!(Operator::StartsWith.arity(), Some(1));
    }
}
