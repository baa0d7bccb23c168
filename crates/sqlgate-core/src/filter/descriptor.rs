//! Filter descriptors as received from callers.

use crate::value::Scalar;
use serde::{Deserialize, Serialize};

/// Logical connective attached to a descriptor.
///
/// Accepted for compatibility and ignored: compiled conditions are always
/// AND-joined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Logic {
    /// Conjunction.
    And,
    /// Disjunction.
    Or,
}

/// Value of a filter descriptor: one scalar or a list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FilterValue {
    /// A single scalar.
    One(Scalar),
    /// A list, used by ranges and set membership.
    Many(Vec<Scalar>),
}

impl Default for FilterValue {
    fn default() -> Self {
        FilterValue::One(Scalar::Null)
    }
}

impl From<Scalar> for FilterValue {
    fn from(value: Scalar) -> Self {
        FilterValue::One(value)
    }
}

impl From<Vec<Scalar>> for FilterValue {
    fn from(values: Vec<Scalar>) -> Self {
        FilterValue::Many(values)
    }
}

/// One abstract filter: `column operator value`.
///
/// The column and operator are untrusted strings. They are validated by the
/// compiler, not by deserialization, and a bad descriptor is dropped alone.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterDescriptor {
    /// Target column.
    pub column: String,
    /// Operator tag.
    pub operator: String,
    /// Operand(s).
    #[serde(default)]
    pub value: FilterValue,
    /// Connective, ignored.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logic: Option<Logic>,
}

impl FilterDescriptor {
    /// Create a descriptor.
    pub fn new(
        column: impl Into<String>,
        operator: impl Into<String>,
        value: impl Into<FilterValue>,
    ) -> Self {
        Self {
            column: column.into(),
            operator: operator.into(),
            value: value.into(),
            logic: None,
        }
    }

    /// Create a descriptor for an operator that binds no value.
    pub fn unary(column: impl Into<String>, operator: impl Into<String>) -> Self {
        Self::new(column, operator, FilterValue::default())
    }

    /// Set the connective.
    pub fn with_logic(mut self, logic: Logic) -> Self {
        self.logic = Some(logic);
        self
    }

    /// Parse a JSON array of descriptors, as carried in a `filters` query
    /// parameter.
    pub fn parse_list(json: &str) -> Result<Vec<Self>, serde_json::Error> {
        serde_json::from_str(json)
    }
}
