//! Filter capability classes.
//!
//! Every filter operator belongs to exactly one class, and each role is
//! granted a subset of classes. A descriptor whose class is not granted is
//! dropped from the read path.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Class of filter operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FilterClass {
    /// LIKE-style text matching.
    TextSearch,
    /// Ordered comparisons and ranges.
    NumericRange,
    /// Date comparisons and ranges.
    DateRange,
    /// `is_true` / `is_false`.
    BooleanFilter,
    /// `in` / `not_in`.
    ArrayFilter,
    /// `is_null` / `is_not_null`.
    NullCheck,
    /// Everything else, including plain comparisons and unknown operators.
    CustomQueries,
}

impl fmt::Display for FilterClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FilterClass::TextSearch => "textSearch",
            FilterClass::NumericRange => "numericRange",
            FilterClass::DateRange => "dateRange",
            FilterClass::BooleanFilter => "booleanFilter",
            FilterClass::ArrayFilter => "arrayFilter",
            FilterClass::NullCheck => "nullCheck",
            FilterClass::CustomQueries => "customQueries",
        };
        f.write_str(name)
    }
}

/// Per-role filter class grants.
///
/// Missing fields in a policy document default to `false`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FilterCapabilities {
    /// Grant for [`FilterClass::TextSearch`].
    pub text_search: bool,
    /// Grant for [`FilterClass::NumericRange`].
    pub numeric_range: bool,
    /// Grant for [`FilterClass::DateRange`].
    pub date_range: bool,
    /// Grant for [`FilterClass::BooleanFilter`].
    pub boolean_filter: bool,
    /// Grant for [`FilterClass::ArrayFilter`].
    pub array_filter: bool,
    /// Grant for [`FilterClass::NullCheck`].
    pub null_check: bool,
    /// Grant for [`FilterClass::CustomQueries`].
    pub custom_queries: bool,
}

impl FilterCapabilities {
    /// No filter class granted.
    pub fn none() -> Self {
        Self::default()
    }

    /// Every filter class granted.
    pub fn all() -> Self {
        Self {
            text_search: true,
            numeric_range: true,
            date_range: true,
            boolean_filter: true,
            array_filter: true,
            null_check: true,
            custom_queries: true,
        }
    }

    /// Check whether a class is granted.
    pub fn allows(&self, class: FilterClass) -> bool {
        match class {
            FilterClass::TextSearch => self.text_search,
            FilterClass::NumericRange => self.numeric_range,
            FilterClass::DateRange => self.date_range,
            FilterClass::BooleanFilter => self.boolean_filter,
            FilterClass::ArrayFilter => self.array_filter,
            FilterClass::NullCheck => self.null_check,
            FilterClass::CustomQueries => self.custom_queries,
        }
    }

    /// Return a copy with one class granted or revoked.
    pub fn with(mut self, class: FilterClass, granted: bool) -> Self {
        let slot = match class {
            FilterClass::TextSearch => &mut self.text_search,
            FilterClass::NumericRange => &mut self.numeric_range,
            FilterClass::DateRange => &mut self.date_range,
            FilterClass::BooleanFilter => &mut self.boolean_filter,
            FilterClass::ArrayFilter => &mut self.array_filter,
            FilterClass::NullCheck => &mut self.null_check,
            FilterClass::CustomQueries => &mut self.custom_queries,
        };
        *slot = granted;
        self
    }
}
