//! Column visibility sets.

use serde::de::{self, Deserializer};
use serde::ser::Serializer;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Columns a role may see or write on a table.
///
/// `All` is a wildcard and is never expanded into a list: it admits every
/// column name, including ones the policy author never enumerated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Columns {
    /// Every column of the table.
    All,
    /// Only the named columns.
    Named(BTreeSet<String>),
}

impl Default for Columns {
    fn default() -> Self {
        Columns::Named(BTreeSet::new())
    }
}

impl Columns {
    /// Create a named column set.
    pub fn named<I, S>(columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Columns::Named(columns.into_iter().map(|c| c.as_ref().to_string()).collect())
    }

    /// Check if this is the wildcard.
    pub fn is_all(&self) -> bool {
        matches!(self, Columns::All)
    }

    /// Check if no column is visible.
    pub fn is_empty(&self) -> bool {
        match self {
            Columns::All => false,
            Columns::Named(set) => set.is_empty(),
        }
    }

    /// Check if the column is admitted.
    pub fn allows(&self, column: &str) -> bool {
        match self {
            Columns::All => true,
            Columns::Named(set) => set.contains(column),
        }
    }

    /// Intersect a requested column list with this set.
    ///
    /// Keeps the caller's order and drops duplicates. The wildcard admits
    /// every requested name unchanged.
    pub fn intersect<'a, I>(&self, requested: I) -> Vec<String>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut seen = BTreeSet::new();
        requested
            .into_iter()
            .filter(|c| self.allows(c))
            .filter(|c| seen.insert(*c))
            .map(str::to_string)
            .collect()
    }
}

/// Policy document form: the string `"*"` or a list of names.
#[derive(Deserialize)]
#[serde(untagged)]
enum ColumnsRepr {
    Wildcard(String),
    Named(Vec<String>),
}

impl<'de> Deserialize<'de> for Columns {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        match ColumnsRepr::deserialize(deserializer)? {
            ColumnsRepr::Wildcard(s) if s == "*" => Ok(Columns::All),
            ColumnsRepr::Wildcard(other) => Err(de::Error::custom(format!(
                "expected \"*\" or a list of column names, got \"{}\"",
                other
            ))),
            ColumnsRepr::Named(names) => Ok(Columns::Named(names.into_iter().collect())),
        }
    }
}

impl Serialize for Columns {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            Columns::All => serializer.serialize_str("*"),
            Columns::Named(set) => set.serialize(serializer),
        }
    }
}
