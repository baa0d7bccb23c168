//! ORDER BY parsing.
//!
//! Ordering arrives as free text (`"start_time DESC, title"`). It is never
//! passed through: every term is re-emitted from validated parts.

use crate::ident::is_valid_identifier;
use crate::policy::Columns;
use std::fmt;
use tracing::debug;

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OrderDirection {
    /// Ascending.
    #[default]
    Asc,
    /// Descending.
    Desc,
}

impl OrderDirection {
    fn parse(s: &str) -> Option<Self> {
        if s.eq_ignore_ascii_case("asc") {
            Some(OrderDirection::Asc)
        } else if s.eq_ignore_ascii_case("desc") {
            Some(OrderDirection::Desc)
        } else {
            None
        }
    }
}

impl fmt::Display for OrderDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OrderDirection::Asc => write!(f, "ASC"),
            OrderDirection::Desc => write!(f, "DESC"),
        }
    }
}

/// One validated ORDER BY term.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderTerm {
    /// Column to sort by.
    pub column: String,
    /// Direction.
    pub direction: OrderDirection,
}

impl fmt::Display for OrderTerm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.column, self.direction)
    }
}

/// Parse a comma-separated ORDER BY string, keeping only terms on visible
/// columns with a recognized direction.
pub fn parse_order(raw: &str, columns: &Columns) -> Vec<OrderTerm> {
    raw.split(',')
        .map(str::trim)
        .filter(|term| !term.is_empty())
        .filter_map(|term| {
            let parsed = parse_term(term, columns);
            if parsed.is_none() {
                debug!(term, "dropping order term");
            }
            parsed
        })
        .collect()
}

fn parse_term(term: &str, columns: &Columns) -> Option<OrderTerm> {
    let mut parts = term.split_whitespace();
    let column = parts.next()?;
    let direction = match parts.next() {
        Some(dir) => OrderDirection::parse(dir)?,
        None => OrderDirection::Asc,
    };
    if parts.next().is_some() || !is_valid_identifier(column) || !columns.allows(column) {
        return None;
    }
    Some(OrderTerm {
        column: column.to_string(),
        direction,
    })
}

/// Render terms as an ORDER BY list.
pub fn render_order(terms: &[OrderTerm]) -> String {
    terms
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}
