//! Audit stamping and timestamp normalization.

use chrono::{DateTime, NaiveDateTime, Utc};

/// Creation timestamp column.
pub const CREATED_AT: &str = "created_at";
/// Last update timestamp column.
pub const UPDATED_AT: &str = "updated_at";
/// Creating user column.
pub const CREATED_BY: &str = "created_by";
/// Last updating user column.
pub const UPDATED_BY: &str = "updated_by";

/// Format used for DATETIME values.
pub const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Who wrote a row, and when.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuditStamp {
    /// Acting user.
    pub user_id: String,
    /// Write time, UTC.
    pub at: NaiveDateTime,
}

impl AuditStamp {
    /// Stamp for a write happening now.
    pub fn now(user_id: impl Into<String>) -> Self {
        Self::at(user_id, Utc::now().naive_utc())
    }

    /// Stamp for a write at a fixed time.
    pub fn at(user_id: impl Into<String>, at: NaiveDateTime) -> Self {
        Self {
            user_id: user_id.into(),
            at,
        }
    }

    /// The write time in DATETIME form.
    pub fn timestamp(&self) -> String {
        self.at.format(DATETIME_FORMAT).to_string()
    }
}

/// Check whether a column name marks a date/time column.
pub fn is_temporal_column(column: &str) -> bool {
    column.contains("_at") || column.contains("_date") || column.contains("_time")
}

/// Rewrite an RFC 3339 UTC string (`...Z`) as `YYYY-MM-DD HH:MM:SS`.
///
/// Returns `None` when the text is not in that form.
pub fn normalize_timestamp(text: &str) -> Option<String> {
    if !text.ends_with('Z') {
        return None;
    }
    DateTime::parse_from_rfc3339(text)
        .ok()
        .map(|dt| dt.naive_utc().format(DATETIME_FORMAT).to_string())
}
