//! Pagination ceilings per role.

use serde::{Deserialize, Serialize};

/// Pagination limits for a role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaginationLimits {
    /// Largest page size the role may request.
    pub max_limit: u64,
    /// Page size used when the request does not name one.
    pub default_limit: u64,
    /// Largest row offset the role may request.
    pub max_offset: u64,
}

/// Resolved LIMIT/OFFSET for one read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PageWindow {
    /// Effective LIMIT.
    pub limit: u64,
    /// Effective OFFSET.
    pub offset: u64,
    /// Page number, when the request was page-based.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<u64>,
}

impl Default for PaginationLimits {
    fn default() -> Self {
        Self::restrictive()
    }
}

impl PaginationLimits {
    /// Create custom limits.
    pub fn new(max_limit: u64, default_limit: u64, max_offset: u64) -> Self {
        Self {
            max_limit,
            default_limit,
            max_offset,
        }
    }

    /// Limits applied to roles without an entry.
    pub fn restrictive() -> Self {
        Self::new(10, 10, 100)
    }

    /// Clamp a requested page size.
    pub fn clamp_limit(&self, requested: Option<i64>) -> u64 {
        let upper = self.max_limit.max(1);
        match requested {
            Some(n) if n < 1 => 1,
            Some(n) => u64::try_from(n).unwrap_or(upper).min(upper),
            None => self.default_limit.clamp(1, upper),
        }
    }

    /// Clamp a requested offset.
    pub fn clamp_offset(&self, requested: Option<i64>) -> u64 {
        match requested {
            Some(n) if n < 0 => 0,
            Some(n) => u64::try_from(n).unwrap_or(self.max_offset).min(self.max_offset),
            None => 0,
        }
    }

    /// Resolve the effective window for a read.
    ///
    /// The limit is clamped first. When a page number is present the offset
    /// is derived from it and the clamped limit, then clamped again; an
    /// explicit offset is ignored in that case.
    pub fn window(&self, limit: Option<i64>, offset: Option<i64>, page: Option<i64>) -> PageWindow {
        let limit = self.clamp_limit(limit);
        match page {
            Some(page) => {
                let page = u64::try_from(page).unwrap_or(1).max(1);
                let raw = (page - 1).saturating_mul(limit);
                PageWindow {
                    limit,
                    offset: raw.min(self.max_offset),
                    page: Some(page),
                }
            }
            None => PageWindow {
                limit,
                offset: self.clamp_offset(offset),
                page: None,
            },
        }
    }
}
