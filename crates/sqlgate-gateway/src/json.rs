//! JSON request and response types for the HTTP gateway.

use serde::{Deserialize, Serialize};
use sqlgate_core::{FilterDescriptor, ReadRequest, Record, UpdateEntry};

use crate::error::AppError;

/// Generic success response wrapper.
#[derive(Debug, Serialize)]
pub struct SuccessResponse<T: Serialize> {
    /// Success flag.
    pub success: bool,
    /// Human-readable message.
    pub message: String,
    /// Response data.
    pub data: T,
}

impl<T: Serialize> SuccessResponse<T> {
    /// Create a new success response.
    pub fn new(message: impl Into<String>, data: T) -> Self {
        Self {
            success: true,
            message: message.into(),
            data,
        }
    }
}

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Health status.
    pub status: String,
    /// Gateway version.
    pub version: String,
    /// Whether the database answered a ping.
    pub database_connected: bool,
}

/// Query parameters of a secure select.
#[derive(Debug, Default, Deserialize)]
pub struct SelectParams {
    /// Comma-separated projection.
    pub select: Option<String>,
    /// JSON array of filter descriptors.
    pub filters: Option<String>,
    /// Raw condition text.
    #[serde(rename = "where")]
    pub raw_where: Option<String>,
    /// ORDER BY text.
    pub order: Option<String>,
    /// Page number.
    pub page: Option<i64>,
    /// Page size.
    pub limit: Option<i64>,
    /// Row offset.
    pub offset: Option<i64>,
    /// Also return the total row count.
    pub count: Option<bool>,
}

impl SelectParams {
    /// Convert into a core read request.
    pub fn into_read_request(self) -> Result<ReadRequest, AppError> {
        let select = self.select.and_then(|raw| {
            let columns: Vec<String> = raw
                .split(',')
                .map(str::trim)
                .filter(|c| !c.is_empty())
                .map(str::to_string)
                .collect();
            (!columns.is_empty()).then_some(columns)
        });
        let filters = match self.filters.as_deref().map(str::trim) {
            Some(raw) if !raw.is_empty() => FilterDescriptor::parse_list(raw)?,
            _ => Vec::new(),
        };

        Ok(ReadRequest {
            select,
            filters,
            raw_where: self.raw_where,
            order: self.order,
            page: self.page,
            limit: self.limit,
            offset: self.offset,
            include_count: self.count.unwrap_or(false),
        })
    }
}

/// Body of a single insert.
#[derive(Debug, Deserialize)]
pub struct InsertBody {
    /// Column values.
    pub data: Record,
}

/// Body of a bulk insert.
#[derive(Debug, Deserialize)]
pub struct BulkInsertBody {
    /// Records to insert.
    pub records: Vec<Record>,
}

/// Body of a bulk update.
#[derive(Debug, Deserialize)]
pub struct BulkUpdateBody {
    /// Updates to apply.
    pub updates: Vec<UpdateEntry>,
}

/// Body of a delete.
#[derive(Debug, Default, Deserialize)]
pub struct DeleteBody {
    /// Equality conditions.
    #[serde(rename = "where", default)]
    pub conditions: Record,
}
