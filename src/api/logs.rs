//! Audit-log viewer: filtered, paginated listing plus per-entry lookup and a
//! summary. All endpoints require the staff role.

use super::{
    types::{AuditLogEntry, LogStats, LogsPage},
    ApiClient, ApiError, ApiRequest,
};
use std::{fmt, str::FromStr};
use tracing::instrument;

pub const DEFAULT_LIMIT: u32 = 20;
pub const MAX_LIMIT: u32 = 200;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum LogSortField {
    #[default]
    Timestamp,
    Username,
    Role,
    Operation,
    Status,
}

impl LogSortField {
    pub const ALL: [Self; 5] = [
        Self::Timestamp,
        Self::Username,
        Self::Role,
        Self::Operation,
        Self::Status,
    ];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Timestamp => "timestamp",
            Self::Username => "username",
            Self::Role => "role",
            Self::Operation => "operation",
            Self::Status => "status",
        }
    }
}

impl fmt::Display for LogSortField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LogSortField {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|field| field.as_str().eq_ignore_ascii_case(value.trim()))
            .ok_or_else(|| {
                format!("unknown sort field {value:?}, expected timestamp|username|role|operation|status")
            })
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

impl SortOrder {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Asc => "asc",
            Self::Desc => "desc",
        }
    }
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SortOrder {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "asc" => Ok(Self::Asc),
            "desc" => Ok(Self::Desc),
            _ => Err(format!("unknown sort order {value:?}, expected asc|desc")),
        }
    }
}

/// Query state of the log viewer. Empty text filters are not sent.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LogFilters {
    pub page: u32,
    pub limit: u32,
    pub username: String,
    pub operation: String,
    pub status: String,
    pub role: String,
    pub from_date: Option<String>,
    pub to_date: Option<String>,
    pub ip_address: Option<String>,
    pub sort_by: LogSortField,
    pub sort_order: SortOrder,
}

impl Default for LogFilters {
    fn default() -> Self {
        Self {
            page: 1,
            limit: DEFAULT_LIMIT,
            username: String::new(),
            operation: String::new(),
            status: String::new(),
            role: String::new(),
            from_date: None,
            to_date: None,
            ip_address: None,
            sort_by: LogSortField::default(),
            sort_order: SortOrder::default(),
        }
    }
}

impl LogFilters {
    /// Query parameters for `GET /admin/logs`, skipping empty values.
    #[must_use]
    pub fn to_query(&self) -> Vec<(String, String)> {
        let mut query = vec![
            ("page".to_string(), self.page.max(1).to_string()),
            ("limit".to_string(), self.limit.clamp(1, MAX_LIMIT).to_string()),
        ];

        let optional = [
            ("username", Some(self.username.as_str())),
            ("operation", Some(self.operation.as_str())),
            ("status", Some(self.status.as_str())),
            ("role", Some(self.role.as_str())),
            ("from_date", self.from_date.as_deref()),
            ("to_date", self.to_date.as_deref()),
            ("ip_address", self.ip_address.as_deref()),
        ];
        for (key, value) in optional {
            if let Some(value) = value.map(str::trim).filter(|value| !value.is_empty()) {
                query.push((key.to_string(), value.to_string()));
            }
        }

        query.push(("sort_by".to_string(), self.sort_by.to_string()));
        query.push(("sort_order".to_string(), self.sort_order.to_string()));
        query
    }

    /// Applies edited filters: the listing starts over at the first page.
    pub fn apply(&mut self) {
        self.page = 1;
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }

    /// Number of pages for `total` entries at the current limit.
    #[must_use]
    pub fn total_pages(&self, total: u64) -> u32 {
        let limit = u64::from(self.limit.clamp(1, MAX_LIMIT));
        u32::try_from(total.div_ceil(limit)).unwrap_or(u32::MAX)
    }

    /// Advances one page unless already on the last one. Returns whether the
    /// page changed.
    pub fn next_page(&mut self, total: u64) -> bool {
        if self.page < self.total_pages(total) {
            self.page += 1;
            true
        } else {
            false
        }
    }

    pub fn prev_page(&mut self) -> bool {
        if self.page > 1 {
            self.page -= 1;
            true
        } else {
            false
        }
    }
}

#[instrument(skip(client))]
pub async fn list(client: &ApiClient, filters: &LogFilters) -> Result<LogsPage, ApiError> {
    client
        .json(ApiRequest::get("/admin/logs").query(filters.to_query()))
        .await
}

#[instrument(skip(client))]
pub async fn get(client: &ApiClient, id: i64) -> Result<AuditLogEntry, ApiError> {
    client.json(ApiRequest::get(format!("/admin/logs/{id}"))).await
}

/// Event counts, optionally bounded by ISO-8601 timestamps.
#[instrument(skip(client))]
pub async fn stats(
    client: &ApiClient,
    from_date: Option<&str>,
    to_date: Option<&str>,
) -> Result<LogStats, ApiError> {
    let query = [("from_date", from_date), ("to_date", to_date)]
        .into_iter()
        .filter_map(|(key, value)| {
            value
                .map(str::trim)
                .filter(|value| !value.is_empty())
                .map(|value| (key.to_string(), value.to_string()))
        })
        .collect();

    client
        .json(ApiRequest::get("/admin/logs/stats/summary").query(query))
        .await
}
