use chrono::SecondsFormat;
use quire_application::Page;
use quire_domain::AuditLogEntry;
use serde::Serialize;
use serde_json::Value;
use ts_rs::TS;

use super::reported_page_size;

/// API representation of an audit log entry.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../../packages/api-types/src/generated/audit-log-entry-response.ts"
)]
pub struct AuditLogEntryResponse {
    pub id: String,
    pub action: String,
    #[ts(type = "unknown")]
    pub user: Option<Value>,
    #[ts(type = "unknown")]
    pub details: Option<Value>,
    pub created_at: String,
}

impl From<AuditLogEntry> for AuditLogEntryResponse {
    fn from(value: AuditLogEntry) -> Self {
        Self {
            id: value.entry_id().to_string(),
            action: value.action().to_owned(),
            user: value.user().cloned(),
            details: value.details().cloned(),
            created_at: value
                .created_at()
                .to_rfc3339_opts(SecondsFormat::Micros, true),
        }
    }
}

/// One page of audit log entries, most recent first.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../../packages/api-types/src/generated/audit-log-page-response.ts"
)]
pub struct AuditLogPageResponse {
    pub items: Vec<AuditLogEntryResponse>,
    #[ts(type = "number")]
    pub page: usize,
    #[ts(type = "number | null")]
    pub count: Option<usize>,
    #[ts(type = "number")]
    pub total: usize,
    #[ts(type = "number")]
    pub total_pages: usize,
}

impl From<Page<AuditLogEntry>> for AuditLogPageResponse {
    fn from(value: Page<AuditLogEntry>) -> Self {
        Self {
            items: value
                .items
                .into_iter()
                .map(AuditLogEntryResponse::from)
                .collect(),
            page: value.page_number,
            count: reported_page_size(value.page_size),
            total: value.total_count,
            total_pages: value.total_pages,
        }
    }
}
