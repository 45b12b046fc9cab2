mod audit;
mod common;
mod records;

pub use audit::{AuditLogEntryResponse, AuditLogPageResponse};
pub use common::{AuditWriterStatsResponse, HealthResponse};
pub use records::{RecordDataRequest, RecordPageResponse, RecordResponse};

use quire_application::PageSize;

/// Page size reported to clients; `None` when the whole result set was returned.
fn reported_page_size(page_size: PageSize) -> Option<usize> {
    page_size.limit()
}
