use async_trait::async_trait;
use quire_core::AppResult;
use quire_domain::AuditLogEntry;

/// Append-only persistence port for audit entries.
#[async_trait]
pub trait AuditLogRepository: Send + Sync {
    /// Appends one entry. Existing entries are never changed.
    async fn append_entry(&self, entry: AuditLogEntry) -> AppResult<()>;
}
