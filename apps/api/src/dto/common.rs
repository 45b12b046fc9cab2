use quire_application::AuditWriterStats;
use serde::Serialize;
use ts_rs::TS;

/// Health response payload.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../../packages/api-types/src/generated/health-response.ts"
)]
pub struct HealthResponse {
    /// `ok`, or `degraded` once audit entries have been lost.
    pub status: &'static str,
    pub audit: AuditWriterStatsResponse,
}

/// Audit writer counters since startup.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../../packages/api-types/src/generated/audit-writer-stats-response.ts"
)]
pub struct AuditWriterStatsResponse {
    #[ts(type = "number")]
    pub written: u64,
    #[ts(type = "number")]
    pub failed: u64,
    #[ts(type = "number")]
    pub dropped: u64,
}

impl From<AuditWriterStats> for AuditWriterStatsResponse {
    fn from(value: AuditWriterStats) -> Self {
        Self {
            written: value.written,
            failed: value.failed,
            dropped: value.dropped,
        }
    }
}
