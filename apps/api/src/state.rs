use quire_application::{AuditLogService, AuditWriterHandle, QueryService, RecordCommandService};

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub query_service: QueryService,
    pub record_command_service: RecordCommandService,
    pub audit_log_service: AuditLogService,
    pub audit_writer: AuditWriterHandle,
}
