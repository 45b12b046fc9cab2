//! Application services and ports.

#![forbid(unsafe_code)]

mod audit_log_service;
mod audit_ports;
mod audit_writer;
mod authorization_service;
mod dataset;
mod event_bus;
mod query_service;
mod record_command_service;
mod record_ports;
mod resource_policy;
mod resource_registry;

pub use audit_log_service::AuditLogService;
pub use audit_ports::AuditLogRepository;
pub use audit_writer::{
    AuditListener, AuditWriter, AuditWriterConfig, AuditWriterHandle, AuditWriterStats,
};
pub use authorization_service::{AuthorizationRepository, AuthorizationService};
pub use dataset::Dataset;
pub use event_bus::{DomainEvent, EventBus, EventBusBuilder, EventSubscriber};
pub use query_service::{
    COUNT_PARAMETER, DEFAULT_PAGE_SIZE, ListParams, PAGE_PARAMETER, Page, PageRequest, PageSize,
    QueryService, SEARCH_PARAMETER, apply_search, paginate,
};
pub use record_command_service::RecordCommandService;
pub use record_ports::{
    RecordConditionGroup, RecordConditionNode, RecordFilter, RecordLogicalMode, RecordOperator,
    RecordQuery, RecordStore, RecordWindow, RecordWriteStore, compare_field_values, sort_records,
};
pub use resource_policy::{PermissionResourcePolicy, ResourcePolicy};
pub use resource_registry::{RegisteredResource, ResourceRegistry};
