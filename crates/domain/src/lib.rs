//! Domain entities and invariants.

#![forbid(unsafe_code)]

mod audit;
mod record;
mod resource;
mod security;

pub use audit::{AUDIT_LOG_RESOURCE_TYPE, AuditLogEntry};
pub use record::{RECORD_ID_FIELD, Record};
pub use resource::{
    Association, FilterModifier, FilterSpec, FilterTarget, ResourceDefinition, ResourceExposure,
    ResourceSort, SearchableFieldSet, SortDirection,
};
pub use security::{FrameworkEvent, Permission, ResourceAction};
