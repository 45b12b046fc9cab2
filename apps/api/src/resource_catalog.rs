use std::sync::Arc;

use quire_application::{
    AuditLogService, AuthorizationService, PermissionResourcePolicy, RecordStore,
    RecordWriteStore, RegisteredResource, ResourcePolicy, ResourceRegistry,
};
use quire_core::AppResult;
use quire_domain::{
    Association, FilterModifier, FilterSpec, ResourceDefinition, ResourceSort,
    SearchableFieldSet, SortDirection,
};

pub const CUSTOMER_RESOURCE_TYPE: &str = "customer";
pub const ORDER_RESOURCE_TYPE: &str = "order";

/// Record field holding the subject that owns a customer or order.
pub const OWNER_FIELD: &str = "owner";

/// Stores backing the catalog, already bound to the chosen backend.
pub struct CatalogStores {
    pub records: Arc<dyn RecordStore>,
    pub record_writer: Arc<dyn RecordWriteStore>,
    pub audit_records: Arc<dyn RecordStore>,
}

pub fn customer_definition() -> AppResult<ResourceDefinition> {
    Ok(
        ResourceDefinition::new(CUSTOMER_RESOURCE_TYPE, "Customers")?
            .with_filter(FilterSpec::new("country")?)
            .with_filter(FilterSpec::new("active")?.with_modifier(FilterModifier::Boolean))
            .with_searchable_fields(SearchableFieldSet::new(["name", "email"])?)
            .with_default_sort(ResourceSort::new("name", SortDirection::Asc)?),
    )
}

pub fn order_definition() -> AppResult<ResourceDefinition> {
    Ok(ResourceDefinition::new(ORDER_RESOURCE_TYPE, "Orders")?
        .with_association(Association::new(
            "customer",
            CUSTOMER_RESOURCE_TYPE,
            "customer_id",
        )?)
        .with_filter(FilterSpec::new("status")?)
        .with_filter(FilterSpec::new("quantity")?.with_modifier(FilterModifier::Integer))
        .with_filter(FilterSpec::new("customer")?.with_field("customer.name")?)
        .with_searchable_fields(SearchableFieldSet::new(["reference", "status"])?)
        .with_default_sort(ResourceSort::new("placed_on", SortDirection::Desc)?))
}

/// Registers every exposed resource. Association targets go first.
pub fn build_registry(
    stores: &CatalogStores,
    authorization_service: AuthorizationService,
) -> AppResult<ResourceRegistry> {
    let record_policy: Arc<dyn ResourcePolicy> = Arc::new(
        PermissionResourcePolicy::records(authorization_service.clone())
            .with_owner_field(OWNER_FIELD),
    );

    let mut registry = ResourceRegistry::new();
    registry.register(
        RegisteredResource::new(
            customer_definition()?,
            stores.records.clone(),
            record_policy.clone(),
        )
        .with_writer(stores.record_writer.clone()),
    )?;
    registry.register(
        RegisteredResource::new(order_definition()?, stores.records.clone(), record_policy)
            .with_writer(stores.record_writer.clone()),
    )?;
    registry.register(RegisteredResource::new(
        AuditLogService::resource_definition()?,
        stores.audit_records.clone(),
        Arc::new(PermissionResourcePolicy::audit_log(authorization_service)),
    ))?;

    Ok(registry)
}
