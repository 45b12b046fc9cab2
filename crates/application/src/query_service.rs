use std::sync::Arc;

use quire_core::{AppError, AppResult, UserIdentity};
use quire_domain::{
    Association, FilterTarget, RECORD_ID_FIELD, Record, ResourceAction, ResourceDefinition,
    ResourceExposure,
};
use serde_json::Value;
use tracing::{debug, error};

use crate::{
    Dataset, RecordConditionNode, RecordFilter, RecordQuery, RecordWindow, RegisteredResource,
    ResourceRegistry,
};

mod filters;
mod pagination;
mod params;
mod search;


pub use pagination::paginate;
pub use params::{
    COUNT_PARAMETER, DEFAULT_PAGE_SIZE, ListParams, PAGE_PARAMETER, Page, PageRequest, PageSize,
    SEARCH_PARAMETER,
};
pub use search::apply_search;

/// Read path shared by every resource listing.
///
/// Stages run as scope, filters, search, default ordering, pagination. Each stage only
/// narrows or reorders the candidate set.
#[derive(Clone)]
pub struct QueryService {
    registry: Arc<ResourceRegistry>,
}

impl QueryService {
    /// Creates a query service over a resource catalog.
    #[must_use]
    pub fn new(registry: Arc<ResourceRegistry>) -> Self {
        Self { registry }
    }

    /// Returns the resource catalog.
    #[must_use]
    pub fn registry(&self) -> &ResourceRegistry {
        &self.registry
    }

    /// Lists one page of records visible to the actor.
    pub async fn list(
        &self,
        actor: &UserIdentity,
        resource_type: &str,
        params: &ListParams,
    ) -> AppResult<Page<Record>> {
        let request = PageRequest::from_params(params)?;
        let resource = self.registry.get(resource_type)?;
        resource
            .policy()
            .authorize(actor, ResourceAction::List)
            .await?;

        let definition = resource.definition();
        let dataset = self
            .scope(actor, resource, Dataset::query(resource_type))
            .await?;
        let dataset = self.apply_filters(definition, dataset, params).await?;
        let dataset = apply_search(dataset, definition.searchable_fields(), params.search());
        let dataset = dataset.ordered(definition.default_sort());

        debug!(
            resource_type,
            subject = actor.subject(),
            materialized = dataset.is_materialized(),
            "listing resource"
        );
        paginate(resource.store().as_ref(), dataset, request).await
    }

    /// Reads one record visible to the actor.
    pub async fn read(
        &self,
        actor: &UserIdentity,
        resource_type: &str,
        record_id: &str,
    ) -> AppResult<Record> {
        let resource = self.registry.get(resource_type)?;
        if resource.definition().exposure() == ResourceExposure::ListOnly {
            return Err(not_found(resource_type, record_id));
        }

        resource
            .policy()
            .authorize(actor, ResourceAction::Read)
            .await?;

        self.find_in_scope(actor, resource, record_id)
            .await?
            .ok_or_else(|| not_found(resource_type, record_id))
    }

    /// Narrows a dataset to the actor's scope using the resource policy.
    pub async fn scope(
        &self,
        actor: &UserIdentity,
        resource: &RegisteredResource,
        dataset: Dataset,
    ) -> AppResult<Dataset> {
        let resource_type = resource.definition().resource_type();
        let scoped = resource.policy().scope(actor, dataset).await?;

        if let Dataset::Query(query) = &scoped
            && query.resource_type != resource_type
        {
            return Err(AppError::Configuration(format!(
                "scope policy for '{resource_type}' returned a dataset of '{}'",
                query.resource_type
            )));
        }

        Ok(scoped)
    }

    pub(crate) async fn find_in_scope(
        &self,
        actor: &UserIdentity,
        resource: &RegisteredResource,
        record_id: &str,
    ) -> AppResult<Option<Record>> {
        let resource_type = resource.definition().resource_type();
        let dataset = self
            .scope(actor, resource, Dataset::query(resource_type))
            .await?
            .narrow(RecordConditionNode::Filter(RecordFilter::equals(
                RECORD_ID_FIELD,
                Value::String(record_id.to_owned()),
            )));

        let request = PageRequest {
            page_number: 1,
            page_size: PageSize::Limited(1),
        };
        let page = paginate(resource.store().as_ref(), dataset, request).await?;
        Ok(page.items.into_iter().next())
    }
}

fn not_found(resource_type: &str, record_id: &str) -> AppError {
    AppError::NotFound(format!(
        "record '{record_id}' of resource '{resource_type}' does not exist"
    ))
}
