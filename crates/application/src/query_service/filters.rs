use super::*;

impl QueryService {
    /// Narrows the dataset by every declared filter whose parameter is present.
    ///
    /// Dotted filters resolve the related record first and then match on its identity.
    /// A related value that matches nothing yields an empty result, never an error.
    pub async fn apply_filters(
        &self,
        definition: &ResourceDefinition,
        mut dataset: Dataset,
        params: &ListParams,
    ) -> AppResult<Dataset> {
        for spec in definition.filters() {
            let Some(raw) = params.get(spec.name()) else {
                continue;
            };
            let value = spec.modifier().convert(spec.name(), raw)?;

            let condition = match spec.target()? {
                FilterTarget::Field(field) => RecordFilter::equals(field, value),
                FilterTarget::Association {
                    association,
                    target_field,
                } => {
                    let association = definition.association(association).ok_or_else(|| {
                        let error = AppError::Configuration(format!(
                            "resource '{}' filter '{}' references unknown association '{association}'",
                            definition.resource_type(),
                            spec.name()
                        ));
                        error!(%error, "rejecting filter on undeclared association");
                        error
                    })?;

                    let related_id = self
                        .resolve_related_id(association, target_field, value)
                        .await?;
                    RecordFilter::references(association.foreign_key(), related_id.as_deref())
                }
            };

            dataset = dataset.narrow(RecordConditionNode::Filter(condition));
        }

        Ok(dataset)
    }

    async fn resolve_related_id(
        &self,
        association: &Association,
        target_field: &str,
        value: Value,
    ) -> AppResult<Option<String>> {
        let target = self
            .registry
            .get(association.target_resource_type())
            .map_err(|_| {
                AppError::Configuration(format!(
                    "association '{}' targets unregistered resource '{}'",
                    association.name(),
                    association.target_resource_type()
                ))
            })?;

        let query = RecordQuery::for_resource(association.target_resource_type())
            .narrowed(RecordConditionNode::Filter(RecordFilter::equals(
                target_field,
                value,
            )));
        let related = target
            .store()
            .query_records(
                &query,
                Some(RecordWindow {
                    offset: 0,
                    limit: 1,
                }),
            )
            .await?;

        Ok(related
            .into_iter()
            .next()
            .map(|record| record.record_id().as_str().to_owned()))
    }
}
