use quire_application::{
    RecordConditionGroup, RecordConditionNode, RecordFilter, RecordLogicalMode, RecordOperator,
    RecordQuery, RecordWindow,
};
use quire_core::{AppError, AppResult};
use quire_domain::{RECORD_ID_FIELD, Record, SortDirection};
use serde_json::Value;
use sqlx::{FromRow, PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

/// Plain record table.
pub(crate) const RECORDS_RELATION: &str = "records";

/// Audit entries projected into the record shape.
pub(crate) const AUDIT_LOG_RELATION: &str = r#"(
    SELECT
        id,
        'audit_log'::TEXT AS resource_type,
        jsonb_build_object(
            'action', action,
            'user', "user",
            'details', details,
            'created_at', to_char(created_at AT TIME ZONE 'UTC', 'YYYY-MM-DD"T"HH24:MI:SS.US"Z"')
        ) AS data,
        created_at
    FROM audit_log_entries
)"#;

#[derive(Debug, FromRow)]
struct RecordRow {
    id: Uuid,
    resource_type: String,
    data: Value,
}

pub(crate) async fn count_records(
    pool: &PgPool,
    relation: &str,
    query: &RecordQuery,
) -> AppResult<usize> {
    let mut builder = QueryBuilder::new("SELECT COUNT(*) FROM ");
    push_from_where(&mut builder, relation, query);

    let count = builder
        .build_query_scalar::<i64>()
        .fetch_one(pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!(
                "failed to count records of resource '{}': {error}",
                query.resource_type
            ))
        })?;

    usize::try_from(count)
        .map_err(|error| AppError::Internal(format!("invalid record count {count}: {error}")))
}

pub(crate) async fn query_records(
    pool: &PgPool,
    relation: &str,
    query: &RecordQuery,
    window: Option<RecordWindow>,
) -> AppResult<Vec<Record>> {
    let rows = build_select(relation, query, window)?
        .build_query_as::<RecordRow>()
        .fetch_all(pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!(
                "failed to query records of resource '{}': {error}",
                query.resource_type
            ))
        })?;

    rows.into_iter()
        .map(|row| Record::new(row.id.to_string(), row.resource_type, row.data))
        .collect()
}

pub(crate) fn build_select(
    relation: &str,
    query: &RecordQuery,
    window: Option<RecordWindow>,
) -> AppResult<QueryBuilder<'static, Postgres>> {
    let mut builder =
        QueryBuilder::new("SELECT source.id, source.resource_type, source.data FROM ");
    push_from_where(&mut builder, relation, query);

    builder.push(" ORDER BY ");
    for sort in &query.sort {
        push_field_for_sort(&mut builder, sort.field_name());
        match sort.direction() {
            SortDirection::Asc => builder.push(" ASC, "),
            SortDirection::Desc => builder.push(" DESC, "),
        };
    }
    builder.push("source.created_at ASC, source.id ASC");

    if let Some(window) = window {
        let limit = i64::try_from(window.limit).unwrap_or(i64::MAX);
        let offset = i64::try_from(window.offset).map_err(|error| {
            AppError::Validation(format!("invalid record offset {}: {error}", window.offset))
        })?;
        builder.push(" LIMIT ");
        builder.push_bind(limit);
        builder.push(" OFFSET ");
        builder.push_bind(offset);
    }

    Ok(builder)
}

fn push_from_where(
    builder: &mut QueryBuilder<'static, Postgres>,
    relation: &str,
    query: &RecordQuery,
) {
    builder.push(relation);
    builder.push(" source WHERE source.resource_type = ");
    builder.push_bind(query.resource_type.clone());
    builder.push(" AND ");
    push_group(builder, &query.where_clause);
}

fn push_group(builder: &mut QueryBuilder<'static, Postgres>, group: &RecordConditionGroup) {
    if group.nodes.is_empty() {
        match group.logical_mode {
            RecordLogicalMode::And => builder.push("TRUE"),
            RecordLogicalMode::Or => builder.push("FALSE"),
        };
        return;
    }

    builder.push('(');
    for (index, node) in group.nodes.iter().enumerate() {
        if index > 0 {
            match group.logical_mode {
                RecordLogicalMode::And => builder.push(" AND "),
                RecordLogicalMode::Or => builder.push(" OR "),
            };
        }

        match node {
            RecordConditionNode::Filter(filter) => push_filter(builder, filter),
            RecordConditionNode::Group(nested) => push_group(builder, nested),
        }
    }
    builder.push(')');
}

fn push_filter(builder: &mut QueryBuilder<'static, Postgres>, filter: &RecordFilter) {
    let field = filter.field_name.as_str();
    let is_id = field == RECORD_ID_FIELD;

    match filter.operator {
        RecordOperator::Eq if is_id => match filter.field_value.as_str() {
            Some(record_id) => {
                builder.push("source.id::text = ");
                builder.push_bind(record_id.to_owned());
            }
            None => {
                builder.push("FALSE");
            }
        },
        RecordOperator::Eq => {
            builder.push("source.data -> ");
            builder.push_bind(field.to_owned());
            builder.push(" = ");
            builder.push_bind(filter.field_value.clone());
        }
        RecordOperator::ContainsIgnoreCase => {
            let Some(needle) = filter.field_value.as_str() else {
                builder.push("FALSE");
                return;
            };
            let pattern = format!("%{}%", escape_like(needle));

            if is_id {
                builder.push("source.id::text ILIKE ");
            } else {
                builder.push("(jsonb_typeof(source.data -> ");
                builder.push_bind(field.to_owned());
                builder.push(") = 'string' AND source.data ->> ");
                builder.push_bind(field.to_owned());
                builder.push(" ILIKE ");
            }
            builder.push_bind(pattern);
            builder.push(" ESCAPE '\\'");
            if !is_id {
                builder.push(')');
            }
        }
        RecordOperator::References => match filter.field_value.as_str() {
            Some(record_id) if is_id => {
                builder.push("source.id::text = ");
                builder.push_bind(record_id.to_owned());
            }
            Some(record_id) => {
                builder.push("source.data ->> ");
                builder.push_bind(field.to_owned());
                builder.push(" = ");
                builder.push_bind(record_id.to_owned());
            }
            None => {
                builder.push("FALSE");
            }
        },
    }
}

fn push_field_for_sort(builder: &mut QueryBuilder<'static, Postgres>, field: &str) {
    if field == RECORD_ID_FIELD {
        builder.push("source.id::text");
        return;
    }

    builder.push("NULLIF(source.data -> ");
    builder.push_bind(field.to_owned());
    builder.push(", 'null'::jsonb)");
}

/// Escapes `LIKE` metacharacters so the needle matches literally.
pub(crate) fn escape_like(needle: &str) -> String {
    let mut escaped = String::with_capacity(needle.len());
    for character in needle.chars() {
        if matches!(character, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(character);
    }
    escaped
}
