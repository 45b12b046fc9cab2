use quire_application::Page;
use quire_domain::Record;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use ts_rs::TS;

use super::reported_page_size;

/// Incoming record create or update payload.
#[derive(Debug, Deserialize, TS)]
#[ts(
    export,
    export_to = "../../../../packages/api-types/src/generated/record-data-request.ts"
)]
pub struct RecordDataRequest {
    #[ts(type = "Record<string, unknown>")]
    pub data: Value,
}

/// API representation of a record.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../../packages/api-types/src/generated/record-response.ts"
)]
pub struct RecordResponse {
    pub id: String,
    pub resource_type: String,
    #[ts(type = "Record<string, unknown>")]
    pub data: Value,
}

impl From<Record> for RecordResponse {
    fn from(value: Record) -> Self {
        Self {
            id: value.record_id().as_str().to_owned(),
            resource_type: value.resource_type().as_str().to_owned(),
            data: value.into_data(),
        }
    }
}

/// One page of records.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../../packages/api-types/src/generated/record-page-response.ts"
)]
pub struct RecordPageResponse {
    pub items: Vec<RecordResponse>,
    #[ts(type = "number")]
    pub page: usize,
    #[ts(type = "number | null")]
    pub count: Option<usize>,
    #[ts(type = "number")]
    pub total: usize,
    #[ts(type = "number")]
    pub total_pages: usize,
}

impl From<Page<Record>> for RecordPageResponse {
    fn from(value: Page<Record>) -> Self {
        Self {
            items: value.items.into_iter().map(RecordResponse::from).collect(),
            page: value.page_number,
            count: reported_page_size(value.page_size),
            total: value.total_count,
            total_pages: value.total_pages,
        }
    }
}
