use axum::Json;
use axum::extract::{Extension, Path, Query, State};
use axum::http::StatusCode;
use quire_application::ListParams;
use quire_core::UserIdentity;

use crate::dto::{RecordDataRequest, RecordPageResponse, RecordResponse};
use crate::error::ApiResult;
use crate::state::AppState;

pub async fn list_records_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Path(resource_type): Path<String>,
    Query(params): Query<ListParams>,
) -> ApiResult<Json<RecordPageResponse>> {
    let page = state
        .query_service
        .list(&user, resource_type.as_str(), &params)
        .await?;

    Ok(Json(RecordPageResponse::from(page)))
}

pub async fn get_record_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Path((resource_type, record_id)): Path<(String, String)>,
) -> ApiResult<Json<RecordResponse>> {
    let record = state
        .query_service
        .read(&user, resource_type.as_str(), record_id.as_str())
        .await?;

    Ok(Json(RecordResponse::from(record)))
}

pub async fn create_record_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Path(resource_type): Path<String>,
    Json(payload): Json<RecordDataRequest>,
) -> ApiResult<(StatusCode, Json<RecordResponse>)> {
    let record = state
        .record_command_service
        .create_record(&user, resource_type.as_str(), payload.data)
        .await?;

    Ok((StatusCode::CREATED, Json(RecordResponse::from(record))))
}

pub async fn update_record_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Path((resource_type, record_id)): Path<(String, String)>,
    Json(payload): Json<RecordDataRequest>,
) -> ApiResult<Json<RecordResponse>> {
    let record = state
        .record_command_service
        .update_record(
            &user,
            resource_type.as_str(),
            record_id.as_str(),
            payload.data,
        )
        .await?;

    Ok(Json(RecordResponse::from(record)))
}

pub async fn delete_record_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Path((resource_type, record_id)): Path<(String, String)>,
) -> ApiResult<StatusCode> {
    state
        .record_command_service
        .delete_record(&user, resource_type.as_str(), record_id.as_str())
        .await?;

    Ok(StatusCode::NO_CONTENT)
}
