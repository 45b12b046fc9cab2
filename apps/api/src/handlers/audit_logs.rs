use axum::Json;
use axum::extract::{Extension, Query, State};
use quire_application::ListParams;
use quire_core::{AppError, UserIdentity};

use crate::dto::AuditLogPageResponse;
use crate::error::ApiResult;
use crate::state::AppState;

pub async fn list_audit_logs_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Query(params): Query<ListParams>,
) -> ApiResult<Json<AuditLogPageResponse>> {
    let page = state.audit_log_service.list(&user, &params).await?;

    Ok(Json(AuditLogPageResponse::from(page)))
}

/// Audit entries are only listed; single-entry reads and every write are absent.
pub async fn audit_log_unavailable_handler() -> ApiResult<Json<()>> {
    Err(AppError::NotFound("audit log entries are only available as a listing".to_owned()).into())
}
