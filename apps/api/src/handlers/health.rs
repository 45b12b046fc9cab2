use axum::Json;
use axum::extract::State;

use crate::dto::{AuditWriterStatsResponse, HealthResponse};
use crate::state::AppState;

pub async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    let stats = state.audit_writer.stats();
    let status = if stats.failed == 0 && stats.dropped == 0 {
        "ok"
    } else {
        "degraded"
    };

    Json(HealthResponse {
        status,
        audit: AuditWriterStatsResponse::from(stats),
    })
}
