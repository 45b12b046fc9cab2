use axum::Router;
use axum::middleware::from_fn;
use axum::routing::get;
use quire_core::AppError;
use tower_http::trace::TraceLayer;

use crate::state::AppState;
use crate::{handlers, middleware};

mod cors;

#[cfg(test)]
mod tests;

pub fn build_router(app_state: AppState, frontend_origin: &str) -> Result<Router, AppError> {
    let protected_routes = Router::new()
        .route(
            "/api/resources/{resource_type}",
            get(handlers::records::list_records_handler)
                .post(handlers::records::create_record_handler),
        )
        .route(
            "/api/resources/{resource_type}/{record_id}",
            get(handlers::records::get_record_handler)
                .put(handlers::records::update_record_handler)
                .delete(handlers::records::delete_record_handler),
        )
        .route(
            "/api/audit-logs",
            get(handlers::audit_logs::list_audit_logs_handler)
                .post(handlers::audit_logs::audit_log_unavailable_handler),
        )
        .route(
            "/api/audit-logs/{entry_id}",
            get(handlers::audit_logs::audit_log_unavailable_handler)
                .put(handlers::audit_logs::audit_log_unavailable_handler)
                .delete(handlers::audit_logs::audit_log_unavailable_handler),
        )
        .route_layer(from_fn(middleware::require_actor));

    Ok(Router::new()
        .route("/health", get(handlers::health::health_handler))
        .merge(protected_routes)
        .layer(cors::build_cors_layer(frontend_origin)?)
        .layer(TraceLayer::new_for_http())
        .with_state(app_state))
}
