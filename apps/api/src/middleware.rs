use axum::extract::Request;
use axum::http::HeaderMap;
use axum::middleware::Next;
use axum::response::Response;
use quire_core::{AppError, AppResult, UserIdentity};

use crate::error::ApiResult;

/// Subject asserted by the trusted upstream proxy.
pub const SUBJECT_HEADER: &str = "x-quire-subject";
/// Optional human-readable name for the subject.
pub const DISPLAY_NAME_HEADER: &str = "x-quire-display-name";

pub async fn require_actor(mut request: Request, next: Next) -> ApiResult<Response> {
    let identity = actor_from_headers(request.headers())?;

    request.extensions_mut().insert(identity);
    Ok(next.run(request).await)
}

fn actor_from_headers(headers: &HeaderMap) -> AppResult<UserIdentity> {
    let subject = header_text(headers, SUBJECT_HEADER)
        .ok_or_else(|| AppError::Unauthorized("authentication required".to_owned()))?;
    let display_name = header_text(headers, DISPLAY_NAME_HEADER).unwrap_or(subject);

    Ok(UserIdentity::new(subject, display_name))
}

fn header_text<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
}
