use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use quire_core::AppError;
use serde::Serialize;
use tracing::error;
use ts_rs::TS;

/// API error payload.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/error-response.ts"
)]
pub struct ErrorResponse {
    message: String,
    /// Offending request parameter for invalid-parameter errors.
    #[serde(skip_serializing_if = "Option::is_none")]
    #[ts(optional)]
    parameter: Option<String>,
}

/// HTTP API error wrapper around core application errors.
#[derive(Debug)]
pub struct ApiError(pub AppError);

impl From<AppError> for ApiError {
    fn from(value: AppError) -> Self {
        Self(value)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match self.0 {
            AppError::Validation(_) | AppError::InvalidParameter { .. } => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::Configuration(_) | AppError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        let message = match &self.0 {
            AppError::Configuration(_) => {
                error!(error = %self.0, "resource configuration defect");
                "internal server error".to_owned()
            }
            AppError::Internal(_) => {
                error!(error = %self.0, "request failed");
                self.0.to_string()
            }
            other => other.to_string(),
        };

        let payload = Json(ErrorResponse {
            message,
            parameter: self.0.parameter().map(ToOwned::to_owned),
        });

        (status, payload).into_response()
    }
}

/// Standard API result type.
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use axum::response::IntoResponse;
    use quire_core::AppError;
    use serde_json::Value;

    use super::ApiError;

    async fn render(error: AppError) -> (StatusCode, Value) {
        let response = ApiError(error).into_response();
        let status = response.status();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap_or_else(|_| unreachable!());
        let payload = serde_json::from_slice(&body).unwrap_or_else(|_| unreachable!());
        (status, payload)
    }

    #[tokio::test]
    async fn invalid_parameter_reports_the_parameter() {
        let (status, payload) =
            render(AppError::invalid_parameter("page", "must be at least 1, got 0")).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(payload["parameter"], "page");
        assert!(
            payload["message"]
                .as_str()
                .is_some_and(|message| message.contains("page"))
        );
    }

    #[tokio::test]
    async fn configuration_defects_are_not_shown_to_clients() {
        let (status, payload) = render(AppError::Configuration(
            "filter 'customer' references unknown association 'client'".to_owned(),
        ))
        .await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(payload["message"], "internal server error");
        assert!(payload.get("parameter").is_none());
    }

    #[tokio::test]
    async fn authorization_errors_keep_their_status() {
        let (unauthorized, _) = render(AppError::Unauthorized("missing".to_owned())).await;
        let (forbidden, _) = render(AppError::Forbidden("denied".to_owned())).await;
        let (not_found, _) = render(AppError::NotFound("gone".to_owned())).await;

        assert_eq!(unauthorized, StatusCode::UNAUTHORIZED);
        assert_eq!(forbidden, StatusCode::FORBIDDEN);
        assert_eq!(not_found, StatusCode::NOT_FOUND);
    }
}
