use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use pagesmith_core::error::PagesmithError;

// ---------------------------------------------------------------------------
// AppError — unified error type for HTTP responses
// ---------------------------------------------------------------------------

/// Unified error type for HTTP responses.
///
/// Pipeline failures render as `{"error": ..., "stage": ...}` so callers can
/// tell which stage rejected the task.
#[derive(Debug)]
pub struct AppError(pub anyhow::Error);

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let Some(e) = self.0.downcast_ref::<PagesmithError>() else {
            let body = serde_json::json!({ "error": self.0.to_string(), "stage": "internal" });
            return (StatusCode::INTERNAL_SERVER_ERROR, axum::Json(body)).into_response();
        };

        let status = match e {
            PagesmithError::Authentication(_) => StatusCode::UNAUTHORIZED,
            PagesmithError::Validation(_) => StatusCode::BAD_REQUEST,
            PagesmithError::Generation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            PagesmithError::Publish { .. } | PagesmithError::Notify(_) => StatusCode::BAD_GATEWAY,
            PagesmithError::SecretNotFound(_) => StatusCode::NOT_FOUND,
            PagesmithError::Config(_)
            | PagesmithError::Io(_)
            | PagesmithError::Yaml(_)
            | PagesmithError::Json(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = serde_json::json!({ "error": e.to_string(), "stage": e.stage() });
        (status, axum::Json(body)).into_response()
    }
}

impl<E> From<E> for AppError
where
    E: Into<anyhow::Error>,
{
    fn from(err: E) -> Self {
        Self(err.into())
    }
}
