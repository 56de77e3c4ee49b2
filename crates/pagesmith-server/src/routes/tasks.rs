use axum::body::Bytes;
use axum::extract::rejection::BytesRejection;
use axum::extract::State;
use axum::Json;
use pagesmith_core::types::PublishResult;
use pagesmith_core::PagesmithError;

use crate::error::AppError;
use crate::state::AppState;

/// POST /api/task — validate, build, publish, and report one task.
///
/// The body is taken raw so malformed JSON, and a body over
/// `server.max_body_bytes`, are reported as validation failures in the same
/// `{error, stage}` shape as every other stage.
pub async fn submit_task(
    State(app): State<AppState>,
    body: Result<Bytes, BytesRejection>,
) -> Result<Json<PublishResult>, AppError> {
    let body = body.map_err(|rejection| {
        tracing::warn!(status = %rejection.status(), "task body rejected");
        PagesmithError::Validation(format!("request body rejected: {}", rejection.body_text()))
    })?;

    let task = {
        let store = app.secrets.read().await;
        app.pipeline.validate(&body, &store)
    };
    let task = task.inspect_err(|e| {
        tracing::warn!(stage = e.stage(), error = %e, "task rejected");
    })?;

    let result = app.pipeline.execute(task).await.inspect_err(|e| {
        tracing::error!(stage = e.stage(), error = %e, "task failed");
    })?;
    Ok(Json(result))
}
