use axum::extract::State;
use axum::Json;

use crate::error::AppError;
use crate::state::AppState;

const REDACTED: &str = "********";

/// GET /admin/config — the effective configuration with secrets masked.
pub async fn get_config(State(app): State<AppState>) -> Result<Json<serde_json::Value>, AppError> {
    let mut config = app.pipeline.config().clone();
    if config.auth.shared_secret.is_some() {
        config.auth.shared_secret = Some(REDACTED.to_string());
    }
    if config.server.admin_token.is_some() {
        config.server.admin_token = Some(REDACTED.to_string());
    }
    let mut json = serde_json::to_value(&config)?;
    json["github"]["token_set"] = serde_json::Value::Bool(config.github.token.is_some());
    Ok(Json(json))
}
