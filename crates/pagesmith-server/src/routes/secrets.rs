use axum::{
    extract::{Path, State},
    Json,
};

use crate::error::AppError;
use crate::state::AppState;

#[derive(serde::Deserialize)]
pub struct AddSecretBody {
    pub email: String,
    pub secret: String,
}

/// POST /admin/secrets — register or replace the secret for an email.
///
/// The store on disk is written first; the in-memory copy only changes once
/// the write succeeded.
pub async fn add_secret(
    State(app): State<AppState>,
    Json(body): Json<AddSecretBody>,
) -> Result<Json<serde_json::Value>, AppError> {
    let mut store = app.secrets.write().await;
    let mut updated = store.clone();
    updated.add(&body.email, &body.secret)?;

    let root = app.root.clone();
    let to_save = updated.clone();
    tokio::task::spawn_blocking(move || to_save.save(&root))
        .await
        .map_err(|e| AppError(anyhow::anyhow!("task join error: {e}")))??;

    *store = updated;
    tracing::info!(email = %body.email.trim(), "secret saved");
    Ok(Json(serde_json::json!({ "status": "saved" })))
}

/// GET /admin/secrets — registered emails, never the secrets themselves.
pub async fn list_secrets(State(app): State<AppState>) -> Json<serde_json::Value> {
    let store = app.secrets.read().await;
    Json(serde_json::json!(store.emails()))
}

/// DELETE /admin/secrets/{email} — forget an email's secret.
pub async fn remove_secret(
    State(app): State<AppState>,
    Path(email): Path<String>,
) -> Result<Json<serde_json::Value>, AppError> {
    let mut store = app.secrets.write().await;
    let mut updated = store.clone();
    updated.remove(&email)?;

    let root = app.root.clone();
    let to_save = updated.clone();
    tokio::task::spawn_blocking(move || to_save.save(&root))
        .await
        .map_err(|e| AppError(anyhow::anyhow!("task join error: {e}")))??;

    *store = updated;
    tracing::info!(email = %email, "secret removed");
    Ok(Json(serde_json::json!({ "status": "removed" })))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
