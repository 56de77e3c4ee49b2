pub mod auth;
pub mod error;
pub mod routes;
pub mod state;

use axum::extract::DefaultBodyLimit;
use axum::middleware;
use axum::routing::{delete, get, post};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Build the axum Router with all API routes and middleware.
/// Used by `serve_on()` and available for integration testing.
pub fn build_router(app_state: state::AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let admin = Router::new()
        .route("/admin/secrets", get(routes::secrets::list_secrets))
        .route("/admin/secrets", post(routes::secrets::add_secret))
        .route(
            "/admin/secrets/{email}",
            delete(routes::secrets::remove_secret),
        )
        .route("/admin/config", get(routes::config::get_config))
        .layer(middleware::from_fn_with_state(
            app_state.admin.clone(),
            auth::admin_middleware,
        ));

    let body_limit = app_state.pipeline.config().server.max_body_bytes;

    Router::new()
        .route(
            "/api/task",
            post(routes::tasks::submit_task).layer(DefaultBodyLimit::max(body_limit)),
        )
        .route("/api/health", get(routes::health::health))
        .merge(admin)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(app_state)
}

/// Serve on a pre-bound listener until the future is dropped.
///
/// Taking a bound `TcpListener` lets the caller read the actual port first
/// (useful when `port = 0` and the OS picks a free port).
pub async fn serve_on(
    app_state: state::AppState,
    listener: tokio::net::TcpListener,
) -> anyhow::Result<()> {
    let actual_port = listener.local_addr()?.port();
    let app = build_router(app_state);

    tracing::info!("pagesmith listening on http://localhost:{actual_port}");

    axum::serve(listener, app).await?;
    Ok(())
}
