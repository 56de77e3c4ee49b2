use axum::{
    body::Body,
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use pagesmith_core::secrets::secrets_match;

/// Controls access to the `/admin/*` routes.
#[derive(Clone, Debug, Default)]
pub struct AdminAuth {
    pub token: Option<String>,
}

impl AdminAuth {
    /// No admin token configured: only local requests are allowed.
    pub fn local_only() -> Self {
        Self { token: None }
    }

    pub fn with_token(token: String) -> Self {
        Self { token: Some(token) }
    }
}

/// Axum middleware guarding admin routes.
///
/// Auth flow (evaluated in order):
/// 1. `token` is set → `Authorization: Bearer <token>` must match
/// 2. `token` is `None` → `Host` must be `localhost` or `127.0.0.1`
/// 3. Otherwise → 401 JSON
pub async fn admin_middleware(
    State(auth): State<AdminAuth>,
    req: Request,
    next: Next,
) -> Response {
    let allowed = match auth.token.as_deref() {
        Some(token) => bearer_token(&req).is_some_and(|provided| secrets_match(token, provided)),
        None => is_local_host(&req),
    };

    if allowed {
        return next.run(req).await;
    }

    tracing::warn!(path = %req.uri().path(), "rejected unauthorized admin request");
    Response::builder()
        .status(401)
        .header("Content-Type", "application/json")
        .body(Body::from(r#"{"error":"unauthorized"}"#))
        .expect("infallible: all header values are valid ASCII")
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn bearer_token(req: &Request) -> Option<&str> {
    req.headers()
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
}

fn is_local_host(req: &Request) -> bool {
    let host = req
        .headers()
        .get("host")
        .and_then(|h| h.to_str().ok())
        .unwrap_or("");
    let bare_host = host.split(':').next().unwrap_or(host);
    bare_host == "localhost" || bare_host == "127.0.0.1"
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;
    use axum::{body::Body, http::Request, middleware, routing::get, Router};
    use tower::ServiceExt;

    async fn ok_handler() -> &'static str {
        "ok"
    }

    fn test_app(auth: AdminAuth) -> Router {
        Router::new()
            .route("/admin/secrets", get(ok_handler))
            .layer(middleware::from_fn_with_state(auth, admin_middleware))
    }

    async fn status(auth: AdminAuth, host: &str, bearer: Option<&str>) -> StatusCode {
        let mut builder = Request::builder().uri("/admin/secrets").header("host", host);
        if let Some(token) = bearer {
            builder = builder.header("authorization", format!("Bearer {token}"));
        }
        test_app(auth)
            .oneshot(builder.body(Body::empty()).unwrap())
            .await
            .unwrap()
            .status()
    }

    #[tokio::test]
    async fn local_only_allows_localhost() {
        assert_eq!(
            status(AdminAuth::local_only(), "localhost:8000", None).await,
            StatusCode::OK
        );
        assert_eq!(
            status(AdminAuth::local_only(), "127.0.0.1:8000", None).await,
            StatusCode::OK
        );
    }

    #[tokio::test]
    async fn local_only_rejects_remote_host() {
        assert_eq!(
            status(AdminAuth::local_only(), "tasks.example.com", None).await,
            StatusCode::UNAUTHORIZED
        );
    }

    #[tokio::test]
    async fn token_required_when_configured() {
        let auth = AdminAuth::with_token("adm1n".into());
        assert_eq!(
            status(auth.clone(), "tasks.example.com", Some("adm1n")).await,
            StatusCode::OK
        );
        assert_eq!(
            status(auth.clone(), "tasks.example.com", Some("wrong")).await,
            StatusCode::UNAUTHORIZED
        );
        // A configured token is required even from localhost.
        assert_eq!(
            status(auth, "localhost", None).await,
            StatusCode::UNAUTHORIZED
        );
    }

    #[tokio::test]
    async fn unauthorized_response_is_json() {
        let resp = test_app(AdminAuth::local_only())
            .oneshot(
                Request::builder()
                    .uri("/admin/secrets")
                    .header("host", "evil.example")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        let ct = resp
            .headers()
            .get("content-type")
            .unwrap()
            .to_str()
            .unwrap();
        assert!(ct.contains("application/json"));
    }
}
