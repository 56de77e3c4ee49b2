use axum::http::StatusCode;
use http_body_util::BodyExt;
use mockito::{Mock, Server, ServerGuard};
use pagesmith_core::config::Config;
use pagesmith_server::state::AppState;
use serde_json::json;
use tempfile::TempDir;
use tower::ServiceExt;

const COMMIT_SHA: &str = "0123456789abcdef0123456789abcdef01234567";

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn config(github: &ServerGuard, evaluator: &ServerGuard) -> Config {
    let mut cfg = Config::default();
    cfg.github.api_base = github.url();
    cfg.github.owner = "octo".to_string();
    cfg.github.token = Some("tok".to_string());
    cfg.auth.shared_secret = Some("hunter2".to_string());
    cfg.evaluator.url = Some(format!("{}/notify", evaluator.url()));
    cfg
}

fn router(dir: &TempDir, cfg: Config) -> axum::Router {
    let state = AppState::new(dir.path().to_path_buf(), cfg).unwrap();
    pagesmith_server::build_router(state)
}

/// Send a request via `oneshot` and return (status, parsed JSON body).
async fn send(
    app: axum::Router,
    method: &str,
    uri: &str,
    body: Option<Vec<u8>>,
) -> (StatusCode, serde_json::Value) {
    let req = axum::http::Request::builder()
        .method(method)
        .uri(uri)
        .header("host", "localhost:8000")
        .header("content-type", "application/json")
        .body(axum::body::Body::from(body.unwrap_or_default()))
        .unwrap();
    let response = app.oneshot(req).await.unwrap();
    let status = response.status();
    let body = response.into_body().collect().await.unwrap().to_bytes();
    let json: serde_json::Value = serde_json::from_slice(&body).unwrap_or(serde_json::Value::Null);
    (status, json)
}

async fn post_json(
    app: axum::Router,
    uri: &str,
    body: serde_json::Value,
) -> (StatusCode, serde_json::Value) {
    send(app, "POST", uri, Some(serde_json::to_vec(&body).unwrap())).await
}

/// Mock a fully successful GitHub publish for repo `octo/t1-abc123`.
async fn mock_github_success(server: &mut ServerGuard) -> Vec<Mock> {
    vec![
        server
            .mock("POST", "/user/repos")
            .with_status(201)
            .with_body(
                json!({
                    "name": "t1-abc123",
                    "full_name": "octo/t1-abc123",
                    "html_url": "https://github.com/octo/t1-abc123",
                    "owner": { "login": "octo" }
                })
                .to_string(),
            )
            .create_async()
            .await,
        server
            .mock("PUT", "/repos/octo/t1-abc123/contents/LICENSE")
            .with_status(201)
            .with_body(json!({ "commit": { "sha": "l1", "tree": { "sha": "t0" } } }).to_string())
            .create_async()
            .await,
        server
            .mock("POST", "/repos/octo/t1-abc123/git/trees")
            .with_status(201)
            .with_body(json!({ "sha": "t1" }).to_string())
            .create_async()
            .await,
        server
            .mock("POST", "/repos/octo/t1-abc123/git/commits")
            .with_status(201)
            .with_body(json!({ "sha": COMMIT_SHA }).to_string())
            .create_async()
            .await,
        server
            .mock("PATCH", "/repos/octo/t1-abc123/git/refs/heads/main")
            .with_status(200)
            .with_body("{}")
            .create_async()
            .await,
        server
            .mock("POST", "/repos/octo/t1-abc123/pages")
            .with_status(201)
            .create_async()
            .await,
    ]
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[tokio::test]
async fn health_reports_ok() {
    let dir = TempDir::new().unwrap();
    let github = Server::new_async().await;
    let evaluator = Server::new_async().await;
    let app = router(&dir, config(&github, &evaluator));

    let (status, json) = send(app, "GET", "/api/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "ok");
}

#[tokio::test]
async fn task_publishes_and_returns_urls() {
    let dir = TempDir::new().unwrap();
    let mut github = Server::new_async().await;
    let mut evaluator = Server::new_async().await;
    let _github = mock_github_success(&mut github).await;
    let notify = evaluator
        .mock("POST", "/notify")
        .with_status(200)
        .expect(1)
        .create_async()
        .await;
    let app = router(&dir, config(&github, &evaluator));

    let (status, json) = post_json(
        app,
        "/api/task",
        json!({ "task_id": "t1", "secret": "hunter2", "attachments": ["hello world"] }),
    )
    .await;

    assert_eq!(status, StatusCode::OK, "{json}");
    assert_eq!(json["repo_url"], "https://github.com/octo/t1-abc123");
    assert_eq!(json["commit_sha"], COMMIT_SHA);
    assert_eq!(json["pages_url"], "https://octo.github.io/t1-abc123/");
    notify.assert_async().await;
}

#[tokio::test]
async fn missing_secret_is_401_and_creates_nothing() {
    let dir = TempDir::new().unwrap();
    let mut github = Server::new_async().await;
    let evaluator = Server::new_async().await;
    let create = github
        .mock("POST", "/user/repos")
        .expect(0)
        .create_async()
        .await;
    let app = router(&dir, config(&github, &evaluator));

    let (status, json) = post_json(
        app,
        "/api/task",
        json!({ "task_id": "t1", "attachments": ["hello world"] }),
    )
    .await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(json["stage"], "authentication");
    create.assert_async().await;
}

#[tokio::test]
async fn malformed_body_is_validation_error() {
    let dir = TempDir::new().unwrap();
    let github = Server::new_async().await;
    let evaluator = Server::new_async().await;
    let app = router(&dir, config(&github, &evaluator));

    let (status, json) = send(app, "POST", "/api/task", Some(b"{oops".to_vec())).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["stage"], "validation");
}

#[tokio::test]
async fn publish_failure_is_502_without_notification() {
    let dir = TempDir::new().unwrap();
    let mut github = Server::new_async().await;
    let mut evaluator = Server::new_async().await;
    let _create = github
        .mock("POST", "/user/repos")
        .with_status(401)
        .with_body(r#"{"message":"Bad credentials"}"#)
        .create_async()
        .await;
    let notify = evaluator
        .mock("POST", "/notify")
        .expect(0)
        .create_async()
        .await;
    let app = router(&dir, config(&github, &evaluator));

    let (status, json) = post_json(
        app,
        "/api/task",
        json!({ "task": "t1", "secret": "hunter2" }),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(json["stage"], "publish");
    assert!(json["error"].as_str().unwrap().contains("Bad credentials"));
    notify.assert_async().await;
}

#[tokio::test]
async fn admin_secret_enables_per_email_auth() {
    let dir = TempDir::new().unwrap();
    let mut github = Server::new_async().await;
    let mut evaluator = Server::new_async().await;
    let _github = mock_github_success(&mut github).await;
    let _notify = evaluator
        .mock("POST", "/notify")
        .with_status(200)
        .create_async()
        .await;
    let mut cfg = config(&github, &evaluator);
    cfg.auth.shared_secret = None;
    let app = router(&dir, cfg);

    let (status, _) = post_json(
        app.clone(),
        "/admin/secrets",
        json!({ "email": "student@example.com", "secret": "per-student" }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, json) = send(app.clone(), "GET", "/admin/secrets", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json, json!(["student@example.com"]));

    let (status, json) = post_json(
        app,
        "/api/task",
        json!({
            "task": "t1",
            "email": "student@example.com",
            "secret": "per-student",
            "round": 1,
            "nonce": "abc"
        }),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{json}");
}

#[tokio::test]
async fn admin_routes_reject_remote_hosts() {
    let dir = TempDir::new().unwrap();
    let github = Server::new_async().await;
    let evaluator = Server::new_async().await;
    let app = router(&dir, config(&github, &evaluator));

    let req = axum::http::Request::builder()
        .uri("/admin/secrets")
        .header("host", "tasks.example.com")
        .body(axum::body::Body::empty())
        .unwrap();
    let response = app.oneshot(req).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn body_over_limit_is_validation_error() {
    let dir = TempDir::new().unwrap();
    let mut github = Server::new_async().await;
    let evaluator = Server::new_async().await;
    let create = github
        .mock("POST", "/user/repos")
        .expect(0)
        .create_async()
        .await;
    let mut cfg = config(&github, &evaluator);
    cfg.server.max_body_bytes = 1024;
    let app = router(&dir, cfg);

    let payload = "A".repeat(4096);
    let (status, json) = post_json(
        app,
        "/api/task",
        json!({
            "task": "t1",
            "secret": "hunter2",
            "attachments": [{ "name": "big.png", "url": format!("data:image/png;base64,{payload}") }]
        }),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["stage"], "validation");
    assert!(json["error"].as_str().unwrap().contains("request body rejected"));
    create.assert_async().await;
}

#[tokio::test]
async fn large_attachment_passes_default_limit() {
    let dir = TempDir::new().unwrap();
    let github = Server::new_async().await;
    let evaluator = Server::new_async().await;
    let app = router(&dir, config(&github, &evaluator));

    // 3 MiB of base64 is past axum's built-in 2 MB cap. Leaving out the
    // secret stops the request at authentication, after the body was read.
    let payload = "A".repeat(3 * 1024 * 1024);
    let (status, json) = post_json(
        app,
        "/api/task",
        json!({
            "task": "t1",
            "attachments": [{ "name": "big.png", "url": format!("data:image/png;base64,{payload}") }]
        }),
    )
    .await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(json["stage"], "authentication");
}
