use crate::error::{PagesmithError, Result};
use crate::types::EvaluationPayload;
use tracing::info;

/// Reports a publish result to the evaluator. Exactly one POST per call.
#[derive(Clone)]
pub struct Notifier {
    http: reqwest::Client,
}

impl Notifier {
    pub fn new(http: reqwest::Client) -> Self {
        Self { http }
    }

    pub async fn notify(&self, url: &str, payload: &EvaluationPayload) -> Result<()> {
        let resp = self
            .http
            .post(url)
            .json(payload)
            .send()
            .await
            .map_err(|e| PagesmithError::Notify(format!("evaluator unreachable: {e}")))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(PagesmithError::Notify(format!(
                "evaluator rejected payload: HTTP {status}: {body}"
            )));
        }

        info!(task = %payload.task, status = %status, "evaluator notified");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;
    use serde_json::json;

    fn payload() -> EvaluationPayload {
        EvaluationPayload {
            email: Some("a@b.c".to_string()),
            task: "t1".to_string(),
            round: 1,
            nonce: Some("n".to_string()),
            repo_url: "https://github.com/octo/t1-abc123".to_string(),
            commit_sha: "c".repeat(40),
            pages_url: "https://octo.github.io/t1-abc123/".to_string(),
        }
    }

    #[tokio::test]
    async fn posts_payload_once() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/notify")
            .match_header("content-type", "application/json")
            .match_body(Matcher::PartialJson(json!({
                "task": "t1",
                "repo_url": "https://github.com/octo/t1-abc123",
                "pages_url": "https://octo.github.io/t1-abc123/",
            })))
            .with_status(200)
            .expect(1)
            .create_async()
            .await;

        Notifier::new(reqwest::Client::new())
            .notify(&format!("{}/notify", server.url()), &payload())
            .await
            .unwrap();
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn rejection_is_notify_error_without_retry() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/notify")
            .with_status(500)
            .with_body("boom")
            .expect(1)
            .create_async()
            .await;

        let err = Notifier::new(reqwest::Client::new())
            .notify(&format!("{}/notify", server.url()), &payload())
            .await
            .unwrap_err();
        assert!(matches!(err, PagesmithError::Notify(_)));
        assert!(err.to_string().contains("boom"));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn unreachable_endpoint_is_notify_error() {
        // Port 9 (discard) on localhost is not expected to accept connections.
        let err = Notifier::new(reqwest::Client::new())
            .notify("http://127.0.0.1:9/notify", &payload())
            .await
            .unwrap_err();
        assert_eq!(err.stage(), "notify");
    }
}
