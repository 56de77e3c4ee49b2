use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// TaskRequest
// ---------------------------------------------------------------------------

/// Inbound task as posted to `/api/task`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TaskRequest {
    #[serde(alias = "task_id", default)]
    pub task: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing)]
    pub secret: Option<String>,
    #[serde(default = "default_round")]
    pub round: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nonce: Option<String>,
    #[serde(default)]
    pub brief: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub evaluation_url: Option<String>,
    #[serde(default)]
    pub attachments: Vec<Attachment>,
}

fn default_round() -> u32 {
    1
}

/// An attachment is either inline text or a named `data:` URI.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum Attachment {
    Inline(String),
    File { name: String, url: String },
}

/// A task that passed authentication and field checks, with its evaluator
/// endpoint already resolved.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedTask {
    pub request: TaskRequest,
    pub evaluation_url: String,
}

// ---------------------------------------------------------------------------
// Results
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PublishResult {
    pub repo_url: String,
    pub commit_sha: String,
    pub pages_url: String,
}

/// Body POSTed to the evaluator: the publish result plus the callback
/// metadata from the request.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EvaluationPayload {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    pub task: String,
    pub round: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nonce: Option<String>,
    pub repo_url: String,
    pub commit_sha: String,
    pub pages_url: String,
}

impl EvaluationPayload {
    pub fn new(request: &TaskRequest, result: &PublishResult) -> Self {
        Self {
            email: request.email.clone(),
            task: request.task.clone(),
            round: request.round,
            nonce: request.nonce.clone(),
            repo_url: result.repo_url.clone(),
            commit_sha: result.commit_sha.clone(),
            pages_url: result.pages_url.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn task_id_alias_and_defaults() {
        let req: TaskRequest =
            serde_json::from_str(r#"{"task_id":"t1","attachments":["hello world"]}"#).unwrap();
        assert_eq!(req.task, "t1");
        assert_eq!(req.round, 1);
        assert_eq!(req.brief, "");
        assert_eq!(
            req.attachments,
            vec![Attachment::Inline("hello world".to_string())]
        );
    }

    #[test]
    fn file_attachment_parses() {
        let req: TaskRequest = serde_json::from_str(
            r#"{"task":"t2","attachments":[{"name":"a.png","url":"data:image/png;base64,AAAA"}]}"#,
        )
        .unwrap();
        assert_eq!(
            req.attachments[0],
            Attachment::File {
                name: "a.png".to_string(),
                url: "data:image/png;base64,AAAA".to_string()
            }
        );
    }

    #[test]
    fn secret_is_never_serialized() {
        let req: TaskRequest =
            serde_json::from_str(r#"{"task":"t1","secret":"hunter2"}"#).unwrap();
        assert_eq!(req.secret.as_deref(), Some("hunter2"));
        let json = serde_json::to_string(&req).unwrap();
        assert!(!json.contains("hunter2"));
    }

    #[test]
    fn payload_carries_callback_metadata() {
        let req: TaskRequest = serde_json::from_str(
            r#"{"task":"t1","email":"a@b.c","round":2,"nonce":"n-1"}"#,
        )
        .unwrap();
        let result = PublishResult {
            repo_url: "https://github.com/octo/t1-abc123".to_string(),
            commit_sha: "a".repeat(40),
            pages_url: "https://octo.github.io/t1-abc123/".to_string(),
        };
        let payload = EvaluationPayload::new(&req, &result);
        let json = serde_json::to_value(&payload).unwrap();
        assert_eq!(json["email"], "a@b.c");
        assert_eq!(json["round"], 2);
        assert_eq!(json["nonce"], "n-1");
        assert_eq!(json["repo_url"], "https://github.com/octo/t1-abc123");
    }
}
