//! Thin GitHub REST client covering the calls the publisher makes.
//!
//! Every request gets one immediate retry when the failure looks transient
//! (connect error, timeout, or a 5xx answer). Anything else is returned to
//! the caller as a [`PagesmithError::Publish`] tagged with the step.

use crate::config::GitHubConfig;
use crate::error::{PagesmithError, PublishStep, Result};
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use reqwest::{Method, RequestBuilder, Response, StatusCode};
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, warn};

const API_VERSION: &str = "2022-11-28";
const ACCEPT: &str = "application/vnd.github+json";

// ---------------------------------------------------------------------------
// Response types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct Owner {
    pub login: String,
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct Repository {
    pub name: String,
    pub full_name: String,
    pub html_url: String,
    pub owner: Owner,
}

/// Commit created by the contents API, with the tree it points at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitRef {
    pub sha: String,
    pub tree_sha: String,
}

#[derive(Deserialize)]
struct ContentsResponse {
    commit: ContentsCommit,
}

#[derive(Deserialize)]
struct ContentsCommit {
    sha: String,
    tree: Sha,
}

#[derive(Deserialize)]
struct Sha {
    sha: String,
}

/// One entry of a `POST /git/trees` body. Text files are inlined; binary
/// files reference a blob uploaded beforehand.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TreeEntry {
    Inline { path: String, content: String },
    Blob { path: String, sha: String },
}

impl TreeEntry {
    fn to_json(&self) -> serde_json::Value {
        match self {
            TreeEntry::Inline { path, content } => json!({
                "path": path,
                "mode": "100644",
                "type": "blob",
                "content": content,
            }),
            TreeEntry::Blob { path, sha } => json!({
                "path": path,
                "mode": "100644",
                "type": "blob",
                "sha": sha,
            }),
        }
    }
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

#[derive(Clone)]
pub struct GitHubClient {
    http: reqwest::Client,
    api_base: String,
    token: String,
}

impl GitHubClient {
    /// Build a client from config. Fails when no token was resolved from the
    /// environment.
    pub fn new(http: reqwest::Client, config: &GitHubConfig) -> Result<Self> {
        let token = config.token.clone().ok_or_else(|| {
            PagesmithError::Config(format!(
                "GitHub token missing: set the {} environment variable",
                config.token_env
            ))
        })?;
        Ok(Self {
            http,
            api_base: config.api_base.trim_end_matches('/').to_string(),
            token,
        })
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        self.http
            .request(method, format!("{}{}", self.api_base, path))
            .bearer_auth(&self.token)
            .header(reqwest::header::ACCEPT, ACCEPT)
            .header("X-GitHub-Api-Version", API_VERSION)
    }

    /// Send `req`, retrying once immediately on a transient failure.
    async fn send(&self, step: PublishStep, req: RequestBuilder) -> Result<Response> {
        let retry = req.try_clone();
        let first = req.send().await;

        let transient = match &first {
            Ok(resp) => resp.status().is_server_error(),
            Err(e) => e.is_connect() || e.is_timeout(),
        };
        let Some(retry) = retry.filter(|_| transient) else {
            return first.map_err(|e| PagesmithError::publish(step, e.to_string()));
        };

        match &first {
            Ok(resp) => warn!(step = %step, status = %resp.status(), "transient failure, retrying once"),
            Err(e) => warn!(step = %step, error = %e, "transient failure, retrying once"),
        }
        retry
            .send()
            .await
            .map_err(|e| PagesmithError::publish(step, e.to_string()))
    }

    /// Send and require one of `expected`; parse the body as `T`.
    async fn send_json<T: serde::de::DeserializeOwned>(
        &self,
        step: PublishStep,
        req: RequestBuilder,
        expected: &[StatusCode],
    ) -> Result<T> {
        let resp = self.send(step, req).await?;
        let resp = check_status(step, resp, expected).await?;
        resp.json::<T>()
            .await
            .map_err(|e| PagesmithError::publish(step, format!("unexpected response body: {e}")))
    }

    // -----------------------------------------------------------------------
    // Endpoints
    // -----------------------------------------------------------------------

    /// `POST /user/repos`, initialised so the default branch exists.
    pub async fn create_repository(&self, name: &str, description: &str) -> Result<Repository> {
        let body = json!({
            "name": name,
            "description": description,
            "private": false,
            "auto_init": true,
        });
        let req = self.request(Method::POST, "/user/repos").json(&body);
        let repo: Repository = self
            .send_json(PublishStep::CreateRepository, req, &[StatusCode::CREATED])
            .await?;
        debug!(repo = %repo.full_name, "repository created");
        Ok(repo)
    }

    /// `PUT /repos/{full_name}/contents/{path}`: one commit adding one file.
    pub async fn put_file(
        &self,
        step: PublishStep,
        full_name: &str,
        path: &str,
        content: &[u8],
        message: &str,
        branch: &str,
    ) -> Result<CommitRef> {
        let body = json!({
            "message": message,
            "content": STANDARD.encode(content),
            "branch": branch,
        });
        let req = self
            .request(Method::PUT, &format!("/repos/{full_name}/contents/{path}"))
            .json(&body);
        let resp: ContentsResponse = self
            .send_json(step, req, &[StatusCode::CREATED, StatusCode::OK])
            .await?;
        Ok(CommitRef {
            sha: resp.commit.sha,
            tree_sha: resp.commit.tree.sha,
        })
    }

    /// `POST /repos/{full_name}/git/blobs` with base64 content; returns the blob sha.
    pub async fn create_blob(&self, full_name: &str, content: &[u8]) -> Result<String> {
        let body = json!({
            "content": STANDARD.encode(content),
            "encoding": "base64",
        });
        let req = self
            .request(Method::POST, &format!("/repos/{full_name}/git/blobs"))
            .json(&body);
        let sha: Sha = self
            .send_json(PublishStep::CommitFiles, req, &[StatusCode::CREATED])
            .await?;
        Ok(sha.sha)
    }

    pub async fn create_tree(
        &self,
        full_name: &str,
        base_tree: &str,
        entries: &[TreeEntry],
    ) -> Result<String> {
        let body = json!({
            "base_tree": base_tree,
            "tree": entries.iter().map(TreeEntry::to_json).collect::<Vec<_>>(),
        });
        let req = self
            .request(Method::POST, &format!("/repos/{full_name}/git/trees"))
            .json(&body);
        let sha: Sha = self
            .send_json(PublishStep::CommitFiles, req, &[StatusCode::CREATED])
            .await?;
        Ok(sha.sha)
    }

    pub async fn create_commit(
        &self,
        full_name: &str,
        message: &str,
        tree: &str,
        parent: &str,
    ) -> Result<String> {
        let body = json!({
            "message": message,
            "tree": tree,
            "parents": [parent],
        });
        let req = self
            .request(Method::POST, &format!("/repos/{full_name}/git/commits"))
            .json(&body);
        let sha: Sha = self
            .send_json(PublishStep::CommitFiles, req, &[StatusCode::CREATED])
            .await?;
        Ok(sha.sha)
    }

    /// Fast-forward `refs/heads/{branch}` to `sha`.
    pub async fn update_branch(&self, full_name: &str, branch: &str, sha: &str) -> Result<()> {
        let body = json!({ "sha": sha, "force": false });
        let req = self
            .request(
                Method::PATCH,
                &format!("/repos/{full_name}/git/refs/heads/{branch}"),
            )
            .json(&body);
        let resp = self.send(PublishStep::CommitFiles, req).await?;
        check_status(PublishStep::CommitFiles, resp, &[StatusCode::OK]).await?;
        Ok(())
    }

    /// Turn on Pages for `branch` at the repository root.
    ///
    /// Tries `POST` first; anything other than 201/202 falls back to a single
    /// `PUT`, which updates an existing Pages site.
    pub async fn enable_pages(&self, full_name: &str, branch: &str) -> Result<()> {
        let step = PublishStep::EnablePages;
        let path = format!("/repos/{full_name}/pages");
        let body = json!({ "source": { "branch": branch, "path": "/" } });

        let resp = self
            .send(step, self.request(Method::POST, &path).json(&body))
            .await?;
        if matches!(resp.status(), StatusCode::CREATED | StatusCode::ACCEPTED) {
            return Ok(());
        }
        debug!(status = %resp.status(), "pages POST not accepted, falling back to PUT");

        let resp = self
            .send(step, self.request(Method::PUT, &path).json(&body))
            .await?;
        if resp.status().is_success() {
            Ok(())
        } else {
            Err(status_error(step, resp).await)
        }
    }

    pub async fn delete_repository(&self, full_name: &str) -> Result<()> {
        let req = self.request(Method::DELETE, &format!("/repos/{full_name}"));
        let resp = self.send(PublishStep::CreateRepository, req).await?;
        check_status(
            PublishStep::CreateRepository,
            resp,
            &[StatusCode::NO_CONTENT, StatusCode::OK],
        )
        .await?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

async fn check_status(
    step: PublishStep,
    resp: Response,
    expected: &[StatusCode],
) -> Result<Response> {
    if expected.contains(&resp.status()) {
        Ok(resp)
    } else {
        Err(status_error(step, resp).await)
    }
}

/// Build a publish error from an unexpected response, keeping GitHub's
/// `message` field when the body has one.
async fn status_error(step: PublishStep, resp: Response) -> PagesmithError {
    let status = resp.status();
    let body = resp.text().await.unwrap_or_default();
    let detail = serde_json::from_str::<serde_json::Value>(&body)
        .ok()
        .and_then(|v| v["message"].as_str().map(str::to_string))
        .unwrap_or(body);
    PagesmithError::publish(step, format!("HTTP {status}: {detail}"))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
