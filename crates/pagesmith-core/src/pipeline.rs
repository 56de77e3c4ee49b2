//! Request pipeline: Validator → Generator → Publisher → Notifier.
//!
//! Validation is split from execution so callers holding the secret store
//! behind a lock can release it before any network call is made.

use crate::config::{Config, GitHubConfig};
use crate::error::{PagesmithError, Result};
use crate::generator;
use crate::github::GitHubClient;
use crate::notifier::Notifier;
use crate::publisher::Publisher;
use crate::secrets::SecretStore;
use crate::types::{EvaluationPayload, PublishResult, ValidatedTask};
use crate::validator::Validator;
use std::time::Duration;
use tracing::info;

pub struct Pipeline {
    config: Config,
    http: reqwest::Client,
    github: GitHubClient,
    notifier: Notifier,
}

impl Pipeline {
    pub fn new(config: Config) -> Result<Self> {
        let http = http_client(&config.github)?;
        let github = GitHubClient::new(http.clone(), &config.github)?;
        let notifier = Notifier::new(http.clone());
        Ok(Self {
            config,
            http,
            github,
            notifier,
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Authenticate and check a raw request body. No side effects.
    pub fn validate(&self, body: &[u8], store: &SecretStore) -> Result<ValidatedTask> {
        Validator::new(&self.config.auth, store, &self.config.evaluator).validate(body)
    }

    /// Generate, publish, and notify for an already validated task.
    pub async fn execute(&self, task: ValidatedTask) -> Result<PublishResult> {
        let request = &task.request;
        info!(task = %request.task, round = request.round, "processing task");

        let app = generator::generate(request)?;
        info!(task = %request.task, files = app.len(), "app generated");

        let result = Publisher::new(&self.github, &self.http, &self.config)
            .publish(request, &app)
            .await?;

        let payload = EvaluationPayload::new(request, &result);
        self.notifier.notify(&task.evaluation_url, &payload).await?;

        info!(task = %request.task, repo = %result.repo_url, "task finished");
        Ok(result)
    }

    pub async fn run(&self, body: &[u8], store: &SecretStore) -> Result<PublishResult> {
        let task = self.validate(body, store)?;
        self.execute(task).await
    }
}

/// Shared outbound HTTP client with the configured per-request timeout.
pub fn http_client(config: &GitHubConfig) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .user_agent(concat!("pagesmith/", env!("CARGO_PKG_VERSION")))
        .timeout(Duration::from_secs(config.request_timeout_secs))
        .build()
        .map_err(|e| PagesmithError::Config(format!("cannot build HTTP client: {e}")))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
