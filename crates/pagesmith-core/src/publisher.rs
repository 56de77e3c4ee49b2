use crate::config::Config;
use crate::error::{PublishStep, Result};
use crate::generator::GeneratedApp;
use crate::github::{GitHubClient, Repository, TreeEntry};
use crate::types::{PublishResult, TaskRequest};
use chrono::Datelike;
use std::time::Duration;
use tracing::{info, warn};

const PAGES_POLL_INTERVAL: Duration = Duration::from_secs(2);
const REPO_NAME_MAX: usize = 80;

/// Publishes a generated app as a new public repository with Pages enabled.
pub struct Publisher<'a> {
    client: &'a GitHubClient,
    http: &'a reqwest::Client,
    config: &'a Config,
}

impl<'a> Publisher<'a> {
    pub fn new(client: &'a GitHubClient, http: &'a reqwest::Client, config: &'a Config) -> Self {
        Self {
            client,
            http,
            config,
        }
    }

    /// Create the repository, add a LICENSE, commit `app`, and enable Pages.
    ///
    /// Steps run strictly in order and the first failure aborts the rest.
    /// With `publish.cleanup_on_failure` set, a repository whose later steps
    /// failed is deleted before the error is returned.
    pub async fn publish(&self, task: &TaskRequest, app: &GeneratedApp) -> Result<PublishResult> {
        let name = repo_name(&task.task, &short_suffix());
        let description = format!("Task {} round {}", task.task, task.round);

        let repo = self.client.create_repository(&name, &description).await?;
        info!(repo = %repo.full_name, "repository created");

        match self.populate(&repo, task, app).await {
            Ok(result) => Ok(result),
            Err(e) => {
                if self.config.publish.cleanup_on_failure {
                    self.cleanup(&repo).await;
                }
                Err(e)
            }
        }
    }

    async fn populate(
        &self,
        repo: &Repository,
        task: &TaskRequest,
        app: &GeneratedApp,
    ) -> Result<PublishResult> {
        let branch = &self.config.github.branch;

        let license = mit_license(chrono::Utc::now().year(), self.config.license_holder());
        let license_commit = self
            .client
            .put_file(
                PublishStep::AddLicense,
                &repo.full_name,
                "LICENSE",
                license.as_bytes(),
                "Add MIT license",
                branch,
            )
            .await?;
        info!(repo = %repo.full_name, "license added");

        let mut entries = Vec::with_capacity(app.len());
        for file in app.iter() {
            let entry = match std::str::from_utf8(&file.content) {
                Ok(text) => TreeEntry::Inline {
                    path: file.path.clone(),
                    content: text.to_string(),
                },
                Err(_) => TreeEntry::Blob {
                    path: file.path.clone(),
                    sha: self.client.create_blob(&repo.full_name, &file.content).await?,
                },
            };
            entries.push(entry);
        }

        let tree = self
            .client
            .create_tree(&repo.full_name, &license_commit.tree_sha, &entries)
            .await?;
        let message = format!("Initial commit for {} round {}", task.task, task.round);
        let commit_sha = self
            .client
            .create_commit(&repo.full_name, &message, &tree, &license_commit.sha)
            .await?;
        self.client
            .update_branch(&repo.full_name, branch, &commit_sha)
            .await?;
        info!(repo = %repo.full_name, commit = %commit_sha, files = app.len(), "files committed");

        self.client.enable_pages(&repo.full_name, branch).await?;
        let pages_url = pages_url(&repo.owner.login, &self.config.github.pages_domain, &repo.name);
        info!(repo = %repo.full_name, pages = %pages_url, "pages enabled");

        if self.config.publish.wait_for_pages_secs > 0 {
            let timeout = Duration::from_secs(self.config.publish.wait_for_pages_secs);
            if !wait_for_pages(self.http, &pages_url, timeout).await {
                warn!(pages = %pages_url, "pages site did not come up before the timeout");
            }
        }

        Ok(PublishResult {
            repo_url: repo.html_url.clone(),
            commit_sha,
            pages_url,
        })
    }

    async fn cleanup(&self, repo: &Repository) {
        match self.client.delete_repository(&repo.full_name).await {
            Ok(()) => info!(repo = %repo.full_name, "deleted partially published repository"),
            Err(e) => warn!(repo = %repo.full_name, error = %e, "cleanup failed; repository left in place"),
        }
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// `<slug>-<suffix>`, where the slug keeps lowercase alphanumerics and
/// collapses everything else into single hyphens.
pub fn repo_name(task: &str, suffix: &str) -> String {
    let mut slug = String::with_capacity(task.len());
    for c in task.chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c.to_ascii_lowercase());
        } else if !slug.ends_with('-') && !slug.is_empty() {
            slug.push('-');
        }
    }
    let mut slug = slug.trim_end_matches('-').to_string();
    slug.truncate(REPO_NAME_MAX.saturating_sub(suffix.len() + 1));
    let slug = slug.trim_end_matches('-');
    let slug = if slug.is_empty() { "task" } else { slug };
    format!("{slug}-{suffix}")
}

fn short_suffix() -> String {
    uuid::Uuid::new_v4().simple().to_string()[..6].to_string()
}

pub fn pages_url(owner: &str, pages_domain: &str, repo: &str) -> String {
    format!("https://{}.{}/{}/", owner.to_lowercase(), pages_domain, repo)
}

pub fn mit_license(year: i32, holder: &str) -> String {
    format!(
        "MIT License

Copyright (c) {year} {holder}

Permission is hereby granted, free of charge, to any person obtaining a copy
of this software and associated documentation files (the \"Software\"), to deal
in the Software without restriction, including without limitation the rights
to use, copy, modify, merge, publish, distribute, sublicense, and/or sell
copies of the Software, and to permit persons to whom the Software is
furnished to do so, subject to the following conditions:

The above copyright notice and this permission notice shall be included in all
copies or substantial portions of the Software.

THE SOFTWARE IS PROVIDED \"AS IS\", WITHOUT WARRANTY OF ANY KIND, EXPRESS OR
IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF MERCHANTABILITY,
FITNESS FOR A PARTICULAR PURPOSE AND NONINFRINGEMENT. IN NO EVENT SHALL THE
AUTHORS OR COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM, DAMAGES OR OTHER
LIABILITY, WHETHER IN AN ACTION OF CONTRACT, TORT OR OTHERWISE, ARISING FROM,
OUT OF OR IN CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS IN THE
SOFTWARE.
"
    )
}

/// Poll `url` until it answers 200 or `timeout` elapses.
async fn wait_for_pages(http: &reqwest::Client, url: &str, timeout: Duration) -> bool {
    let deadline = tokio::time::Instant::now() + timeout;
    loop {
        if let Ok(resp) = http.get(url).send().await {
            if resp.status().is_success() {
                return true;
            }
        }
        if tokio::time::Instant::now() + PAGES_POLL_INTERVAL > deadline {
            return false;
        }
        tokio::time::sleep(PAGES_POLL_INTERVAL).await;
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
