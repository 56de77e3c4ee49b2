use crate::error::Result;
use crate::paths;
use serde::{Deserialize, Serialize};
use std::path::Path;

// ---------------------------------------------------------------------------
// ConfigWarning / WarnLevel
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigWarning {
    pub level: WarnLevel,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WarnLevel {
    Warning,
    Error,
}

// ---------------------------------------------------------------------------
// ServerConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_port")]
    pub port: u16,
    /// Bearer token for `/admin/*`. When unset, admin routes only answer
    /// requests addressed to localhost.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub admin_token: Option<String>,
    /// Largest accepted `/api/task` body. Attachments arrive base64-encoded
    /// inside it.
    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,
}

fn default_port() -> u16 {
    8000
}

fn default_max_body_bytes() -> usize {
    64 * 1024 * 1024
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            admin_token: None,
            max_body_bytes: default_max_body_bytes(),
        }
    }
}

// ---------------------------------------------------------------------------
// AuthConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AuthConfig {
    /// Secret accepted from any caller whose email has no entry in the
    /// secret store.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shared_secret: Option<String>,
}

// ---------------------------------------------------------------------------
// GitHubConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GitHubConfig {
    #[serde(default = "default_api_base")]
    pub api_base: String,
    #[serde(default)]
    pub owner: String,
    /// Name of the environment variable holding the API token.
    #[serde(default = "default_token_env")]
    pub token_env: String,
    #[serde(default = "default_branch")]
    pub branch: String,
    #[serde(default = "default_pages_domain")]
    pub pages_domain: String,
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
    /// Populated from `token_env` by [`Config::apply_env`]; never read from
    /// or written to the config file.
    #[serde(skip)]
    pub token: Option<String>,
}

fn default_api_base() -> String {
    "https://api.github.com".to_string()
}

fn default_token_env() -> String {
    "GH_TOKEN".to_string()
}

fn default_branch() -> String {
    "main".to_string()
}

fn default_pages_domain() -> String {
    "github.io".to_string()
}

fn default_request_timeout() -> u64 {
    15
}

impl Default for GitHubConfig {
    fn default() -> Self {
        Self {
            api_base: default_api_base(),
            owner: String::new(),
            token_env: default_token_env(),
            branch: default_branch(),
            pages_domain: default_pages_domain(),
            request_timeout_secs: default_request_timeout(),
            token: None,
        }
    }
}

// ---------------------------------------------------------------------------
// EvaluatorConfig / PublishConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct EvaluatorConfig {
    /// Fixed evaluator endpoint. Takes precedence over a request's
    /// `evaluation_url`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct PublishConfig {
    /// Delete the freshly created repository when a later publish step fails.
    #[serde(default)]
    pub cleanup_on_failure: bool,
    /// Poll the pages URL for up to this many seconds after enabling hosting.
    /// Zero disables polling.
    #[serde(default)]
    pub wait_for_pages_secs: u64,
    /// Name on the LICENSE copyright line; defaults to the GitHub owner.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub license_holder: Option<String>,
}

// ---------------------------------------------------------------------------
// Config (top-level)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub auth: AuthConfig,
    #[serde(default)]
    pub github: GitHubConfig,
    #[serde(default)]
    pub evaluator: EvaluatorConfig,
    #[serde(default)]
    pub publish: PublishConfig,
}

impl Config {
    /// Load `.pagesmith/config.yaml` under `root`. A missing file yields the
    /// defaults.
    pub fn load(root: &Path) -> Result<Self> {
        let path = paths::config_path(root);
        if !path.exists() {
            return Ok(Config::default());
        }
        let data = std::fs::read_to_string(&path)?;
        let cfg: Config = serde_yaml::from_str(&data)?;
        Ok(cfg)
    }

    pub fn save(&self, root: &Path) -> Result<()> {
        let path = paths::config_path(root);
        let data = serde_yaml::to_string(self)?;
        crate::io::atomic_write(&path, data.as_bytes())
    }

    /// Pull the API token and the `GH_USER` owner override out of the
    /// environment. `lookup` is `std::env::var` in production.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(token) = lookup(&self.github.token_env).filter(|t| !t.is_empty()) {
            self.github.token = Some(token);
        }
        if let Some(owner) = lookup("GH_USER").filter(|o| !o.is_empty()) {
            self.github.owner = owner;
        }
    }

    pub fn license_holder(&self) -> &str {
        self.publish
            .license_holder
            .as_deref()
            .unwrap_or(&self.github.owner)
    }

    // -----------------------------------------------------------------------
    // Validation
    // -----------------------------------------------------------------------

    pub fn validate(&self) -> Vec<ConfigWarning> {
        let mut warnings = Vec::new();

        if self.github.owner.trim().is_empty() {
            warnings.push(ConfigWarning {
                level: WarnLevel::Error,
                message: "github.owner is empty (set it in config or via GH_USER)".to_string(),
            });
        }

        if self.github.token.is_none() {
            warnings.push(ConfigWarning {
                level: WarnLevel::Error,
                message: format!(
                    "no GitHub token: environment variable '{}' is not set",
                    self.github.token_env
                ),
            });
        }

        if !self.github.api_base.starts_with("https://") {
            warnings.push(ConfigWarning {
                level: WarnLevel::Warning,
                message: format!(
                    "github.api_base '{}' is not https; the token will travel in clear text",
                    self.github.api_base
                ),
            });
        }

        if self.auth.shared_secret.is_none() {
            warnings.push(ConfigWarning {
                level: WarnLevel::Warning,
                message: "auth.shared_secret is unset; only emails in the secret store can submit tasks"
                    .to_string(),
            });
        }

        if self
            .auth
            .shared_secret
            .as_deref()
            .is_some_and(|s| s.trim().is_empty())
        {
            warnings.push(ConfigWarning {
                level: WarnLevel::Warning,
                message: "auth.shared_secret is empty and will never match".to_string(),
            });
        }

        if self.evaluator.url.is_none() {
            warnings.push(ConfigWarning {
                level: WarnLevel::Warning,
                message: "evaluator.url is unset; every request must carry evaluation_url"
                    .to_string(),
            });
        }

        if self.publish.wait_for_pages_secs > 600 {
            warnings.push(ConfigWarning {
                level: WarnLevel::Warning,
                message: format!(
                    "publish.wait_for_pages_secs={} holds each request open for a long time",
                    self.publish.wait_for_pages_secs
                ),
            });
        }

        warnings
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
