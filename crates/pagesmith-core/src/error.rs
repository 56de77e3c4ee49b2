use thiserror::Error;

#[derive(Debug, Error)]
pub enum PagesmithError {
    #[error("authentication failed: {0}")]
    Authentication(String),

    #[error("invalid task request: {0}")]
    Validation(String),

    #[error("app generation failed: {0}")]
    Generation(String),

    #[error("publish failed at {step}: {message}")]
    Publish { step: PublishStep, message: String },

    #[error("evaluator notification failed: {0}")]
    Notify(String),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("secret not found for: {0}")]
    SecretNotFound(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

/// The individual publisher steps, used to report which one failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PublishStep {
    CreateRepository,
    AddLicense,
    CommitFiles,
    EnablePages,
}

impl PublishStep {
    pub fn as_str(&self) -> &'static str {
        match self {
            PublishStep::CreateRepository => "create_repository",
            PublishStep::AddLicense => "add_license",
            PublishStep::CommitFiles => "commit_files",
            PublishStep::EnablePages => "enable_pages",
        }
    }
}

impl std::fmt::Display for PublishStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl PagesmithError {
    pub fn publish(step: PublishStep, message: impl Into<String>) -> Self {
        PagesmithError::Publish {
            step,
            message: message.into(),
        }
    }

    /// Pipeline stage that produced this error, reported back to HTTP callers.
    pub fn stage(&self) -> &'static str {
        match self {
            PagesmithError::Authentication(_) => "authentication",
            PagesmithError::Validation(_) => "validation",
            PagesmithError::Generation(_) => "generation",
            PagesmithError::Publish { .. } => "publish",
            PagesmithError::Notify(_) => "notify",
            PagesmithError::Config(_)
            | PagesmithError::SecretNotFound(_)
            | PagesmithError::Io(_)
            | PagesmithError::Yaml(_)
            | PagesmithError::Json(_) => "internal",
        }
    }
}

pub type Result<T> = std::result::Result<T, PagesmithError>;
