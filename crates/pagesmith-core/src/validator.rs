use crate::config::{AuthConfig, EvaluatorConfig};
use crate::error::{PagesmithError, Result};
use crate::secrets::{secrets_match, SecretStore};
use crate::types::{TaskRequest, ValidatedTask};

/// Authenticates and checks inbound task requests.
///
/// Authentication runs before field checks, so a request without a valid
/// secret never learns which of its fields were wrong.
pub struct Validator<'a> {
    auth: &'a AuthConfig,
    store: &'a SecretStore,
    evaluator: &'a EvaluatorConfig,
}

impl<'a> Validator<'a> {
    pub fn new(auth: &'a AuthConfig, store: &'a SecretStore, evaluator: &'a EvaluatorConfig) -> Self {
        Self {
            auth,
            store,
            evaluator,
        }
    }

    pub fn validate(&self, body: &[u8]) -> Result<ValidatedTask> {
        let request: TaskRequest = serde_json::from_slice(body)
            .map_err(|e| PagesmithError::Validation(format!("malformed request body: {e}")))?;

        self.authenticate(&request)?;

        if request.task.trim().is_empty() {
            return Err(PagesmithError::Validation("missing task".to_string()));
        }
        if request.round == 0 {
            return Err(PagesmithError::Validation(
                "round must be at least 1".to_string(),
            ));
        }

        let evaluation_url = self.resolve_evaluation_url(&request)?;

        Ok(ValidatedTask {
            request,
            evaluation_url,
        })
    }

    fn authenticate(&self, request: &TaskRequest) -> Result<()> {
        let provided = request
            .secret
            .as_deref()
            .filter(|s| !s.is_empty())
            .ok_or_else(|| PagesmithError::Authentication("missing secret".to_string()))?;

        let per_email = request
            .email
            .as_deref()
            .and_then(|email| self.store.get(email));

        let expected = per_email
            .or(self.auth.shared_secret.as_deref())
            .filter(|s| !s.is_empty())
            .ok_or_else(|| {
                PagesmithError::Authentication("no secret is configured for this caller".to_string())
            })?;

        if secrets_match(expected, provided) {
            Ok(())
        } else {
            Err(PagesmithError::Authentication("invalid secret".to_string()))
        }
    }

    fn resolve_evaluation_url(&self, request: &TaskRequest) -> Result<String> {
        let url = self
            .evaluator
            .url
            .clone()
            .or_else(|| request.evaluation_url.clone())
            .filter(|u| !u.trim().is_empty())
            .ok_or_else(|| PagesmithError::Validation("missing evaluation_url".to_string()))?;

        if !(url.starts_with("https://") || url.starts_with("http://")) {
            return Err(PagesmithError::Validation(format!(
                "evaluation_url must be an http(s) URL, got '{url}'"
            )));
        }
        Ok(url)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
