//! Per-email secret store.
//!
//! Layout:
//!   .pagesmith/
//!     secrets.yaml   — `secrets: { email: secret }` (keep out of version control)

use crate::error::{PagesmithError, Result};
use crate::io;
use crate::paths;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct SecretStore {
    #[serde(default)]
    secrets: BTreeMap<String, String>,
}

impl SecretStore {
    pub fn load(root: &Path) -> Result<Self> {
        let path = paths::secrets_path(root);
        if !path.exists() {
            return Ok(SecretStore::default());
        }
        let content = std::fs::read_to_string(&path)?;
        Ok(serde_yaml::from_str(&content)?)
    }

    pub fn save(&self, root: &Path) -> Result<()> {
        io::ensure_dir(&paths::pagesmith_dir(root))?;
        let content = serde_yaml::to_string(self)?;
        io::atomic_write(&paths::secrets_path(root), content.as_bytes())
    }

    /// Insert or replace the secret for `email`.
    pub fn add(&mut self, email: &str, secret: &str) -> Result<()> {
        let email = email.trim();
        if email.is_empty() || secret.is_empty() {
            return Err(PagesmithError::Validation(
                "email and secret are both required".to_string(),
            ));
        }
        self.secrets.insert(email.to_string(), secret.to_string());
        Ok(())
    }

    pub fn remove(&mut self, email: &str) -> Result<()> {
        self.secrets
            .remove(email.trim())
            .map(|_| ())
            .ok_or_else(|| PagesmithError::SecretNotFound(email.to_string()))
    }

    pub fn get(&self, email: &str) -> Option<&str> {
        self.secrets.get(email.trim()).map(String::as_str)
    }

    /// Registered emails in sorted order. Secret values are never listed.
    pub fn emails(&self) -> Vec<String> {
        self.secrets.keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.secrets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.secrets.is_empty()
    }
}

/// Compare two secrets without short-circuiting on the first differing byte.
pub fn secrets_match(expected: &str, provided: &str) -> bool {
    let a = expected.as_bytes();
    let b = provided.as_bytes();
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
