use crate::auth::AdminAuth;
use pagesmith_core::config::Config;
use pagesmith_core::secrets::SecretStore;
use pagesmith_core::Pipeline;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Shared application state passed to all route handlers.
///
/// Configuration is immutable after startup; only the secret store changes,
/// through the admin routes.
#[derive(Clone)]
pub struct AppState {
    pub root: PathBuf,
    pub pipeline: Arc<Pipeline>,
    pub secrets: Arc<RwLock<SecretStore>>,
    pub admin: AdminAuth,
}

impl AppState {
    pub fn new(root: PathBuf, config: Config) -> pagesmith_core::Result<Self> {
        let store = SecretStore::load(&root)?;
        let admin = AdminAuth {
            token: config.server.admin_token.clone(),
        };
        let pipeline = Pipeline::new(config)?;
        Ok(Self {
            root,
            pipeline: Arc::new(pipeline),
            secrets: Arc::new(RwLock::new(store)),
            admin,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_state_loads_secret_store() {
        let dir = tempfile::TempDir::new().unwrap();
        let mut store = SecretStore::default();
        store.add("alice@example.com", "s3cret").unwrap();
        store.save(dir.path()).unwrap();

        let mut config = Config::default();
        config.github.token = Some("tok".to_string());
        let state = AppState::new(dir.path().to_path_buf(), config).unwrap();

        let rt = tokio::runtime::Runtime::new().unwrap();
        let loaded = rt.block_on(async { state.secrets.read().await.clone() });
        assert_eq!(loaded.get("alice@example.com"), Some("s3cret"));
    }

    #[test]
    fn new_state_requires_github_token() {
        let dir = tempfile::TempDir::new().unwrap();
        assert!(AppState::new(dir.path().to_path_buf(), Config::default()).is_err());
    }
}
