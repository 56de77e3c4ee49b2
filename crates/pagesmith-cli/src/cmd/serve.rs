use anyhow::{anyhow, Context, Result};
use pagesmith_core::config::{Config, WarnLevel};
use pagesmith_core::secrets::SecretStore;
use pagesmith_server::state::AppState;
use std::path::Path;

pub fn run(root: &Path, port: Option<u16>) -> Result<()> {
    let mut config = Config::load(root).context("failed to load config")?;
    config.apply_env(|key| std::env::var(key).ok());
    if let Some(port) = port {
        config.server.port = port;
    }

    for w in config.validate() {
        match w.level {
            WarnLevel::Error => tracing::error!("{}", w.message),
            WarnLevel::Warning => tracing::warn!("{}", w.message),
        }
    }
    let store = SecretStore::load(root).context("failed to load secret store")?;
    if let Some(message) = missing_secret_source(&config, &store) {
        tracing::error!("{message}");
    }

    let port = config.server.port;
    let state = AppState::new(root.to_path_buf(), config).map_err(|e| anyhow!("{e}"))?;

    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(async move {
        let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{port}"))
            .await
            .with_context(|| format!("failed to bind port {port}"))?;

        tokio::select! {
            res = pagesmith_server::serve_on(state, listener) => res,
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("shutting down");
                Ok(())
            }
        }
    })
}

/// Neither a shared secret nor any per-email secret: every task would fail
/// authentication.
fn missing_secret_source(config: &Config, store: &SecretStore) -> Option<&'static str> {
    (config.auth.shared_secret.is_none() && store.is_empty()).then_some(
        "no secret source configured: set auth.shared_secret or add one with `pagesmith secrets add`",
    )
}
