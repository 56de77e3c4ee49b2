use crate::output::print_json;
use anyhow::{Context, Result};
use clap::Subcommand;
use pagesmith_core::config::{Config, WarnLevel};
use std::path::Path;

// ---------------------------------------------------------------------------
// Subcommand types
// ---------------------------------------------------------------------------

#[derive(Subcommand)]
pub enum ConfigSubcommand {
    /// Print the effective configuration (secrets masked)
    Show,

    /// Validate the config for common mistakes
    Validate,
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

pub fn run(root: &Path, subcmd: ConfigSubcommand, json: bool) -> Result<()> {
    let mut config = Config::load(root).context("failed to load config")?;
    config.apply_env(|key| std::env::var(key).ok());

    match subcmd {
        ConfigSubcommand::Show => show(config, json),
        ConfigSubcommand::Validate => validate(&config, json),
    }
}

// ---------------------------------------------------------------------------
// show
// ---------------------------------------------------------------------------

fn show(mut config: Config, json: bool) -> Result<()> {
    let token_set = config.github.token.is_some();
    if config.auth.shared_secret.is_some() {
        config.auth.shared_secret = Some("********".to_string());
    }
    if config.server.admin_token.is_some() {
        config.server.admin_token = Some("********".to_string());
    }

    if json {
        let mut value = serde_json::to_value(&config)?;
        value["github"]["token_set"] = serde_json::Value::Bool(token_set);
        print_json(&value)?;
    } else {
        println!("port:            {}", config.server.port);
        println!("github api:      {}", config.github.api_base);
        println!("github owner:    {}", config.github.owner);
        println!("branch:          {}", config.github.branch);
        println!(
            "token:           {} ({})",
            if token_set { "set" } else { "missing" },
            config.github.token_env
        );
        println!(
            "evaluator:       {}",
            config.evaluator.url.as_deref().unwrap_or("(per request)")
        );
        println!("cleanup:         {}", config.publish.cleanup_on_failure);
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// validate
// ---------------------------------------------------------------------------

fn validate(config: &Config, json: bool) -> Result<()> {
    let warnings = config.validate();

    if json {
        print_json(&serde_json::json!({ "warnings": warnings }))?;
    } else if warnings.is_empty() {
        println!("Config is valid. No warnings.");
    } else {
        for w in &warnings {
            let prefix = match w.level {
                WarnLevel::Warning => "warning",
                WarnLevel::Error => "error",
            };
            println!("[{prefix}] {}", w.message);
        }
    }

    if warnings.iter().any(|w| w.level == WarnLevel::Error) {
        anyhow::bail!("config validation found errors");
    }
    Ok(())
}
