use crate::output::{print_json, print_table};
use anyhow::{Context, Result};
use clap::Subcommand;
use pagesmith_core::secrets::SecretStore;
use std::path::Path;

// ---------------------------------------------------------------------------
// Subcommand tree
// ---------------------------------------------------------------------------

#[derive(Subcommand)]
pub enum SecretsSubcommand {
    /// Register or replace the secret for an email
    Add {
        /// Submitter email
        email: String,
        /// Shared secret for that email
        secret: String,
    },
    /// List registered emails (secrets are never printed)
    List,
    /// Remove the secret for an email
    Remove {
        /// Submitter email
        email: String,
    },
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

pub fn run(root: &Path, subcommand: SecretsSubcommand, json: bool) -> Result<()> {
    let mut store = SecretStore::load(root).context("failed to load secret store")?;

    match subcommand {
        SecretsSubcommand::Add { email, secret } => {
            store.add(&email, &secret)?;
            store.save(root).context("failed to save secret store")?;
            if json {
                print_json(&serde_json::json!({ "email": email.trim(), "status": "saved" }))?;
            } else {
                println!("Saved secret for {}", email.trim());
            }
        }
        SecretsSubcommand::List => {
            let emails = store.emails();
            if json {
                print_json(&emails)?;
            } else if emails.is_empty() {
                println!("No secrets registered.");
            } else {
                let rows = emails.into_iter().map(|e| vec![e]).collect();
                print_table(&["EMAIL"], rows);
            }
        }
        SecretsSubcommand::Remove { email } => {
            store.remove(&email)?;
            store.save(root).context("failed to save secret store")?;
            if json {
                print_json(&serde_json::json!({ "email": email, "status": "removed" }))?;
            } else {
                println!("Removed secret for {email}");
            }
        }
    }

    Ok(())
}
