use std::path::{Path, PathBuf};

// ---------------------------------------------------------------------------
// Directory constants
// ---------------------------------------------------------------------------

pub const PAGESMITH_DIR: &str = ".pagesmith";
pub const CONFIG_FILE: &str = ".pagesmith/config.yaml";
pub const SECRETS_FILE: &str = ".pagesmith/secrets.yaml";

// ---------------------------------------------------------------------------
// Path helpers
// ---------------------------------------------------------------------------

pub fn pagesmith_dir(root: &Path) -> PathBuf {
    root.join(PAGESMITH_DIR)
}

pub fn config_path(root: &Path) -> PathBuf {
    root.join(CONFIG_FILE)
}

pub fn secrets_path(root: &Path) -> PathBuf {
    root.join(SECRETS_FILE)
}
