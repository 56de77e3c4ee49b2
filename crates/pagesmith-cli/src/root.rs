use pagesmith_core::paths::PAGESMITH_DIR;
use std::path::{Path, PathBuf};

/// Resolve the service root directory.
///
/// Priority:
/// 1. `--root` flag / `PAGESMITH_ROOT` env var (passed in as `explicit`)
/// 2. Walk upward from `cwd` looking for `.pagesmith/`
/// 3. Fall back to `cwd`
pub fn resolve_root(explicit: Option<&Path>) -> PathBuf {
    if let Some(p) = explicit {
        return p.to_path_buf();
    }

    let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
    find_marker(&cwd).unwrap_or(cwd)
}

fn find_marker(start: &Path) -> Option<PathBuf> {
    start
        .ancestors()
        .find(|dir| dir.join(PAGESMITH_DIR).is_dir())
        .map(Path::to_path_buf)
}
