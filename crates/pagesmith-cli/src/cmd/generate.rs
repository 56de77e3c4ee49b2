use crate::output::print_json;
use anyhow::{Context, Result};
use pagesmith_core::generator;
use pagesmith_core::io::atomic_write;
use pagesmith_core::types::TaskRequest;
use std::path::Path;

/// Build the site for a request file locally, without authenticating or
/// publishing anything.
pub fn run(request: &Path, out: &Path, json: bool) -> Result<()> {
    let data = std::fs::read(request)
        .with_context(|| format!("failed to read {}", request.display()))?;
    let task: TaskRequest = serde_json::from_slice(&data)
        .with_context(|| format!("{} is not a valid task request", request.display()))?;

    let app = generator::generate(&task)?;
    for file in app.iter() {
        let dest = out.join(&file.path);
        atomic_write(&dest, &file.content)
            .with_context(|| format!("failed to write {}", dest.display()))?;
    }

    let paths: Vec<&str> = app.iter().map(|f| f.path.as_str()).collect();
    if json {
        print_json(&serde_json::json!({
            "out": out.display().to_string(),
            "files": paths,
        }))?;
    } else {
        for path in &paths {
            println!("{path}");
        }
        println!("Wrote {} files to {}", paths.len(), out.display());
    }
    Ok(())
}
