//! Inject command implementation: batch watermarking with skip-and-continue
//! semantics for directories.

use std::path::{Path, PathBuf};

use anyhow::{bail, Result};
use colored::Colorize;
use imprint_core::Artifact;
use tracing::{debug, info, warn};

/// Execute the inject command over every requested path.
pub fn execute(paths: Vec<PathBuf>, output: PathBuf) -> Result<()> {
    let mut injected = 0usize;
    let mut skipped = 0usize;

    for path in &paths {
        if !path.exists() {
            eprintln!("{} path {} does not exist", "skipped:".yellow(), path.display());
            skipped += 1;
            continue;
        }

        if path.is_dir() {
            for entry in std::fs::read_dir(path)? {
                let candidate = entry?.path();
                if candidate.is_dir() || Artifact::from_path(&candidate).is_err() {
                    debug!(path = %candidate.display(), "Not a supported file, skipping");
                    continue;
                }
                match inject_one(&candidate, &output) {
                    Ok(()) => injected += 1,
                    Err(err) => {
                        warn!(path = %candidate.display(), error = %err, "Injection failed");
                        eprintln!("{} {}: {err:#}", "skipped:".yellow(), candidate.display());
                        skipped += 1;
                    }
                }
            }
        } else {
            match inject_one(path, &output) {
                Ok(()) => injected += 1,
                Err(err) => {
                    warn!(path = %path.display(), error = %err, "Injection failed");
                    eprintln!("{} {}: {err:#}", "skipped:".yellow(), path.display());
                    skipped += 1;
                }
            }
        }
    }

    println!(
        "Completed: {} injected, {} skipped",
        injected.to_string().green(),
        skipped
    );

    if injected == 0 {
        bail!("no files were injected");
    }
    Ok(())
}

fn inject_one(path: &Path, output: &Path) -> Result<()> {
    let artifact = Artifact::from_path(path)?;
    let dest = artifact.inject(output)?;
    info!(
        source = %path.display(),
        dest = %dest.display(),
        category = artifact.category().family(),
        "Identifier injected"
    );
    println!(
        "Identifier injected into {}",
        dest.display().to_string().green()
    );
    Ok(())
}
