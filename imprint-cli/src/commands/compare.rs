//! Compare command implementation: recover both identities, print the
//! field-by-field verdicts, optionally append the outcome to a CSV log.

use std::path::PathBuf;

use anyhow::{bail, Result};
use imprint_core::Artifact;
use tracing::{debug, info};

use crate::utils;

/// Execute the compare command for a pair of watermarked files.
pub fn execute(file1: PathBuf, file2: PathBuf, log: Option<PathBuf>, json: bool) -> Result<()> {
    for path in [&file1, &file2] {
        if !path.exists() {
            bail!("path {} does not exist", path.display());
        }
    }

    let left = Artifact::from_path(&file1)?;
    let right = Artifact::from_path(&file2)?;
    debug!(
        left = %file1.display(),
        right = %file2.display(),
        family = left.category().family(),
        "Comparing identifiers"
    );

    let result = left.compare_with(&right)?;

    if json {
        println!("{}", serde_json::to_string_pretty(result.rows())?);
    } else {
        println!("{}", utils::render_table(&result));
    }

    if let Some(log_path) = log {
        utils::append_csv_log(&log_path, &result, &file1)?;
        info!(log = %log_path.display(), "Comparison appended to log");
    }

    let mismatches = result.mismatches().count();
    if mismatches == 0 {
        info!("All fields match");
    } else {
        info!(count = mismatches, "Some fields mismatch");
    }

    Ok(())
}
