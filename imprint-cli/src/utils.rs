//! Common helpers for rendering and logging comparison results.

use std::fs::OpenOptions;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::Local;
use comfy_table::presets::ASCII_FULL;
use comfy_table::Table;
use imprint_core::ComparisonResult;
use sha3::{Digest, Sha3_256};

/// Render the comparison rows as an aligned, bordered table.
pub fn render_table(result: &ComparisonResult) -> String {
    let mut table = Table::new();
    table
        .load_preset(ASCII_FULL)
        .set_header(["", "Document 1", "Document 2", "Matching"]);

    for row in result.rows() {
        table.add_row([
            row.field.to_string(),
            row.left.clone(),
            row.right.clone(),
            row.verdict.to_string(),
        ]);
    }

    table.to_string()
}

/// SHA3-256 of a file, hex-encoded.
pub fn sha3_hex(path: &Path) -> Result<String> {
    let bytes = std::fs::read(path)
        .with_context(|| format!("Failed to read file: {}", path.display()))?;
    let mut hasher = Sha3_256::new();
    hasher.update(&bytes);
    Ok(hex::encode(hasher.finalize()))
}

/// Append one comparison outcome to a CSV log, writing the header when the
/// file is first created. Column layout:
/// `DateTime, Filename1, Fuzzy-hash1, SHA3-hash, Filename2, Fuzzy-hash2, Matching`.
pub fn append_csv_log(log_path: &Path, result: &ComparisonResult, lhs: &Path) -> Result<()> {
    let fuzzy = result
        .row("Fuzzy hash")
        .context("comparison has no fuzzy hash row; CSV logging applies to documents")?;
    let filenames = result
        .row("Filename")
        .context("comparison has no filename row")?;

    let is_new = !log_path.exists();
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_path)
        .with_context(|| format!("Failed to append to log: {}", log_path.display()))?;

    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(file);

    if is_new {
        writer.write_record([
            "DateTime",
            "Filename1",
            "Fuzzy-hash1",
            "SHA3-hash",
            "Filename2",
            "Fuzzy-hash2",
            "Matching",
        ])?;
    }

    writer.write_record([
        Local::now().format("%d.%m.%Y %H:%M:%S").to_string(),
        filenames.left.clone(),
        fuzzy.left.clone(),
        sha3_hex(lhs)?,
        filenames.right.clone(),
        fuzzy.right.clone(),
        fuzzy.verdict.to_string(),
    ])?;
    writer.flush()?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sha3_hex_is_stable() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("f.bin");
        std::fs::write(&path, b"imprint").unwrap();

        let a = sha3_hex(&path).unwrap();
        let b = sha3_hex(&path).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.len(), 64);
    }
}
