//! Content fingerprinting: reduce a container document's valuable textual
//! payload to a single fuzzy digest.
//!
//! Only the payload that survives a cosmetic re-save is fingerprinted, never
//! the raw archive bytes: word-processing documents contribute their text
//! runs, spreadsheets their serialized sheet data (attributes included, since
//! cell coordinates matter). Part names are sorted before concatenation so
//! the digest is independent of archive entry order.

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use serde::{Deserialize, Serialize};
use ssdeep as ffuzzy;
use zip::ZipArchive;

use crate::category::DocumentKind;
use crate::error::{ImprintError, Result};
use crate::ooxml;

/// A validated ssdeep-compatible fuzzy digest.
///
/// Contract with the underlying algorithm: deterministic for identical input
/// bytes, and `compare` is symmetric, returning 0 (unrelated) to 100
/// (identical payload). The digest string never contains whitespace, which
/// is what lets it travel as a single token inside a packed identifier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FuzzyDigest(String);

impl FuzzyDigest {
    /// Fingerprint a byte buffer.
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        let hash = ffuzzy::hash_buf(data).map_err(|e| ImprintError::FuzzyHash(e.to_string()))?;
        Ok(Self(hash.to_string()))
    }

    /// Validate and adopt an existing digest string.
    pub fn parse(digest: &str) -> Result<Self> {
        digest.parse::<ffuzzy::RawFuzzyHash>().map_err(|e| {
            ImprintError::MalformedIdentifier(format!("invalid fuzzy digest {digest:?}: {e}"))
        })?;
        Ok(Self(digest.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Similarity score between two digests, 0..=100.
    pub fn compare(&self, other: &Self) -> Result<u32> {
        ffuzzy::compare(&self.0, &other.0).map_err(|e| ImprintError::FuzzyHash(e.to_string()))
    }
}

impl std::fmt::Display for FuzzyDigest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Fingerprint the valuable payload of the container document at `path`.
pub fn fingerprint_document(path: &Path, kind: DocumentKind) -> Result<FuzzyDigest> {
    let file = File::open(path)?;
    let mut archive = ZipArchive::new(BufReader::new(file))?;

    let payload = match kind {
        DocumentKind::WordProcessing => word_payload(&mut archive)?,
        DocumentKind::Spreadsheet => spreadsheet_payload(&mut archive)?,
    };

    FuzzyDigest::from_bytes(payload.as_bytes())
}

/// Concatenated text runs from the main body and any header/footer parts.
fn word_payload<R: Read + std::io::Seek>(archive: &mut ZipArchive<R>) -> Result<String> {
    let mut parts: Vec<String> = archive
        .file_names()
        .filter(|name| {
            *name == "word/document.xml"
                || ((name.starts_with("word/header") || name.starts_with("word/footer"))
                    && name.ends_with(".xml"))
        })
        .map(String::from)
        .collect();
    parts.sort();

    let mut payload = String::new();
    for name in &parts {
        let xml = read_part(archive, name)?;
        payload.push_str(&ooxml::text_runs(&xml)?);
    }
    Ok(payload)
}

/// Concatenated serialized `<sheetData>` elements from every worksheet part.
fn spreadsheet_payload<R: Read + std::io::Seek>(archive: &mut ZipArchive<R>) -> Result<String> {
    let mut parts: Vec<String> = archive
        .file_names()
        .filter(|name| name.starts_with("xl/worksheets/") && name.ends_with(".xml"))
        .map(String::from)
        .collect();
    parts.sort();

    let mut payload = String::new();
    for name in &parts {
        let xml = read_part(archive, name)?;
        payload.push_str(&ooxml::sheet_data(&xml)?);
    }
    Ok(payload)
}

fn read_part<R: Read + std::io::Seek>(archive: &mut ZipArchive<R>, name: &str) -> Result<String> {
    let mut entry = archive.by_name(name)?;
    let mut content = String::new();
    entry.read_to_string(&mut content)?;
    Ok(content)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_digest_is_deterministic() {
        let data = b"the quick brown fox jumps over the lazy dog".repeat(64);
        let a = FuzzyDigest::from_bytes(&data).unwrap();
        let b = FuzzyDigest::from_bytes(&data).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_identical_digests_compare_at_100() {
        let data = b"imprint fingerprint payload".repeat(128);
        let a = FuzzyDigest::from_bytes(&data).unwrap();
        let b = FuzzyDigest::from_bytes(&data).unwrap();
        assert_eq!(a.compare(&b).unwrap(), 100);
    }

    #[test]
    fn test_compare_is_symmetric() {
        let a = FuzzyDigest::from_bytes(&b"aaaaaaaaaa bbbbbbbbbb cccccccccc".repeat(64)).unwrap();
        let b = FuzzyDigest::from_bytes(&b"aaaaaaaaaa bbbbbbbbbb dddddddddd".repeat(64)).unwrap();
        assert_eq!(a.compare(&b).unwrap(), b.compare(&a).unwrap());
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(FuzzyDigest::parse("definitely not a digest").is_err());
        assert!(FuzzyDigest::parse("").is_err());
    }

    #[test]
    fn test_parse_accepts_valid_digest_verbatim() {
        let digest = FuzzyDigest::parse("3:abc:def").unwrap();
        assert_eq!(digest.as_str(), "3:abc:def");
    }
}
