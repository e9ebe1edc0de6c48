//! Pairwise comparison of two watermarked artifacts.
//!
//! Token-typed fields get an exact-match verdict; hash-typed fields get a
//! similarity percentage. The fuzzy-digest percentage and the perceptual
//! `100 - hamming` percentage are different metric families and are only
//! rendered alike, never merged.

use serde::ser::SerializeStruct;
use serde::{Serialize, Serializer};

use crate::category::{Artifact, FileCategory};
use crate::error::{ImprintError, Result};
use crate::extract::{self, DocumentIdentity, ImageIdentity};
use crate::identifier::NOT_FOUND;
use crate::phash::ImageHash64;

pub const FIELD_FILE_NAME: &str = "Filename";
pub const FIELD_CREATOR: &str = "Creator name";
pub const FIELD_WORKPLACE: &str = "Workplace name";
pub const FIELD_CREATED: &str = "Creation time";
pub const FIELD_MODIFIED: &str = "Last modified time";
pub const FIELD_FUZZY_HASH: &str = "Fuzzy hash";
pub const FIELD_HASH_INTEGRITY: &str = "Hash integrity";
pub const FIELD_AVG_HASH: &str = "Average hash";
pub const FIELD_DIFF_HASH: &str = "Difference hash";
pub const FIELD_PERC_HASH: &str = "Perceptual hash";
pub const FIELD_COLOR_HASH: &str = "HSV color hash";

/// Per-field outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Match,
    Mismatch,
    /// Similarity percentage, 0..=100.
    Similarity(u32),
}

impl std::fmt::Display for Verdict {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Verdict::Match => f.write_str("[v] matches"),
            Verdict::Mismatch => f.write_str("[ ] mismatches"),
            Verdict::Similarity(pct) => write!(f, "{pct} %"),
        }
    }
}

// Rendered form is the external contract (`"<integer> %"` for hash fields),
// so verdicts serialize as their display strings.
impl Serialize for Verdict {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// One comparison row: field name, both values, verdict.
#[derive(Debug, Clone, Serialize)]
pub struct ComparisonRow {
    pub field: &'static str,
    pub left: String,
    pub right: String,
    pub verdict: Verdict,
}

/// Ordered row sequence; row order follows the category's field declaration
/// order and is stable across runs.
#[derive(Debug, Clone)]
pub struct ComparisonResult {
    rows: Vec<ComparisonRow>,
}

impl ComparisonResult {
    pub fn rows(&self) -> &[ComparisonRow] {
        &self.rows
    }

    pub fn row(&self, field: &str) -> Option<&ComparisonRow> {
        self.rows.iter().find(|r| r.field == field)
    }

    /// Rows with a non-matching exact verdict.
    pub fn mismatches(&self) -> impl Iterator<Item = &ComparisonRow> {
        self.rows.iter().filter(|r| r.verdict == Verdict::Mismatch)
    }
}

impl Serialize for ComparisonResult {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("ComparisonResult", 1)?;
        state.serialize_field("rows", &self.rows)?;
        state.end()
    }
}

/// Compare two artifacts of the same family field by field.
pub fn compare(a: &Artifact, b: &Artifact) -> Result<ComparisonResult> {
    if !a.category().comparable_with(&b.category()) {
        return Err(ImprintError::IncomparableCategories {
            left: a.category().family(),
            right: b.category().family(),
        });
    }

    let rows = match a.category() {
        FileCategory::Document(_) => {
            let left = extract::extract_document(a.path())?;
            let right = extract::extract_document(b.path())?;
            document_rows(&left, &right)?
        }
        FileCategory::Image(_) => {
            let left = extract::extract_image(a.path())?;
            let right = extract::extract_image(b.path())?;
            image_rows(&left, &right)
        }
    };

    Ok(ComparisonResult { rows })
}

/// Exact-match verdict with the absent-field rule: a sentinel value never
/// matches anything, not even another sentinel.
fn token_verdict(left: &str, right: &str) -> Verdict {
    if left == NOT_FOUND || right == NOT_FOUND || left != right {
        Verdict::Mismatch
    } else {
        Verdict::Match
    }
}

fn token_row(field: &'static str, left: &str, right: &str) -> ComparisonRow {
    ComparisonRow {
        field,
        left: left.to_string(),
        right: right.to_string(),
        verdict: token_verdict(left, right),
    }
}

fn hash_row(field: &'static str, left: &ImageHash64, right: &ImageHash64) -> ComparisonRow {
    ComparisonRow {
        field,
        left: left.to_hex(),
        right: right.to_hex(),
        verdict: Verdict::Similarity(left.similarity(right)),
    }
}

fn document_rows(a: &DocumentIdentity, b: &DocumentIdentity) -> Result<Vec<ComparisonRow>> {
    let fa = &a.fields;
    let fb = &b.fields;

    Ok(vec![
        token_row(FIELD_FILE_NAME, &fa.file_name, &fb.file_name),
        token_row(FIELD_CREATOR, &fa.creator, &fb.creator),
        token_row(FIELD_WORKPLACE, &fa.workplace, &fb.workplace),
        token_row(FIELD_CREATED, &fa.created, &fb.created),
        token_row(FIELD_MODIFIED, &fa.modified, &fb.modified),
        ComparisonRow {
            field: FIELD_FUZZY_HASH,
            left: fa.fuzzy_hash.as_str().to_string(),
            right: fb.fuzzy_hash.as_str().to_string(),
            verdict: Verdict::Similarity(fa.fuzzy_hash.compare(&fb.fuzzy_hash)?),
        },
        token_row(
            FIELD_HASH_INTEGRITY,
            if a.hash_integrity { "true" } else { "false" },
            if b.hash_integrity { "true" } else { "false" },
        ),
    ])
}

fn image_rows(a: &ImageIdentity, b: &ImageIdentity) -> Vec<ComparisonRow> {
    vec![
        token_row(FIELD_FILE_NAME, &a.file_name, &b.file_name),
        hash_row(FIELD_AVG_HASH, &a.hashes.average, &b.hashes.average),
        hash_row(FIELD_DIFF_HASH, &a.hashes.difference, &b.hashes.difference),
        hash_row(FIELD_PERC_HASH, &a.hashes.perceptual, &b.hashes.perceptual),
        hash_row(FIELD_COLOR_HASH, &a.hashes.color, &b.hashes.color),
    ]
}
