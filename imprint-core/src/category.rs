//! File taxonomy: the closed set of artifact kinds the engine understands.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::compare::ComparisonResult;
use crate::error::{ImprintError, Result};
use crate::extract::ExtractedIdentity;
use crate::{compare, extract, inject};

/// Container-document extensions carrying an OOXML core-properties part.
pub const DOCUMENT_EXTENSIONS: &[&str] = &["docx", "xlsx"];

/// Raster image extensions with no safe embedded-metadata channel.
pub const IMAGE_EXTENSIONS: &[&str] = &["jpg", "png", "bmp"];

/// Container-document flavor, which decides what payload is fingerprinted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DocumentKind {
    WordProcessing,
    Spreadsheet,
}

/// Raster image flavor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ImageKind {
    Jpeg,
    Png,
    Bmp,
}

/// Closed tagged variant over the two artifact families.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FileCategory {
    Document(DocumentKind),
    Image(ImageKind),
}

impl FileCategory {
    /// Determine the category from a path's extension.
    pub fn from_path(path: &Path) -> Result<Self> {
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .unwrap_or_default();

        match extension.as_str() {
            "docx" => Ok(Self::Document(DocumentKind::WordProcessing)),
            "xlsx" => Ok(Self::Document(DocumentKind::Spreadsheet)),
            "jpg" => Ok(Self::Image(ImageKind::Jpeg)),
            "png" => Ok(Self::Image(ImageKind::Png)),
            "bmp" => Ok(Self::Image(ImageKind::Bmp)),
            _ => Err(ImprintError::InvalidExtension {
                path: path.to_path_buf(),
                expected: DOCUMENT_EXTENSIONS
                    .iter()
                    .chain(IMAGE_EXTENSIONS)
                    .map(|e| format!(".{e}"))
                    .collect::<Vec<_>>()
                    .join(", "),
            }),
        }
    }

    /// Family name for diagnostics and comparability checks.
    pub fn family(&self) -> &'static str {
        match self {
            Self::Document(_) => "document",
            Self::Image(_) => "image",
        }
    }

    /// Two artifacts are comparable iff they belong to the same family.
    pub fn comparable_with(&self, other: &Self) -> bool {
        self.family() == other.family()
    }
}

/// Does a filename token end in a recognized container-document extension?
///
/// Used by the identifier codec to find the filename boundary inside a
/// whitespace-packed field string.
pub fn has_document_extension(token: &str) -> bool {
    let lower = token.to_ascii_lowercase();
    DOCUMENT_EXTENSIONS
        .iter()
        .any(|ext| lower.ends_with(&format!(".{ext}")))
}

/// A source file together with its resolved category.
///
/// The shared identifier capability (`inject`, `extract`, `compare_with`) is
/// implemented once per variant here instead of branching on extension
/// strings at every call site.
#[derive(Debug, Clone)]
pub struct Artifact {
    path: PathBuf,
    category: FileCategory,
}

impl Artifact {
    /// Resolve the artifact kind for `path`. Fails with `InvalidExtension`
    /// for anything outside the supported set.
    pub fn from_path(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let category = FileCategory::from_path(&path)?;
        Ok(Self { path, category })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn category(&self) -> FileCategory {
        self.category
    }

    /// Produce a watermarked copy of this artifact under `out_dir`.
    pub fn inject(&self, out_dir: &Path) -> Result<PathBuf> {
        match self.category {
            FileCategory::Document(kind) => inject::inject_document(&self.path, kind, out_dir),
            FileCategory::Image(_) => inject::inject_image(&self.path, out_dir),
        }
    }

    /// Recover the embedded identity from this (already watermarked) artifact.
    pub fn extract(&self) -> Result<ExtractedIdentity> {
        match self.category {
            FileCategory::Document(_) => {
                extract::extract_document(&self.path).map(ExtractedIdentity::Document)
            }
            FileCategory::Image(_) => {
                extract::extract_image(&self.path).map(ExtractedIdentity::Image)
            }
        }
    }

    /// Compare this artifact's identity against another of the same family.
    pub fn compare_with(&self, other: &Artifact) -> Result<ComparisonResult> {
        compare::compare(self, other)
    }
}
