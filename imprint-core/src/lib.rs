//! Imprint Core - provenance fingerprinting for documents and images
//!
//! This crate embeds a compact, recoverable provenance identifier into OOXML
//! container documents (.docx/.xlsx) and into raster image filenames
//! (.jpg/.png/.bmp), then recovers and compares two identifiers to judge
//! whether two files share origin or have been tampered with or duplicated.
//!
//! # Design
//!
//! - Documents carry the identifier inside `docProps/core.xml`: the packed,
//!   base64-wrapped field string in `dc:description` and a redundant raw
//!   fuzzy digest in `cp:keywords` (the integrity cross-check).
//! - Images carry it in the output filename: the wrapped original name plus
//!   four 64-bit perceptual hash tokens. Pixel data is never modified.
//! - Comparison produces one row per field: exact match/mismatch for token
//!   fields, a 0-100 similarity percentage for hash fields.
//!
//! The scheme detects accidental mismatch and duplication; it is not
//! cryptographic tamper-proofing.
//!
//! # Example
//!
//! ```no_run
//! use std::path::Path;
//!
//! use imprint_core::Artifact;
//!
//! # fn example() -> imprint_core::Result<()> {
//! let report = Artifact::from_path("report.docx")?;
//! let watermarked = report.inject(Path::new("out"))?;
//!
//! let a = Artifact::from_path(&watermarked)?;
//! let b = Artifact::from_path("out/report-copy.docx")?;
//! for row in a.compare_with(&b)?.rows() {
//!     println!("{}: {}", row.field, row.verdict);
//! }
//! # Ok(())
//! # }
//! ```

pub mod category;
pub mod compare;
pub mod error;
pub mod extract;
pub mod fingerprint;
pub mod identifier;
pub mod inject;
pub mod ooxml;
pub mod phash;

// Re-export main types for convenience
pub use category::{Artifact, DocumentKind, FileCategory, ImageKind};
pub use compare::{compare, ComparisonResult, ComparisonRow, Verdict};
pub use error::{ImprintError, Result};
pub use extract::{extract_document, extract_image, DocumentIdentity, ExtractedIdentity, ImageIdentity};
pub use fingerprint::{fingerprint_document, FuzzyDigest};
pub use identifier::{DocumentIdentifier, NOT_FOUND};
pub use inject::{inject_document, inject_image};
pub use phash::{ImageHash64, PerceptualHashSet, IMAGE_HASH_HEX_WIDTH};
