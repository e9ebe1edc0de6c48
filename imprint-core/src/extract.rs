//! Extraction: the read-side counterpart of the injectors. Recovers the
//! embedded identity from an already watermarked artifact.

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use serde::{Deserialize, Serialize};
use zip::ZipArchive;

use crate::error::{ImprintError, Result};
use crate::identifier::{unwrap_filename, DocumentIdentifier};
use crate::ooxml;
use crate::phash::{ImageHash64, PerceptualHashSet};

/// Identity recovered from a watermarked container document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentIdentity {
    pub fields: DocumentIdentifier,
    /// True iff the redundant explicit digest in the keywords slot equals
    /// the fingerprint packed into the description slot. Recomputed on every
    /// extraction, never stored.
    pub hash_integrity: bool,
}

/// Identity recovered from a watermarked image filename.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageIdentity {
    /// Original file name recovered from the wrapped first segment.
    pub file_name: String,
    pub hashes: PerceptualHashSet,
}

/// Identity of either artifact family.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExtractedIdentity {
    Document(DocumentIdentity),
    Image(ImageIdentity),
}

/// Recover the identifier embedded in a container document.
///
/// Fails with `NoIdentifierPresent` when the description slot is absent or
/// empty, and with `MalformedIdentifier` when the slot holds text that does
/// not unwrap or does not split into the expected fields.
pub fn extract_document(path: &Path) -> Result<DocumentIdentity> {
    if !path.exists() {
        return Err(ImprintError::NotFound(path.to_path_buf()));
    }

    let file = File::open(path)?;
    let mut archive = ZipArchive::new(BufReader::new(file))?;
    let mut core_xml = String::new();
    archive
        .by_name(ooxml::CORE_PROPERTIES_PART)?
        .read_to_string(&mut core_xml)?;

    let description = ooxml::element_text(&core_xml, ooxml::DESCRIPTION_TAG)?
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .ok_or_else(|| ImprintError::NoIdentifierPresent(path.to_path_buf()))?;

    let fields = DocumentIdentifier::decode_wrapped(&description)?;

    let keywords = ooxml::element_text(&core_xml, ooxml::KEYWORDS_TAG)?;
    let hash_integrity =
        keywords.as_deref().map(str::trim) == Some(fields.fuzzy_hash.as_str());

    Ok(DocumentIdentity {
        fields,
        hash_integrity,
    })
}

/// Recover the identifier carried by a watermarked image filename.
///
/// The stem must split (from the right, on `_`) into exactly five segments:
/// the wrapped original name followed by the four fixed-width hash tokens.
pub fn extract_image(path: &Path) -> Result<ImageIdentity> {
    let stem = path
        .file_stem()
        .and_then(|s| s.to_str())
        .ok_or_else(|| ImprintError::NotFound(path.to_path_buf()))?;

    // rsplitn keeps any `_` inside the wrapped segment intact; the four
    // trailing tokens are fixed-width and cannot contain the delimiter.
    let mut segments: Vec<&str> = stem.rsplitn(5, '_').collect();
    if segments.len() != 5 {
        return Err(ImprintError::MalformedIdentifier(format!(
            "image filename stem {stem:?} does not split into five `_`-delimited segments"
        )));
    }
    segments.reverse();

    Ok(ImageIdentity {
        file_name: unwrap_filename(segments[0])?,
        hashes: PerceptualHashSet {
            average: ImageHash64::from_hex(segments[1])?,
            difference: ImageHash64::from_hex(segments[2])?,
            perceptual: ImageHash64::from_hex(segments[3])?,
            color: ImageHash64::from_hex(segments[4])?,
        },
    })
}
