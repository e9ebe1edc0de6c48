//! Injection: produce a watermarked copy of an artifact in an output
//! directory, leaving the source untouched.
//!
//! Documents carry their identifier inside the core-properties part of the
//! container archive. Images carry it in the output filename, because none
//! of the raster formats in scope has an application-metadata channel that
//! reliably survives common viewers.

use std::fs::{self, File};
use std::io::{BufReader, Read, Write};
use std::path::{Path, PathBuf};

use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

use crate::category::DocumentKind;
use crate::error::{ImprintError, Result};
use crate::extract;
use crate::fingerprint::fingerprint_document;
use crate::identifier::{wrap_filename, DocumentIdentifier, NOT_FOUND};
use crate::ooxml;
use crate::phash::PerceptualHashSet;

/// Inject a provenance identifier into the container document at `src`,
/// writing the watermarked copy to `out_dir/basename(src)`.
///
/// The output archive preserves every entry of the source; only the two
/// core-properties slots change. Re-injecting an already watermarked
/// document reuses its embedded fingerprint instead of recomputing it.
pub fn inject_document(src: &Path, kind: DocumentKind, out_dir: &Path) -> Result<PathBuf> {
    if !src.exists() {
        return Err(ImprintError::NotFound(src.to_path_buf()));
    }
    ensure_output_dir(out_dir)?;

    let file_name = basename(src)?;
    let fields = gather_fields(src, kind, &file_name)?;

    let dest = out_dir.join(&file_name);
    rewrite_archive(src, &dest, out_dir, &fields).map_err(|e| match e {
        err @ (ImprintError::InjectionFailed { .. } | ImprintError::MalformedIdentifier(_)) => err,
        other => ImprintError::InjectionFailed {
            path: src.to_path_buf(),
            reason: other.to_string(),
        },
    })?;

    Ok(dest)
}

/// Copy the image at `src` into `out_dir` under a watermark-carrying name:
/// `<wrapped name>_<avg>_<dhash>_<phash>_<colorhash><ext>`. Pixel data is
/// not modified; an existing file under the target name is replaced.
pub fn inject_image(src: &Path, out_dir: &Path) -> Result<PathBuf> {
    if !src.exists() {
        return Err(ImprintError::NotFound(src.to_path_buf()));
    }
    ensure_output_dir(out_dir)?;

    let file_name = basename(src)?;
    let image = image::open(src).map_err(|e| ImprintError::Image(e.to_string()))?;
    let hashes = PerceptualHashSet::compute(&image)?;

    let extension = src
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| format!(".{e}"))
        .unwrap_or_default();

    let target_name = format!(
        "{}_{}_{}_{}_{}{}",
        wrap_filename(&file_name),
        hashes.average.to_hex(),
        hashes.difference.to_hex(),
        hashes.perceptual.to_hex(),
        hashes.color.to_hex(),
        extension
    );

    let dest = out_dir.join(target_name);
    fs::copy(src, &dest)?;
    Ok(dest)
}

/// Collect the identifier fields for a document, reusing an embedded
/// fingerprint when one is present and decodable.
fn gather_fields(src: &Path, kind: DocumentKind, file_name: &str) -> Result<DocumentIdentifier> {
    let core_xml = read_core_properties(src)?;

    let fuzzy_hash = match extract::extract_document(src) {
        Ok(identity) => identity.fields.fuzzy_hash,
        Err(ImprintError::NoIdentifierPresent(_)) | Err(ImprintError::MalformedIdentifier(_)) => {
            fingerprint_document(src, kind)?
        }
        Err(other) => return Err(other),
    };

    Ok(DocumentIdentifier {
        file_name: file_name.to_string(),
        creator: core_field(&core_xml, ooxml::CREATOR_TAG)?,
        workplace: workplace_name(),
        created: core_field(&core_xml, ooxml::CREATED_TAG)?,
        modified: core_field(&core_xml, ooxml::MODIFIED_TAG)?,
        fuzzy_hash,
    })
}

fn core_field(core_xml: &str, tag: &str) -> Result<String> {
    Ok(ooxml::element_text(core_xml, tag)?
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| NOT_FOUND.to_string()))
}

/// Host name of the injecting machine, or the sentinel when unavailable.
fn workplace_name() -> String {
    hostname::get()
        .ok()
        .and_then(|h| h.into_string().ok())
        .filter(|h| !h.is_empty() && !h.contains(char::is_whitespace))
        .unwrap_or_else(|| NOT_FOUND.to_string())
}

fn read_core_properties(src: &Path) -> Result<String> {
    let file = File::open(src)?;
    let mut archive = ZipArchive::new(BufReader::new(file))?;
    let mut entry = archive.by_name(ooxml::CORE_PROPERTIES_PART).map_err(|_| {
        ImprintError::InjectionFailed {
            path: src.to_path_buf(),
            reason: format!("archive has no {} part", ooxml::CORE_PROPERTIES_PART),
        }
    })?;
    let mut xml = String::new();
    entry.read_to_string(&mut xml)?;
    Ok(xml)
}

/// Steps 3-6 of the injection contract: materialize the archive into a
/// private scratch area, patch the two metadata slots, and repack with
/// entries ordered by relative path. The scratch directory and the staged
/// output file are both scoped resources; any failure path drops them
/// without leaving partial state behind.
fn rewrite_archive(
    src: &Path,
    dest: &Path,
    out_dir: &Path,
    fields: &DocumentIdentifier,
) -> Result<()> {
    let scratch = tempfile::tempdir()?;

    let file = File::open(src)?;
    let mut archive = ZipArchive::new(BufReader::new(file))?;
    let mut entry_names: Vec<String> = archive.file_names().map(String::from).collect();
    archive.extract(scratch.path())?;

    let core_path = scratch.path().join(ooxml::CORE_PROPERTIES_PART);
    let xml = fs::read_to_string(&core_path)?;
    let xml = ooxml::set_element_text(&xml, ooxml::KEYWORDS_TAG, fields.fuzzy_hash.as_str())?;
    let xml = ooxml::set_element_text(&xml, ooxml::DESCRIPTION_TAG, &fields.encode_wrapped()?)?;
    fs::write(&core_path, xml)?;

    entry_names.sort();

    // Stage the repacked archive next to the destination and persist it only
    // once it is complete.
    let mut staged = tempfile::Builder::new()
        .prefix(".imprint-")
        .tempfile_in(out_dir)?;
    {
        let mut writer = ZipWriter::new(staged.as_file_mut());
        let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

        for name in &entry_names {
            if name.ends_with('/') {
                writer.add_directory(name.trim_end_matches('/'), options)?;
            } else {
                writer.start_file(name.as_str(), options)?;
                let data = fs::read(scratch.path().join(name))?;
                writer.write_all(&data)?;
            }
        }
        writer.finish()?;
    }
    staged.persist(dest).map_err(|e| e.error)?;

    Ok(())
}

fn ensure_output_dir(out_dir: &Path) -> Result<()> {
    if out_dir.exists() {
        if !out_dir.is_dir() {
            return Err(ImprintError::InvalidOutput(out_dir.to_path_buf()));
        }
        return Ok(());
    }
    fs::create_dir_all(out_dir)?;
    Ok(())
}

fn basename(path: &Path) -> Result<String> {
    path.file_name()
        .and_then(|n| n.to_str())
        .map(String::from)
        .ok_or_else(|| ImprintError::NotFound(path.to_path_buf()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_source_is_not_found() {
        let out = tempfile::tempdir().unwrap();
        let err = inject_document(
            Path::new("/nonexistent/report.docx"),
            DocumentKind::WordProcessing,
            out.path(),
        )
        .unwrap_err();
        assert!(matches!(err, ImprintError::NotFound(_)));
    }

    #[test]
    fn test_output_path_must_be_a_directory() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("a.docx");
        fs::write(&src, b"stub").unwrap();
        let blocker = dir.path().join("out");
        fs::write(&blocker, b"not a directory").unwrap();

        let err = inject_document(&src, DocumentKind::WordProcessing, &blocker).unwrap_err();
        assert!(matches!(err, ImprintError::InvalidOutput(_)));
    }

    #[test]
    fn test_workplace_name_is_a_single_token() {
        let name = workplace_name();
        assert!(!name.is_empty());
        assert!(!name.contains(char::is_whitespace));
    }
}
