//! End-to-end tests for document injection, extraction and comparison,
//! exercised against synthesized OOXML fixtures.

use std::fs::File;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use imprint_core::{
    compare, extract_document, fingerprint_document, inject_document, Artifact, DocumentKind,
    ImprintError, Verdict,
};
use zip::write::SimpleFileOptions;
use zip::{ZipArchive, ZipWriter};

const CONTENT_TYPES: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="xml" ContentType="application/xml"/></Types>"#;

const RELS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"/>"#;

fn core_xml(creator: &str, created: &str, modified: &str, description: Option<&str>) -> String {
    let description = description
        .map(|d| format!("<dc:description>{d}</dc:description>"))
        .unwrap_or_default();
    format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<cp:coreProperties xmlns:cp="http://schemas.openxmlformats.org/package/2006/metadata/core-properties" xmlns:dc="http://purl.org/dc/elements/1.1/" xmlns:dcterms="http://purl.org/dc/terms/" xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance"><dc:creator>{creator}</dc:creator><dcterms:created xsi:type="dcterms:W3CDTF">{created}</dcterms:created><dcterms:modified xsi:type="dcterms:W3CDTF">{modified}</dcterms:modified>{description}</cp:coreProperties>"#
    )
}

fn document_xml(paragraphs: &[&str]) -> String {
    let body: String = paragraphs
        .iter()
        .map(|p| format!("<w:p><w:r><w:t>{p}</w:t></w:r></w:p>"))
        .collect();
    format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><w:body>{body}</w:body></w:document>"#
    )
}

struct DocxFixture<'a> {
    creator: &'a str,
    created: &'a str,
    modified: &'a str,
    paragraphs: &'a [&'a str],
    description: Option<&'a str>,
}

impl Default for DocxFixture<'_> {
    fn default() -> Self {
        Self {
            creator: "Alice Smith",
            created: "2023-01-01T00:00:00Z",
            modified: "2023-01-02T00:00:00Z",
            paragraphs: &[
                "The quarterly report covers revenue, churn and headcount.",
                "Revenue grew eleven percent quarter over quarter.",
                "Churn remained flat while headcount grew by twelve.",
            ],
            description: None,
        }
    }
}

fn write_docx(path: &Path, fixture: &DocxFixture<'_>) {
    let file = File::create(path).unwrap();
    let mut zip = ZipWriter::new(file);
    let opts = SimpleFileOptions::default();

    zip.start_file("[Content_Types].xml", opts).unwrap();
    zip.write_all(CONTENT_TYPES.as_bytes()).unwrap();

    zip.start_file("_rels/.rels", opts).unwrap();
    zip.write_all(RELS.as_bytes()).unwrap();

    zip.add_directory("word", opts).unwrap();

    zip.start_file("word/document.xml", opts).unwrap();
    zip.write_all(document_xml(fixture.paragraphs).as_bytes())
        .unwrap();

    zip.start_file("docProps/core.xml", opts).unwrap();
    zip.write_all(
        core_xml(
            fixture.creator,
            fixture.created,
            fixture.modified,
            fixture.description,
        )
        .as_bytes(),
    )
    .unwrap();

    zip.finish().unwrap();
}

fn entry_names(path: &Path) -> Vec<String> {
    let archive = ZipArchive::new(File::open(path).unwrap()).unwrap();
    let mut names: Vec<String> = archive.file_names().map(String::from).collect();
    names.sort();
    names
}

/// Rebuild an archive with one core-properties element overwritten.
fn patch_core_element(path: &Path, tag: &str, value: &str) {
    let mut archive = ZipArchive::new(File::open(path).unwrap()).unwrap();
    let mut entries: Vec<(String, Option<Vec<u8>>)> = Vec::new();
    for i in 0..archive.len() {
        let mut entry = archive.by_index(i).unwrap();
        let name = entry.name().to_string();
        if entry.is_dir() {
            entries.push((name, None));
        } else {
            let mut data = Vec::new();
            entry.read_to_end(&mut data).unwrap();
            entries.push((name, Some(data)));
        }
    }
    drop(archive);

    let file = File::create(path).unwrap();
    let mut zip = ZipWriter::new(file);
    let opts = SimpleFileOptions::default();
    for (name, data) in entries {
        match data {
            None => zip.add_directory(name.trim_end_matches('/'), opts).unwrap(),
            Some(bytes) => {
                zip.start_file(name.as_str(), opts).unwrap();
                if name == "docProps/core.xml" {
                    let xml = String::from_utf8(bytes).unwrap();
                    let patched = imprint_core::ooxml::set_element_text(&xml, tag, value).unwrap();
                    zip.write_all(patched.as_bytes()).unwrap();
                } else {
                    zip.write_all(&bytes).unwrap();
                }
            }
        }
    }
    zip.finish().unwrap();
}

fn inject_fixture(fixture: &DocxFixture<'_>, name: &str) -> (tempfile::TempDir, PathBuf) {
    let dir = tempfile::tempdir().unwrap();
    let src = dir.path().join(name);
    write_docx(&src, fixture);
    let out_dir = dir.path().join("out");
    let dest = inject_document(&src, DocumentKind::WordProcessing, &out_dir).unwrap();
    (dir, dest)
}

#[test]
fn test_inject_then_extract_roundtrip() {
    let (_dir, dest) = inject_fixture(&DocxFixture::default(), "report v2.docx");

    let identity = extract_document(&dest).unwrap();
    assert_eq!(identity.fields.file_name, "report v2.docx");
    assert_eq!(identity.fields.creator, "Alice Smith");
    assert_eq!(identity.fields.created, "2023-01-01T00:00:00Z");
    assert_eq!(identity.fields.modified, "2023-01-02T00:00:00Z");
    assert!(!identity.fields.workplace.is_empty());
    assert!(identity.hash_integrity);
}

#[test]
fn test_injection_is_idempotent() {
    let (dir, first) = inject_fixture(&DocxFixture::default(), "report.docx");

    let second_out = dir.path().join("out2");
    let second = inject_document(&first, DocumentKind::WordProcessing, &second_out).unwrap();

    let a = extract_document(&first).unwrap();
    let b = extract_document(&second).unwrap();
    assert_eq!(a.fields.fuzzy_hash, b.fields.fuzzy_hash);
    assert!(b.hash_integrity);
}

#[test]
fn test_archive_entry_set_is_preserved() {
    let dir = tempfile::tempdir().unwrap();
    let src = dir.path().join("report.docx");
    write_docx(&src, &DocxFixture::default());

    let dest = inject_document(&src, DocumentKind::WordProcessing, &dir.path().join("out")).unwrap();

    assert_eq!(entry_names(&src), entry_names(&dest));
}

#[test]
fn test_unwatermarked_document_has_no_identifier() {
    let dir = tempfile::tempdir().unwrap();
    let src = dir.path().join("plain.docx");
    write_docx(&src, &DocxFixture::default());

    let err = extract_document(&src).unwrap_err();
    assert!(matches!(err, ImprintError::NoIdentifierPresent(_)));
}

#[test]
fn test_garbage_description_is_malformed_not_absent() {
    let dir = tempfile::tempdir().unwrap();
    let src = dir.path().join("odd.docx");
    write_docx(
        &src,
        &DocxFixture {
            description: Some("!!!not wrapped at all!!!"),
            ..DocxFixture::default()
        },
    );

    let err = extract_document(&src).unwrap_err();
    assert!(matches!(err, ImprintError::MalformedIdentifier(_)));

    // Injection falls back to recomputing the fingerprint.
    let dest = inject_document(&src, DocumentKind::WordProcessing, &dir.path().join("out")).unwrap();
    assert!(extract_document(&dest).unwrap().hash_integrity);
}

#[test]
fn test_tampered_keywords_clears_integrity_flag() {
    let (_dir, dest) = inject_fixture(&DocxFixture::default(), "report.docx");
    assert!(extract_document(&dest).unwrap().hash_integrity);

    patch_core_element(&dest, "cp:keywords", "3:zzzz:qqqq");

    let identity = extract_document(&dest).unwrap();
    assert!(!identity.hash_integrity);
}

#[test]
fn test_compare_flags_only_the_modified_timestamp() {
    let base = DocxFixture::default();
    let (_dir_a, a) = inject_fixture(&base, "report.docx");
    let (_dir_b, b) = inject_fixture(
        &DocxFixture {
            modified: "2023-03-04T10:00:00Z",
            ..base
        },
        "report.docx",
    );

    let result = compare(
        &Artifact::from_path(&a).unwrap(),
        &Artifact::from_path(&b).unwrap(),
    )
    .unwrap();

    let mismatched: Vec<&str> = result.mismatches().map(|r| r.field).collect();
    assert_eq!(mismatched, vec!["Last modified time"]);

    let fuzzy = result.row("Fuzzy hash").unwrap();
    assert_eq!(fuzzy.verdict, Verdict::Similarity(100));
}

#[test]
fn test_compare_is_symmetric() {
    let base = DocxFixture::default();
    let (_dir_a, a) = inject_fixture(&base, "report.docx");
    let (_dir_b, b) = inject_fixture(
        &DocxFixture {
            creator: "Bob Jones",
            modified: "2024-05-06T07:08:09Z",
            paragraphs: &["Entirely different prose for the second document."],
            ..base
        },
        "summary.docx",
    );

    let fa = Artifact::from_path(&a).unwrap();
    let fb = Artifact::from_path(&b).unwrap();
    let ab = fa.compare_with(&fb).unwrap();
    let ba = fb.compare_with(&fa).unwrap();

    for (x, y) in ab.rows().iter().zip(ba.rows().iter()) {
        assert_eq!(x.field, y.field);
        assert_eq!(x.verdict, y.verdict, "asymmetric verdict for {}", x.field);
    }
}

#[test]
fn test_cross_category_comparison_fails_fast() {
    let (_dir, doc) = inject_fixture(&DocxFixture::default(), "report.docx");

    let img_dir = tempfile::tempdir().unwrap();
    let img = img_dir.path().join("photo.png");
    image::RgbImage::from_fn(32, 32, |x, y| image::Rgb([x as u8 * 8, y as u8 * 8, 64]))
        .save(&img)
        .unwrap();

    let err = compare(
        &Artifact::from_path(&doc).unwrap(),
        &Artifact::from_path(&img).unwrap(),
    )
    .unwrap_err();
    assert!(matches!(err, ImprintError::IncomparableCategories { .. }));
}

#[test]
fn test_word_fingerprint_ignores_entry_order() {
    // Same parts, different insertion order: the digest must not change.
    let dir = tempfile::tempdir().unwrap();
    let fixture = DocxFixture::default();

    let a = dir.path().join("a.docx");
    write_docx(&a, &fixture);

    let b = dir.path().join("b.docx");
    let file = File::create(&b).unwrap();
    let mut zip = ZipWriter::new(file);
    let opts = SimpleFileOptions::default();
    zip.start_file("docProps/core.xml", opts).unwrap();
    zip.write_all(
        core_xml(fixture.creator, fixture.created, fixture.modified, None).as_bytes(),
    )
    .unwrap();
    zip.start_file("word/document.xml", opts).unwrap();
    zip.write_all(document_xml(fixture.paragraphs).as_bytes())
        .unwrap();
    zip.start_file("_rels/.rels", opts).unwrap();
    zip.write_all(RELS.as_bytes()).unwrap();
    zip.start_file("[Content_Types].xml", opts).unwrap();
    zip.write_all(CONTENT_TYPES.as_bytes()).unwrap();
    zip.finish().unwrap();

    let da = fingerprint_document(&a, DocumentKind::WordProcessing).unwrap();
    let db = fingerprint_document(&b, DocumentKind::WordProcessing).unwrap();
    assert_eq!(da, db);
}

#[test]
fn test_spreadsheet_fingerprint_covers_sheet_data() {
    fn write_xlsx(path: &Path, values: &[u32]) {
        let rows: String = values
            .iter()
            .enumerate()
            .map(|(i, v)| {
                format!(
                    r#"<row r="{r}"><c r="A{r}"><v>{v}</v></c></row>"#,
                    r = i + 1
                )
            })
            .collect();
        let sheet = format!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<worksheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main"><sheetData>{rows}</sheetData></worksheet>"#
        );

        let file = File::create(path).unwrap();
        let mut zip = ZipWriter::new(file);
        let opts = SimpleFileOptions::default();
        zip.start_file("[Content_Types].xml", opts).unwrap();
        zip.write_all(CONTENT_TYPES.as_bytes()).unwrap();
        zip.start_file("docProps/core.xml", opts).unwrap();
        zip.write_all(core_xml("Carol", "2023-01-01T00:00:00Z", "2023-01-01T00:00:00Z", None).as_bytes())
            .unwrap();
        zip.start_file("xl/worksheets/sheet1.xml", opts).unwrap();
        zip.write_all(sheet.as_bytes()).unwrap();
        zip.finish().unwrap();
    }

    let dir = tempfile::tempdir().unwrap();
    let a = dir.path().join("a.xlsx");
    let b = dir.path().join("b.xlsx");
    let c = dir.path().join("c.xlsx");

    let values: Vec<u32> = (0..512).collect();
    let shifted: Vec<u32> = (0..512).map(|v| v * 7 + 3).collect();
    write_xlsx(&a, &values);
    write_xlsx(&b, &values);
    write_xlsx(&c, &shifted);

    let da = fingerprint_document(&a, DocumentKind::Spreadsheet).unwrap();
    let db = fingerprint_document(&b, DocumentKind::Spreadsheet).unwrap();
    let dc = fingerprint_document(&c, DocumentKind::Spreadsheet).unwrap();

    assert_eq!(da, db);
    assert_ne!(da, dc);
}
