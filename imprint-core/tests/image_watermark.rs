//! End-to-end tests for image injection and comparison. The watermark lives
//! entirely in the output filename; pixels are never touched.

use std::fs;
use std::path::{Path, PathBuf};

use imprint_core::{
    compare, extract_image, inject_image, Artifact, ImprintError, PerceptualHashSet, Verdict,
};

fn write_png(path: &Path) {
    image::RgbImage::from_fn(64, 64, |x, y| {
        image::Rgb([(x * 4) as u8, (y * 4) as u8, ((x + y) * 2) as u8])
    })
    .save(path)
    .unwrap();
}

fn inject_fixture(name: &str) -> (tempfile::TempDir, PathBuf, PathBuf) {
    let dir = tempfile::tempdir().unwrap();
    let src = dir.path().join(name);
    write_png(&src);
    let dest = inject_image(&src, &dir.path().join("out")).unwrap();
    (dir, src, dest)
}

#[test]
fn test_filename_carries_five_segments_and_extension() {
    let (_dir, _src, dest) = inject_fixture("holiday photo.png");

    let stem = dest.file_stem().unwrap().to_str().unwrap();
    assert_eq!(stem.rsplitn(5, '_').count(), 5);
    assert_eq!(dest.extension().unwrap(), "png");
}

#[test]
fn test_extract_recovers_name_and_hashes() {
    let (_dir, src, dest) = inject_fixture("holiday photo.png");

    let expected = PerceptualHashSet::compute(&image::open(&src).unwrap()).unwrap();
    let identity = extract_image(&dest).unwrap();

    assert_eq!(identity.file_name, "holiday photo.png");
    assert_eq!(identity.hashes, expected);
}

#[test]
fn test_image_bytes_are_untouched() {
    let (_dir, src, dest) = inject_fixture("photo.png");
    assert_eq!(fs::read(&src).unwrap(), fs::read(&dest).unwrap());
}

#[test]
fn test_reinjection_replaces_existing_target() {
    let dir = tempfile::tempdir().unwrap();
    let src = dir.path().join("photo.png");
    write_png(&src);

    let out = dir.path().join("out");
    let first = inject_image(&src, &out).unwrap();
    let second = inject_image(&src, &out).unwrap();
    assert_eq!(first, second);
    assert!(second.exists());
}

#[test]
fn test_identical_pixels_compare_at_full_similarity() {
    let dir = tempfile::tempdir().unwrap();
    let a_src = dir.path().join("cat.png");
    let b_src = dir.path().join("cat copy.png");
    write_png(&a_src);
    write_png(&b_src);

    let out = dir.path().join("out");
    let a = inject_image(&a_src, &out).unwrap();
    let b = inject_image(&b_src, &out).unwrap();

    let result = compare(
        &Artifact::from_path(&a).unwrap(),
        &Artifact::from_path(&b).unwrap(),
    )
    .unwrap();

    let order: Vec<&str> = result.rows().iter().map(|r| r.field).collect();
    assert_eq!(
        order,
        vec![
            "Filename",
            "Average hash",
            "Difference hash",
            "Perceptual hash",
            "HSV color hash",
        ]
    );

    // Different original names, identical pixels.
    assert_eq!(result.rows()[0].verdict, Verdict::Mismatch);
    for row in &result.rows()[1..] {
        assert_eq!(row.verdict, Verdict::Similarity(100), "row {}", row.field);
    }
}

#[test]
fn test_unwatermarked_image_is_malformed() {
    let dir = tempfile::tempdir().unwrap();
    let src = dir.path().join("plain.png");
    write_png(&src);

    let err = extract_image(&src).unwrap_err();
    assert!(matches!(err, ImprintError::MalformedIdentifier(_)));
}

#[test]
fn test_missing_image_source_is_not_found() {
    let out = tempfile::tempdir().unwrap();
    let err = inject_image(Path::new("/nonexistent/photo.png"), out.path()).unwrap_err();
    assert!(matches!(err, ImprintError::NotFound(_)));
}
