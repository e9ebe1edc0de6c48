use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ImprintError {
    #[error("unsupported file extension for {}: expected one of {expected}", .path.display())]
    InvalidExtension { path: PathBuf, expected: String },

    #[error("file not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("output path {} exists and is not a directory", .0.display())]
    InvalidOutput(PathBuf),

    #[error("no identifier present in {}", .0.display())]
    NoIdentifierPresent(PathBuf),

    #[error("malformed identifier: {0}")]
    MalformedIdentifier(String),

    #[error("cannot compare a {left} against a {right}")]
    IncomparableCategories {
        left: &'static str,
        right: &'static str,
    },

    #[error("injection failed for {}: {reason}", .path.display())]
    InjectionFailed { path: PathBuf, reason: String },

    #[error("fuzzy hashing error: {0}")]
    FuzzyHash(String),

    #[error("image error: {0}")]
    Image(String),

    #[error("archive error: {0}")]
    Archive(#[from] zip::result::ZipError),

    #[error("XML error: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("XML synthesis error: {0}")]
    XmlSynthesis(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, ImprintError>;
