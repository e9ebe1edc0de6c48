//! Identifier codec: reversible packing of the document provenance fields
//! into a single opaque text blob, plus the transport wrapping that makes the
//! blob safe inside an XML text node or a filename.
//!
//! # Packed layout
//!
//! Fields are joined with single spaces in a fixed order:
//!
//! ```text
//! <file name> <creator> <workplace> <created> <modified> <fuzzy hash>
//! ```
//!
//! The file name and the creator may themselves contain spaces. On decode the
//! file name is bounded by the first token ending in a recognized document
//! extension, the last four tokens are positional, and everything in between
//! belongs to the creator. Round-tripping is exact for any field set that
//! honors the single-token invariant on workplace, timestamps and hash.

use base64::engine::general_purpose::{STANDARD, URL_SAFE_NO_PAD};
use base64::Engine as _;
use serde::{Deserialize, Serialize};

use crate::category::has_document_extension;
use crate::error::{ImprintError, Result};
use crate::fingerprint::FuzzyDigest;

/// Sentinel stored when a core-properties field is absent at injection time.
/// The comparator never treats two sentinels as matching.
pub const NOT_FOUND: &str = "information_not_found";

/// The ordered provenance fields embedded into a container document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentIdentifier {
    /// Original file name, extension included. May contain spaces.
    pub file_name: String,
    /// Author recorded in the document's core properties. May contain spaces.
    pub creator: String,
    /// Host name of the machine that performed the injection. Single token.
    pub workplace: String,
    /// Creation timestamp from core properties. Single token.
    pub created: String,
    /// Last-modified timestamp from core properties. Single token.
    pub modified: String,
    /// Fuzzy digest of the document's valuable textual payload.
    pub fuzzy_hash: FuzzyDigest,
}

impl DocumentIdentifier {
    /// Pack the fields into the space-joined wire string.
    ///
    /// Fails with `MalformedIdentifier` when a single-token field contains
    /// whitespace or the creator is empty; that is a caller bug, not a data
    /// problem, and encoding such a set could never round-trip.
    pub fn encode(&self) -> Result<String> {
        for (name, value) in [
            ("workplace", self.workplace.as_str()),
            ("created", self.created.as_str()),
            ("modified", self.modified.as_str()),
            ("fuzzy hash", self.fuzzy_hash.as_str()),
        ] {
            if value.is_empty() || value.contains(char::is_whitespace) {
                return Err(ImprintError::MalformedIdentifier(format!(
                    "field `{name}` must be a single non-empty token, got {value:?}"
                )));
            }
        }
        // Decode expects at least one creator token between the file name
        // and the trailing four; an empty creator cannot round-trip.
        if self.creator.split_whitespace().next().is_none() {
            return Err(ImprintError::MalformedIdentifier(
                "field `creator` must contain at least one token".into(),
            ));
        }
        if !has_document_extension(&self.file_name) {
            return Err(ImprintError::MalformedIdentifier(format!(
                "file name {:?} does not end in a recognized document extension",
                self.file_name
            )));
        }

        Ok(format!(
            "{} {} {} {} {} {}",
            self.file_name,
            self.creator,
            self.workplace,
            self.created,
            self.modified,
            self.fuzzy_hash.as_str()
        ))
    }

    /// Unpack a wire string produced by [`encode`](Self::encode).
    pub fn decode(packed: &str) -> Result<Self> {
        let tokens: Vec<&str> = packed.split_whitespace().collect();

        let boundary = tokens
            .iter()
            .position(|t| has_document_extension(t))
            .ok_or_else(|| {
                ImprintError::MalformedIdentifier(
                    "no token ends in a recognized document extension".into(),
                )
            })?;

        // workplace, created, modified, fuzzy hash, and at least one
        // creator token must follow the file name.
        if tokens.len() - (boundary + 1) < 5 {
            return Err(ImprintError::MalformedIdentifier(format!(
                "expected at least 5 tokens after the file name, found {}",
                tokens.len() - (boundary + 1)
            )));
        }

        let n = tokens.len();
        Ok(Self {
            file_name: tokens[..=boundary].join(" "),
            creator: tokens[boundary + 1..n - 4].join(" "),
            workplace: tokens[n - 4].to_string(),
            created: tokens[n - 3].to_string(),
            modified: tokens[n - 2].to_string(),
            fuzzy_hash: FuzzyDigest::parse(tokens[n - 1])?,
        })
    }

    /// Pack and wrap for the document metadata channel in one step.
    pub fn encode_wrapped(&self) -> Result<String> {
        Ok(wrap(&self.encode()?))
    }

    /// Unwrap and unpack a document metadata channel value in one step.
    pub fn decode_wrapped(wrapped: &str) -> Result<Self> {
        Self::decode(&unwrap(wrapped)?)
    }
}

/// Wrap a packed identifier for the XML text-node channel (standard base64).
pub fn wrap(text: &str) -> String {
    STANDARD.encode(text.as_bytes())
}

/// Reverse [`wrap`]. A wrapping-layer failure is reported distinctly from a
/// field-splitting failure so callers can tell "garbage in the slot" apart
/// from "fields out of shape".
pub fn unwrap(wrapped: &str) -> Result<String> {
    let bytes = STANDARD.decode(wrapped.trim()).map_err(|e| {
        ImprintError::MalformedIdentifier(format!("transport wrapping is not valid base64: {e}"))
    })?;
    String::from_utf8(bytes).map_err(|e| {
        ImprintError::MalformedIdentifier(format!("transport wrapping is not valid UTF-8: {e}"))
    })
}

/// Wrap an original file name for the filename channel. The URL-safe
/// alphabet is used because `/` from the standard alphabet cannot appear in
/// a file name.
pub fn wrap_filename(name: &str) -> String {
    URL_SAFE_NO_PAD.encode(name.as_bytes())
}

/// Reverse [`wrap_filename`].
pub fn unwrap_filename(wrapped: &str) -> Result<String> {
    let bytes = URL_SAFE_NO_PAD.decode(wrapped).map_err(|e| {
        ImprintError::MalformedIdentifier(format!(
            "filename wrapping is not valid url-safe base64: {e}"
        ))
    })?;
    String::from_utf8(bytes).map_err(|e| {
        ImprintError::MalformedIdentifier(format!("filename wrapping is not valid UTF-8: {e}"))
    })
}
