//! Exit codes following sysexits.h conventions.
//!
//! These codes give scripts and CI systems semantic failure modes instead of
//! a blanket non-zero status.

use imprint_core::ImprintError;

/// General error (catch-all).
pub const GENERAL_ERROR: i32 = 1;

/// Data format error (malformed or missing identifier, incomparable files).
/// Maps to EX_DATAERR from sysexits.h.
pub const DATA_ERROR: i32 = 65;

/// Cannot open an input file.
/// Maps to EX_NOINPUT from sysexits.h.
pub const INPUT_ERROR: i32 = 66;

/// I/O error (cannot write the watermarked output).
/// Maps to EX_IOERR from sysexits.h.
pub const IO_ERROR: i32 = 74;

/// Map an error chain to an exit code, preferring the typed core error when
/// one is present in the chain.
pub fn classify(err: &anyhow::Error) -> i32 {
    if let Some(core) = err.downcast_ref::<ImprintError>() {
        return match core {
            ImprintError::NotFound(_) => INPUT_ERROR,
            ImprintError::InvalidExtension { .. }
            | ImprintError::NoIdentifierPresent(_)
            | ImprintError::MalformedIdentifier(_)
            | ImprintError::IncomparableCategories { .. } => DATA_ERROR,
            ImprintError::InvalidOutput(_)
            | ImprintError::InjectionFailed { .. }
            | ImprintError::Io(_) => IO_ERROR,
            _ => GENERAL_ERROR,
        };
    }

    let message = format!("{err:#}");
    if message.contains("does not exist") || message.contains("not found") {
        INPUT_ERROR
    } else if message.contains("Failed to write") || message.contains("Failed to append") {
        IO_ERROR
    } else {
        GENERAL_ERROR
    }
}
