/*!
Error types for the dump decoders and the prefix lookups.
*/
use std::io;
use thiserror::Error;

use crate::models::{AfiParseError, AsnParseError, Prefix, PrefixParseError};

/// Errors from the decoders in [`crate::parser`].
#[derive(Debug, Error)]
pub enum ParserError {
    /// A general IO error triggered by the underlying reader.
    #[error(transparent)]
    Io(#[from] io::Error),
    /// Transport or decompression failure while opening a local or
    /// remote dump.
    #[error(transparent)]
    Remote(#[from] oneio::OneIoError),
    #[error(transparent)]
    Csv(#[from] csv::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    InvalidPrefix(#[from] PrefixParseError),
    #[error(transparent)]
    InvalidAsn(#[from] AsnParseError),
    #[error(transparent)]
    UnknownAfi(#[from] AfiParseError),
    #[error("invalid date value {0}")]
    InvalidDate(String),
    #[error("invalid numeric value {0}")]
    InvalidNumber(String),
    #[error("record too short: missing {0} column")]
    MissingColumn(&'static str),
}

/// Errors from the lookup structures in [`crate::lookup`].
#[derive(Debug, Error)]
pub enum LookupError {
    /// Exact-match lookup on a key with no binding. Absence is normally
    /// a value; this is the must-exist variant for callers that need to
    /// distinguish "no record at all" from "covered by a broader one".
    #[error("no entry stored at {prefix}")]
    NotFound { prefix: Prefix },
    /// A builder invariant was broken by its input. Construction aborts
    /// instead of silently mis-merging.
    #[error("grouping contract violated: {0}")]
    ContractViolation(String),
}
