//! Error types for XAR parsing and archived-range reads.

use std::io;

use thiserror::Error;

/// Coarse classification of a [`XarError`].
///
/// Lets callers branch on what went wrong without matching every variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// The fixed header is unreadable, truncated or carries unknown values.
    MalformedHeader,
    /// The table of contents could not be decompressed or decoded.
    TocCorruption,
    /// A byte range could not be read from the underlying source.
    ReadRange,
    /// The caller asked for something the entry cannot provide.
    ContractViolation,
}

/// The error type for all operations in this crate.
#[derive(Debug, Error)]
pub enum XarError {
    /// The leading magic marker is not `xar!`.
    #[error("Not a XAR archive: bad magic {0:02x?}")]
    BadMagic([u8; 4]),

    /// A fixed header field is unreadable or out of range.
    #[error("Malformed XAR header: {0}")]
    MalformedHeader(String),

    /// The header names a checksum algorithm this reader does not know.
    #[error("Unknown checksum algorithm: {0}")]
    UnknownChecksumAlgorithm(u32),

    /// The compressed table of contents is not a valid zlib stream.
    #[error("Table of contents decompression failed: {0}")]
    Decompress(#[source] io::Error),

    /// The inflated table of contents does not have the declared length.
    #[error("Table of contents length mismatch: expected {expected} bytes, found {actual}")]
    TocLengthMismatch { expected: u64, actual: u64 },

    /// The table of contents is not well-formed or does not match the schema.
    #[error("Invalid table of contents XML: {0}")]
    TocXml(String),

    /// An entry declares a `type` other than `file` or `directory`.
    #[error("Entry {id} has unknown type {kind:?}")]
    UnknownEntryType { id: String, kind: String },

    /// A numeric field does not parse as a decimal integer.
    #[error("Entry {id}: invalid number {value:?} in <{field}>")]
    InvalidNumber {
        id: String,
        field: &'static str,
        value: String,
    },

    /// A timestamp field is not a valid RFC 3339 date-time.
    #[error("Entry {id}: invalid timestamp {value:?} in <{field}>")]
    InvalidTimestamp {
        id: String,
        field: &'static str,
        value: String,
    },

    /// A byte range could not be read from the source.
    #[error("Failed to read {len} bytes at offset {offset}: {source}")]
    Read {
        offset: u64,
        len: u64,
        #[source]
        source: io::Error,
    },

    /// The source itself could not be opened.
    #[error("Failed to open source: {0}")]
    Source(String),

    /// Archived bytes were requested for an entry that has no payload.
    #[error("Entry {id} ({name}) is a directory and has no archived data")]
    NoPayload { id: String, name: String },
}

impl XarError {
    /// Which part of the taxonomy this error belongs to.
    pub fn category(&self) -> ErrorCategory {
        match self {
            XarError::BadMagic(_)
            | XarError::MalformedHeader(_)
            | XarError::UnknownChecksumAlgorithm(_) => ErrorCategory::MalformedHeader,
            XarError::Decompress(_)
            | XarError::TocLengthMismatch { .. }
            | XarError::TocXml(_)
            | XarError::UnknownEntryType { .. }
            | XarError::InvalidNumber { .. }
            | XarError::InvalidTimestamp { .. } => ErrorCategory::TocCorruption,
            XarError::Read { .. } | XarError::Source(_) => ErrorCategory::ReadRange,
            XarError::NoPayload { .. } => ErrorCategory::ContractViolation,
        }
    }

    pub(crate) fn read(offset: u64, len: u64, source: io::Error) -> Self {
        XarError::Read {
            offset,
            len,
            source,
        }
    }
}

/// A convenience `Result` alias using [`XarError`].
pub type Result<T> = std::result::Result<T, XarError>;
