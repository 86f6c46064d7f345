use std::io;
use thiserror::Error;

/// Root causes raised while reading archive text.
///
/// These never escape the public API on their own: [`ArchiveCodec::unpack`]
/// wraps them in [`ArchiveError::ExtractionFailed`] and
/// [`ArchiveCodec::describe`] in [`ArchiveError::DescribeFailed`].
///
/// [`ArchiveCodec::unpack`]: crate::archive::ArchiveCodec::unpack
/// [`ArchiveCodec::describe`]: crate::archive::ArchiveCodec::describe
#[derive(Error, Debug)]
pub enum FormatError {
    #[error("Malformed archive: {reason}")]
    MalformedArchive { reason: String },
    #[error("Unsupported archive version: {found}")]
    UnsupportedVersion { found: serde_json::Number },
    #[error("Archive truncated: entry {missing_index} is missing")]
    TruncatedArchive { missing_index: usize },
    #[error("Malformed file entry {index}: {reason}")]
    MalformedFileEntry { index: usize, reason: String },
    #[error("Invalid base64 payload in entry {index}: {source}")]
    InvalidEncoding {
        index:  usize,
        #[source]
        source: base64::DecodeError,
    },
}

impl FormatError {
    pub(crate) fn malformed(reason: impl Into<String>) -> Self {
        FormatError::MalformedArchive { reason: reason.into() }
    }
}

#[derive(Error, Debug)]
pub enum ArchiveError {
    #[error("At least one file is required")]
    EmptyInput,
    #[error("Archive too large: {actual_size} bytes of input exceeds the {limit} byte ceiling")]
    ArchiveTooLarge { actual_size: u64, limit: u64 },
    #[error("Failed to read file {index} ({name}): {source}")]
    Read {
        index:  usize,
        name:   String,
        #[source]
        source: io::Error,
    },
    #[error("Serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error("Invalid codec configuration: {0}")]
    Config(String),
    #[error("Extraction failed: {0}")]
    ExtractionFailed(#[source] FormatError),
    #[error("Failed to read archive manifest: {0}")]
    DescribeFailed(#[source] FormatError),
}

impl ArchiveError {
    /// The format-level root cause, if this error came from reading an archive.
    pub fn cause(&self) -> Option<&FormatError> {
        match self {
            ArchiveError::ExtractionFailed(e) | ArchiveError::DescribeFailed(e) => Some(e),
            _ => None,
        }
    }
}
