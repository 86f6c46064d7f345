pub mod config;
pub mod limits;
pub mod error;
pub mod blob;
pub mod manifest;
pub mod entry;
pub mod archive;

pub use archive::{ArchiveCodec, DisplayMeta, PackedArchive};
pub use blob::{BlobSource, FileBlob, MemoryBlob, UnpackedFile};
pub use config::CodecOptions;
pub use error::{ArchiveError, FormatError};
pub use manifest::{FileEntry, Manifest, ManifestSummary};
