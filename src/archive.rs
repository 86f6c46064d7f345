//! High-level [`ArchiveCodec`] API, the primary embedding surface.
//!
//! ```no_run
//! use blobpack::archive::ArchiveCodec;
//! use blobpack::blob::MemoryBlob;
//!
//! let codec = ArchiveCodec::default();
//!
//! // Pack
//! let packed = codec.pack_blocking(&[MemoryBlob::new("readme.txt", "Hello, world!")])?;
//!
//! // Unpack
//! let files = codec.unpack(&packed.bytes)?;
//! assert_eq!(files[0].bytes, b"Hello, world!");
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! # Layout
//! ```text
//! <manifest-json> SEP <entry-0> SEP <entry-1> ... SEP <entry-(n-1)>
//! entry-i := <file-entry-json> "\n" <base64(payload-i)>
//! ```

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::blob::{now_millis, BlobSource, UnpackedFile, DEFAULT_MIME_TYPE};
use crate::config::CodecOptions;
use crate::entry::{decode_entry, encode_entry};
use crate::error::{ArchiveError, FormatError};
use crate::manifest::{check_version, FileEntry, Manifest, ManifestSummary};

/// MIME type reported for produced archives.
pub const ARCHIVE_MIME_TYPE: &str = "application/x-blobpack";
/// File extension used for suggested archive names.
pub const ARCHIVE_EXTENSION: &str = "bpk";

// ── Output records ───────────────────────────────────────────────────────────

/// Display metadata for a freshly packed archive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DisplayMeta {
    pub suggested_filename: String,
    pub mime_type:          String,
    /// Epoch milliseconds; equals the manifest's `createdAt`.
    pub timestamp:          i64,
    pub file_count:         usize,
    /// Sum of the actual payload sizes.
    pub total_size:         u64,
    pub file_names:         Vec<String>,
}

#[derive(Debug, Clone)]
pub struct PackedArchive {
    pub bytes: Vec<u8>,
    pub meta:  DisplayMeta,
}

// ── ArchiveCodec ─────────────────────────────────────────────────────────────

/// Packs blobs into a single text container and reads them back.
///
/// All state lives in the call; a codec can be shared freely.
#[derive(Debug, Clone, Default)]
pub struct ArchiveCodec {
    opts: CodecOptions,
}

impl ArchiveCodec {
    pub fn new(opts: CodecOptions) -> Result<Self, ArchiveError> {
        opts.validate()?;
        Ok(Self { opts })
    }

    pub fn options(&self) -> &CodecOptions {
        &self.opts
    }

    // ── Pack ─────────────────────────────────────────────────────────────────

    /// Build an archive from `blobs`, in order.
    ///
    /// Emptiness and the projected size are checked before any source is
    /// read. Sources are then awaited strictly one after another.
    pub async fn pack<B: BlobSource>(&self, blobs: &[B]) -> Result<PackedArchive, ArchiveError> {
        if blobs.is_empty() {
            return Err(ArchiveError::EmptyInput);
        }
        let declared = blobs
            .iter()
            .fold(0u64, |acc, b| acc.saturating_add(b.byte_length()));
        self.opts.size_limit.check(declared)?;
        tracing::debug!(files = blobs.len(), declared, projected = self.opts.size_limit.projected(declared), "size check passed");

        let sep = self.opts.separator.as_str();
        let mut files = Vec::with_capacity(blobs.len());
        let mut entries = String::new();
        let mut total_size = 0u64;

        for (index, blob) in blobs.iter().enumerate() {
            let data = blob.read_bytes().await.map_err(|source| ArchiveError::Read {
                index,
                name: blob.name().to_owned(),
                source,
            })?;
            if data.len() as u64 != blob.byte_length() {
                tracing::warn!(
                    index,
                    name = blob.name(),
                    declared = blob.byte_length(),
                    actual = data.len(),
                    "blob length differs from declared length; recording actual"
                );
            }

            if index > 0 {
                entries.push_str(sep);
            }
            let entry = FileEntry {
                index,
                name:          blob.name().to_owned(),
                size:          data.len() as u64,
                mime_type:     blob
                    .mime_type()
                    .filter(|m| !m.is_empty())
                    .unwrap_or(DEFAULT_MIME_TYPE)
                    .to_owned(),
                last_modified: blob.last_modified().unwrap_or_else(now_millis),
                data_offset:   entries.len() as u64,
            };
            encode_entry(&mut entries, &entry, &data)?;
            tracing::debug!(index, name = %entry.name, size = entry.size, offset = entry.data_offset, "packed entry");

            total_size += entry.size;
            files.push(entry);
        }

        let created_at = now_millis();
        let manifest = Manifest {
            version:    self.opts.format_version,
            file_count: files.len(),
            files,
            created_at,
        };
        let manifest_text = manifest.to_json()?;

        let mut text = String::with_capacity(manifest_text.len() + sep.len() + entries.len());
        text.push_str(&manifest_text);
        text.push_str(sep);
        text.push_str(&entries);

        let meta = DisplayMeta {
            suggested_filename: suggested_filename(created_at),
            mime_type:          ARCHIVE_MIME_TYPE.to_owned(),
            timestamp:          created_at,
            file_count:         manifest.file_count,
            total_size,
            file_names:         manifest.files.into_iter().map(|f| f.name).collect(),
        };
        tracing::debug!(files = meta.file_count, total_size, archive_size = text.len(), "packed archive");

        Ok(PackedArchive { bytes: text.into_bytes(), meta })
    }

    /// [`pack`](Self::pack) driven to completion on the current thread.
    pub fn pack_blocking<B: BlobSource>(&self, blobs: &[B]) -> Result<PackedArchive, ArchiveError> {
        futures::executor::block_on(self.pack(blobs))
    }

    // ── Unpack ───────────────────────────────────────────────────────────────

    /// Recover every file, in archive order. Any failure discards all
    /// already-decoded files.
    pub fn unpack(&self, bytes: &[u8]) -> Result<Vec<UnpackedFile>, ArchiveError> {
        self.unpack_inner(bytes).map_err(ArchiveError::ExtractionFailed)
    }

    fn unpack_inner(&self, bytes: &[u8]) -> Result<Vec<UnpackedFile>, FormatError> {
        let text = String::from_utf8_lossy(bytes);
        let parts = self.split_parts(&text)?;
        let manifest = Manifest::parse(parts[0], self.opts.format_version)?;

        let entries = &parts[1..];
        if entries.len() > manifest.file_count {
            tracing::warn!(
                declared = manifest.file_count,
                found = entries.len(),
                "ignoring entries beyond the manifest's file count"
            );
        }

        let mut out = Vec::with_capacity(manifest.file_count);
        for i in 0..manifest.file_count {
            let part = entries
                .get(i)
                .ok_or(FormatError::TruncatedArchive { missing_index: i })?;
            let (entry, data) = decode_entry(i, part)?;
            out.push(into_unpacked(entry, data));
        }
        Ok(out)
    }

    /// Scan sequentially to the `index`-th entry and decode only that one.
    pub fn read_file(&self, bytes: &[u8], index: usize) -> Result<UnpackedFile, ArchiveError> {
        self.read_file_inner(bytes, index).map_err(ArchiveError::ExtractionFailed)
    }

    fn read_file_inner(&self, bytes: &[u8], index: usize) -> Result<UnpackedFile, FormatError> {
        let text = String::from_utf8_lossy(bytes);
        let parts = self.split_parts(&text)?;
        let manifest = Manifest::parse(parts[0], self.opts.format_version)?;
        if index >= manifest.file_count {
            return Err(FormatError::TruncatedArchive { missing_index: index });
        }
        let part = parts
            .get(index + 1)
            .ok_or(FormatError::TruncatedArchive { missing_index: index })?;
        let (entry, data) = decode_entry(index, part)?;
        Ok(into_unpacked(entry, data))
    }

    // ── Probing ──────────────────────────────────────────────────────────────

    /// Cheap structural check. Never fails; anything unexpected is `false`.
    ///
    /// Entries and payloads are not inspected.
    pub fn sniff(&self, bytes: &[u8]) -> bool {
        let text = String::from_utf8_lossy(bytes);
        let mut parts = text.split(self.opts.separator.as_str());
        let (head, rest) = (parts.next(), parts.next());
        let head = match (head, rest) {
            (Some(head), Some(_)) => head,
            _ => return false,
        };
        let value: serde_json::Value = match serde_json::from_str(head) {
            Ok(v) => v,
            Err(_) => return false,
        };
        let version_ok = check_version(&value, self.opts.format_version).is_ok();
        let count_ok = value
            .get("fileCount")
            .map_or(false, |c| c.is_u64() || c.is_i64());
        let files_ok = value.get("files").map_or(false, serde_json::Value::is_array);
        version_ok && count_ok && files_ok
    }

    /// Read the manifest without touching any payload.
    pub fn describe(&self, bytes: &[u8]) -> Result<ManifestSummary, ArchiveError> {
        self.describe_inner(bytes).map_err(ArchiveError::DescribeFailed)
    }

    fn describe_inner(&self, bytes: &[u8]) -> Result<ManifestSummary, FormatError> {
        let text = String::from_utf8_lossy(bytes);
        let parts = self.split_parts(&text)?;
        let manifest = Manifest::parse(parts[0], self.opts.format_version)?;
        Ok(manifest.summary())
    }

    // ── helpers ──────────────────────────────────────────────────────────────

    /// Split archive text into `[manifest, entry-0, ...]`. One trailing
    /// separator is tolerated, so the result may hold only the manifest.
    fn split_parts<'a>(&self, text: &'a str) -> Result<Vec<&'a str>, FormatError> {
        let mut parts: Vec<&str> = text.split(self.opts.separator.as_str()).collect();
        if parts.len() < 2 {
            return Err(FormatError::malformed("no separator after manifest"));
        }
        if parts.last().map_or(false, |p| p.is_empty()) {
            parts.pop();
        }
        Ok(parts)
    }
}

fn into_unpacked(entry: FileEntry, bytes: Vec<u8>) -> UnpackedFile {
    UnpackedFile {
        name:           entry.name,
        byte_length:    entry.size,
        mime_type:      entry.mime_type,
        last_modified:  entry.last_modified,
        bytes,
        original_index: entry.index,
    }
}

fn suggested_filename(created_at: i64) -> String {
    let stamp = DateTime::<Utc>::from_timestamp_millis(created_at)
        .unwrap_or_else(Utc::now)
        .format("%Y%m%d-%H%M%S");
    format!("archive-{stamp}.{ARCHIVE_EXTENSION}")
}
