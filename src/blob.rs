//! Input sources and reconstructed files.

use std::io;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// MIME type recorded for blobs that do not declare one.
pub const DEFAULT_MIME_TYPE: &str = "application/octet-stream";

/// One named blob to be packed.
///
/// Metadata is available up front so the size ceiling can be checked before
/// any bytes are read. `read_bytes` may suspend; the codec awaits sources one
/// at a time in input order.
#[async_trait]
pub trait BlobSource: Send + Sync {
    fn name(&self) -> &str;
    /// Declared length, used for the size-limit check.
    fn byte_length(&self) -> u64;
    fn mime_type(&self) -> Option<&str> {
        None
    }
    /// Epoch milliseconds.
    fn last_modified(&self) -> Option<i64> {
        None
    }
    async fn read_bytes(&self) -> io::Result<Vec<u8>>;
}

#[async_trait]
impl<'a, T: BlobSource + ?Sized> BlobSource for &'a T {
    fn name(&self) -> &str { (**self).name() }
    fn byte_length(&self) -> u64 { (**self).byte_length() }
    fn mime_type(&self) -> Option<&str> { (**self).mime_type() }
    fn last_modified(&self) -> Option<i64> { (**self).last_modified() }
    async fn read_bytes(&self) -> io::Result<Vec<u8>> {
        (**self).read_bytes().await
    }
}

#[async_trait]
impl<T: BlobSource + ?Sized> BlobSource for Box<T> {
    fn name(&self) -> &str { (**self).name() }
    fn byte_length(&self) -> u64 { (**self).byte_length() }
    fn mime_type(&self) -> Option<&str> { (**self).mime_type() }
    fn last_modified(&self) -> Option<i64> { (**self).last_modified() }
    async fn read_bytes(&self) -> io::Result<Vec<u8>> {
        (**self).read_bytes().await
    }
}

pub(crate) fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}

// ── MemoryBlob ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemoryBlob {
    pub name:          String,
    pub data:          Vec<u8>,
    pub mime_type:     Option<String>,
    pub last_modified: Option<i64>,
}

impl MemoryBlob {
    pub fn new(name: impl Into<String>, data: impl Into<Vec<u8>>) -> Self {
        Self {
            name:          name.into(),
            data:          data.into(),
            mime_type:     None,
            last_modified: None,
        }
    }

    pub fn with_mime_type(mut self, mime_type: impl Into<String>) -> Self {
        self.mime_type = Some(mime_type.into());
        self
    }

    pub fn with_last_modified(mut self, millis: i64) -> Self {
        self.last_modified = Some(millis);
        self
    }
}

#[async_trait]
impl BlobSource for MemoryBlob {
    fn name(&self) -> &str { &self.name }
    fn byte_length(&self) -> u64 { self.data.len() as u64 }
    fn mime_type(&self) -> Option<&str> { self.mime_type.as_deref() }
    fn last_modified(&self) -> Option<i64> { self.last_modified }

    async fn read_bytes(&self) -> io::Result<Vec<u8>> {
        Ok(self.data.clone())
    }
}

// ── FileBlob ──────────────────────────────────────────────────────────────────

/// A file on disk. Metadata is captured at `open`; content is read on demand.
///
/// `read_bytes` uses blocking `std::fs::read`. It suits
/// [`pack_blocking`](crate::archive::ArchiveCodec::pack_blocking); inside an
/// async runtime, wrap the read in the runtime's blocking-task facility or
/// supply a `BlobSource` backed by async file I/O.
#[derive(Debug, Clone)]
pub struct FileBlob {
    path:          PathBuf,
    name:          String,
    len:           u64,
    mime_type:     &'static str,
    last_modified: Option<i64>,
}

impl FileBlob {
    pub fn open<P: AsRef<Path>>(path: P) -> io::Result<Self> {
        let path = path.as_ref().to_owned();
        let meta = std::fs::metadata(&path)?;
        if !meta.is_file() {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("not a regular file: {}", path.display()),
            ));
        }
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        let last_modified = meta
            .modified()
            .ok()
            .map(|t| DateTime::<Utc>::from(t).timestamp_millis());
        Ok(Self {
            mime_type: guess_mime_type(&path),
            path,
            name,
            len: meta.len(),
            last_modified,
        })
    }

    pub fn path(&self) -> &Path { &self.path }
}

#[async_trait]
impl BlobSource for FileBlob {
    fn name(&self) -> &str { &self.name }
    fn byte_length(&self) -> u64 { self.len }
    fn mime_type(&self) -> Option<&str> { Some(self.mime_type) }
    fn last_modified(&self) -> Option<i64> { self.last_modified }

    async fn read_bytes(&self) -> io::Result<Vec<u8>> {
        std::fs::read(&self.path)
    }
}

/// Extension-based MIME lookup for the common cases.
pub fn guess_mime_type(path: &Path) -> &'static str {
    let ext = match path.extension().and_then(|e| e.to_str()) {
        Some(e) => e.to_ascii_lowercase(),
        None    => return DEFAULT_MIME_TYPE,
    };
    match ext.as_str() {
        "txt" | "log"   => "text/plain",
        "md"            => "text/markdown",
        "csv"           => "text/csv",
        "html" | "htm"  => "text/html",
        "css"           => "text/css",
        "js" | "mjs"    => "text/javascript",
        "json"          => "application/json",
        "xml"           => "application/xml",
        "pdf"           => "application/pdf",
        "zip"           => "application/zip",
        "gz"            => "application/gzip",
        "wasm"          => "application/wasm",
        "png"           => "image/png",
        "jpg" | "jpeg"  => "image/jpeg",
        "gif"           => "image/gif",
        "webp"          => "image/webp",
        "svg"           => "image/svg+xml",
        "mp3"           => "audio/mpeg",
        "wav"           => "audio/wav",
        "mp4"           => "video/mp4",
        "webm"          => "video/webm",
        _               => DEFAULT_MIME_TYPE,
    }
}

// ── UnpackedFile ──────────────────────────────────────────────────────────────

/// A file recovered by [`ArchiveCodec::unpack`](crate::archive::ArchiveCodec::unpack).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnpackedFile {
    pub name:           String,
    pub byte_length:    u64,
    pub mime_type:      String,
    pub last_modified:  i64,
    pub bytes:          Vec<u8>,
    /// `index` as stored in the entry header; not re-checked against position.
    pub original_index: usize,
}
