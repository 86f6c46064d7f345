use serde::{Deserialize, Serialize};

use crate::error::FormatError;

/// Per-file record. Written once inside the manifest and again as the header
/// line of the file's own entry.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct FileEntry {
    pub index:         usize,
    pub name:          String,
    pub size:          u64,
    #[serde(rename = "type")]
    pub mime_type:     String,
    #[serde(rename = "lastModified")]
    pub last_modified: i64,
    /// Offset of this entry's header within the entries region. Informational;
    /// readers scan sequentially.
    #[serde(rename = "dataOffset")]
    pub data_offset:   u64,
}

impl FileEntry {
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Manifest {
    pub version:    u32,
    #[serde(rename = "fileCount")]
    pub file_count: usize,
    pub files:      Vec<FileEntry>,
    /// Epoch milliseconds.
    #[serde(rename = "createdAt")]
    pub created_at: i64,
}

impl Manifest {
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Parse and gate on `supported_version`.
    ///
    /// The version is probed before the full structure so that a manifest
    /// from a newer writer reports `UnsupportedVersion` even if its shape
    /// changed.
    pub fn parse(text: &str, supported_version: u32) -> Result<Self, FormatError> {
        let mut value: serde_json::Value = serde_json::from_str(text)
            .map_err(|e| FormatError::malformed(format!("manifest is not JSON: {e}")))?;
        check_version(&value, supported_version)?;
        // `1.0` passes the gate but would not deserialize into an integer.
        if let Some(v) = value.get_mut("version") {
            *v = supported_version.into();
        }
        let manifest: Manifest = serde_json::from_value(value)
            .map_err(|e| FormatError::malformed(format!("invalid manifest: {e}")))?;
        manifest.check()?;
        Ok(manifest)
    }

    pub fn check(&self) -> Result<(), FormatError> {
        if self.file_count == 0 {
            return Err(FormatError::malformed("manifest declares zero files"));
        }
        if self.files.len() != self.file_count {
            return Err(FormatError::malformed(format!(
                "manifest declares {} files but lists {}",
                self.file_count,
                self.files.len()
            )));
        }
        Ok(())
    }

    pub fn total_size(&self) -> u64 {
        self.files.iter().map(|f| f.size).sum()
    }

    pub fn summary(&self) -> ManifestSummary {
        ManifestSummary {
            format_version: self.version,
            file_count:     self.file_count,
            created_at:     self.created_at,
            files:          self.files.iter().map(FileSummary::from).collect(),
            total_size:     self.total_size(),
        }
    }
}

/// Numeric comparison, so `1` and `1.0` are the same version. The version
/// as written is kept in the error.
pub(crate) fn check_version(value: &serde_json::Value, supported: u32) -> Result<(), FormatError> {
    let found = match value.get("version") {
        Some(serde_json::Value::Number(n)) => n,
        _ => return Err(FormatError::malformed("manifest has no numeric version")),
    };
    if found.as_f64() != Some(f64::from(supported)) {
        return Err(FormatError::UnsupportedVersion { found: found.clone() });
    }
    Ok(())
}

// ── Summaries ────────────────────────────────────────────────────────────────

/// Manifest view returned by [`ArchiveCodec::describe`](crate::archive::ArchiveCodec::describe).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ManifestSummary {
    pub format_version: u32,
    pub file_count:     usize,
    pub created_at:     i64,
    pub files:          Vec<FileSummary>,
    pub total_size:     u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileSummary {
    pub name:          String,
    pub size:          u64,
    pub mime_type:     String,
    pub last_modified: i64,
}

impl From<&FileEntry> for FileSummary {
    fn from(e: &FileEntry) -> Self {
        FileSummary {
            name:          e.name.clone(),
            size:          e.size,
            mime_type:     e.mime_type.clone(),
            last_modified: e.last_modified,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(index: usize, size: u64) -> FileEntry {
        FileEntry {
            index,
            name: format!("f{index}"),
            size,
            mime_type: "text/plain".into(),
            last_modified: 1_700_000_000_000,
            data_offset: 0,
        }
    }

    #[test]
    fn entry_uses_wire_field_names() {
        let json = entry(0, 3).to_json().unwrap();
        assert_eq!(
            json,
            r#"{"index":0,"name":"f0","size":3,"type":"text/plain","lastModified":1700000000000,"dataOffset":0}"#
        );
    }

    #[test]
    fn parse_gates_version_before_shape() {
        let err = Manifest::parse(r#"{"version":2,"something":"else"}"#, 1).unwrap_err();
        assert!(matches!(err, FormatError::UnsupportedVersion { ref found } if found.as_u64() == Some(2)));
    }

    #[test]
    fn version_compares_numerically() {
        let m = Manifest { version: 1, file_count: 1, files: vec![entry(0, 1)], created_at: 0 };
        let text = m.to_json().unwrap().replacen(r#""version":1,"#, r#""version":1.0,"#, 1);
        assert_eq!(Manifest::parse(&text, 1).unwrap().version, 1);

        let err = Manifest::parse(r#"{"version":2.5}"#, 1).unwrap_err();
        match err {
            FormatError::UnsupportedVersion { found } => assert_eq!(found.to_string(), "2.5"),
            other => panic!("expected UnsupportedVersion, got {other:?}"),
        }
        let err = Manifest::parse(r#"{"version":4294967296}"#, 1).unwrap_err();
        assert!(matches!(err, FormatError::UnsupportedVersion { ref found } if found.as_u64() == Some(4_294_967_296)));
    }

    #[test]
    fn parse_rejects_count_mismatch_and_empty() {
        let m = Manifest { version: 1, file_count: 2, files: vec![entry(0, 1)], created_at: 0 };
        let err = Manifest::parse(&m.to_json().unwrap(), 1).unwrap_err();
        assert!(matches!(err, FormatError::MalformedArchive { .. }));

        let m = Manifest { version: 1, file_count: 0, files: vec![], created_at: 0 };
        let err = Manifest::parse(&m.to_json().unwrap(), 1).unwrap_err();
        assert!(matches!(err, FormatError::MalformedArchive { .. }));
    }

    #[test]
    fn summary_sums_sizes() {
        let m = Manifest {
            version:    1,
            file_count: 2,
            files:      vec![entry(0, 3), entry(1, 7)],
            created_at: 42,
        };
        let s = m.summary();
        assert_eq!(s.total_size, 10);
        assert_eq!(s.files[1].name, "f1");
        assert_eq!(s.created_at, 42);
    }
}
