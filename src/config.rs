//! Per-codec configuration.
//!
//! Every [`ArchiveCodec`](crate::archive::ArchiveCodec) owns one
//! [`CodecOptions`]; two codecs with different ceilings or separators can
//! coexist in one process.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ArchiveError;
use crate::limits::SizeLimit;

/// Format version written into (and required from) the manifest.
pub const FORMAT_VERSION: u32 = 1;
/// Literal written between the manifest and each entry.
pub const DEFAULT_SEPARATOR: &str = "\n---FILE-SEPARATOR---\n";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CodecOptions {
    pub format_version: u32,
    pub separator:      String,
    pub size_limit:     SizeLimit,
}

impl Default for CodecOptions {
    fn default() -> Self {
        Self {
            format_version: FORMAT_VERSION,
            separator:      DEFAULT_SEPARATOR.to_owned(),
            size_limit:     SizeLimit::default(),
        }
    }
}

impl CodecOptions {
    /// Load options from a JSON file; absent fields keep their defaults.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ArchiveError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| {
            ArchiveError::Config(format!("cannot read {}: {e}", path.display()))
        })?;
        let opts: CodecOptions = serde_json::from_str(&text)?;
        opts.validate()?;
        Ok(opts)
    }

    /// The separator must contain a raw newline, which neither compact JSON nor
    /// unwrapped base64 ever emits, plus at least one character that can
    /// never appear in an entry line.
    pub fn validate(&self) -> Result<(), ArchiveError> {
        if !self.separator.contains('\n') {
            return Err(ArchiveError::Config("separator must contain a newline".into()));
        }
        let distinctive = self
            .separator
            .chars()
            .any(|c| c != '\n' && !is_base64_char(c));
        if !distinctive {
            return Err(ArchiveError::Config(
                "separator must contain a character outside the base64 alphabet".into(),
            ));
        }
        let factor = self.size_limit.expansion_factor;
        if !factor.is_finite() || factor < 1.0 {
            return Err(ArchiveError::Config(format!(
                "expansion factor must be >= 1.0, got {factor}"
            )));
        }
        Ok(())
    }
}

fn is_base64_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '+' || c == '/' || c == '='
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let opts = CodecOptions::default();
        assert_eq!(opts.format_version, 1);
        assert_eq!(opts.separator, "\n---FILE-SEPARATOR---\n");
        opts.validate().unwrap();
    }

    #[test]
    fn rejects_unsafe_separators() {
        for sep in ["---SEP---", "\n", "\nABC=\n", ""] {
            let opts = CodecOptions { separator: sep.to_owned(), ..Default::default() };
            assert!(matches!(opts.validate(), Err(ArchiveError::Config(_))), "{sep:?}");
        }
    }

    #[test]
    fn rejects_shrinking_expansion_factor() {
        let mut opts = CodecOptions::default();
        opts.size_limit.expansion_factor = 0.5;
        assert!(opts.validate().is_err());
        opts.size_limit.expansion_factor = f64::NAN;
        assert!(opts.validate().is_err());
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let opts: CodecOptions =
            serde_json::from_str(r#"{"size_limit":{"max_archive_size":1024}}"#).unwrap();
        assert_eq!(opts.size_limit.max_archive_size, 1024);
        assert_eq!(opts.size_limit.expansion_factor, 1.4);
        assert_eq!(opts.separator, DEFAULT_SEPARATOR);
    }
}
