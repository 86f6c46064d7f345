//! Per-file entry framing: `<header-json> "\n" <base64 payload>`.
//!
//! Standard base64 never wraps lines and compact JSON escapes control
//! characters, so the first newline in an entry is always the header/payload
//! boundary.

use crate::error::FormatError;
use crate::manifest::FileEntry;

pub fn encode_payload(data: &[u8]) -> String {
    base64::encode_config(data, base64::STANDARD)
}

pub fn decode_payload(index: usize, text: &str) -> Result<Vec<u8>, FormatError> {
    base64::decode_config(text, base64::STANDARD)
        .map_err(|source| FormatError::InvalidEncoding { index, source })
}

/// Append one framed entry to `out`.
pub fn encode_entry(out: &mut String, entry: &FileEntry, data: &[u8]) -> Result<(), serde_json::Error> {
    out.push_str(&entry.to_json()?);
    out.push('\n');
    out.push_str(&encode_payload(data));
    Ok(())
}

/// Split an entry into its header and payload without decoding the payload.
pub fn split_entry(index: usize, part: &str) -> Result<(FileEntry, &str), FormatError> {
    let (header, payload) = part.split_once('\n').ok_or_else(|| FormatError::MalformedFileEntry {
        index,
        reason: "missing header/payload line break".into(),
    })?;
    let entry = FileEntry::from_json(header).map_err(|e| FormatError::MalformedFileEntry {
        index,
        reason: format!("invalid header: {e}"),
    })?;
    Ok((entry, payload))
}

/// Parse the `index`-th entry and decode its payload.
///
/// `index` is the scan position and is only used for error reporting; the
/// header's own `index` is returned untouched.
pub fn decode_entry(index: usize, part: &str) -> Result<(FileEntry, Vec<u8>), FormatError> {
    let (entry, payload) = split_entry(index, part)?;
    let data = decode_payload(index, payload)?;
    if data.len() as u64 != entry.size {
        return Err(FormatError::MalformedFileEntry {
            index,
            reason: format!("header declares {} bytes, payload holds {}", entry.size, data.len()),
        });
    }
    tracing::debug!(index, name = %entry.name, size = entry.size, "decoded entry");
    Ok((entry, data))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn header(size: u64) -> FileEntry {
        FileEntry {
            index:         0,
            name:          "a\nb.txt".into(),
            size,
            mime_type:     "text/plain".into(),
            last_modified: 0,
            data_offset:   0,
        }
    }

    #[test]
    fn newline_in_name_stays_in_header() {
        let mut out = String::new();
        encode_entry(&mut out, &header(3), b"ABC").unwrap();
        assert_eq!(out.matches('\n').count(), 1);
        let (entry, data) = decode_entry(0, &out).unwrap();
        assert_eq!(entry.name, "a\nb.txt");
        assert_eq!(data, b"ABC");
    }

    #[test]
    fn empty_payload_decodes() {
        let mut out = String::new();
        encode_entry(&mut out, &header(0), b"").unwrap();
        assert!(out.ends_with('\n'));
        let (_, data) = decode_entry(0, &out).unwrap();
        assert!(data.is_empty());
    }

    #[test]
    fn missing_newline_is_malformed() {
        let err = decode_entry(4, r#"{"index":4}"#).unwrap_err();
        assert!(matches!(err, FormatError::MalformedFileEntry { index: 4, .. }));
    }

    #[test]
    fn bad_header_is_malformed() {
        let err = decode_entry(1, "not json\nQUJD").unwrap_err();
        assert!(matches!(err, FormatError::MalformedFileEntry { index: 1, .. }));
    }

    #[test]
    fn bad_alphabet_is_invalid_encoding() {
        let mut out = String::new();
        encode_entry(&mut out, &header(3), b"ABC").unwrap();
        let corrupted = out.replace("QUJD", "QU*D");
        let err = decode_entry(2, &corrupted).unwrap_err();
        assert!(matches!(err, FormatError::InvalidEncoding { index: 2, .. }));
    }

    #[test]
    fn size_mismatch_is_malformed() {
        let mut out = String::new();
        encode_entry(&mut out, &header(5), b"ABC").unwrap();
        let err = decode_entry(0, &out).unwrap_err();
        assert!(matches!(err, FormatError::MalformedFileEntry { index: 0, .. }));
    }
}
