//! Fixed symbol vocabulary for mapping class ids to text.

use crate::core::errors::{OcrError, OcrResult};
use std::path::Path;

/// The ordered vocabulary of symbols the model can predict, indexed by
/// class id.
///
/// Index 0 is the reserved blank class and is never emitted. Entries are
/// usually single characters but may be multi-codepoint strings. Once loaded
/// the charset is immutable and can be shared freely across decode calls.
#[derive(Debug, Clone)]
pub struct Charset {
    characters: Vec<String>,
}

impl Charset {
    /// Creates a charset from an in-memory character list.
    ///
    /// The list must include the blank entry at index 0.
    pub fn from_characters(characters: Vec<String>) -> Self {
        Self { characters }
    }

    /// Parses a charset from a JSON array of strings.
    pub fn from_json_str(json: &str) -> OcrResult<Self> {
        Self::from_json_bytes(json.as_bytes(), "<inline>")
    }

    /// Parses a charset from raw JSON bytes read from `path`.
    ///
    /// The path is used for diagnostics only. An empty array fails: a
    /// zero-length charset can never decode anything, which always means the
    /// wrong asset was shipped.
    pub fn from_json_bytes(bytes: &[u8], path: impl AsRef<Path>) -> OcrResult<Self> {
        let characters: Vec<String> = serde_json::from_slice(bytes).map_err(|e| {
            OcrError::charset_load(
                path.as_ref(),
                "charset must be a JSON array of strings",
                Some(e),
            )
        })?;
        if characters.is_empty() {
            return Err(OcrError::charset_load(
                path.as_ref(),
                "charset is empty",
                None,
            ));
        }
        Ok(Self { characters })
    }

    /// Reads and parses a charset file.
    pub fn from_json_file(path: impl AsRef<Path>) -> OcrResult<Self> {
        let bytes = std::fs::read(path.as_ref())?;
        Self::from_json_bytes(&bytes, path)
    }

    /// Number of entries, including the blank at index 0.
    pub fn len(&self) -> usize {
        self.characters.len()
    }

    /// Whether the charset has no entries.
    pub fn is_empty(&self) -> bool {
        self.characters.is_empty()
    }

    /// Returns the symbol for a class id, if it is in range.
    pub fn get(&self, id: usize) -> Option<&str> {
        self.characters.get(id).map(String::as_str)
    }

    /// Maps a class-id sequence to text.
    ///
    /// Blank (0) and out-of-range ids are skipped; symbols are concatenated
    /// in sequence order with no separators. An empty result is a valid
    /// outcome for a blank image, not an error.
    pub fn decode(&self, ids: &[usize]) -> String {
        let mut text = String::new();
        for &id in ids {
            if id == 0 || id >= self.characters.len() {
                continue;
            }
            text.push_str(&self.characters[id]);
        }
        text
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn sample() -> Charset {
        Charset::from_json_str(r#"["<blank>", "a", "b", "c"]"#).unwrap()
    }

    #[test]
    fn decodes_in_sequence_order() {
        assert_eq!(sample().decode(&[3, 1, 2]), "cab");
    }

    #[test]
    fn skips_blank_and_out_of_range_ids() {
        assert_eq!(sample().decode(&[0, 1, 0, 99, 2, 0]), "ab");
    }

    #[test]
    fn empty_and_all_blank_sequences_decode_to_empty_string() {
        assert_eq!(sample().decode(&[]), "");
        assert_eq!(sample().decode(&[0; 30]), "");
    }

    #[test]
    fn same_sequence_always_decodes_to_same_string() {
        let ids = vec![1, 2, 3, 2, 1];
        assert_eq!(sample().decode(&ids), sample().decode(&ids));
    }

    #[test]
    fn supports_multi_codepoint_entries() {
        let charset =
            Charset::from_characters(vec!["".into(), "A".into(), "文".into(), "e\u{301}".into()]);
        assert_eq!(charset.decode(&[2, 3, 1]), "文e\u{301}A");
    }

    #[test]
    fn rejects_non_array_json() {
        assert!(matches!(
            Charset::from_json_str(r#"{"not": "an array"}"#),
            Err(OcrError::CharsetLoad { .. })
        ));
    }

    #[test]
    fn rejects_empty_array() {
        assert!(matches!(
            Charset::from_json_str("[]"),
            Err(OcrError::CharsetLoad { .. })
        ));
    }

    #[test]
    fn loads_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, r#"["<blank>", "x", "y"]"#).unwrap();

        let charset = Charset::from_json_file(file.path()).unwrap();
        assert_eq!(charset.len(), 3);
        assert_eq!(charset.get(1), Some("x"));
        assert_eq!(charset.get(0), Some("<blank>"));
        assert_eq!(charset.get(3), None);
    }
}
