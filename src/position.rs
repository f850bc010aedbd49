//! Cursor position → document path.
//!
//! Feeds interactive navigation: every failure mode (unparsable text, a
//! position outside any node) degrades to "no path" (`None`) rather than an
//! error, because a silent no-op beats crashing the editor mid-keystroke.

pub mod jsonc;
pub mod yaml;

use crate::path::Path;

/// A cursor position in document text, 1-based in both axes (editor
/// convention).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CursorPosition {
    pub line: usize,
    pub column: usize,
}

/// Serialization format of the document under the cursor. `Json` covers
/// JSONC: comments and trailing commas are handled by the parser.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFormat {
    Yaml,
    Json,
}

/// Map a cursor position to the path-string of the document node under it.
pub fn path_at_position(
    text: &str,
    position: CursorPosition,
    format: DocumentFormat,
) -> Option<String> {
    let path = match format {
        DocumentFormat::Yaml => yaml::path_at_position(text, position),
        DocumentFormat::Json => jsonc::path_at_position(text, position),
    }?;
    Some(path.to_string())
}

/// 1-based line/column → 0-based character offset: the lengths of every
/// preceding line (each plus one for its newline), plus the column clamped
/// into the current line. Positions past the last line clamp to the end of
/// the text.
pub fn position_to_offset(text: &str, line: usize, column: usize) -> usize {
    let mut offset = 0usize;
    for (index, current) in text.split('\n').enumerate() {
        if index + 1 == line {
            return offset + column.saturating_sub(1).min(current.chars().count());
        }
        offset += current.chars().count() + 1;
    }
    text.chars().count()
}

/// Byte-offset sibling of [`position_to_offset`], for parse trees whose
/// ranges are byte positions.
pub(crate) fn position_to_byte_offset(text: &str, line: usize, column: usize) -> usize {
    let mut offset = 0usize;
    for (index, current) in text.split('\n').enumerate() {
        if index + 1 == line {
            let column = column.saturating_sub(1).min(current.chars().count());
            let within: usize = current.chars().take(column).map(char::len_utf8).sum();
            return offset + within;
        }
        offset += current.len() + 1;
    }
    text.len()
}

// ------------------------------- Tests ------------------------------------ //

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn offsets_sum_preceding_lines() {
        let text = "ab\ncdef\ng\n";
        assert_eq!(position_to_offset(text, 1, 1), 0);
        assert_eq!(position_to_offset(text, 1, 3), 2, "column clamps to line length");
        assert_eq!(position_to_offset(text, 2, 1), 3);
        assert_eq!(position_to_offset(text, 2, 4), 6);
        assert_eq!(position_to_offset(text, 3, 1), 8);
        assert_eq!(position_to_offset(text, 9, 1), text.len(), "line clamps to end");
    }

    #[test]
    fn byte_offsets_count_utf8_widths() {
        let text = "aß\nx";
        // 'ß' is one character, two bytes.
        assert_eq!(position_to_offset(text, 2, 1), 3);
        assert_eq!(position_to_byte_offset(text, 2, 1), 4);
    }

    #[test]
    fn dispatches_by_format_tag() {
        let pos = CursorPosition { line: 1, column: 1 };
        assert_eq!(
            path_at_position("name: test\n", pos, DocumentFormat::Yaml).as_deref(),
            Some("name")
        );
        assert_eq!(
            path_at_position(r#"{"name": "test"}"#, pos, DocumentFormat::Json),
            None,
            "offset 0 sits on the brace, not a member"
        );
        let inside = CursorPosition { line: 1, column: 3 };
        assert_eq!(
            path_at_position(r#"{"name": "test"}"#, inside, DocumentFormat::Json).as_deref(),
            Some("name")
        );
    }

    #[test]
    fn malformed_text_yields_no_path() {
        let pos = CursorPosition { line: 1, column: 2 };
        assert_eq!(path_at_position("{\"a\": ", pos, DocumentFormat::Json), None);
        assert_eq!(path_at_position("key: [1,\n", pos, DocumentFormat::Yaml), None);
    }
}
