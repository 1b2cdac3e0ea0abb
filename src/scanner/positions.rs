//! Position conversion utilities.
//!
//! Scanning works on byte offsets. Diagnostics want a line and a column, so this module
//! converts between the two at the point an error is reported.

/// Position in a script (byte offset plus its 0-indexed line and character column)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Position {
    pub byte: usize,
    pub line: usize,
    pub col: usize,
}

impl Position {
    /// Resolve a byte offset into a position.
    ///
    /// Offsets past the end are clamped to the script length; offsets inside a multi-byte
    /// character are moved back to the character start.
    pub fn from_offset(source: &str, byte_offset: usize) -> Self {
        let mut byte = byte_offset.min(source.len());
        while !source.is_char_boundary(byte) {
            byte -= 1;
        }

        let before = &source[..byte];
        let line = before.matches('\n').count();
        let line_start = before.rfind('\n').map_or(0, |i| i + 1);
        let col = source[line_start..byte].chars().count();

        Self { byte, line, col }
    }
}

/// Return the full text of the given 0-indexed line, without its line terminator.
pub fn line_text(source: &str, line: usize) -> Option<&str> {
    source.lines().nth(line)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_line() {
        let pos = Position::from_offset("hello world", 6);
        assert_eq!(pos, Position { byte: 6, line: 0, col: 6 });
    }

    #[test]
    fn test_later_line() {
        let source = "a\nbc\ndef";
        let pos = Position::from_offset(source, 6);
        assert_eq!(pos.line, 2);
        assert_eq!(pos.col, 1);
        assert_eq!(line_text(source, pos.line), Some("def"));
    }

    #[test]
    fn test_multibyte() {
        let source = "café {";
        // é is 2 bytes but 1 character
        let pos = Position::from_offset(source, 6);
        assert_eq!(pos.col, 5);
    }

    #[test]
    fn test_inside_multibyte_char() {
        let source = "é";
        assert_eq!(Position::from_offset(source, 1).byte, 0);
    }

    #[test]
    fn test_out_of_bounds() {
        let pos = Position::from_offset("hello", 100);
        assert_eq!(pos.byte, 5); // clamped to length
        assert_eq!(pos.col, 5);
    }
}
