/// A parse error with human-readable location information.
#[cfg_attr(feature = "serde", derive(::serde::Serialize, ::serde::Deserialize))]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseError {
    pub message: String,
    pub line: usize,
    pub column: usize,
}

impl ParseError {
    /// An error at byte `offset` of `input`.
    pub(crate) fn at(input: &str, offset: usize, message: impl Into<String>) -> Self {
        let (line, column) = offset_to_line_col(input, offset);
        Self {
            message: message.into(),
            line,
            column,
        }
    }
}

impl core::fmt::Display for ParseError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(
            f,
            "parse error at line {}, column {}: {}",
            self.line, self.column, self.message
        )
    }
}

impl std::error::Error for ParseError {}

/// Convert a byte offset into `input` to 1-based (line, column).
pub(crate) fn offset_to_line_col(input: &str, offset: usize) -> (usize, usize) {
    let safe_offset = offset.min(input.len());
    let prefix = &input[..safe_offset];
    let line = prefix.bytes().filter(|&b| b == b'\n').count() + 1;
    let column = prefix
        .rfind('\n')
        .map_or_else(|| prefix.len() + 1, |pos| prefix.len() - pos);
    (line, column)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_offset_to_line_col_first_line() {
        let (line, col) = offset_to_line_col("hello\nworld\n", 0);
        assert_eq!(line, 1);
        assert_eq!(col, 1);
    }

    #[test]
    fn test_offset_to_line_col_second_line() {
        // "hello\n" is 6 bytes; offset 6 is start of second line.
        let (line, col) = offset_to_line_col("hello\nworld\n", 6);
        assert_eq!(line, 2);
        assert_eq!(col, 1);
    }

    #[test]
    fn test_offset_past_end_is_clamped() {
        let (line, col) = offset_to_line_col("ab", 10);
        assert_eq!((line, col), (1, 3));
    }

    #[test]
    fn test_display() {
        let err = ParseError::at("x\ny", 2, "unexpected token");
        assert_eq!(
            err.to_string(),
            "parse error at line 2, column 1: unexpected token"
        );
    }
}
