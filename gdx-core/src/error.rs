use thiserror::Error;

use crate::cursor::Cursor;

/// The single error kind raised by the transpiler core.
///
/// Line and column are 1-based. A raised error aborts the whole transform
/// of the current input.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Parse error at line {line} column {column}: {message}")]
pub struct ParseError {
    pub message: String,
    pub line: usize,
    pub column: usize,
}

impl ParseError {
    pub fn new(message: impl Into<String>, line: usize, column: usize) -> Self {
        ParseError {
            message: message.into(),
            line,
            column,
        }
    }

    /// Builds an error located at a cursor snapshot.
    pub fn at(message: impl Into<String>, cursor: &Cursor<'_>) -> Self {
        ParseError::new(message, cursor.line() + 1, cursor.column() + 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn displays_one_based_position() {
        let source = "a\n  b";
        let cursor = Cursor::at(source, 4);
        let err = ParseError::at("Expected value", &cursor);
        assert_eq!(err.line, 2);
        assert_eq!(err.column, 3);
        assert_eq!(
            err.to_string(),
            "Parse error at line 2 column 3: Expected value"
        );
    }
}
