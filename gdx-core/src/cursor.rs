//! Position tracking over an immutable source buffer.
//!
//! A [`Cursor`] is a cheap `Copy` snapshot: backtracking is done by keeping
//! an old snapshot around, never by stepping backwards.

/// Position, line, column and indentation of a point in the source.
///
/// `position` is a byte offset that always sits on a char boundary.
/// `line` and `column` are 0-based, columns count chars.
#[derive(Debug, Clone, Copy)]
pub struct Cursor<'src> {
    source: &'src str,
    position: usize,
    line: usize,
    column: usize,
    line_start: usize,
    indent: usize,
    indenting: bool,
}

impl<'src> Cursor<'src> {
    pub fn new(source: &'src str) -> Self {
        let mut cursor = Cursor {
            source,
            position: 0,
            line: 0,
            column: 0,
            line_start: 0,
            indent: 0,
            indenting: true,
        };
        cursor.enter_current();
        cursor
    }

    /// A cursor re-derived from the start of `source` up to `position`.
    pub fn at(source: &'src str, position: usize) -> Self {
        let mut cursor = Cursor::new(source);
        cursor.move_to(position);
        cursor
    }

    pub fn source(&self) -> &'src str {
        self.source
    }

    pub fn position(&self) -> usize {
        self.position
    }

    pub fn line(&self) -> usize {
        self.line
    }

    pub fn column(&self) -> usize {
        self.column
    }

    /// Number of leading space/tab chars of the current line seen so far.
    pub fn indent(&self) -> usize {
        self.indent
    }

    pub fn is_eof(&self) -> bool {
        self.position >= self.source.len()
    }

    pub fn current(&self) -> Option<char> {
        self.rest().chars().next()
    }

    /// The unconsumed remainder of the source.
    pub fn rest(&self) -> &'src str {
        &self.source[self.position..]
    }

    /// Leading whitespace text of the current line.
    pub fn indentation(&self) -> &'src str {
        &self.source[self.line_start..self.line_start + self.indent]
    }

    /// Moves one char forward. Does nothing at end of input.
    pub fn advance(&mut self) {
        let Some(ch) = self.current() else {
            return;
        };
        self.position += ch.len_utf8();
        if ch == '\n' {
            self.line += 1;
            self.column = 0;
            self.line_start = self.position;
        } else {
            self.column += 1;
        }
        self.enter_current();
    }

    pub fn advance_by(&mut self, chars: usize) {
        for _ in 0..chars {
            self.advance();
        }
    }

    /// Resets to the start of the source and replays [`advance`](Self::advance)
    /// until `position` is reached. Positions past the end stop at end of input.
    pub fn move_to(&mut self, position: usize) {
        *self = Cursor::new(self.source);
        self.advance_to(position);
    }

    /// Moves forward until `position` is reached; never moves backwards.
    pub fn advance_to(&mut self, position: usize) {
        while self.position < position && !self.is_eof() {
            self.advance();
        }
    }

    /// Skips spaces, tabs, line breaks and `#` comments.
    pub fn skip_ignorable(&mut self) {
        loop {
            while matches!(self.current(), Some(' ' | '\t' | '\n' | '\r')) {
                self.advance();
            }
            if self.current() != Some('#') {
                break;
            }
            while !matches!(self.current(), None | Some('\n')) {
                self.advance();
            }
        }
    }

    /// Updates indent tracking for the char the cursor now sits on.
    fn enter_current(&mut self) {
        match self.current() {
            Some('\n') => {
                self.indent = 0;
                self.indenting = true;
            }
            Some(' ' | '\t') if self.indenting => self.indent += 1,
            _ => self.indenting = false,
        }
    }
}

/// A half-open span between two cursor snapshots.
#[derive(Debug, Clone, Copy)]
pub struct Range<'src> {
    pub start: Cursor<'src>,
    pub end: Cursor<'src>,
}

impl<'src> Range<'src> {
    pub fn new(start: Cursor<'src>, end: Cursor<'src>) -> Self {
        debug_assert!(end.position >= start.position, "range end before start");
        Range { start, end }
    }

    /// An empty range located at `at`.
    pub fn empty(at: Cursor<'src>) -> Self {
        Range { start: at, end: at }
    }

    pub fn as_str(&self) -> &'src str {
        &self.start.source[self.start.position..self.end.position]
    }

    pub fn len(&self) -> usize {
        self.end.position - self.start.position
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The smallest range covering both `self` and `other`.
    pub fn to(&self, other: &Range<'src>) -> Self {
        let start = if other.start.position < self.start.position {
            other.start
        } else {
            self.start
        };
        let end = if other.end.position > self.end.position {
            other.end
        } else {
            self.end
        };
        Range { start, end }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tracks_lines_and_columns() {
        let mut cursor = Cursor::new("ab\ncd");
        cursor.advance_by(3);
        assert_eq!(cursor.position(), 3);
        assert_eq!(cursor.line(), 1);
        assert_eq!(cursor.column(), 0);
        assert_eq!(cursor.current(), Some('c'));
    }

    #[test]
    fn counts_leading_indentation_only() {
        let source = "x\n\t  y z";
        let mut cursor = Cursor::new(source);
        cursor.advance_by(5);
        assert_eq!(cursor.current(), Some('y'));
        assert_eq!(cursor.indent(), 3);
        assert_eq!(cursor.indentation(), "\t  ");
        cursor.advance_by(2);
        assert_eq!(cursor.current(), Some('z'));
        assert_eq!(cursor.indent(), 3);
    }

    #[test]
    fn indentation_at_start_of_input() {
        let mut cursor = Cursor::new("  x");
        cursor.advance_by(2);
        assert_eq!(cursor.indentation(), "  ");
    }

    #[test]
    fn line_break_resets_indent() {
        let mut cursor = Cursor::new("  a\nb");
        cursor.advance_by(3);
        assert_eq!(cursor.current(), Some('\n'));
        assert_eq!(cursor.indent(), 0);
        cursor.advance();
        assert_eq!(cursor.indent(), 0);
        assert_eq!(cursor.line(), 1);
    }

    #[test]
    fn move_to_rederives_state() {
        let source = "one\n    two\nthree";
        let mut walked = Cursor::new(source);
        walked.advance_by(8);
        let mut moved = Cursor::new(source);
        moved.advance_by(14);
        moved.move_to(8);
        assert_eq!(moved.position(), walked.position());
        assert_eq!(moved.line(), walked.line());
        assert_eq!(moved.column(), walked.column());
        assert_eq!(moved.indentation(), "    ");
    }

    #[test]
    fn move_to_clamps_at_end() {
        let cursor = Cursor::at("abc", 99);
        assert!(cursor.is_eof());
        assert_eq!(cursor.position(), 3);
    }

    #[test]
    fn skips_whitespace_and_comments() {
        let mut cursor = Cursor::new("  # note\n\t# more\n  value");
        cursor.skip_ignorable();
        assert!(cursor.rest().starts_with("value"));
        assert_eq!(cursor.line(), 2);
    }

    #[test]
    fn skip_stops_at_eof_inside_comment() {
        let mut cursor = Cursor::new("# trailing");
        cursor.skip_ignorable();
        assert!(cursor.is_eof());
    }

    #[test]
    fn advances_over_multibyte_chars() {
        let mut cursor = Cursor::new("é<");
        cursor.advance();
        assert_eq!(cursor.position(), 2);
        assert_eq!(cursor.column(), 1);
        assert_eq!(cursor.current(), Some('<'));
    }

    #[test]
    fn range_slices_source() {
        let source = "let value = 1";
        let start = Cursor::at(source, 4);
        let end = Cursor::at(source, 9);
        let range = Range::new(start, end);
        assert_eq!(range.as_str(), "value");
        assert_eq!(range.len(), 5);
    }
}
