//! In-place replacement of source spans.
//!
//! Spans always refer to the original source. Each edit shifts everything
//! after it by the difference in length; that running offset is applied to
//! every later span, so edits must arrive left to right.

use crate::cursor::Range;

#[derive(Debug)]
pub struct Rewriter {
    output: String,
    offset: isize,
    /// Original end of the last replaced span.
    watermark: usize,
}

impl Rewriter {
    pub fn new(source: &str) -> Self {
        Rewriter {
            output: source.to_owned(),
            offset: 0,
            watermark: 0,
        }
    }

    /// Replaces `range` (in original coordinates) with `replacement`.
    pub fn replace(&mut self, range: &Range<'_>, replacement: &str) {
        debug_assert!(
            range.start.position() >= self.watermark,
            "rewrites must not overlap or go backwards"
        );
        let start = range.start.position().saturating_add_signed(self.offset);
        let end = range.end.position().saturating_add_signed(self.offset);
        self.output.replace_range(start..end, replacement);
        self.offset += replacement.len() as isize - range.len() as isize;
        self.watermark = range.end.position();
    }

    #[cfg(test)]
    fn offset(&self) -> isize {
        self.offset
    }

    pub fn finish(self) -> String {
        self.output
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cursor::Cursor;

    fn span(source: &str, start: usize, end: usize) -> Range<'_> {
        Range::new(Cursor::at(source, start), Cursor::at(source, end))
    }

    #[test]
    fn later_spans_use_original_positions() {
        let source = "a <X/> b <Y/> c";
        let mut rewriter = Rewriter::new(source);
        rewriter.replace(&span(source, 2, 6), "longer(X)");
        assert_eq!(rewriter.offset(), 5);
        rewriter.replace(&span(source, 9, 13), "Y");
        assert_eq!(rewriter.offset(), 2);
        assert_eq!(rewriter.finish(), "a longer(X) b Y c");
    }

    #[test]
    fn shrinking_edits_shift_left() {
        let source = "[long] [x]";
        let mut rewriter = Rewriter::new(source);
        rewriter.replace(&span(source, 0, 6), "s");
        assert_eq!(rewriter.offset(), -5);
        rewriter.replace(&span(source, 7, 10), "yy");
        assert_eq!(rewriter.finish(), "s yy");
    }

    #[test]
    fn no_edits_returns_source() {
        assert_eq!(Rewriter::new("untouched\n").finish(), "untouched\n");
    }
}
