//! Backtracking match engine.
//!
//! Every parse attempt runs inside a frame. Frames are kept in an arena
//! indexed by nesting depth so their capture buffers are reused between
//! attempts. A frame that succeeds is merged into its parent (cursor moved
//! to the frame end, captures joined into one); a frame that fails is
//! dropped and the parent is left exactly as it was.
//!
//! Misses are silent. Only obligations registered with
//! [`Matcher::require`] / [`Matcher::require_last`] raise errors.

use std::borrow::Cow;

use regex::Regex;

use crate::cursor::{Cursor, Range};
use crate::error::ParseError;

/// `Ok(None)` is an ordinary miss, `Err` an unmet obligation.
pub type MatchResult<T> = Result<Option<T>, ParseError>;

/// A rule usable as one step of [`Matcher::seq`] or one branch of
/// [`Matcher::alt`].
pub type Branch<'b, 'src, T> = &'b dyn Fn(&mut Matcher<'src>) -> MatchResult<T>;

/// A matched piece of text together with where it came from.
///
/// The text may differ from the source slice when a rule rewrote it
/// (see [`Matcher::rewrite_last`]).
#[derive(Debug, Clone)]
pub struct Capture<'src> {
    pub text: Cow<'src, str>,
    pub range: Range<'src>,
}

#[derive(Debug, Clone)]
struct Obligation<'src> {
    message: String,
    at: Cursor<'src>,
}

impl Obligation<'_> {
    fn into_error(self) -> ParseError {
        ParseError::at(self.message, &self.at)
    }
}

#[derive(Debug)]
struct Frame<'src> {
    cursor: Cursor<'src>,
    range: Range<'src>,
    failed: bool,
    last: bool,
    negate: bool,
    obligation: Option<Obligation<'src>>,
    captures: Vec<Capture<'src>>,
}

impl<'src> Frame<'src> {
    fn new(cursor: Cursor<'src>) -> Self {
        Frame {
            cursor,
            range: Range::empty(cursor),
            failed: false,
            last: false,
            negate: false,
            obligation: None,
            captures: Vec::new(),
        }
    }

    fn reset(&mut self, cursor: Cursor<'src>, failed: bool) {
        self.cursor = cursor;
        self.range = Range::empty(cursor);
        self.failed = failed;
        self.last = false;
        self.negate = false;
        self.obligation = None;
        self.captures.clear();
    }

    fn push(&mut self, capture: Capture<'src>) {
        if self.captures.is_empty() {
            self.range = capture.range;
        } else {
            self.range = self.range.to(&capture.range);
        }
        self.captures.push(capture);
    }

    fn joined(&mut self) -> Capture<'src> {
        let text = match self.captures.len() {
            0 => Cow::Borrowed(""),
            1 => self.captures[0].text.clone(),
            _ => Cow::Owned(self.captures.iter().map(|c| c.text.as_ref()).collect()),
        };
        Capture {
            text,
            range: self.range,
        }
    }
}

/// The engine: a shared cursor threaded through a stack of frames.
///
/// Frame 0 is the root frame; the lexer's driver moves its cursor.
#[derive(Debug)]
pub struct Matcher<'src> {
    source: &'src str,
    frames: Vec<Frame<'src>>,
    depth: usize,
}

impl<'src> Matcher<'src> {
    pub fn new(source: &'src str) -> Self {
        Matcher {
            source,
            frames: vec![Frame::new(Cursor::new(source))],
            depth: 1,
        }
    }

    pub fn source(&self) -> &'src str {
        self.source
    }

    /// Drops every open frame and puts the root cursor back at the start.
    pub fn reset(&mut self) {
        self.depth = 1;
        self.frames[0].reset(Cursor::new(self.source), false);
    }

    /// Number of frames currently open above the root.
    pub fn depth(&self) -> usize {
        self.depth - 1
    }

    pub fn cursor(&self) -> Cursor<'src> {
        self.top().cursor
    }

    /// Resets the innermost frame to `cursor`, dropping its captures.
    /// The lexer's driver uses it on the root frame between tokens.
    pub fn rewind(&mut self, cursor: Cursor<'src>) {
        self.top_mut().reset(cursor, false);
    }

    /// Whether the most recent match in the innermost frame succeeded.
    pub fn last_matched(&self) -> bool {
        self.top().last
    }

    /// Captures of the innermost frame, oldest first.
    pub fn captures(&self) -> &[Capture<'src>] {
        &self.top().captures
    }

    fn top(&self) -> &Frame<'src> {
        &self.frames[self.depth - 1]
    }

    fn top_mut(&mut self) -> &mut Frame<'src> {
        &mut self.frames[self.depth - 1]
    }

    // -----------------------------------------------------------------
    // Primitives
    // -----------------------------------------------------------------

    /// Matches `expected` exactly at the cursor.
    pub fn literal(&mut self, expected: &str) -> MatchResult<Capture<'src>> {
        let found = self.cursor().rest().starts_with(expected);
        self.finish_primitive(found.then_some(expected.len()))
    }

    /// Matches `pattern` at the cursor. Patterns should be `^`-anchored;
    /// a match starting later counts as a miss.
    pub fn regex(&mut self, pattern: &Regex) -> MatchResult<Capture<'src>> {
        let len = pattern
            .find(self.cursor().rest())
            .filter(|m| m.start() == 0)
            .map(|m| m.end());
        self.finish_primitive(len)
    }

    /// Flips the outcome of the next primitive. A success obtained through
    /// negation consumes nothing and captures nothing.
    pub fn negate(&mut self) -> &mut Self {
        if !self.top().failed {
            self.top_mut().negate = true;
        }
        self
    }

    /// The next match (primitive, scope or alternative) must succeed.
    pub fn require(&mut self, message: impl Into<String>) -> &mut Self {
        if !self.top().failed {
            let at = self.cursor();
            self.top_mut().obligation = Some(Obligation {
                message: message.into(),
                at,
            });
        }
        self
    }

    /// The match just evaluated must have succeeded.
    pub fn require_last(&mut self, message: impl Into<String>) -> Result<(), ParseError> {
        let frame = self.top();
        if frame.failed || frame.last {
            return Ok(());
        }
        Err(ParseError::at(message, &frame.cursor))
    }

    /// Replaces the text of the most recent capture of the innermost frame.
    pub fn rewrite_last(&mut self, rewrite: impl FnOnce(&str) -> String) -> Option<Capture<'src>> {
        let capture = self.top_mut().captures.last_mut()?;
        capture.text = Cow::Owned(rewrite(&capture.text));
        Some(capture.clone())
    }

    /// Matches a balanced `open` ... `close` run, tracking nesting depth and
    /// skipping over quoted strings. The capture holds the inner text with
    /// the outer delimiters stripped.
    pub fn delimited(&mut self, open: char, close: char) -> MatchResult<Capture<'src>> {
        if self.top().failed {
            return Ok(None);
        }
        self.top_mut().negate = false;
        let obligation = self.top_mut().obligation.take();

        let mut cursor = self.cursor();
        if cursor.current() != Some(open) {
            return self.miss(obligation);
        }
        cursor.advance();
        let inner_start = cursor;
        let mut depth = 0usize;
        let mut quote = None;
        loop {
            let Some(ch) = cursor.current() else {
                return Err(ParseError::at(
                    format!("Couldn't find block end \"{close}\""),
                    &inner_start,
                ));
            };
            match quote {
                // The escaped char is stepped over with the backslash.
                Some(_) if ch == '\\' => cursor.advance(),
                Some(q) if ch == q => quote = None,
                Some(_) => {}
                None if ch == '"' || ch == '\'' => quote = Some(ch),
                None if ch == open => depth += 1,
                None if ch == close && depth == 0 => break,
                None if ch == close => depth -= 1,
                None => {}
            }
            cursor.advance();
        }
        let inner = Range::new(inner_start, cursor);
        cursor.advance();
        let outer = Range::new(self.cursor(), cursor);

        let capture = Capture {
            text: Cow::Borrowed(inner.as_str()),
            range: inner,
        };
        let frame = self.top_mut();
        frame.last = true;
        frame.push(capture.clone());
        frame.range = frame.range.to(&outer);
        frame.cursor = cursor;
        Ok(Some(capture))
    }

    fn finish_primitive(&mut self, matched_len: Option<usize>) -> MatchResult<Capture<'src>> {
        if self.top().failed {
            return Ok(None);
        }
        let negate = std::mem::take(&mut self.top_mut().negate);
        let obligation = self.top_mut().obligation.take();

        if matched_len.is_some() == negate {
            return self.miss(obligation);
        }

        let frame = self.top_mut();
        frame.last = true;
        let start = frame.cursor;
        let Some(len) = matched_len.filter(|_| !negate) else {
            return Ok(Some(Capture {
                text: Cow::Borrowed(""),
                range: Range::empty(start),
            }));
        };

        let mut end = start;
        while end.position() < start.position() + len {
            end.advance();
        }
        let range = Range::new(start, end);
        let capture = Capture {
            text: Cow::Borrowed(range.as_str()),
            range,
        };
        frame.cursor = end;
        frame.push(capture.clone());
        Ok(Some(capture))
    }

    fn miss<T>(&mut self, obligation: Option<Obligation<'src>>) -> MatchResult<T> {
        self.top_mut().last = false;
        match obligation {
            Some(obligation) => Err(obligation.into_error()),
            None => Ok(None),
        }
    }

    // -----------------------------------------------------------------
    // Frames and combinators
    // -----------------------------------------------------------------

    /// Opens a nested frame at the current cursor, skipping ignorable text.
    /// Frames opened inside a failed frame start out failed.
    pub fn open(&mut self) {
        let parent = self.top();
        let failed = parent.failed;
        let mut cursor = parent.cursor;
        cursor.skip_ignorable();

        if self.depth < self.frames.len() {
            self.frames[self.depth].reset(cursor, failed);
        } else {
            let mut frame = Frame::new(cursor);
            frame.failed = failed;
            self.frames.push(frame);
        }
        self.depth += 1;
    }

    /// Closes the innermost frame.
    ///
    /// On success the parent's cursor moves to the frame end and the
    /// frame's captures, concatenated, become one capture of the parent.
    /// On failure the parent is untouched apart from its last-match flag.
    pub fn close(&mut self, success: bool) -> MatchResult<Capture<'src>> {
        if self.depth <= 1 {
            return Err(ParseError::at(
                "Closing more match frames than were opened",
                &self.cursor(),
            ));
        }
        self.depth -= 1;
        let child = &mut self.frames[self.depth];
        let success = success && !child.failed;
        let joined = success.then(|| child.joined());
        let end = child.cursor;

        let parent = self.top_mut();
        if parent.failed {
            return Ok(None);
        }
        parent.last = success;
        let obligation = parent.obligation.take();
        let Some(joined) = joined else {
            return match obligation {
                Some(obligation) => Err(obligation.into_error()),
                None => Ok(None),
            };
        };
        parent.cursor = end;
        parent.push(joined.clone());
        Ok(Some(joined))
    }

    /// Runs `body` in its own frame. The frame succeeds when `body` returns
    /// a value and no sequence inside it was aborted.
    pub fn scope<T>(
        &mut self,
        body: impl FnOnce(&mut Self) -> MatchResult<T>,
    ) -> MatchResult<(T, Capture<'src>)> {
        if self.top().failed {
            return Ok(None);
        }
        self.open();
        let value = match body(self) {
            Ok(value) => value,
            Err(err) => {
                self.depth -= 1;
                return Err(err);
            }
        };
        let joined = self.close(value.is_some())?;
        Ok(value.zip(joined))
    }

    /// Runs every step in the current frame. The first miss marks the frame
    /// failed, which turns every later match in it into a miss.
    pub fn seq(
        &mut self,
        steps: &[Branch<'_, 'src, Capture<'src>>],
    ) -> MatchResult<Vec<Capture<'src>>> {
        let mut captures = Vec::with_capacity(steps.len());
        for step in steps {
            match step(self)? {
                Some(capture) => captures.push(capture),
                None => {
                    self.top_mut().failed = true;
                    return Ok(None);
                }
            }
        }
        Ok(Some(captures))
    }

    /// Tries each branch in its own frame; the first that succeeds wins.
    pub fn alt<T>(&mut self, branches: &[Branch<'_, 'src, T>]) -> MatchResult<T> {
        if self.top().failed {
            return Ok(None);
        }
        let obligation = self.top_mut().obligation.take();
        for branch in branches {
            if let Some((value, _)) = self.scope(|m| branch(m))? {
                return Ok(Some(value));
            }
        }
        self.miss(obligation)
    }

    /// Repeats a scoped `rule` until it misses or stops consuming input.
    pub fn many<T>(
        &mut self,
        mut rule: impl FnMut(&mut Self) -> MatchResult<T>,
    ) -> Result<Vec<T>, ParseError> {
        let mut items = Vec::new();
        loop {
            let before = self.cursor().position();
            match self.scope(&mut rule)? {
                Some((item, _)) => items.push(item),
                None => break,
            }
            if self.cursor().position() == before {
                break;
            }
        }
        Ok(items)
    }
}
