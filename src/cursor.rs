use crate::{Col, Line, Location, Offset};

/// A read position over a borrowed source text.
///
/// The cursor tracks line and column alongside the byte index, and carries a
/// save stack for backtracking: every speculative `test` brackets its work in
/// [`Cursor::save`] / [`Cursor::restore`]. Saves must nest strictly (LIFO);
/// restoring with no matching save is a programming error, not a parse error.
#[derive(Debug, Clone)]
pub struct Cursor<'s> {
    text: &'s str,
    index: Offset,
    line: Line,
    column: Col,
    saves: Vec<(Offset, Line, Col)>,
    watermark: Option<Offset>,
}

impl<'s> Cursor<'s> {
    pub fn new(text: &'s str) -> Cursor<'s> {
        Cursor {
            text,
            index: 0,
            line: 0,
            column: 0,
            saves: Vec::new(),
            watermark: None,
        }
    }

    pub fn index(&self) -> Offset {
        self.index
    }

    pub fn location(&self) -> Location {
        Location {
            line: self.line,
            column: self.column,
        }
    }

    /// The unconsumed remainder of the text.
    pub fn remaining(&self) -> &'s str {
        &self.text[self.index..]
    }

    pub fn at_end(&self) -> bool {
        self.index == self.text.len()
    }

    /// The character `offset` characters past the cursor, if there is one.
    pub fn peek(&self, offset: usize) -> Option<char> {
        self.remaining().chars().nth(offset)
    }

    /// Like [`Cursor::peek`], but a past-the-end offset clamps to the last
    /// remaining character. Only `None` at end-of-input.
    pub fn peek_clamped(&self, offset: usize) -> Option<char> {
        self.remaining()
            .chars()
            .nth(offset)
            .or_else(|| self.remaining().chars().next_back())
    }

    /// Get the substring between two byte offsets.
    pub fn slice(&self, range: (Offset, Offset)) -> &'s str {
        &self.text[range.0..range.1]
    }

    /// Consume `len` bytes, updating line and column across any embedded
    /// newlines. Returns the consumed text.
    ///
    /// # Panics
    ///
    /// Panics if `len` overruns the text or splits a character; callers
    /// always advance by the length of a pattern match.
    pub fn advance(&mut self, len: usize) -> &'s str {
        let consumed = &self.text[self.index..self.index + len];
        for ch in consumed.chars() {
            if ch == '\n' {
                self.line += 1;
                self.column = 0;
            } else {
                self.column += ch.len_utf8() as Col;
            }
        }
        self.index += len;
        consumed
    }

    /// Snapshot the position for a speculative match.
    pub fn save(&mut self) {
        self.saves.push((self.index, self.line, self.column));
    }

    /// Rewind to the most recent unmatched [`Cursor::save`].
    pub fn restore(&mut self) {
        let (index, line, column) = self
            .saves
            .pop()
            .expect("Cursor::restore without a matching save");
        self.index = index;
        self.line = line;
        self.column = column;
    }

    /// Up to `max_chars` characters of already-consumed text, for error
    /// excerpts pointing at the failure position.
    pub fn excerpt(&self, max_chars: usize) -> &'s str {
        let consumed = &self.text[..self.index];
        match consumed.char_indices().rev().nth(max_chars - 1) {
            Some((start, _)) => &consumed[start..],
            None => consumed,
        }
    }

    /// Progress guard: true the first time it is called and every time the
    /// index has advanced since the previous check; false when the parse has
    /// stalled short of end-of-input. The driver turns false into a fatal
    /// `NoProgress` error, converting an infinite-loop grammar bug into an
    /// immediate, diagnosable failure.
    pub fn check_progress(&mut self) -> bool {
        if self.watermark == Some(self.index) && !self.at_end() {
            return false;
        }
        self.watermark = Some(self.index);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::Cursor;

    #[test]
    fn advancing_tracks_lines_and_columns() {
        let mut cursor = Cursor::new("ab\ncd\n");
        assert_eq!(cursor.advance(2), "ab");
        assert_eq!(cursor.location().line, 0);
        assert_eq!(cursor.location().column, 2);
        assert_eq!(cursor.advance(3), "\ncd");
        assert_eq!(cursor.location().line, 1);
        assert_eq!(cursor.location().column, 2);
        assert!(!cursor.at_end());
        cursor.advance(1);
        assert!(cursor.at_end());
    }

    #[test]
    fn saves_nest() {
        let mut cursor = Cursor::new("abcdef");
        cursor.advance(1);
        cursor.save();
        cursor.advance(2);
        cursor.save();
        cursor.advance(2);
        cursor.restore();
        assert_eq!(cursor.index(), 3);
        cursor.restore();
        assert_eq!(cursor.index(), 1);
        assert_eq!(cursor.remaining(), "bcdef");
    }

    #[test]
    fn progress_guard_catches_stalls() {
        let mut cursor = Cursor::new("xy");
        assert!(cursor.check_progress());
        assert!(!cursor.check_progress());
        cursor.advance(1);
        assert!(cursor.check_progress());
        cursor.advance(1);
        // At end-of-input a stalled index is fine.
        assert!(cursor.check_progress());
        assert!(cursor.check_progress());
    }

    #[test]
    fn peeking_clamps_to_the_last_character() {
        let mut cursor = Cursor::new("abc");
        assert_eq!(cursor.peek(1), Some('b'));
        assert_eq!(cursor.peek(9), None);
        assert_eq!(cursor.peek_clamped(9), Some('c'));
        cursor.advance(3);
        assert_eq!(cursor.peek_clamped(0), None);
    }

    #[test]
    fn excerpt_is_bounded() {
        let mut cursor = Cursor::new("abcdefgh");
        cursor.advance(6);
        assert_eq!(cursor.excerpt(4), "cdef");
        assert_eq!(cursor.excerpt(100), "abcdef");
    }
}
