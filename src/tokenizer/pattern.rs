use regex::{escape, Error as RegexError, Regex};
use std::fmt;

/// A leaf-level matcher: either a literal string or a regex, always applied
/// at the cursor position (the regex is compiled with a `^` anchor).
#[derive(Debug, Clone)]
pub struct Pattern {
    literal: Option<String>,
    regex: Regex,
    source: String,
}

impl Pattern {
    /// A pattern matching a literal string. Special regex characters are
    /// matched literally; nothing needs escaping.
    pub fn literal(text: &str) -> Pattern {
        let source = escape(text);
        Pattern {
            literal: Some(text.to_owned()),
            // escape() output is always a valid regex
            regex: Regex::new(&format!("^({})", source)).unwrap(),
            source,
        }
    }

    /// A pattern matching a regex, in the syntax of the `regex` crate.
    pub fn regex(pattern: &str) -> Result<Pattern, RegexError> {
        Ok(Pattern {
            literal: None,
            regex: Regex::new(&format!("^({})", pattern))?,
            source: pattern.to_owned(),
        })
    }

    /// The unanchored pattern text, for diagnostics.
    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// Length in bytes of the match at the start of `input`, if any.
    pub fn match_len(&self, input: &str) -> Option<usize> {
        match &self.literal {
            Some(literal) => input.starts_with(literal.as_str()).then(|| literal.len()),
            None => self.regex.find(input).map(|m| m.end()),
        }
    }
}

impl fmt::Display for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "/{}/", self.source)
    }
}

#[cfg(test)]
mod tests {
    use super::Pattern;

    #[test]
    fn literals_match_literally() {
        let pattern = Pattern::literal("a+b");
        assert_eq!(pattern.match_len("a+b!"), Some(3));
        assert_eq!(pattern.match_len("aab"), None);
    }

    #[test]
    fn regexes_anchor_at_the_start() {
        let pattern = Pattern::regex("[0-9]+").unwrap();
        assert_eq!(pattern.match_len("42 more"), Some(2));
        assert_eq!(pattern.match_len(" 42"), None);
    }

    #[test]
    fn zero_width_matches_are_allowed() {
        let pattern = Pattern::regex("[ \\t]*").unwrap();
        assert_eq!(pattern.match_len("xyz"), Some(0));
        assert_eq!(pattern.match_len("  xyz"), Some(2));
    }
}
