use crate::source::Source;
use crate::Location;
use std::error;
use std::fmt;
use thiserror::Error;

/// A fatal parse failure, from any stage: lexing, scheme compilation, scheme
/// interpretation, or grammar building.
///
/// Errors borrow the [`Source`] they were raised against so `Display` can
/// quote the offending line. There is no recovery at the point an error is
/// raised — backtracking has already exhausted the alternatives available
/// there — so these only propagate upward to whoever started the parse.
#[derive(Debug)]
pub struct ParseError<'s> {
    source: &'s Source,
    cause: ParseErrorCause,
    location: Option<Location>,
}

#[derive(Debug, Error)]
pub(crate) enum ParseErrorCause {
    #[error("missing expected pattern /{pattern}/ at '{path}'")]
    PatternMismatch { pattern: String, path: String },
    #[error("'{path}' requires '{child}' to match here")]
    SequenceMismatch { child: String, path: String },
    #[error("no viable alternative at '{name}'")]
    NoViableAlternative { name: String },
    #[error("expected token '{expected}' but found '{actual}' at {path}")]
    UnexpectedToken {
        expected: String,
        actual: String,
        path: String,
    },
    #[error("token stream ended while '{path}' still expected '{expected}'")]
    UnexpectedEnd { expected: String, path: String },
    #[error("unknown scheme '#{0}'")]
    UnknownSchemeReference(String),
    #[error("unresolved reference '{0}'")]
    UnknownReference(String),
    #[error("duplicate declaration of '{0}': overloading is not allowed")]
    DuplicateDeclaration(String),
    #[error("declaration '{0}' has no value")]
    EmptyDeclaration(String),
    #[error("invalid pattern for '{name}': {message}")]
    InvalidPattern { name: String, message: String },
    #[error("malformed scheme: {0}")]
    MalformedScheme(String),
    #[error("no progress: the grammar cannot consume the next input")]
    NoProgress,
}

impl<'s> ParseError<'s> {
    pub(crate) fn new(
        source: &'s Source,
        cause: ParseErrorCause,
        location: Option<Location>,
    ) -> ParseError<'s> {
        ParseError {
            source,
            cause,
            location,
        }
    }

    /// The position the failure was raised at, when one is known.
    pub fn location(&self) -> Option<Location> {
        self.location
    }
}

impl<'s> fmt::Display for ParseError<'s> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(f, "Parse Error: {}", self.cause)?;
        if let Some(loc) = self.location {
            writeln!(
                f,
                "At '{}' line {}, column {}.",
                self.source.filename(),
                loc.line,
                loc.column
            )?;
            writeln!(f)?;
            let line = self.source.line_contents(loc.line);
            writeln!(f, "{}", line)?;
            let col = (loc.column as usize).min(line.len());
            for _ in 0..col {
                write!(f, " ")?;
            }
            write!(f, "^")?;
        } else {
            write!(f, "In '{}'.", self.source.filename())?;
        }
        Ok(())
    }
}

impl<'s> error::Error for ParseError<'s> {}
