//! # Pasteboard
//!
//! Pasteboard turns a textual grammar description into a working lexer, in
//! two coupled stages built on one combinator engine:
//!
//! - **Tokenizer combinators**: leaf pattern matchers plus sequence,
//!   alternation and lookahead-gated nodes, with backtracking and a context
//!   queue that lets one token switch the active tokenizer (quoted-string
//!   bodies, nested blocks, recursive blocks).
//! - **Schemes**: a small DSL describing tree shape. A scheme is compiled
//!   once (by a fixed, hand-built bootstrap lexer) and then interpreted
//!   against a token stream to build a generic [`SyntaxNode`] tree. The
//!   grammar builder walks that tree and materializes a new tokenizer graph
//!   — so a grammar written as text becomes an executable [`Lexicon`].
//!
//! The usual entry point is [`Grammar`]:
//!
//! ```
//! use pasteboard::{Grammar, Metadata, Source};
//!
//! let grammar = Source::new("greeting.box", "lexer greeting { word = \"hi\"; }".to_owned());
//! let grammar = Grammar::compile(&grammar, &Metadata::new()).unwrap();
//! let tokens = grammar.tokenize(&Source::new("input", "hi".to_owned())).unwrap();
//! assert_eq!(tokens.tokens()[0].name, "word");
//! ```

mod cursor;
mod driver;
mod error;
mod lexicon;
mod source;
mod tokenizer;

pub mod grammar;
pub mod scheme;

use std::fmt;

pub use cursor::Cursor;
pub use driver::{StderrTrace, TokenStream, TraceSink};
pub use error::ParseError;
pub use grammar::{Grammar, Metadata};
pub use lexicon::{Lexicon, LexiconBuilder, TokenizerId};
pub use scheme::{Scheme, SchemeSet, SyntaxNode};
pub use source::Source;
pub use tokenizer::{Alternation, Gate, Leaf, Mode, Options, Pattern, Sequence, Tokenizer};

/// A byte offset into the source text.
pub type Offset = usize;
pub type Line = u32;
pub type Col = u32;

/// A position in the source text. Zero-indexed; columns are counted in bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Location {
    pub line: Line,
    pub column: Col,
}

/// A start and end position in the source text, plus the covered byte range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Span {
    pub start: Location,
    pub end: Location,
    pub range: (Offset, Offset),
}

/// One word of lexer output: the matching tokenizer's name, the raw matched
/// text, and where it came from. Immutable once created.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub name: String,
    pub raw: String,
    pub span: Span,
}

impl Location {
    /// The position at the start of any document.
    pub fn start_of_file() -> Location {
        Location { line: 0, column: 0 }
    }
}

impl Span {
    pub fn new(start: Location, end: Location, range: (Offset, Offset)) -> Span {
        Span { start, end, range }
    }

    pub fn is_empty(&self) -> bool {
        self.range.0 == self.range.1
    }

    /// Length of the covered text, in bytes.
    pub fn len(&self) -> usize {
        self.range.1 - self.range.0
    }
}

impl Token {
    pub fn new(name: impl Into<String>, raw: impl Into<String>, span: Span) -> Token {
        Token {
            name: name.into(),
            raw: raw.into(),
            span,
        }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}-{}", self.start, self.end)
    }
}
