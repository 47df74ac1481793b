//! Schemes: a small DSL describing the shape of a syntax tree.
//!
//! A scheme is text like
//!
//! ```text
//! expr.name -> $name
//! expr.assign -> ignore
//! @values(
//!     !strings -> #StringLiteral
//!     expr.ref
//! )*
//! expr.end -> ignore
//! ```
//!
//! compiled once into a [`SchemeNode`] tree and then *interpreted* against a
//! token stream to produce a [`SyntaxNode`] tree: bare tokens match by name,
//! `( … )` groups are first-match-wins alternations, `[ … ]` wrappers are
//! fail-fast sequences, `*`/`+`/`?` suffixes control repetition, `-> $field`
//! binds a token into a named field, `-> #Name` recurses into another scheme,
//! and a leading `@word` hoists a group/wrapper result into a named field
//! (`@children` splices instead).
//!
//! The scheme DSL itself is lexed by a fixed, hand-built tokenizer graph —
//! deliberately not scheme-derived, so there is no regress.

mod bootstrap;
mod interpreter;

pub use interpreter::SyntaxNode;

use crate::error::ParseError;
use crate::driver::TokenStream;
use crate::source::Source;
use std::collections::BTreeMap;

/// How often a group or wrapper may match: `( … )` exactly once, `( … )?`
/// at most once, `( … )+` one or more times, `( … )*` any number of times.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Repeat {
    Once,
    NullOrOnce,
    Repeat,
    NullOrRepeat,
}

impl Repeat {
    fn from_suffix(suffix: &str) -> Repeat {
        match suffix {
            "?" => Repeat::NullOrOnce,
            "+" => Repeat::Repeat,
            "*" => Repeat::NullOrRepeat,
            _ => Repeat::Once,
        }
    }

    pub fn allows_null(self) -> bool {
        matches!(self, Repeat::NullOrOnce | Repeat::NullOrRepeat)
    }

    pub fn repeats(self) -> bool {
        matches!(self, Repeat::Repeat | Repeat::NullOrRepeat)
    }
}

/// What to do with a matched token: emit it as a child, drop it, bind it
/// into a named field (`-> $name`), or interpret another scheme starting at
/// it (`-> #Name`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    Normal,
    Ignore,
    Bind(String),
    Scheme(String),
}

/// How a scheme token compares itself to a stream token: by exact name, by
/// name prefix (`!prefix`, used to dispatch into a sub-scheme), or optionally
/// (`?name`, where a mismatch produces an empty result instead of a failure).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Matcher {
    Exact,
    Prefix,
    Optional,
}

/// One node of a compiled scheme.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SchemeNode {
    Root {
        children: Vec<SchemeNode>,
    },
    /// `( … )` — alternatives, first match wins.
    Group {
        repeat: Repeat,
        attr: Option<String>,
        children: Vec<SchemeNode>,
    },
    /// `[ … ]` — a sequence, all children in order.
    Wrapper {
        repeat: Repeat,
        attr: Option<String>,
        children: Vec<SchemeNode>,
    },
    Token {
        name: String,
        matcher: Matcher,
        action: Action,
    },
}

/// A named, compiled scheme. Compilation happens once; the result is reused
/// for every interpretation.
#[derive(Debug, Clone)]
pub struct Scheme {
    name: String,
    root: SchemeNode,
}

impl Scheme {
    /// Compile scheme text. The text is lexed by the fixed bootstrap lexer
    /// and reduced to a [`SchemeNode`] tree.
    pub fn compile<'s>(name: &str, source: &'s Source) -> Result<Scheme, ParseError<'s>> {
        let root = bootstrap::compile(source)?;
        Ok(Scheme {
            name: name.to_owned(),
            root,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn root(&self) -> &SchemeNode {
        &self.root
    }

    /// Interpret this scheme against a token stream, resolving `#Name`
    /// recursions through `schemes`. `source` is the text the tokens came
    /// from, for error positions.
    pub fn interpret<'s>(
        &self,
        stream: &TokenStream,
        schemes: &SchemeSet,
        source: &'s Source,
    ) -> Result<SyntaxNode, ParseError<'s>> {
        interpreter::interpret(self, stream, schemes, source).map(|(node, _)| node)
    }

    /// Like [`Scheme::interpret`], but demand that the whole stream is
    /// consumed; leftover tokens are an error rather than silent trailing
    /// garbage.
    pub fn interpret_complete<'s>(
        &self,
        stream: &TokenStream,
        schemes: &SchemeSet,
        source: &'s Source,
    ) -> Result<SyntaxNode, ParseError<'s>> {
        interpreter::interpret_complete(self, stream, schemes, source)
    }
}

/// A registry of compiled schemes, looked up by `#Name` actions.
#[derive(Debug, Clone, Default)]
pub struct SchemeSet {
    map: BTreeMap<String, Scheme>,
}

impl SchemeSet {
    pub fn new() -> SchemeSet {
        SchemeSet::default()
    }

    pub fn insert(&mut self, scheme: Scheme) {
        self.map.insert(scheme.name.clone(), scheme);
    }

    pub fn get(&self, name: &str) -> Option<&Scheme> {
        self.map.get(name)
    }
}
