//! Compiling textual grammars into executable lexicons.
//!
//! [`Grammar::compile`] runs the whole pipeline over a grammar document: the
//! fixed grammar lexicon tokenizes the text, the built-in `Document` scheme
//! shapes the token stream into a syntax tree, and the builder walks that
//! tree into a new [`Lexicon`] — which [`Grammar::tokenize`] then runs over
//! target documents written in the language the grammar describes.

mod builder;
mod lexicon;
mod schemes;

use crate::driver::{TokenStream, TraceSink};
use crate::error::ParseError;
use crate::lexicon::Lexicon;
use crate::scheme::SyntaxNode;
use crate::source::Source;
use std::collections::BTreeMap;

/// Patterns for `@name(.name)*` metadata values, keyed by the dotted path
/// without the leading `@`. Where the table comes from (a registry, a file,
/// a literal) is the caller's business; the core only asks for the finished
/// map.
pub type Metadata = BTreeMap<String, String>;

/// A compiled user grammar: an executable lexicon for the language the
/// grammar text describes.
#[derive(Debug, Clone)]
pub struct Grammar {
    lexicon: Lexicon,
}

impl Grammar {
    /// Compile a grammar document. Fails on anything from a lexing error in
    /// the grammar text to a duplicate declaration in the grammar itself.
    pub fn compile<'s>(
        source: &'s Source,
        metadata: &Metadata,
    ) -> Result<Grammar, ParseError<'s>> {
        let document = Grammar::parse_document(source)?;
        let lexicon = builder::build(&document, metadata, source)?;
        Ok(Grammar { lexicon })
    }

    /// Tokenize grammar text without building anything, exposing the raw
    /// `header` / `lexer.*` / `expr.*` stream the document schemes consume.
    pub fn tokenize_document<'s>(source: &'s Source) -> Result<TokenStream, ParseError<'s>> {
        lexicon::grammar_lexicon().tokenize(source)
    }

    /// Parse grammar text into its syntax tree, the form the builder walks.
    pub fn parse_document<'s>(source: &'s Source) -> Result<SyntaxNode, ParseError<'s>> {
        let stream = Grammar::tokenize_document(source)?;
        let schemes = schemes::scheme_set();
        let document = schemes.get("Document").expect("Document is built in");
        document.interpret_complete(&stream, schemes, source)
    }

    /// Tokenize a target document with the compiled grammar.
    pub fn tokenize<'s>(&self, source: &'s Source) -> Result<TokenStream, ParseError<'s>> {
        self.lexicon.tokenize(source)
    }

    /// Like [`Grammar::tokenize`], reporting token reads and context
    /// switches to `sink`.
    pub fn tokenize_traced<'s>(
        &self,
        source: &'s Source,
        sink: &'s mut dyn TraceSink,
    ) -> Result<TokenStream, ParseError<'s>> {
        self.lexicon.tokenize_traced(source, sink)
    }

    /// The compiled tokenizer graph.
    pub fn lexicon(&self) -> &Lexicon {
        &self.lexicon
    }
}
