//! The built-in schemes that shape a tokenized grammar document into the
//! [`SyntaxNode`](crate::SyntaxNode) tree the builder consumes.
//!
//! Compiled once, on first use. The texts reference the token names emitted
//! by [`grammar_lexicon`](super::lexicon::grammar_lexicon).

use crate::scheme::{Scheme, SchemeSet};
use crate::source::Source;
use once_cell::sync::Lazy;

const HEADER: &str = "header";

const LEXER_DECLARATION: &str = "
lexer.keyword -> $keyword
lexer.name -> $name
lexer.block.open -> ignore
@children(
    !lexer -> #LexerDeclaration
    !expr -> #Expression
    !if -> #IfStatement
)*
lexer.block.close -> ignore
";

const EXPRESSION: &str = "
expr.name -> $name
?expr.assign -> ignore
@values(
    !strings -> #StringLiteral
    expr.metadata
    expr.ref
    expr.comma -> ignore
)*
@options(
    expr.options.arrow -> ignore
    expr.options.normal
    expr.options.pop
    expr.options.ignore
    expr.options.fragment
    expr.options.push
    expr.options.open -> ignore
    expr.options.target -> $target
    expr.options.close -> ignore
    expr.options.comma -> ignore
)*
expr.end -> ignore
";

const STRING_LITERAL: &str = "
strings.open -> $open
@children(
    strings.text
    strings.escape
)*
strings.close -> ignore
";

const IF_STATEMENT: &str = "
if.keyword -> ignore
if.open -> ignore
@condition(
    !strings -> #StringLiteral
    expr.metadata
    expr.ref
)
if.close -> ignore
if.block.open -> ignore
@children(
    !expr -> #Expression
    !if -> #IfStatement
)*
if.block.close -> ignore
@stop[
    if.stop.arrow -> ignore
    if.stop
]?
";

const DOCUMENT: &str = "
(
    header -> #Header
)*
(
    !lexer -> #LexerDeclaration
)*
";

static SCHEMES: Lazy<SchemeSet> = Lazy::new(|| {
    let mut set = SchemeSet::new();
    for (name, text) in [
        ("Header", HEADER),
        ("LexerDeclaration", LEXER_DECLARATION),
        ("Expression", EXPRESSION),
        ("StringLiteral", STRING_LITERAL),
        ("IfStatement", IF_STATEMENT),
        ("Document", DOCUMENT),
    ] {
        let source = Source::new(name, text.to_owned());
        let scheme = Scheme::compile(name, &source)
            .unwrap_or_else(|err| panic!("built-in scheme '{}' failed to compile: {}", name, err));
        set.insert(scheme);
    }
    set
});

pub(super) fn scheme_set() -> &'static SchemeSet {
    &SCHEMES
}
