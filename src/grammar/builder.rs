//! The grammar builder, last stage of [`Grammar::compile`](super::Grammar::compile).
//!
//! Walks the `Document` syntax tree the built-in schemes produce and
//! materializes the lexicon the grammar describes: each declaration becomes a
//! named tokenizer, `@if` blocks become gates, and references between
//! declarations resolve through an explicit scope stack — a global scope for
//! top-level declarations plus one local scope per nesting level.

use super::Metadata;
use crate::error::{ParseError, ParseErrorCause};
use crate::lexicon::{Lexicon, LexiconBuilder, TokenizerId};
use crate::scheme::SyntaxNode;
use crate::source::Source;
use crate::tokenizer::{Leaf, Options, Pattern, Sequence, Tokenizer};
use std::collections::BTreeMap;

/// Declarations visible at one nesting level, by name.
type Scope = BTreeMap<String, TokenizerId>;

pub(super) fn build<'s>(
    document: &SyntaxNode,
    metadata: &Metadata,
    source: &'s Source,
) -> Result<Lexicon, ParseError<'s>> {
    let mut builder = Builder {
        arena: LexiconBuilder::new(),
        metadata,
        source,
    };
    builder.document(document)?;
    Ok(builder.arena.finish())
}

struct Builder<'a, 's> {
    arena: LexiconBuilder,
    metadata: &'a Metadata,
    source: &'s Source,
}

impl<'a, 's> Builder<'a, 's> {
    fn document(&mut self, document: &SyntaxNode) -> Result<(), ParseError<'s>> {
        let declarations: Vec<&SyntaxNode> = document
            .children
            .iter()
            .filter(|child| child.kind == "LexerDeclaration")
            .collect();
        let mut global = Scope::new();
        let mut ids = Vec::new();
        for decl in &declarations {
            ids.push(self.declare(&mut global, &[], decl)?);
        }
        let scopes = vec![global];
        for (decl, id) in declarations.into_iter().zip(ids) {
            self.lexer(decl, id, &scopes)?;
            self.arena.root(id);
        }
        Ok(())
    }

    /// Compile one `lexer name { … }` declaration into its reserved `id`: a
    /// sequence holding a serial alternation of the block's rules, with any
    /// pop-mode rules trailing, so a pushed context runs its body until the
    /// body stops matching and then must match its closer.
    fn lexer(
        &mut self,
        decl: &SyntaxNode,
        id: TokenizerId,
        outer: &[Scope],
    ) -> Result<(), ParseError<'s>> {
        let name = name_of(decl).to_owned();

        // Collect every declared name first, so forward and recursive
        // references (a block pushing itself, a rule naming a later one)
        // resolve before any body is compiled.
        let mut local = Scope::new();
        let mut ids: Vec<Option<TokenizerId>> = Vec::with_capacity(decl.children.len());
        for child in &decl.children {
            let child_id = match child.kind.as_str() {
                "LexerDeclaration" | "Expression" => {
                    Some(self.declare(&mut local, outer, child)?)
                }
                _ => None,
            };
            ids.push(child_id);
        }
        let mut scopes = outer.to_vec();
        scopes.push(local);

        // Pattern-valued expressions fill before reference-valued ones, so
        // anything that stamps a referenced pattern (fragment references,
        // `@if` conditions) finds the pattern already in place.
        for reference_pass in [false, true] {
            for (index, child) in decl.children.iter().enumerate() {
                if child.kind == "Expression" && has_reference_value(child) == reference_pass {
                    self.expression(child, ids[index].unwrap(), &scopes)?;
                }
            }
        }
        for (index, child) in decl.children.iter().enumerate() {
            if child.kind == "LexerDeclaration" {
                self.lexer(child, ids[index].unwrap(), &scopes)?;
            }
        }

        let mut rules = Vec::new();
        let mut closers = Vec::new();
        for (index, child) in decl.children.iter().enumerate() {
            match child.kind.as_str() {
                "Expression" => {
                    if is_pop(child) {
                        closers.push(ids[index].unwrap());
                    } else {
                        rules.push(ids[index].unwrap());
                    }
                }
                "IfStatement" => rules.push(self.if_statement(child, &scopes)?),
                // Nested declarations are push targets and referents, not
                // inline rules of the enclosing block.
                _ => {}
            }
        }
        let body = self.arena.serial_alternation(
            &format!("{}.rules", name),
            Options::new().nullable(),
            rules,
        );
        let mut children = vec![body];
        children.extend(closers);
        self.arena.fill(
            id,
            Tokenizer::Sequence(Sequence::new(&name, Options::new(), children)),
        );
        Ok(())
    }

    /// Compile `name = value [, value]* [-> option…];` into its reserved `id`.
    fn expression(
        &mut self,
        expr: &SyntaxNode,
        id: TokenizerId,
        scopes: &[Scope],
    ) -> Result<(), ParseError<'s>> {
        let name = name_of(expr).to_owned();
        let options = self.options(expr, scopes)?;
        let values = expr.field("values").expect("the expression scheme binds values");
        if values.children.is_empty() {
            return Err(self.error(
                ParseErrorCause::EmptyDeclaration(name),
                expr.field("name"),
            ));
        }
        if let [value] = values.children.as_slice() {
            let tokenizer = self.value(value, &name, options, scopes)?;
            self.arena.fill(id, tokenizer);
            return Ok(());
        }
        let mut children = Vec::new();
        for value in &values.children {
            let tokenizer = self.value(value, &name, Options::new(), scopes)?;
            children.push(self.arena.add(tokenizer));
        }
        self.arena.fill(
            id,
            Tokenizer::Sequence(Sequence::new(&name, options, children)),
        );
        Ok(())
    }

    /// One expression value. A string literal or metadata reference becomes a
    /// pattern leaf; a bare identifier becomes the referenced tokenizer —
    /// except that referencing a fragment stamps the fragment's pattern into
    /// a fresh leaf, which is what fragments exist for.
    fn value(
        &mut self,
        value: &SyntaxNode,
        name: &str,
        options: Options,
        scopes: &[Scope],
    ) -> Result<Tokenizer, ParseError<'s>> {
        match value.kind.as_str() {
            "StringLiteral" => Ok(Tokenizer::Leaf(Leaf::new(
                name,
                Pattern::literal(&unescape(value)),
                options,
            ))),
            "expr.metadata" => {
                let pattern = self.metadata_pattern(value)?;
                Ok(Tokenizer::Leaf(Leaf::new(name, pattern, options)))
            }
            "expr.ref" => {
                let id = self.resolve(value, scopes)?;
                if let Tokenizer::Leaf(leaf) = self.arena.node(id) {
                    if leaf.options.fragment {
                        let pattern = leaf.pattern.clone();
                        return Ok(Tokenizer::Leaf(Leaf::new(name, pattern, options)));
                    }
                }
                Ok(Tokenizer::Sequence(Sequence::new(name, options, vec![id])))
            }
            other => unreachable!("the expression scheme only yields values, got '{}'", other),
        }
    }

    /// `@if(condition) { … } [-> end]` compiles to a gate: the condition's
    /// pattern is the lookahead, the block's rules are the body. A trailing
    /// `-> end` is accepted as written; the gate already ends its enclosing
    /// rule scan on a match.
    fn if_statement(
        &mut self,
        node: &SyntaxNode,
        scopes: &[Scope],
    ) -> Result<TokenizerId, ParseError<'s>> {
        let condition = node
            .field("condition")
            .and_then(|group| group.children.first())
            .expect("the if scheme guarantees a condition");
        let tester = self.condition_pattern(condition, scopes)?;
        let mut children = Vec::new();
        for child in &node.children {
            match child.kind.as_str() {
                // Rules inside a conditional block are gate body elements,
                // not scope declarations.
                "Expression" => {
                    let id = self.arena.reserve(name_of(child));
                    self.expression(child, id, scopes)?;
                    children.push(id);
                }
                "IfStatement" => children.push(self.if_statement(child, scopes)?),
                _ => {}
            }
        }
        Ok(self.arena.gate("if", tester, children))
    }

    fn condition_pattern(
        &self,
        condition: &SyntaxNode,
        scopes: &[Scope],
    ) -> Result<Pattern, ParseError<'s>> {
        match condition.kind.as_str() {
            "StringLiteral" => Ok(Pattern::literal(&unescape(condition))),
            "expr.metadata" => self.metadata_pattern(condition),
            "expr.ref" => {
                let id = self.resolve(condition, scopes)?;
                match self.arena.node(id) {
                    Tokenizer::Leaf(leaf) => Ok(leaf.pattern.clone()),
                    _ => Err(self.error(
                        ParseErrorCause::InvalidPattern {
                            name: condition.value.clone().unwrap_or_default(),
                            message: "a condition must name a pattern rule".to_owned(),
                        },
                        Some(condition),
                    )),
                }
            }
            other => unreachable!("the if scheme only yields conditions, got '{}'", other),
        }
    }

    /// Map `-> option [, option]*` keywords onto [`Options`].
    fn options(&self, expr: &SyntaxNode, scopes: &[Scope]) -> Result<Options, ParseError<'s>> {
        let mut options = Options::new();
        let group = match expr.field("options") {
            Some(group) => group,
            None => return Ok(options),
        };
        for child in &group.children {
            match child.kind.as_str() {
                "expr.options.normal" => {}
                "expr.options.ignore" => options = options.ignored(),
                "expr.options.fragment" => options = options.fragment(),
                "expr.options.pop" => options = options.pop(),
                "expr.options.push" => {
                    let target = group.field("target").expect("push binds its target");
                    options = options.push(self.resolve(target, scopes)?);
                }
                _ => {}
            }
        }
        Ok(options)
    }

    /// `@name(.name)*` values look their pattern up in the caller-supplied
    /// metadata table, keyed by the dotted path without the leading `@`.
    fn metadata_pattern(&self, value: &SyntaxNode) -> Result<Pattern, ParseError<'s>> {
        let raw = value.value.as_deref().expect("metadata tokens carry text");
        let text = match self.metadata.get(&raw[1..]) {
            Some(text) => text,
            None => {
                return Err(self.error(
                    ParseErrorCause::UnknownReference(raw.to_owned()),
                    Some(value),
                ))
            }
        };
        Pattern::regex(text).map_err(|err| {
            self.error(
                ParseErrorCause::InvalidPattern {
                    name: raw.to_owned(),
                    message: err.to_string(),
                },
                Some(value),
            )
        })
    }

    /// Look a referenced name up through the scope stack, innermost first.
    fn resolve(&self, value: &SyntaxNode, scopes: &[Scope]) -> Result<TokenizerId, ParseError<'s>> {
        let name = value.value.as_deref().expect("reference tokens carry text");
        for scope in scopes.iter().rev() {
            if let Some(&id) = scope.get(name) {
                return Ok(id);
            }
        }
        Err(self.error(
            ParseErrorCause::UnknownReference(name.to_owned()),
            Some(value),
        ))
    }

    /// Reserve an id for a named declaration, rejecting a name already
    /// visible anywhere in the scope stack.
    fn declare(
        &mut self,
        scope: &mut Scope,
        outer: &[Scope],
        node: &SyntaxNode,
    ) -> Result<TokenizerId, ParseError<'s>> {
        let name = name_of(node);
        let taken =
            scope.contains_key(name) || outer.iter().any(|enclosing| enclosing.contains_key(name));
        if taken {
            return Err(self.error(
                ParseErrorCause::DuplicateDeclaration(name.to_owned()),
                node.field("name"),
            ));
        }
        let id = self.arena.reserve(name);
        scope.insert(name.to_owned(), id);
        Ok(id)
    }

    fn error(&self, cause: ParseErrorCause, at: Option<&SyntaxNode>) -> ParseError<'s> {
        let location = at.and_then(|node| node.span).map(|span| span.start);
        ParseError::new(self.source, cause, location)
    }
}

fn name_of(node: &SyntaxNode) -> &str {
    node.field("name")
        .and_then(|field| field.value.as_deref())
        .expect("declaration schemes bind a name")
}

fn is_pop(expr: &SyntaxNode) -> bool {
    expr.field("options")
        .map(|group| {
            group
                .children
                .iter()
                .any(|child| child.kind == "expr.options.pop")
        })
        .unwrap_or(false)
}

fn has_reference_value(expr: &SyntaxNode) -> bool {
    expr.field("values")
        .map(|values| values.children.iter().any(|child| child.kind == "expr.ref"))
        .unwrap_or(false)
}

/// Reassemble a string literal's text, resolving the escape sequences the
/// lexer left unparsed.
fn unescape(literal: &SyntaxNode) -> String {
    let mut text = String::new();
    for child in &literal.children {
        let raw = child.value.as_deref().unwrap_or("");
        if child.kind == "strings.escape" {
            text.push(match raw.as_bytes()[1] {
                b't' => '\t',
                b'b' => '\u{0008}',
                b'r' => '\r',
                b'n' => '\n',
                b'"' => '"',
                b'\'' => '\'',
                _ => '\\',
            });
        } else {
            text.push_str(raw);
        }
    }
    text
}
