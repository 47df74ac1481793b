use super::{Action, Matcher, Repeat, Scheme, SchemeNode, SchemeSet};
use crate::driver::TokenStream;
use crate::error::{ParseError, ParseErrorCause};
use crate::source::Source;
use crate::{Span, Token};
use std::collections::BTreeMap;
use std::fmt;

/// A node of the generic syntax tree a scheme interpretation produces.
///
/// Nodes are typed by convention: `kind` is a token name, a scheme name, or
/// an attribute name, and consumers dispatch on it. Token-backed nodes carry
/// the raw text and span; structural nodes carry children and the named
/// fields that `-> $field` bindings and `@attr` hoisting produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyntaxNode {
    pub kind: String,
    pub value: Option<String>,
    pub span: Option<Span>,
    pub children: Vec<SyntaxNode>,
    pub fields: BTreeMap<String, SyntaxNode>,
}

impl SyntaxNode {
    pub(crate) fn new(kind: &str) -> SyntaxNode {
        SyntaxNode {
            kind: kind.to_owned(),
            value: None,
            span: None,
            children: Vec::new(),
            fields: BTreeMap::new(),
        }
    }

    pub fn field(&self, name: &str) -> Option<&SyntaxNode> {
        self.fields.get(name)
    }
}

impl fmt::Display for SyntaxNode {
    /// Display as an s-expression, fields first: `(kind name=x child child)`.
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if self.children.is_empty() && self.fields.is_empty() {
            match &self.value {
                Some(value) if !value.is_empty() => write!(f, "{}", value),
                _ => write!(f, "{}", self.kind),
            }
        } else {
            write!(f, "({}", self.kind)?;
            for (name, field) in &self.fields {
                write!(f, " {}={}", name, field)?;
            }
            for child in &self.children {
                write!(f, " {}", child)?;
            }
            write!(f, ")")
        }
    }
}

enum Step {
    Matched,
    NoMatch,
}
use Step::{Matched, NoMatch};

pub(super) fn interpret<'s>(
    scheme: &Scheme,
    stream: &TokenStream,
    schemes: &SchemeSet,
    source: &'s Source,
) -> Result<(SyntaxNode, usize), ParseError<'s>> {
    let mut interp = Interpreter {
        tokens: stream.tokens(),
        index: 0,
        schemes,
        source,
        path: Vec::new(),
    };
    match interp.eval_root(scheme.root(), scheme.name())? {
        Some(node) => Ok((node, interp.index)),
        None => {
            let cause = ParseErrorCause::UnexpectedToken {
                expected: scheme.name().to_owned(),
                actual: interp.current_name(),
                path: scheme.name().to_owned(),
            };
            Err(interp.error(cause))
        }
    }
}

pub(super) fn interpret_complete<'s>(
    scheme: &Scheme,
    stream: &TokenStream,
    schemes: &SchemeSet,
    source: &'s Source,
) -> Result<SyntaxNode, ParseError<'s>> {
    let (node, consumed) = interpret(scheme, stream, schemes, source)?;
    if let Some(leftover) = stream.tokens().get(consumed) {
        let cause = ParseErrorCause::UnexpectedToken {
            expected: "end of input".to_owned(),
            actual: leftover.name.clone(),
            path: scheme.name().to_owned(),
        };
        return Err(ParseError::new(source, cause, Some(leftover.span.start)));
    }
    Ok(node)
}

/// Walks a compiled scheme against a token stream. The stream position
/// (`index`) is the only lookahead state: a sub-scheme starts at the current
/// position and leaves the position just past what it consumed.
struct Interpreter<'a, 's> {
    tokens: &'a [Token],
    index: usize,
    schemes: &'a SchemeSet,
    source: &'s Source,
    path: Vec<String>,
}

impl<'a, 's> Interpreter<'a, 's> {
    fn error(&self, cause: ParseErrorCause) -> ParseError<'s> {
        let at = self.tokens.get(self.index).or_else(|| self.tokens.last());
        ParseError::new(self.source, cause, at.map(|token| token.span.start))
    }

    fn current_name(&self) -> String {
        match self.tokens.get(self.index) {
            Some(token) => token.name.clone(),
            None => "end of input".to_owned(),
        }
    }

    fn path_string(&self) -> String {
        self.path.join(" > ")
    }

    /// The root behaves like a non-optional wrapper, except that a missing
    /// *first* token declines the whole scheme (that is what lets `#Name`
    /// recursion and group alternatives probe a scheme without committing).
    fn eval_root(
        &mut self,
        root: &SchemeNode,
        name: &str,
    ) -> Result<Option<SyntaxNode>, ParseError<'s>> {
        let children = match root {
            SchemeNode::Root { children } => children,
            _ => unreachable!("scheme root is always SchemeNode::Root"),
        };
        if children.is_empty() {
            return Err(self.error(ParseErrorCause::MalformedScheme(format!(
                "scheme '{}' has no elements",
                name
            ))));
        }
        self.path.push(name.to_owned());
        let mut node = SyntaxNode::new(name);
        for (i, child) in children.iter().enumerate() {
            match self.eval(child, &mut node)? {
                Matched => {}
                NoMatch => {
                    if let SchemeNode::Token { name: expected, .. } = child {
                        if i == 0 {
                            self.path.pop();
                            return Ok(None);
                        }
                        let cause = ParseErrorCause::UnexpectedToken {
                            expected: expected.clone(),
                            actual: self.current_name(),
                            path: self.path_string(),
                        };
                        return Err(self.error(cause));
                    }
                    // Groups and wrappers police their own repetition modes.
                }
            }
        }
        self.path.pop();
        Ok(Some(node))
    }

    fn eval(&mut self, node: &SchemeNode, parent: &mut SyntaxNode) -> Result<Step, ParseError<'s>> {
        match node {
            SchemeNode::Root { .. } => unreachable!("roots do not nest"),
            SchemeNode::Token {
                name,
                matcher,
                action,
            } => self.eval_token(name, *matcher, action, parent),
            SchemeNode::Group {
                repeat,
                attr,
                children,
            } => self.eval_group(*repeat, attr, children, parent),
            SchemeNode::Wrapper {
                repeat,
                attr,
                children,
            } => self.eval_wrapper(*repeat, attr, children, parent),
        }
    }

    fn eval_token(
        &mut self,
        name: &str,
        matcher: Matcher,
        action: &Action,
        parent: &mut SyntaxNode,
    ) -> Result<Step, ParseError<'s>> {
        let token = match self.tokens.get(self.index) {
            Some(token) => token.clone(),
            None => return Ok(NoMatch),
        };
        if matcher == Matcher::Prefix {
            // Prefix dispatch: route by the token family, then hand the
            // stream to the named scheme from this very token.
            if token.name.starts_with(name) {
                if let Action::Scheme(scheme_name) = action {
                    return self.recurse(scheme_name, parent);
                }
            }
            return Ok(NoMatch);
        }
        if matcher == Matcher::Optional && token.name != name {
            // Absent optional token: an empty stand-in, nothing consumed.
            return Ok(match action {
                Action::Normal => {
                    let mut node = SyntaxNode::new("normal");
                    node.value = Some(String::new());
                    parent.children.push(node);
                    Matched
                }
                Action::Ignore => Matched,
                Action::Bind(field) => {
                    let mut node = SyntaxNode::new(field);
                    node.value = Some(String::new());
                    parent.fields.insert(field.clone(), node);
                    Matched
                }
                Action::Scheme(_) => NoMatch,
            });
        }
        if token.name != name {
            return Ok(NoMatch);
        }
        match action {
            Action::Normal => {
                self.index += 1;
                let mut node = SyntaxNode::new(&token.name);
                node.value = Some(token.raw.clone());
                node.span = Some(token.span);
                parent.children.push(node);
                Ok(Matched)
            }
            Action::Ignore => {
                self.index += 1;
                Ok(Matched)
            }
            Action::Bind(field) => {
                self.index += 1;
                let mut node = SyntaxNode::new(field);
                node.value = Some(token.raw.clone());
                node.span = Some(token.span);
                parent.fields.insert(field.clone(), node);
                Ok(Matched)
            }
            // The matched token stays in the stream: the sub-scheme starts
            // on it.
            Action::Scheme(scheme_name) => self.recurse(scheme_name, parent),
        }
    }

    fn recurse(&mut self, name: &str, parent: &mut SyntaxNode) -> Result<Step, ParseError<'s>> {
        let schemes: &'a SchemeSet = self.schemes;
        let scheme = match schemes.get(name) {
            Some(scheme) => scheme,
            None => return Err(self.error(ParseErrorCause::UnknownSchemeReference(name.to_owned()))),
        };
        match self.eval_root(scheme.root(), name)? {
            Some(mut node) => {
                node.kind = name.to_owned();
                parent.children.push(node);
                Ok(Matched)
            }
            None => Ok(NoMatch),
        }
    }

    fn eval_group(
        &mut self,
        repeat: Repeat,
        attr: &Option<String>,
        children: &[SchemeNode],
        parent: &mut SyntaxNode,
    ) -> Result<Step, ParseError<'s>> {
        self.path
            .push(attr.clone().unwrap_or_else(|| "group".to_owned()));
        let mut scratch = SyntaxNode::new("group");
        let matched = self.group_round(children, &mut scratch)?;
        if !matched && !repeat.allows_null() {
            return Err(self.error(ParseErrorCause::NoViableAlternative {
                name: self.path_string(),
            }));
        }
        if matched && repeat.repeats() {
            while self.index < self.tokens.len() {
                let before = self.index;
                if !self.group_round(children, &mut scratch)? {
                    break;
                }
                if self.index == before {
                    break;
                }
            }
        }
        self.path.pop();
        attach(scratch, attr, parent);
        Ok(Matched)
    }

    /// One alternation round: the first child that matches wins.
    fn group_round(
        &mut self,
        children: &[SchemeNode],
        scratch: &mut SyntaxNode,
    ) -> Result<bool, ParseError<'s>> {
        for child in children {
            if let Matched = self.eval(child, scratch)? {
                return Ok(true);
            }
        }
        Ok(false)
    }

    fn eval_wrapper(
        &mut self,
        repeat: Repeat,
        attr: &Option<String>,
        children: &[SchemeNode],
        parent: &mut SyntaxNode,
    ) -> Result<Step, ParseError<'s>> {
        self.path
            .push(attr.clone().unwrap_or_else(|| "wrapper".to_owned()));
        let mut scratch = SyntaxNode::new("wrapper");
        if let NoMatch = self.wrapper_pass(children, &mut scratch, repeat.allows_null())? {
            self.path.pop();
            return Ok(NoMatch);
        }
        if repeat.repeats() {
            loop {
                let before = self.index;
                // Later passes are all optional: a missing first element
                // just ends the repetition.
                if let NoMatch = self.wrapper_pass(children, &mut scratch, true)? {
                    break;
                }
                if self.index == before {
                    break;
                }
            }
        }
        self.path.pop();
        attach(scratch, attr, parent);
        Ok(Matched)
    }

    /// One sequence pass, fail-fast. Declines (rather than failing) only
    /// when the first child is absent and the pass is optional.
    fn wrapper_pass(
        &mut self,
        children: &[SchemeNode],
        scratch: &mut SyntaxNode,
        optional: bool,
    ) -> Result<Step, ParseError<'s>> {
        for (i, child) in children.iter().enumerate() {
            match self.eval(child, scratch)? {
                Matched => {}
                NoMatch => {
                    if optional && i == 0 {
                        return Ok(NoMatch);
                    }
                    if let SchemeNode::Token { name, .. } = child {
                        let cause = ParseErrorCause::UnexpectedToken {
                            expected: name.clone(),
                            actual: self.current_name(),
                            path: self.path_string(),
                        };
                        return Err(self.error(cause));
                    }
                    // Groups and wrappers police their own repetition modes.
                }
            }
        }
        Ok(Matched)
    }
}

/// Hoist or splice a finished group/wrapper result into its parent: a named
/// result becomes a field, the reserved name `children` (and the unnamed
/// case) splices into the parent's child list.
fn attach(mut scratch: SyntaxNode, attr: &Option<String>, parent: &mut SyntaxNode) {
    match attr {
        Some(attr) if attr == "children" => parent.children.extend(scratch.children),
        Some(attr) => {
            scratch.kind = attr.clone();
            parent.fields.insert(attr.clone(), scratch);
        }
        None => parent.children.extend(scratch.children),
    }
}
