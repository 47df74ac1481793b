//! The fixed bootstrap grammar for the scheme DSL.
//!
//! This is a hand-assembled tokenizer graph plus a small explicit reducer —
//! never derived from a scheme, so the DSL can describe every other grammar
//! without describing itself.

use super::{Action, Matcher, Repeat, SchemeNode};
use crate::error::{ParseError, ParseErrorCause};
use crate::lexicon::{Lexicon, LexiconBuilder};
use crate::source::Source;
use crate::tokenizer::{Options, Pattern, Sequence, Tokenizer};
use crate::Token;
use once_cell::sync::Lazy;

static BOOTSTRAP: Lazy<Lexicon> = Lazy::new(build);

/// Lex and reduce scheme text into a [`SchemeNode`] tree.
pub(super) fn compile<'s>(source: &'s Source) -> Result<SchemeNode, ParseError<'s>> {
    let stream = BOOTSTRAP.tokenize(source)?;
    reduce(stream.tokens(), source)
}

fn pattern(regex: &str) -> Pattern {
    // The bootstrap patterns are fixed; a typo here is a bug in this file.
    Pattern::regex(regex).unwrap()
}

fn build() -> Lexicon {
    let mut builder = LexiconBuilder::new();

    let hidden = builder.leaf("hidden", pattern(r"\s*"), Options::new().ignored());
    let hidden_some = builder.leaf("hidden", pattern(r"\s+"), Options::new().ignored());

    // `@word` before an opening bracket names the group/wrapper.
    let attr_name = builder.leaf("attr.name", pattern(r"@\w+"), Options::new());
    let attr = builder.gate("attr", pattern(r"@\w+"), vec![attr_name]);

    let group = builder.reserve("group");
    let wrapper = builder.reserve("wrapper");

    // A bare word, optionally followed by `-> action`.
    let word = builder.leaf("token", pattern(r"[^()\[\]\s]+"), Options::new());
    let arrow = builder.leaf("token.action.arrow", pattern(r"->"), Options::new().ignored());
    let action_word = builder.leaf("token.action", pattern(r"[^()\[\]\s]+"), Options::new());
    let action = builder.gate(
        "token.action",
        pattern(r"\s*->"),
        vec![hidden, arrow, hidden, action_word],
    );
    let normal = builder.sequence("normal", Options::new(), vec![word, action, hidden]);

    let group_body = {
        let content = builder.serial_alternation(
            "group.children",
            Options::new().nullable(),
            vec![hidden_some, group, wrapper, normal],
        );
        let close = builder.leaf("group.close", pattern(r"\)([*+?]?)"), Options::new().pop());
        builder.sequence("group.body", Options::new(), vec![content, close])
    };
    let wrapper_body = {
        let content = builder.serial_alternation(
            "wrapper.children",
            Options::new().nullable(),
            vec![hidden_some, group, wrapper, normal],
        );
        let close = builder.leaf("wrapper.close", pattern(r"\]([*+?]?)"), Options::new().pop());
        builder.sequence("wrapper.body", Options::new(), vec![content, close])
    };

    let group_open = builder.leaf("group.open", pattern(r"\("), Options::new().push(group_body));
    builder.fill(
        group,
        Tokenizer::Sequence(Sequence::new("group", Options::new(), vec![attr, group_open])),
    );
    let wrapper_open =
        builder.leaf("wrapper.open", pattern(r"\["), Options::new().push(wrapper_body));
    builder.fill(
        wrapper,
        Tokenizer::Sequence(Sequence::new(
            "wrapper",
            Options::new(),
            vec![attr, wrapper_open],
        )),
    );

    builder.root(hidden_some);
    builder.root(group);
    builder.root(wrapper);
    builder.root(normal);
    builder.finish()
}

// Partially-built group/wrapper, waiting for its closer.
enum Frame {
    Root(Vec<SchemeNode>),
    Group(Option<String>, Vec<SchemeNode>),
    Wrapper(Option<String>, Vec<SchemeNode>),
}

impl Frame {
    fn children(&mut self) -> &mut Vec<SchemeNode> {
        match self {
            Frame::Root(children) => children,
            Frame::Group(_, children) => children,
            Frame::Wrapper(_, children) => children,
        }
    }
}

/// Explicit stack reducer: `(`/`[` push a frame, their closers pop it and
/// resolve the repetition suffix, tokens attach with their action in between.
fn reduce<'s>(tokens: &[Token], source: &'s Source) -> Result<SchemeNode, ParseError<'s>> {
    let malformed = |message: String, token: Option<&Token>| {
        ParseError::new(
            source,
            ParseErrorCause::MalformedScheme(message),
            token.map(|token| token.span.start),
        )
    };

    let mut stack = vec![Frame::Root(Vec::new())];
    let mut attr: Option<String> = None;
    let mut index = 0;
    while index < tokens.len() {
        let token = &tokens[index];
        match token.name.as_str() {
            "attr.name" => {
                let next = tokens.get(index + 1).map(|token| token.name.as_str());
                if next != Some("group.open") && next != Some("wrapper.open") {
                    return Err(malformed(
                        format!("attribute '{}' must precede '(' or '['", token.raw),
                        Some(token),
                    ));
                }
                attr = Some(token.raw[1..].to_owned());
            }
            "group.open" => stack.push(Frame::Group(attr.take(), Vec::new())),
            "wrapper.open" => stack.push(Frame::Wrapper(attr.take(), Vec::new())),
            "group.close" | "wrapper.close" => {
                let repeat = Repeat::from_suffix(&token.raw[1..]);
                let node = match (token.name.as_str(), stack.pop()) {
                    ("group.close", Some(Frame::Group(attr, children))) => SchemeNode::Group {
                        repeat,
                        attr,
                        children,
                    },
                    ("wrapper.close", Some(Frame::Wrapper(attr, children))) => {
                        SchemeNode::Wrapper {
                            repeat,
                            attr,
                            children,
                        }
                    }
                    _ => {
                        return Err(malformed(
                            format!("unmatched '{}'", &token.raw[..1]),
                            Some(token),
                        ))
                    }
                };
                // stack can't be empty: popping the root frame errored above
                stack.last_mut().unwrap().children().push(node);
            }
            "token" => {
                let (matcher, name) = match token.raw.as_bytes().first() {
                    Some(b'!') => (Matcher::Prefix, &token.raw[1..]),
                    Some(b'?') => (Matcher::Optional, &token.raw[1..]),
                    _ => (Matcher::Exact, token.raw.as_str()),
                };
                let action = match tokens.get(index + 1) {
                    Some(next) if next.name == "token.action" => {
                        index += 1;
                        parse_action(&next.raw).map_err(|message| malformed(message, Some(next)))?
                    }
                    _ => Action::Normal,
                };
                stack.last_mut().unwrap().children().push(SchemeNode::Token {
                    name: name.to_owned(),
                    matcher,
                    action,
                });
            }
            other => {
                return Err(malformed(format!("unexpected token '{}'", other), Some(token)));
            }
        }
        index += 1;
    }

    match stack.pop() {
        Some(Frame::Root(children)) if stack.is_empty() => Ok(SchemeNode::Root { children }),
        _ => Err(malformed("unclosed group or wrapper".to_owned(), tokens.last())),
    }
}

fn parse_action(word: &str) -> Result<Action, String> {
    match word {
        "normal" => Ok(Action::Normal),
        "ignore" => Ok(Action::Ignore),
        _ if word.starts_with('$') && word.len() > 1 => Ok(Action::Bind(word[1..].to_owned())),
        _ if word.starts_with('#') && word.len() > 1 => Ok(Action::Scheme(word[1..].to_owned())),
        _ => Err(format!("unknown action '{}'", word)),
    }
}
