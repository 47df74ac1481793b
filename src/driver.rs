use crate::cursor::Cursor;
use crate::error::{ParseError, ParseErrorCause};
use crate::lexicon::{Lexicon, TokenizerId};
use crate::source::Source;
use crate::Token;
use colored::Colorize;
use std::collections::VecDeque;

/// Receives human-readable trace lines from a lexer run. Purely
/// observational: attaching or omitting a sink never changes parse results.
pub trait TraceSink {
    fn line(&mut self, text: &str);
}

/// A [`TraceSink`] that writes colored lines to stderr.
#[derive(Debug, Default)]
pub struct StderrTrace;

impl TraceSink for StderrTrace {
    fn line(&mut self, text: &str) {
        eprintln!("{} {}", "lex".cyan().bold(), text);
    }
}

/// The output of a lexer run: emitted tokens, plus the trivia (ignored
/// tokens, typically whitespace) that was consumed along the way. Trivia is
/// kept so the original text remains reconstructible from a run.
#[derive(Debug, Clone)]
pub struct TokenStream {
    tokens: Vec<Token>,
    trivia: Vec<Token>,
}

impl TokenStream {
    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }

    pub fn trivia(&self) -> &[Token] {
        &self.trivia
    }

    pub fn get(&self, index: usize) -> Option<&Token> {
        self.tokens.get(index)
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    pub fn into_tokens(self) -> Vec<Token> {
        self.tokens
    }

    /// Stitch emitted and ignored tokens back together in document order.
    /// For any successful run this reproduces the consumed source exactly.
    pub fn reconstruct(&self) -> String {
        let mut all: Vec<&Token> = self.tokens.iter().chain(self.trivia.iter()).collect();
        all.sort_by_key(|token| token.span.range.0);
        all.iter().map(|token| token.raw.as_str()).collect()
    }
}

/// Mutable state of one lexer run: the cursor, the active-context queue, the
/// name path (for error messages), collected trivia, and the optional trace
/// sink. Owned exclusively by the run; a new parse gets a new `Lex`.
pub(crate) struct Lex<'s> {
    pub(crate) cursor: Cursor<'s>,
    source: &'s Source,
    queue: VecDeque<TokenizerId>,
    trivia: Vec<Token>,
    path_stack: Vec<String>,
    speculation: u32,
    sink: Option<&'s mut dyn TraceSink>,
}

/// Rollback point for a speculative match; see [`Lex::speculate`].
pub(crate) struct Speculation {
    queue: VecDeque<TokenizerId>,
    trivia_len: usize,
    path_len: usize,
}

impl<'s> Lex<'s> {
    fn new(source: &'s Source, sink: Option<&'s mut dyn TraceSink>) -> Lex<'s> {
        Lex {
            cursor: Cursor::new(source.text()),
            source,
            queue: VecDeque::new(),
            trivia: Vec::new(),
            path_stack: Vec::new(),
            speculation: 0,
            sink,
        }
    }

    pub(crate) fn error(&self, cause: ParseErrorCause) -> ParseError<'s> {
        ParseError::new(self.source, cause, Some(self.cursor.location()))
    }

    /// The qualified path of the named node, e.g. `lexer > block > close`.
    pub(crate) fn path(&self, name: &str) -> String {
        if self.path_stack.is_empty() {
            return name.to_owned();
        }
        let mut path = self.path_stack.join(" > ");
        if self.path_stack.last().map(String::as_str) != Some(name) {
            path.push_str(" > ");
            path.push_str(name);
        }
        path
    }

    pub(crate) fn enter(&mut self, name: &str) {
        self.path_stack.push(name.to_owned());
    }

    pub(crate) fn leave(&mut self) {
        self.path_stack.pop();
    }

    pub(crate) fn push_context(&mut self, id: TokenizerId) {
        self.queue.push_front(id);
    }

    pub(crate) fn pop_context(&mut self) -> Option<TokenizerId> {
        self.queue.pop_front()
    }

    pub(crate) fn front_context(&self) -> Option<TokenizerId> {
        self.queue.front().copied()
    }

    pub(crate) fn context_depth(&self) -> usize {
        self.queue.len()
    }

    pub(crate) fn keep_trivia(&mut self, tokens: Vec<Token>) {
        self.trivia.extend(tokens);
    }

    /// Begin a speculative match: snapshots the cursor, context queue, trivia
    /// and path so [`Lex::backtrack`] can roll every side effect back. Trace
    /// output is suppressed while any speculation is open.
    pub(crate) fn speculate(&mut self) -> Speculation {
        self.cursor.save();
        self.speculation += 1;
        Speculation {
            queue: self.queue.clone(),
            trivia_len: self.trivia.len(),
            path_len: self.path_stack.len(),
        }
    }

    pub(crate) fn backtrack(&mut self, mark: Speculation) {
        self.cursor.restore();
        self.speculation -= 1;
        self.queue = mark.queue;
        self.trivia.truncate(mark.trivia_len);
        self.path_stack.truncate(mark.path_len);
    }

    pub(crate) fn trace(&mut self, line: impl FnOnce() -> String) {
        if self.speculation == 0 {
            if let Some(sink) = self.sink.as_mut() {
                sink.line(&line());
            }
        }
    }
}

impl Lexicon {
    /// Tokenize a source to completion.
    ///
    /// Each pass tries the top-level tokenizers in order, appending what they
    /// read; context pushes and pops happen inside the reads. A pass that
    /// matches nothing fails with "no viable alternative"; a pass that
    /// matches without consuming trips the progress guard instead of looping.
    pub fn tokenize<'s>(&self, source: &'s Source) -> Result<TokenStream, ParseError<'s>> {
        self.run(source, None)
    }

    /// Like [`Lexicon::tokenize`], reporting each token read and context
    /// switch to `sink`.
    pub fn tokenize_traced<'s>(
        &self,
        source: &'s Source,
        sink: &'s mut dyn TraceSink,
    ) -> Result<TokenStream, ParseError<'s>> {
        self.run(source, Some(sink))
    }

    fn run<'s>(
        &self,
        source: &'s Source,
        sink: Option<&'s mut dyn TraceSink>,
    ) -> Result<TokenStream, ParseError<'s>> {
        let mut lex = Lex::new(source, sink);
        let mut tokens = Vec::new();
        while !lex.cursor.at_end() {
            let mut matched = false;
            for &root in self.roots() {
                if lex.cursor.at_end() {
                    break;
                }
                if !self.test(root, &mut lex) {
                    continue;
                }
                if let Some(out) = self.read(root, &mut lex)? {
                    matched = true;
                    if self.node(root).options().ignored {
                        lex.keep_trivia(out);
                    } else {
                        tokens.extend(out);
                    }
                    // Composite nodes apply their children's modes; a bare
                    // push/pop leaf at top level is applied here.
                    self.apply_mode(self.node(root).options().mode, &mut lex, &mut tokens)?;
                }
            }
            if !matched {
                return Err(lex.error(ParseErrorCause::NoViableAlternative {
                    name: source.filename().to_owned(),
                }));
            }
            if !lex.cursor.check_progress() {
                return Err(lex.error(ParseErrorCause::NoProgress));
            }
        }
        Ok(TokenStream {
            tokens,
            trivia: lex.trivia,
        })
    }
}
