use crate::driver::Lex;
use crate::error::{ParseError, ParseErrorCause};
use crate::tokenizer::{Alternation, Gate, Leaf, Mode, Options, Pattern, Sequence, Tokenizer};
use crate::Token;

/// Index of a tokenizer node within its [`Lexicon`].
pub type TokenizerId = usize;

/// A compiled tokenizer graph: an arena of nodes plus the ordered list of
/// top-level tokenizers the driver tries on each pass.
///
/// Nodes refer to children, alternatives and push targets by [`TokenizerId`],
/// so sharing and recursion (a block that pushes itself) need no shared
/// ownership; the ids only mean something against the arena they came from.
#[derive(Debug, Clone)]
pub struct Lexicon {
    nodes: Vec<Tokenizer>,
    roots: Vec<TokenizerId>,
}

impl Lexicon {
    pub fn node(&self, id: TokenizerId) -> &Tokenizer {
        &self.nodes[id]
    }

    pub fn roots(&self) -> &[TokenizerId] {
        &self.roots
    }

    /// Would the node match at the cursor? Never consumes input.
    pub(crate) fn test(&self, id: TokenizerId, lex: &mut Lex) -> bool {
        match self.node(id) {
            Tokenizer::Leaf(leaf) => leaf.test(lex),
            Tokenizer::Sequence(seq) => seq.test(self, lex),
            Tokenizer::Alternation(alt) => alt.test(self, lex),
            Tokenizer::Gate(gate) => gate.test(self, lex),
        }
    }

    /// Consume the node's match. `Ok(None)` means a nullable node declined;
    /// errors are fatal.
    pub(crate) fn read<'s>(
        &self,
        id: TokenizerId,
        lex: &mut Lex<'s>,
    ) -> Result<Option<Vec<Token>>, ParseError<'s>> {
        match self.node(id) {
            Tokenizer::Leaf(leaf) => {
                let token = leaf.read(lex)?;
                if let Some(token) = &token {
                    lex.trace(|| format!("{} {:?} @ {}", token.name, token.raw, token.span));
                }
                Ok(token.map(|token| vec![token]))
            }
            Tokenizer::Sequence(seq) => seq.read(self, lex),
            Tokenizer::Alternation(alt) => alt.read(self, lex),
            Tokenizer::Gate(gate) => gate.read(self, lex),
        }
    }

    /// Apply a matched child's context effect. `Push` prepends the target to
    /// the queue and drains queued contexts to completion (in queue order)
    /// before control returns; the drained context removes itself via its own
    /// `Pop` child. `Pop` removes the front entry.
    pub(crate) fn apply_mode<'s>(
        &self,
        mode: Mode,
        lex: &mut Lex<'s>,
        tokens: &mut Vec<Token>,
    ) -> Result<(), ParseError<'s>> {
        match mode {
            Mode::Normal => Ok(()),
            Mode::Pop => {
                if let Some(id) = lex.pop_context() {
                    lex.trace(|| format!("pop context '{}'", self.node(id).name()));
                }
                Ok(())
            }
            Mode::Push(target) => {
                lex.push_context(target);
                lex.trace(|| format!("push context '{}'", self.node(target).name()));
                let depth = lex.context_depth();
                while lex.context_depth() == depth {
                    let context = lex.front_context().unwrap();
                    let before = lex.cursor.index();
                    match self.read(context, lex)? {
                        Some(out) => tokens.extend(out),
                        None => {
                            return Err(lex.error(ParseErrorCause::NoViableAlternative {
                                name: self.node(context).name().to_owned(),
                            }))
                        }
                    }
                    // A context that neither consumed nor popped would spin.
                    if lex.context_depth() == depth && lex.cursor.index() == before {
                        return Err(lex.error(ParseErrorCause::NoProgress));
                    }
                }
                Ok(())
            }
        }
    }
}

/// Assembles a [`Lexicon`]. Ids are handed out in insertion order;
/// [`LexiconBuilder::reserve`] + [`LexiconBuilder::fill`] cover recursive
/// graphs, where a node's children include the node itself.
#[derive(Debug, Clone)]
pub struct LexiconBuilder {
    nodes: Vec<Tokenizer>,
    roots: Vec<TokenizerId>,
}

impl LexiconBuilder {
    pub fn new() -> LexiconBuilder {
        LexiconBuilder {
            nodes: Vec::new(),
            roots: Vec::new(),
        }
    }

    pub fn add(&mut self, tokenizer: Tokenizer) -> TokenizerId {
        let id = self.nodes.len();
        self.nodes.push(tokenizer);
        id
    }

    /// Reserve an id to be [`fill`](LexiconBuilder::fill)ed later.
    pub fn reserve(&mut self, name: &str) -> TokenizerId {
        self.add(Tokenizer::Sequence(Sequence::new(
            name,
            Options::new(),
            Vec::new(),
        )))
    }

    pub fn fill(&mut self, id: TokenizerId, tokenizer: Tokenizer) {
        self.nodes[id] = tokenizer;
    }

    pub fn node(&self, id: TokenizerId) -> &Tokenizer {
        &self.nodes[id]
    }

    pub fn leaf(&mut self, name: &str, pattern: Pattern, options: Options) -> TokenizerId {
        self.add(Tokenizer::Leaf(Leaf::new(name, pattern, options)))
    }

    pub fn sequence(
        &mut self,
        name: &str,
        options: Options,
        children: Vec<TokenizerId>,
    ) -> TokenizerId {
        self.add(Tokenizer::Sequence(Sequence::new(name, options, children)))
    }

    pub fn serial_sequence(
        &mut self,
        name: &str,
        options: Options,
        children: Vec<TokenizerId>,
    ) -> TokenizerId {
        self.add(Tokenizer::Sequence(Sequence::serial(name, options, children)))
    }

    pub fn alternation(
        &mut self,
        name: &str,
        options: Options,
        children: Vec<TokenizerId>,
    ) -> TokenizerId {
        self.add(Tokenizer::Alternation(Alternation::new(
            name, options, children,
        )))
    }

    pub fn serial_alternation(
        &mut self,
        name: &str,
        options: Options,
        children: Vec<TokenizerId>,
    ) -> TokenizerId {
        self.add(Tokenizer::Alternation(Alternation::serial(
            name, options, children,
        )))
    }

    pub fn gate(&mut self, name: &str, tester: Pattern, children: Vec<TokenizerId>) -> TokenizerId {
        self.add(Tokenizer::Gate(Gate::new(name, tester, children)))
    }

    /// Append a top-level tokenizer, tried in registration order.
    pub fn root(&mut self, id: TokenizerId) {
        self.roots.push(id);
    }

    pub fn finish(self) -> Lexicon {
        Lexicon {
            nodes: self.nodes,
            roots: self.roots,
        }
    }
}

impl Default for LexiconBuilder {
    fn default() -> LexiconBuilder {
        LexiconBuilder::new()
    }
}
