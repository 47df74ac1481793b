use super::Options;
use crate::driver::Lex;
use crate::error::{ParseError, ParseErrorCause};
use crate::lexicon::{Lexicon, TokenizerId};
use crate::Token;

/// An ordered list of children, matched strictly left to right. The serial
/// form re-reads the whole list while it keeps matching.
///
/// Sequences are where the context queue is worked: a child whose mode is
/// `Push` registers its target context and the queue is drained to completion
/// before the sequence continues with its own children; a `Pop` child removes
/// the front context. A matching [`Gate`](super::Gate) child short-circuits
/// the sequence, its result standing in for the rest.
#[derive(Debug, Clone)]
pub struct Sequence {
    pub name: String,
    pub options: Options,
    pub serial: bool,
    pub children: Vec<TokenizerId>,
}

impl Sequence {
    pub fn new(name: &str, options: Options, children: Vec<TokenizerId>) -> Sequence {
        Sequence {
            name: name.to_owned(),
            options,
            serial: false,
            children,
        }
    }

    pub fn serial(name: &str, options: Options, children: Vec<TokenizerId>) -> Sequence {
        Sequence {
            serial: true,
            ..Sequence::new(name, options, children)
        }
    }

    /// Speculative match. Children are consumed against a saved cursor and
    /// everything — cursor, context queue, trivia — is rolled back before
    /// returning, so two back-to-back `test` calls see the same input.
    ///
    /// A child that is skippable (nullable, or a gate whose lookahead fails)
    /// may fail without failing the sequence. Once at least 80% of the
    /// children have matched the sequence is accepted as a partial match.
    /// That threshold is inherited behavior, kept bit-for-bit; see the
    /// boundary tests before touching it.
    pub(crate) fn test(&self, lexicon: &Lexicon, lex: &mut Lex) -> bool {
        if self.children.is_empty() {
            return false;
        }
        let mark = lex.speculate();
        let verdict = self.test_speculatively(lexicon, lex);
        lex.backtrack(mark);
        verdict
    }

    fn test_speculatively(&self, lexicon: &Lexicon, lex: &mut Lex) -> bool {
        let threshold = (self.children.len() as f64 * 0.8).round() as usize;
        let mut matched = false;
        let mut passed = 0;
        for &child_id in &self.children {
            let child = lexicon.node(child_id);
            if child.options().fragment {
                continue;
            }
            if lexicon.test(child_id, lex) {
                matched = true;
                // Consume speculatively to position the cursor for the next
                // child. An error here just kills the speculation.
                if lexicon.read(child_id, lex).is_err() {
                    return false;
                }
                passed += 1;
                if child.is_gate() {
                    return true;
                }
                if passed >= threshold {
                    return true;
                }
            } else if !(child.options().is_nullable() || child.is_gate()) {
                return false;
            }
        }
        matched
    }

    pub(crate) fn read<'s>(
        &self,
        lexicon: &Lexicon,
        lex: &mut Lex<'s>,
    ) -> Result<Option<Vec<Token>>, ParseError<'s>> {
        if !self.serial {
            return self.read_once(lexicon, lex);
        }
        let mut tokens = Vec::new();
        while self.test(lexicon, lex) {
            let before = lex.cursor.index();
            match self.read_once(lexicon, lex)? {
                Some(out) => tokens.extend(out),
                None => break,
            }
            // A same-position iteration would repeat forever.
            if lex.cursor.index() == before {
                break;
            }
        }
        Ok(Some(tokens))
    }

    fn read_once<'s>(
        &self,
        lexicon: &Lexicon,
        lex: &mut Lex<'s>,
    ) -> Result<Option<Vec<Token>>, ParseError<'s>> {
        let mut tokens = Vec::new();
        lex.enter(&self.name);
        for &child_id in &self.children {
            let child = lexicon.node(child_id);
            if child.options().fragment {
                continue;
            }
            // Leaves go straight to read: a missing non-nullable pattern
            // fails there with the pattern itself in the error. Composite
            // children are probed first so skippable ones cost nothing.
            let result = match child {
                crate::tokenizer::Tokenizer::Leaf(_) => lexicon.read(child_id, lex)?,
                _ => {
                    if lexicon.test(child_id, lex) {
                        lexicon.read(child_id, lex)?
                    } else {
                        None
                    }
                }
            };
            match result {
                Some(out) => {
                    if child.options().ignored {
                        lex.keep_trivia(out);
                    } else {
                        tokens.extend(out);
                    }
                    lexicon.apply_mode(child.options().mode, lex, &mut tokens)?;
                    if child.is_gate() {
                        lex.leave();
                        return Ok(Some(tokens));
                    }
                }
                None => {
                    if !(child.options().is_nullable() || child.is_gate()) {
                        return Err(lex.error(ParseErrorCause::SequenceMismatch {
                            child: child.name().to_owned(),
                            path: lex.path(&self.name),
                        }));
                    }
                }
            }
        }
        lex.leave();
        Ok(Some(tokens))
    }
}
