use super::Options;
use crate::driver::Lex;
use crate::error::{ParseError, ParseErrorCause};
use crate::lexicon::{Lexicon, TokenizerId};
use crate::Token;

/// An ordered list of alternatives: `test`/`read` try each child in order and
/// commit to the first that matches. There is no backtracking across
/// alternatives once one has matched.
///
/// The serial form keeps reading alternatives while any of them still
/// matches, which is how "zero or more of these rules" blocks are modeled. An
/// empty successful read counts as a match but contributes nothing, and an
/// iteration that consumes no input ends the loop.
#[derive(Debug, Clone)]
pub struct Alternation {
    pub name: String,
    pub options: Options,
    pub serial: bool,
    pub children: Vec<TokenizerId>,
}

impl Alternation {
    pub fn new(name: &str, options: Options, children: Vec<TokenizerId>) -> Alternation {
        Alternation {
            name: name.to_owned(),
            options,
            serial: false,
            children,
        }
    }

    pub fn serial(name: &str, options: Options, children: Vec<TokenizerId>) -> Alternation {
        Alternation {
            serial: true,
            ..Alternation::new(name, options, children)
        }
    }

    pub(crate) fn test(&self, lexicon: &Lexicon, lex: &mut Lex) -> bool {
        self.children.iter().any(|&child_id| {
            !lexicon.node(child_id).options().fragment && lexicon.test(child_id, lex)
        })
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
        for &child_id in &self.children {
            let child = lexicon.node(child_id);
            if child.options().fragment {
                continue;
            }
            if !lexicon.test(child_id, lex) {
                continue;
            }
            let out = match lexicon.read(child_id, lex)? {
                Some(out) => out,
                // A nullable child can decline after a hopeful test; let the
                // later alternatives have a go.
                None => continue,
            };
            let mut tokens = Vec::new();
            if child.options().ignored {
                lex.keep_trivia(out);
            } else {
                tokens.extend(out);
            }
            lexicon.apply_mode(child.options().mode, lex, &mut tokens)?;
            return Ok(Some(tokens));
        }
        if self.options.is_nullable() {
            Ok(None)
        } else {
            Err(lex.error(ParseErrorCause::NoViableAlternative {
                name: lex.path(&self.name),
            }))
        }
    }
}
