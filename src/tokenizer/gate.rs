use super::{Options, Pattern, Sequence};
use crate::driver::Lex;
use crate::error::ParseError;
use crate::lexicon::{Lexicon, TokenizerId};
use crate::Token;

/// A lookahead-conditioned optional branch: a cheap tester pattern guards a
/// sequence body. `test` succeeds only when both the lookahead and the body
/// match, so a gate whose distinguishing prefix is absent costs one pattern
/// probe and nothing else.
///
/// Inside a sequence a gate is skippable when its lookahead fails, and a
/// matching gate ends the sequence with the gate's own result (see
/// [`Sequence`]). Used for constructs keyed by a leading character: is this a
/// quoted string, a metadata reference, or a bare identifier?
#[derive(Debug, Clone)]
pub struct Gate {
    pub name: String,
    pub options: Options,
    pub tester: Pattern,
    pub body: Sequence,
}

impl Gate {
    pub fn new(name: &str, tester: Pattern, children: Vec<TokenizerId>) -> Gate {
        Gate {
            name: name.to_owned(),
            options: Options::new(),
            tester,
            body: Sequence::new(name, Options::new(), children),
        }
    }

    pub(crate) fn test(&self, lexicon: &Lexicon, lex: &mut Lex) -> bool {
        self.tester.match_len(lex.cursor.remaining()).is_some() && self.body.test(lexicon, lex)
    }

    pub(crate) fn read<'s>(
        &self,
        lexicon: &Lexicon,
        lex: &mut Lex<'s>,
    ) -> Result<Option<Vec<Token>>, ParseError<'s>> {
        self.body.read(lexicon, lex)
    }
}
