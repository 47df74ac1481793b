use super::{Options, Pattern};
use crate::driver::Lex;
use crate::error::{ParseError, ParseErrorCause};
use crate::{Span, Token};

/// A pattern-matching leaf. `test` asks whether the pattern matches at the
/// cursor with zero offset; `read` consumes the match and emits a [`Token`].
#[derive(Debug, Clone)]
pub struct Leaf {
    pub name: String,
    pub pattern: Pattern,
    pub options: Options,
}

impl Leaf {
    pub fn new(name: &str, pattern: Pattern, options: Options) -> Leaf {
        Leaf {
            name: name.to_owned(),
            pattern,
            options,
        }
    }

    pub(crate) fn test(&self, lex: &Lex) -> bool {
        self.pattern.match_len(lex.cursor.remaining()).is_some()
    }

    pub(crate) fn read<'s>(&self, lex: &mut Lex<'s>) -> Result<Option<Token>, ParseError<'s>> {
        match self.pattern.match_len(lex.cursor.remaining()) {
            Some(len) => {
                let start = lex.cursor.location();
                let offset = lex.cursor.index();
                let raw = lex.cursor.advance(len);
                let span = Span::new(start, lex.cursor.location(), (offset, offset + len));
                Ok(Some(Token::new(self.name.clone(), raw, span)))
            }
            None if self.options.is_nullable() => Ok(None),
            None => Err(lex.error(ParseErrorCause::PatternMismatch {
                pattern: self.pattern.as_str().to_owned(),
                path: lex.path(&self.name),
            })),
        }
    }
}
