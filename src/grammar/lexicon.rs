//! The fixed lexicon for the grammar DSL itself.
//!
//! Hand-assembled, like the scheme bootstrap: this graph is what turns
//!
//! ```text
//! #tokens for tiny strings
//! lexer strings {
//!     open = '"' -> push(body);
//! }
//! ```
//!
//! into the `header` / `lexer.*` / `expr.*` / `if.*` / `strings.*` token
//! stream the document schemes interpret. Quoted string literals are lexed
//! through pushed string-body contexts, so an opening quote switches the
//! active tokenizer until its closer pops back out — the same machinery user
//! grammars get from `-> push(name)` / `-> pop`.

use crate::lexicon::{Lexicon, LexiconBuilder};
use crate::tokenizer::{Options, Pattern, Sequence, Tokenizer};
use once_cell::sync::Lazy;

static GRAMMAR: Lazy<Lexicon> = Lazy::new(build);

pub(super) fn grammar_lexicon() -> &'static Lexicon {
    &GRAMMAR
}

fn pattern(regex: &str) -> Pattern {
    // Fixed patterns; a typo here is a bug in this file.
    Pattern::regex(regex).unwrap()
}

const IDENT: &str = r"[_a-zA-Z]\w*";
const METADATA: &str = r"@[_a-zA-Z]\w*(?:\.[_a-zA-Z]\w*)*";

fn build() -> Lexicon {
    let mut b = LexiconBuilder::new();

    let ws = b.leaf("hidden", pattern(r"\s*"), Options::new().ignored());
    // Required whitespace, e.g. between `lexer` and its name.
    let ws_some = b.leaf("hidden", pattern(r"\s+"), Options::new().ignored());

    // Quoted strings: a gate on the quote character pushes a string-body
    // context; the closing quote pops it. Escapes stay unparsed in the
    // token stream.
    let strings = {
        let sq_body = {
            let text = b.leaf("strings.text", pattern(r"[^\\'\r\n]+"), Options::new());
            let escape = b.leaf("strings.escape", pattern(r#"\\[tbrn"'\\]"#), Options::new());
            let content = b.serial_alternation(
                "strings.body",
                Options::new().nullable(),
                vec![text, escape],
            );
            let close = b.leaf("strings.close", pattern(r"'"), Options::new().pop());
            b.sequence("strings.quoted.body", Options::new(), vec![content, close])
        };
        let sq_open = b.leaf("strings.open", pattern(r"'"), Options::new().push(sq_body));
        let sq = b.gate("strings.quoted", pattern(r"'"), vec![sq_open]);

        let dq_body = {
            let text = b.leaf("strings.text", pattern(r#"[^\\"\r\n]+"#), Options::new());
            let escape = b.leaf("strings.escape", pattern(r#"\\[tbrn"'\\]"#), Options::new());
            let content = b.serial_alternation(
                "strings.body",
                Options::new().nullable(),
                vec![text, escape],
            );
            let close = b.leaf("strings.close", pattern(r#"""#), Options::new().pop());
            b.sequence("strings.double_quoted.body", Options::new(), vec![content, close])
        };
        let dq_open = b.leaf("strings.open", pattern(r#"""#), Options::new().push(dq_body));
        let dq = b.gate("strings.double_quoted", pattern(r#"""#), vec![dq_open]);

        b.sequence("strings", Options::new(), vec![sq, dq])
    };

    let metadata = b.leaf("expr.metadata", pattern(METADATA), Options::new());
    let reference = b.leaf("expr.ref", pattern(IDENT), Options::new());

    // `-> option [, option]*` tails.
    let options_wrapper = {
        let normal = b.leaf("expr.options.normal", pattern("normal"), Options::new());
        let pop = b.leaf("expr.options.pop", pattern("pop"), Options::new());
        let ignore = b.leaf("expr.options.ignore", pattern("ignore"), Options::new());
        let fragment = b.leaf("expr.options.fragment", pattern("fragment"), Options::new());
        let push = {
            let keyword = b.leaf("expr.options.push", pattern("push"), Options::new());
            let open = b.leaf("expr.options.open", pattern(r"\("), Options::new());
            let target = b.leaf("expr.options.target", pattern(IDENT), Options::new());
            let close = b.leaf("expr.options.close", pattern(r"\)"), Options::new());
            b.sequence(
                "expr.options.push",
                Options::new(),
                vec![keyword, ws, open, ws, target, ws, close],
            )
        };
        let choice = b.alternation(
            "expr.options.choice",
            Options::new(),
            vec![normal, push, pop, ignore, fragment],
        );
        let option = b.sequence("expr.option", Options::new(), vec![ws, choice]);
        let comma = b.leaf("expr.options.comma", pattern(","), Options::new());
        let more = b.serial_sequence(
            "expr.options.more",
            Options::new().nullable(),
            vec![comma, option],
        );
        let arrow = b.leaf("expr.options.arrow", pattern(r"->"), Options::new());
        b.sequence(
            "expr.options",
            Options::new().nullable(),
            vec![ws, arrow, ws, option, more],
        )
    };

    // `name = value [, value]* [-> options];` — matching `=` pushes a value
    // context that runs to the terminating `;`.
    let expression = {
        let value_group = b.alternation(
            "expr.value.choice",
            Options::new(),
            vec![strings, metadata, reference],
        );
        let value = b.sequence("expr.value", Options::new(), vec![ws, value_group]);
        let comma = b.leaf("expr.comma", pattern(","), Options::new());
        let more_values = b.serial_sequence(
            "expr.value.more",
            Options::new().nullable(),
            vec![ws, comma, value],
        );
        let end_pop = b.leaf("expr.end", pattern(";"), Options::new().pop());
        let value_context = b.sequence(
            "expr.value.context",
            Options::new(),
            vec![value, more_values, options_wrapper, end_pop],
        );
        let assign = b.leaf("expr.assign", pattern("="), Options::new().push(value_context));
        let assign_gate = b.gate("expr.assign", pattern(r"\s*="), vec![ws, assign]);
        let name = b.leaf("expr.name", pattern(IDENT), Options::new());
        let end = b.leaf("expr.end", pattern(";"), Options::new());
        b.sequence(
            "expr",
            Options::new(),
            vec![name, assign_gate, options_wrapper, end],
        )
    };

    let lexer = b.reserve("lexer");
    let if_stmt = b.reserve("if");

    // `@if(condition) { … } [-> end]`
    {
        let condition = b.alternation(
            "if.condition",
            Options::new(),
            vec![strings, reference, metadata],
        );
        let stop_gate = {
            let arrow = b.leaf("if.stop.arrow", pattern(r"->"), Options::new());
            let end = b.leaf("if.stop", pattern("end"), Options::new());
            b.gate("if.stop", pattern(r"\s*->"), vec![ws, arrow, ws, end])
        };
        let block = {
            let content = b.serial_alternation(
                "if.block.content",
                Options::new().nullable(),
                vec![ws_some, expression, if_stmt],
            );
            let close = b.leaf("if.block.close", pattern(r"\}"), Options::new().pop());
            b.sequence(
                "if.block",
                Options::new(),
                vec![ws, content, ws, close, stop_gate],
            )
        };
        let keyword = b.leaf("if.keyword", pattern("@if"), Options::new());
        let open = b.leaf("if.open", pattern(r"\("), Options::new());
        let close = b.leaf("if.close", pattern(r"\)"), Options::new());
        let block_open = b.leaf("if.block.open", pattern(r"\{"), Options::new().push(block));
        b.fill(
            if_stmt,
            Tokenizer::Sequence(Sequence::new(
                "if",
                Options::new(),
                vec![keyword, ws, open, ws, condition, ws, close, ws, block_open],
            )),
        );
    }

    // `lexer name { … }` — `{` pushes the block context; blocks nest and may
    // contain further lexer declarations, so the graph is recursive.
    {
        let block = {
            let content = b.serial_alternation(
                "lexer.block.content",
                Options::new().nullable(),
                vec![ws_some, lexer, expression, if_stmt],
            );
            let close = b.leaf("lexer.block.close", pattern(r"\}"), Options::new().pop());
            b.sequence("lexer.block", Options::new(), vec![ws, content, ws, close])
        };
        let keyword = b.leaf("lexer.keyword", pattern("lexer"), Options::new());
        let name = b.leaf("lexer.name", pattern(IDENT), Options::new());
        let block_open = b.leaf("lexer.block.open", pattern(r"\{"), Options::new().push(block));
        b.fill(
            lexer,
            Tokenizer::Sequence(Sequence::new(
                "lexer",
                Options::new(),
                vec![keyword, ws_some, name, ws, block_open],
            )),
        );
    }

    let header = b.leaf("header", pattern(r"#[^\r\n]*"), Options::new());

    b.root(ws_some);
    b.root(header);
    b.root(lexer);
    b.finish()
}
