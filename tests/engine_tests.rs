use pasteboard::{Lexicon, LexiconBuilder, Options, Pattern, Source, TokenStream};

fn regex(text: &str) -> Pattern {
    Pattern::regex(text).unwrap()
}

#[track_caller]
fn tokenize(lexicon: &Lexicon, input: &str) -> TokenStream {
    let source = Source::new("input", input.to_owned());
    match lexicon.tokenize(&source) {
        Ok(stream) => stream,
        Err(err) => panic!("failed to tokenize {:?}:\n{}", input, err),
    }
}

#[track_caller]
fn names(stream: &TokenStream) -> Vec<&str> {
    stream.tokens().iter().map(|token| token.name.as_str()).collect()
}

#[test]
fn leaf_tokens_carry_the_matched_text() {
    let mut b = LexiconBuilder::new();
    let word = b.leaf("word", regex("[a-z]+"), Options::new());
    b.root(word);
    let stream = tokenize(&b.finish(), "abc");

    assert_eq!(stream.len(), 1);
    let token = &stream.tokens()[0];
    assert_eq!(token.name, "word");
    assert_eq!(token.raw, "abc");
    assert_eq!(token.span.range, (0, 3));
    assert_eq!(token.span.start.line, 0);
    assert_eq!(token.span.start.column, 0);
    assert_eq!(token.span.end.column, 3);
}

#[test]
fn ignored_tokens_still_reconstruct_the_source() {
    let mut b = LexiconBuilder::new();
    let ws = b.leaf("ws", regex(r"\s+"), Options::new().ignored());
    let word = b.leaf("word", regex("[a-z]+"), Options::new());
    b.root(ws);
    b.root(word);
    let lexicon = b.finish();
    let stream = tokenize(&lexicon, "one two  three\n");

    assert_eq!(names(&stream), ["word", "word", "word"]);
    assert!(stream.trivia().iter().all(|token| token.name == "ws"));
    assert_eq!(stream.reconstruct(), "one two  three\n");
}

#[test]
fn alternations_commit_to_the_first_match() {
    let mut b = LexiconBuilder::new();
    let keyword = b.leaf("keyword", regex("let"), Options::new());
    let ident = b.leaf("ident", regex("[a-z]+"), Options::new());
    let choice = b.alternation("choice", Options::new(), vec![keyword, ident]);
    b.root(choice);
    let lexicon = b.finish();

    assert_eq!(names(&tokenize(&lexicon, "let")), ["keyword"]);
    assert_eq!(names(&tokenize(&lexicon, "other")), ["ident"]);
}

#[test]
fn gates_probe_their_lookahead_and_short_circuit() {
    let mut b = LexiconBuilder::new();
    let open = b.leaf("open", regex("<"), Options::new());
    let name = b.leaf("name", regex("[a-z]+"), Options::new());
    let close = b.leaf("close", regex(">"), Options::new());
    let tag = b.gate("tag", regex("<"), vec![open, name, close]);
    let word = b.leaf("word", regex("[a-z]+"), Options::new());
    let item = b.sequence("item", Options::new(), vec![tag, word]);
    b.root(item);
    let lexicon = b.finish();

    // A matching gate stands in for the rest of the sequence; a failed
    // lookahead skips the gate without a second thought.
    assert_eq!(names(&tokenize(&lexicon, "<ab>cd")), ["open", "name", "close", "word"]);
    assert_eq!(names(&tokenize(&lexicon, "cd")), ["word"]);
}

fn quoted_lexicon() -> Lexicon {
    let mut b = LexiconBuilder::new();
    let body = {
        let text = b.leaf("text", regex("[^\"]+"), Options::new());
        let content = b.serial_alternation("content", Options::new().nullable(), vec![text]);
        let close = b.leaf("close", regex("\""), Options::new().pop());
        b.sequence("string.body", Options::new(), vec![content, close])
    };
    let open = b.leaf("open", regex("\""), Options::new().push(body));
    let word = b.leaf("word", regex("[a-z]+"), Options::new());
    b.root(open);
    b.root(word);
    b.finish()
}

#[test]
fn push_contexts_switch_the_active_tokenizer() {
    let stream = tokenize(&quoted_lexicon(), "\"ab c\"xy");
    assert_eq!(names(&stream), ["open", "text", "close", "word"]);
    assert_eq!(stream.tokens()[1].raw, "ab c");
    assert_eq!(stream.reconstruct(), "\"ab c\"xy");
}

#[test]
fn unterminated_contexts_fail_instead_of_truncating() {
    let source = Source::new("input", "\"ab".to_owned());
    let err = quoted_lexicon().tokenize(&source).unwrap_err();
    let message = err.to_string();
    assert!(
        message.contains("no viable alternative") || message.contains("missing expected pattern"),
        "unexpected error: {}",
        message
    );
}

#[test]
fn serial_nodes_stop_at_zero_width_matches() {
    let mut b = LexiconBuilder::new();
    let opt = b.leaf("opt", regex("x?"), Options::new());
    let many = b.serial_alternation("many", Options::new().nullable(), vec![opt]);
    let word = b.leaf("word", regex("[a-z]+"), Options::new());
    let item = b.sequence("item", Options::new(), vec![many, word]);
    b.root(item);
    let stream = tokenize(&b.finish(), "xxab");

    // The zero-width round counts as a match but ends the loop.
    assert_eq!(names(&stream), ["opt", "opt", "opt", "word"]);
    assert_eq!(stream.reconstruct(), "xxab");
}

#[test]
fn stalled_passes_fail_instead_of_looping() {
    let mut b = LexiconBuilder::new();
    let maybe = b.leaf("maybe", regex("a*"), Options::new());
    b.root(maybe);
    let source = Source::new("input", "bbb".to_owned());
    let err = b.finish().tokenize(&source).unwrap_err();
    assert!(err.to_string().contains("no progress"));
}

#[test]
fn unmatched_input_is_no_viable_alternative() {
    let mut b = LexiconBuilder::new();
    let word = b.leaf("word", regex("[a-z]+"), Options::new());
    b.root(word);
    let source = Source::new("input", "123".to_owned());
    let err = b.finish().tokenize(&source).unwrap_err();
    assert!(err.to_string().contains("no viable alternative"));
}

#[test]
fn nullable_leaves_decline_without_consuming() {
    let mut b = LexiconBuilder::new();
    let sign = b.leaf("sign", regex("-"), Options::new().nullable());
    let digits = b.leaf("digits", regex("[0-9]+"), Options::new());
    let number = b.sequence("number", Options::new(), vec![sign, digits]);
    b.root(number);
    let lexicon = b.finish();

    assert_eq!(names(&tokenize(&lexicon, "-7")), ["sign", "digits"]);
    assert_eq!(names(&tokenize(&lexicon, "7")), ["digits"]);
}
