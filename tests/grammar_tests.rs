use pasteboard::{Grammar, Metadata, Source, TokenStream, TraceSink};

#[track_caller]
fn compile(text: &str) -> Grammar {
    compile_with(text, &Metadata::new())
}

#[track_caller]
fn compile_with(text: &str, metadata: &Metadata) -> Grammar {
    let source = Source::new("grammar.box", text.to_owned());
    match Grammar::compile(&source, metadata) {
        Ok(grammar) => grammar,
        Err(err) => panic!("grammar failed to compile:\n{}", err),
    }
}

#[track_caller]
fn compile_err(text: &str, expected: &str) {
    let source = Source::new("grammar.box", text.to_owned());
    let err = Grammar::compile(&source, &Metadata::new()).unwrap_err();
    let message = err.to_string();
    assert!(message.contains(expected), "unexpected error: {}", message);
}

#[track_caller]
fn tokenize(grammar: &Grammar, input: &str) -> TokenStream {
    let source = Source::new("input", input.to_owned());
    match grammar.tokenize(&source) {
        Ok(stream) => stream,
        Err(err) => panic!("failed to tokenize {:?}:\n{}", input, err),
    }
}

#[track_caller]
fn names(stream: &TokenStream) -> Vec<&str> {
    stream.tokens().iter().map(|token| token.name.as_str()).collect()
}

#[test]
fn a_one_rule_grammar_tokenizes_its_word() {
    let grammar = compile("lexer greeting { word = \"hi\"; }");
    let stream = tokenize(&grammar, "hi");
    assert_eq!(stream.len(), 1);
    assert_eq!(stream.tokens()[0].name, "word");
    assert_eq!(stream.tokens()[0].raw, "hi");
}

#[test]
fn grammar_text_lexes_in_document_order() {
    let source = Source::new("grammar.box", "#comment\nlexer a { x = 'y'; }".to_owned());
    let stream = Grammar::tokenize_document(&source).unwrap();
    assert_eq!(
        names(&stream),
        [
            "header",
            "lexer.keyword",
            "lexer.name",
            "lexer.block.open",
            "expr.name",
            "expr.assign",
            "strings.open",
            "strings.text",
            "strings.close",
            "expr.end",
            "lexer.block.close",
        ]
    );
    assert_eq!(stream.tokens()[0].raw, "#comment");
    assert_eq!(stream.tokens()[2].raw, "a");
    assert_eq!(stream.tokens()[4].raw, "x");
    assert_eq!(stream.reconstruct(), "#comment\nlexer a { x = 'y'; }");
}

#[test]
fn escaped_quotes_stay_unparsed_in_the_token_stream() {
    let text = "lexer s { q = '\\''; }";
    let source = Source::new("grammar.box", text.to_owned());
    let stream = Grammar::tokenize_document(&source).unwrap();
    let escape = stream
        .tokens()
        .iter()
        .find(|token| token.name == "strings.escape")
        .expect("the literal body holds an escape token");
    assert_eq!(escape.raw, "\\'");

    // Compiling resolves the escape: the rule matches a bare quote.
    let grammar = compile(text);
    let stream = tokenize(&grammar, "'");
    assert_eq!(names(&stream), ["q"]);
    assert_eq!(stream.tokens()[0].raw, "'");
}

#[test]
fn grammar_documents_parse_to_syntax_trees() {
    let source = Source::new("grammar.box", "lexer a { x = 'y'; }".to_owned());
    let tree = Grammar::parse_document(&source).unwrap();
    assert_eq!(
        tree.to_string(),
        "(Document (LexerDeclaration keyword=lexer name=a \
         (Expression name=x options=options values=(values (StringLiteral open=' y)))))"
    );
}

#[test]
fn push_and_pop_contexts_come_from_nested_declarations() {
    let mut metadata = Metadata::new();
    metadata.insert("string.text".to_owned(), "[^']+".to_owned());
    let grammar = compile_with(
        "lexer strings {
            lexer body {
                text = @string.text;
                close = \"'\" -> pop;
            }
            open = \"'\" -> push(body);
        }",
        &metadata,
    );

    let stream = tokenize(&grammar, "'abc'");
    assert_eq!(names(&stream), ["open", "text", "close"]);
    assert_eq!(stream.tokens()[1].raw, "abc");
    assert_eq!(stream.reconstruct(), "'abc'");

    // An unterminated body is an error, never a silent truncation.
    let source = Source::new("input", "'abc".to_owned());
    let err = grammar.tokenize(&source).unwrap_err();
    let message = err.to_string();
    assert!(
        message.contains("no viable alternative") || message.contains("missing expected pattern"),
        "unexpected error: {}",
        message
    );
}

#[test]
fn blocks_nest_recursively() {
    let mut metadata = Metadata::new();
    metadata.insert("c.word".to_owned(), "[a-z]+".to_owned());
    let grammar = compile_with(
        "lexer blocks {
            lexer body {
                word = @c.word;
                open = '{' -> push(body);
                close = '}' -> pop;
            }
            enter = '{' -> push(body);
        }",
        &metadata,
    );

    let stream = tokenize(&grammar, "{a{b}c}");
    assert_eq!(
        names(&stream),
        ["enter", "word", "open", "word", "close", "word", "close"]
    );
    assert_eq!(stream.reconstruct(), "{a{b}c}");
}

#[test]
fn conditional_blocks_compile_to_gates() {
    let mut metadata = Metadata::new();
    metadata.insert("c.ws".to_owned(), r"\s+".to_owned());
    metadata.insert("c.quoted".to_owned(), "'[^']*'".to_owned());
    metadata.insert("c.word".to_owned(), "[a-z]+".to_owned());
    let grammar = compile_with(
        "lexer doc {
            ws = @c.ws -> ignore;
            quote = \"'\" -> fragment;
            @if(quote) {
                str = @c.quoted;
            } -> end
            word = @c.word;
        }",
        &metadata,
    );

    let stream = tokenize(&grammar, "'hi' yo");
    assert_eq!(names(&stream), ["str", "word"]);
    assert_eq!(stream.tokens()[0].raw, "'hi'");
    assert_eq!(stream.reconstruct(), "'hi' yo");
}

#[test]
fn fragment_references_stamp_the_pattern() {
    let grammar = compile(
        "lexer f {
            mark = 'x' -> fragment;
            word = mark;
        }",
    );
    let stream = tokenize(&grammar, "x");
    // The fragment itself never emits; the referencing rule does.
    assert_eq!(names(&stream), ["word"]);
}

#[test]
fn multi_value_rules_match_in_order() {
    let grammar = compile("lexer m { pair = 'a', 'b'; }");
    let stream = tokenize(&grammar, "ab");
    assert_eq!(names(&stream), ["pair", "pair"]);
    assert_eq!(stream.tokens()[0].raw, "a");
    assert_eq!(stream.tokens()[1].raw, "b");
}

#[test]
fn duplicate_declarations_are_rejected() {
    compile_err(
        "lexer a { x = 'p'; x = 'q'; }",
        "overloading is not allowed",
    );
    // Shadowing an enclosing scope is overloading too.
    compile_err("lexer a { a = 'p'; }", "overloading is not allowed");
}

#[test]
fn valueless_declarations_are_rejected() {
    compile_err("lexer a { x; }", "has no value");
}

#[test]
fn unresolved_references_are_rejected() {
    compile_err("lexer a { x = missing; }", "unresolved reference 'missing'");
    compile_err("lexer a { x = @no.such; }", "unresolved reference '@no.such'");
}

#[test]
fn tracing_never_changes_the_result() {
    struct Memo(Vec<String>);
    impl TraceSink for Memo {
        fn line(&mut self, text: &str) {
            self.0.push(text.to_owned());
        }
    }

    let grammar = compile("lexer greeting { word = \"hi\"; }");
    let plain = tokenize(&grammar, "hi");
    let source = Source::new("input", "hi".to_owned());
    let mut memo = Memo(Vec::new());
    let traced = grammar.tokenize_traced(&source, &mut memo).unwrap();
    assert_eq!(plain.tokens(), traced.tokens());
    assert!(!memo.0.is_empty());
}
