use pasteboard::{LexiconBuilder, Options, Pattern, Scheme, SchemeSet, Source, TokenStream};

fn regex(text: &str) -> Pattern {
    Pattern::regex(text).unwrap()
}

/// Tokens for a tiny assignment language: `xs = [1, 2]`.
fn lex(input: &str) -> (Source, TokenStream) {
    let mut b = LexiconBuilder::new();
    let ws = b.leaf("ws", regex(r"\s+"), Options::new().ignored());
    let number = b.leaf("number", regex("[0-9]+"), Options::new());
    let ident = b.leaf("ident", regex("[a-z]+"), Options::new());
    let eq = b.leaf("eq", regex("="), Options::new());
    let comma = b.leaf("comma", regex(","), Options::new());
    let open = b.leaf("list.open", regex(r"\["), Options::new());
    let close = b.leaf("list.close", regex(r"\]"), Options::new());
    for id in [ws, number, ident, eq, comma, open, close] {
        b.root(id);
    }
    let source = Source::new("input", input.to_owned());
    let stream = b.finish().tokenize(&source).expect("test input lexes");
    (source, stream)
}

fn scheme(name: &str, text: &str) -> Scheme {
    let source = Source::new(name, text.to_owned());
    Scheme::compile(name, &source)
        .unwrap_or_else(|err| panic!("scheme '{}' failed to compile:\n{}", name, err))
}

const LIST: &str = "list.open -> ignore @children( number comma -> ignore )* list.close -> ignore";

#[track_caller]
fn assert_interprets(schemes: &SchemeSet, name: &str, input: &str, expected: &str) {
    let (source, stream) = lex(input);
    let tree = schemes
        .get(name)
        .unwrap()
        .interpret_complete(&stream, schemes, &source)
        .unwrap_or_else(|err| panic!("interpreting {:?} failed:\n{}", input, err));
    assert_eq!(tree.to_string(), expected);
}

#[track_caller]
fn assert_rejects(schemes: &SchemeSet, name: &str, input: &str, expected: &str) {
    let (source, stream) = lex(input);
    let err = schemes
        .get(name)
        .unwrap()
        .interpret_complete(&stream, schemes, &source)
        .unwrap_err();
    let message = err.to_string();
    assert!(message.contains(expected), "unexpected error: {}", message);
}

#[test]
fn tokens_bind_into_named_fields() {
    let mut schemes = SchemeSet::new();
    schemes.insert(scheme("Pair", "ident -> $key eq -> ignore number -> $value"));
    assert_interprets(&schemes, "Pair", "a = 1", "(Pair key=a value=1)");
}

#[test]
fn optional_tokens_may_be_absent() {
    let mut schemes = SchemeSet::new();
    schemes.insert(scheme("Pair", "ident -> $key ?eq -> ignore number -> $value"));
    assert_interprets(&schemes, "Pair", "a = 1", "(Pair key=a value=1)");
    assert_interprets(&schemes, "Pair", "a 1", "(Pair key=a value=1)");
}

#[test]
fn groups_splice_into_the_parent() {
    let mut schemes = SchemeSet::new();
    schemes.insert(scheme("List", LIST));
    assert_interprets(&schemes, "List", "[1, 2, 3]", "(List 1 2 3)");
    assert_interprets(&schemes, "List", "[]", "List");
}

#[test]
fn schemes_recurse_through_references() {
    let mut schemes = SchemeSet::new();
    schemes.insert(scheme("Entry", "ident -> $key eq -> ignore !list -> #List"));
    schemes.insert(scheme("List", LIST));
    assert_interprets(&schemes, "Entry", "xs = [4, 5]", "(Entry key=xs (List 4 5))");
}

#[test]
fn prefix_dispatch_routes_by_token_family() {
    let mut schemes = SchemeSet::new();
    schemes.insert(scheme("Doc", "( ident !list -> #List )*"));
    schemes.insert(scheme("List", LIST));
    assert_interprets(&schemes, "Doc", "a [1] b", "(Doc a (List 1) b)");
}

#[test]
fn unknown_scheme_references_are_fatal() {
    let mut schemes = SchemeSet::new();
    schemes.insert(scheme("Entry", "ident -> #Missing"));
    assert_rejects(&schemes, "Entry", "a", "unknown scheme");
}

#[test]
fn empty_required_groups_are_fatal() {
    let mut schemes = SchemeSet::new();
    schemes.insert(scheme("Entry", "( number ident )"));
    assert_rejects(&schemes, "Entry", "=", "no viable alternative");
}

#[test]
fn wrappers_repeat_and_hoist_into_fields() {
    let mut schemes = SchemeSet::new();
    schemes.insert(scheme("Items", "@items[ ident eq -> ignore number ]+"));
    assert_interprets(&schemes, "Items", "a = 1 b = 2", "(Items items=(items a 1 b 2))");
}

#[test]
fn wrappers_fail_fast_mid_sequence() {
    let mut schemes = SchemeSet::new();
    schemes.insert(scheme("Items", "@items[ ident eq -> ignore number ]+"));
    assert_rejects(&schemes, "Items", "a = 1 b", "expected token 'eq'");
}

#[test]
fn leftover_tokens_are_rejected() {
    let mut schemes = SchemeSet::new();
    schemes.insert(scheme("Pair", "ident -> $key eq -> ignore number -> $value"));
    assert_rejects(&schemes, "Pair", "a = 1 2", "end of input");
}

#[test]
fn misplaced_attributes_fail_to_compile() {
    let source = Source::new("Bad", "@x ident".to_owned());
    let err = Scheme::compile("Bad", &source).unwrap_err();
    assert!(err.to_string().contains("must precede"));
}

#[test]
fn unbalanced_schemes_fail_to_compile() {
    let source = Source::new("Bad", "( ident".to_owned());
    assert!(Scheme::compile("Bad", &source).is_err());
}
