use super::*;
use facet_testhelpers::test;

fn scan(source: &str) -> Vec<Token> {
    Scanner::from_source(source)
        .and_then(Scanner::scan_to_vec)
        .unwrap_or_else(|err| panic!("scan failed:\n{err}"))
}

fn kinds(source: &str) -> Vec<TokenKind> {
    scan(source).iter().map(Token::kind).collect()
}

fn scan_err(source: &str) -> Error {
    match Scanner::from_source(source).and_then(Scanner::scan_to_vec) {
        Ok(tokens) => panic!("expected an error, got {tokens:?}"),
        Err(err) => err,
    }
}

fn scalars(source: &str) -> Vec<String> {
    scan(source)
        .into_iter()
        .filter_map(|token| match token.data {
            TokenData::Scalar { value, .. } => Some(value),
            _ => None,
        })
        .collect()
}

use TokenKind::*;

#[test]
fn test_empty_stream() {
    assert_eq!(kinds(""), vec![StreamStart, StreamEnd]);
}

#[test]
fn test_block_mapping() {
    assert_eq!(
        kinds("a: 1"),
        vec![
            StreamStart,
            BlockMappingStart,
            Key,
            Scalar,
            Value,
            Scalar,
            BlockEnd,
            StreamEnd
        ]
    );
}

#[test]
fn test_block_sequence() {
    assert_eq!(
        kinds("- a\n- b"),
        vec![
            StreamStart,
            BlockSequenceStart,
            BlockEntry,
            Scalar,
            BlockEntry,
            Scalar,
            BlockEnd,
            StreamEnd
        ]
    );
}

#[test]
fn test_nested_block_mapping() {
    assert_eq!(
        kinds("a:\n  b: c\nd: e"),
        vec![
            StreamStart,
            BlockMappingStart,
            Key,
            Scalar,
            Value,
            BlockMappingStart,
            Key,
            Scalar,
            Value,
            Scalar,
            BlockEnd,
            Key,
            Scalar,
            Value,
            Scalar,
            BlockEnd,
            StreamEnd
        ]
    );
}

#[test]
fn test_flow_collections() {
    assert_eq!(
        kinds("[a, {b: c}]"),
        vec![
            StreamStart,
            FlowSequenceStart,
            Scalar,
            FlowEntry,
            FlowMappingStart,
            Key,
            Scalar,
            Value,
            Scalar,
            FlowMappingEnd,
            FlowSequenceEnd,
            StreamEnd
        ]
    );
}

#[test]
fn test_flow_sequence_as_key() {
    assert_eq!(
        kinds("[a]: b"),
        vec![
            StreamStart,
            BlockMappingStart,
            Key,
            FlowSequenceStart,
            Scalar,
            FlowSequenceEnd,
            Value,
            Scalar,
            BlockEnd,
            StreamEnd
        ]
    );
}

#[test]
fn test_anchor_and_alias() {
    let tokens = scan("&a [*a]");
    assert_eq!(
        tokens.iter().map(Token::kind).collect::<Vec<_>>(),
        vec![
            StreamStart,
            Anchor,
            FlowSequenceStart,
            Alias,
            FlowSequenceEnd,
            StreamEnd
        ]
    );
    assert_eq!(tokens[1].data, TokenData::Anchor("a".into()));
    assert_eq!(tokens[3].data, TokenData::Alias("a".into()));
}

#[test]
fn test_tags() {
    let tag_of = |source: &str| {
        scan(source)
            .into_iter()
            .find_map(|token| match token.data {
                TokenData::Tag { handle, suffix } => Some((handle, suffix)),
                _ => None,
            })
            .unwrap()
    };
    assert_eq!(tag_of("!!str a"), (Some("!!".into()), "str".into()));
    assert_eq!(tag_of("!foo a"), (Some("!".into()), "foo".into()));
    assert_eq!(tag_of("!e!bar a"), (Some("!e!".into()), "bar".into()));
    assert_eq!(tag_of("!<tag:x,2000:y> a"), (None, "tag:x,2000:y".into()));
    assert_eq!(tag_of("! a"), (None, "!".into()));
}

#[test]
fn test_tag_uri_escapes_decode_utf8() {
    let tokens = scan("!e%21x%C3%A9 a");
    assert_eq!(
        tokens[1].data,
        TokenData::Tag {
            handle: Some("!".into()),
            suffix: "e!xé".into()
        }
    );
}

#[test]
fn test_directives() {
    let tokens = scan("%YAML 1.1\n%TAG !e! tag:example.com,2000:\n--- a");
    assert_eq!(
        tokens[1].data,
        TokenData::VersionDirective { major: 1, minor: 1 }
    );
    assert_eq!(
        tokens[2].data,
        TokenData::TagDirective {
            handle: "!e!".into(),
            prefix: "tag:example.com,2000:".into()
        }
    );
    assert_eq!(tokens[3].kind(), DocumentStart);
}

#[test]
fn test_unknown_directive_is_kept_as_reserved() {
    let tokens = scan("%FOO bar baz\n--- a");
    assert_eq!(
        tokens[1].data,
        TokenData::ReservedDirective { name: "FOO".into() }
    );
}

#[test]
fn test_literal_chomping() {
    assert_eq!(scalars("|+\n a\n b\n\n"), vec!["a\nb\n\n"]);
    assert_eq!(scalars("|-\n a\n b\n\n"), vec!["a\nb"]);
    assert_eq!(scalars("|\n a\n b\n\n"), vec!["a\nb\n"]);
}

#[test]
fn test_literal_indentation_indicator() {
    assert_eq!(scalars("|2\n   a\n  b\n"), vec![" a\nb\n"]);
}

#[test]
fn test_folded_scalar() {
    assert_eq!(scalars(">\n a\n b\n\n c\n"), vec!["a b\nc\n"]);
}

#[test]
fn test_folded_keeps_more_indented_lines() {
    assert_eq!(scalars(">\n a\n   b\n c\n"), vec!["a\n  b\nc\n"]);
}

#[test]
fn test_zero_indentation_indicator_is_error() {
    let err = scan_err("|0\n a\n");
    assert_eq!(
        err.problem,
        "expected indentation indicator in the range 1-9, but found 0"
    );
}

#[test]
fn test_double_quoted_escapes() {
    assert_eq!(
        scalars(r#""a\tb\x41\u00e9\N\_\L""#),
        vec!["a\tbAé\u{85}\u{a0}\u{2028}"]
    );
    assert_eq!(scalars(r#""\U0001F600""#), vec!["😀"]);
}

#[test]
fn test_double_quoted_line_folding() {
    assert_eq!(scalars("\"a\n  b\n\n  c\""), vec!["a b\nc"]);
    assert_eq!(scalars("\"a\\\n  b\""), vec!["ab"]);
}

#[test]
fn test_single_quoted() {
    assert_eq!(scalars("'it''s'"), vec!["it's"]);
    assert_eq!(scalars(r"'a\n'"), vec![r"a\n"]);
}

#[test]
fn test_plain_multiline() {
    assert_eq!(scalars("a\n b\n\n c"), vec!["a b\nc"]);
}

#[test]
fn test_plain_with_colons_and_comments() {
    assert_eq!(scalars("url: http://x.org/a # note"), vec!["url", "http://x.org/a"]);
    assert_eq!(scalars("a#b"), vec!["a#b"]);
}

#[test]
fn test_crlf_line_breaks() {
    assert_eq!(scalars("|\r\n a\r\n b\r\n"), vec!["a\nb\n"]);
}

#[test]
fn test_bom_is_skipped() {
    assert_eq!(kinds("\u{FEFF}a"), vec![StreamStart, Scalar, StreamEnd]);
}

#[test]
fn test_marks() {
    let tokens = scan("a:\n  b");
    let b = tokens
        .iter()
        .find(|t| t.data == TokenData::Scalar { value: "b".into(), plain: true, style: ScalarStyle::Plain })
        .unwrap();
    assert_eq!((b.start_mark.line, b.start_mark.column), (1, 2));
    assert_eq!((b.end_mark.line, b.end_mark.column), (1, 3));
}

#[test]
fn test_unknown_escape() {
    let err = scan_err(r#""\q""#);
    assert_eq!(err.kind, ErrorKind::Scanner);
    assert_eq!(err.context.as_deref(), Some("while scanning a double-quoted scalar"));
    assert_eq!(err.problem, "found unknown escape character 'q'");
}

#[test]
fn test_unterminated_quote() {
    let err = scan_err("'abc");
    assert_eq!(err.problem, "found unexpected end of stream");
}

#[test]
fn test_document_separator_in_quoted_scalar() {
    let err = scan_err("'abc\n--- x'");
    assert_eq!(err.problem, "found unexpected document separator");
}

#[test]
fn test_tab_cannot_start_token() {
    let err = scan_err("\tfoo");
    assert!(err.problem.contains("cannot start any token"));
}

#[test]
fn test_required_simple_key() {
    let err = scan_err("a: 1\nb");
    assert_eq!(err.context.as_deref(), Some("while scanning a simple key"));
    assert_eq!(err.problem, "could not find expected ':'");
    let mark = err.context_mark.unwrap();
    assert_eq!((mark.line, mark.column), (1, 0));
}

#[test]
fn test_mapping_values_not_allowed() {
    let err = scan_err("a: b: c");
    assert_eq!(err.problem, "mapping values are not allowed here");
}

#[test]
fn test_sequence_entries_not_allowed() {
    let err = scan_err("a: - b");
    assert_eq!(err.problem, "sequence entries are not allowed here");
}

#[test]
fn test_overlong_simple_key_is_dropped() {
    let source = format!("{}: v", "x".repeat(1100));
    let err = scan_err(&source);
    assert_eq!(err.problem, "mapping values are not allowed here");
}

#[test]
fn test_colon_in_flow_context() {
    let err = scan_err("[a:b]");
    assert_eq!(err.problem, "found unexpected ':'");
    assert!(err.note.unwrap().contains("quote the scalar"));
}

#[test]
fn test_check_and_peek() {
    let mut scanner = Scanner::from_source("- a").unwrap();
    assert!(scanner.check_token(&[StreamStart]).unwrap());
    assert!(scanner.check_token(&[]).unwrap());
    assert_eq!(scanner.peek_token().unwrap().map(Token::kind), Some(StreamStart));
    scanner.get_token().unwrap();
    assert!(scanner.check_token(&[BlockSequenceStart, BlockMappingStart]).unwrap());
    assert!(!scanner.check_token(&[Scalar]).unwrap());
}

#[test]
fn test_iterator_stops_after_error() {
    let results: Vec<_> = Scanner::from_source("a: b: c").unwrap().collect();
    assert!(results.last().unwrap().is_err());
    assert_eq!(results.iter().filter(|r| r.is_err()).count(), 1);
}
