use super::*;
use crate::ScalarStyle;
use facet_testhelpers::test;

fn parse(source: &str) -> Vec<Event> {
    Parser::from_source(source)
        .and_then(Parser::parse_to_vec)
        .unwrap_or_else(|err| panic!("parse failed:\n{err}"))
}

fn kinds(source: &str) -> Vec<EventKind> {
    parse(source).iter().map(Event::kind).collect()
}

fn parse_err(source: &str) -> Error {
    match Parser::from_source(source).and_then(Parser::parse_to_vec) {
        Ok(events) => panic!("expected an error, got {events:?}"),
        Err(err) => err,
    }
}

fn scalar_data(event: &Event) -> (Option<&str>, (bool, bool), &str) {
    match &event.data {
        EventData::Scalar {
            tag,
            implicit,
            value,
            ..
        } => (tag.as_deref(), *implicit, value.as_str()),
        other => panic!("expected a scalar, got {other:?}"),
    }
}

use EventKind::*;

#[test]
fn test_empty_stream() {
    assert_eq!(kinds(""), vec![StreamStart, StreamEnd]);
}

#[test]
fn test_implicit_document() {
    let events = parse("a");
    assert_eq!(
        events.iter().map(Event::kind).collect::<Vec<_>>(),
        vec![StreamStart, DocumentStart, Scalar, DocumentEnd, StreamEnd]
    );
    assert_eq!(
        events[1].data,
        EventData::DocumentStart {
            explicit: false,
            version: None,
            tags: None
        }
    );
    assert_eq!(events[3].data, EventData::DocumentEnd { explicit: false });
}

#[test]
fn test_block_mapping_with_sequence_values() {
    assert_eq!(
        kinds("a:\n- 1\n- 2\nb: c"),
        vec![
            StreamStart,
            DocumentStart,
            MappingStart,
            Scalar,
            SequenceStart,
            Scalar,
            Scalar,
            SequenceEnd,
            Scalar,
            Scalar,
            MappingEnd,
            DocumentEnd,
            StreamEnd
        ]
    );
}

#[test]
fn test_empty_values() {
    let events = parse("a:\nb: 1\n? c\n");
    let values: Vec<_> = events
        .iter()
        .filter(|e| e.kind() == Scalar)
        .map(|e| scalar_data(e).2)
        .collect();
    assert_eq!(values, vec!["a", "", "b", "1", "c", ""]);
}

#[test]
fn test_block_sequence_with_empty_entry() {
    let events = parse("- \n- a");
    let values: Vec<_> = events
        .iter()
        .filter(|e| e.kind() == Scalar)
        .map(|e| scalar_data(e).2)
        .collect();
    assert_eq!(values, vec!["", "a"]);
}

#[test]
fn test_flow_sequence_single_pair() {
    assert_eq!(
        kinds("[a: b, c]"),
        vec![
            StreamStart,
            DocumentStart,
            SequenceStart,
            MappingStart,
            Scalar,
            Scalar,
            MappingEnd,
            Scalar,
            SequenceEnd,
            DocumentEnd,
            StreamEnd
        ]
    );
}

#[test]
fn test_flow_mapping_without_values() {
    let events = parse("{a, b: }");
    let values: Vec<_> = events
        .iter()
        .filter(|e| e.kind() == Scalar)
        .map(|e| scalar_data(e).2)
        .collect();
    assert_eq!(values, vec!["a", "", "b", ""]);
}

#[test]
fn test_multiple_documents() {
    let events = parse("--- a\n...\n--- b\n");
    let docs: Vec<_> = events
        .iter()
        .filter_map(|e| match &e.data {
            EventData::DocumentStart { explicit, .. } => Some(("start", *explicit)),
            EventData::DocumentEnd { explicit } => Some(("end", *explicit)),
            _ => None,
        })
        .collect();
    assert_eq!(
        docs,
        vec![("start", true), ("end", true), ("start", true), ("end", false)]
    );
}

#[test]
fn test_empty_explicit_document() {
    let events = parse("---\n...");
    assert_eq!(
        events.iter().map(Event::kind).collect::<Vec<_>>(),
        vec![StreamStart, DocumentStart, Scalar, DocumentEnd, StreamEnd]
    );
    assert_eq!(scalar_data(&events[2]), (None, (true, false), ""));
}

#[test]
fn test_implicit_flags() {
    let events = parse("- plain\n- 'quoted'\n- !!int 3\n- ! bang");
    let scalars: Vec<_> = events
        .iter()
        .filter(|e| e.kind() == Scalar)
        .map(scalar_data)
        .collect();
    assert_eq!(
        scalars,
        vec![
            (None, (true, false), "plain"),
            (None, (false, true), "quoted"),
            (Some("tag:yaml.org,2002:int"), (false, false), "3"),
            (Some("!"), (true, false), "bang"),
        ]
    );
}

#[test]
fn test_scalar_style_is_reported() {
    let events = parse("|\n  text\n");
    match &events[2].data {
        EventData::Scalar { style, .. } => assert_eq!(*style, Some(ScalarStyle::Literal)),
        other => panic!("unexpected {other:?}"),
    }
}

#[test]
fn test_tag_directive_expands_handles() {
    let events = parse("%TAG !e! tag:example.com,2000:app/\n--- !e!foo bar");
    match &events[1].data {
        EventData::DocumentStart { tags, .. } => assert_eq!(
            tags.as_deref(),
            Some(&[("!e!".to_string(), "tag:example.com,2000:app/".to_string())][..])
        ),
        other => panic!("unexpected {other:?}"),
    }
    assert_eq!(
        scalar_data(&events[2]).0,
        Some("tag:example.com,2000:app/foo")
    );
}

#[test]
fn test_tag_handles_reset_between_documents() {
    let err = parse_err("%TAG !e! tag:x,2000:\n--- !e!a 1\n--- !e!b 2\n");
    assert_eq!(err.problem, "found undefined tag handle \"!e!\"");
    assert_eq!(err.context.as_deref(), Some("while parsing a node"));
}

#[test]
fn test_version_directive() {
    let events = parse("%YAML 1.1\n--- a");
    match &events[1].data {
        EventData::DocumentStart { version, .. } => assert_eq!(*version, Some((1, 1))),
        other => panic!("unexpected {other:?}"),
    }
}

#[test]
fn test_duplicate_version_directive() {
    let err = parse_err("%YAML 1.1\n%YAML 1.1\n--- a");
    assert_eq!(err.problem, "found duplicate YAML directive");
}

#[test]
fn test_incompatible_version() {
    let err = parse_err("%YAML 2.0\n--- a");
    assert_eq!(
        err.problem,
        "found incompatible YAML document (version 1.* is required)"
    );
}

#[test]
fn test_directive_without_document_start() {
    let err = parse_err("%YAML 1.1\na");
    assert_eq!(err.problem, "expected '<document start>', but found <scalar>");
}

#[test]
fn test_anchor_and_tag_on_empty_node() {
    let events = parse("a: &x !!str\nb: *x");
    match &events[4].data {
        EventData::Scalar {
            anchor, tag, value, ..
        } => {
            assert_eq!(anchor.as_deref(), Some("x"));
            assert_eq!(tag.as_deref(), Some("tag:yaml.org,2002:str"));
            assert_eq!(value, "");
        }
        other => panic!("unexpected {other:?}"),
    }
    assert_eq!(events[6].data, EventData::Alias { anchor: "x".into() });
}

#[test]
fn test_unclosed_flow_sequence() {
    let err = parse_err("[a, b");
    assert_eq!(err.context.as_deref(), Some("while parsing a flow sequence"));
    assert_eq!(err.problem, "expected ',' or ']', but got <stream end>");
}

#[test]
fn test_unclosed_flow_mapping() {
    let err = parse_err("{a: b");
    assert_eq!(err.context.as_deref(), Some("while parsing a flow mapping"));
    assert_eq!(err.problem, "expected ',' or '}', but got <stream end>");
}

#[test]
fn test_block_mapping_expects_block_end() {
    let err = parse_err("a: 1\n- b");
    assert_eq!(err.context.as_deref(), Some("while parsing a block mapping"));
    assert_eq!(err.problem, "expected <block end>, but found '-'");
}

#[test]
fn test_missing_node_content() {
    let err = parse_err("- ]");
    assert_eq!(err.problem, "expected the node content, but found ']'");
}

#[test]
fn test_check_peek_get() {
    let mut parser = Parser::from_source("a").unwrap();
    assert!(parser.check_event(&[StreamStart]).unwrap());
    assert_eq!(parser.peek_event().unwrap().map(Event::kind), Some(StreamStart));
    assert_eq!(parser.get_event().unwrap().map(|e| e.kind()), Some(StreamStart));
    assert!(parser.check_event(&[]).unwrap());
    assert!(!parser.check_event(&[Scalar]).unwrap());
}
