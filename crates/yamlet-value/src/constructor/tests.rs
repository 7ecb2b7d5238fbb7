use super::*;
use super::safe::{parse_float, parse_int};
use chrono::{TimeZone, Utc};
use facet_testhelpers::test;
use yamlet_tree::Composer;

fn load_with(mut constructor: Constructor, source: &str) -> Result<Document> {
    let mut composer = Composer::from_source(source)?;
    constructor
        .get_single_data(&mut composer)
        .map(|doc| doc.unwrap_or_default())
}

fn load(source: &str) -> Document {
    load_with(Constructor::new(), source).unwrap_or_else(|err| panic!("load failed:\n{err}"))
}

fn load_err(source: &str) -> Error {
    match load_with(Constructor::new(), source) {
        Ok(doc) => panic!("expected an error, got {doc:?}"),
        Err(err) => err,
    }
}

fn map_entries(doc: &Document, value: &Value) -> Vec<(Value, Value)> {
    match doc.collection(value) {
        Some(Collection::Map(map)) => map
            .iter()
            .map(|(k, v)| (k.value().clone(), v.clone()))
            .collect(),
        other => panic!("expected a map, got {other:?}"),
    }
}

fn s(text: &str) -> Value {
    Value::from(text)
}

#[test]
fn test_scalar_types() {
    let doc = load("- ~\n- yes\n- Off\n- 42\n- 2.5\n- text\n- '12'\n");
    assert_eq!(
        doc.items(doc.root()).unwrap(),
        &[
            Value::Null,
            Value::Bool(true),
            Value::Bool(false),
            Value::Int(42),
            Value::Float(2.5),
            s("text"),
            s("12"),
        ]
    );
}

#[test]
fn test_int_forms() {
    let cases = [
        ("0b101", 5),
        ("0o17", 15),
        ("0x1F", 31),
        ("1:20", 80),
        ("-0x10", -16),
        ("017", 15),
        ("1_000", 1000),
        ("+7", 7),
        ("0", 0),
        ("-0", 0),
        ("190:20:30", 685230),
        ("-9223372036854775808", i64::MIN),
    ];
    for (text, expected) in cases {
        assert_eq!(parse_int(text), Some(expected), "parsing {text:?}");
    }
}

#[test]
fn test_int_overflow_is_error() {
    assert_eq!(parse_int("9223372036854775808"), None);
    let err = load_err("99999999999999999999");
    assert_eq!(err.kind, ErrorKind::Constructor);
    assert_eq!(
        err.problem,
        "could not convert \"99999999999999999999\" to an integer"
    );
}

#[test]
fn test_float_forms() {
    assert_eq!(parse_float("1:30.5"), Some(90.5));
    assert_eq!(parse_float("1_000.5"), Some(1000.5));
    assert_eq!(parse_float("-.inf"), Some(f64::NEG_INFINITY));
    assert_eq!(parse_float(".Inf"), Some(f64::INFINITY));
    assert!(parse_float(".NaN").unwrap().is_nan());
    assert_eq!(parse_float("6.8523015e+5"), Some(685230.15));
    assert_eq!(parse_float("1."), Some(1.0));
}

#[test]
fn test_timestamps() {
    let doc = load("- 2001-12-14t21:59:43.10-05:00\n- 2001-12-14\n- 2001-12-14 21:59:43.10 -5\n- 2001-12-15T02:59:43.1Z\n");
    let expected = Utc.with_ymd_and_hms(2001, 12, 15, 2, 59, 43).unwrap()
        + chrono::TimeDelta::milliseconds(100);
    let midnight = Utc.with_ymd_and_hms(2001, 12, 14, 0, 0, 0).unwrap();
    assert_eq!(
        doc.items(doc.root()).unwrap(),
        &[
            Value::Timestamp(expected),
            Value::Timestamp(midnight),
            Value::Timestamp(expected),
            Value::Timestamp(expected),
        ]
    );
}

#[test]
fn test_timestamp_positive_offset() {
    let doc = load("2001-12-14 21:59:43 +02:30");
    let expected = Utc.with_ymd_and_hms(2001, 12, 14, 19, 29, 43).unwrap();
    assert_eq!(doc.root(), &Value::Timestamp(expected));
}

#[test]
fn test_timestamp_fraction_rounds_to_milliseconds() {
    let doc = load("2001-12-14 21:59:43.1239");
    let expected = Utc.with_ymd_and_hms(2001, 12, 14, 21, 59, 43).unwrap()
        + chrono::TimeDelta::milliseconds(124);
    assert_eq!(doc.root(), &Value::Timestamp(expected));
}

#[test]
fn test_binary() {
    let doc = load("!!binary |\n  aGVsbG8g\n  d29ybGQ=\n");
    assert_eq!(doc.root(), &Value::Binary(b"hello world".to_vec()));
}

#[test]
fn test_bad_binary() {
    let err = load_err("!!binary '*'");
    assert!(err.problem.starts_with("failed to decode base64 data"));
}

#[test]
fn test_merge_key_precedence() {
    let doc = load("{<<: {a: 1, b: 2}, b: 3}");
    assert_eq!(
        map_entries(&doc, doc.root()),
        vec![(s("a"), Value::Int(1)), (s("b"), Value::Int(3))]
    );
}

#[test]
fn test_merge_sequence_earlier_wins() {
    let doc = load(
        "- &a {x: 1, y: 1}\n- &b {y: 2, z: 2}\n- <<: [*a, *b]\n  w: 0\n",
    );
    let items = doc.items(doc.root()).unwrap();
    let merged = map_entries(&doc, &items[2]);
    let lookup = |key: &str| {
        merged
            .iter()
            .find(|(k, _)| k.as_str() == Some(key))
            .map(|(_, v)| v.clone())
    };
    assert_eq!(lookup("x"), Some(Value::Int(1)));
    assert_eq!(lookup("y"), Some(Value::Int(1)));
    assert_eq!(lookup("z"), Some(Value::Int(2)));
    assert_eq!(lookup("w"), Some(Value::Int(0)));
}

#[test]
fn test_nested_merge() {
    let doc = load("base: &b {a: 1}\nmid: &m {<<: *b, c: 2}\ntop: {<<: *m}\n");
    let top = doc.lookup(doc.root(), "top").unwrap();
    assert_eq!(
        map_entries(&doc, top),
        vec![(s("a"), Value::Int(1)), (s("c"), Value::Int(2))]
    );
}

#[test]
fn test_merge_errors() {
    let err = load_err("{<<: [1]}");
    assert_eq!(err.context.as_deref(), Some("while constructing a mapping"));
    assert_eq!(
        err.problem,
        "expected a mapping for merging, but found scalar"
    );

    let err = load_err("{<<: 1}");
    assert_eq!(
        err.problem,
        "expected a mapping or list of mappings for merging but found scalar"
    );
}

#[test]
fn test_self_merge_terminates() {
    let doc = load("&a {<<: *a, k: v}");
    assert_eq!(map_entries(&doc, doc.root()), vec![(s("k"), s("v"))]);
}

#[test]
fn test_value_key() {
    let doc = load("- {=: 1, other: 2}\n- !!int {=: 7}\n");
    let items = doc.items(doc.root()).unwrap();
    assert_eq!(
        map_entries(&doc, &items[0]),
        vec![(s("="), Value::Int(1)), (s("other"), Value::Int(2))]
    );
    assert_eq!(items[1], Value::Int(7));
}

#[test]
fn test_omap_pairs_set() {
    let doc = load(
        "omap: !!omap [b: 1, a: 2]\npairs: !!pairs [a: 1, a: 2]\nset: !!set {x, y}\n",
    );
    let omap = doc.lookup(doc.root(), "omap").unwrap();
    assert_eq!(
        doc.collection(omap),
        Some(&Collection::Omap(vec![
            (s("b"), Value::Int(1)),
            (s("a"), Value::Int(2))
        ]))
    );
    let pairs = doc.lookup(doc.root(), "pairs").unwrap();
    assert_eq!(
        doc.collection(pairs),
        Some(&Collection::Pairs(vec![
            (s("a"), Value::Int(1)),
            (s("a"), Value::Int(2))
        ]))
    );
    let set = doc.lookup(doc.root(), "set").unwrap();
    match doc.collection(set) {
        Some(Collection::Set(members)) => {
            let names: Vec<_> = members.iter().filter_map(|k| k.value().as_str()).collect();
            assert_eq!(names, vec!["x", "y"]);
        }
        other => panic!("expected a set, got {other:?}"),
    }
}

#[test]
fn test_omap_errors() {
    let err = load_err("!!omap {a: 1}");
    assert_eq!(err.context.as_deref(), Some("while constructing an ordered map"));
    assert_eq!(err.problem, "expected a sequence but found mapping");

    let err = load_err("!!pairs [{a: 1, b: 2}]");
    assert_eq!(err.context.as_deref(), Some("while constructing pairs"));
    assert_eq!(err.problem, "expected a mapping of length 1 but found mapping");
}

#[test]
fn test_shared_collections_keep_identity() {
    let doc = load("a: &x [1]\nb: *x\n");
    let a = doc.lookup(doc.root(), "a").unwrap();
    let b = doc.lookup(doc.root(), "b").unwrap();
    assert_eq!(a.as_handle(), b.as_handle());
    assert_eq!(doc.len(), 2);
}

#[test]
fn test_recursive_sequence() {
    let doc = load("&a [1, *a]");
    let items = doc.items(doc.root()).unwrap();
    assert_eq!(items[0], Value::Int(1));
    assert_eq!(items[1].as_handle(), doc.root().as_handle());
}

#[test]
fn test_recursive_mapping() {
    let doc = load("&m {self: *m}");
    assert_eq!(
        doc.lookup(doc.root(), "self").and_then(Value::as_handle),
        doc.root().as_handle()
    );
}

#[test]
fn test_unhashable_key() {
    let err = load_err("? [a]\n: b\n");
    assert_eq!(err.context.as_deref(), Some("while constructing a mapping"));
    assert_eq!(err.problem, "found unhashable key");
}

#[test]
fn test_recursive_scalar_constructor() {
    let err = load_err("&a !!str {=: *a}");
    assert_eq!(err.problem, "found unconstructable recursive node");
}

#[test]
fn test_unknown_tag() {
    let err = load_err("!thing 1");
    assert_eq!(
        err.problem,
        "could not determine a constructor for the tag \"!thing\""
    );
}

#[test]
fn test_base_constructor_builds_by_kind() {
    let doc = load_with(Constructor::base(), "!thing {a: [1, x]}").unwrap();
    let a = doc.lookup(doc.root(), "a").unwrap();
    assert_eq!(doc.items(a).unwrap(), &[s("1"), s("x")]);
}

fn tagged_a(_: &mut Constructor, _: &str, _: &NodeGraph, _: NodeId) -> Result<Value> {
    Ok(Value::from("short"))
}

fn tagged_b(_: &mut Constructor, suffix: &str, _: &NodeGraph, _: NodeId) -> Result<Value> {
    Ok(Value::from(format!("long:{suffix}")))
}

#[test]
fn test_multi_constructor_prefers_longest_prefix() {
    for order in [["!app/", "!app/model/"], ["!app/model/", "!app/"]] {
        let mut constructor = Constructor::new();
        for prefix in order {
            let handler: MultiConstructFn = if prefix == "!app/" { tagged_a } else { tagged_b };
            constructor.registry_mut().add_multi_constructor(prefix, handler);
        }
        let doc = load_with(constructor, "- !app/model/user x\n- !app/other y\n").unwrap();
        assert_eq!(
            doc.items(doc.root()).unwrap(),
            &[s("long:user"), s("short")],
            "registration order {order:?}"
        );
    }
}

fn whole_tag(_: &mut Constructor, tag: &str, _: &NodeGraph, _: NodeId) -> Result<Value> {
    Ok(Value::from(tag))
}

#[test]
fn test_wildcard_multi_constructor_sees_whole_tag() {
    let mut constructor = Constructor::new();
    constructor
        .registry_mut()
        .set_wildcard_multi_constructor(Some(whole_tag));
    let doc = load_with(constructor, "!custom 1").unwrap();
    assert_eq!(doc.root(), &s("!custom"));
}

fn upper(ctx: &mut Constructor, graph: &NodeGraph, id: NodeId) -> Result<Value> {
    Ok(Value::from(ctx.construct_scalar(graph, id)?.to_uppercase()))
}

#[test]
fn test_custom_exact_constructor_overrides() {
    let mut constructor = Constructor::new();
    constructor
        .registry_mut()
        .add_constructor("tag:yaml.org,2002:str", upper);
    let doc = load_with(constructor, "abc").unwrap();
    assert_eq!(doc.root(), &s("ABC"));
}

#[test]
fn test_get_data_walks_documents() {
    let mut composer = Composer::from_source("1\n--- 2\n").unwrap();
    let mut constructor = Constructor::new();
    let mut roots = Vec::new();
    while constructor.check_data(&mut composer).unwrap() {
        let doc = constructor.get_data(&mut composer).unwrap().unwrap();
        roots.push(doc.root().clone());
    }
    assert_eq!(roots, vec![Value::Int(1), Value::Int(2)]);
}

#[test]
fn test_empty_document_is_null() {
    let doc = load("--- \n...\n");
    assert_eq!(doc.root(), &Value::Null);
}
