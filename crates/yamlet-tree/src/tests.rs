use super::*;
use facet_testhelpers::test;

fn compose(source: &str) -> NodeGraph {
    Composer::from_source(source)
        .and_then(|mut composer| composer.get_single_node())
        .unwrap_or_else(|err| panic!("compose failed:\n{err}"))
        .expect("a document")
}

fn compose_err(source: &str) -> Error {
    match Composer::from_source(source).and_then(Composer::compose_to_vec) {
        Ok(docs) => panic!("expected an error, got {docs:?}"),
        Err(err) => err,
    }
}

fn root(graph: &NodeGraph) -> &Node {
    graph.root_node().expect("a root")
}

macro_rules! assert_snapshot_stripped {
    ($value:expr, @$snapshot:literal) => {{
        let stripped = String::from_utf8(strip_ansi_escapes::strip(&$value)).unwrap();
        insta::assert_snapshot!(stripped, @$snapshot);
    }};
}

#[test]
fn test_scalar_document() {
    let graph = compose("hello");
    let node = root(&graph);
    assert_eq!(node.tag, DEFAULT_SCALAR_TAG);
    assert_eq!(node.as_scalar(), Some("hello"));
}

#[test]
fn test_empty_stream_has_no_document() {
    let mut composer = Composer::from_source("").unwrap();
    assert!(!composer.check_node().unwrap());
    assert_eq!(composer.get_single_node().unwrap(), None);
}

#[test]
fn test_implicit_tags_are_resolved() {
    let graph = compose("a: 1\nb: true\nc: ~\nd: '1'\ne: 2.5\n");
    let map = graph.root().unwrap();
    let tag_of = |key: &str| graph[graph.lookup(map, key).unwrap()].tag.clone();
    assert_eq!(tag_of("a"), "tag:yaml.org,2002:int");
    assert_eq!(tag_of("b"), "tag:yaml.org,2002:bool");
    assert_eq!(tag_of("c"), "tag:yaml.org,2002:null");
    assert_eq!(tag_of("d"), DEFAULT_SCALAR_TAG);
    assert_eq!(tag_of("e"), "tag:yaml.org,2002:float");
    assert_eq!(root(&graph).tag, DEFAULT_MAPPING_TAG);
}

#[test]
fn test_explicit_tags_win() {
    let graph = compose("- !!str 1\n- !custom x\n- ! 12\n");
    let items = root(&graph).as_sequence().unwrap();
    assert_eq!(graph[items[0]].tag, DEFAULT_SCALAR_TAG);
    assert_eq!(graph[items[1]].tag, "!custom");
    // A lone `!` forces the non-specific tag for the kind.
    assert_eq!(graph[items[2]].tag, DEFAULT_SCALAR_TAG);
}

#[test]
fn test_alias_shares_node() {
    let graph = compose("a: &x [1, 2]\nb: *x\n");
    let map = graph.root().unwrap();
    let a = graph.lookup(map, "a").unwrap();
    let b = graph.lookup(map, "b").unwrap();
    assert_eq!(a, b);
    assert_eq!(graph[a].flow_style, Some(true));
}

#[test]
fn test_recursive_alias() {
    let graph = compose("&a [*a]");
    let root_id = graph.root().unwrap();
    assert_eq!(graph[root_id].as_sequence(), Some(&[root_id][..]));
}

#[test]
fn test_anchors_are_per_document() {
    let err = compose_err("--- &a 1\n--- *a\n");
    assert_eq!(err.kind, ErrorKind::Composer);
    assert_eq!(err.problem, "found undefined alias \"a\"");
}

#[test]
fn test_undefined_alias() {
    let err = compose_err("- *nope");
    assert_eq!(err.problem, "found undefined alias \"nope\"");
    let mark = err.problem_mark.unwrap();
    assert_eq!((mark.line, mark.column), (0, 2));
}

#[test]
fn test_duplicate_anchor() {
    let err = compose_err("a: &x 1\nb: &x 2\n");
    insta::assert_snapshot!(err.to_string(), @r#"
found duplicate anchor "x"; first occurrence
  on line 1, column 4:
    a: &x 1
       ^
second occurrence
  on line 2, column 4:
    b: &x 2
       ^
"#);
}

#[test]
fn test_single_document_required() {
    let err = Composer::from_source("a\n--- b\n")
        .and_then(|mut composer| composer.get_single_node())
        .unwrap_err();
    assert_eq!(
        err.context.as_deref(),
        Some("expected a single document in the stream")
    );
    assert_eq!(err.problem, "but found another document");
    assert_eq!(err.problem_mark.map(|m| m.line), Some(1));
}

#[test]
fn test_multiple_documents() {
    let docs = Composer::from_source("a\n--- [b]\n--- {c: d}\n")
        .and_then(Composer::compose_to_vec)
        .unwrap();
    let kinds: Vec<_> = docs.iter().map(|g| root(g).kind()).collect();
    assert_eq!(
        kinds,
        vec![NodeKind::Scalar, NodeKind::Sequence, NodeKind::Mapping]
    );
}

#[test]
fn test_node_marks() {
    let graph = compose("key:\n  - a\n  - b\n");
    let map = graph.root().unwrap();
    let seq = &graph[graph.lookup(map, "key").unwrap()];
    assert_eq!((seq.start_mark.line, seq.start_mark.column), (1, 2));
    assert_eq!(seq.end_mark.line, 3);
}

#[test]
fn test_scalar_style_is_kept() {
    let graph = compose("- 'a'\n- |\n  b\n");
    let items = root(&graph).as_sequence().unwrap();
    assert_eq!(graph[items[0]].style(), Some(ScalarStyle::SingleQuoted));
    assert_eq!(graph[items[1]].style(), Some(ScalarStyle::Literal));
}

#[test]
fn test_path_resolver_tags_composed_nodes() {
    let mut composer = Composer::from_source("name: bob\nage: 3\nother: x\n").unwrap();
    composer.resolver_mut().add_path_resolver(
        "!person-name",
        vec![PathElement::new(
            NodeCheck::Kind(NodeKind::Mapping),
            PathIndex::MapKey("name".into()),
        )],
        Some(NodeKind::Scalar),
    );
    let graph = composer.get_single_node().unwrap().unwrap();
    let map = graph.root().unwrap();
    assert_eq!(graph[graph.lookup(map, "name").unwrap()].tag, "!person-name");
    assert_eq!(
        graph[graph.lookup(map, "other").unwrap()].tag,
        DEFAULT_SCALAR_TAG
    );
}

#[test]
fn test_parse_errors_pass_through() {
    let err = compose_err("[a, b");
    assert_eq!(err.kind, ErrorKind::Parser);
}

#[test]
fn test_diagnostic_render() {
    let source = "a: &x 1\nb: &x 2\n";
    let err = compose_err(source);
    let rendered = err.render("test.yaml", source);
    let stripped = String::from_utf8(strip_ansi_escapes::strip(&rendered)).unwrap();
    assert!(stripped.contains("composer error: second occurrence"));
    assert!(stripped.contains("test.yaml"));
    assert!(stripped.contains("found duplicate anchor \"x\"; first occurrence"));
}

#[test]
fn test_diagnostic_render_with_note() {
    let source = "[a:b]";
    let err = Parser::from_source(source)
        .and_then(Parser::parse_to_vec)
        .unwrap_err();
    let rendered = err.render("flow.yaml", source);
    let stripped = String::from_utf8(strip_ansi_escapes::strip(&rendered)).unwrap();
    assert!(stripped.contains("scanner error: found unexpected ':'"));
    assert!(stripped.contains("quote the scalar"));
}

#[test]
fn test_error_display_snapshot() {
    let err = compose_err("- *missing\n");
    assert_snapshot_stripped!(err.to_string(), @r#"
found undefined alias "missing"
  on line 1, column 3:
    - *missing
      ^
"#);
}
