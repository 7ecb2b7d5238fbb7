//! A YAML 1.1 loader and dumper.
//!
//! Loading runs text through the reader, scanner, parser, composer and
//! constructor; dumping runs native values back through the representer,
//! serializer and emitter. Each stage is exported on its own, and the
//! functions here cover the common entry points:
//!
//! ```
//! let doc = yamlet::load("base: &b {x: 1}\nderived: {<<: *b, y: 2}\n")
//!     .unwrap()
//!     .unwrap();
//! let derived = doc.lookup(doc.root(), "derived").unwrap();
//! assert_eq!(doc.lookup(derived, "x").and_then(|v| v.as_i64()), Some(1));
//!
//! let text = yamlet::dump(&doc, &yamlet::EmitOptions::default()).unwrap();
//! assert!(text.starts_with("base:"));
//! ```
//!
//! Every failure is an [`Error`] carrying the stage it came from and the
//! source positions involved. [`ErrorReport`] renders it as an annotated
//! report over the input.

use std::fmt;

pub use yamlet_emit::{Emitter, EmitOptions, EventSink, LineBreak, Serializer};
pub use yamlet_parse::{
    DEFAULT_TAG_HANDLES, Error, ErrorKind, Event, EventData, EventKind, EventSource, Mark, Parser,
    Reader, Result, ScalarStyle, Scanner, Token, TokenData, TokenKind, TokenSource,
};
pub use yamlet_tree::{
    Composer, ErrorReport, Node, NodeCheck, NodeGraph, NodeId, NodeKind, NodeSource, NodeValue,
    PathElement, PathIndex, PathPosition, Resolver,
};
pub use yamlet_value::{
    Collection, ConstructFn, Constructor, ConstructorRegistry, Document, FillFn, Handle, Key,
    MultiConstructFn, RepresentFn, Representer, RepresenterRegistry, Value, ValueKind,
};

mod dumper;
pub use dumper::Dumper;

mod loader;
pub use loader::Loader;


/// The tokens of `text`.
pub fn scan(text: &str) -> Result<Vec<Token>> {
    Scanner::from_source(text)?.scan_to_vec()
}

/// The events of `text`.
pub fn parse(text: &str) -> Result<Vec<Event>> {
    Parser::from_source(text)?.parse_to_vec()
}

/// The node graph of the only document in `text`.
pub fn compose(text: &str) -> Result<Option<NodeGraph>> {
    Loader::new().compose(text)
}

/// The node graphs of every document in `text`.
pub fn compose_all(text: &str) -> Result<Vec<NodeGraph>> {
    Loader::new().compose_all(text)
}

/// The only document in `text`, or `None` when the stream is empty.
pub fn load(text: &str) -> Result<Option<Document>> {
    Loader::new().load(text)
}

/// Every document in `text`.
pub fn load_all(text: &str) -> Result<Vec<Document>> {
    Loader::new().load_all(text)
}

/// Like [`load`], with a custom constructor.
pub fn load_with(text: &str, constructor: Constructor) -> Result<Option<Document>> {
    Loader::with_parts(Resolver::default(), constructor).load(text)
}

/// Write `events` as text.
pub fn emit(events: impl IntoIterator<Item = Event>, options: &EmitOptions) -> Result<String> {
    let mut out = String::new();
    emit_to(events, &mut out, options)?;
    Ok(out)
}

pub fn emit_to<W: fmt::Write>(
    events: impl IntoIterator<Item = Event>,
    sink: &mut W,
    options: &EmitOptions,
) -> Result<()> {
    let mut emitter = Emitter::new(sink, options);
    for event in events {
        emitter.emit(event)?;
    }
    Ok(())
}

/// Write one node graph as a single-document stream.
pub fn serialize(graph: &NodeGraph, options: &EmitOptions) -> Result<String> {
    Dumper::new(options.clone()).serialize(graph)
}

pub fn serialize_to<W: fmt::Write>(
    graph: &NodeGraph,
    sink: &mut W,
    options: &EmitOptions,
) -> Result<()> {
    Dumper::new(options.clone()).serialize_to(graph, sink)
}

pub fn serialize_all(graphs: &[NodeGraph], options: &EmitOptions) -> Result<String> {
    Dumper::new(options.clone()).serialize_all(graphs)
}

pub fn serialize_all_to<W: fmt::Write>(
    graphs: &[NodeGraph],
    sink: &mut W,
    options: &EmitOptions,
) -> Result<()> {
    Dumper::new(options.clone()).serialize_all_to(graphs, sink)
}

/// Write one document as text.
pub fn dump(document: &Document, options: &EmitOptions) -> Result<String> {
    Dumper::new(options.clone()).dump(document)
}

pub fn dump_to<W: fmt::Write>(
    document: &Document,
    sink: &mut W,
    options: &EmitOptions,
) -> Result<()> {
    Dumper::new(options.clone()).dump_to(document, sink)
}

pub fn dump_all(documents: &[Document], options: &EmitOptions) -> Result<String> {
    Dumper::new(options.clone()).dump_all(documents)
}

pub fn dump_all_to<W: fmt::Write>(
    documents: &[Document],
    sink: &mut W,
    options: &EmitOptions,
) -> Result<()> {
    Dumper::new(options.clone()).dump_all_to(documents, sink)
}
