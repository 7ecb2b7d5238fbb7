//! Native values for YAML documents.
//!
//! A [`Constructor`] turns a composed [`NodeGraph`] into a [`Document`] of
//! [`Value`]s, and a [`Representer`] goes the other way. Collections live in
//! the document's arena and are referred to by [`Handle`], so shared and
//! recursive structures survive both directions.

pub use yamlet_tree::{
    Composer, Error, ErrorKind, Mark, Node, NodeGraph, NodeId, NodeKind, NodeSource, Result,
    ScalarStyle,
};

mod value;
pub use value::{Collection, Document, Handle, Key, Value, ValueKind};

mod constructor;
pub use constructor::{
    ConstructFn, Constructor, ConstructorRegistry, FillFn, MERGE_TAG, MultiConstructFn, VALUE_TAG,
};

mod representer;
pub use representer::{RepresentFn, Representer, RepresenterRegistry};
