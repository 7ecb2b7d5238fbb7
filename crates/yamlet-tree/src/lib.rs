//! Node graph representation of YAML documents.
//!
//! The [`Composer`] turns parser events into one [`NodeGraph`] per document,
//! resolving implicit tags with a [`Resolver`] and binding aliases to the
//! nodes their anchors name.

pub use yamlet_parse::{
    Error, ErrorKind, Event, EventData, EventKind, EventSource, Mark, Parser, Result,
    ScalarStyle,
};

mod composer;
pub use composer::{Composer, NodeSource};

mod diagnostic;
pub use diagnostic::ErrorReport;

mod node;
pub use node::{Node, NodeGraph, NodeId, NodeKind, NodeValue};

mod resolver;
pub use resolver::{
    DEFAULT_MAPPING_TAG, DEFAULT_SCALAR_TAG, DEFAULT_SEQUENCE_TAG, NodeCheck, PathElement,
    PathIndex, PathPosition, Resolver,
};

#[cfg(test)]
mod tests;
