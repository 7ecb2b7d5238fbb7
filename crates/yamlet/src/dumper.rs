//! Native values to text.

use std::cell::RefCell;
use std::fmt;

use tracing::debug;
use yamlet_emit::{EmitOptions, Emitter, Serializer};
use yamlet_tree::{NodeGraph, Resolver};
use yamlet_value::{Document, Error, ErrorKind, Representer, Result};

/// The dump pipeline: representer, serializer and emitter.
///
/// Each call streams into a fresh emitter. The representer is shared between
/// calls, so a representer function that dumps through the same dumper while
/// it is running gets an error.
#[derive(Debug)]
pub struct Dumper {
    options: EmitOptions,
    resolver: Resolver,
    representer: RefCell<Representer>,
}

impl Default for Dumper {
    fn default() -> Self {
        Self::new(EmitOptions::default())
    }
}

impl Dumper {
    /// A dumper with the safe representers, styled by `options`.
    pub fn new(options: EmitOptions) -> Self {
        let representer = Representer::new();
        Self::with_representer(options, representer)
    }

    /// `representer` picks up the default styles from `options`.
    pub fn with_representer(options: EmitOptions, representer: Representer) -> Self {
        let representer = representer
            .with_default_style(options.default_style)
            .with_default_flow_style(options.default_flow_style);
        Self {
            options,
            resolver: Resolver::default(),
            representer: RefCell::new(representer),
        }
    }

    pub fn options(&self) -> &EmitOptions {
        &self.options
    }

    /// The resolver that decides which tags the output can leave implicit.
    pub fn resolver_mut(&mut self) -> &mut Resolver {
        &mut self.resolver
    }

    pub fn representer_mut(&mut self) -> &mut Representer {
        self.representer.get_mut()
    }

    /// Write `documents` as one stream.
    pub fn dump_all_to<W: fmt::Write>(&self, documents: &[Document], sink: &mut W) -> Result<()> {
        debug!(documents = documents.len(), "dump");
        let mut representer = self
            .representer
            .try_borrow_mut()
            .map_err(|_| Error::new(ErrorKind::Representer, "dumper is already in use"))?;
        let mut serializer = self.serializer(sink);
        serializer.open()?;
        for document in documents {
            let graph = representer.represent(document)?;
            serialize_graph(&mut serializer, &graph)?;
        }
        serializer.close()
    }

    pub fn dump_to<W: fmt::Write>(&self, document: &Document, sink: &mut W) -> Result<()> {
        self.dump_all_to(std::slice::from_ref(document), sink)
    }

    pub fn dump_all(&self, documents: &[Document]) -> Result<String> {
        let mut out = String::new();
        self.dump_all_to(documents, &mut out)?;
        Ok(out)
    }

    pub fn dump(&self, document: &Document) -> Result<String> {
        let mut out = String::new();
        self.dump_to(document, &mut out)?;
        Ok(out)
    }

    /// Write node graphs as one stream, skipping representation.
    pub fn serialize_all_to<W: fmt::Write>(&self, graphs: &[NodeGraph], sink: &mut W) -> Result<()> {
        debug!(documents = graphs.len(), "serialize");
        let mut serializer = self.serializer(sink);
        serializer.open()?;
        for graph in graphs {
            serialize_graph(&mut serializer, graph)?;
        }
        serializer.close()
    }

    pub fn serialize_to<W: fmt::Write>(&self, graph: &NodeGraph, sink: &mut W) -> Result<()> {
        self.serialize_all_to(std::slice::from_ref(graph), sink)
    }

    pub fn serialize_all(&self, graphs: &[NodeGraph]) -> Result<String> {
        let mut out = String::new();
        self.serialize_all_to(graphs, &mut out)?;
        Ok(out)
    }

    pub fn serialize(&self, graph: &NodeGraph) -> Result<String> {
        let mut out = String::new();
        self.serialize_to(graph, &mut out)?;
        Ok(out)
    }

    fn serializer<'w, W: fmt::Write>(&self, sink: &'w mut W) -> Serializer<Emitter<&'w mut W>> {
        let emitter = Emitter::new(sink, &self.options);
        Serializer::with_resolver(emitter, &self.options, self.resolver.clone())
    }
}

fn serialize_graph<W: fmt::Write>(
    serializer: &mut Serializer<Emitter<&mut W>>,
    graph: &NodeGraph,
) -> Result<()> {
    let Some(root) = graph.root() else {
        return Err(Error::new(
            ErrorKind::Serializer,
            "cannot serialize a node graph without a root",
        ));
    };
    serializer.serialize(graph, root)
}
