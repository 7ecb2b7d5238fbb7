//! Builds node graphs from an event stream.

use std::collections::HashMap;

use tracing::{debug, trace};

use crate::{
    Error, ErrorKind, EventData, EventKind, EventSource, Mark, Node, NodeGraph, NodeId, NodeKind,
    NodeValue, Parser, PathPosition, Resolver, Result,
};

/// Pull protocol over a stream of composed documents.
pub trait NodeSource {
    /// Whether another document is available.
    fn check_node(&mut self) -> Result<bool>;

    /// Compose the next document, or `None` at the end of the stream.
    fn get_node(&mut self) -> Result<Option<NodeGraph>>;

    /// Compose the only document of the stream.
    ///
    /// Fails if the stream holds more than one document. Returns `None` for an
    /// empty stream.
    fn get_single_node(&mut self) -> Result<Option<NodeGraph>>;
}

/// Where a node being composed sits in its parent.
#[derive(Debug, Clone, Copy)]
enum Slot {
    Root,
    Key(NodeId),
    Value(NodeId, NodeId),
    Item(NodeId, usize),
}

/// Composes documents from parser events, resolving tags and linking
/// aliases to their anchored nodes.
pub struct Composer<P = Parser> {
    parser: P,
    resolver: Resolver,
    /// Anchors of the document being composed.
    anchors: HashMap<String, NodeId>,
}

impl Composer<Parser> {
    /// Create a composer over source text with the default resolver.
    pub fn from_source(source: &str) -> Result<Self> {
        Ok(Self::new(Parser::from_source(source)?, Resolver::default()))
    }
}

impl<P: EventSource> Composer<P> {
    pub fn new(parser: P, resolver: Resolver) -> Self {
        Self {
            parser,
            resolver,
            anchors: HashMap::new(),
        }
    }

    /// The resolver used for untagged nodes.
    pub fn resolver_mut(&mut self) -> &mut Resolver {
        &mut self.resolver
    }

    /// Compose every remaining document.
    pub fn compose_to_vec(mut self) -> Result<Vec<NodeGraph>> {
        let mut documents = Vec::new();
        while let Some(document) = self.get_node()? {
            documents.push(document);
        }
        Ok(documents)
    }

    fn next_event(&mut self) -> Result<crate::Event> {
        self.parser.get_event()?.ok_or_else(|| {
            Error::new(ErrorKind::Composer, "found unexpected end of the event stream")
        })
    }

    fn skip_stream_start(&mut self) -> Result<()> {
        if self.parser.check_event(&[EventKind::StreamStart])? {
            self.parser.get_event()?;
        }
        Ok(())
    }

    fn at_stream_end(&mut self) -> Result<bool> {
        Ok(self.parser.check_event(&[EventKind::StreamEnd])?
            || !self.parser.check_event(&[])?)
    }

    fn compose_document(&mut self) -> Result<NodeGraph> {
        let start = self.next_event()?;
        debug!(line = start.start_mark.line, "composing document");
        let mut graph = NodeGraph::new();
        let root = self.compose_node(&mut graph, Slot::Root)?;
        graph.set_root(root);
        let end = self.next_event()?;
        trace!(nodes = graph.len(), line = end.end_mark.line, "document composed");
        self.anchors.clear();
        Ok(graph)
    }

    fn compose_node(&mut self, graph: &mut NodeGraph, slot: Slot) -> Result<NodeId> {
        if self.parser.check_event(&[EventKind::Alias])? {
            let event = self.next_event()?;
            let anchor = event.anchor().unwrap_or_default();
            return self.anchors.get(anchor).copied().ok_or_else(|| {
                Error::new(
                    ErrorKind::Composer,
                    format!("found undefined alias {anchor:?}"),
                )
                .with_mark(event.start_mark.clone())
            });
        }

        let (anchor, start_mark) = match self.parser.peek_event()? {
            Some(event) => (event.anchor().map(str::to_string), event.start_mark.clone()),
            None => {
                return Err(Error::new(
                    ErrorKind::Composer,
                    "found unexpected end of the event stream",
                ));
            }
        };
        if let Some(anchor) = &anchor
            && let Some(first) = self.anchors.get(anchor)
        {
            return Err(Error::new(ErrorKind::Composer, "second occurrence")
                .with_context(
                    format!("found duplicate anchor {anchor:?}; first occurrence"),
                    graph[*first].start_mark.clone(),
                )
                .with_mark(start_mark));
        }

        self.descend(graph, slot);
        let node = if self.parser.check_event(&[EventKind::Scalar])? {
            self.compose_scalar_node(graph, anchor)
        } else if self.parser.check_event(&[EventKind::SequenceStart])? {
            self.compose_sequence_node(graph, anchor)
        } else if self.parser.check_event(&[EventKind::MappingStart])? {
            self.compose_mapping_node(graph, anchor)
        } else {
            let event = self.next_event()?;
            Err(Error::new(
                ErrorKind::Composer,
                format!("expected a node, but found {}", event.kind()),
            )
            .with_mark(event.start_mark))
        };
        self.resolver.ascend_resolver();
        node
    }

    fn descend(&mut self, graph: &NodeGraph, slot: Slot) {
        let parent = match slot {
            Slot::Root => None,
            Slot::Key(parent) => Some((&graph[parent], PathPosition::Key)),
            Slot::Value(parent, key) => Some((
                &graph[parent],
                PathPosition::Value(graph[key].as_scalar()),
            )),
            Slot::Item(parent, index) => Some((&graph[parent], PathPosition::Item(index))),
        };
        self.resolver.descend_resolver(parent);
    }

    fn register_anchor(&mut self, anchor: Option<String>, id: NodeId) {
        if let Some(anchor) = anchor {
            self.anchors.insert(anchor, id);
        }
    }

    fn compose_scalar_node(
        &mut self,
        graph: &mut NodeGraph,
        anchor: Option<String>,
    ) -> Result<NodeId> {
        let event = self.next_event()?;
        let EventData::Scalar {
            tag,
            implicit,
            value,
            style,
            ..
        } = event.data
        else {
            unreachable!("checked for a scalar event");
        };
        let tag = match tag {
            Some(tag) if tag != "!" => tag,
            _ => self
                .resolver
                .resolve(NodeKind::Scalar, Some(&value), implicit),
        };
        let node = Node {
            tag,
            value: NodeValue::Scalar { value, style },
            flow_style: None,
            start_mark: event.start_mark,
            end_mark: event.end_mark,
        };
        let id = graph.add(node);
        self.register_anchor(anchor, id);
        Ok(id)
    }

    fn compose_sequence_node(
        &mut self,
        graph: &mut NodeGraph,
        anchor: Option<String>,
    ) -> Result<NodeId> {
        let start = self.next_event()?;
        let EventData::SequenceStart {
            tag,
            implicit,
            flow_style,
            ..
        } = start.data
        else {
            unreachable!("checked for a sequence start event");
        };
        let tag = self.collection_tag(tag, NodeKind::Sequence, implicit);
        let id = graph.add(
            Node::sequence(tag)
                .with_flow_style(flow_style)
                .with_marks(start.start_mark, Mark::default()),
        );
        // Anchored before the children so that they can refer back to it.
        self.register_anchor(anchor, id);
        let mut index = 0;
        while !self.parser.check_event(&[EventKind::SequenceEnd])? {
            let item = self.compose_node(graph, Slot::Item(id, index))?;
            graph.push_item(id, item);
            index += 1;
        }
        let end = self.next_event()?;
        if let Some(node) = graph.get_mut(id) {
            node.end_mark = end.end_mark;
        }
        Ok(id)
    }

    fn compose_mapping_node(
        &mut self,
        graph: &mut NodeGraph,
        anchor: Option<String>,
    ) -> Result<NodeId> {
        let start = self.next_event()?;
        let EventData::MappingStart {
            tag,
            implicit,
            flow_style,
            ..
        } = start.data
        else {
            unreachable!("checked for a mapping start event");
        };
        let tag = self.collection_tag(tag, NodeKind::Mapping, implicit);
        let id = graph.add(
            Node::mapping(tag)
                .with_flow_style(flow_style)
                .with_marks(start.start_mark, Mark::default()),
        );
        self.register_anchor(anchor, id);
        while !self.parser.check_event(&[EventKind::MappingEnd])? {
            let key = self.compose_node(graph, Slot::Key(id))?;
            let value = self.compose_node(graph, Slot::Value(id, key))?;
            graph.push_pair(id, key, value);
        }
        let end = self.next_event()?;
        if let Some(node) = graph.get_mut(id) {
            node.end_mark = end.end_mark;
        }
        Ok(id)
    }

    fn collection_tag(&self, tag: Option<String>, kind: NodeKind, implicit: bool) -> String {
        match tag {
            Some(tag) if tag != "!" => tag,
            _ => self.resolver.resolve(kind, None, (implicit, false)),
        }
    }
}

impl<P: EventSource> NodeSource for Composer<P> {
    fn check_node(&mut self) -> Result<bool> {
        self.skip_stream_start()?;
        Ok(!self.at_stream_end()?)
    }

    fn get_node(&mut self) -> Result<Option<NodeGraph>> {
        self.skip_stream_start()?;
        if self.at_stream_end()? {
            return Ok(None);
        }
        self.compose_document().map(Some)
    }

    fn get_single_node(&mut self) -> Result<Option<NodeGraph>> {
        self.skip_stream_start()?;
        let document = if self.at_stream_end()? {
            None
        } else {
            Some(self.compose_document()?)
        };
        if !self.at_stream_end()? {
            let event = self.next_event()?;
            let mut err = Error::new(ErrorKind::Composer, "but found another document")
                .with_mark(event.start_mark);
            let first = document
                .as_ref()
                .and_then(NodeGraph::root_node)
                .map(|root| root.start_mark.clone())
                .unwrap_or_default();
            err = err.with_context("expected a single document in the stream", first);
            return Err(err);
        }
        self.parser.get_event()?;
        Ok(document)
    }
}

impl<P: EventSource> Iterator for Composer<P> {
    type Item = Result<NodeGraph>;

    fn next(&mut self) -> Option<Self::Item> {
        self.get_node().transpose()
    }
}
