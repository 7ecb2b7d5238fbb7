//! Node graphs to events.

use std::collections::{HashMap, HashSet};

use tracing::{debug, trace};
use yamlet_tree::{
    Error, ErrorKind, Event, EventData, NodeGraph, NodeId, NodeKind, NodeValue, PathPosition,
    Resolver, Result,
};

use crate::{EmitOptions, EventSink};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Fresh,
    Open,
    Closed,
}

/// Turns node graphs into events for an [`EventSink`].
///
/// Nodes reachable more than once within a document get an anchor of the
/// form `id0001` on their first appearance and an alias on every later one.
#[derive(Debug)]
pub struct Serializer<S> {
    sink: S,
    resolver: Resolver,
    explicit_start: bool,
    explicit_end: bool,
    version: Option<(u32, u32)>,
    tags: Option<Vec<(String, String)>>,
    phase: Phase,
    serialized: HashSet<NodeId>,
    anchors: HashMap<NodeId, Option<String>>,
    last_anchor_id: u32,
}

impl<S: EventSink> Serializer<S> {
    pub fn new(sink: S, options: &EmitOptions) -> Self {
        Self::with_resolver(sink, options, Resolver::default())
    }

    /// The resolver decides which tags can be left implicit.
    pub fn with_resolver(sink: S, options: &EmitOptions, resolver: Resolver) -> Self {
        Self {
            sink,
            resolver,
            explicit_start: options.explicit_start,
            explicit_end: options.explicit_end,
            version: options.version,
            tags: options.tags.clone(),
            phase: Phase::Fresh,
            serialized: HashSet::new(),
            anchors: HashMap::new(),
            last_anchor_id: 0,
        }
    }

    pub fn into_inner(self) -> S {
        self.sink
    }

    /// Start the stream.
    pub fn open(&mut self) -> Result<()> {
        match self.phase {
            Phase::Fresh => {
                debug!("serializer open");
                self.sink.emit(Event::stream_start())?;
                self.phase = Phase::Open;
                Ok(())
            }
            Phase::Open => Err(serializer_error("serializer is already opened")),
            Phase::Closed => Err(serializer_error("serializer is closed")),
        }
    }

    /// End the stream. Closing twice is a no-op.
    pub fn close(&mut self) -> Result<()> {
        match self.phase {
            Phase::Fresh => Err(serializer_error("serializer is not opened")),
            Phase::Open => {
                debug!("serializer close");
                self.sink.emit(Event::stream_end())?;
                self.phase = Phase::Closed;
                Ok(())
            }
            Phase::Closed => Ok(()),
        }
    }

    /// Write one document whose root is `root`.
    pub fn serialize(&mut self, graph: &NodeGraph, root: NodeId) -> Result<()> {
        match self.phase {
            Phase::Fresh => return Err(serializer_error("serializer is not opened")),
            Phase::Closed => return Err(serializer_error("serializer is closed")),
            Phase::Open => {}
        }
        self.sink.emit(Event::unmarked(EventData::DocumentStart {
            explicit: self.explicit_start,
            version: self.version,
            tags: self.tags.clone(),
        }))?;
        self.anchor_node(graph, root);
        let result = self.serialize_node(graph, root, None);
        self.serialized.clear();
        self.anchors.clear();
        self.last_anchor_id = 0;
        result?;
        self.sink.emit(Event::document_end(self.explicit_end))?;
        trace!(nodes = graph.len(), "document serialized");
        Ok(())
    }

    /// First pass: find the nodes reached more than once.
    fn anchor_node(&mut self, graph: &NodeGraph, root: NodeId) {
        let mut pending = vec![root];
        while let Some(id) = pending.pop() {
            if let Some(anchor) = self.anchors.get_mut(&id) {
                if anchor.is_none() {
                    self.last_anchor_id += 1;
                    *anchor = Some(format!("id{:04}", self.last_anchor_id));
                }
                continue;
            }
            self.anchors.insert(id, None);
            // Children are pushed in reverse so anchors number in document order.
            match &graph[id].value {
                NodeValue::Scalar { .. } => {}
                NodeValue::Sequence(items) => pending.extend(items.iter().rev()),
                NodeValue::Mapping(pairs) => {
                    for (key, value) in pairs.iter().rev() {
                        pending.push(*value);
                        pending.push(*key);
                    }
                }
            }
        }
    }

    fn serialize_node(
        &mut self,
        graph: &NodeGraph,
        id: NodeId,
        parent: Option<(NodeId, PathPosition<'_>)>,
    ) -> Result<()> {
        let anchor = self.anchors.get(&id).cloned().flatten();
        if !self.serialized.insert(id) {
            let Some(anchor) = anchor else {
                return Err(serializer_error("node serialized twice without an anchor"));
            };
            return self.sink.emit(Event::alias(anchor));
        }
        self.resolver
            .descend_resolver(parent.map(|(parent, position)| (&graph[parent], position)));
        let result = self.serialize_content(graph, id, anchor);
        self.resolver.ascend_resolver();
        result
    }

    fn serialize_content(
        &mut self,
        graph: &NodeGraph,
        id: NodeId,
        anchor: Option<String>,
    ) -> Result<()> {
        let node = &graph[id];
        match &node.value {
            NodeValue::Scalar { value, style } => {
                let detected = self
                    .resolver
                    .resolve(NodeKind::Scalar, Some(value), (true, false));
                let default = self
                    .resolver
                    .resolve(NodeKind::Scalar, Some(value), (false, true));
                self.sink.emit(Event::unmarked(EventData::Scalar {
                    anchor,
                    tag: Some(node.tag.clone()),
                    implicit: (node.tag == detected, node.tag == default),
                    value: value.clone(),
                    style: *style,
                }))
            }
            NodeValue::Sequence(items) => {
                let implicit = node.tag == self.resolver.resolve(NodeKind::Sequence, None, (true, false));
                self.sink.emit(Event::unmarked(EventData::SequenceStart {
                    anchor,
                    tag: Some(node.tag.clone()),
                    implicit,
                    flow_style: node.flow_style,
                }))?;
                for (index, item) in items.iter().enumerate() {
                    self.serialize_node(graph, *item, Some((id, PathPosition::Item(index))))?;
                }
                self.sink.emit(Event::sequence_end())
            }
            NodeValue::Mapping(pairs) => {
                let implicit = node.tag == self.resolver.resolve(NodeKind::Mapping, None, (true, false));
                self.sink.emit(Event::unmarked(EventData::MappingStart {
                    anchor,
                    tag: Some(node.tag.clone()),
                    implicit,
                    flow_style: node.flow_style,
                }))?;
                for (key, value) in pairs {
                    self.serialize_node(graph, *key, Some((id, PathPosition::Key)))?;
                    let key_text = graph[*key].as_scalar();
                    self.serialize_node(graph, *value, Some((id, PathPosition::Value(key_text))))?;
                }
                self.sink.emit(Event::mapping_end())
            }
        }
    }
}

fn serializer_error(problem: &str) -> Error {
    Error::new(ErrorKind::Serializer, problem)
}

#[cfg(test)]
mod tests {
    use super::*;
    use facet_testhelpers::test;
    use yamlet_tree::{Node, ScalarStyle};

    /// Collects events instead of writing text.
    #[derive(Default)]
    struct Recorder(Vec<Event>);

    impl EventSink for Recorder {
        fn emit(&mut self, event: Event) -> Result<()> {
            self.0.push(event);
            Ok(())
        }
    }

    fn serialize_one(graph: &NodeGraph) -> Vec<EventData> {
        let mut serializer = Serializer::new(Recorder::default(), &EmitOptions::default());
        serializer.open().unwrap();
        serializer.serialize(graph, graph.root().unwrap()).unwrap();
        serializer.close().unwrap();
        serializer
            .into_inner()
            .0
            .into_iter()
            .map(|event| event.data)
            .collect()
    }

    const STR: &str = "tag:yaml.org,2002:str";
    const INT: &str = "tag:yaml.org,2002:int";
    const SEQ: &str = "tag:yaml.org,2002:seq";

    #[test]
    fn test_implicit_flags() {
        let mut graph = NodeGraph::new();
        let root = graph.add(Node::sequence(SEQ));
        let number = graph.add(Node::scalar(INT, "12"));
        let text = graph.add(Node::scalar(STR, "12"));
        let plain = graph.add(Node::scalar(STR, "hello"));
        for item in [number, text, plain] {
            graph.push_item(root, item);
        }
        graph.set_root(root);

        let implicits: Vec<_> = serialize_one(&graph)
            .into_iter()
            .filter_map(|data| match data {
                EventData::Scalar { implicit, .. } => Some(implicit),
                EventData::SequenceStart { implicit, .. } => Some((implicit, implicit)),
                _ => None,
            })
            .collect();
        assert_eq!(
            implicits,
            vec![(true, true), (true, false), (false, true), (true, true)]
        );
    }

    #[test]
    fn test_shared_node_gets_anchor() {
        let mut graph = NodeGraph::new();
        let root = graph.add(Node::sequence(SEQ));
        let shared = graph.add(Node::sequence(SEQ));
        let leaf = graph.add(Node::scalar(STR, "x"));
        graph.push_item(shared, leaf);
        graph.push_item(root, shared);
        graph.push_item(root, shared);
        graph.set_root(root);

        let events = serialize_one(&graph);
        let anchors: Vec<_> = events
            .iter()
            .filter_map(|data| match data {
                EventData::SequenceStart { anchor, .. } => Some(anchor.clone()),
                EventData::Alias { anchor } => Some(Some(format!("*{anchor}"))),
                _ => None,
            })
            .collect();
        assert_eq!(
            anchors,
            vec![None, Some("id0001".to_string()), Some("*id0001".to_string())]
        );
    }

    #[test]
    fn test_recursive_node() {
        let mut graph = NodeGraph::new();
        let root = graph.add(Node::sequence(SEQ));
        graph.push_item(root, root);
        graph.set_root(root);

        let events = serialize_one(&graph);
        assert!(matches!(
            &events[2],
            EventData::SequenceStart { anchor: Some(a), .. } if a == "id0001"
        ));
        assert_eq!(
            events[3],
            EventData::Alias {
                anchor: "id0001".to_string()
            }
        );
    }

    #[test]
    fn test_anchors_restart_per_document() {
        let mut graph = NodeGraph::new();
        let root = graph.add(Node::sequence(SEQ));
        graph.push_item(root, root);
        graph.set_root(root);

        let mut serializer = Serializer::new(Recorder::default(), &EmitOptions::default());
        serializer.open().unwrap();
        serializer.serialize(&graph, root).unwrap();
        serializer.serialize(&graph, root).unwrap();
        serializer.close().unwrap();
        let anchors: Vec<_> = serializer
            .into_inner()
            .0
            .into_iter()
            .filter_map(|event| match event.data {
                EventData::SequenceStart { anchor, .. } => anchor,
                _ => None,
            })
            .collect();
        assert_eq!(anchors, vec!["id0001".to_string(), "id0001".to_string()]);
    }

    #[test]
    fn test_scalar_style_passes_through() {
        let mut graph = NodeGraph::new();
        let root = graph.add(Node::scalar(STR, "x").with_style(Some(ScalarStyle::Literal)));
        graph.set_root(root);
        let events = serialize_one(&graph);
        assert!(matches!(
            &events[2],
            EventData::Scalar { style: Some(ScalarStyle::Literal), .. }
        ));
    }

    #[test]
    fn test_document_options() {
        let options = EmitOptions::new()
            .explicit_start(true)
            .explicit_end(true)
            .version(1, 1);
        let mut graph = NodeGraph::new();
        let root = graph.add(Node::scalar(STR, "x"));
        graph.set_root(root);

        let mut serializer = Serializer::new(Recorder::default(), &options);
        serializer.open().unwrap();
        serializer.serialize(&graph, root).unwrap();
        let events = serializer.into_inner().0;
        assert_eq!(
            events[1].data,
            EventData::DocumentStart {
                explicit: true,
                version: Some((1, 1)),
                tags: None,
            }
        );
        assert_eq!(events[3].data, EventData::DocumentEnd { explicit: true });
    }

    #[test]
    fn test_lifecycle_errors() {
        let mut graph = NodeGraph::new();
        let root = graph.add(Node::scalar(STR, "x"));
        graph.set_root(root);

        let mut serializer = Serializer::new(Recorder::default(), &EmitOptions::default());
        let err = serializer.serialize(&graph, root).unwrap_err();
        assert_eq!(err.kind, ErrorKind::Serializer);
        assert_eq!(err.problem, "serializer is not opened");
        assert_eq!(serializer.close().unwrap_err().problem, "serializer is not opened");

        serializer.open().unwrap();
        assert_eq!(serializer.open().unwrap_err().problem, "serializer is already opened");

        serializer.close().unwrap();
        serializer.close().unwrap();
        assert_eq!(serializer.open().unwrap_err().problem, "serializer is closed");
        assert_eq!(
            serializer.serialize(&graph, root).unwrap_err().problem,
            "serializer is closed"
        );
    }
}
