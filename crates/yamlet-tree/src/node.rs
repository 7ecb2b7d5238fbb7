//! Nodes and the arena that owns them.

use std::fmt;
use std::ops::Index;

use crate::{Mark, ScalarStyle};

/// Identity of a node within its [`NodeGraph`].
///
/// Two nodes are the same node only if their ids are equal; structurally
/// equal nodes with different ids stay distinct.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u32);

impl NodeId {
    /// Position of this node in the arena.
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// The three node shapes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    Scalar,
    Sequence,
    Mapping,
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            NodeKind::Scalar => "scalar",
            NodeKind::Sequence => "sequence",
            NodeKind::Mapping => "mapping",
        })
    }
}

/// Node content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeValue {
    Scalar {
        value: String,
        style: Option<ScalarStyle>,
    },
    Sequence(Vec<NodeId>),
    Mapping(Vec<(NodeId, NodeId)>),
}

/// A tagged node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node {
    /// Resolved tag, e.g. `tag:yaml.org,2002:str`.
    pub tag: String,
    pub value: NodeValue,
    /// Flow or block layout hint for collections.
    pub flow_style: Option<bool>,
    pub start_mark: Mark,
    pub end_mark: Mark,
}

impl Node {
    /// Create a scalar node.
    pub fn scalar(tag: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            value: NodeValue::Scalar {
                value: value.into(),
                style: None,
            },
            flow_style: None,
            start_mark: Mark::default(),
            end_mark: Mark::default(),
        }
    }

    /// Create an empty sequence node.
    pub fn sequence(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            value: NodeValue::Sequence(Vec::new()),
            flow_style: None,
            start_mark: Mark::default(),
            end_mark: Mark::default(),
        }
    }

    /// Create an empty mapping node.
    pub fn mapping(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            value: NodeValue::Mapping(Vec::new()),
            flow_style: None,
            start_mark: Mark::default(),
            end_mark: Mark::default(),
        }
    }

    /// Set the scalar style preference.
    pub fn with_style(mut self, style: Option<ScalarStyle>) -> Self {
        if let NodeValue::Scalar { style: slot, .. } = &mut self.value {
            *slot = style;
        }
        self
    }

    /// Set the collection layout preference.
    pub fn with_flow_style(mut self, flow_style: Option<bool>) -> Self {
        self.flow_style = flow_style;
        self
    }

    /// Set the source range.
    pub fn with_marks(mut self, start_mark: Mark, end_mark: Mark) -> Self {
        self.start_mark = start_mark;
        self.end_mark = end_mark;
        self
    }

    pub fn kind(&self) -> NodeKind {
        match self.value {
            NodeValue::Scalar { .. } => NodeKind::Scalar,
            NodeValue::Sequence(_) => NodeKind::Sequence,
            NodeValue::Mapping(_) => NodeKind::Mapping,
        }
    }

    /// Scalar text, if this is a scalar.
    pub fn as_scalar(&self) -> Option<&str> {
        match &self.value {
            NodeValue::Scalar { value, .. } => Some(value),
            _ => None,
        }
    }

    /// Items, if this is a sequence.
    pub fn as_sequence(&self) -> Option<&[NodeId]> {
        match &self.value {
            NodeValue::Sequence(items) => Some(items),
            _ => None,
        }
    }

    /// Key/value pairs, if this is a mapping.
    pub fn as_mapping(&self) -> Option<&[(NodeId, NodeId)]> {
        match &self.value {
            NodeValue::Mapping(pairs) => Some(pairs),
            _ => None,
        }
    }

    /// Scalar style preference, if this is a scalar.
    pub fn style(&self) -> Option<ScalarStyle> {
        match &self.value {
            NodeValue::Scalar { style, .. } => *style,
            _ => None,
        }
    }
}

/// Arena of nodes for one document.
///
/// Nodes refer to each other by [`NodeId`], so a graph can share a node
/// between several parents and may contain cycles.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NodeGraph {
    nodes: Vec<Node>,
    root: Option<NodeId>,
}

impl NodeGraph {
    /// Create an empty graph.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a node and return its id.
    pub fn add(&mut self, node: Node) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(node);
        id
    }

    /// Append `item` to the sequence `seq`.
    ///
    /// # Panics
    ///
    /// Panics if `seq` is not a sequence.
    pub fn push_item(&mut self, seq: NodeId, item: NodeId) {
        match &mut self.nodes[seq.index()].value {
            NodeValue::Sequence(items) => items.push(item),
            other => panic!("push_item on a non-sequence node: {other:?}"),
        }
    }

    /// Append a key/value pair to the mapping `map`.
    ///
    /// # Panics
    ///
    /// Panics if `map` is not a mapping.
    pub fn push_pair(&mut self, map: NodeId, key: NodeId, value: NodeId) {
        match &mut self.nodes[map.index()].value {
            NodeValue::Mapping(pairs) => pairs.push((key, value)),
            other => panic!("push_pair on a non-mapping node: {other:?}"),
        }
    }

    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.index())
    }

    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(id.index())
    }

    /// The document root.
    pub fn root(&self) -> Option<NodeId> {
        self.root
    }

    pub fn set_root(&mut self, root: NodeId) {
        self.root = Some(root);
    }

    /// The root node.
    pub fn root_node(&self) -> Option<&Node> {
        self.root.and_then(|id| self.get(id))
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// All nodes with their ids, in allocation order.
    pub fn iter(&self) -> impl Iterator<Item = (NodeId, &Node)> {
        self.nodes
            .iter()
            .enumerate()
            .map(|(index, node)| (NodeId(index as u32), node))
    }

    /// Look up a mapping value by scalar key text.
    pub fn lookup(&self, map: NodeId, key: &str) -> Option<NodeId> {
        self[map]
            .as_mapping()?
            .iter()
            .find(|(k, _)| self[*k].as_scalar() == Some(key))
            .map(|(_, v)| *v)
    }
}

impl Index<NodeId> for NodeGraph {
    type Output = Node;

    fn index(&self, id: NodeId) -> &Node {
        &self.nodes[id.index()]
    }
}
