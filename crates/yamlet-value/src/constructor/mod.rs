//! Turns node graphs into native values.
//!
//! Dispatch goes through a [`ConstructorRegistry`]: the exact tag first, then
//! the longest registered tag prefix, then the wildcard handlers, then a
//! structural fallback by node kind.
//!
//! Collections are built in two phases. A handler allocates an empty
//! collection, which is registered for the node at once, and queues a fill
//! task. Tasks are drained after the root value exists, so aliases (including
//! recursive ones) always find the collection they point to.

use std::collections::{HashMap, HashSet};

use indexmap::IndexMap;
use tracing::{debug, trace};
use yamlet_tree::{
    Error, ErrorKind, NodeGraph, NodeId, NodeKind, NodeSource, NodeValue, Result,
};

use crate::{Collection, Document, Handle, Key, Value};

mod safe;

#[cfg(test)]
mod tests;

pub const MERGE_TAG: &str = "tag:yaml.org,2002:merge";
pub const VALUE_TAG: &str = "tag:yaml.org,2002:value";

/// Builds the value for one node.
pub type ConstructFn = fn(&mut Constructor, &NodeGraph, NodeId) -> Result<Value>;

/// Builds the value for a node whose tag starts with a registered prefix.
/// The second argument is the rest of the tag after the prefix.
pub type MultiConstructFn = fn(&mut Constructor, &str, &NodeGraph, NodeId) -> Result<Value>;

/// Populates a collection allocated earlier for a node.
pub type FillFn = fn(&mut Constructor, &NodeGraph, NodeId, Handle) -> Result<()>;

/// Tag to handler tables.
#[derive(Debug, Clone, Default)]
pub struct ConstructorRegistry {
    exact: HashMap<String, ConstructFn>,
    prefixes: Vec<(String, MultiConstructFn)>,
    wildcard_multi: Option<MultiConstructFn>,
    wildcard: Option<ConstructFn>,
}

impl ConstructorRegistry {
    /// Handlers for every tag of the YAML 1.1 type repository.
    pub fn safe() -> Self {
        let mut registry = Self::default();
        safe::register(&mut registry);
        registry
    }

    /// Register the handler for `tag`, replacing any earlier one.
    pub fn add_constructor(&mut self, tag: impl Into<String>, handler: ConstructFn) {
        self.exact.insert(tag.into(), handler);
    }

    /// Register the handler for tags starting with `prefix`.
    pub fn add_multi_constructor(&mut self, prefix: impl Into<String>, handler: MultiConstructFn) {
        let prefix = prefix.into();
        match self.prefixes.iter_mut().find(|(p, _)| *p == prefix) {
            Some(entry) => entry.1 = handler,
            None => self.prefixes.push((prefix, handler)),
        }
    }

    /// Handler for tags nothing else claims. It receives the whole tag.
    pub fn set_wildcard_multi_constructor(&mut self, handler: Option<MultiConstructFn>) {
        self.wildcard_multi = handler;
    }

    /// Handler for tags nothing else claims, tried after the wildcard
    /// multi-constructor.
    pub fn set_wildcard_constructor(&mut self, handler: Option<ConstructFn>) {
        self.wildcard = handler;
    }

    fn lookup<'t>(&self, tag: &'t str) -> Option<Dispatch<'t>> {
        if let Some(handler) = self.exact.get(tag) {
            return Some(Dispatch::Exact(*handler));
        }
        let longest = self
            .prefixes
            .iter()
            .filter(|(prefix, _)| tag.starts_with(prefix.as_str()))
            .max_by_key(|(prefix, _)| prefix.len());
        if let Some((prefix, handler)) = longest {
            return Some(Dispatch::Multi(*handler, &tag[prefix.len()..]));
        }
        if let Some(handler) = self.wildcard_multi {
            return Some(Dispatch::Multi(handler, tag));
        }
        self.wildcard.map(Dispatch::Exact)
    }
}

enum Dispatch<'t> {
    Exact(ConstructFn),
    Multi(MultiConstructFn, &'t str),
}

#[derive(Debug)]
struct FillTask {
    node: NodeId,
    target: Handle,
    fill: FillFn,
}

/// Constructs [`Document`]s from node graphs.
#[derive(Debug, Default)]
pub struct Constructor {
    registry: ConstructorRegistry,
    document: Document,
    constructed: HashMap<NodeId, Value>,
    constructing: HashSet<NodeId>,
    fill_queue: Vec<FillTask>,
}

impl Constructor {
    /// A constructor with the safe handler set.
    pub fn new() -> Self {
        Self::with_registry(ConstructorRegistry::safe())
    }

    /// A constructor with no handlers: every node is built from its kind.
    pub fn base() -> Self {
        Self::with_registry(ConstructorRegistry::default())
    }

    pub fn with_registry(registry: ConstructorRegistry) -> Self {
        Self {
            registry,
            ..Self::default()
        }
    }

    pub fn registry(&self) -> &ConstructorRegistry {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut ConstructorRegistry {
        &mut self.registry
    }

    /// Whether `source` has another document.
    pub fn check_data<S: NodeSource>(&mut self, source: &mut S) -> Result<bool> {
        source.check_node()
    }

    /// Construct the next document of `source`.
    pub fn get_data<S: NodeSource>(&mut self, source: &mut S) -> Result<Option<Document>> {
        match source.get_node()? {
            Some(graph) => self.construct_document(&graph).map(Some),
            None => Ok(None),
        }
    }

    /// Construct the only document of `source`.
    pub fn get_single_data<S: NodeSource>(&mut self, source: &mut S) -> Result<Option<Document>> {
        match source.get_single_node()? {
            Some(graph) => self.construct_document(&graph).map(Some),
            None => Ok(None),
        }
    }

    /// Construct a whole document, draining the fill queue.
    pub fn construct_document(&mut self, graph: &NodeGraph) -> Result<Document> {
        self.reset();
        let result = self.construct_root(graph);
        let mut document = std::mem::take(&mut self.document);
        self.reset();
        document.set_root(result?);
        debug!(collections = document.len(), "document constructed");
        Ok(document)
    }

    fn construct_root(&mut self, graph: &NodeGraph) -> Result<Value> {
        let Some(root) = graph.root() else {
            return Ok(Value::Null);
        };
        let value = self.construct_object(graph, root)?;
        while let Some(task) = self.fill_queue.pop() {
            trace!(node = task.node.index(), "filling collection");
            (task.fill)(self, graph, task.node, task.target)?;
        }
        Ok(value)
    }

    fn reset(&mut self) {
        self.document = Document::default();
        self.constructed.clear();
        self.constructing.clear();
        self.fill_queue.clear();
    }

    /// The value for `id`, constructing it on first use.
    pub fn construct_object(&mut self, graph: &NodeGraph, id: NodeId) -> Result<Value> {
        if let Some(value) = self.constructed.get(&id) {
            return Ok(value.clone());
        }
        let node = &graph[id];
        if !self.constructing.insert(id) {
            return Err(
                Error::new(ErrorKind::Constructor, "found unconstructable recursive node")
                    .with_mark(node.start_mark.clone()),
            );
        }
        let value = match self.registry.lookup(&node.tag) {
            Some(Dispatch::Exact(handler)) => handler(self, graph, id),
            Some(Dispatch::Multi(handler, suffix)) => handler(self, suffix, graph, id),
            None => match node.kind() {
                NodeKind::Scalar => self.construct_scalar(graph, id).map(Value::from),
                NodeKind::Sequence => Ok(self.defer_collection(
                    id,
                    Collection::Seq(Vec::new()),
                    safe::fill_seq,
                )),
                NodeKind::Mapping => Ok(self.defer_collection(
                    id,
                    Collection::Map(IndexMap::new()),
                    safe::fill_map,
                )),
            },
        };
        self.constructing.remove(&id);
        let value = value?;
        self.constructed.insert(id, value.clone());
        Ok(value)
    }

    /// Allocate `shell` for the node `id` and queue `fill` to populate it.
    ///
    /// The shell is registered for `id` at once, so aliases to the node
    /// resolve to it while it is still empty.
    pub fn defer_collection(&mut self, id: NodeId, shell: Collection, fill: FillFn) -> Value {
        let value = self.document.alloc(shell);
        if let Value::Collection(target) = value {
            self.constructed.insert(id, value.clone());
            self.fill_queue.push(FillTask {
                node: id,
                target,
                fill,
            });
        }
        value
    }

    /// The collection being filled for `handle`.
    pub fn collection_mut(&mut self, handle: Handle) -> Option<&mut Collection> {
        self.document.get_mut(handle)
    }

    /// Scalar text of `id`. A mapping holding a `=` key yields the text of
    /// that key's value.
    pub fn construct_scalar<'g>(&self, graph: &'g NodeGraph, id: NodeId) -> Result<&'g str> {
        let mut current = id;
        // Each step follows a `=` key to a different node unless the chain loops.
        for _ in 0..=graph.len() {
            match &graph[current].value {
                NodeValue::Scalar { value, .. } => return Ok(value),
                NodeValue::Mapping(pairs) => {
                    match pairs.iter().find(|(k, _)| graph[*k].tag == VALUE_TAG) {
                        Some((_, value)) => current = *value,
                        None => return Err(expected_kind(NodeKind::Scalar, graph, current)),
                    }
                }
                NodeValue::Sequence(_) => {
                    return Err(expected_kind(NodeKind::Scalar, graph, current));
                }
            }
        }
        Err(
            Error::new(ErrorKind::Constructor, "found unconstructable recursive node")
                .with_mark(graph[id].start_mark.clone()),
        )
    }

    /// Values of the sequence `id`.
    pub fn construct_sequence(&mut self, graph: &NodeGraph, id: NodeId) -> Result<Vec<Value>> {
        let Some(items) = graph[id].as_sequence() else {
            return Err(expected_kind(NodeKind::Sequence, graph, id));
        };
        items
            .iter()
            .map(|item| self.construct_object(graph, *item))
            .collect()
    }

    /// Key/value pairs of the mapping `id`, in order, after merge keys have
    /// been flattened.
    pub fn construct_pairs(
        &mut self,
        graph: &NodeGraph,
        id: NodeId,
    ) -> Result<Vec<(Value, Value)>> {
        if graph[id].kind() != NodeKind::Mapping {
            return Err(expected_kind(NodeKind::Mapping, graph, id));
        }
        let pairs = flatten_mapping(graph, id, &mut HashSet::new())?;
        let mut out = Vec::with_capacity(pairs.len());
        for (key, value) in pairs {
            let key = if graph[key].tag == VALUE_TAG {
                Value::from(self.construct_scalar(graph, key)?)
            } else {
                self.construct_object(graph, key)?
            };
            let value = self.construct_object(graph, value)?;
            out.push((key, value));
        }
        Ok(out)
    }

    /// The mapping `id` as an ordered map. Later keys replace earlier ones,
    /// so explicit keys win over merged ones.
    pub fn construct_mapping(
        &mut self,
        graph: &NodeGraph,
        id: NodeId,
    ) -> Result<IndexMap<Key, Value>> {
        if graph[id].kind() != NodeKind::Mapping {
            return Err(expected_kind(NodeKind::Mapping, graph, id));
        }
        let pairs = flatten_mapping(graph, id, &mut HashSet::new())?;
        let mut map = IndexMap::with_capacity(pairs.len());
        for (key_id, value_id) in pairs {
            let key = if graph[key_id].tag == VALUE_TAG {
                Value::from(self.construct_scalar(graph, key_id)?)
            } else {
                self.construct_object(graph, key_id)?
            };
            let Some(key) = Key::new(key) else {
                return Err(Error::new(ErrorKind::Constructor, "found unhashable key")
                    .with_context("while constructing a mapping", graph[id].start_mark.clone())
                    .with_mark(graph[key_id].start_mark.clone()));
            };
            let value = self.construct_object(graph, value_id)?;
            map.insert(key, value);
        }
        Ok(map)
    }
}

fn expected_kind(expected: NodeKind, graph: &NodeGraph, id: NodeId) -> Error {
    let node = &graph[id];
    Error::new(
        ErrorKind::Constructor,
        format!("expected a {expected} node, but found {}", node.kind()),
    )
    .with_mark(node.start_mark.clone())
}

/// Pairs of the mapping `id` with merge keys expanded.
///
/// Merged pairs come first so that the mapping's own keys override them. A
/// sequence of mappings is merged last to first, so earlier mappings win.
fn flatten_mapping(
    graph: &NodeGraph,
    id: NodeId,
    visiting: &mut HashSet<NodeId>,
) -> Result<Vec<(NodeId, NodeId)>> {
    let node = &graph[id];
    let Some(pairs) = node.as_mapping() else {
        return Ok(Vec::new());
    };
    // A mapping merging itself contributes nothing further.
    if !visiting.insert(id) {
        return Ok(Vec::new());
    }
    let mut merged = Vec::new();
    let mut own = Vec::with_capacity(pairs.len());
    for &(key, value) in pairs {
        if graph[key].tag != MERGE_TAG {
            own.push((key, value));
            continue;
        }
        let value_node = &graph[value];
        match &value_node.value {
            NodeValue::Mapping(_) => merged.extend(flatten_mapping(graph, value, visiting)?),
            NodeValue::Sequence(items) => {
                let mut parts = Vec::with_capacity(items.len());
                for &item in items {
                    let item_node = &graph[item];
                    if item_node.kind() != NodeKind::Mapping {
                        return Err(Error::new(
                            ErrorKind::Constructor,
                            format!(
                                "expected a mapping for merging, but found {}",
                                item_node.kind()
                            ),
                        )
                        .with_context("while constructing a mapping", node.start_mark.clone())
                        .with_mark(item_node.start_mark.clone()));
                    }
                    parts.push(flatten_mapping(graph, item, visiting)?);
                }
                for part in parts.into_iter().rev() {
                    merged.extend(part);
                }
            }
            NodeValue::Scalar { .. } => {
                return Err(Error::new(
                    ErrorKind::Constructor,
                    format!(
                        "expected a mapping or list of mappings for merging but found {}",
                        value_node.kind()
                    ),
                )
                .with_context("while constructing a mapping", node.start_mark.clone())
                .with_mark(value_node.start_mark.clone()));
            }
        }
    }
    visiting.remove(&id);
    merged.extend(own);
    Ok(merged)
}
