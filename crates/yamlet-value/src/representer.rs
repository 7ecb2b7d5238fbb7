//! Turns native values into node graphs.

use std::collections::HashMap;

use base64::engine::{Engine, general_purpose::STANDARD as BASE64};
use chrono::SecondsFormat;
use tracing::debug;
use yamlet_tree::{Error, ErrorKind, Node, NodeGraph, NodeId, NodeKind, Result, ScalarStyle};

use crate::{Collection, Document, Handle, Value, ValueKind};

/// Builds the node for one value.
pub type RepresentFn = fn(&mut Representer, &Document, &Value) -> Result<NodeId>;

/// Value kind to handler table.
#[derive(Debug, Clone, Default)]
pub struct RepresenterRegistry {
    handlers: HashMap<ValueKind, RepresentFn>,
}

impl RepresenterRegistry {
    /// Handlers for every [`ValueKind`].
    pub fn safe() -> Self {
        let mut registry = Self::default();
        let handlers: [(ValueKind, RepresentFn); 12] = [
            (ValueKind::Null, represent_null),
            (ValueKind::Bool, represent_bool),
            (ValueKind::Int, represent_int),
            (ValueKind::Float, represent_float),
            (ValueKind::Str, represent_str),
            (ValueKind::Binary, represent_binary),
            (ValueKind::Timestamp, represent_timestamp),
            (ValueKind::Seq, represent_seq),
            (ValueKind::Map, represent_map),
            (ValueKind::Omap, represent_omap),
            (ValueKind::Pairs, represent_pairs),
            (ValueKind::Set, represent_set),
        ];
        for (kind, handler) in handlers {
            registry.add_representer(kind, handler);
        }
        registry
    }

    /// Register the handler for `kind`, replacing any earlier one.
    pub fn add_representer(&mut self, kind: ValueKind, handler: RepresentFn) {
        self.handlers.insert(kind, handler);
    }

    pub fn remove_representer(&mut self, kind: ValueKind) {
        self.handlers.remove(&kind);
    }
}

/// Represents [`Document`]s as node graphs.
///
/// Scalars always get fresh nodes. A collection reached a second time maps to
/// the node built for it the first time, so the serializer can anchor it.
#[derive(Debug, Clone, Default)]
pub struct Representer {
    registry: RepresenterRegistry,
    default_style: Option<ScalarStyle>,
    default_flow_style: Option<bool>,
    graph: NodeGraph,
    represented: HashMap<Handle, NodeId>,
    alias_key: Option<Handle>,
}

impl Representer {
    /// A representer with the safe handler set.
    pub fn new() -> Self {
        Self::with_registry(RepresenterRegistry::safe())
    }

    pub fn with_registry(registry: RepresenterRegistry) -> Self {
        Self {
            registry,
            ..Self::default()
        }
    }

    /// Style for scalars whose handler does not pick one.
    pub fn with_default_style(mut self, style: Option<ScalarStyle>) -> Self {
        self.default_style = style;
        self
    }

    /// Layout for collections whose handler does not pick one.
    pub fn with_default_flow_style(mut self, flow_style: Option<bool>) -> Self {
        self.default_flow_style = flow_style;
        self
    }

    pub fn registry_mut(&mut self) -> &mut RepresenterRegistry {
        &mut self.registry
    }

    /// Represent a whole document.
    pub fn represent(&mut self, document: &Document) -> Result<NodeGraph> {
        self.graph = NodeGraph::new();
        self.represented.clear();
        self.alias_key = None;
        let result = self.represent_data(document, document.root());
        let mut graph = std::mem::take(&mut self.graph);
        self.represented.clear();
        self.alias_key = None;
        graph.set_root(result?);
        debug!(nodes = graph.len(), "document represented");
        Ok(graph)
    }

    /// The node for `value`, reusing the node of a collection seen before.
    pub fn represent_data(&mut self, document: &Document, value: &Value) -> Result<NodeId> {
        match value {
            Value::Collection(handle) => {
                if let Some(id) = self.represented.get(handle) {
                    return Ok(*id);
                }
                self.alias_key = Some(*handle);
            }
            _ => self.alias_key = None,
        }
        let kind = document.kind_of(value);
        let Some(handler) = self.registry.handlers.get(&kind).copied() else {
            return Err(Error::new(
                ErrorKind::Representer,
                format!("cannot represent an object: {value:?}"),
            ));
        };
        handler(self, document, value)
    }

    /// A scalar node. `style` falls back to the default style.
    pub fn represent_scalar(
        &mut self,
        tag: &str,
        value: impl Into<String>,
        style: Option<ScalarStyle>,
    ) -> NodeId {
        self.alias_key = None;
        let node = Node::scalar(tag, value).with_style(style.or(self.default_style));
        self.graph.add(node)
    }

    /// A sequence node over `items`.
    pub fn represent_sequence(
        &mut self,
        document: &Document,
        tag: &str,
        items: &[Value],
        flow_style: Option<bool>,
    ) -> Result<NodeId> {
        let id = self.graph.add(Node::sequence(tag).with_flow_style(flow_style));
        if let Some(handle) = self.alias_key.take() {
            self.represented.insert(handle, id);
        }
        let mut all_plain = true;
        for item in items {
            let child = self.represent_data(document, item)?;
            all_plain &= self.is_plain_scalar(child);
            self.graph.push_item(id, child);
        }
        self.settle_flow_style(id, flow_style, all_plain);
        Ok(id)
    }

    /// A mapping node over `pairs`.
    pub fn represent_mapping<'v>(
        &mut self,
        document: &Document,
        tag: &str,
        pairs: impl IntoIterator<Item = (&'v Value, &'v Value)>,
        flow_style: Option<bool>,
    ) -> Result<NodeId> {
        let id = self.graph.add(Node::mapping(tag).with_flow_style(flow_style));
        if let Some(handle) = self.alias_key.take() {
            self.represented.insert(handle, id);
        }
        let mut all_plain = true;
        for (key, value) in pairs {
            let key = self.represent_data(document, key)?;
            let value = self.represent_data(document, value)?;
            all_plain &= self.is_plain_scalar(key) && self.is_plain_scalar(value);
            self.graph.push_pair(id, key, value);
        }
        self.settle_flow_style(id, flow_style, all_plain);
        Ok(id)
    }

    fn is_plain_scalar(&self, id: NodeId) -> bool {
        let node = &self.graph[id];
        node.kind() == NodeKind::Scalar && node.style().is_none()
    }

    fn settle_flow_style(&mut self, id: NodeId, flow_style: Option<bool>, all_plain: bool) {
        if flow_style.is_some() {
            return;
        }
        let chosen = self.default_flow_style.unwrap_or(all_plain);
        if let Some(node) = self.graph.get_mut(id) {
            node.flow_style = Some(chosen);
        }
    }

    fn collection<'d>(&self, document: &'d Document, value: &Value) -> Result<&'d Collection> {
        document.collection(value).ok_or_else(|| {
            Error::new(
                ErrorKind::Representer,
                format!("dangling collection handle: {value:?}"),
            )
        })
    }
}

fn represent_null(ctx: &mut Representer, _: &Document, _: &Value) -> Result<NodeId> {
    Ok(ctx.represent_scalar("tag:yaml.org,2002:null", "null", None))
}

fn represent_bool(ctx: &mut Representer, _: &Document, value: &Value) -> Result<NodeId> {
    let text = if value.as_bool() == Some(true) { "true" } else { "false" };
    Ok(ctx.represent_scalar("tag:yaml.org,2002:bool", text, None))
}

fn represent_int(ctx: &mut Representer, _: &Document, value: &Value) -> Result<NodeId> {
    let text = value.as_i64().unwrap_or_default().to_string();
    Ok(ctx.represent_scalar("tag:yaml.org,2002:int", text, None))
}

fn represent_float(ctx: &mut Representer, _: &Document, value: &Value) -> Result<NodeId> {
    let text = float_text(value.as_f64().unwrap_or_default());
    Ok(ctx.represent_scalar("tag:yaml.org,2002:float", text, None))
}

/// Text for a float that the implicit float rule reads back as the same
/// value: always a `.`, and a signed exponent when there is one.
pub(crate) fn float_text(value: f64) -> String {
    if value.is_nan() {
        return ".nan".to_string();
    }
    if value.is_infinite() {
        return if value > 0.0 { ".inf" } else { "-.inf" }.to_string();
    }
    let text = format!("{value:?}").to_ascii_lowercase();
    let Some((mantissa, exponent)) = text.split_once('e') else {
        return text;
    };
    let mantissa = if mantissa.contains('.') {
        mantissa.to_string()
    } else {
        format!("{mantissa}.0")
    };
    let exponent = if exponent.starts_with('-') {
        exponent.to_string()
    } else {
        format!("+{exponent}")
    };
    format!("{mantissa}e{exponent}")
}

fn represent_str(ctx: &mut Representer, _: &Document, value: &Value) -> Result<NodeId> {
    let text = value.as_str().unwrap_or_default();
    Ok(ctx.represent_scalar("tag:yaml.org,2002:str", text, None))
}

fn represent_binary(ctx: &mut Representer, _: &Document, value: &Value) -> Result<NodeId> {
    let Value::Binary(bytes) = value else {
        return Ok(ctx.represent_scalar("tag:yaml.org,2002:binary", "", None));
    };
    let encoded = BASE64.encode(bytes);
    // Lines of 76 characters, each ending in a break.
    let mut text = String::with_capacity(encoded.len() + encoded.len() / 76 + 1);
    for chunk in encoded.as_bytes().chunks(76) {
        text.push_str(&String::from_utf8_lossy(chunk));
        text.push('\n');
    }
    Ok(ctx.represent_scalar(
        "tag:yaml.org,2002:binary",
        text,
        Some(ScalarStyle::Literal),
    ))
}

fn represent_timestamp(ctx: &mut Representer, _: &Document, value: &Value) -> Result<NodeId> {
    let text = match value {
        Value::Timestamp(ts) => ts.to_rfc3339_opts(SecondsFormat::AutoSi, true),
        _ => String::new(),
    };
    Ok(ctx.represent_scalar("tag:yaml.org,2002:timestamp", text, None))
}

fn represent_seq(ctx: &mut Representer, document: &Document, value: &Value) -> Result<NodeId> {
    match ctx.collection(document, value)? {
        Collection::Seq(items) => {
            ctx.represent_sequence(document, "tag:yaml.org,2002:seq", items, None)
        }
        other => Err(mismatch(other)),
    }
}

fn represent_map(ctx: &mut Representer, document: &Document, value: &Value) -> Result<NodeId> {
    match ctx.collection(document, value)? {
        Collection::Map(map) => ctx.represent_mapping(
            document,
            "tag:yaml.org,2002:map",
            map.iter().map(|(k, v)| (k.value(), v)),
            None,
        ),
        other => Err(mismatch(other)),
    }
}

fn represent_set(ctx: &mut Representer, document: &Document, value: &Value) -> Result<NodeId> {
    match ctx.collection(document, value)? {
        Collection::Set(members) => ctx.represent_mapping(
            document,
            "tag:yaml.org,2002:set",
            members.iter().map(|k| (k.value(), &Value::Null)),
            None,
        ),
        other => Err(mismatch(other)),
    }
}

fn represent_omap(ctx: &mut Representer, document: &Document, value: &Value) -> Result<NodeId> {
    match ctx.collection(document, value)? {
        Collection::Omap(pairs) => {
            represent_pair_list(ctx, document, "tag:yaml.org,2002:omap", pairs)
        }
        other => Err(mismatch(other)),
    }
}

fn represent_pairs(ctx: &mut Representer, document: &Document, value: &Value) -> Result<NodeId> {
    match ctx.collection(document, value)? {
        Collection::Pairs(pairs) => {
            represent_pair_list(ctx, document, "tag:yaml.org,2002:pairs", pairs)
        }
        other => Err(mismatch(other)),
    }
}

/// A sequence of single-pair mappings.
fn represent_pair_list(
    ctx: &mut Representer,
    document: &Document,
    tag: &str,
    pairs: &[(Value, Value)],
) -> Result<NodeId> {
    let id = ctx.graph.add(Node::sequence(tag));
    if let Some(handle) = ctx.alias_key.take() {
        ctx.represented.insert(handle, id);
    }
    for (key, value) in pairs {
        ctx.alias_key = None;
        let entry = ctx.represent_mapping(
            document,
            "tag:yaml.org,2002:map",
            [(key, value)],
            None,
        )?;
        ctx.graph.push_item(id, entry);
    }
    ctx.settle_flow_style(id, None, pairs.is_empty());
    Ok(id)
}

fn mismatch(found: &Collection) -> Error {
    Error::new(
        ErrorKind::Representer,
        format!("collection does not match its kind: {found:?}"),
    )
}
