//! Tag resolution for nodes written without an explicit tag.
//!
//! Scalars are matched against implicit resolvers (regular expressions
//! bucketed by their first character). Any node can also be tagged by a path
//! resolver, which matches its position in the document.

use std::collections::HashMap;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::{Node, NodeKind};

pub const DEFAULT_SCALAR_TAG: &str = "tag:yaml.org,2002:str";
pub const DEFAULT_SEQUENCE_TAG: &str = "tag:yaml.org,2002:seq";
pub const DEFAULT_MAPPING_TAG: &str = "tag:yaml.org,2002:map";

macro_rules! implicit_regex {
    ($name:ident, $pattern:expr) => {
        static $name: Lazy<Regex> =
            Lazy::new(|| Regex::new($pattern).expect("implicit resolver pattern is valid"));
    };
}

implicit_regex!(
    BOOL_RE,
    r"^(?:yes|Yes|YES|true|True|TRUE|on|On|ON|no|No|NO|false|False|FALSE|off|Off|OFF)$"
);
implicit_regex!(
    FLOAT_RE,
    r"^(?:[-+]?(?:[0-9][0-9_]*)\.[0-9_]*(?:[eE][-+][0-9]+)?|\.[0-9_]+(?:[eE][-+][0-9]+)?|[-+]?[0-9][0-9_]*(?::[0-5]?[0-9])+\.[0-9_]*|[-+]?\.(?:inf|Inf|INF)|\.(?:nan|NaN|NAN))$"
);
implicit_regex!(
    INT_RE,
    r"^(?:[-+]?0b[01_]+|[-+]?0[0-7_]+|[-+]?(?:0|[1-9][0-9_]*)|[-+]?0x[0-9a-fA-F_]+|[-+]?0o[0-7_]+|[-+]?[1-9][0-9_]*(?::[0-5]?[0-9])+)$"
);
implicit_regex!(MERGE_RE, r"^(?:<<)$");
implicit_regex!(NULL_RE, r"^(?:~|null|Null|NULL|)$");
implicit_regex!(
    TIMESTAMP_RE,
    r"^(?:[0-9][0-9][0-9][0-9]-[0-9][0-9]-[0-9][0-9]|[0-9][0-9][0-9][0-9]-[0-9][0-9]?-[0-9][0-9]?(?:[Tt]|[\x20\t]+)[0-9][0-9]?:[0-9][0-9]:[0-9][0-9](?:\.[0-9]*)?(?:[\x20\t]*(?:Z|[-+][0-9][0-9]?(?::[0-9][0-9])?))?)$"
);
implicit_regex!(VALUE_RE, r"^(?:=)$");
implicit_regex!(YAML_RE, r"^(?:!|&|\*)$");

/// What a path element requires of the parent node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeCheck {
    /// Any parent.
    Any,
    /// A parent of this kind.
    Kind(NodeKind),
    /// A parent with exactly this tag.
    Tag(String),
}

/// Which child of the parent a path element selects.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathIndex {
    /// A mapping key.
    Key,
    /// Any mapping value or sequence item.
    AnyValue,
    /// The value under the scalar key with this text.
    MapKey(String),
    /// The sequence item at this position.
    SeqIndex(usize),
}

/// One step of a path resolver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathElement {
    pub node: NodeCheck,
    pub index: PathIndex,
}

impl PathElement {
    pub fn new(node: NodeCheck, index: PathIndex) -> Self {
        Self { node, index }
    }
}

/// Where a child sits within its parent while composing or serializing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathPosition<'a> {
    /// A mapping key.
    Key,
    /// A mapping value. Carries the key text when the key is a scalar.
    Value(Option<&'a str>),
    /// A sequence item.
    Item(usize),
}

#[derive(Debug, Clone)]
struct PathResolver {
    path: Vec<PathElement>,
    kind: Option<NodeKind>,
    tag: String,
}

#[derive(Debug, Clone)]
struct ImplicitResolver {
    tag: String,
    regex: Regex,
}

/// Decides the tag of untagged nodes.
#[derive(Debug, Clone)]
pub struct Resolver {
    by_first_char: HashMap<char, Vec<ImplicitResolver>>,
    /// Resolvers consulted for the empty scalar.
    for_empty: Vec<ImplicitResolver>,
    /// Resolvers consulted for every scalar.
    wildcard: Vec<ImplicitResolver>,
    path_resolvers: Vec<PathResolver>,
    exact_paths: Vec<HashMap<Option<NodeKind>, String>>,
    prefix_paths: Vec<Vec<usize>>,
}

impl Default for Resolver {
    /// A resolver with the YAML 1.1 implicit types registered.
    fn default() -> Self {
        let mut resolver = Self::base();
        resolver.add_implicit_resolver("tag:yaml.org,2002:bool", BOOL_RE.clone(), "yYnNtTfFoO");
        resolver.add_implicit_resolver(
            "tag:yaml.org,2002:float",
            FLOAT_RE.clone(),
            "-+0123456789.",
        );
        resolver.add_implicit_resolver("tag:yaml.org,2002:int", INT_RE.clone(), "-+0123456789");
        resolver.add_implicit_resolver("tag:yaml.org,2002:merge", MERGE_RE.clone(), "<");
        resolver.add_implicit_resolver("tag:yaml.org,2002:null", NULL_RE.clone(), "~nN");
        resolver.add_implicit_resolver(
            "tag:yaml.org,2002:timestamp",
            TIMESTAMP_RE.clone(),
            "0123456789",
        );
        resolver.add_implicit_resolver("tag:yaml.org,2002:value", VALUE_RE.clone(), "=");
        // Reserved indicators, so that they are never written plain.
        resolver.add_implicit_resolver("tag:yaml.org,2002:yaml", YAML_RE.clone(), "!&*");
        resolver
    }
}

impl Resolver {
    /// A resolver with no implicit resolvers: every untagged node gets the
    /// default tag for its kind.
    pub fn base() -> Self {
        Self {
            by_first_char: HashMap::new(),
            for_empty: Vec::new(),
            wildcard: Vec::new(),
            path_resolvers: Vec::new(),
            exact_paths: Vec::new(),
            prefix_paths: Vec::new(),
        }
    }

    /// Register a scalar pattern for `tag`.
    ///
    /// The pattern is only tried for scalars starting with one of `first`.
    /// An empty `first` tries it for every scalar. Patterns matching the empty
    /// string are also tried for the empty scalar. Earlier registrations win.
    pub fn add_implicit_resolver(&mut self, tag: impl Into<String>, regex: Regex, first: &str) {
        let resolver = ImplicitResolver {
            tag: tag.into(),
            regex,
        };
        if first.is_empty() {
            self.wildcard.push(resolver);
            return;
        }
        if resolver.regex.is_match("") {
            self.for_empty.push(resolver.clone());
        }
        for ch in first.chars() {
            self.by_first_char
                .entry(ch)
                .or_default()
                .push(resolver.clone());
        }
    }

    /// Register a tag for nodes found at `path`, optionally only for nodes of
    /// `kind`. An empty path addresses the document root.
    ///
    /// Registering the same path and kind again replaces the tag.
    pub fn add_path_resolver(
        &mut self,
        tag: impl Into<String>,
        path: Vec<PathElement>,
        kind: Option<NodeKind>,
    ) {
        let tag = tag.into();
        if let Some(existing) = self
            .path_resolvers
            .iter_mut()
            .find(|r| r.path == path && r.kind == kind)
        {
            existing.tag = tag;
        } else {
            self.path_resolvers.push(PathResolver { path, kind, tag });
        }
    }

    /// Enter a child node. `parent` is `None` for the document root.
    ///
    /// Every call must be paired with [`Resolver::ascend_resolver`].
    pub fn descend_resolver(&mut self, parent: Option<(&Node, PathPosition<'_>)>) {
        if self.path_resolvers.is_empty() {
            return;
        }
        let mut exact = HashMap::new();
        let mut prefix = Vec::new();
        match parent {
            Some((node, position)) => {
                let depth = self.prefix_paths.len();
                let candidates = self.prefix_paths.last().cloned().unwrap_or_default();
                for id in candidates {
                    let resolver = &self.path_resolvers[id];
                    if !check_resolver_prefix(depth, &resolver.path, node, position) {
                        continue;
                    }
                    if resolver.path.len() > depth {
                        prefix.push(id);
                    } else {
                        exact.insert(resolver.kind, resolver.tag.clone());
                    }
                }
            }
            None => {
                for (id, resolver) in self.path_resolvers.iter().enumerate() {
                    if resolver.path.is_empty() {
                        exact.insert(resolver.kind, resolver.tag.clone());
                    } else {
                        prefix.push(id);
                    }
                }
            }
        }
        self.exact_paths.push(exact);
        self.prefix_paths.push(prefix);
    }

    /// Leave the node entered by the matching [`Resolver::descend_resolver`].
    pub fn ascend_resolver(&mut self) {
        if self.path_resolvers.is_empty() {
            return;
        }
        self.exact_paths.pop();
        self.prefix_paths.pop();
    }

    /// The tag for a node of `kind`.
    ///
    /// `value` is the scalar text and `implicit` the pair of implicit flags
    /// (plain, non-plain). For collections only `implicit.0` is consulted.
    pub fn resolve(&self, kind: NodeKind, value: Option<&str>, implicit: (bool, bool)) -> String {
        if kind == NodeKind::Scalar && implicit.0 {
            let value = value.unwrap_or("");
            let bucket = match value.chars().next() {
                None => self.for_empty.as_slice(),
                Some(ch) => self
                    .by_first_char
                    .get(&ch)
                    .map(Vec::as_slice)
                    .unwrap_or(&[]),
            };
            if let Some(resolver) = bucket
                .iter()
                .chain(&self.wildcard)
                .find(|r| r.regex.is_match(value))
            {
                return resolver.tag.clone();
            }
        }
        if let Some(exact) = self.exact_paths.last() {
            if let Some(tag) = exact.get(&Some(kind)).or_else(|| exact.get(&None)) {
                return tag.clone();
            }
        }
        match kind {
            NodeKind::Scalar => DEFAULT_SCALAR_TAG,
            NodeKind::Sequence => DEFAULT_SEQUENCE_TAG,
            NodeKind::Mapping => DEFAULT_MAPPING_TAG,
        }
        .to_string()
    }
}

fn check_resolver_prefix(
    depth: usize,
    path: &[PathElement],
    parent: &Node,
    position: PathPosition<'_>,
) -> bool {
    let Some(element) = depth.checked_sub(1).and_then(|i| path.get(i)) else {
        return false;
    };
    let node_ok = match &element.node {
        NodeCheck::Any => true,
        NodeCheck::Kind(kind) => parent.kind() == *kind,
        NodeCheck::Tag(tag) => parent.tag == *tag,
    };
    if !node_ok {
        return false;
    }
    match (&element.index, position) {
        (PathIndex::Key, PathPosition::Key) => true,
        (PathIndex::Key, _) => false,
        (PathIndex::AnyValue, PathPosition::Key) => false,
        (PathIndex::AnyValue, _) => true,
        (PathIndex::MapKey(key), PathPosition::Value(Some(text))) => key == text,
        (PathIndex::MapKey(_), _) => false,
        (PathIndex::SeqIndex(index), PathPosition::Item(item)) => *index == item,
        (PathIndex::SeqIndex(_), _) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use facet_testhelpers::test;

    fn scalar_tag(value: &str) -> String {
        Resolver::default().resolve(NodeKind::Scalar, Some(value), (true, false))
    }

    #[test]
    fn test_implicit_scalar_types() {
        let cases = [
            ("yes", "bool"),
            ("Off", "bool"),
            ("3.25", "float"),
            ("1e3", "str"),
            ("1.0e+3", "float"),
            ("-.inf", "float"),
            (".NaN", "float"),
            ("190:20:30.15", "float"),
            ("42", "int"),
            ("0x1F", "int"),
            ("0b1010", "int"),
            ("017", "int"),
            ("190:20:30", "int"),
            ("1_000", "int"),
            ("<<", "merge"),
            ("~", "null"),
            ("", "null"),
            ("Null", "null"),
            ("2001-12-14", "timestamp"),
            ("2001-12-14t21:59:43.10-05:00", "timestamp"),
            ("2001-12-14 21:59:43.10 -5", "timestamp"),
            ("=", "value"),
            ("!", "yaml"),
            ("hello", "str"),
            ("nULL", "str"),
        ];
        for (value, short) in cases {
            assert_eq!(
                scalar_tag(value),
                format!("tag:yaml.org,2002:{short}"),
                "resolving {value:?}"
            );
        }
    }

    #[test]
    fn test_non_plain_scalars_get_default_tag() {
        let resolver = Resolver::default();
        assert_eq!(
            resolver.resolve(NodeKind::Scalar, Some("42"), (false, true)),
            DEFAULT_SCALAR_TAG
        );
    }

    #[test]
    fn test_collection_defaults() {
        let resolver = Resolver::default();
        assert_eq!(
            resolver.resolve(NodeKind::Sequence, None, (true, false)),
            DEFAULT_SEQUENCE_TAG
        );
        assert_eq!(
            resolver.resolve(NodeKind::Mapping, None, (true, false)),
            DEFAULT_MAPPING_TAG
        );
    }

    #[test]
    fn test_base_resolver_has_no_implicit_types() {
        assert_eq!(
            Resolver::base().resolve(NodeKind::Scalar, Some("42"), (true, false)),
            DEFAULT_SCALAR_TAG
        );
    }

    #[test]
    fn test_wildcard_resolver() {
        let mut resolver = Resolver::base();
        resolver.add_implicit_resolver("!upper", Regex::new("^[A-Z]+$").unwrap(), "");
        assert_eq!(
            resolver.resolve(NodeKind::Scalar, Some("ABC"), (true, false)),
            "!upper"
        );
        assert_eq!(
            resolver.resolve(NodeKind::Scalar, Some("abc"), (true, false)),
            DEFAULT_SCALAR_TAG
        );
    }

    #[test]
    fn test_path_resolver_matches_mapping_value() {
        let mut resolver = Resolver::default();
        resolver.add_path_resolver(
            "!name",
            vec![PathElement::new(
                NodeCheck::Kind(NodeKind::Mapping),
                PathIndex::MapKey("name".into()),
            )],
            Some(NodeKind::Scalar),
        );
        let root = Node::mapping(DEFAULT_MAPPING_TAG);

        resolver.descend_resolver(None);
        resolver.descend_resolver(Some((&root, PathPosition::Value(Some("name")))));
        assert_eq!(
            resolver.resolve(NodeKind::Scalar, Some("bob"), (true, false)),
            "!name"
        );
        // Implicit resolvers still take precedence.
        assert_eq!(
            resolver.resolve(NodeKind::Scalar, Some("12"), (true, false)),
            "tag:yaml.org,2002:int"
        );
        resolver.ascend_resolver();

        resolver.descend_resolver(Some((&root, PathPosition::Value(Some("other")))));
        assert_eq!(
            resolver.resolve(NodeKind::Scalar, Some("bob"), (true, false)),
            DEFAULT_SCALAR_TAG
        );
        resolver.ascend_resolver();

        resolver.descend_resolver(Some((&root, PathPosition::Key)));
        assert_eq!(
            resolver.resolve(NodeKind::Scalar, Some("name"), (true, false)),
            DEFAULT_SCALAR_TAG
        );
        resolver.ascend_resolver();
        resolver.ascend_resolver();
    }

    #[test]
    fn test_path_resolver_for_root() {
        let mut resolver = Resolver::default();
        resolver.add_path_resolver("!root", Vec::new(), None);
        resolver.descend_resolver(None);
        assert_eq!(
            resolver.resolve(NodeKind::Sequence, None, (true, false)),
            "!root"
        );
        resolver.ascend_resolver();
    }

    #[test]
    fn test_path_resolver_by_sequence_index() {
        let mut resolver = Resolver::default();
        resolver.add_path_resolver(
            "!second",
            vec![PathElement::new(NodeCheck::Any, PathIndex::SeqIndex(1))],
            None,
        );
        let root = Node::sequence(DEFAULT_SEQUENCE_TAG);
        resolver.descend_resolver(None);
        for (index, expected) in [(0, DEFAULT_SCALAR_TAG), (1, "!second")] {
            resolver.descend_resolver(Some((&root, PathPosition::Item(index))));
            assert_eq!(
                resolver.resolve(NodeKind::Scalar, Some("x"), (true, false)),
                expected
            );
            resolver.ascend_resolver();
        }
        resolver.ascend_resolver();
    }
}
