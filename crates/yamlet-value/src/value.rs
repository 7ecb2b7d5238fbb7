//! Native values and the per-document arena that owns their collections.

use std::collections::HashSet;
use std::hash::{Hash, Hasher};

use chrono::{DateTime, Utc};
use indexmap::{IndexMap, IndexSet};

/// Identity of a collection within its [`Document`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Handle(u32);

impl Handle {
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// A native value.
///
/// Collections are stored in the owning [`Document`] and referenced by
/// [`Handle`], so one collection can appear in several places, including
/// inside itself.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    Binary(Vec<u8>),
    Timestamp(DateTime<Utc>),
    Collection(Handle),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Float(f) => Some(*f),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_handle(&self) -> Option<Handle> {
        match self {
            Value::Collection(h) => Some(*h),
            _ => None,
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(s)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Float(f)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

/// A value usable as a mapping key or set member.
///
/// Collections cannot be keys. Floats compare by value, with all NaNs equal
/// to each other and `-0.0` equal to `0.0`.
#[derive(Debug, Clone)]
pub struct Key(Value);

impl Key {
    /// Wrap `value`, or return `None` if it is a collection.
    pub fn new(value: Value) -> Option<Self> {
        match value {
            Value::Collection(_) => None,
            value => Some(Key(value)),
        }
    }

    pub fn value(&self) -> &Value {
        &self.0
    }

    pub fn into_value(self) -> Value {
        self.0
    }
}

impl From<&str> for Key {
    fn from(s: &str) -> Self {
        Key(Value::from(s))
    }
}

fn float_bits(f: f64) -> u64 {
    if f.is_nan() {
        f64::NAN.to_bits()
    } else if f == 0.0 {
        0
    } else {
        f.to_bits()
    }
}

impl PartialEq for Key {
    fn eq(&self, other: &Self) -> bool {
        match (&self.0, &other.0) {
            (Value::Float(a), Value::Float(b)) => float_bits(*a) == float_bits(*b),
            (a, b) => a == b,
        }
    }
}

impl Eq for Key {}

impl Hash for Key {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::mem::discriminant(&self.0).hash(state);
        match &self.0 {
            Value::Null => {}
            Value::Bool(b) => b.hash(state),
            Value::Int(i) => i.hash(state),
            Value::Float(f) => float_bits(*f).hash(state),
            Value::Str(s) => s.hash(state),
            Value::Binary(bytes) => bytes.hash(state),
            Value::Timestamp(ts) => ts.hash(state),
            Value::Collection(h) => h.hash(state),
        }
    }
}

/// A collection stored in the arena.
#[derive(Debug, Clone, PartialEq)]
pub enum Collection {
    Seq(Vec<Value>),
    Map(IndexMap<Key, Value>),
    /// Ordered map: pairs in order, keys not required to be unique.
    Omap(Vec<(Value, Value)>),
    Pairs(Vec<(Value, Value)>),
    Set(IndexSet<Key>),
}

/// The shape of a value, used to pick a representer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueKind {
    Null,
    Bool,
    Int,
    Float,
    Str,
    Binary,
    Timestamp,
    Seq,
    Map,
    Omap,
    Pairs,
    Set,
}

/// One document's worth of native data.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    arena: Vec<Collection>,
    root: Value,
}

impl Default for Document {
    fn default() -> Self {
        Self::new(Value::Null)
    }
}

impl Document {
    /// A document with an empty arena.
    pub fn new(root: Value) -> Self {
        Self {
            arena: Vec::new(),
            root,
        }
    }

    pub fn root(&self) -> &Value {
        &self.root
    }

    pub fn set_root(&mut self, root: Value) {
        self.root = root;
    }

    /// Store a collection and return a value referring to it.
    pub fn alloc(&mut self, collection: Collection) -> Value {
        let handle = Handle(self.arena.len() as u32);
        self.arena.push(collection);
        Value::Collection(handle)
    }

    /// Store a sequence.
    pub fn seq(&mut self, items: impl IntoIterator<Item = Value>) -> Value {
        self.alloc(Collection::Seq(items.into_iter().collect()))
    }

    /// Store a mapping. Later duplicates of a key replace earlier values.
    ///
    /// # Panics
    ///
    /// Panics if a key is a collection.
    pub fn map<K: Into<Value>>(&mut self, pairs: impl IntoIterator<Item = (K, Value)>) -> Value {
        let map = pairs
            .into_iter()
            .map(|(k, v)| {
                let key = Key::new(k.into()).expect("collections cannot be mapping keys");
                (key, v)
            })
            .collect();
        self.alloc(Collection::Map(map))
    }

    pub fn get(&self, handle: Handle) -> Option<&Collection> {
        self.arena.get(handle.index())
    }

    pub fn get_mut(&mut self, handle: Handle) -> Option<&mut Collection> {
        self.arena.get_mut(handle.index())
    }

    /// The collection `value` refers to.
    pub fn collection(&self, value: &Value) -> Option<&Collection> {
        value.as_handle().and_then(|h| self.get(h))
    }

    /// Look up a string key in the mapping `map`.
    pub fn lookup(&self, map: &Value, key: &str) -> Option<&Value> {
        match self.collection(map)? {
            Collection::Map(entries) => entries.get(&Key::from(key)),
            _ => None,
        }
    }

    /// Items of the sequence `seq`.
    pub fn items(&self, seq: &Value) -> Option<&[Value]> {
        match self.collection(seq)? {
            Collection::Seq(items) => Some(items),
            _ => None,
        }
    }

    pub fn kind_of(&self, value: &Value) -> ValueKind {
        match value {
            Value::Null => ValueKind::Null,
            Value::Bool(_) => ValueKind::Bool,
            Value::Int(_) => ValueKind::Int,
            Value::Float(_) => ValueKind::Float,
            Value::Str(_) => ValueKind::Str,
            Value::Binary(_) => ValueKind::Binary,
            Value::Timestamp(_) => ValueKind::Timestamp,
            Value::Collection(h) => match self.get(*h) {
                Some(Collection::Seq(_)) | None => ValueKind::Seq,
                Some(Collection::Map(_)) => ValueKind::Map,
                Some(Collection::Omap(_)) => ValueKind::Omap,
                Some(Collection::Pairs(_)) => ValueKind::Pairs,
                Some(Collection::Set(_)) => ValueKind::Set,
            },
        }
    }

    /// Number of collections in the arena.
    pub fn len(&self) -> usize {
        self.arena.len()
    }

    pub fn is_empty(&self) -> bool {
        self.arena.is_empty()
    }

    /// Compare the data of two documents, ignoring how their arenas are laid
    /// out. Floats compare as keys do, so NaN equals NaN.
    pub fn content_eq(&self, other: &Document) -> bool {
        let mut seen = HashSet::new();
        values_eq(self, &self.root, other, &other.root, &mut seen)
    }
}

fn values_eq(
    a_doc: &Document,
    a: &Value,
    b_doc: &Document,
    b: &Value,
    seen: &mut HashSet<(Handle, Handle)>,
) -> bool {
    let (ha, hb) = match (a, b) {
        (Value::Collection(ha), Value::Collection(hb)) => (*ha, *hb),
        (Value::Float(x), Value::Float(y)) => return float_bits(*x) == float_bits(*y),
        (a, b) => return a == b,
    };
    // A pair already under comparison is assumed equal; any difference shows
    // up elsewhere in the walk.
    if !seen.insert((ha, hb)) {
        return true;
    }
    let pairs_eq = |x: &[(Value, Value)], y: &[(Value, Value)], seen: &mut HashSet<_>| {
        x.len() == y.len()
            && x.iter().zip(y).all(|((k1, v1), (k2, v2))| {
                values_eq(a_doc, k1, b_doc, k2, seen) && values_eq(a_doc, v1, b_doc, v2, seen)
            })
    };
    match (a_doc.get(ha), b_doc.get(hb)) {
        (Some(Collection::Seq(x)), Some(Collection::Seq(y))) => {
            x.len() == y.len()
                && x
                    .iter()
                    .zip(y)
                    .all(|(i, j)| values_eq(a_doc, i, b_doc, j, seen))
        }
        (Some(Collection::Map(x)), Some(Collection::Map(y))) => {
            x.len() == y.len()
                && x.iter().all(|(k, v)| match y.get(k) {
                    Some(w) => values_eq(a_doc, v, b_doc, w, seen),
                    None => false,
                })
        }
        (Some(Collection::Omap(x)), Some(Collection::Omap(y)))
        | (Some(Collection::Pairs(x)), Some(Collection::Pairs(y))) => pairs_eq(x, y, seen),
        (Some(Collection::Set(x)), Some(Collection::Set(y))) => {
            x.len() == y.len() && x.iter().all(|k| y.contains(k))
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use facet_testhelpers::test;

    #[test]
    fn test_keys_reject_collections() {
        let mut doc = Document::default();
        let seq = doc.seq([]);
        assert!(Key::new(seq).is_none());
        assert!(Key::new(Value::Int(1)).is_some());
    }

    #[test]
    fn test_float_keys() {
        let mut map = IndexMap::new();
        map.insert(Key::new(Value::Float(f64::NAN)).unwrap(), Value::Int(1));
        map.insert(Key::new(Value::Float(f64::NAN)).unwrap(), Value::Int(2));
        map.insert(Key::new(Value::Float(0.0)).unwrap(), Value::Int(3));
        map.insert(Key::new(Value::Float(-0.0)).unwrap(), Value::Int(4));
        assert_eq!(map.len(), 2);
    }

    #[test]
    fn test_lookup_and_items() {
        let mut doc = Document::default();
        let items = doc.seq([Value::Int(1), Value::Int(2)]);
        let root = doc.map([("a", items.clone()), ("b", Value::Null)]);
        doc.set_root(root.clone());
        assert_eq!(doc.lookup(&root, "a"), Some(&items));
        assert_eq!(
            doc.items(&items),
            Some(&[Value::Int(1), Value::Int(2)][..])
        );
        assert_eq!(doc.kind_of(&root), ValueKind::Map);
    }

    #[test]
    fn test_content_eq_ignores_arena_layout() {
        let mut a = Document::default();
        let inner = a.seq([Value::from("x")]);
        let root = a.seq([Value::Int(1), inner]);
        a.set_root(root);

        let mut b = Document::default();
        b.alloc(Collection::Seq(Vec::new()));
        let inner = b.seq([Value::from("x")]);
        let root = b.seq([Value::Int(1), inner]);
        b.set_root(root);

        assert!(a.content_eq(&b));
        assert_ne!(a, b);
    }

    #[test]
    fn test_content_eq_with_cycles() {
        let mut a = Document::default();
        let root = a.seq([]);
        if let Some(Collection::Seq(items)) = a.get_mut(root.as_handle().unwrap()) {
            items.push(root.clone());
        }
        a.set_root(root);
        assert!(a.content_eq(&a.clone()));
    }
}
