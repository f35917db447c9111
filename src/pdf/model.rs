//! Object graph primitives
//!
//! A parsed PDF is held as a flat map from [`ObjectId`] to an ordered
//! [`NodeList`]. Each [`Node`] is one key/content pair: a dictionary entry,
//! an array element, the raw bytes of a stream, or the bare value of an
//! indirect object that holds a primitive.

use std::fmt;

/// First value handed out by the synthetic ID counter.
///
/// Fake IDs live in their own namespace, the base only keeps them visually
/// apart from object numbers when debugging.
pub const FAKE_ID_BASE: u32 = 4000;

/// Identifier of a node list.
///
/// Real IDs are PDF object numbers (`N 0 R`); real ID `0` is the trailer.
/// Fake IDs name inline substructure and are never written as indirect
/// objects. The two namespaces never collide, even for equal numbers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectId {
    is_real: bool,
    id: u32,
}

impl ObjectId {
    /// The trailer dictionary.
    pub const TRAILER: ObjectId = ObjectId { is_real: true, id: 0 };

    pub fn real(id: u32) -> Self {
        Self { is_real: true, id }
    }

    pub fn fake(id: u32) -> Self {
        Self { is_real: false, id }
    }

    pub fn is_real(&self) -> bool {
        self.is_real
    }

    pub fn id(&self) -> u32 {
        self.id
    }

    /// Same namespace, number shifted by `offset`.
    pub fn shifted(&self, offset: u32) -> Self {
        Self {
            is_real: self.is_real,
            id: self.id + offset,
        }
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_real {
            write!(f, "{}", self.id)
        } else {
            write!(f, "{}f", self.id)
        }
    }
}

/// What a node is keyed by inside its list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKey {
    /// Dictionary entry name, without the leading slash
    Name(String),
    /// Array position; only the kind matters when rendering
    Index(usize),
    /// The raw data of a stream object
    Stream,
    /// The only node of an indirect object whose value is a primitive
    SingleValue,
}

/// What a node holds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeContent {
    /// Already-formatted PDF token text (`/Name`, `12`, `(text)`, ...)
    Literal(String),
    /// Points at another node list, real or fake
    Reference(ObjectId),
    /// Raw (still encoded) stream bytes
    Stream(Vec<u8>),
    /// Formatted primitive value of a single-value object
    SingleObject(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node {
    pub key: NodeKey,
    pub content: NodeContent,
}

impl Node {
    pub fn name(name: impl Into<String>, content: NodeContent) -> Self {
        Self {
            key: NodeKey::Name(name.into()),
            content,
        }
    }

    pub fn index(index: usize, content: NodeContent) -> Self {
        Self {
            key: NodeKey::Index(index),
            content,
        }
    }

    pub fn stream(bytes: Vec<u8>) -> Self {
        Self {
            key: NodeKey::Stream,
            content: NodeContent::Stream(bytes),
        }
    }

    pub fn single(text: impl Into<String>) -> Self {
        Self {
            key: NodeKey::SingleValue,
            content: NodeContent::SingleObject(text.into()),
        }
    }

    /// `/Name literal` shorthand used when building objects by hand.
    pub fn literal(name: impl Into<String>, text: impl Into<String>) -> Self {
        Self::name(name, NodeContent::Literal(text.into()))
    }

    /// `/Name N 0 R` (or inline, for a fake target) shorthand.
    pub fn reference(name: impl Into<String>, target: ObjectId) -> Self {
        Self::name(name, NodeContent::Reference(target))
    }
}

/// Shape of a node list, fixed when the list is created.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListShape {
    Dictionary,
    Array,
    SingleValue,
}

impl ListShape {
    fn of(key: &NodeKey) -> Self {
        match key {
            NodeKey::Index(_) => ListShape::Array,
            NodeKey::SingleValue => ListShape::SingleValue,
            NodeKey::Name(_) | NodeKey::Stream => ListShape::Dictionary,
        }
    }
}

/// Ordered nodes owned by one [`ObjectId`].
///
/// Insertion order is preserved up to serialization. The shape is taken
/// from the first node pushed (or given explicitly for an empty list) and
/// the position of the stream node is cached so rendering never rescans.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeList {
    shape: ListShape,
    stream_at: Option<usize>,
    nodes: Vec<Node>,
}

impl NodeList {
    pub fn new(shape: ListShape) -> Self {
        Self {
            shape,
            stream_at: None,
            nodes: Vec::new(),
        }
    }

    pub fn from_nodes(shape: ListShape, nodes: Vec<Node>) -> Self {
        let mut list = Self::new(shape);
        for node in nodes {
            list.push(node);
        }
        list
    }

    pub(crate) fn for_first(node: &Node) -> Self {
        Self::new(ListShape::of(&node.key))
    }

    pub fn push(&mut self, node: Node) {
        if node.key == NodeKey::Stream {
            self.stream_at = Some(self.nodes.len());
        }
        self.nodes.push(node);
    }

    /// Drop the node at `index`, keeping the order of the rest.
    pub fn remove(&mut self, index: usize) -> Node {
        let node = self.nodes.remove(index);
        self.stream_at = self.nodes.iter().position(|n| n.key == NodeKey::Stream);
        node
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Node> {
        self.nodes.iter()
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn shape(&self) -> ListShape {
        self.shape
    }

    pub fn is_array(&self) -> bool {
        self.shape == ListShape::Array
    }

    pub fn is_single_value(&self) -> bool {
        self.shape == ListShape::SingleValue
    }

    pub fn is_stream(&self) -> bool {
        self.shape == ListShape::Dictionary && self.stream_at.is_some()
    }

    pub fn is_dictionary(&self) -> bool {
        self.shape == ListShape::Dictionary && self.stream_at.is_none()
    }

    pub fn stream_bytes(&self) -> Option<&[u8]> {
        let node = self.nodes.get(self.stream_at?)?;
        match &node.content {
            NodeContent::Stream(bytes) => Some(bytes),
            _ => None,
        }
    }

    /// Position of the dictionary entry called `name`.
    pub fn position(&self, name: &str) -> Option<usize> {
        self.nodes
            .iter()
            .position(|n| matches!(&n.key, NodeKey::Name(k) if k == name))
    }

    /// Content of the dictionary entry called `name`.
    pub fn get(&self, name: &str) -> Option<&NodeContent> {
        self.position(name).map(|i| &self.nodes[i].content)
    }

    /// Replace the content of `name` in place, or append a new entry.
    pub fn set(&mut self, name: &str, content: NodeContent) {
        match self.position(name) {
            Some(i) => self.nodes[i].content = content,
            None => self.push(Node::name(name, content)),
        }
    }
}

impl<'a> IntoIterator for &'a NodeList {
    type Item = &'a Node;
    type IntoIter = std::slice::Iter<'a, Node>;

    fn into_iter(self) -> Self::IntoIter {
        self.nodes.iter()
    }
}
