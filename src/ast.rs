//! Position-annotated syntax tree.
//!
//! Nodes live in an arena owned by the [`Ast`]; identities are [`NodeId`]
//! indices, parent links are plain back-references. The tree is immutable
//! once the parser hands it over. [`Node`] is a cheap `Copy` handle bundling
//! the arena reference with an id; all read access goes through it.
use serde_json::{Map, Number, Value};

use crate::diagnostics::Range;

/// Index of a node inside its document's arena.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct NodeId(u32);

impl NodeId {
    pub(crate) fn new(index: usize) -> NodeId {
        NodeId(u32::try_from(index).expect("node count exceeds u32"))
    }

    pub(crate) fn index(self) -> usize {
        self.0 as usize
    }
}

/// One step of a path from the root to a node: a property name or an array
/// index.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum PathSegment {
    /// Property name within an object.
    Property(String),
    /// Zero-based index within an array.
    Index(usize),
}

/// Node payloads. Array and object children are in source order.
#[derive(Clone, Debug, PartialEq)]
pub enum NodeKind {
    /// The `null` literal.
    Null,
    /// `true` or `false`.
    Boolean(bool),
    /// A numeric literal. `integer` is true iff the literal text contains no
    /// `.` (exponent notation with an integral mantissa still counts).
    Number {
        /// Parsed value; `NaN` when the literal was malformed.
        value: f64,
        /// Whether the literal is an integer.
        integer: bool,
    },
    /// A string literal. `key` marks strings serving as property keys.
    String {
        /// Unescaped content.
        value: String,
        /// Whether this string is the key of a property.
        key: bool,
    },
    /// An array; children are the element nodes.
    Array(Vec<NodeId>),
    /// An object; children are `Property` nodes.
    Object(Vec<NodeId>),
    /// A `key: value` member of an object. `value` is absent when parsing
    /// recovered from a missing value.
    Property {
        /// The key string node.
        key: NodeId,
        /// The value node, if one was parsed.
        value: Option<NodeId>,
        /// Byte offset of the `:`, when present.
        colon_offset: Option<usize>,
    },
}

#[derive(Debug)]
pub(crate) struct NodeData {
    pub(crate) kind: NodeKind,
    pub(crate) range: Range,
    pub(crate) parent: Option<NodeId>,
    pub(crate) location: Option<PathSegment>,
}

/// The syntax tree of one document.
#[derive(Debug, Default)]
pub struct Ast {
    pub(crate) nodes: Vec<NodeData>,
    pub(crate) root: Option<NodeId>,
}

impl Ast {
    /// The root node; absent only for empty input.
    #[must_use]
    pub fn root(&self) -> Option<Node<'_>> {
        self.root.map(|id| self.node(id))
    }

    /// Handle for `id`.
    ///
    /// # Panics
    ///
    /// Panics if `id` does not belong to this tree.
    #[must_use]
    pub fn node(&self, id: NodeId) -> Node<'_> {
        assert!(id.index() < self.nodes.len(), "foreign node id");
        Node { ast: self, id }
    }

    /// The deepest node whose range contains `offset`. `include_end` makes
    /// the right bound inclusive, which is what hover-style queries at the
    /// very end of a token need.
    #[must_use]
    pub fn node_at_offset(&self, offset: usize, include_end: bool) -> Option<Node<'_>> {
        let root = self.root()?;
        root.find_at_offset(offset, include_end)
    }

    fn data(&self, id: NodeId) -> &NodeData {
        &self.nodes[id.index()]
    }
}

/// A borrowed view of one node.
#[derive(Clone, Copy, Debug)]
pub struct Node<'a> {
    ast: &'a Ast,
    id: NodeId,
}

impl<'a> Node<'a> {
    /// This node's arena id.
    #[must_use]
    pub fn id(&self) -> NodeId {
        self.id
    }

    /// The node payload.
    #[must_use]
    pub fn kind(&self) -> &'a NodeKind {
        &self.ast.data(self.id).kind
    }

    /// Source range covered by this node.
    #[must_use]
    pub fn range(&self) -> Range {
        self.ast.data(self.id).range
    }

    /// The parent node; `None` for the root.
    #[must_use]
    pub fn parent(&self) -> Option<Node<'a>> {
        self.ast.data(self.id).parent.map(|id| self.ast.node(id))
    }

    /// Path segment connecting this node to its parent: the key for property
    /// nodes, the index for array elements, absent otherwise.
    #[must_use]
    pub fn location(&self) -> Option<&'a PathSegment> {
        self.ast.data(self.id).location.as_ref()
    }

    /// The type name used by schema `type` assertions.
    #[must_use]
    pub fn node_type(&self) -> &'static str {
        match self.kind() {
            NodeKind::Null => "null",
            NodeKind::Boolean(_) => "boolean",
            NodeKind::Number { .. } => "number",
            NodeKind::String { .. } => "string",
            NodeKind::Array(_) => "array",
            NodeKind::Object(_) => "object",
            NodeKind::Property { .. } => "property",
        }
    }

    /// Child nodes in source order. Properties yield key then value.
    #[must_use]
    pub fn children(&self) -> Vec<Node<'a>> {
        match self.kind() {
            NodeKind::Array(items) | NodeKind::Object(items) => {
                items.iter().map(|id| self.ast.node(*id)).collect()
            }
            NodeKind::Property { key, value, .. } => {
                let mut children = vec![self.ast.node(*key)];
                if let Some(value) = value {
                    children.push(self.ast.node(*value));
                }
                children
            }
            _ => Vec::new(),
        }
    }

    /// The sequence of locations from the root down to this node, skipping
    /// nodes that have none.
    #[must_use]
    pub fn path(&self) -> Vec<&'a PathSegment> {
        let mut segments = Vec::new();
        let mut current = Some(*self);
        while let Some(node) = current {
            if let Some(segment) = node.location() {
                segments.push(segment);
            }
            current = node.parent();
        }
        segments.reverse();
        segments
    }

    /// Pre-order traversal. The visitor returning `false` stops the walk;
    /// the return value reports whether the walk ran to completion.
    pub fn visit<F>(&self, visitor: &mut F) -> bool
    where
        F: FnMut(Node<'a>) -> bool,
    {
        let mut proceed = visitor(*self);
        for child in self.children() {
            if !proceed {
                break;
            }
            proceed = child.visit(visitor);
        }
        proceed
    }

    /// Projects the subtree to a plain value: objects become maps (absent
    /// property values omitted, duplicate keys last-wins), arrays become
    /// lists, scalars become themselves. Malformed numbers project to `Null`.
    #[must_use]
    pub fn value(&self) -> Value {
        match self.kind() {
            NodeKind::Null => Value::Null,
            NodeKind::Boolean(value) => Value::Bool(*value),
            NodeKind::Number { value, integer } => number_to_value(*value, *integer),
            NodeKind::String { value, .. } => Value::String(value.clone()),
            NodeKind::Array(items) => Value::Array(
                items
                    .iter()
                    .map(|id| self.ast.node(*id).value())
                    .collect(),
            ),
            NodeKind::Object(properties) => {
                let mut map = Map::new();
                for id in properties {
                    if let NodeKind::Property { key, value, .. } = self.ast.node(*id).kind() {
                        if let Some(value) = value {
                            if let Some(name) = self.ast.node(*key).string_value() {
                                map.insert(name.to_string(), self.ast.node(*value).value());
                            }
                        }
                    }
                }
                Value::Object(map)
            }
            NodeKind::Property { value, .. } => value
                .map(|id| self.ast.node(id).value())
                .unwrap_or(Value::Null),
        }
    }

    /// The key node, for property nodes.
    #[must_use]
    pub fn property_key(&self) -> Option<Node<'a>> {
        match self.kind() {
            NodeKind::Property { key, .. } => Some(self.ast.node(*key)),
            _ => None,
        }
    }

    /// The value node, for property nodes that have one.
    #[must_use]
    pub fn property_value(&self) -> Option<Node<'a>> {
        match self.kind() {
            NodeKind::Property { value, .. } => value.map(|id| self.ast.node(id)),
            _ => None,
        }
    }

    /// String payload, for string nodes.
    #[must_use]
    pub fn string_value(&self) -> Option<&'a str> {
        match self.kind() {
            NodeKind::String { value, .. } => Some(value),
            _ => None,
        }
    }

    fn find_at_offset(&self, offset: usize, include_end: bool) -> Option<Node<'a>> {
        if !self.range().contains(offset, include_end) {
            return None;
        }
        for child in self.children() {
            if child.range().start > offset {
                break;
            }
            if let Some(found) = child.find_at_offset(offset, include_end) {
                return Some(found);
            }
        }
        Some(*self)
    }
}

fn number_to_value(value: f64, integer: bool) -> Value {
    if integer
        && value.is_finite()
        && value.fract() == 0.0
        && value >= i64::MIN as f64
        && value <= i64::MAX as f64
    {
        return Value::Number(Number::from(value as i64));
    }
    Number::from_f64(value).map_or(Value::Null, Value::Number)
}
