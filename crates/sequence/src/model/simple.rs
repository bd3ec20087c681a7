//! Simple in-memory tree implementation for `XdmNode` used in tests and quick prototypes.
//!
//! Attributes are stored in slots with a name index, so single-name attribute lookups are
//! direct. Removing an attribute leaves a tombstone (`None`) in its slot; the index is updated
//! and the remaining slots keep their positions.
//!
//! ```
//! use xpath_sequence::model::simple::{attr, elem};
//! use xpath_sequence::model::{QName, XdmNode};
//!
//! // <root id="r"><child>Hello</child></root>
//! let root = elem("root").attr(attr("id", "r")).child(elem("child")).build();
//! assert_eq!(root.attribute_by_name(&QName::local("id")).unwrap().string_value(), "r");
//! assert_eq!(root.children().count(), 1);
//! ```
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, PoisonError, RwLock, Weak};

use crate::model::{NodeKind, QName, XdmNode};

type NameKey = (Option<String>, String);

fn name_key(q: &QName) -> NameKey {
    (q.ns_uri.clone(), q.local.clone())
}

pub(crate) struct Inner {
    kind: NodeKind,
    name: Option<QName>,
    value: RwLock<Option<String>>, // text / attribute / PI content
    parent: RwLock<Option<Weak<Inner>>>,
    attributes: RwLock<Vec<Option<SimpleNode>>>, // slots; None marks a removed attribute
    attribute_index: RwLock<HashMap<NameKey, usize>>,
    namespaces: RwLock<Vec<SimpleNode>>,
    children: RwLock<Vec<SimpleNode>>,
}

/// A simple Arc-backed node implementation.
#[derive(Clone)]
pub struct SimpleNode(pub(crate) Arc<Inner>);

impl PartialEq for SimpleNode {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}
impl Eq for SimpleNode {}
impl std::hash::Hash for SimpleNode {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        Arc::as_ptr(&self.0).hash(state);
    }
}

impl fmt::Debug for SimpleNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SimpleNode")
            .field("kind", &self.0.kind)
            .field("name", &self.0.name.as_ref().map(|q| q.local.as_str()))
            .field("value", &*self.0.value.read().unwrap_or_else(PoisonError::into_inner))
            .finish()
    }
}

impl SimpleNode {
    fn new(kind: NodeKind, name: Option<QName>, value: Option<String>) -> Self {
        SimpleNode(Arc::new(Inner {
            kind,
            name,
            value: RwLock::new(value),
            parent: RwLock::new(None),
            attributes: RwLock::new(Vec::new()),
            attribute_index: RwLock::new(HashMap::new()),
            namespaces: RwLock::new(Vec::new()),
            children: RwLock::new(Vec::new()),
        }))
    }

    pub fn document() -> SimpleNodeBuilder {
        SimpleNodeBuilder::new(NodeKind::Document, None)
    }
    pub fn element(name: &str) -> SimpleNodeBuilder {
        SimpleNodeBuilder::new(NodeKind::Element, Some(QName::local(name)))
    }
    pub fn attribute(name: &str, value: &str) -> SimpleNode {
        SimpleNode::new(NodeKind::Attribute, Some(QName::local(name)), Some(value.to_string()))
    }
    pub fn text(value: &str) -> SimpleNode {
        SimpleNode::new(NodeKind::Text, None, Some(value.to_string()))
    }
    pub fn comment(value: &str) -> SimpleNode {
        SimpleNode::new(NodeKind::Comment, None, Some(value.to_string()))
    }
    pub fn namespace(prefix: &str, uri: &str) -> SimpleNode {
        SimpleNode::new(
            NodeKind::Namespace,
            Some(QName { prefix: Some(prefix.to_string()), local: prefix.to_string(), ns_uri: Some(uri.to_string()) }),
            Some(uri.to_string()),
        )
    }

    /// Delete an attribute, leaving a tombstone in its slot. Returns whether it existed.
    pub fn remove_attribute(&self, name: &QName) -> bool {
        let idx = self.0.attribute_index.write().unwrap_or_else(PoisonError::into_inner).remove(&name_key(name));
        match idx {
            Some(i) => {
                let mut slots = self.0.attributes.write().unwrap_or_else(PoisonError::into_inner);
                slots.get_mut(i).and_then(Option::take).is_some()
            }
            None => false,
        }
    }

    fn child_list(&self) -> Vec<SimpleNode> {
        self.0.children.read().map(|v| v.clone()).unwrap_or_default()
    }

    fn sibling_at(&self, offset: isize) -> Option<SimpleNode> {
        if matches!(self.0.kind, NodeKind::Attribute | NodeKind::Namespace) {
            return None;
        }
        let siblings = self.parent()?.child_list();
        let pos = siblings.iter().position(|c| c == self)?;
        let target = pos.checked_add_signed(offset)?;
        siblings.get(target).cloned()
    }
}

pub struct SimpleNodeBuilder {
    node: SimpleNode,
    pending_children: Vec<SimpleNode>,
    pending_attrs: Vec<SimpleNode>,
    pending_ns: Vec<SimpleNode>,
}

impl SimpleNodeBuilder {
    fn new(kind: NodeKind, name: Option<QName>) -> Self {
        Self {
            node: SimpleNode::new(kind, name, None),
            pending_children: Vec::new(),
            pending_attrs: Vec::new(),
            pending_ns: Vec::new(),
        }
    }

    pub fn child(mut self, child: impl Into<SimpleNodeOrBuilder>) -> Self {
        match child.into() {
            SimpleNodeOrBuilder::Built(n) => self.pending_children.push(n),
            SimpleNodeOrBuilder::Builder(b) => self.pending_children.push(b.build()),
        }
        self
    }
    pub fn attr(mut self, attr: SimpleNode) -> Self {
        debug_assert!(attr.kind() == NodeKind::Attribute);
        self.pending_attrs.push(attr);
        self
    }
    pub fn namespace(mut self, ns: SimpleNode) -> Self {
        debug_assert!(ns.kind() == NodeKind::Namespace);
        self.pending_ns.push(ns);
        self
    }

    pub fn build(self) -> SimpleNode {
        let parent = Arc::downgrade(&self.node.0);
        let adopt = |n: &SimpleNode| {
            *n.0.parent.write().unwrap_or_else(PoisonError::into_inner) = Some(parent.clone());
        };
        {
            let mut slots = self.node.0.attributes.write().unwrap_or_else(PoisonError::into_inner);
            let mut index = self.node.0.attribute_index.write().unwrap_or_else(PoisonError::into_inner);
            for a in self.pending_attrs {
                adopt(&a);
                if let Some(q) = &a.0.name {
                    index.insert(name_key(q), slots.len());
                }
                slots.push(Some(a));
            }
        }
        {
            let mut nss = self.node.0.namespaces.write().unwrap_or_else(PoisonError::into_inner);
            for n in self.pending_ns {
                adopt(&n);
                nss.push(n);
            }
        }
        {
            let mut ch = self.node.0.children.write().unwrap_or_else(PoisonError::into_inner);
            for c in self.pending_children {
                adopt(&c);
                ch.push(c);
            }
        }
        self.node
    }
}

pub enum SimpleNodeOrBuilder {
    Built(SimpleNode),
    Builder(SimpleNodeBuilder),
}
impl From<SimpleNode> for SimpleNodeOrBuilder {
    fn from(n: SimpleNode) -> Self {
        SimpleNodeOrBuilder::Built(n)
    }
}
impl From<SimpleNodeBuilder> for SimpleNodeOrBuilder {
    fn from(b: SimpleNodeBuilder) -> Self {
        SimpleNodeOrBuilder::Builder(b)
    }
}

// Convenience helper functions for concise test code
pub fn elem(name: &str) -> SimpleNodeBuilder {
    SimpleNode::element(name)
}
pub fn text(v: &str) -> SimpleNode {
    SimpleNode::text(v)
}
pub fn attr(name: &str, v: &str) -> SimpleNode {
    SimpleNode::attribute(name, v)
}
pub fn comment(v: &str) -> SimpleNode {
    SimpleNode::comment(v)
}
pub fn ns(prefix: &str, uri: &str) -> SimpleNode {
    SimpleNode::namespace(prefix, uri)
}
pub fn doc() -> SimpleNodeBuilder {
    SimpleNode::document()
}

impl XdmNode for SimpleNode {
    type Children<'a> = std::vec::IntoIter<SimpleNode>;
    type Attributes<'a> = std::vec::IntoIter<SimpleNode>;
    type Namespaces<'a> = std::vec::IntoIter<SimpleNode>;

    fn kind(&self) -> NodeKind {
        self.0.kind
    }
    fn name(&self) -> Option<QName> {
        self.0.name.clone()
    }
    fn string_value(&self) -> String {
        match self.kind() {
            NodeKind::Element | NodeKind::Document => {
                fn dfs(n: &SimpleNode, out: &mut String) {
                    for c in n.child_list() {
                        match c.kind() {
                            NodeKind::Text => out.push_str(&c.string_value()),
                            NodeKind::Element => dfs(&c, out),
                            _ => {}
                        }
                    }
                }
                let mut out = String::new();
                dfs(self, &mut out);
                out
            }
            _ => self.0.value.read().map(|v| v.clone().unwrap_or_default()).unwrap_or_default(),
        }
    }
    fn parent(&self) -> Option<Self> {
        self.0.parent.read().ok()?.as_ref().and_then(Weak::upgrade).map(SimpleNode)
    }
    fn children(&self) -> Self::Children<'_> {
        self.child_list().into_iter()
    }
    fn attributes(&self) -> Self::Attributes<'_> {
        self.attribute_slots().into_iter().flatten().collect::<Vec<_>>().into_iter()
    }
    fn namespaces(&self) -> Self::Namespaces<'_> {
        self.0.namespaces.read().map(|v| v.clone()).unwrap_or_default().into_iter()
    }
    fn attribute_slots(&self) -> Vec<Option<Self>> {
        self.0.attributes.read().map(|v| v.clone()).unwrap_or_default()
    }
    fn attribute_by_name(&self, name: &QName) -> Option<Self> {
        let idx = *self.0.attribute_index.read().ok()?.get(&name_key(name))?;
        self.0.attributes.read().ok()?.get(idx).cloned().flatten()
    }
    fn next_sibling(&self) -> Option<Self> {
        self.sibling_at(1)
    }
    fn previous_sibling(&self) -> Option<Self> {
        self.sibling_at(-1)
    }
}
