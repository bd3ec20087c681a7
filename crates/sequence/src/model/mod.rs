use crate::engine::runtime::{Error, ErrorCode};
use crate::xdm::XdmAtomicValue;

pub mod simple;

use core::cmp::Ordering;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    Document,
    Element,
    Attribute,
    Text,
    Comment,
    ProcessingInstruction,
    Namespace,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QName {
    pub prefix: Option<String>,
    pub local: String,
    pub ns_uri: Option<String>,
}

impl QName {
    pub fn local(local: impl Into<String>) -> Self {
        Self { prefix: None, local: local.into(), ns_uri: None }
    }

    pub fn with_ns(ns_uri: impl Into<String>, local: impl Into<String>) -> Self {
        Self { prefix: None, local: local.into(), ns_uri: Some(ns_uri.into()) }
    }

    /// Expanded-name equality: namespace URI and local part, prefix ignored.
    pub fn matches(&self, other: &QName) -> bool {
        self.local == other.local && self.ns_uri == other.ns_uri
    }
}

/// Fallback comparator for document order based on ancestry and stable sibling ordering.
///
/// Properties:
/// - If one node is an ancestor of the other, the ancestor precedes the descendant.
/// - Among siblings, attributes come first, then namespaces, then child nodes; within
///   each group the order provided by the adapter is preserved.
/// - If the nodes belong to different roots, returns an error (`err:FOER0000`) because
///   the fallback cannot establish a global order.
pub fn try_compare_by_ancestry<N: XdmNode>(a: &N, b: &N) -> Result<Ordering, Error> {
    if a == b {
        return Ok(Ordering::Equal);
    }
    let pa = path_to_root(a.clone());
    let pb = path_to_root(b.clone());
    let mut i = 0usize;
    let len = core::cmp::min(pa.len(), pb.len());
    while i < len && pa[i] == pb[i] {
        i += 1;
    }
    if i == len {
        // shorter path is ancestor
        return Ok(if pa.len() < pb.len() { Ordering::Less } else { Ordering::Greater });
    }
    if i == 0 {
        return Err(Error::from_code(
            ErrorCode::FOER0000,
            "document order requires adapter: nodes from different roots",
        ));
    }
    let parent = &pa[i - 1];
    let mut sibs: Vec<N> = Vec::new();
    sibs.extend(parent.attributes());
    sibs.extend(parent.namespaces());
    sibs.extend(parent.children());
    let posa = sibs.iter().position(|n| n == &pa[i]);
    let posb = sibs.iter().position(|n| n == &pb[i]);
    Ok(match (posa, posb) {
        (Some(aidx), Some(bidx)) => aidx.cmp(&bidx),
        _ => Ordering::Equal,
    })
}

/// Path from the root to `n` (inclusive).
pub(crate) fn path_to_root<N: XdmNode>(mut n: N) -> Vec<N> {
    let mut p = vec![n.clone()];
    while let Some(parent) = n.parent() {
        p.push(parent.clone());
        n = parent;
    }
    p.reverse();
    p
}

/// Node abstraction consumed by the axis iterators.
///
/// Only the structural accessors are required. Document-order stepping, sibling navigation,
/// depth and name-indexed attribute lookup have defaults derived from them; adapters backed by
/// flat arrays should override those for speed. The stepping primitives are fallible so that
/// an adapter can report a structurally inconsistent tree instead of panicking.
pub trait XdmNode: Clone + Eq + core::fmt::Debug + Send + Sync + 'static {
    type Children<'a>: Iterator<Item = Self> + Send + 'a
    where
        Self: 'a;
    type Attributes<'a>: Iterator<Item = Self> + Send + 'a
    where
        Self: 'a;
    type Namespaces<'a>: Iterator<Item = Self> + Send + 'a
    where
        Self: 'a;

    fn kind(&self) -> NodeKind;
    fn name(&self) -> Option<QName>;
    fn string_value(&self) -> String;

    fn parent(&self) -> Option<Self>;
    fn children(&self) -> Self::Children<'_>;
    fn attributes(&self) -> Self::Attributes<'_>;
    fn namespaces(&self) -> Self::Namespaces<'_>;

    /// Typed value used by atomization. Unvalidated trees yield `xs:untypedAtomic` for
    /// elements, attributes, text and documents and `xs:string` for the rest.
    fn typed_value(&self) -> Vec<XdmAtomicValue> {
        match self.kind() {
            NodeKind::Comment | NodeKind::ProcessingInstruction | NodeKind::Namespace => {
                vec![XdmAtomicValue::String(self.string_value())]
            }
            _ => vec![XdmAtomicValue::UntypedAtomic(self.string_value())],
        }
    }

    /// Attribute storage including deleted slots (`None`). Defaults to the live attributes.
    fn attribute_slots(&self) -> Vec<Option<Self>> {
        self.attributes().map(Some).collect()
    }

    /// Look up an attribute by expanded name. Adapters with a name index should override this.
    fn attribute_by_name(&self, name: &QName) -> Option<Self> {
        self.attributes().find(|a| a.name().is_some_and(|n| n.matches(name)))
    }

    /// Number of ancestors; the root has depth 0.
    fn depth(&self) -> usize {
        let mut depth = 0usize;
        let mut cur = self.parent();
        while let Some(p) = cur {
            depth += 1;
            cur = p.parent();
        }
        depth
    }

    fn next_sibling(&self) -> Option<Self> {
        if matches!(self.kind(), NodeKind::Attribute | NodeKind::Namespace) {
            return None;
        }
        let parent = self.parent()?;
        let mut it = parent.children();
        it.by_ref().find(|c| c == self)?;
        it.next()
    }

    fn previous_sibling(&self) -> Option<Self> {
        if matches!(self.kind(), NodeKind::Attribute | NodeKind::Namespace) {
            return None;
        }
        let parent = self.parent()?;
        let mut prev = None;
        for c in parent.children() {
            if &c == self {
                return prev;
            }
            prev = Some(c);
        }
        None
    }

    /// Pre-order successor over non-attribute nodes. Attributes and namespaces continue at
    /// their parent's successor, i.e. the parent's first child.
    fn next_in_document(&self) -> Result<Option<Self>, Error> {
        if matches!(self.kind(), NodeKind::Attribute | NodeKind::Namespace) {
            return match self.parent() {
                Some(p) => p.next_in_document(),
                None => Ok(None),
            };
        }
        if let Some(first) = self.children().next() {
            return Ok(Some(first));
        }
        let mut cur = Some(self.clone());
        while let Some(n) = cur {
            if let Some(sib) = n.next_sibling() {
                return Ok(Some(sib));
            }
            cur = n.parent();
        }
        Ok(None)
    }

    /// Reverse pre-order predecessor over non-attribute nodes; attributes step to their parent.
    fn previous_in_document(&self) -> Result<Option<Self>, Error> {
        if matches!(self.kind(), NodeKind::Attribute | NodeKind::Namespace) {
            return Ok(self.parent());
        }
        match self.previous_sibling() {
            Some(mut n) => {
                loop {
                    let last = n.children().last();
                    match last {
                        Some(l) => n = l,
                        None => break,
                    }
                }
                Ok(Some(n))
            }
            None => Ok(self.parent()),
        }
    }

    /// Optional hint for document order comparisons.
    fn doc_order_key(&self) -> Option<u64> {
        None
    }

    /// Default document order comparison uses ancestry and sibling order.
    fn compare_document_order(&self, other: &Self) -> Result<Ordering, Error> {
        if let (Some(a), Some(b)) = (self.doc_order_key(), other.doc_order_key()) {
            return Ok(a.cmp(&b));
        }
        try_compare_by_ancestry(self, other)
    }
}

/// Predicate over nodes used to filter axis output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeTest {
    /// `node()`
    AnyKind,
    /// `element()`, `text()`, ... without a name constraint.
    Kind(NodeKind),
    /// Exact expanded name of the given principal kind.
    Name { kind: NodeKind, name: QName },
    /// `*:local`
    LocalName { kind: NodeKind, local: String },
    /// `prefix:*`
    Namespace { kind: NodeKind, ns_uri: Option<String> },
    Union(Vec<NodeTest>),
}

impl NodeTest {
    pub fn element(local: &str) -> Self {
        NodeTest::Name { kind: NodeKind::Element, name: QName::local(local) }
    }

    pub fn attribute(local: &str) -> Self {
        NodeTest::Name { kind: NodeKind::Attribute, name: QName::local(local) }
    }

    pub fn matches<N: XdmNode>(&self, node: &N) -> bool {
        match self {
            NodeTest::AnyKind => true,
            NodeTest::Kind(kind) => node.kind() == *kind,
            NodeTest::Name { kind, name } => {
                node.kind() == *kind && node.name().is_some_and(|n| n.matches(name))
            }
            NodeTest::LocalName { kind, local } => {
                node.kind() == *kind && node.name().is_some_and(|n| &n.local == local)
            }
            NodeTest::Namespace { kind, ns_uri } => {
                node.kind() == *kind && node.name().is_some_and(|n| &n.ns_uri == ns_uri)
            }
            NodeTest::Union(tests) => tests.iter().any(|t| t.matches(node)),
        }
    }

    /// The single attribute/element name this test can match, if any.
    pub fn single_name(&self) -> Option<&QName> {
        match self {
            NodeTest::Name { name, .. } => Some(name),
            _ => None,
        }
    }
}
