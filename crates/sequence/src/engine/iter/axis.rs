//! Axis iterators over an [`XdmNode`] tree.
//!
//! Each axis is an explicit state machine stepping through the tree one node at a time. The
//! iterator keeps the next node that passes the node test peeked, which is what makes
//! `has_next` cheap. A stepping primitive that reports an inconsistent tree ends the axis
//! (with a warning) instead of failing the evaluation.
use core::fmt;
use smallvec::SmallVec;
use tracing::warn;

use super::{LookaheadIterator, SequenceIterator};
use crate::engine::runtime::Error;
use crate::model::{NodeKind, NodeTest, XdmNode, path_to_root};
use crate::xdm::XdmItem;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Axis {
    SelfAxis,
    Child,
    Descendant,
    DescendantOrSelf,
    Parent,
    Ancestor,
    AncestorOrSelf,
    FollowingSibling,
    PrecedingSibling,
    Following,
    Preceding,
    Attribute,
    Namespace,
    /// Preceding nodes and ancestors in reverse document order. Internal: used for numbering,
    /// not reachable through [`Axis::from_name`].
    PrecedingOrAncestor,
}

impl Axis {
    pub fn from_name(name: &str) -> Option<Self> {
        Some(match name {
            "self" => Axis::SelfAxis,
            "child" => Axis::Child,
            "descendant" => Axis::Descendant,
            "descendant-or-self" => Axis::DescendantOrSelf,
            "parent" => Axis::Parent,
            "ancestor" => Axis::Ancestor,
            "ancestor-or-self" => Axis::AncestorOrSelf,
            "following-sibling" => Axis::FollowingSibling,
            "preceding-sibling" => Axis::PrecedingSibling,
            "following" => Axis::Following,
            "preceding" => Axis::Preceding,
            "attribute" => Axis::Attribute,
            "namespace" => Axis::Namespace,
            _ => return None,
        })
    }

    pub fn name(&self) -> &'static str {
        match self {
            Axis::SelfAxis => "self",
            Axis::Child => "child",
            Axis::Descendant => "descendant",
            Axis::DescendantOrSelf => "descendant-or-self",
            Axis::Parent => "parent",
            Axis::Ancestor => "ancestor",
            Axis::AncestorOrSelf => "ancestor-or-self",
            Axis::FollowingSibling => "following-sibling",
            Axis::PrecedingSibling => "preceding-sibling",
            Axis::Following => "following",
            Axis::Preceding => "preceding",
            Axis::Attribute => "attribute",
            Axis::Namespace => "namespace",
            Axis::PrecedingOrAncestor => "preceding-or-ancestor",
        }
    }

    /// Reverse axes deliver nodes nearest-first, i.e. in reverse document order.
    pub fn is_reverse(&self) -> bool {
        matches!(
            self,
            Axis::Parent
                | Axis::Ancestor
                | Axis::AncestorOrSelf
                | Axis::PrecedingSibling
                | Axis::Preceding
                | Axis::PrecedingOrAncestor
        )
    }
}

impl fmt::Display for Axis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

enum AxisState<N> {
    Done,
    // At most one node (self, parent, attribute by name)
    Once(Option<N>),
    Buffered(std::vec::IntoIter<N>),
    // Attribute storage with tombstones
    Slots {
        slots: Vec<Option<N>>,
        index: usize,
    },
    Siblings {
        next: Option<N>,
        forward: bool,
    },
    Ancestors {
        next: Option<N>,
    },
    // Pre-order walk that stops at the first node not deeper than the anchor
    Descend {
        next: Option<N>,
        anchor_depth: usize,
    },
    Forward {
        next: Option<N>,
    },
    Backward {
        next: Option<N>,
        skip: SmallVec<[N; 16]>,
    },
}

/// Node iterator for one axis step from a fixed origin node.
pub struct AxisIterator<N: XdmNode> {
    axis: Axis,
    origin: N,
    test: NodeTest,
    state: AxisState<N>,
    pending: Option<N>,
    current: Option<XdmItem<N>>,
    position: i64,
}

impl<N: XdmNode> fmt::Debug for AxisIterator<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AxisIterator")
            .field("axis", &self.axis)
            .field("origin", &self.origin)
            .field("test", &self.test)
            .field("position", &self.position)
            .finish_non_exhaustive()
    }
}

/// Unwrap a stepping result, turning a tree anomaly into the end of the axis.
fn settle<N>(axis: Axis, step: Result<Option<N>, Error>) -> Option<N> {
    step.unwrap_or_else(|e| {
        warn!(axis = %axis, error = %e, "inconsistent tree while stepping; ending axis");
        None
    })
}

/// First node after the subtree rooted at `n`.
fn after_subtree<N: XdmNode>(n: &N) -> Option<N> {
    let mut cur = Some(n.clone());
    while let Some(c) = cur {
        if let Some(sib) = c.next_sibling() {
            return Some(sib);
        }
        cur = c.parent();
    }
    None
}

impl<N: XdmNode> AxisIterator<N> {
    pub fn new(origin: N, axis: Axis, test: NodeTest) -> Self {
        let state = Self::init_state(&origin, axis, &test);
        let mut it = Self { axis, origin, test, state, pending: None, current: None, position: 0 };
        it.fill_pending();
        it
    }

    fn init_state(origin: &N, axis: Axis, test: &NodeTest) -> AxisState<N> {
        let is_attr = matches!(origin.kind(), NodeKind::Attribute | NodeKind::Namespace);
        match axis {
            Axis::SelfAxis => AxisState::Once(Some(origin.clone())),
            Axis::Parent => AxisState::Once(origin.parent()),
            Axis::Child if is_attr => AxisState::Done,
            Axis::Child => AxisState::Buffered(origin.children().collect::<Vec<_>>().into_iter()),
            Axis::Descendant if is_attr => AxisState::Done,
            Axis::Descendant => AxisState::Descend { next: origin.children().next(), anchor_depth: origin.depth() },
            Axis::DescendantOrSelf if is_attr => AxisState::Once(Some(origin.clone())),
            Axis::DescendantOrSelf => AxisState::Descend { next: Some(origin.clone()), anchor_depth: origin.depth() },
            Axis::Ancestor => AxisState::Ancestors { next: origin.parent() },
            Axis::AncestorOrSelf => AxisState::Ancestors { next: Some(origin.clone()) },
            Axis::FollowingSibling => AxisState::Siblings { next: origin.next_sibling(), forward: true },
            Axis::PrecedingSibling => AxisState::Siblings { next: origin.previous_sibling(), forward: false },
            Axis::Following => {
                // Attributes continue at their parent's successor, which includes the parent's children.
                let next = if is_attr { settle(axis, origin.next_in_document()) } else { after_subtree(origin) };
                AxisState::Forward { next }
            }
            Axis::Preceding => AxisState::Backward {
                next: settle(axis, origin.previous_in_document()),
                skip: SmallVec::from_vec(path_to_root(origin.clone())),
            },
            Axis::PrecedingOrAncestor => {
                AxisState::Backward { next: settle(axis, origin.previous_in_document()), skip: SmallVec::new() }
            }
            Axis::Attribute if origin.kind() != NodeKind::Element => AxisState::Done,
            Axis::Attribute => match test.single_name() {
                Some(name) if matches!(test, NodeTest::Name { kind: NodeKind::Attribute, .. }) => {
                    AxisState::Once(origin.attribute_by_name(name))
                }
                _ => AxisState::Slots { slots: origin.attribute_slots(), index: 0 },
            },
            Axis::Namespace if origin.kind() != NodeKind::Element => AxisState::Done,
            Axis::Namespace => AxisState::Buffered(origin.namespaces().collect::<Vec<_>>().into_iter()),
        }
    }

    /// Next node on the axis, before node-test filtering.
    fn step(&mut self) -> Option<N> {
        let axis = self.axis;
        match &mut self.state {
            AxisState::Done => None,
            AxisState::Once(slot) => slot.take(),
            AxisState::Buffered(it) => it.next(),
            AxisState::Slots { slots, index } => {
                while *index < slots.len() {
                    let slot = slots[*index].take();
                    *index += 1;
                    if slot.is_some() {
                        return slot;
                    }
                }
                None
            }
            AxisState::Siblings { next, forward } => {
                let n = next.take()?;
                *next = if *forward { n.next_sibling() } else { n.previous_sibling() };
                Some(n)
            }
            AxisState::Ancestors { next } => {
                let n = next.take()?;
                *next = n.parent();
                Some(n)
            }
            AxisState::Descend { next, anchor_depth } => {
                let n = next.take()?;
                let depth = *anchor_depth;
                *next = settle(axis, n.next_in_document()).filter(|s| s.depth() > depth);
                Some(n)
            }
            AxisState::Forward { next } => {
                let n = next.take()?;
                *next = settle(axis, n.next_in_document());
                Some(n)
            }
            AxisState::Backward { next, skip } => loop {
                let n = next.take()?;
                *next = settle(axis, n.previous_in_document());
                if !skip.contains(&n) {
                    return Some(n);
                }
            },
        }
    }

    fn fill_pending(&mut self) {
        while let Some(n) = self.step() {
            if self.test.matches(&n) {
                self.pending = Some(n);
                return;
            }
        }
        self.pending = None;
        self.state = AxisState::Done;
    }
}

impl<N: XdmNode> SequenceIterator<N> for AxisIterator<N> {
    fn next_item(&mut self) -> Result<Option<XdmItem<N>>, Error> {
        match self.pending.take() {
            Some(n) if self.position >= 0 => {
                self.fill_pending();
                let item = XdmItem::Node(n);
                self.current = Some(item.clone());
                self.position += 1;
                Ok(Some(item))
            }
            _ => {
                self.current = None;
                self.position = -1;
                Ok(None)
            }
        }
    }

    fn current(&self) -> Option<&XdmItem<N>> {
        self.current.as_ref()
    }

    fn position(&self) -> i64 {
        self.position
    }

    fn close(&mut self) {
        self.pending = None;
        self.state = AxisState::Done;
    }

    fn restart(&self) -> Result<Box<dyn SequenceIterator<N>>, Error> {
        Ok(Box::new(AxisIterator::new(self.origin.clone(), self.axis, self.test.clone())))
    }

    fn lookahead(&self) -> Option<&dyn LookaheadIterator> {
        Some(self)
    }
}

impl<N: XdmNode> LookaheadIterator for AxisIterator<N> {
    fn has_next(&self) -> bool {
        self.position >= 0 && self.pending.is_some()
    }
}
