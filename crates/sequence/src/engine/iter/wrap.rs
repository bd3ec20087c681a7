//! Decorators over another iterator: node wrapping and positional removal.
use std::sync::Arc;

use super::{Axis, AxisIterator, LastPositionFinder, LookaheadIterator, SequenceIterator};
use crate::engine::runtime::Error;
use crate::model::{NodeTest, XdmNode};
use crate::xdm::{XdmAtomicValue, XdmItem};

/// Produces a wrapper (virtual copy) of a node, optionally under a known parent wrapper.
pub trait WrappingFunction<N>: Send + Sync {
    fn make_wrapper(&self, node: &N, parent: Option<&N>) -> N;
}

impl<N, F> WrappingFunction<N> for F
where
    F: Fn(&N, Option<&N>) -> N + Send + Sync,
{
    fn make_wrapper(&self, node: &N, parent: Option<&N>) -> N {
        self(node, parent)
    }
}

/// Wraps every node delivered by the base iterator; other items pass through unchanged.
///
/// In atomizing mode nodes are delivered as they are, since only their typed value will be
/// looked at.
pub struct WrappingIterator<N: XdmNode> {
    base: Box<dyn SequenceIterator<N>>,
    function: Arc<dyn WrappingFunction<N>>,
    parent: Option<N>,
    atomizing: bool,
    current: Option<XdmItem<N>>,
}

impl<N: XdmNode> WrappingIterator<N> {
    pub fn new(base: Box<dyn SequenceIterator<N>>, function: Arc<dyn WrappingFunction<N>>, parent: Option<N>) -> Self {
        Self { base, function, parent, atomizing: false, current: None }
    }

    pub fn set_atomizing(&mut self, atomizing: bool) {
        self.atomizing = atomizing;
    }

    /// Typed value of the current item.
    pub fn atomize_current(&self) -> Result<Vec<XdmAtomicValue>, Error> {
        match &self.current {
            Some(item) => item.atomize(),
            None => Ok(Vec::new()),
        }
    }

    pub fn string_value_current(&self) -> Result<Option<String>, Error> {
        self.current.as_ref().map(XdmItem::string_value).transpose()
    }

    /// Axis iterator from the current item, if it is a node.
    pub fn iterate_axis_current(&self, axis: Axis, test: NodeTest) -> Option<AxisIterator<N>> {
        let node = self.current.as_ref()?.as_node()?;
        Some(AxisIterator::new(node.clone(), axis, test))
    }
}

impl<N: XdmNode> SequenceIterator<N> for WrappingIterator<N> {
    fn next_item(&mut self) -> Result<Option<XdmItem<N>>, Error> {
        let next = match self.base.next_item()? {
            Some(XdmItem::Node(n)) if !self.atomizing => {
                Some(XdmItem::Node(self.function.make_wrapper(&n, self.parent.as_ref())))
            }
            other => other,
        };
        self.current = next.clone();
        Ok(next)
    }

    fn current(&self) -> Option<&XdmItem<N>> {
        self.current.as_ref()
    }

    fn position(&self) -> i64 {
        self.base.position()
    }

    fn close(&mut self) {
        self.base.close();
    }

    fn restart(&self) -> Result<Box<dyn SequenceIterator<N>>, Error> {
        let mut it = WrappingIterator::new(self.base.restart()?, self.function.clone(), self.parent.clone());
        it.atomizing = self.atomizing;
        Ok(Box::new(it))
    }

    fn lookahead(&self) -> Option<&dyn LookaheadIterator> {
        self.base.lookahead()
    }

    fn last_position_finder(&self) -> Option<&dyn LastPositionFinder> {
        self.base.last_position_finder()
    }
}

/// Delivers the base sequence without the item at a 1-based position.
///
/// Positions below 1 or beyond the end remove nothing.
pub struct RemoveIterator<N: XdmNode> {
    base: Box<dyn SequenceIterator<N>>,
    remove_position: i64,
    current: Option<XdmItem<N>>,
    position: i64,
}

impl<N: XdmNode> RemoveIterator<N> {
    pub fn new(base: Box<dyn SequenceIterator<N>>, remove_position: i64) -> Self {
        Self { base, remove_position, current: None, position: 0 }
    }
}

impl<N: XdmNode> SequenceIterator<N> for RemoveIterator<N> {
    fn next_item(&mut self) -> Result<Option<XdmItem<N>>, Error> {
        if self.position >= 0 {
            while let Some(item) = self.base.next_item()? {
                if self.base.position() == self.remove_position {
                    continue;
                }
                self.position += 1;
                self.current = Some(item.clone());
                return Ok(Some(item));
            }
        }
        self.current = None;
        self.position = -1;
        Ok(None)
    }

    fn current(&self) -> Option<&XdmItem<N>> {
        self.current.as_ref()
    }

    fn position(&self) -> i64 {
        self.position
    }

    fn close(&mut self) {
        self.base.close();
    }

    fn restart(&self) -> Result<Box<dyn SequenceIterator<N>>, Error> {
        Ok(Box::new(RemoveIterator::new(self.base.restart()?, self.remove_position)))
    }

    fn last_position_finder(&self) -> Option<&dyn LastPositionFinder> {
        self.base.last_position_finder().map(|_| self as &dyn LastPositionFinder)
    }
}

impl<N: XdmNode> LastPositionFinder for RemoveIterator<N> {
    fn length(&self) -> Result<i64, Error> {
        let len = super::count_items(self.base.as_ref())?;
        Ok(if (1..=len).contains(&self.remove_position) { len - 1 } else { len })
    }
}
