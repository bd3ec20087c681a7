//! Pull-based sequence iterators.
//!
//! A [`SequenceIterator`] is a cursor: `next_item` advances, `current` and `position` read the
//! cursor state without side effects, and `restart` hands out an independent cursor positioned
//! before the first item. Position is 0 before the first advance, N after N successful advances
//! and -1 once the iterator is exhausted; exhaustion is permanent.
//!
//! Optional capabilities (lookahead, length, materialization, reversal) are exposed through
//! accessor methods returning capability trait objects. [`SequenceIterator::properties`] is
//! derived from those accessors, so decorators only need to decide what they forward.
use core::ops::{BitOr, BitOrAssign};
use std::sync::Arc;

use crate::engine::runtime::Error;
use crate::model::XdmNode;
use crate::xdm::XdmItem;

pub mod axis;
pub mod group;
pub mod range;
pub mod wrap;

pub use axis::{Axis, AxisIterator};
pub use group::{GroupAdjacentIterator, GroupByIterator, GroupIterator};
pub use range::{BigRangeIterator, RangeIterator, ReverseRangeIterator, make_range_iterator};
pub use wrap::{RemoveIterator, WrappingFunction, WrappingIterator};

/// Bit set of optional capabilities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct IteratorProperties(u8);

impl IteratorProperties {
    pub const LOOKAHEAD: Self = Self(1);
    pub const LAST_POSITION_FINDER: Self = Self(1 << 1);
    pub const GROUNDED: Self = Self(1 << 2);
    pub const REVERSIBLE: Self = Self(1 << 3);

    pub const fn empty() -> Self {
        Self(0)
    }

    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }
}

impl BitOr for IteratorProperties {
    type Output = Self;
    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl BitOrAssign for IteratorProperties {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

pub trait SequenceIterator<N>: Send {
    /// Advance and return the new current item, or `None` once exhausted.
    fn next_item(&mut self) -> Result<Option<XdmItem<N>>, Error>;

    fn current(&self) -> Option<&XdmItem<N>>;

    fn position(&self) -> i64;

    /// Release held resources. Idempotent.
    fn close(&mut self) {}

    /// Independent cursor over the same sequence, positioned before the first item.
    fn restart(&self) -> Result<Box<dyn SequenceIterator<N>>, Error>;

    fn lookahead(&self) -> Option<&dyn LookaheadIterator> {
        None
    }

    fn last_position_finder(&self) -> Option<&dyn LastPositionFinder> {
        None
    }

    fn grounded(&self) -> Option<&dyn GroundedIterator<N>> {
        None
    }

    fn reversible(&self) -> Option<&dyn ReversibleIterator<N>> {
        None
    }

    fn properties(&self) -> IteratorProperties {
        let mut props = IteratorProperties::empty();
        if self.lookahead().is_some() {
            props |= IteratorProperties::LOOKAHEAD;
        }
        if self.last_position_finder().is_some() {
            props |= IteratorProperties::LAST_POSITION_FINDER;
        }
        if self.grounded().is_some() {
            props |= IteratorProperties::GROUNDED;
        }
        if self.reversible().is_some() {
            props |= IteratorProperties::REVERSIBLE;
        }
        props
    }
}

pub trait LookaheadIterator {
    /// Whether another call to `next_item` would produce an item.
    fn has_next(&self) -> bool;
}

pub trait LastPositionFinder {
    /// Total number of items, independent of how far the cursor has advanced.
    fn length(&self) -> Result<i64, Error>;
}

pub trait GroundedIterator<N> {
    /// The whole sequence, independent of the cursor position.
    fn materialize(&self) -> Result<Vec<XdmItem<N>>, Error>;
}

pub trait ReversibleIterator<N> {
    fn reverse_iterator(&self) -> Result<Box<dyn SequenceIterator<N>>, Error>;
}

/// Length of the sequence: direct if the iterator knows it, otherwise by counting a restarted copy.
pub fn count_items<N>(iter: &dyn SequenceIterator<N>) -> Result<i64, Error> {
    if let Some(finder) = iter.last_position_finder() {
        return finder.length();
    }
    let mut copy = iter.restart()?;
    let mut n = 0i64;
    while copy.next_item()?.is_some() {
        n += 1;
    }
    copy.close();
    Ok(n)
}

/// Drain the remaining items of `iter`.
pub fn collect_items<N>(iter: &mut dyn SequenceIterator<N>) -> Result<Vec<XdmItem<N>>, Error> {
    let mut out = Vec::new();
    while let Some(item) = iter.next_item()? {
        out.push(item);
    }
    Ok(out)
}

/// Std iterator over the remaining items. Stops after the first error.
pub fn items<'a, N>(iter: &'a mut dyn SequenceIterator<N>) -> Items<'a, N> {
    Items { inner: iter, done: false }
}

pub struct Items<'a, N> {
    inner: &'a mut dyn SequenceIterator<N>,
    done: bool,
}

impl<N> Iterator for Items<'_, N> {
    type Item = Result<XdmItem<N>, Error>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.inner.next_item() {
            Ok(Some(item)) => Some(Ok(item)),
            Ok(None) => {
                self.done = true;
                None
            }
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}

/// Iterator over a shared, already materialized slice.
pub struct ListIterator<N> {
    items: Arc<[XdmItem<N>]>,
    start: usize,
    end: usize,
    next_index: usize,
    position: i64,
}

impl<N: XdmNode> ListIterator<N> {
    pub fn new(items: Vec<XdmItem<N>>) -> Self {
        Self::from_shared(items.into())
    }

    pub fn from_shared(items: Arc<[XdmItem<N>]>) -> Self {
        let end = items.len();
        Self { items, start: 0, end, next_index: 0, position: 0 }
    }

    /// Sub-list covering positions `from..to` (0-based, exclusive end, clamped), sharing storage.
    pub fn slice(&self, from: usize, to: usize) -> Self {
        let len = self.end - self.start;
        let to = to.min(len);
        let from = from.min(to);
        Self {
            items: self.items.clone(),
            start: self.start + from,
            end: self.start + to,
            next_index: self.start + from,
            position: 0,
        }
    }

    fn as_slice(&self) -> &[XdmItem<N>] {
        &self.items[self.start..self.end]
    }
}

impl<N: XdmNode> SequenceIterator<N> for ListIterator<N> {
    fn next_item(&mut self) -> Result<Option<XdmItem<N>>, Error> {
        if self.position < 0 {
            return Ok(None);
        }
        if self.next_index < self.end {
            let item = self.items[self.next_index].clone();
            self.next_index += 1;
            self.position += 1;
            Ok(Some(item))
        } else {
            self.position = -1;
            Ok(None)
        }
    }

    fn current(&self) -> Option<&XdmItem<N>> {
        if self.position > 0 { self.items.get(self.next_index - 1) } else { None }
    }

    fn position(&self) -> i64 {
        self.position
    }

    fn restart(&self) -> Result<Box<dyn SequenceIterator<N>>, Error> {
        Ok(Box::new(self.slice(0, self.end - self.start)))
    }

    fn lookahead(&self) -> Option<&dyn LookaheadIterator> {
        Some(self)
    }

    fn last_position_finder(&self) -> Option<&dyn LastPositionFinder> {
        Some(self)
    }

    fn grounded(&self) -> Option<&dyn GroundedIterator<N>> {
        Some(self)
    }

    fn reversible(&self) -> Option<&dyn ReversibleIterator<N>> {
        Some(self)
    }
}

impl<N: XdmNode> LookaheadIterator for ListIterator<N> {
    fn has_next(&self) -> bool {
        self.position >= 0 && self.next_index < self.end
    }
}

impl<N: XdmNode> LastPositionFinder for ListIterator<N> {
    fn length(&self) -> Result<i64, Error> {
        Ok((self.end - self.start) as i64)
    }
}

impl<N: XdmNode> GroundedIterator<N> for ListIterator<N> {
    fn materialize(&self) -> Result<Vec<XdmItem<N>>, Error> {
        Ok(self.as_slice().to_vec())
    }
}

impl<N: XdmNode> ReversibleIterator<N> for ListIterator<N> {
    fn reverse_iterator(&self) -> Result<Box<dyn SequenceIterator<N>>, Error> {
        Ok(Box::new(ListIterator::new(self.as_slice().iter().rev().cloned().collect())))
    }
}

/// The empty sequence.
pub struct EmptyIterator {
    position: i64,
}

impl EmptyIterator {
    pub fn new() -> Self {
        Self { position: 0 }
    }
}

impl Default for EmptyIterator {
    fn default() -> Self {
        Self::new()
    }
}

impl<N: XdmNode> SequenceIterator<N> for EmptyIterator {
    fn next_item(&mut self) -> Result<Option<XdmItem<N>>, Error> {
        self.position = -1;
        Ok(None)
    }

    fn current(&self) -> Option<&XdmItem<N>> {
        None
    }

    fn position(&self) -> i64 {
        self.position
    }

    fn restart(&self) -> Result<Box<dyn SequenceIterator<N>>, Error> {
        Ok(Box::new(EmptyIterator::new()))
    }

    fn lookahead(&self) -> Option<&dyn LookaheadIterator> {
        Some(self)
    }

    fn last_position_finder(&self) -> Option<&dyn LastPositionFinder> {
        Some(self)
    }

    fn grounded(&self) -> Option<&dyn GroundedIterator<N>> {
        Some(self)
    }

    fn reversible(&self) -> Option<&dyn ReversibleIterator<N>> {
        Some(self)
    }
}

impl LookaheadIterator for EmptyIterator {
    fn has_next(&self) -> bool {
        false
    }
}

impl LastPositionFinder for EmptyIterator {
    fn length(&self) -> Result<i64, Error> {
        Ok(0)
    }
}

impl<N: XdmNode> GroundedIterator<N> for EmptyIterator {
    fn materialize(&self) -> Result<Vec<XdmItem<N>>, Error> {
        Ok(Vec::new())
    }
}

impl<N: XdmNode> ReversibleIterator<N> for EmptyIterator {
    fn reverse_iterator(&self) -> Result<Box<dyn SequenceIterator<N>>, Error> {
        Ok(Box::new(EmptyIterator::new()))
    }
}

/// A sequence of exactly one item.
pub struct SingletonIterator<N> {
    item: XdmItem<N>,
    position: i64,
}

impl<N: XdmNode> SingletonIterator<N> {
    pub fn new(item: XdmItem<N>) -> Self {
        Self { item, position: 0 }
    }
}

impl<N: XdmNode> SequenceIterator<N> for SingletonIterator<N> {
    fn next_item(&mut self) -> Result<Option<XdmItem<N>>, Error> {
        if self.position == 0 {
            self.position = 1;
            Ok(Some(self.item.clone()))
        } else {
            self.position = -1;
            Ok(None)
        }
    }

    fn current(&self) -> Option<&XdmItem<N>> {
        (self.position == 1).then_some(&self.item)
    }

    fn position(&self) -> i64 {
        self.position
    }

    fn restart(&self) -> Result<Box<dyn SequenceIterator<N>>, Error> {
        Ok(Box::new(SingletonIterator::new(self.item.clone())))
    }

    fn lookahead(&self) -> Option<&dyn LookaheadIterator> {
        Some(self)
    }

    fn last_position_finder(&self) -> Option<&dyn LastPositionFinder> {
        Some(self)
    }

    fn grounded(&self) -> Option<&dyn GroundedIterator<N>> {
        Some(self)
    }
}

impl<N: XdmNode> LookaheadIterator for SingletonIterator<N> {
    fn has_next(&self) -> bool {
        self.position == 0
    }
}

impl<N: XdmNode> LastPositionFinder for SingletonIterator<N> {
    fn length(&self) -> Result<i64, Error> {
        Ok(1)
    }
}

impl<N: XdmNode> GroundedIterator<N> for SingletonIterator<N> {
    fn materialize(&self) -> Result<Vec<XdmItem<N>>, Error> {
        Ok(vec![self.item.clone()])
    }
}
