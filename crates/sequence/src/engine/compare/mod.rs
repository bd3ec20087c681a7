//! Atomic comparers used by sorting and grouping.
//!
//! Every comparer answers three questions about a pair of optional atomic values (`None` is the
//! empty sequence): a three-way ordering, an equality test, and a hashable [`ComparisonKey`]
//! such that `key(a) == key(b)` exactly when `equals(a, b)`. Wrappers change the ordering policy
//! without touching equality.
use core::cmp::Ordering;

use crate::engine::runtime::{DynamicContext, Error};
use crate::xdm::XdmAtomicValue;

mod base;
mod key;
mod numeric;
mod wrappers;

pub use base::{AtomicSortComparer, comparable};
pub use key::ComparisonKey;
pub use wrappers::{DescendingComparer, DoubleSortComparer, EmptyGreatestComparer};

pub trait AtomicComparer: Send + Sync {
    fn compare(&self, a: Option<&XdmAtomicValue>, b: Option<&XdmAtomicValue>) -> Result<Ordering, Error>;

    fn equals(&self, a: Option<&XdmAtomicValue>, b: Option<&XdmAtomicValue>) -> Result<bool, Error>;

    fn comparison_key(&self, a: Option<&XdmAtomicValue>) -> Result<ComparisonKey, Error>;

    /// Comparer bound to `ctx`: deferred collations and the implicit timezone are resolved.
    fn provide_context(&self, ctx: &DynamicContext) -> Result<Self, Error>
    where
        Self: Sized;
}

/// Closed set of comparers, composed by wrapping.
#[derive(Debug, Clone)]
pub enum Comparer {
    Sort(AtomicSortComparer),
    Numeric(DoubleSortComparer),
    Descending(Box<DescendingComparer<Comparer>>),
    EmptyGreatest(Box<EmptyGreatestComparer<Comparer>>),
}

impl Default for Comparer {
    fn default() -> Self {
        Comparer::Sort(AtomicSortComparer::codepoint())
    }
}

impl From<AtomicSortComparer> for Comparer {
    fn from(c: AtomicSortComparer) -> Self {
        Comparer::Sort(c)
    }
}

impl From<DoubleSortComparer> for Comparer {
    fn from(c: DoubleSortComparer) -> Self {
        Comparer::Numeric(c)
    }
}

impl Comparer {
    pub fn codepoint() -> Self {
        Self::default()
    }

    pub fn numeric() -> Self {
        Comparer::Numeric(DoubleSortComparer)
    }

    pub fn descending(self) -> Self {
        Comparer::Descending(Box::new(DescendingComparer::new(self)))
    }

    pub fn empty_greatest(self) -> Self {
        Comparer::EmptyGreatest(Box::new(EmptyGreatestComparer::new(self)))
    }

    fn inner(&self) -> &dyn AtomicComparer {
        match self {
            Comparer::Sort(c) => c,
            Comparer::Numeric(c) => c,
            Comparer::Descending(c) => c.as_ref(),
            Comparer::EmptyGreatest(c) => c.as_ref(),
        }
    }
}

impl AtomicComparer for Comparer {
    fn compare(&self, a: Option<&XdmAtomicValue>, b: Option<&XdmAtomicValue>) -> Result<Ordering, Error> {
        self.inner().compare(a, b)
    }

    fn equals(&self, a: Option<&XdmAtomicValue>, b: Option<&XdmAtomicValue>) -> Result<bool, Error> {
        self.inner().equals(a, b)
    }

    fn comparison_key(&self, a: Option<&XdmAtomicValue>) -> Result<ComparisonKey, Error> {
        self.inner().comparison_key(a)
    }

    fn provide_context(&self, ctx: &DynamicContext) -> Result<Self, Error> {
        Ok(match self {
            Comparer::Sort(c) => Comparer::Sort(c.provide_context(ctx)?),
            Comparer::Numeric(c) => Comparer::Numeric(c.provide_context(ctx)?),
            Comparer::Descending(c) => Comparer::Descending(Box::new(c.provide_context(ctx)?)),
            Comparer::EmptyGreatest(c) => Comparer::EmptyGreatest(Box::new(c.provide_context(ctx)?)),
        })
    }
}
