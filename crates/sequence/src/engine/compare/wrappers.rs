use core::cmp::Ordering;

use super::AtomicComparer;
use super::key::ComparisonKey;
use super::numeric::{compare_nan_least, numeric_key, require_numeric};
use crate::engine::runtime::{DynamicContext, Error};
use crate::xdm::XdmAtomicValue;

/// Reverses the ordering of the wrapped comparer. Equality and keys are unchanged.
#[derive(Debug, Clone)]
pub struct DescendingComparer<C> {
    base: C,
}

impl<C: AtomicComparer> DescendingComparer<C> {
    pub fn new(base: C) -> Self {
        Self { base }
    }
}

impl<C: AtomicComparer> AtomicComparer for DescendingComparer<C> {
    fn compare(&self, a: Option<&XdmAtomicValue>, b: Option<&XdmAtomicValue>) -> Result<Ordering, Error> {
        Ok(self.base.compare(a, b)?.reverse())
    }

    fn equals(&self, a: Option<&XdmAtomicValue>, b: Option<&XdmAtomicValue>) -> Result<bool, Error> {
        self.base.equals(a, b)
    }

    fn comparison_key(&self, a: Option<&XdmAtomicValue>) -> Result<ComparisonKey, Error> {
        self.base.comparison_key(a)
    }

    fn provide_context(&self, ctx: &DynamicContext) -> Result<Self, Error> {
        Ok(Self { base: self.base.provide_context(ctx)? })
    }
}

/// Orders the empty sequence and NaN after every other value.
///
/// Used for `empty greatest` order specs. The wrapped comparer decides everything else.
#[derive(Debug, Clone)]
pub struct EmptyGreatestComparer<C> {
    base: C,
}

impl<C: AtomicComparer> EmptyGreatestComparer<C> {
    pub fn new(base: C) -> Self {
        Self { base }
    }
}

impl<C: AtomicComparer> AtomicComparer for EmptyGreatestComparer<C> {
    fn compare(&self, a: Option<&XdmAtomicValue>, b: Option<&XdmAtomicValue>) -> Result<Ordering, Error> {
        let (x, y) = match (a, b) {
            (None, None) => return Ok(Ordering::Equal),
            (None, Some(_)) => return Ok(Ordering::Greater),
            (Some(_), None) => return Ok(Ordering::Less),
            (Some(x), Some(y)) => (x, y),
        };
        match (x.is_nan(), y.is_nan()) {
            (true, true) => Ok(Ordering::Equal),
            (true, false) if y.is_numeric() => Ok(Ordering::Greater),
            (false, true) if x.is_numeric() => Ok(Ordering::Less),
            _ => self.base.compare(a, b),
        }
    }

    fn equals(&self, a: Option<&XdmAtomicValue>, b: Option<&XdmAtomicValue>) -> Result<bool, Error> {
        match (a, b) {
            (None, None) => Ok(true),
            (None, Some(_)) | (Some(_), None) => Ok(false),
            _ => self.base.equals(a, b),
        }
    }

    fn comparison_key(&self, a: Option<&XdmAtomicValue>) -> Result<ComparisonKey, Error> {
        match a {
            None => Ok(ComparisonKey::Empty),
            Some(_) => self.base.comparison_key(a),
        }
    }

    fn provide_context(&self, ctx: &DynamicContext) -> Result<Self, Error> {
        Ok(Self { base: self.base.provide_context(ctx)? })
    }
}

/// Numeric-only comparer: the empty sequence and NaN sort least, NaN equals NaN.
///
/// Non-numeric operands are a type error.
#[derive(Debug, Clone, Copy, Default)]
pub struct DoubleSortComparer;

impl AtomicComparer for DoubleSortComparer {
    fn compare(&self, a: Option<&XdmAtomicValue>, b: Option<&XdmAtomicValue>) -> Result<Ordering, Error> {
        match (a, b) {
            (None, None) => Ok(Ordering::Equal),
            (None, Some(y)) => require_numeric(y).map(|_| Ordering::Less),
            (Some(x), None) => require_numeric(x).map(|_| Ordering::Greater),
            (Some(x), Some(y)) => Ok(compare_nan_least(require_numeric(x)?, require_numeric(y)?)),
        }
    }

    fn equals(&self, a: Option<&XdmAtomicValue>, b: Option<&XdmAtomicValue>) -> Result<bool, Error> {
        Ok(self.compare(a, b)? == Ordering::Equal)
    }

    fn comparison_key(&self, a: Option<&XdmAtomicValue>) -> Result<ComparisonKey, Error> {
        match a {
            None => Ok(ComparisonKey::Empty),
            Some(v) => Ok(numeric_key(require_numeric(v)?)),
        }
    }

    fn provide_context(&self, _ctx: &DynamicContext) -> Result<Self, Error> {
        Ok(*self)
    }
}
