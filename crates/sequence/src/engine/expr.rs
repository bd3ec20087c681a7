//! Externally supplied key expressions.
use core::fmt;

use crate::engine::iter::{EmptyIterator, ListIterator, SequenceIterator, SingletonIterator};
use crate::engine::runtime::{DynamicContext, Error};
use crate::model::XdmNode;
use crate::xdm::{XdmAtomicValue, XdmItem};

/// Context item, position and dynamic context seen by a key expression.
pub struct Focus<'a, N> {
    pub item: &'a XdmItem<N>,
    /// 1-based position of `item` in its population.
    pub position: i64,
    pub context: &'a DynamicContext,
}

impl<N: fmt::Debug> fmt::Debug for Focus<'_, N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Focus").field("item", self.item).field("position", &self.position).finish_non_exhaustive()
    }
}

/// An evaluatable expression, e.g. a compiled `group-by` or sort key.
pub trait Expression<N: XdmNode>: Send + Sync {
    /// Evaluate to zero or one atomic value.
    fn evaluate_item(&self, focus: &Focus<'_, N>) -> Result<Option<XdmAtomicValue>, Error>;

    /// Evaluate to a sequence. Defaults to the result of [`Expression::evaluate_item`].
    fn evaluate_sequence(&self, focus: &Focus<'_, N>) -> Result<Box<dyn SequenceIterator<N>>, Error> {
        Ok(match self.evaluate_item(focus)? {
            Some(v) => Box::new(SingletonIterator::new(XdmItem::Atomic(v))),
            None => Box::new(EmptyIterator::new()),
        })
    }
}

pub struct FnExpression<F> {
    f: F,
}

impl<N, F> Expression<N> for FnExpression<F>
where
    N: XdmNode,
    F: Fn(&Focus<'_, N>) -> Result<Option<XdmAtomicValue>, Error> + Send + Sync,
{
    fn evaluate_item(&self, focus: &Focus<'_, N>) -> Result<Option<XdmAtomicValue>, Error> {
        (self.f)(focus)
    }
}

/// Adapt a closure into an [`Expression`].
pub fn expression_fn<N, F>(f: F) -> FnExpression<F>
where
    N: XdmNode,
    F: Fn(&Focus<'_, N>) -> Result<Option<XdmAtomicValue>, Error> + Send + Sync,
{
    FnExpression { f }
}

/// Key expression that atomizes the context item itself (`.`).
pub struct ContextItemExpression;

impl<N: XdmNode> Expression<N> for ContextItemExpression {
    fn evaluate_item(&self, focus: &Focus<'_, N>) -> Result<Option<XdmAtomicValue>, Error> {
        Ok(focus.item.atomize()?.into_iter().next())
    }

    fn evaluate_sequence(&self, focus: &Focus<'_, N>) -> Result<Box<dyn SequenceIterator<N>>, Error> {
        let values = focus.item.atomize()?.into_iter().map(XdmItem::Atomic).collect();
        Ok(Box::new(ListIterator::new(values)))
    }
}
