pub mod consts;
pub mod engine;
pub mod model;
pub mod xdm;

pub use engine::collation::{Collation, CollationRegistry};
pub use engine::compare::{
    AtomicComparer, AtomicSortComparer, Comparer, ComparisonKey, DescendingComparer, DoubleSortComparer,
    EmptyGreatestComparer,
};
pub use engine::expr::{ContextItemExpression, Expression, Focus, expression_fn};
pub use engine::iter::{
    Axis, AxisIterator, EmptyIterator, GroupAdjacentIterator, GroupByIterator, GroupIterator, IteratorProperties,
    ListIterator, RemoveIterator, SequenceIterator, SingletonIterator, WrappingIterator, make_range_iterator,
};
pub use engine::runtime::{DynamicContext, DynamicContextBuilder, Error, ErrorCode, ErrorKind};
pub use engine::sort::{SortMember, sort_iterator, sort_members};
pub use model::simple::{SimpleNode, SimpleNodeBuilder, attr, doc as simple_doc, elem, ns, text};
pub use model::{NodeKind, NodeTest, QName, XdmNode};
pub use xdm::{ExpandedName, XdmAtomicValue, XdmItem, XdmSequence};
