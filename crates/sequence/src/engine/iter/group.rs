//! Grouping iterators (`group-adjacent`, `group-by`).
//!
//! A grouping iterator yields the first item of each group. While positioned on a group, the
//! group's members and raw key are available through [`GroupIterator`]; both stay valid until
//! the next call to `next_item`. Once `next_item` has failed, the iterator stays failed and
//! every later call returns the same error.
use smallvec::SmallVec;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, trace};

use super::{LastPositionFinder, ListIterator, LookaheadIterator, SequenceIterator};
use crate::engine::compare::{AtomicComparer, Comparer, ComparisonKey, comparable};
use crate::engine::expr::{Expression, Focus};
use crate::engine::runtime::{DynamicContext, Error};
use crate::model::XdmNode;
use crate::xdm::{XdmAtomicValue, XdmItem};

pub trait GroupIterator<N>: SequenceIterator<N> {
    /// Key of the current group; `None` before the first group or for an empty key.
    fn current_grouping_key(&self) -> Option<&XdmAtomicValue>;

    /// Fresh iterator over the members of the current group.
    fn iterate_current_group(&self) -> Box<dyn SequenceIterator<N>>;
}

/// Partitions the population into runs of adjacent items with equal keys.
pub struct GroupAdjacentIterator<N: XdmNode> {
    population: Box<dyn SequenceIterator<N>>,
    key: Arc<dyn Expression<N>>,
    comparer: Comparer,
    context: DynamicContext,
    // First item of the next group and its key, pulled ahead of time
    primed: Option<(XdmItem<N>, Option<XdmAtomicValue>)>,
    current: Option<XdmItem<N>>,
    current_key: Option<XdmAtomicValue>,
    current_group: Arc<[XdmItem<N>]>,
    position: i64,
    failed: Option<Error>,
}

impl<N: XdmNode> GroupAdjacentIterator<N> {
    /// Binds the comparer to `context` and primes the first item. An empty population gives an
    /// iterator with no groups.
    pub fn new(
        population: Box<dyn SequenceIterator<N>>,
        key: Arc<dyn Expression<N>>,
        comparer: Comparer,
        context: DynamicContext,
    ) -> Result<Self, Error> {
        let comparer = comparer.provide_context(&context)?;
        let mut it = Self {
            population,
            key,
            comparer,
            context,
            primed: None,
            current: None,
            current_key: None,
            current_group: Arc::from(Vec::new()),
            position: 0,
            failed: None,
        };
        it.primed = it.pull()?;
        Ok(it)
    }

    /// Next population item with its evaluated key.
    fn pull(&mut self) -> Result<Option<(XdmItem<N>, Option<XdmAtomicValue>)>, Error> {
        let Some(item) = self.population.next_item()? else {
            return Ok(None);
        };
        let focus = Focus { item: &item, position: self.population.position(), context: &self.context };
        let key = self.key.evaluate_item(&focus)?;
        Ok(Some((item, key)))
    }

    fn check_keys(a: Option<&XdmAtomicValue>, b: Option<&XdmAtomicValue>) -> Result<(), Error> {
        match (a, b) {
            (Some(a), Some(b)) if !comparable(a, b) => {
                Err(Error::incomparable("Grouping key values", a.type_name(), b.type_name()))
            }
            _ => Ok(()),
        }
    }

    /// Collects the group that starts with `first`, leaving the next group's first item primed.
    fn extend_group(&mut self, first: &XdmItem<N>, key: Option<&XdmAtomicValue>) -> Result<Vec<XdmItem<N>>, Error> {
        let group_key: ComparisonKey = self.comparer.comparison_key(key)?;
        let mut members = vec![first.clone()];
        while let Some((item, next_key)) = self.pull()? {
            Self::check_keys(key, next_key.as_ref())?;
            if self.comparer.comparison_key(next_key.as_ref())? == group_key {
                members.push(item);
            } else {
                self.primed = Some((item, next_key));
                break;
            }
        }
        Ok(members)
    }
}

impl<N: XdmNode> SequenceIterator<N> for GroupAdjacentIterator<N> {
    fn next_item(&mut self) -> Result<Option<XdmItem<N>>, Error> {
        if let Some(err) = &self.failed {
            return Err(err.clone());
        }
        let primed = if self.position < 0 { None } else { self.primed.take() };
        let Some((first, key)) = primed else {
            self.current = None;
            self.current_key = None;
            self.current_group = Arc::from(Vec::new());
            self.position = -1;
            return Ok(None);
        };
        let members = match self.extend_group(&first, key.as_ref()) {
            Ok(members) => members,
            Err(err) => {
                self.current = None;
                self.current_key = None;
                self.current_group = Arc::from(Vec::new());
                self.failed = Some(err.clone());
                return Err(err);
            }
        };
        self.position += 1;
        trace!(group = self.position, size = members.len(), "closed adjacent group");
        self.current = Some(first.clone());
        self.current_key = key;
        self.current_group = members.into();
        Ok(Some(first))
    }

    fn current(&self) -> Option<&XdmItem<N>> {
        self.current.as_ref()
    }

    fn position(&self) -> i64 {
        self.position
    }

    fn close(&mut self) {
        self.primed = None;
        self.population.close();
    }

    fn restart(&self) -> Result<Box<dyn SequenceIterator<N>>, Error> {
        Ok(Box::new(GroupAdjacentIterator::new(
            self.population.restart()?,
            self.key.clone(),
            self.comparer.clone(),
            self.context.clone(),
        )?))
    }

    fn lookahead(&self) -> Option<&dyn LookaheadIterator> {
        Some(self)
    }
}

impl<N: XdmNode> LookaheadIterator for GroupAdjacentIterator<N> {
    fn has_next(&self) -> bool {
        self.failed.is_some() || (self.position >= 0 && self.primed.is_some())
    }
}

impl<N: XdmNode> GroupIterator<N> for GroupAdjacentIterator<N> {
    fn current_grouping_key(&self) -> Option<&XdmAtomicValue> {
        self.current_key.as_ref()
    }

    fn iterate_current_group(&self) -> Box<dyn SequenceIterator<N>> {
        Box::new(ListIterator::from_shared(self.current_group.clone()))
    }
}

struct Group<N> {
    key: XdmAtomicValue,
    members: Arc<[XdmItem<N>]>,
}

/// Partitions the whole population by key value (`group-by`).
///
/// Groups appear in order of first appearance. An item whose key sequence has several distinct
/// values joins one group per value; an item with an empty key sequence joins none. Keys that
/// are not comparable with each other simply form different groups.
pub struct GroupByIterator<N> {
    groups: Arc<[Group<N>]>,
    index: usize,
    current: Option<XdmItem<N>>,
    position: i64,
}

impl<N: XdmNode> GroupByIterator<N> {
    pub fn new(
        mut population: Box<dyn SequenceIterator<N>>,
        key: Arc<dyn Expression<N>>,
        comparer: Comparer,
        context: DynamicContext,
    ) -> Result<Self, Error> {
        let comparer = comparer.provide_context(&context)?;
        let mut by_key: HashMap<ComparisonKey, usize> = HashMap::new();
        let mut building: Vec<(XdmAtomicValue, Vec<XdmItem<N>>)> = Vec::new();
        while let Some(item) = population.next_item()? {
            let focus = Focus { item: &item, position: population.position(), context: &context };
            let mut keys = key.evaluate_sequence(&focus)?;
            let mut joined: SmallVec<[usize; 4]> = SmallVec::new();
            while let Some(k) = keys.next_item()? {
                for value in k.atomize()? {
                    let ck = comparer.comparison_key(Some(&value))?;
                    let slot = *by_key.entry(ck).or_insert_with(|| {
                        building.push((value, Vec::new()));
                        building.len() - 1
                    });
                    if !joined.contains(&slot) {
                        joined.push(slot);
                        building[slot].1.push(item.clone());
                    }
                }
            }
        }
        population.close();
        debug!(groups = building.len(), "group-by partition built");
        let groups: Vec<Group<N>> =
            building.into_iter().map(|(key, members)| Group { key, members: members.into() }).collect();
        Ok(Self { groups: groups.into(), index: 0, current: None, position: 0 })
    }

    fn current_group(&self) -> Option<&Group<N>> {
        if self.position > 0 { self.groups.get(self.index - 1) } else { None }
    }
}

impl<N: XdmNode> SequenceIterator<N> for GroupByIterator<N> {
    fn next_item(&mut self) -> Result<Option<XdmItem<N>>, Error> {
        if self.position >= 0 && self.index < self.groups.len() {
            let first = self.groups[self.index].members[0].clone();
            self.index += 1;
            self.position += 1;
            self.current = Some(first.clone());
            return Ok(Some(first));
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

    fn restart(&self) -> Result<Box<dyn SequenceIterator<N>>, Error> {
        Ok(Box::new(GroupByIterator { groups: self.groups.clone(), index: 0, current: None, position: 0 }))
    }

    fn lookahead(&self) -> Option<&dyn LookaheadIterator> {
        Some(self)
    }

    fn last_position_finder(&self) -> Option<&dyn LastPositionFinder> {
        Some(self)
    }
}

impl<N: XdmNode> LookaheadIterator for GroupByIterator<N> {
    fn has_next(&self) -> bool {
        self.position >= 0 && self.index < self.groups.len()
    }
}

impl<N: XdmNode> LastPositionFinder for GroupByIterator<N> {
    fn length(&self) -> Result<i64, Error> {
        Ok(self.groups.len() as i64)
    }
}

impl<N: XdmNode> GroupIterator<N> for GroupByIterator<N> {
    fn current_grouping_key(&self) -> Option<&XdmAtomicValue> {
        self.current_group().map(|g| &g.key)
    }

    fn iterate_current_group(&self) -> Box<dyn SequenceIterator<N>> {
        match self.current_group() {
            Some(g) => Box::new(ListIterator::from_shared(g.members.clone())),
            None => Box::new(super::EmptyIterator::new()),
        }
    }
}
