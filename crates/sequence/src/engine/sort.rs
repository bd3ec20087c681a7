//! Sorting by externally computed sort keys.
//!
//! Members carry their atomized sort-key sequence and original position. Key sequences compare
//! member by member under one comparer; a shorter sequence that is a prefix of a longer one sorts
//! first, and members with equal keys keep their original relative order.
use core::cmp::Ordering;
use itertools::{EitherOrBoth, Itertools};
use tracing::debug;

use crate::engine::compare::{AtomicComparer, Comparer, comparable};
use crate::engine::expr::{Expression, Focus};
use crate::engine::iter::{ListIterator, SequenceIterator};
use crate::engine::runtime::{DynamicContext, Error};
use crate::model::XdmNode;
use crate::xdm::XdmAtomicValue;

/// Indexed collection that an exchange sort can reorder.
pub trait Sortable {
    fn compare(&self, a: usize, b: usize) -> Result<Ordering, Error>;
    fn swap(&mut self, a: usize, b: usize);
}

/// Quicksort with median-of-three pivots and insertion sort for short ranges.
pub struct GenericSorter;

impl GenericSorter {
    const SMALL: usize = 7;

    /// Sorts the index range `from..to`. A comparison error aborts the sort, leaving the
    /// collection partially reordered.
    pub fn quick_sort<S: Sortable + ?Sized>(s: &mut S, from: usize, to: usize) -> Result<(), Error> {
        let (mut lo, mut hi) = (from, to);
        while hi > lo {
            if hi - lo < Self::SMALL {
                return Self::insertion_sort(s, lo, hi);
            }
            let p = Self::partition(s, lo, hi)?;
            // recurse into the smaller half, loop on the larger one
            if p - lo < hi - p {
                Self::quick_sort(s, lo, p)?;
                lo = p + 1;
            } else {
                Self::quick_sort(s, p + 1, hi)?;
                hi = p;
            }
        }
        Ok(())
    }

    fn insertion_sort<S: Sortable + ?Sized>(s: &mut S, lo: usize, hi: usize) -> Result<(), Error> {
        for i in lo + 1..hi {
            let mut j = i;
            while j > lo && s.compare(j, j - 1)? == Ordering::Less {
                s.swap(j, j - 1);
                j -= 1;
            }
        }
        Ok(())
    }

    fn partition<S: Sortable + ?Sized>(s: &mut S, lo: usize, hi: usize) -> Result<usize, Error> {
        let mid = lo + (hi - lo) / 2;
        let last = hi - 1;
        if s.compare(mid, lo)? == Ordering::Less {
            s.swap(mid, lo);
        }
        if s.compare(last, lo)? == Ordering::Less {
            s.swap(last, lo);
        }
        if s.compare(last, mid)? == Ordering::Less {
            s.swap(last, mid);
        }
        s.swap(mid, last);
        let mut store = lo;
        for i in lo..last {
            if s.compare(i, last)? == Ordering::Less {
                s.swap(i, store);
                store += 1;
            }
        }
        s.swap(store, last);
        Ok(store)
    }
}

/// Lexicographic comparison of two sort-key sequences.
///
/// Where one sequence runs out, the missing member is compared as an empty value, so the
/// comparer's empty ordering decides where a shorter key (or a fully empty one) goes.
pub fn compare_sort_keys(
    a: &[XdmAtomicValue],
    b: &[XdmAtomicValue],
    comparer: &Comparer,
) -> Result<Ordering, Error> {
    for pair in a.iter().zip_longest(b.iter()) {
        let ord = match pair {
            EitherOrBoth::Both(x, y) => {
                if !comparable(x, y) {
                    return Err(Error::incomparable("Sort key values", x.type_name(), y.type_name()));
                }
                comparer.compare(Some(x), Some(y))?
            }
            EitherOrBoth::Left(x) => comparer.compare(Some(x), None)?,
            EitherOrBoth::Right(y) => comparer.compare(None, Some(y))?,
        };
        if ord != Ordering::Equal {
            return Ok(ord);
        }
    }
    Ok(Ordering::Equal)
}

#[derive(Debug, Clone, PartialEq)]
pub struct SortMember<T> {
    pub value: T,
    pub sort_key: Vec<XdmAtomicValue>,
    pub original_position: usize,
}

struct MemberSorter<'a, T> {
    members: &'a mut [SortMember<T>],
    comparer: &'a Comparer,
}

impl<T> Sortable for MemberSorter<'_, T> {
    fn compare(&self, a: usize, b: usize) -> Result<Ordering, Error> {
        let (x, y) = (&self.members[a], &self.members[b]);
        Ok(compare_sort_keys(&x.sort_key, &y.sort_key, self.comparer)?
            .then(x.original_position.cmp(&y.original_position)))
    }

    fn swap(&mut self, a: usize, b: usize) {
        self.members.swap(a, b);
    }
}

/// Sorts pre-keyed members in place.
pub fn sort_members<T>(members: &mut [SortMember<T>], comparer: &Comparer) -> Result<(), Error> {
    let len = members.len();
    let mut sorter = MemberSorter { members, comparer };
    GenericSorter::quick_sort(&mut sorter, 0, len)
}

/// Sorts the population by the atomized result of `key` for each item.
///
/// The key is evaluated once per item. The result is a grounded list iterator.
pub fn sort_iterator<N: XdmNode>(
    mut population: Box<dyn SequenceIterator<N>>,
    key: &dyn Expression<N>,
    comparer: &Comparer,
    context: &DynamicContext,
) -> Result<ListIterator<N>, Error> {
    let comparer = comparer.provide_context(context)?;
    let mut members = Vec::new();
    while let Some(item) = population.next_item()? {
        let focus = Focus { item: &item, position: population.position(), context };
        let mut keys = key.evaluate_sequence(&focus)?;
        let mut sort_key = Vec::new();
        while let Some(k) = keys.next_item()? {
            sort_key.extend(k.atomize()?);
        }
        let original_position = members.len();
        members.push(SortMember { value: item, sort_key, original_position });
    }
    population.close();
    sort_members(&mut members, &comparer)?;
    debug!(items = members.len(), "sorted sequence");
    Ok(ListIterator::new(members.into_iter().map(|m| m.value).collect()))
}
