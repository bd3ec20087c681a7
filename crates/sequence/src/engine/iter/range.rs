//! Integer ranges (`start to end`).
use num_bigint::BigInt;
use num_traits::{One, ToPrimitive};
use tracing::debug;

use super::{
    EmptyIterator, GroundedIterator, LastPositionFinder, LookaheadIterator, ReversibleIterator, SequenceIterator,
};
use crate::consts::MAX_SEQUENCE_LENGTH;
use crate::engine::runtime::{Error, ErrorCode};
use crate::model::XdmNode;
use crate::xdm::{XdmAtomicValue, XdmItem};

fn check_span(count: i128) -> Result<(), Error> {
    if count > i128::from(MAX_SEQUENCE_LENGTH) {
        return Err(Error::resource_limit(format!(
            "range of {count} items exceeds the maximum sequence length of {MAX_SEQUENCE_LENGTH}"
        )));
    }
    Ok(())
}

/// Ascending `start..=end` over `i64`.
pub struct RangeIterator<N> {
    start: i64,
    end: i64,
    next: Option<i64>,
    current: Option<XdmItem<N>>,
    position: i64,
}

impl<N: XdmNode> RangeIterator<N> {
    /// Fails with `XPDY0130` if the range has more than `i32::MAX` items.
    pub fn new(start: i64, end: i64) -> Result<Self, Error> {
        if start <= end {
            check_span(i128::from(end) - i128::from(start) + 1)?;
        }
        Ok(Self { start, end, next: (start <= end).then_some(start), current: None, position: 0 })
    }

    fn count(&self) -> i64 {
        if self.start > self.end { 0 } else { self.end - self.start + 1 }
    }
}

impl<N: XdmNode> SequenceIterator<N> for RangeIterator<N> {
    fn next_item(&mut self) -> Result<Option<XdmItem<N>>, Error> {
        match self.next {
            Some(v) if self.position >= 0 => {
                self.next = if v < self.end { Some(v + 1) } else { None };
                let item = XdmItem::Atomic(XdmAtomicValue::Integer(v));
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

    fn restart(&self) -> Result<Box<dyn SequenceIterator<N>>, Error> {
        Ok(Box::new(RangeIterator::<N>::new(self.start, self.end)?))
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

impl<N: XdmNode> LookaheadIterator for RangeIterator<N> {
    fn has_next(&self) -> bool {
        self.position >= 0 && self.next.is_some()
    }
}

impl<N: XdmNode> LastPositionFinder for RangeIterator<N> {
    fn length(&self) -> Result<i64, Error> {
        Ok(self.count())
    }
}

impl<N: XdmNode> GroundedIterator<N> for RangeIterator<N> {
    fn materialize(&self) -> Result<Vec<XdmItem<N>>, Error> {
        if self.start > self.end {
            return Ok(Vec::new());
        }
        Ok((self.start..=self.end).map(|v| XdmItem::Atomic(XdmAtomicValue::Integer(v))).collect())
    }
}

impl<N: XdmNode> ReversibleIterator<N> for RangeIterator<N> {
    fn reverse_iterator(&self) -> Result<Box<dyn SequenceIterator<N>>, Error> {
        Ok(Box::new(ReverseRangeIterator::<N>::new(self.start, self.end)?))
    }
}

/// Descending `end..=start` over `i64`, without materializing.
pub struct ReverseRangeIterator<N> {
    start: i64,
    end: i64,
    next: Option<i64>,
    current: Option<XdmItem<N>>,
    position: i64,
}

impl<N: XdmNode> ReverseRangeIterator<N> {
    /// Yields `end, end - 1, ..., start`.
    pub fn new(start: i64, end: i64) -> Result<Self, Error> {
        if start <= end {
            check_span(i128::from(end) - i128::from(start) + 1)?;
        }
        Ok(Self { start, end, next: (start <= end).then_some(end), current: None, position: 0 })
    }
}

impl<N: XdmNode> SequenceIterator<N> for ReverseRangeIterator<N> {
    fn next_item(&mut self) -> Result<Option<XdmItem<N>>, Error> {
        match self.next {
            Some(v) if self.position >= 0 => {
                self.next = if v > self.start { Some(v - 1) } else { None };
                let item = XdmItem::Atomic(XdmAtomicValue::Integer(v));
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

    fn restart(&self) -> Result<Box<dyn SequenceIterator<N>>, Error> {
        Ok(Box::new(ReverseRangeIterator::<N>::new(self.start, self.end)?))
    }

    fn lookahead(&self) -> Option<&dyn LookaheadIterator> {
        Some(self)
    }

    fn last_position_finder(&self) -> Option<&dyn LastPositionFinder> {
        Some(self)
    }

    fn reversible(&self) -> Option<&dyn ReversibleIterator<N>> {
        Some(self)
    }
}

impl<N: XdmNode> LookaheadIterator for ReverseRangeIterator<N> {
    fn has_next(&self) -> bool {
        self.position >= 0 && self.next.is_some()
    }
}

impl<N: XdmNode> LastPositionFinder for ReverseRangeIterator<N> {
    fn length(&self) -> Result<i64, Error> {
        Ok(if self.start > self.end { 0 } else { self.end - self.start + 1 })
    }
}

impl<N: XdmNode> ReversibleIterator<N> for ReverseRangeIterator<N> {
    fn reverse_iterator(&self) -> Result<Box<dyn SequenceIterator<N>>, Error> {
        Ok(Box::new(RangeIterator::<N>::new(self.start, self.end)?))
    }
}

/// Ascending range whose bounds do not fit in `i64`. The item count is still bounded.
pub struct BigRangeIterator<N> {
    start: BigInt,
    end: BigInt,
    next: Option<BigInt>,
    current: Option<XdmItem<N>>,
    position: i64,
}

impl<N: XdmNode> BigRangeIterator<N> {
    pub fn new(start: BigInt, end: BigInt) -> Result<Self, Error> {
        if start <= end {
            let count = (&end - &start + BigInt::one()).to_i128().unwrap_or(i128::MAX);
            check_span(count)?;
        }
        let next = (start <= end).then(|| start.clone());
        Ok(Self { start, end, next, current: None, position: 0 })
    }

    fn to_item(v: &BigInt) -> XdmItem<N> {
        XdmItem::Atomic(match v.to_i64() {
            Some(i) => XdmAtomicValue::Integer(i),
            None => XdmAtomicValue::BigInteger(v.clone()),
        })
    }
}

impl<N: XdmNode> SequenceIterator<N> for BigRangeIterator<N> {
    fn next_item(&mut self) -> Result<Option<XdmItem<N>>, Error> {
        if self.position < 0 {
            return Ok(None);
        }
        match self.next.take() {
            Some(v) => {
                let item = Self::to_item(&v);
                if v < self.end {
                    self.next = Some(v + BigInt::one());
                }
                self.current = Some(item.clone());
                self.position += 1;
                Ok(Some(item))
            }
            None => {
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

    fn restart(&self) -> Result<Box<dyn SequenceIterator<N>>, Error> {
        Ok(Box::new(BigRangeIterator::<N>::new(self.start.clone(), self.end.clone())?))
    }

    fn lookahead(&self) -> Option<&dyn LookaheadIterator> {
        Some(self)
    }

    fn last_position_finder(&self) -> Option<&dyn LastPositionFinder> {
        Some(self)
    }
}

impl<N: XdmNode> LookaheadIterator for BigRangeIterator<N> {
    fn has_next(&self) -> bool {
        self.position >= 0 && self.next.is_some()
    }
}

impl<N: XdmNode> LastPositionFinder for BigRangeIterator<N> {
    fn length(&self) -> Result<i64, Error> {
        if self.start > self.end {
            return Ok(0);
        }
        // Construction already bounded the count.
        Ok((&self.end - &self.start + BigInt::one()).to_i64().unwrap_or(MAX_SEQUENCE_LENGTH))
    }
}

fn integer_bound(v: &XdmAtomicValue) -> Result<BigInt, Error> {
    match v {
        XdmAtomicValue::Integer(i) => Ok(BigInt::from(*i)),
        XdmAtomicValue::BigInteger(b) => Ok(b.clone()),
        other => Err(Error::from_code(
            ErrorCode::XPTY0004,
            format!("range bounds must be xs:integer, found {}", other.type_name()),
        )),
    }
}

/// Iterator for `start to end`. An absent bound or `start > end` yields the empty sequence.
pub fn make_range_iterator<N: XdmNode>(
    start: Option<&XdmAtomicValue>,
    end: Option<&XdmAtomicValue>,
) -> Result<Box<dyn SequenceIterator<N>>, Error> {
    let (Some(start), Some(end)) = (start, end) else {
        return Ok(Box::new(EmptyIterator::new()));
    };
    let (start, end) = (integer_bound(start)?, integer_bound(end)?);
    if start > end {
        return Ok(Box::new(EmptyIterator::new()));
    }
    match (start.to_i64(), end.to_i64()) {
        (Some(s), Some(e)) => {
            debug!(start = s, end = e, "range");
            Ok(Box::new(RangeIterator::<N>::new(s, e)?))
        }
        _ => {
            debug!(start = %start, end = %end, "big integer range");
            Ok(Box::new(BigRangeIterator::<N>::new(start, end)?))
        }
    }
}
