use chrono::{FixedOffset, NaiveDate, NaiveDateTime, NaiveTime};
use core::cmp::Ordering;
use core::fmt;
use std::sync::Arc;

use super::AtomicComparer;
use super::key::ComparisonKey;
use super::numeric::{classify, compare_nan_least, numeric_key};
use crate::consts::CODEPOINT_URI;
use crate::engine::collation::{CodepointCollation, Collation};
use crate::engine::runtime::{DynamicContext, Error, ErrorCode};
use crate::xdm::XdmAtomicValue;

/// Type families whose members are mutually comparable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Family {
    Numeric,
    String,
    Boolean,
    QName,
    DateTime,
    Date,
    Time,
    YearMonthDuration,
    DayTimeDuration,
    Base64Binary,
    HexBinary,
}

pub(crate) fn family(v: &XdmAtomicValue) -> Family {
    use XdmAtomicValue as V;
    match v {
        V::Integer(_) | V::BigInteger(_) | V::Decimal(_) | V::Double(_) | V::Float(_) => Family::Numeric,
        V::String(_) | V::UntypedAtomic(_) | V::AnyUri(_) => Family::String,
        V::Boolean(_) => Family::Boolean,
        V::QName { .. } => Family::QName,
        V::DateTime(_) => Family::DateTime,
        V::Date { .. } => Family::Date,
        V::Time { .. } => Family::Time,
        V::YearMonthDuration(_) => Family::YearMonthDuration,
        V::DayTimeDuration(_) => Family::DayTimeDuration,
        V::Base64Binary(_) => Family::Base64Binary,
        V::HexBinary(_) => Family::HexBinary,
    }
}

/// Whether two values may be compared with each other at all.
pub fn comparable(a: &XdmAtomicValue, b: &XdmAtomicValue) -> bool {
    family(a) == family(b)
}

#[derive(Clone)]
enum CollationRef {
    Resolved(Arc<dyn Collation>),
    /// Collation named by URI, resolved once a dynamic context is supplied.
    Unresolved(Option<String>),
}

/// Base comparer used for sorting, grouping and distinct-value style comparisons.
///
/// Ordering follows the value's type: numerics on a common numeric line (NaN equal to NaN and
/// least), strings through the collation, booleans `false < true`, temporal values by instant.
/// The empty sequence sorts first. Values of different type families are a type error.
#[derive(Clone)]
pub struct AtomicSortComparer {
    collation: CollationRef,
    implicit_timezone: Option<FixedOffset>,
}

impl fmt::Debug for AtomicSortComparer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let uri = match &self.collation {
            CollationRef::Resolved(c) => Some(c.uri().to_string()),
            CollationRef::Unresolved(u) => u.clone(),
        };
        f.debug_struct("AtomicSortComparer")
            .field("collation", &uri)
            .field("resolved", &matches!(self.collation, CollationRef::Resolved(_)))
            .field("implicit_timezone", &self.implicit_timezone)
            .finish()
    }
}

impl Default for AtomicSortComparer {
    fn default() -> Self {
        Self::codepoint()
    }
}

impl AtomicSortComparer {
    /// Codepoint collation, no implicit timezone.
    pub fn codepoint() -> Self {
        Self::with_collation(Arc::new(CodepointCollation))
    }

    pub fn with_collation(collation: Arc<dyn Collation>) -> Self {
        Self { collation: CollationRef::Resolved(collation), implicit_timezone: None }
    }

    /// Comparer whose collation is looked up by URI when a context is provided. `None` stands
    /// for the context's default collation.
    pub fn deferred(uri: Option<&str>) -> Self {
        Self { collation: CollationRef::Unresolved(uri.map(str::to_string)), implicit_timezone: None }
    }

    /// Fully resolved comparer for the given context.
    pub fn for_context(ctx: &DynamicContext, uri: Option<&str>) -> Result<Self, Error> {
        Ok(Self { collation: CollationRef::Resolved(ctx.collation(uri)?), implicit_timezone: ctx.implicit_timezone })
    }

    pub fn with_implicit_timezone(mut self, tz: FixedOffset) -> Self {
        self.implicit_timezone = Some(tz);
        self
    }

    pub fn collation_uri(&self) -> Option<&str> {
        match &self.collation {
            CollationRef::Resolved(c) => Some(c.uri()),
            CollationRef::Unresolved(u) => u.as_deref(),
        }
    }

    fn collation(&self) -> Result<&dyn Collation, Error> {
        match &self.collation {
            CollationRef::Resolved(c) => Ok(c.as_ref()),
            CollationRef::Unresolved(uri) => Err(Error::context_required(format!(
                "collation {} cannot be resolved without a dynamic context",
                uri.as_deref().unwrap_or(CODEPOINT_URI)
            ))),
        }
    }

    fn timezone(&self, tz: Option<FixedOffset>) -> Result<FixedOffset, Error> {
        tz.or(self.implicit_timezone)
            .ok_or_else(|| Error::context_required("comparing a value without timezone requires an implicit timezone"))
    }

    fn seconds_of(naive: NaiveDateTime, tz: FixedOffset) -> (i64, u32) {
        let utc = naive.and_utc();
        (utc.timestamp() - i64::from(tz.local_minus_utc()), utc.timestamp_subsec_nanos())
    }

    fn date_instant(&self, date: NaiveDate, tz: Option<FixedOffset>) -> Result<i64, Error> {
        let tz = self.timezone(tz)?;
        Ok(Self::seconds_of(date.and_time(NaiveTime::MIN), tz).0)
    }

    fn time_instant(&self, time: NaiveTime, tz: Option<FixedOffset>) -> Result<(i64, u32), Error> {
        let tz = self.timezone(tz)?;
        // XPath anchors xs:time comparisons on 1972-12-31.
        let anchor = NaiveDate::from_ymd_opt(1972, 12, 31)
            .ok_or_else(|| Error::from_code(ErrorCode::FOER0000, "invalid anchor date"))?;
        Ok(Self::seconds_of(anchor.and_time(time), tz))
    }

    fn unordered(v: &XdmAtomicValue) -> Error {
        Error::from_code(ErrorCode::XPTY0004, format!("values of type {} have no ordering", v.type_name()))
    }

    fn check_comparable(a: &XdmAtomicValue, b: &XdmAtomicValue) -> Result<(), Error> {
        if comparable(a, b) { Ok(()) } else { Err(Error::incomparable("Atomic values", a.type_name(), b.type_name())) }
    }

    fn string_of(v: &XdmAtomicValue) -> Option<&str> {
        match v {
            XdmAtomicValue::String(s) | XdmAtomicValue::UntypedAtomic(s) | XdmAtomicValue::AnyUri(s) => Some(s),
            _ => None,
        }
    }

    fn compare_present(&self, a: &XdmAtomicValue, b: &XdmAtomicValue) -> Result<Ordering, Error> {
        use XdmAtomicValue as V;
        Self::check_comparable(a, b)?;
        if let (Some(x), Some(y)) = (classify(a), classify(b)) {
            return Ok(compare_nan_least(x, y));
        }
        if let (Some(x), Some(y)) = (Self::string_of(a), Self::string_of(b)) {
            return Ok(self.collation()?.compare(x, y));
        }
        Ok(match (a, b) {
            (V::Boolean(x), V::Boolean(y)) => x.cmp(y),
            (V::DateTime(x), V::DateTime(y)) => {
                (x.timestamp(), x.timestamp_subsec_nanos()).cmp(&(y.timestamp(), y.timestamp_subsec_nanos()))
            }
            (V::Date { date: da, tz: ta }, V::Date { date: db, tz: tb }) => {
                self.date_instant(*da, *ta)?.cmp(&self.date_instant(*db, *tb)?)
            }
            (V::Time { time: ta, tz: za }, V::Time { time: tb, tz: zb }) => {
                self.time_instant(*ta, *za)?.cmp(&self.time_instant(*tb, *zb)?)
            }
            (V::YearMonthDuration(x), V::YearMonthDuration(y)) => x.cmp(y),
            (V::DayTimeDuration(x), V::DayTimeDuration(y)) => x.cmp(y),
            _ => return Err(Self::unordered(a)),
        })
    }
}

impl AtomicComparer for AtomicSortComparer {
    fn compare(&self, a: Option<&XdmAtomicValue>, b: Option<&XdmAtomicValue>) -> Result<Ordering, Error> {
        match (a, b) {
            (None, None) => Ok(Ordering::Equal),
            (None, Some(_)) => Ok(Ordering::Less),
            (Some(_), None) => Ok(Ordering::Greater),
            (Some(a), Some(b)) => self.compare_present(a, b),
        }
    }

    fn equals(&self, a: Option<&XdmAtomicValue>, b: Option<&XdmAtomicValue>) -> Result<bool, Error> {
        if let (Some(x), Some(y)) = (a, b) {
            Self::check_comparable(x, y)?;
        }
        Ok(self.comparison_key(a)? == self.comparison_key(b)?)
    }

    fn comparison_key(&self, a: Option<&XdmAtomicValue>) -> Result<ComparisonKey, Error> {
        use XdmAtomicValue as V;
        let Some(a) = a else {
            return Ok(ComparisonKey::Empty);
        };
        if let Some(n) = classify(a) {
            return Ok(numeric_key(n));
        }
        if let Some(s) = Self::string_of(a) {
            return Ok(ComparisonKey::String(self.collation()?.key(s)));
        }
        Ok(match a {
            V::Boolean(b) => ComparisonKey::Boolean(*b),
            V::QName { ns_uri, local, .. } => ComparisonKey::QName { ns_uri: ns_uri.clone(), local: local.clone() },
            V::DateTime(dt) => ComparisonKey::DateTime { seconds: dt.timestamp(), nanos: dt.timestamp_subsec_nanos() },
            V::Date { date, tz } => ComparisonKey::Date { seconds: self.date_instant(*date, *tz)? },
            V::Time { time, tz } => {
                let (seconds, nanos) = self.time_instant(*time, *tz)?;
                ComparisonKey::Time { seconds, nanos }
            }
            V::YearMonthDuration(m) => ComparisonKey::YearMonthDuration(*m),
            V::DayTimeDuration(s) => ComparisonKey::DayTimeDuration(*s),
            V::Base64Binary(s) => ComparisonKey::Base64Binary(s.split_whitespace().collect()),
            V::HexBinary(s) => ComparisonKey::HexBinary(s.to_ascii_uppercase()),
            _ => return Err(Self::unordered(a)),
        })
    }

    fn provide_context(&self, ctx: &DynamicContext) -> Result<Self, Error> {
        let collation = match &self.collation {
            CollationRef::Resolved(c) => CollationRef::Resolved(c.clone()),
            CollationRef::Unresolved(uri) => CollationRef::Resolved(ctx.collation(uri.as_deref())?),
        };
        Ok(Self { collation, implicit_timezone: self.implicit_timezone.or(ctx.implicit_timezone) })
    }
}
