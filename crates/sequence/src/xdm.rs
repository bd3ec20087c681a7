use crate::engine::runtime::{Error, ErrorCode};
use crate::model::XdmNode;
use chrono::{DateTime, FixedOffset, NaiveDate, NaiveTime};
use core::fmt;
use num_bigint::BigInt;
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ExpandedName {
    pub ns_uri: Option<String>,
    pub local: String,
}

impl ExpandedName {
    pub fn new(ns_uri: Option<String>, local: impl Into<String>) -> Self {
        Self { ns_uri, local: local.into() }
    }
}

/// Atomic values understood by the comparison layer.
///
/// Numeric subtypes are kept apart so diagnostics can name the exact type; comparison promotes
/// them onto a common numeric line. Durations are stored canonically (months / seconds).
#[derive(Debug, Clone, PartialEq)]
pub enum XdmAtomicValue {
    Boolean(bool),
    String(String),
    UntypedAtomic(String),
    AnyUri(String),
    Integer(i64),
    BigInteger(BigInt),
    Decimal(f64),
    Double(f64),
    Float(f32),
    QName { ns_uri: Option<String>, prefix: Option<String>, local: String },
    DateTime(DateTime<FixedOffset>),
    Date { date: NaiveDate, tz: Option<FixedOffset> },
    Time { time: NaiveTime, tz: Option<FixedOffset> },
    YearMonthDuration(i32),
    DayTimeDuration(i64),
    Base64Binary(String),
    HexBinary(String),
}

impl XdmAtomicValue {
    /// Display name of the primitive type, e.g. `xs:integer`.
    pub fn type_name(&self) -> &'static str {
        match self {
            XdmAtomicValue::Boolean(_) => "xs:boolean",
            XdmAtomicValue::String(_) => "xs:string",
            XdmAtomicValue::UntypedAtomic(_) => "xs:untypedAtomic",
            XdmAtomicValue::AnyUri(_) => "xs:anyURI",
            XdmAtomicValue::Integer(_) | XdmAtomicValue::BigInteger(_) => "xs:integer",
            XdmAtomicValue::Decimal(_) => "xs:decimal",
            XdmAtomicValue::Double(_) => "xs:double",
            XdmAtomicValue::Float(_) => "xs:float",
            XdmAtomicValue::QName { .. } => "xs:QName",
            XdmAtomicValue::DateTime(_) => "xs:dateTime",
            XdmAtomicValue::Date { .. } => "xs:date",
            XdmAtomicValue::Time { .. } => "xs:time",
            XdmAtomicValue::YearMonthDuration(_) => "xs:yearMonthDuration",
            XdmAtomicValue::DayTimeDuration(_) => "xs:dayTimeDuration",
            XdmAtomicValue::Base64Binary(_) => "xs:base64Binary",
            XdmAtomicValue::HexBinary(_) => "xs:hexBinary",
        }
    }

    pub fn is_numeric(&self) -> bool {
        matches!(
            self,
            XdmAtomicValue::Integer(_)
                | XdmAtomicValue::BigInteger(_)
                | XdmAtomicValue::Decimal(_)
                | XdmAtomicValue::Double(_)
                | XdmAtomicValue::Float(_)
        )
    }

    pub fn is_nan(&self) -> bool {
        match self {
            XdmAtomicValue::Double(d) | XdmAtomicValue::Decimal(d) => d.is_nan(),
            XdmAtomicValue::Float(f) => f.is_nan(),
            _ => false,
        }
    }

    /// Canonical lexical representation.
    pub fn lexical(&self) -> String {
        fn float_lexical(d: f64) -> String {
            if d.is_nan() {
                "NaN".to_string()
            } else if d.is_infinite() {
                if d > 0.0 { "INF".to_string() } else { "-INF".to_string() }
            } else {
                format!("{d}")
            }
        }
        fn tz_suffix(tz: Option<&FixedOffset>) -> String {
            match tz {
                None => String::new(),
                Some(tz) if tz.local_minus_utc() == 0 => "Z".to_string(),
                Some(tz) => {
                    let secs = tz.local_minus_utc();
                    let sign = if secs < 0 { '-' } else { '+' };
                    let abs = secs.abs();
                    format!("{sign}{:02}:{:02}", abs / 3600, (abs % 3600) / 60)
                }
            }
        }
        match self {
            XdmAtomicValue::Boolean(b) => b.to_string(),
            XdmAtomicValue::String(s)
            | XdmAtomicValue::UntypedAtomic(s)
            | XdmAtomicValue::AnyUri(s)
            | XdmAtomicValue::Base64Binary(s)
            | XdmAtomicValue::HexBinary(s) => s.clone(),
            XdmAtomicValue::Integer(i) => i.to_string(),
            XdmAtomicValue::BigInteger(i) => i.to_string(),
            XdmAtomicValue::Decimal(d) | XdmAtomicValue::Double(d) => float_lexical(*d),
            XdmAtomicValue::Float(f) => float_lexical(f64::from(*f)),
            XdmAtomicValue::QName { prefix, local, .. } => match prefix {
                Some(p) if !p.is_empty() => format!("{p}:{local}"),
                _ => local.clone(),
            },
            XdmAtomicValue::DateTime(dt) => dt.to_rfc3339(),
            XdmAtomicValue::Date { date, tz } => format!("{}{}", date.format("%Y-%m-%d"), tz_suffix(tz.as_ref())),
            XdmAtomicValue::Time { time, tz } => format!("{}{}", time.format("%H:%M:%S"), tz_suffix(tz.as_ref())),
            XdmAtomicValue::YearMonthDuration(months) => {
                let sign = if *months < 0 { "-" } else { "" };
                let m = months.unsigned_abs();
                match (m / 12, m % 12) {
                    (0, mm) => format!("{sign}P{mm}M"),
                    (y, 0) => format!("{sign}P{y}Y"),
                    (y, mm) => format!("{sign}P{y}Y{mm}M"),
                }
            }
            XdmAtomicValue::DayTimeDuration(secs) => {
                let sign = if *secs < 0 { "-" } else { "" };
                let s = secs.unsigned_abs();
                let (days, rem) = (s / 86_400, s % 86_400);
                let (hours, rem) = (rem / 3600, rem % 3600);
                let (mins, secs) = (rem / 60, rem % 60);
                let mut out = format!("{sign}P");
                if days > 0 {
                    out.push_str(&format!("{days}D"));
                }
                if hours > 0 || mins > 0 || secs > 0 || days == 0 {
                    out.push('T');
                    if hours > 0 {
                        out.push_str(&format!("{hours}H"));
                    }
                    if mins > 0 {
                        out.push_str(&format!("{mins}M"));
                    }
                    if secs > 0 || (hours == 0 && mins == 0) {
                        out.push_str(&format!("{secs}S"));
                    }
                }
                out
            }
        }
    }
}

impl fmt::Display for XdmAtomicValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.lexical())
    }
}

/// Opaque function item. The engine only needs identity and a description for errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionItem {
    pub name: Option<ExpandedName>,
    pub arity: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct XdmMap<N> {
    pub entries: Vec<(XdmAtomicValue, XdmSequence<N>)>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct XdmArray<N> {
    pub members: Vec<XdmSequence<N>>,
}

pub type XdmSequence<N> = Vec<XdmItem<N>>;

#[derive(Debug, Clone, PartialEq)]
pub enum XdmItem<N> {
    Node(N),
    Atomic(XdmAtomicValue),
    Function(Arc<FunctionItem>),
    Map(Arc<XdmMap<N>>),
    Array(Arc<XdmArray<N>>),
}

impl<N> XdmItem<N> {
    pub fn as_node(&self) -> Option<&N> {
        match self {
            XdmItem::Node(n) => Some(n),
            _ => None,
        }
    }

    /// Short description of the item kind, used in diagnostics.
    pub fn kind_name(&self) -> &'static str {
        match self {
            XdmItem::Node(_) => "node()",
            XdmItem::Atomic(a) => a.type_name(),
            XdmItem::Function(_) => "function(*)",
            XdmItem::Map(_) => "map(*)",
            XdmItem::Array(_) => "array(*)",
        }
    }
}

impl<N: XdmNode> XdmItem<N> {
    /// Identity comparison: nodes by node identity, atomics by value, the rest by reference.
    pub fn is_identical(&self, other: &Self) -> bool {
        match (self, other) {
            (XdmItem::Node(a), XdmItem::Node(b)) => a == b,
            (XdmItem::Atomic(a), XdmItem::Atomic(b)) => a == b,
            (XdmItem::Function(a), XdmItem::Function(b)) => Arc::ptr_eq(a, b),
            (XdmItem::Map(a), XdmItem::Map(b)) => Arc::ptr_eq(a, b),
            (XdmItem::Array(a), XdmItem::Array(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }

    pub fn string_value(&self) -> Result<String, Error> {
        match self {
            XdmItem::Node(n) => Ok(n.string_value()),
            XdmItem::Atomic(a) => Ok(a.lexical()),
            other => Err(Error::from_code(
                ErrorCode::FOTY0014,
                format!("string value is not defined for {}", other.kind_name()),
            )),
        }
    }

    /// Expand the item to its sequence of atomic values.
    pub fn atomize(&self) -> Result<Vec<XdmAtomicValue>, Error> {
        let mut out = Vec::new();
        self.atomize_into(&mut out)?;
        Ok(out)
    }

    fn atomize_into(&self, out: &mut Vec<XdmAtomicValue>) -> Result<(), Error> {
        match self {
            XdmItem::Atomic(a) => out.push(a.clone()),
            XdmItem::Node(n) => out.extend(n.typed_value()),
            XdmItem::Array(arr) => {
                for member in &arr.members {
                    for item in member {
                        item.atomize_into(out)?;
                    }
                }
            }
            XdmItem::Function(_) | XdmItem::Map(_) => {
                return Err(Error::from_code(
                    ErrorCode::FOTY0013,
                    format!("cannot atomize {}", self.kind_name()),
                ));
            }
        }
        Ok(())
    }
}

impl<N> fmt::Display for XdmItem<N>
where
    N: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            XdmItem::Node(_) => write!(f, "<node>"),
            XdmItem::Atomic(a) => write!(f, "{a}"),
            XdmItem::Function(func) => match &func.name {
                Some(name) => write!(f, "{}#{}", name.local, func.arity),
                None => write!(f, "function#{}", func.arity),
            },
            XdmItem::Map(m) => write!(f, "map{{{} entries}}", m.entries.len()),
            XdmItem::Array(a) => write!(f, "array[{} members]", a.members.len()),
        }
    }
}
