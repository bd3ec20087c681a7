use compact_str::CompactString;
use num_bigint::BigInt;

/// Hashable stand-in for an atomic value under a particular comparer.
///
/// Two values compare equal under a comparer iff the comparer maps them to equal keys. Keys of
/// different variants never compare equal; numeric values of different XDM types share the
/// integer/double variants so that `1`, `1.0e0` and `1.0` produce the same key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ComparisonKey {
    /// The empty sequence.
    Empty,
    NaN,
    Integer(i64),
    BigInteger(BigInt),
    /// Bit pattern of a finite non-integral or infinite double.
    Double(u64),
    /// Collation key of a string-like value.
    String(CompactString),
    Boolean(bool),
    QName { ns_uri: Option<String>, local: String },
    DateTime { seconds: i64, nanos: u32 },
    Date { seconds: i64 },
    Time { seconds: i64, nanos: u32 },
    YearMonthDuration(i32),
    DayTimeDuration(i64),
    Base64Binary(String),
    HexBinary(String),
}
