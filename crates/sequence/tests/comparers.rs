use chrono::{DateTime, FixedOffset, NaiveDate, NaiveTime};
use core::cmp::Ordering;
use num_bigint::BigInt;
use rstest::{fixture, rstest};
use std::sync::Arc;
use xpath_sequence::consts::{SIMPLE_ACCENT_URI, SIMPLE_CASE_ACCENT_URI, SIMPLE_CASE_URI};
use xpath_sequence::engine::collation::SimpleCaseCollation;
use xpath_sequence::{Collation, CollationRegistry};
use xpath_sequence::{
    AtomicComparer, AtomicSortComparer, Comparer, ComparisonKey, DescendingComparer, DoubleSortComparer,
    DynamicContext, DynamicContextBuilder, EmptyGreatestComparer, ErrorCode, ErrorKind, XdmAtomicValue as A,
};

#[fixture]
fn ctx() -> DynamicContext {
    DynamicContextBuilder::new().build()
}

fn s(v: &str) -> A {
    A::String(v.to_string())
}

fn date(y: i32, m: u32, d: u32, tz_hours: Option<i32>) -> A {
    A::Date {
        date: NaiveDate::from_ymd_opt(y, m, d).unwrap(),
        tz: tz_hours.map(|h| FixedOffset::east_opt(h * 3600).unwrap()),
    }
}

#[test]
fn empty_greatest_orders_nan_and_empty_last() {
    let c = EmptyGreatestComparer::new(AtomicSortComparer::codepoint());
    assert_eq!(c.compare(Some(&A::Double(f64::NAN)), Some(&A::Integer(5))).unwrap(), Ordering::Greater);
    assert_eq!(c.compare(Some(&A::Integer(5)), Some(&A::Double(f64::NAN))).unwrap(), Ordering::Less);
    assert_eq!(c.compare(None, None).unwrap(), Ordering::Equal);
    assert_eq!(c.compare(None, Some(&A::Integer(5))).unwrap(), Ordering::Greater);
    assert_eq!(c.compare(Some(&A::Integer(5)), None).unwrap(), Ordering::Less);
    assert!(c.equals(None, None).unwrap());
    assert!(!c.equals(None, Some(&A::Integer(5))).unwrap());
    assert_eq!(c.comparison_key(None).unwrap(), ComparisonKey::Empty);
}

#[test]
fn base_comparer_orders_nan_and_empty_first() {
    let c = AtomicSortComparer::codepoint();
    assert_eq!(c.compare(Some(&A::Double(f64::NAN)), Some(&A::Integer(-100))).unwrap(), Ordering::Less);
    assert_eq!(c.compare(Some(&A::Double(f64::NAN)), Some(&A::Float(f32::NAN))).unwrap(), Ordering::Equal);
    assert_eq!(c.compare(None, Some(&A::Double(f64::NAN))).unwrap(), Ordering::Less);
    assert!(c.equals(Some(&A::Double(f64::NAN)), Some(&A::Double(f64::NAN))).unwrap());
}

#[test]
fn numeric_comparer_puts_nan_least() {
    let c = DoubleSortComparer;
    assert_eq!(c.compare(Some(&A::Double(f64::NAN)), Some(&A::Double(f64::NEG_INFINITY))).unwrap(), Ordering::Less);
    assert_eq!(c.compare(None, Some(&A::Double(f64::NAN))).unwrap(), Ordering::Less);
    assert!(c.equals(Some(&A::Float(f32::NAN)), Some(&A::Double(f64::NAN))).unwrap());
    let err = c.compare(Some(&s("x")), Some(&A::Integer(1))).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Type);
    assert!(err.message.contains("xs:string"));
}

#[rstest]
#[case(A::Integer(1), A::Integer(2))]
#[case(s("apple"), s("banana"))]
#[case(A::Double(2.5), A::Integer(2))]
#[case(A::Boolean(true), A::Boolean(false))]
#[case(A::Double(f64::NAN), A::Double(1.0))]
#[case(A::YearMonthDuration(12), A::YearMonthDuration(12))]
fn descending_twice_is_identity(#[case] a: A, #[case] b: A) {
    let base = Comparer::codepoint();
    let twice = DescendingComparer::new(DescendingComparer::new(base.clone()));
    for (x, y) in [(Some(&a), Some(&b)), (Some(&b), Some(&a)), (None, Some(&a)), (Some(&b), None)] {
        assert_eq!(twice.compare(x, y).unwrap(), base.compare(x, y).unwrap());
        assert_eq!(base.clone().descending().compare(x, y).unwrap(), base.compare(x, y).unwrap().reverse());
    }
}

#[rstest]
#[case(A::Integer(3), A::Double(3.0))]
#[case(A::Integer(3), A::Decimal(3.0))]
#[case(A::Float(0.5), A::Double(0.5))]
#[case(A::BigInteger(BigInt::from(1u64 << 60)), A::Integer(1 << 60))]
#[case(s("x"), A::UntypedAtomic("x".into()))]
#[case(A::AnyUri("urn:a".into()), s("urn:a"))]
#[case(A::HexBinary("0a".into()), A::HexBinary("0A".into()))]
fn equal_values_share_a_key(#[case] a: A, #[case] b: A) {
    let c = AtomicSortComparer::codepoint();
    assert!(c.equals(Some(&a), Some(&b)).unwrap());
    assert_eq!(c.comparison_key(Some(&a)).unwrap(), c.comparison_key(Some(&b)).unwrap());
}

#[rstest]
#[case(A::Integer(3), A::Double(3.5))]
#[case(A::Decimal(1.5), A::Integer(2))]
#[case(s("a"), s("A"))]
#[case(A::Boolean(false), A::Boolean(true))]
fn unequal_values_have_distinct_keys(#[case] a: A, #[case] b: A) {
    let c = AtomicSortComparer::codepoint();
    assert!(!c.equals(Some(&a), Some(&b)).unwrap());
    assert_ne!(c.comparison_key(Some(&a)).unwrap(), c.comparison_key(Some(&b)).unwrap());
}

#[test]
fn numerics_compare_exactly_across_types() {
    let c = AtomicSortComparer::codepoint();
    let big = A::BigInteger(BigInt::from(2u8).pow(70));
    assert_eq!(c.compare(Some(&big), Some(&A::Double(1e20))).unwrap(), Ordering::Greater);
    assert_eq!(c.compare(Some(&A::Integer(i64::MAX)), Some(&A::Double(9.3e18))).unwrap(), Ordering::Less);
    assert_eq!(c.compare(Some(&A::Integer(2)), Some(&A::Double(f64::INFINITY))).unwrap(), Ordering::Less);
    assert_eq!(c.compare(Some(&A::Decimal(-0.5)), Some(&A::Integer(0))).unwrap(), Ordering::Less);
}

#[test]
fn incomparable_types_name_both_types() {
    let c = AtomicSortComparer::codepoint();
    let err = c.compare(Some(&s("10")), Some(&A::Integer(10))).unwrap_err();
    assert!(err.is_type_error());
    assert_eq!(err.code_enum(), ErrorCode::XPTY0004);
    assert!(err.message.contains("xs:string"), "{}", err.message);
    assert!(err.message.contains("xs:integer"), "{}", err.message);
    assert!(c.equals(Some(&A::Boolean(true)), Some(&A::Integer(1))).is_err());
}

#[test]
fn qnames_support_equality_but_not_ordering() {
    let c = AtomicSortComparer::codepoint();
    let a = A::QName { ns_uri: Some("urn:x".into()), prefix: Some("p".into()), local: "a".into() };
    let b = A::QName { ns_uri: Some("urn:x".into()), prefix: Some("q".into()), local: "a".into() };
    assert!(c.equals(Some(&a), Some(&b)).unwrap());
    assert!(c.compare(Some(&a), Some(&b)).unwrap_err().is_type_error());
}

#[rstest]
fn named_collation_from_context(ctx: DynamicContext) {
    let c = AtomicSortComparer::for_context(&ctx, Some(SIMPLE_CASE_URI)).unwrap();
    assert_eq!(c.compare(Some(&s("Apple")), Some(&s("apple"))).unwrap(), Ordering::Equal);
    assert_eq!(c.comparison_key(Some(&s("ABC"))).unwrap(), c.comparison_key(Some(&s("abc"))).unwrap());

    let accents = AtomicSortComparer::for_context(&ctx, Some(SIMPLE_ACCENT_URI)).unwrap();
    assert!(accents.equals(Some(&s("café")), Some(&s("cafe"))).unwrap());
}

#[test]
fn explicit_collation_instance() {
    let c = AtomicSortComparer::with_collation(Arc::new(SimpleCaseCollation));
    assert!(c.equals(Some(&s("HELLO")), Some(&s("hello"))).unwrap());
    assert_eq!(c.collation_uri(), Some(SIMPLE_CASE_URI));
}

#[rstest]
fn deferred_collation_needs_a_context(ctx: DynamicContext) {
    let deferred = Comparer::from(AtomicSortComparer::deferred(Some(SIMPLE_CASE_URI))).descending();
    let err = deferred.compare(Some(&s("a")), Some(&s("B"))).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ContextRequired);
    // non-string comparisons do not touch the collation
    assert_eq!(deferred.compare(Some(&A::Integer(1)), Some(&A::Integer(2))).unwrap(), Ordering::Greater);

    let bound = deferred.provide_context(&ctx).unwrap();
    assert_eq!(bound.compare(Some(&s("a")), Some(&s("B"))).unwrap(), Ordering::Greater);
    assert!(bound.equals(Some(&s("b")), Some(&s("B"))).unwrap());
}

#[rstest]
fn unknown_collation_uri(ctx: DynamicContext) {
    let err = AtomicSortComparer::deferred(Some("urn:nope")).provide_context(&ctx).unwrap_err();
    assert_eq!(err.code_enum(), ErrorCode::FOCH0002);
    assert!(AtomicSortComparer::for_context(&ctx, Some("urn:nope")).is_err());
}

#[test]
fn default_collation_is_taken_from_the_context() {
    let ctx = DynamicContextBuilder::new().with_default_collation(SIMPLE_CASE_URI).build();
    let c = AtomicSortComparer::deferred(None).provide_context(&ctx).unwrap();
    assert!(c.equals(Some(&s("X")), Some(&s("x"))).unwrap());
}

#[test]
fn dates_without_timezone_need_an_implicit_timezone() {
    let c = AtomicSortComparer::codepoint();
    let a = date(2024, 1, 1, None);
    let b = date(2024, 1, 2, Some(0));
    assert_eq!(c.compare(Some(&a), Some(&b)).unwrap_err().kind(), ErrorKind::ContextRequired);

    let without = DynamicContextBuilder::new().without_timezone().build();
    let still_unbound = c.provide_context(&without).unwrap();
    assert_eq!(still_unbound.compare(Some(&a), Some(&b)).unwrap_err().kind(), ErrorKind::ContextRequired);

    let utc = DynamicContextBuilder::new().with_timezone(0).build();
    let bound = c.provide_context(&utc).unwrap();
    assert_eq!(bound.compare(Some(&a), Some(&b)).unwrap(), Ordering::Less);
}

#[rstest]
#[case(i32::MAX)]
#[case(i32::MIN)]
#[case(24 * 60)]
#[case(-24 * 60)]
fn out_of_range_timezones_keep_the_default(#[case] minutes: i32) {
    let ctx = DynamicContextBuilder::new().with_timezone(minutes).build();
    assert_eq!(ctx.implicit_timezone, FixedOffset::east_opt(0));
}

#[test]
fn in_range_timezone_is_applied() {
    let ctx = DynamicContextBuilder::new().with_timezone(-300).build();
    assert_eq!(ctx.implicit_timezone, FixedOffset::west_opt(5 * 3600));
}

#[test]
fn dates_compare_as_instants() {
    let c = AtomicSortComparer::codepoint();
    // midnight at +02:00 is 22:00 UTC on the previous day
    let east = date(2024, 1, 2, Some(2));
    let utc = date(2024, 1, 1, Some(0));
    assert_eq!(c.compare(Some(&east), Some(&utc)).unwrap(), Ordering::Greater);

    let a: DateTime<FixedOffset> = DateTime::parse_from_rfc3339("2024-05-01T12:00:00+02:00").unwrap();
    let b: DateTime<FixedOffset> = DateTime::parse_from_rfc3339("2024-05-01T10:00:00Z").unwrap();
    assert!(c.equals(Some(&A::DateTime(a)), Some(&A::DateTime(b))).unwrap());
}

#[test]
fn durations_compare_within_their_family() {
    let c = AtomicSortComparer::codepoint();
    assert_eq!(
        c.compare(Some(&A::DayTimeDuration(3600)), Some(&A::DayTimeDuration(60))).unwrap(),
        Ordering::Greater
    );
    assert!(c.compare(Some(&A::DayTimeDuration(0)), Some(&A::YearMonthDuration(0))).is_err());
}

#[rstest]
fn comparer_enum_rebinds_nested_wrappers(ctx: DynamicContext) {
    let c = Comparer::from(AtomicSortComparer::deferred(Some(SIMPLE_CASE_URI))).empty_greatest().descending();
    let bound = c.provide_context(&ctx).unwrap();
    // descending over empty-greatest: empty now sorts first
    assert_eq!(bound.compare(None, Some(&s("a"))).unwrap(), Ordering::Less);
    assert!(bound.equals(Some(&s("Q")), Some(&s("q"))).unwrap());
    assert_eq!(Comparer::numeric().compare(None, Some(&A::Integer(1))).unwrap(), Ordering::Less);
}

/// Orders strings by length, then codepoint.
struct ByLength;

impl Collation for ByLength {
    fn uri(&self) -> &str {
        "urn:test:by-length"
    }
    fn compare(&self, a: &str, b: &str) -> Ordering {
        a.len().cmp(&b.len()).then_with(|| a.cmp(b))
    }
}

#[test]
fn collations_registered_by_the_caller() {
    let mut registry = CollationRegistry::new();
    registry.insert(Arc::new(ByLength));
    let ctx = DynamicContextBuilder::new().with_collations(Arc::new(registry)).build();
    let c = AtomicSortComparer::deferred(Some("urn:test:by-length")).provide_context(&ctx).unwrap();
    assert_eq!(c.compare(Some(&s("zz")), Some(&s("aaa"))).unwrap(), Ordering::Less);
    assert_eq!(c.collation_uri(), Some("urn:test:by-length"));
    assert!(AtomicSortComparer::for_context(&ctx, Some(SIMPLE_CASE_ACCENT_URI)).is_ok());
}

#[rstest]
fn case_and_accent_insensitive(ctx: DynamicContext) {
    let c = AtomicSortComparer::for_context(&ctx, Some(SIMPLE_CASE_ACCENT_URI)).unwrap();
    assert!(c.equals(Some(&s("Élan")), Some(&s("elan"))).unwrap());
    assert_eq!(c.comparison_key(Some(&s("ÉLAN"))).unwrap(), c.comparison_key(Some(&s("elan"))).unwrap());
}

#[test]
fn explicit_implicit_timezone_for_times() {
    let time = |h: u32, tz: Option<i32>| A::Time {
        time: NaiveTime::from_hms_opt(h, 0, 0).unwrap(),
        tz: tz.map(|hours| FixedOffset::east_opt(hours * 3600).unwrap()),
    };
    let plus_one = AtomicSortComparer::codepoint().with_implicit_timezone(FixedOffset::east_opt(3600).unwrap());
    // 12:00 at +01:00 is 11:00Z
    assert!(plus_one.equals(Some(&time(12, None)), Some(&time(11, Some(0)))).unwrap());
    assert_eq!(plus_one.compare(Some(&time(12, None)), Some(&time(12, Some(0)))).unwrap(), Ordering::Less);
    // the comparer's own implicit timezone wins over the context's
    let ctx = DynamicContextBuilder::new().with_timezone(-300).build();
    let bound = plus_one.provide_context(&ctx).unwrap();
    assert!(bound.equals(Some(&time(12, None)), Some(&time(11, Some(0)))).unwrap());
}
