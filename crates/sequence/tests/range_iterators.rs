use num_bigint::BigInt;
use rstest::rstest;
use xpath_sequence::engine::iter::{
    BigRangeIterator, IteratorProperties, RangeIterator, ReverseRangeIterator, SequenceIterator, collect_items,
    count_items, make_range_iterator,
};
use xpath_sequence::{ErrorCode, ErrorKind, SimpleNode, XdmAtomicValue as A, XdmItem};

type Item = XdmItem<SimpleNode>;

fn ints(items: Vec<Item>) -> Vec<i64> {
    items
        .into_iter()
        .map(|i| match i {
            XdmItem::Atomic(A::Integer(v)) => v,
            other => panic!("expected xs:integer, got {other}"),
        })
        .collect()
}

#[rstest]
#[case(1, 5)]
#[case(-3, 3)]
#[case(7, 7)]
#[case(0, 1000)]
#[case(i64::MAX - 2, i64::MAX)]
fn range_yields_every_integer_once(#[case] start: i64, #[case] end: i64) {
    let mut it = RangeIterator::<SimpleNode>::new(start, end).unwrap();
    let expected_len = end - start + 1;
    assert_eq!(it.last_position_finder().unwrap().length().unwrap(), expected_len);
    let values = ints(collect_items(&mut it).unwrap());
    assert_eq!(values.len() as i64, expected_len);
    assert_eq!(values.first(), Some(&start));
    assert_eq!(values.last(), Some(&end));
    assert!(values.windows(2).all(|w| w[0] + 1 == w[1]));
}

#[rstest]
#[case(5, 1)]
#[case(0, -1)]
fn empty_range_is_exhausted(#[case] start: i64, #[case] end: i64) {
    let mut it = RangeIterator::<SimpleNode>::new(start, end).unwrap();
    assert_eq!(it.last_position_finder().unwrap().length().unwrap(), 0);
    assert!(!it.lookahead().unwrap().has_next());
    assert!(it.next_item().unwrap().is_none());
    assert_eq!(it.position(), -1);

    let via_factory = make_range_iterator::<SimpleNode>(Some(&A::Integer(start)), Some(&A::Integer(end))).unwrap();
    assert_eq!(count_items(via_factory.as_ref()).unwrap(), 0);
}

#[test]
fn position_and_current_follow_the_cursor() {
    let mut it = RangeIterator::<SimpleNode>::new(10, 11).unwrap();
    assert_eq!(it.position(), 0);
    assert!(it.current().is_none());
    it.next_item().unwrap();
    assert_eq!(it.position(), 1);
    assert_eq!(it.current(), Some(&XdmItem::Atomic(A::Integer(10))));
    it.next_item().unwrap();
    assert_eq!(it.position(), 2);
    assert!(it.next_item().unwrap().is_none());
    assert_eq!(it.position(), -1);
    assert!(it.current().is_none());
    // exhaustion is permanent
    assert!(it.next_item().unwrap().is_none());
    assert_eq!(it.position(), -1);
}

#[test]
fn reverse_of_three_to_seven() {
    let it = RangeIterator::<SimpleNode>::new(3, 7).unwrap();
    let mut rev = it.reversible().unwrap().reverse_iterator().unwrap();
    assert_eq!(ints(collect_items(rev.as_mut()).unwrap()), vec![7, 6, 5, 4, 3]);
    assert_eq!(count_items(rev.as_ref()).unwrap(), 5);
}

#[test]
fn reverse_of_reverse_is_ascending() {
    let rev = ReverseRangeIterator::<SimpleNode>::new(1, 3).unwrap();
    let mut fwd = rev.reversible().unwrap().reverse_iterator().unwrap();
    assert_eq!(ints(collect_items(fwd.as_mut()).unwrap()), vec![1, 2, 3]);
}

#[test]
fn range_advertises_its_capabilities() {
    let it = RangeIterator::<SimpleNode>::new(1, 3).unwrap();
    let props = it.properties();
    assert!(props.contains(IteratorProperties::LOOKAHEAD));
    assert!(props.contains(IteratorProperties::LAST_POSITION_FINDER));
    assert!(props.contains(IteratorProperties::GROUNDED));
    assert_eq!(ints(it.grounded().unwrap().materialize().unwrap()), vec![1, 2, 3]);
}

#[test]
fn restart_after_partial_consumption() {
    let mut it = RangeIterator::<SimpleNode>::new(4, 9).unwrap();
    it.next_item().unwrap();
    it.next_item().unwrap();
    let mut again = it.restart().unwrap();
    assert_eq!(again.position(), 0);
    assert_eq!(again.next_item().unwrap(), Some(XdmItem::Atomic(A::Integer(4))));
    // the original cursor is unaffected
    assert_eq!(it.position(), 2);
    assert_eq!(it.next_item().unwrap(), Some(XdmItem::Atomic(A::Integer(6))));
}

#[test]
fn oversized_range_is_a_resource_limit() {
    let err = RangeIterator::<SimpleNode>::new(0, i64::from(i32::MAX)).err().unwrap();
    assert_eq!(err.kind(), ErrorKind::ResourceLimit);
    assert_eq!(err.code_enum(), ErrorCode::XPDY0130);

    let err = make_range_iterator::<SimpleNode>(Some(&A::Integer(i64::MIN)), Some(&A::Integer(i64::MAX)))
        .err()
        .unwrap();
    assert_eq!(err.kind(), ErrorKind::ResourceLimit);
}

#[test]
fn largest_allowed_range_is_accepted() {
    let it = make_range_iterator::<SimpleNode>(Some(&A::Integer(1)), Some(&A::Integer(i64::from(i32::MAX)))).unwrap();
    assert_eq!(count_items(it.as_ref()).unwrap(), i64::from(i32::MAX));
}

#[test]
fn big_integer_bounds_use_the_big_range() {
    let start = BigInt::from(2u8).pow(70);
    let end = &start + BigInt::from(2);
    let mut it = make_range_iterator::<SimpleNode>(
        Some(&A::BigInteger(start.clone())),
        Some(&A::BigInteger(end.clone())),
    )
    .unwrap();
    assert_eq!(count_items(it.as_ref()).unwrap(), 3);
    let items = collect_items(it.as_mut()).unwrap();
    assert_eq!(items[0], XdmItem::Atomic(A::BigInteger(start.clone())));
    assert_eq!(items[2], XdmItem::Atomic(A::BigInteger(end)));
}

#[test]
fn big_range_crossing_the_i64_boundary() {
    let end = BigInt::from(i64::MAX) + BigInt::from(1);
    let mut it = BigRangeIterator::<SimpleNode>::new(BigInt::from(i64::MAX - 1), end.clone()).unwrap();
    let items = collect_items(&mut it).unwrap();
    assert_eq!(
        items,
        vec![
            XdmItem::Atomic(A::Integer(i64::MAX - 1)),
            XdmItem::Atomic(A::Integer(i64::MAX)),
            XdmItem::Atomic(A::BigInteger(end)),
        ]
    );
    assert_eq!(it.position(), -1);
}

#[test]
fn huge_big_range_is_a_resource_limit() {
    let start = BigInt::from(2u8).pow(80);
    let end = &start + BigInt::from(i64::MAX);
    let err = BigRangeIterator::<SimpleNode>::new(start, end).err().unwrap();
    assert_eq!(err.kind(), ErrorKind::ResourceLimit);
}

#[rstest]
#[case(None, Some(A::Integer(3)))]
#[case(Some(A::Integer(1)), None)]
#[case(None, None)]
fn absent_bound_gives_empty_sequence(#[case] start: Option<A>, #[case] end: Option<A>) {
    let mut it = make_range_iterator::<SimpleNode>(start.as_ref(), end.as_ref()).unwrap();
    assert!(it.next_item().unwrap().is_none());
}

#[test]
fn non_integer_bound_is_a_type_error() {
    let err = make_range_iterator::<SimpleNode>(Some(&A::Double(1.5)), Some(&A::Integer(3))).err().unwrap();
    assert!(err.is_type_error());
    assert!(err.message.contains("xs:double"));
}
