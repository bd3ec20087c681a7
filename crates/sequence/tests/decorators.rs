use rstest::rstest;
use std::sync::Arc;
use xpath_sequence::engine::iter::{
    EmptyIterator, IteratorProperties, RangeIterator, WrappingFunction, collect_items, count_items, items,
};
use xpath_sequence::model::simple::{elem, text};
use xpath_sequence::{
    Axis, AxisIterator, ErrorCode, ListIterator, NodeKind, NodeTest, RemoveIterator, SequenceIterator, SimpleNode,
    SingletonIterator, WrappingIterator, XdmAtomicValue as A, XdmItem, XdmNode,
};

type Item = XdmItem<SimpleNode>;

fn letters(values: &[&str]) -> Box<dyn SequenceIterator<SimpleNode>> {
    Box::new(ListIterator::new(values.iter().map(|v| XdmItem::Atomic(A::String((*v).to_string()))).collect()))
}

fn lexical(items: Vec<Item>) -> Vec<String> {
    items.into_iter().map(|i| i.string_value().unwrap()).collect()
}

#[rstest]
#[case(1, vec!["b", "c"])]
#[case(2, vec!["a", "c"])]
#[case(3, vec!["a", "b"])]
#[case(0, vec!["a", "b", "c"])]
#[case(-4, vec!["a", "b", "c"])]
#[case(10, vec!["a", "b", "c"])]
fn remove_by_position(#[case] position: i64, #[case] expected: Vec<&str>) {
    let mut it = RemoveIterator::new(letters(&["a", "b", "c"]), position);
    let length = it.last_position_finder().unwrap().length().unwrap();
    assert_eq!(length, expected.len() as i64);
    assert_eq!(lexical(collect_items(&mut it).unwrap()), expected);
    assert_eq!(it.position(), -1);
}

#[test]
fn remove_counts_its_own_positions() {
    let mut it = RemoveIterator::new(letters(&["a", "b", "c"]), 1);
    it.next_item().unwrap();
    assert_eq!(it.position(), 1);
    assert_eq!(it.current(), Some(&XdmItem::Atomic(A::String("b".into()))));
    let mut again = it.restart().unwrap();
    assert_eq!(lexical(collect_items(again.as_mut()).unwrap()), vec!["b", "c"]);
}

#[test]
fn remove_forwards_length_only_when_the_base_has_it() {
    let root = elem("r").child(elem("x")).child(elem("y")).build();
    let base = Box::new(AxisIterator::new(root, Axis::Child, NodeTest::AnyKind));
    let it = RemoveIterator::new(base, 1);
    assert!(it.last_position_finder().is_none());
    assert!(it.properties().is_empty());
    assert_eq!(count_items(&it).unwrap(), 1);
}

fn boxed(node: &SimpleNode, _parent: Option<&SimpleNode>) -> SimpleNode {
    elem("box").child(text(&node.string_value())).build()
}

#[test]
fn wrapping_replaces_nodes_and_passes_atomics() {
    let root = elem("r").child(elem("x").child(text("1"))).child(elem("y").child(text("2"))).build();
    let nodes: Vec<Item> = root.children().map(XdmItem::Node).chain([XdmItem::Atomic(A::Integer(3))]).collect();
    let function: Arc<dyn WrappingFunction<SimpleNode>> = Arc::new(boxed);
    let mut it = WrappingIterator::new(Box::new(ListIterator::new(nodes)), function, None);

    let first = it.next_item().unwrap().unwrap();
    assert_eq!(first.as_node().unwrap().name().unwrap().local, "box");
    assert_eq!(it.position(), 1);
    assert_eq!(it.atomize_current().unwrap(), vec![A::UntypedAtomic("1".into())]);
    assert_eq!(it.string_value_current().unwrap().as_deref(), Some("1"));
    let mut children = it.iterate_axis_current(Axis::Child, NodeTest::Kind(NodeKind::Text)).unwrap();
    assert_eq!(collect_items(&mut children).unwrap().len(), 1);

    it.next_item().unwrap();
    assert_eq!(it.next_item().unwrap(), Some(XdmItem::Atomic(A::Integer(3))));
    assert!(it.iterate_axis_current(Axis::Child, NodeTest::AnyKind).is_none());
    assert!(it.next_item().unwrap().is_none());
    assert_eq!(it.position(), -1);
}

#[test]
fn atomizing_mode_leaves_nodes_alone() {
    let root = elem("r").child(elem("x").child(text("7"))).build();
    let function: Arc<dyn WrappingFunction<SimpleNode>> = Arc::new(boxed);
    let base = Box::new(AxisIterator::new(root, Axis::Child, NodeTest::AnyKind));
    let mut it = WrappingIterator::new(base, function, None);
    it.set_atomizing(true);
    let item = it.next_item().unwrap().unwrap();
    assert_eq!(item.as_node().unwrap().name().unwrap().local, "x");
    assert_eq!(it.atomize_current().unwrap(), vec![A::UntypedAtomic("7".into())]);
    let mut again = it.restart().unwrap();
    let first = again.next_item().unwrap().unwrap();
    assert_eq!(first.as_node().unwrap().name().unwrap().local, "x");
}

#[test]
fn wrapping_passes_the_known_parent() {
    let parent = elem("holder").build();
    let function: Arc<dyn WrappingFunction<SimpleNode>> =
        Arc::new(|_node: &SimpleNode, p: Option<&SimpleNode>| p.cloned().unwrap_or_else(|| elem("orphan").build()));
    let base = Box::new(SingletonIterator::new(XdmItem::Node(elem("x").build())));
    let mut it = WrappingIterator::new(base, function, Some(parent.clone()));
    assert_eq!(it.next_item().unwrap(), Some(XdmItem::Node(parent)));
}

#[test]
fn wrapping_forwards_capabilities_of_its_base() {
    let function: Arc<dyn WrappingFunction<SimpleNode>> = Arc::new(boxed);
    let over_list = WrappingIterator::new(letters(&["a"]), function.clone(), None);
    let props = over_list.properties();
    assert!(props.contains(IteratorProperties::LOOKAHEAD | IteratorProperties::LAST_POSITION_FINDER));
    assert!(!props.contains(IteratorProperties::GROUNDED));

    let root = elem("r").child(elem("x")).build();
    let over_axis = WrappingIterator::new(Box::new(AxisIterator::new(root, Axis::Child, NodeTest::AnyKind)), function, None);
    let props = over_axis.properties();
    assert!(props.contains(IteratorProperties::LOOKAHEAD));
    assert!(!props.contains(IteratorProperties::LAST_POSITION_FINDER));
}

#[test]
fn list_slices_share_storage() {
    let list = ListIterator::<SimpleNode>::new((1..=6).map(|i| XdmItem::Atomic(A::Integer(i))).collect());
    let mut middle = list.slice(2, 4);
    assert_eq!(count_items(&middle).unwrap(), 2);
    assert_eq!(collect_items(&mut middle).unwrap(), vec![XdmItem::Atomic(A::Integer(3)), XdmItem::Atomic(A::Integer(4))]);
    let clamped = list.slice(5, 100);
    assert_eq!(clamped.grounded().unwrap().materialize().unwrap(), vec![XdmItem::Atomic(A::Integer(6))]);
    let mut reversed = middle.reversible().unwrap().reverse_iterator().unwrap();
    assert_eq!(reversed.next_item().unwrap(), Some(XdmItem::Atomic(A::Integer(4))));
}

#[test]
fn empty_and_singleton() {
    let mut empty = EmptyIterator::new();
    assert_eq!(SequenceIterator::<SimpleNode>::position(&empty), 0);
    assert!(SequenceIterator::<SimpleNode>::next_item(&mut empty).unwrap().is_none());
    assert_eq!(SequenceIterator::<SimpleNode>::position(&empty), -1);

    let mut one = SingletonIterator::<SimpleNode>::new(XdmItem::Atomic(A::Boolean(true)));
    assert!(one.lookahead().unwrap().has_next());
    assert_eq!(one.next_item().unwrap(), Some(XdmItem::Atomic(A::Boolean(true))));
    assert_eq!(one.current(), Some(&XdmItem::Atomic(A::Boolean(true))));
    assert!(!one.lookahead().unwrap().has_next());
    assert!(one.next_item().unwrap().is_none());
    assert!(one.current().is_none());
    assert_eq!(one.position(), -1);
}

#[test]
fn std_iterator_adapter_stops_at_the_end() {
    let mut range = RangeIterator::<SimpleNode>::new(1, 4).unwrap();
    let total: i64 = items(&mut range)
        .map(|r| match r.unwrap() {
            XdmItem::Atomic(A::Integer(i)) => i,
            _ => 0,
        })
        .sum();
    assert_eq!(total, 10);
    assert_eq!(items(&mut range).count(), 0);
}

#[test]
fn function_items_cannot_be_atomized() {
    use xpath_sequence::xdm::FunctionItem;
    let f: Item = XdmItem::Function(Arc::new(FunctionItem { name: None, arity: 1 }));
    assert_eq!(f.atomize().unwrap_err().code_enum(), ErrorCode::FOTY0013);
    assert_eq!(f.string_value().unwrap_err().code_enum(), ErrorCode::FOTY0014);
    let mut it = WrappingIterator::new(
        Box::new(SingletonIterator::new(f.clone())),
        Arc::new(boxed) as Arc<dyn WrappingFunction<SimpleNode>>,
        None,
    );
    assert_eq!(it.next_item().unwrap(), Some(f));
    assert!(it.atomize_current().is_err());
}

#[test]
fn arrays_atomize_to_their_members_and_maps_do_not() {
    use xpath_sequence::xdm::{XdmArray, XdmMap};
    let node = elem("n").child(text("5")).build();
    let array: Item = XdmItem::Array(Arc::new(XdmArray {
        members: vec![vec![XdmItem::Atomic(A::Integer(1)), XdmItem::Node(node)], vec![]],
    }));
    assert_eq!(array.atomize().unwrap(), vec![A::Integer(1), A::UntypedAtomic("5".into())]);
    assert_eq!(array.string_value().unwrap_err().code_enum(), ErrorCode::FOTY0014);

    let map: Item = XdmItem::Map(Arc::new(XdmMap { entries: vec![(A::String("k".into()), vec![])] }));
    assert_eq!(map.atomize().unwrap_err().code_enum(), ErrorCode::FOTY0013);
    assert!(map.is_identical(&map.clone()));
    assert!(!map.is_identical(&XdmItem::Map(Arc::new(XdmMap { entries: vec![] }))));
}

type Source = Box<dyn SequenceIterator<SimpleNode>>;

#[rstest]
#[case::list(|| -> Source { letters(&["p", "q", "r"]) })]
#[case::range(|| -> Source { Box::new(RangeIterator::<SimpleNode>::new(5, 8).unwrap()) })]
#[case::remove(|| -> Source { Box::new(RemoveIterator::new(letters(&["p", "q", "r"]), 2)) })]
#[case::axis(|| -> Source {
    let root = elem("r").child(elem("x")).child(elem("y")).child(elem("z")).build();
    Box::new(AxisIterator::new(root, Axis::Child, NodeTest::AnyKind))
})]
fn restart_yields_the_original_first_item(#[case] make: fn() -> Source) {
    let mut original = make();
    let first = original.next_item().unwrap();
    original.next_item().unwrap();
    let mut fresh = original.restart().unwrap();
    assert_eq!(fresh.position(), 0);
    let again = fresh.next_item().unwrap();
    assert!(first.unwrap().is_identical(&again.unwrap()));
    // closing twice is harmless
    original.close();
    original.close();
}
