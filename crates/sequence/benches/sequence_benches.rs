use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use std::hint::black_box;
use std::sync::Arc;
use xpath_sequence::engine::iter::count_items;
use xpath_sequence::model::simple::{attr, elem, text};
use xpath_sequence::{
    Axis, AxisIterator, Comparer, ContextItemExpression, DynamicContextBuilder, Expression, GroupAdjacentIterator,
    GroupIterator, ListIterator, NodeTest, SequenceIterator, SimpleNode, XdmAtomicValue as A, XdmItem, simple_doc,
    sort_iterator,
};

fn build_document(sections: usize, items: usize) -> SimpleNode {
    let mut root = elem("root");
    for s in 0..sections {
        let mut section = elem("section").attr(attr("name", &format!("s{s}")));
        for i in 0..items {
            section = section.child(
                elem("item")
                    .attr(attr("id", &format!("item-{s}-{i}")))
                    .attr(attr("type", if i % 3 == 0 { "a" } else { "b" }))
                    .child(text(&format!("Item {i}"))),
            );
        }
        root = root.child(section);
    }
    simple_doc().child(root).build()
}

fn runs(len: usize, run: usize) -> Vec<XdmItem<SimpleNode>> {
    (0..len).map(|i| XdmItem::Atomic(A::String(format!("k{}", i / run)))).collect()
}

fn benchmark_range(c: &mut Criterion) {
    let mut group = c.benchmark_group("iter/range");
    for len in [1_000i64, 100_000] {
        group.bench_with_input(BenchmarkId::from_parameter(len), &len, |b, &len| {
            b.iter(|| {
                let mut it = xpath_sequence::make_range_iterator::<SimpleNode>(
                    Some(&A::Integer(1)),
                    Some(&A::Integer(black_box(len))),
                )
                .expect("range failure");
                let mut n = 0usize;
                while it.next_item().expect("next failure").is_some() {
                    n += 1;
                }
                black_box(n);
            });
        });
    }
    group.finish();
}

fn benchmark_group_adjacent(c: &mut Criterion) {
    let ctx = DynamicContextBuilder::new().build();
    let key: Arc<dyn Expression<SimpleNode>> = Arc::new(ContextItemExpression);
    let mut group = c.benchmark_group("iter/group_adjacent");
    for run in [1usize, 8, 64] {
        let population = runs(4_096, run);
        group.bench_with_input(BenchmarkId::from_parameter(run), &population, |b, population| {
            b.iter(|| {
                let base = Box::new(ListIterator::new(population.clone()));
                let mut it = GroupAdjacentIterator::new(base, key.clone(), Comparer::codepoint(), ctx.clone())
                    .expect("grouping failure");
                let mut groups = 0usize;
                while it.next_item().expect("next failure").is_some() {
                    black_box(it.current_grouping_key());
                    groups += 1;
                }
                black_box(groups);
            });
        });
    }
    group.finish();
}

fn benchmark_axes(c: &mut Criterion) {
    let document = build_document(20, 50);
    let mut group = c.benchmark_group("iter/axis");
    for axis in [Axis::Descendant, Axis::Following, Axis::Preceding] {
        let origin = match axis {
            Axis::Descendant => document.clone(),
            _ => {
                let mut it = AxisIterator::new(document.clone(), Axis::Descendant, NodeTest::element("section"));
                let mut middle = None;
                for _ in 0..10 {
                    middle = it.next_item().expect("next failure");
                }
                middle.and_then(|i| i.as_node().cloned()).expect("section")
            }
        };
        group.bench_with_input(BenchmarkId::from_parameter(axis), &origin, |b, origin| {
            b.iter(|| {
                let it = AxisIterator::new(origin.clone(), axis, NodeTest::element("item"));
                black_box(count_items(&it).expect("count failure"));
            });
        });
    }
    group.finish();
}

fn benchmark_sort(c: &mut Criterion) {
    let ctx = DynamicContextBuilder::new().build();
    let population: Vec<XdmItem<SimpleNode>> =
        (0..5_000i64).map(|i| XdmItem::Atomic(A::Integer((i * 7919) % 4_999))).collect();
    c.bench_function("sort/integers", |b| {
        b.iter(|| {
            let sorted = sort_iterator(
                Box::new(ListIterator::new(black_box(population.clone()))),
                &ContextItemExpression,
                &Comparer::codepoint(),
                &ctx,
            )
            .expect("sort failure");
            black_box(count_items(&sorted).expect("count failure"));
        });
    });
}

criterion_group!(benches, benchmark_range, benchmark_group_adjacent, benchmark_axes, benchmark_sort);
criterion_main!(benches);
