// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use osm_lite_model::{
    resolve_graph, Element, ElementRef, ElementResolver, ElementType, Node, Relation,
    RelationMember, Way,
};
use osm_lite_pool::ElementPool;

/// Grid of closed square ways, all grouped under one relation
fn grid_pool(side: i64) -> ElementPool {
    let mut builder = ElementPool::builder();
    let row = side + 1;
    for i in 0..row {
        for j in 0..row {
            let id = i * row + j;
            builder
                .add_node(Node::new(id, 48.0 + i as f64 * 1e-4, 2.0 + j as f64 * 1e-4))
                .expect("unique node");
        }
    }
    let mut members = Vec::new();
    for i in 0..side {
        for j in 0..side {
            let a = i * row + j;
            let way_id = 1_000_000 + a;
            builder
                .add_way(Way::new(way_id, vec![a, a + 1, a + row + 1, a + row, a]))
                .expect("unique way");
            members.push(RelationMember::new(ElementType::Way, way_id, "outer"));
        }
    }
    builder
        .add_relation(Relation::new(1, members))
        .expect("unique relation");
    builder.build()
}

fn bench_resolve(c: &mut Criterion) {
    let pool = grid_pool(100);
    let relation = pool
        .element(ElementRef::relation(1))
        .expect("relation present");
    let ways: Vec<Element> = pool.ways().map(|w| Element::Way(w.clone())).collect();

    c.bench_function("resolve_relation_10k_ways", |b| {
        b.iter(|| resolve_graph(black_box(&relation), &pool))
    });
    c.bench_function("resolve_each_way", |b| {
        b.iter(|| {
            ways.iter()
                .map(|w| resolve_graph(black_box(w), &pool).sub_nodes.len())
                .sum::<usize>()
        })
    });
}

criterion_group!(benches, bench_resolve);
criterion_main!(benches);
