use criterion::{BatchSize, BenchmarkId, Criterion, criterion_group, criterion_main};
use sirenia::{EdgeLabel, GraphLabel, LayoutGraph, NodeLabel, RankDir};
use std::hint::black_box;
use std::time::Duration;

/// A branching token tree with a few cross links, shaped like prefix-tree exports.
fn build_tree(depth: usize, fanout: usize) -> LayoutGraph {
    let mut g = LayoutGraph::new();
    g.set_graph(GraphLabel {
        rankdir: RankDir::LR,
        ranksep: 200.0,
        nodesep: 45.0,
        ..Default::default()
    });
    g.set_node(
        "n0",
        NodeLabel {
            width: 160.0,
            height: 70.0,
            ..Default::default()
        },
    );

    let mut frontier = vec!["n0".to_string()];
    let mut next_id = 1usize;
    for _ in 0..depth {
        let mut next = Vec::new();
        for parent in &frontier {
            for k in 0..fanout {
                let id = format!("n{next_id}");
                next_id += 1;
                g.set_node(
                    id.clone(),
                    NodeLabel {
                        width: 80.0 + (k * 17 % 90) as f64,
                        height: 70.0,
                        ..Default::default()
                    },
                );
                g.set_edge_with_label(parent.clone(), id.clone(), EdgeLabel::default());
                next.push(id);
            }
        }
        frontier = next;
    }

    // Skip links create long edges and crossing pressure.
    for i in (1..next_id).step_by(7) {
        let to = i + fanout * 3;
        if to < next_id {
            g.set_edge_with_label(format!("n{i}"), format!("n{to}"), EdgeLabel::default());
        }
    }
    g
}

fn bench_layered_layout(c: &mut Criterion) {
    let mut group = c.benchmark_group("layered_layout");
    group.measurement_time(Duration::from_secs(10));

    let cases = [("tree_d3_f3", 3usize, 3usize), ("tree_d4_f4", 4, 4), ("tree_d5_f3", 5, 3)];

    for (name, depth, fanout) in cases {
        let g = build_tree(depth, fanout);
        group.bench_with_input(BenchmarkId::new("sirenia::layout", name), &g, |b, g| {
            b.iter_batched(
                || g.clone(),
                |mut g| {
                    sirenia::layout(black_box(&mut g)).ok();
                    black_box(g.node_count());
                },
                BatchSize::LargeInput,
            )
        });
    }

    group.finish();
}

criterion_group!(benches, bench_layered_layout);
criterion_main!(benches);
