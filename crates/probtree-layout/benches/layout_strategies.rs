use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use probtree_core::{CanonicalGraph, LayoutKind, Settings, load_str};
use probtree_layout::viewport::{RecordingCanvas, Scene, ScrollRect, Transform, View, render_visible};
use probtree_layout::search::SearchMatches;
use probtree_layout::text::DeterministicTextMeasurer;
use probtree_layout::{LayoutOptions, layout_graph};
use serde_json::{Value, json};
use std::hint::black_box;
use std::time::Duration;

/// A long main line with `alternates` short side branches every few tokens, shaped like
/// continuation exports of a single prompt.
fn build_export(length: usize, alternates: usize) -> CanonicalGraph {
    let mut nodes: Vec<Value> = vec![json!({"id": "n0", "token": "Once", "is_root": true})];
    let mut edges: Vec<Value> = Vec::new();
    let mut next_id = 1usize;

    let mut prev = "n0".to_string();
    for step in 0..length {
        let id = format!("n{next_id}");
        next_id += 1;
        nodes.push(json!({
            "id": id,
            "token": format!("tok{step}"),
            "emp_freq_here": 0.8,
            "theoretical_edges": [{"token": "alt", "avg_prob": 0.1}]
        }));
        edges.push(json!({"source": prev, "target": id, "prob": 0.8}));

        if step % 4 == 0 {
            for k in 0..alternates {
                let alt = format!("n{next_id}");
                next_id += 1;
                nodes.push(json!({
                    "id": alt,
                    "token": format!("branch{k}"),
                    "emp_freq_here": 0.05
                }));
                edges.push(json!({"source": prev, "target": alt, "prob": 0.05}));
            }
        }
        prev = id;
    }

    let text = json!({"nodes": nodes, "edges": edges}).to_string();
    load_str(&text).unwrap_or_else(|err| panic!("bench export must load: {err}"))
}

fn bench_layout_strategies(c: &mut Criterion) {
    let mut group = c.benchmark_group("layout_strategies");
    group.measurement_time(Duration::from_secs(10));

    let options = LayoutOptions::default();
    let cases = [("line_200_a2", 200usize, 2usize), ("line_1000_a3", 1000, 3)];
    let kinds = [
        ("branched", LayoutKind::Branched),
        ("linear", LayoutKind::Linear),
        ("ranked", LayoutKind::Ranked),
    ];

    for (name, length, alternates) in cases {
        let graph = build_export(length, alternates);
        for (kind_name, kind) in kinds {
            if kind == LayoutKind::Ranked && length > 200 {
                continue;
            }
            let settings = Settings {
                layout: kind,
                ..Settings::default()
            };
            group.bench_with_input(BenchmarkId::new(kind_name, name), &graph, |b, g| {
                b.iter(|| {
                    let layout = layout_graph(black_box(g), &settings, &options).ok();
                    black_box(layout.map(|l| l.placement.nodes.len()));
                })
            });
        }
    }

    group.finish();
}

fn bench_render_visible(c: &mut Criterion) {
    let mut group = c.benchmark_group("render_visible");

    let settings = Settings {
        layout: LayoutKind::Linear,
        ..Settings::default()
    };
    let graph = build_export(5000, 3);
    let Ok(layout) = layout_graph(&graph, &settings, &LayoutOptions::default()) else {
        return;
    };
    let matches = SearchMatches::run(&layout.placement.nodes, "tok1");
    let measurer = DeterministicTextMeasurer::default();
    let scene = Scene {
        placement: &layout.placement,
        matches: &matches,
        settings: &settings,
        measurer: &measurer,
    };

    for k in [0.1, 1.0] {
        let view = View {
            transform: Transform { k, x: 0.0, y: 400.0 },
            scroll: ScrollRect {
                left: 20_000.0,
                top: 0.0,
                width: 1600.0,
                height: 900.0,
            },
        };
        group.bench_with_input(BenchmarkId::new("line_5000", k), &view, |b, view| {
            let mut canvas = RecordingCanvas::default();
            b.iter(|| black_box(render_visible(&scene, view, &mut canvas)))
        });
    }

    group.finish();
}

criterion_group!(benches, bench_layout_strategies, bench_render_visible);
criterion_main!(benches);
