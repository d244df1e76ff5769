use sirenia::layered::LayerGraph;
use sirenia::{EdgeLabel, LayoutGraph, acyclic, normalize, rank};

fn layer_graph(edges: &[(&str, &str, usize)]) -> LayerGraph {
    let mut g = LayoutGraph::new();
    for &(v, w, minlen) in edges {
        g.set_edge_with_label(
            v,
            w,
            EdgeLabel {
                minlen,
                ..Default::default()
            },
        );
    }
    LayerGraph::from_graph(&g)
}

#[test]
fn rank_uses_longest_path_from_sources() {
    let mut lg = layer_graph(&[("a", "b", 1), ("b", "c", 1), ("a", "c", 1)]);
    rank::run(&mut lg);
    let ranks: Vec<i32> = lg.nodes.iter().map(|n| n.rank).collect();
    assert_eq!(ranks, vec![0, 1, 2]);
}

#[test]
fn rank_respects_minlen() {
    let mut lg = layer_graph(&[("a", "b", 3)]);
    rank::run(&mut lg);
    assert_eq!(lg.nodes[1].rank - lg.nodes[0].rank, 3);
}

#[test]
fn rank_pulls_side_sources_next_to_their_target() {
    // a -> b -> c -> d, plus s -> d
    let mut lg = layer_graph(&[("a", "b", 1), ("b", "c", 1), ("c", "d", 1), ("s", "d", 1)]);
    rank::run(&mut lg);
    // node order: a b c d s
    assert_eq!(lg.nodes[4].rank, lg.nodes[3].rank - 1);
}

#[test]
fn acyclic_reverses_only_the_closing_edge() {
    let lg = layer_graph(&[("a", "b", 1), ("b", "c", 1), ("c", "a", 1)]);
    assert_eq!(acyclic::find_back_edges(&lg), vec![2]);
}

#[test]
fn normalize_splits_long_edges_into_unit_segments() {
    let mut lg = layer_graph(&[("a", "b", 1), ("b", "c", 1), ("a", "c", 1)]);
    rank::run(&mut lg);
    normalize::run(&mut lg);
    assert_eq!(lg.nodes.len(), 4);
    assert!(lg.nodes[3].is_dummy());
    for e in &lg.edges {
        assert_eq!(lg.nodes[e.w].rank - lg.nodes[e.v].rank, 1);
    }
    assert_eq!(lg.routes[2].as_ref().unwrap().dummies, vec![3]);
}
