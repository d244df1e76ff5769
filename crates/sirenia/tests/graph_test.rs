use sirenia::{EdgeLabel, LayoutGraph, NodeLabel};

fn weighted(weight: f64) -> EdgeLabel {
    EdgeLabel {
        weight,
        ..Default::default()
    }
}

#[test]
fn edges_create_missing_endpoints_in_insertion_order() {
    let mut g = LayoutGraph::new();
    g.set_node("b", NodeLabel::default());
    g.set_edge_with_label("a", "c", weighted(1.0));
    assert_eq!(g.node_ids(), vec!["b", "a", "c"]);
    assert_eq!(g.edge_count(), 1);
}

#[test]
fn named_edges_coexist_and_relabel_in_place() {
    let mut g = LayoutGraph::new();
    g.set_edge_with_label("a", "b", weighted(1.0));
    g.set_edge_named("a", "b", "e1", weighted(2.0));
    assert_eq!(g.edge_count(), 2);

    g.set_edge_with_label("a", "b", weighted(5.0));
    assert_eq!(g.edge_count(), 2);
    assert_eq!(g.edge("a", "b", None).map(|e| e.weight), Some(5.0));
    assert_eq!(g.edge("a", "b", Some("e1")).map(|e| e.weight), Some(2.0));
    assert!(g.edge("b", "a", None).is_none());

    if let Some(e) = g.edge_mut("a", "b", Some("e1")) {
        e.minlen = 3;
    }
    assert_eq!(g.edge("a", "b", Some("e1")).map(|e| e.minlen), Some(3));
}

#[test]
fn ensure_node_keeps_an_existing_label() {
    let mut g = LayoutGraph::new();
    g.set_node(
        "a",
        NodeLabel {
            width: 10.0,
            ..Default::default()
        },
    );
    g.ensure_node("a");
    assert_eq!(g.node_count(), 1);
    assert_eq!(g.node("a").map(|n| n.width), Some(10.0));
}
