use sirenia::coordinate_system;
use sirenia::{EdgeLabel, GraphLabel, LayoutGraph, NodeLabel, Point, RankDir};

fn graph(rankdir: RankDir) -> LayoutGraph {
    let mut g = LayoutGraph::new();
    g.set_graph(GraphLabel {
        rankdir,
        ..Default::default()
    });
    g.set_node(
        "a",
        NodeLabel {
            width: 100.0,
            height: 40.0,
            ..Default::default()
        },
    );
    g
}

#[test]
fn adjust_swaps_extents_only_for_horizontal_flow() {
    let mut tb = graph(RankDir::TB);
    coordinate_system::adjust(&mut tb);
    let a = tb.node("a").unwrap();
    assert_eq!((a.width, a.height), (100.0, 40.0));

    let mut lr = graph(RankDir::LR);
    coordinate_system::adjust(&mut lr);
    let a = lr.node("a").unwrap();
    assert_eq!((a.width, a.height), (40.0, 100.0));
}

#[test]
fn undo_maps_coordinates_back_for_left_to_right() {
    let mut g = graph(RankDir::LR);
    g.set_node("b", NodeLabel::default());
    g.set_edge_with_label(
        "a",
        "b",
        EdgeLabel {
            points: vec![Point { x: 1.0, y: 2.0 }],
            ..Default::default()
        },
    );
    coordinate_system::adjust(&mut g);
    if let Some(a) = g.node_mut("a") {
        a.x = Some(5.0);
        a.y = Some(7.0);
    }
    coordinate_system::undo(&mut g);

    let a = g.node("a").unwrap();
    assert_eq!((a.x, a.y), (Some(7.0), Some(5.0)));
    assert_eq!((a.width, a.height), (100.0, 40.0));
    let points = &g.edge("a", "b", None).unwrap().points;
    assert_eq!(points[0], Point { x: 2.0, y: 1.0 });
}

#[test]
fn undo_reverses_the_flow_axis_for_bottom_to_top() {
    let mut g = graph(RankDir::BT);
    if let Some(a) = g.node_mut("a") {
        a.x = Some(3.0);
        a.y = Some(9.0);
    }
    coordinate_system::undo(&mut g);
    let a = g.node("a").unwrap();
    assert_eq!((a.x, a.y), (Some(3.0), Some(-9.0)));
}
