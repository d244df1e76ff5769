use probtree_core::{EdgeKind, Error, GraphInput, InputShape, load_str, normalize};
use serde_json::json;

#[test]
fn input_shape_is_decided_by_top_level_fields() {
    let flat = GraphInput::from_value(json!({"nodes": [], "edges": []})).unwrap();
    assert_eq!(flat.shape(), InputShape::Flat);

    let bundle = GraphInput::from_value(json!({
        "root": "a",
        "nodes_by_id": {"a": {"token": "x"}},
        "anchor_root_id": null
    }))
    .unwrap();
    assert_eq!(bundle.shape(), InputShape::Bundle);

    let tree = GraphInput::from_value(json!({"token": "hi", "children": []})).unwrap();
    assert_eq!(tree.shape(), InputShape::Tree);
}

#[test]
fn input_rejects_non_objects() {
    assert!(matches!(
        GraphInput::from_value(json!([1, 2, 3])),
        Err(Error::UnknownInputShape)
    ));
    assert!(matches!(GraphInput::from_json_str("{"), Err(Error::Json(_))));
}

#[test]
fn flat_graph_coerces_ids_and_drops_dangling_edges() {
    let g = load_str(
        &json!({
            "nodes": [
                {"id": 1, "token": "a"},
                {"token": "b"},
                {"id": "c", "token": 7}
            ],
            "edges": [
                {"source": 1, "target": 1},
                {"source": "1", "target": "c", "kind": "ghost", "prob": 0.2},
                {"source": "1", "target": "missing"}
            ]
        })
        .to_string(),
    )
    .unwrap();

    let ids: Vec<&str> = g.nodes().iter().map(|n| n.id.as_str()).collect();
    // The second node falls back to its index, "1", which is already taken.
    assert_eq!(ids, vec!["1", "c"]);
    assert_eq!(g.node("c").unwrap().token, "7");
    assert_eq!(g.edges().len(), 2);
    assert_eq!(g.edges()[1].kind, EdgeKind::Ghost);
    assert_eq!(g.edges()[1].probability, Some(0.2));
}

#[test]
fn bundle_children_become_edges() {
    let input = GraphInput::from_value(json!({
        "root": {"id": "r"},
        "nodes_by_id": {
            "r": {"token": "The", "children": ["a", {"id": "b"}, "zzz"]},
            "a": {"token": "cat"},
            "b": {"token": "dog"}
        },
        "anchor_root_id": "a"
    }))
    .unwrap();
    let g = normalize(&input);
    assert_eq!(g.nodes().len(), 3);
    let targets: Vec<&str> = g.edges().iter().map(|e| e.target.as_str()).collect();
    assert_eq!(targets, vec!["a", "b"]);
    assert_eq!(g.root.as_deref(), Some("r"));
    assert_eq!(g.anchor_root_id.as_deref(), Some("a"));
}

#[test]
fn nested_tree_gets_generated_ids_in_pre_order() {
    let g = load_str(
        &json!({
            "token": "root",
            "children": [
                {"token": "a", "children": [{"token": "a1"}]},
                {"token": "b"}
            ]
        })
        .to_string(),
    )
    .unwrap();
    let tokens: Vec<&str> = g.nodes().iter().map(|n| n.token.as_str()).collect();
    assert_eq!(tokens, vec!["root", "a", "a1", "b"]);
    assert_eq!(g.root.as_deref(), Some("t0"));
    let root_children: Vec<&str> = g
        .outgoing(0)
        .iter()
        .map(|&e| g.edges()[e].target.as_str())
        .collect();
    assert_eq!(root_children, vec!["t1", "t3"]);
}

#[test]
fn node_fields_are_read_from_the_wire_names() {
    let g = load_str(
        &json!({
            "nodes": [{
                "id": "n",
                "token": "cat",
                "path": ["The", "cat"],
                "position": 1,
                "emp_count_here": 3,
                "emp_parent_total": 4,
                "emp_freq_here": 0.75,
                "model_prob_here": 0.5,
                "model_prob_std": 0.1,
                "model_prob_n": 5,
                "theoretical_edges": [{"token": "sat", "avg_prob": 0.4}],
                "emp_children": {"sat": 2, "ran": null},
                "is_prefix": true
            }],
            "edges": []
        })
        .to_string(),
    )
    .unwrap();
    let n = g.node("n").unwrap();
    assert_eq!(n.path.as_deref(), Some(&["The".to_string(), "cat".to_string()][..]));
    assert_eq!(n.position, Some(1));
    assert_eq!(n.frequency(), Some(0.75));
    assert_eq!(n.empirical.unwrap().count, 3.0);
    assert_eq!(n.model.unwrap().samples, Some(5));
    assert_eq!(n.predicted[0].token, "sat");
    assert_eq!(n.emp_children.get("ran"), Some(&0.0));
    assert!(n.is_fan());
    assert_eq!(n.rank_depth(), 2);
    assert_eq!(n.key(9), "The\u{241F}cat");
}

#[test]
fn edge_probability_falls_back_to_observed_share() {
    let g = load_str(
        &json!({
            "nodes": [
                {"id": "A", "token": "A", "emp_children": {"x": 3, "y": 1}},
                {"id": "X", "token": "x"},
                {"id": "Y", "token": "y"},
                {"id": "G", "token": "g", "isGhost": true, "model_prob_here": 0.3}
            ],
            "edges": [
                {"source": "A", "target": "X"},
                {"source": "A", "target": "Y"},
                {"source": "A", "target": "G"},
                {"source": "A", "target": "Y", "prob": 0.9}
            ]
        })
        .to_string(),
    )
    .unwrap();
    assert_eq!(g.edge_probability(0), 0.75);
    assert_eq!(g.edge_probability(1), 0.25);
    assert_eq!(g.edge_probability(2), 0.3);
    assert_eq!(g.edge_probability(3), 0.9);
}
