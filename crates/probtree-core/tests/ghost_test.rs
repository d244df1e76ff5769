use probtree_core::ghost::{MAX_GHOSTS, inject_into_graph, inject_into_tree};
use probtree_core::{EdgeKind, TokenTree, load_str};
use proptest::prelude::*;
use serde_json::json;

fn tree_of(value: serde_json::Value) -> TokenTree {
    TokenTree::build(&load_str(&value.to_string()).unwrap()).unwrap()
}

#[test]
fn tree_ghosts_are_ranked_capped_and_model_only() {
    let mut tree = tree_of(json!({
        "token": "The",
        "path": ["The"],
        "position": 0,
        "theoretical_edges": [
            {"token": "a", "avg_prob": 0.1},
            {"token": "b", "avg_prob": 0.4},
            {"token": "c", "avg_prob": 0.4},
            {"token": "d", "avg_prob": 0.3}
        ]
    }));
    assert_eq!(inject_into_tree(&mut tree), 3);

    let ghosts: Vec<_> = tree
        .children(TokenTree::ROOT)
        .iter()
        .map(|&c| tree.node(c))
        .collect();
    let toks: Vec<&str> = ghosts.iter().map(|g| g.token.as_str()).collect();
    assert_eq!(toks, vec!["b", "c", "d"]);
    for g in &ghosts {
        assert!(g.is_ghost);
        assert!(g.empirical.is_none());
        assert!(g.predicted.is_empty());
        assert_eq!(g.position, Some(1));
        assert_eq!(g.path.as_ref().unwrap()[0], "The");
    }
    assert_eq!(ghosts[0].model_probability(), Some(0.4));
}

#[test]
fn model_children_fill_in_when_no_theoretical_edges_exist() {
    let mut tree = tree_of(json!({
        "token": "r",
        "emp_children": {"seen": 4},
        "model_children": {"seen": {"avg_prob": 0.9}, "new": {"avg_prob": 0.2}},
        "children": [{"token": "seen", "emp_freq_here": 1.0}]
    }));
    assert_eq!(inject_into_tree(&mut tree), 1);
    let last = *tree.children(TokenTree::ROOT).last().unwrap();
    assert_eq!(tree.node(last).token, "new");
}

#[test]
fn ghosts_skip_tokens_already_observed_as_children() {
    let mut tree = tree_of(json!({
        "token": "r",
        "theoretical_edges": [{"token": "x", "avg_prob": 0.5}, {"token": "y", "avg_prob": 0.2}],
        "children": [{"token": "x"}]
    }));
    assert_eq!(inject_into_tree(&mut tree), 1);
    assert_eq!(tree.len(), 3);
}

#[test]
fn graph_ghosts_get_synthetic_ids_and_ghost_edges() {
    let mut g = load_str(
        &json!({
            "nodes": [
                {"id": "p", "token": "p", "position": 2, "path": ["a", "p"],
                 "emp_children": {"k": 1},
                 "theoretical_edges": [{"token": "k", "avg_prob": 0.5}, {"token": "m", "avg_prob": 0.3}]},
                {"id": "k", "token": "k"}
            ],
            "edges": [{"source": "p", "target": "k"}]
        })
        .to_string(),
    )
    .unwrap();
    assert_eq!(inject_into_graph(&mut g), 1);
    let ghost = g.node("ghost_p_m_0").unwrap();
    assert!(ghost.is_ghost);
    assert_eq!(ghost.position, Some(3));
    let edge = g.edges().last().unwrap();
    assert_eq!(edge.kind, EdgeKind::Ghost);
    assert_eq!(edge.probability, Some(0.3));
    assert_eq!(inject_into_graph(&mut g), 0);
}

#[test]
fn reinjection_never_exceeds_the_cap() {
    let continuations: Vec<_> = (0..5)
        .map(|i| json!({"token": format!("t{i}"), "avg_prob": 0.5 - 0.05 * i as f64}))
        .collect();
    let mut g = load_str(
        &json!({
            "nodes": [
                {"id": "r", "token": "r", "is_root": true},
                {"id": "p", "token": "p", "position": 1, "theoretical_edges": continuations}
            ],
            "edges": [{"source": "r", "target": "p"}]
        })
        .to_string(),
    )
    .unwrap();
    let p = g.node_index("p").unwrap();
    let ghosts_under_p = |g: &probtree_core::CanonicalGraph| {
        g.outgoing(p)
            .iter()
            .filter(|&&e| g.edges()[e].kind == EdgeKind::Ghost)
            .count()
    };

    assert_eq!(inject_into_graph(&mut g), MAX_GHOSTS);
    assert_eq!(inject_into_graph(&mut g), 0);
    assert_eq!(ghosts_under_p(&g), MAX_GHOSTS);

    let mut tree = tree_of(json!({"token": "r", "theoretical_edges": (0..5)
        .map(|i| json!({"token": format!("t{i}"), "avg_prob": 0.0}))
        .collect::<Vec<_>>()}));
    assert_eq!(inject_into_tree(&mut tree), MAX_GHOSTS);
    assert_eq!(inject_into_tree(&mut tree), 0);
    assert_eq!(tree.children(TokenTree::ROOT).len(), MAX_GHOSTS);
}

proptest! {
    #[test]
    fn injection_is_idempotent(probs in proptest::collection::vec(0.0f64..1.0, 0..8), kids in 0usize..4) {
        let edges: Vec<_> = probs
            .iter()
            .enumerate()
            .map(|(i, p)| json!({"token": format!("t{}", i % 5), "avg_prob": p}))
            .collect();
        let children: Vec<_> = (0..kids).map(|i| json!({"token": format!("t{i}")})).collect();
        let mut tree = tree_of(json!({"token": "r", "theoretical_edges": edges, "children": children}));

        let first = inject_into_tree(&mut tree);
        prop_assert!(first <= MAX_GHOSTS);
        let len = tree.len();
        prop_assert_eq!(inject_into_tree(&mut tree), 0);
        prop_assert_eq!(tree.len(), len);
        for (_, n) in tree.iter() {
            if n.node.is_ghost {
                prop_assert!(n.node.predicted.is_empty());
                prop_assert!(n.children.is_empty());
            }
        }
    }
}
