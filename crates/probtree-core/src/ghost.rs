//! Ghost children: predicted but never observed continuations.
//!
//! Candidates come from a node's `theoretical_edges`, or, when it has none, from the
//! `model_children` whose token was never observed. At most [`MAX_GHOSTS`] are kept per
//! node, most probable first, and ghosts already attached count against that cap. A token
//! that already names a child of the node is never synthesized again, so paths stay unique
//! and injecting twice adds nothing.

use crate::graph::CanonicalGraph;
use crate::model::{Continuation, Edge, EdgeKind, ModelPrediction, Node};
use crate::tree::TokenTree;
use rustc_hash::FxHashSet;

pub const MAX_GHOSTS: usize = 3;

/// Ghost continuations for `parent`, skipping tokens listed in `existing`.
pub fn candidates(parent: &Node, existing: &FxHashSet<String>) -> Vec<Continuation> {
    if parent.is_ghost || parent.cycle_detected {
        return Vec::new();
    }

    let mut pool: Vec<Continuation> = if !parent.predicted.is_empty() {
        parent.predicted.clone()
    } else {
        parent
            .model_children
            .iter()
            .filter(|(token, _)| !parent.emp_children.contains_key(*token))
            .map(|(token, p)| Continuation {
                token: token.clone(),
                probability: *p,
            })
            .collect()
    };

    // Stable: ties keep input order. Missing probabilities rank last.
    pool.sort_by(|a, b| {
        let pa = a.probability.unwrap_or(f64::NEG_INFINITY);
        let pb = b.probability.unwrap_or(f64::NEG_INFINITY);
        pb.total_cmp(&pa)
    });

    let mut seen: FxHashSet<&str> = FxHashSet::default();
    let mut out = Vec::with_capacity(MAX_GHOSTS);
    for c in &pool {
        if out.len() == MAX_GHOSTS {
            break;
        }
        if existing.contains(&c.token) || !seen.insert(c.token.as_str()) {
            continue;
        }
        out.push(c.clone());
    }
    out
}

/// Builds the ghost node for one continuation of `parent`.
pub fn ghost_node(parent: &Node, seed: &Continuation, id: String) -> Node {
    let mut path = parent.path.clone().unwrap_or_default();
    path.push(seed.token.clone());
    Node {
        id,
        token: seed.token.clone(),
        path: Some(path),
        position: Some(parent.position.unwrap_or(-1) + 1),
        model: seed.probability.map(|mean| ModelPrediction {
            mean,
            std_dev: None,
            samples: None,
        }),
        is_ghost: true,
        ..Default::default()
    }
}

/// Appends ghost children to every observed node of the tree. Returns the number added.
pub fn inject_into_tree(tree: &mut TokenTree) -> usize {
    let original = tree.len();
    let mut added = 0;
    for idx in 0..original {
        let children = tree.children(idx);
        let existing: FxHashSet<String> = children
            .iter()
            .map(|&c| tree.node(c).token.clone())
            .collect();
        let ghosts = children.iter().filter(|&&c| tree.node(c).is_ghost).count();
        let mut seeds = candidates(tree.node(idx), &existing);
        seeds.truncate(MAX_GHOSTS.saturating_sub(ghosts));
        for seed in seeds {
            let parent = tree.node(idx);
            let id = format!("{}/ghost:{}", parent.id, seed.token);
            let ghost = ghost_node(parent, &seed, id);
            tree.add_child(idx, ghost);
            added += 1;
        }
    }
    if added > 0 {
        tracing::debug!(added, "injected ghost children into tree");
    }
    added
}

/// Adds ghost nodes and `ghost` edges to a graph, ids `ghost_{parent}_{token}_{n}` with a
/// per-call counter. Returns the number added.
pub fn inject_into_graph(graph: &mut CanonicalGraph) -> usize {
    let original = graph.nodes().len();
    let mut counter = 0usize;
    for idx in 0..original {
        let parent = &graph.nodes()[idx];
        let mut existing: FxHashSet<String> = parent.emp_children.keys().cloned().collect();
        let mut ghosts = 0usize;
        for &e in graph.outgoing(idx) {
            let edge = &graph.edges()[e];
            if edge.kind == EdgeKind::Ghost {
                ghosts += 1;
            }
            if let Some(child) = graph.node(&edge.target) {
                existing.insert(child.token.clone());
            }
        }

        let mut seeds = candidates(parent, &existing);
        seeds.truncate(MAX_GHOSTS.saturating_sub(ghosts));
        let parent = parent.clone();
        for seed in seeds {
            let mut id = format!("ghost_{}_{}_{}", parent.id, seed.token, counter);
            counter += 1;
            while graph.node_index(&id).is_some() {
                id = format!("ghost_{}_{}_{}", parent.id, seed.token, counter);
                counter += 1;
            }
            let ghost = ghost_node(&parent, &seed, id.clone());
            graph.push_node(ghost);
            graph.push_edge(Edge {
                source: parent.id.clone(),
                target: id,
                kind: EdgeKind::Ghost,
                probability: seed.probability,
                weight: 1.0,
            });
        }
    }
    let added = graph.nodes().len() - original;
    if added > 0 {
        tracing::debug!(added, "injected ghost nodes into graph");
    }
    added
}
