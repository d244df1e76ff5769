//! Rank assignment.
//!
//! Longest-path ranking from the sources, followed by a pass that pulls pure sources down
//! next to their nearest successor so that side entries do not stretch across many ranks.
//! Ranks are normalized to start at zero. Expects an acyclic [`LayerGraph`].

use crate::layered::LayerGraph;
use std::collections::VecDeque;

pub fn run(lg: &mut LayerGraph) {
    let order = topological_order(lg);
    longest_path(lg, &order);
    tighten_sources(lg, &order);
    normalize_ranks(lg);
}

pub fn topological_order(lg: &LayerGraph) -> Vec<usize> {
    let (out_edges, in_edges) = lg.adjacency();
    let mut indegree: Vec<usize> = in_edges.iter().map(Vec::len).collect();
    let mut queue: VecDeque<usize> = (0..lg.nodes.len()).filter(|&v| indegree[v] == 0).collect();
    let mut order = Vec::with_capacity(lg.nodes.len());

    while let Some(v) = queue.pop_front() {
        order.push(v);
        for &e in &out_edges[v] {
            let w = lg.edges[e].w;
            indegree[w] = indegree[w].saturating_sub(1);
            if indegree[w] == 0 {
                queue.push_back(w);
            }
        }
    }

    // Only reachable when the caller skipped cycle breaking; keep every node ranked.
    if order.len() != lg.nodes.len() {
        let mut seen = vec![false; lg.nodes.len()];
        for &v in &order {
            seen[v] = true;
        }
        order.extend((0..lg.nodes.len()).filter(|&v| !seen[v]));
    }
    order
}

fn longest_path(lg: &mut LayerGraph, order: &[usize]) {
    let (_, in_edges) = lg.adjacency();
    for &w in order {
        let mut rank = 0;
        for &e in &in_edges[w] {
            let edge = &lg.edges[e];
            rank = rank.max(lg.nodes[edge.v].rank + edge.minlen);
        }
        lg.nodes[w].rank = rank;
    }
}

fn tighten_sources(lg: &mut LayerGraph, order: &[usize]) {
    let (out_edges, in_edges) = lg.adjacency();
    for &v in order.iter().rev() {
        if !in_edges[v].is_empty() || out_edges[v].is_empty() {
            continue;
        }
        let mut slack_rank = i32::MAX;
        for &e in &out_edges[v] {
            let edge = &lg.edges[e];
            slack_rank = slack_rank.min(lg.nodes[edge.w].rank - edge.minlen);
        }
        if slack_rank != i32::MAX && slack_rank > lg.nodes[v].rank {
            lg.nodes[v].rank = slack_rank;
        }
    }
}

fn normalize_ranks(lg: &mut LayerGraph) {
    let min = lg.nodes.iter().map(|n| n.rank).min().unwrap_or(0);
    for n in &mut lg.nodes {
        n.rank -= min;
    }
}
