//! Crossing reduction.
//!
//! Layers start in depth-first discovery order, then alternate downward (by predecessor
//! barycenter) and upward (by successor barycenter) sweeps. The ordering with the fewest
//! weighted crossings seen so far wins; sweeping stops after a few non-improving passes.

use crate::layered::LayerGraph;

const MAX_SWEEPS: usize = 24;
const PATIENCE: usize = 4;

pub fn run(lg: &mut LayerGraph) {
    let mut layers = init_order(lg);
    if layers.len() < 2 {
        assign(lg, &layers);
        return;
    }

    let (out_edges, in_edges) = lg.adjacency();
    let mut best = layers.clone();
    let mut best_cc = cross_count(lg, &layers);
    let mut stale = 0usize;

    for sweep in 0..MAX_SWEEPS {
        if best_cc == 0.0 {
            break;
        }
        if sweep % 2 == 0 {
            for r in 1..layers.len() {
                reorder_layer(lg, &mut layers, r, r - 1, &in_edges, Neighbor::Source);
            }
        } else {
            for r in (0..layers.len() - 1).rev() {
                reorder_layer(lg, &mut layers, r, r + 1, &out_edges, Neighbor::Target);
            }
        }

        let cc = cross_count(lg, &layers);
        if cc < best_cc {
            best_cc = cc;
            best = layers.clone();
            stale = 0;
        } else {
            stale += 1;
            if stale >= PATIENCE {
                break;
            }
        }
    }

    assign(lg, &best);
}

/// Depth-first discovery order, starting from the lowest-ranked nodes.
pub fn init_order(lg: &LayerGraph) -> Vec<Vec<usize>> {
    let (out_edges, _) = lg.adjacency();
    let mut layers: Vec<Vec<usize>> = vec![Vec::new(); lg.max_rank().max(0) as usize + 1];
    let mut visited = vec![false; lg.nodes.len()];

    let mut starts: Vec<usize> = (0..lg.nodes.len()).collect();
    starts.sort_by_key(|&v| lg.nodes[v].rank);

    for start in starts {
        if visited[start] {
            continue;
        }
        let mut stack = vec![start];
        while let Some(v) = stack.pop() {
            if visited[v] {
                continue;
            }
            visited[v] = true;
            layers[lg.nodes[v].rank.max(0) as usize].push(v);
            for &e in out_edges[v].iter().rev() {
                let w = lg.edges[e].w;
                if !visited[w] {
                    stack.push(w);
                }
            }
        }
    }
    layers
}

fn assign(lg: &mut LayerGraph, layers: &[Vec<usize>]) {
    for layer in layers {
        for (order, &v) in layer.iter().enumerate() {
            lg.nodes[v].order = order;
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum Neighbor {
    Source,
    Target,
}

fn reorder_layer(
    lg: &LayerGraph,
    layers: &mut [Vec<usize>],
    movable: usize,
    fixed: usize,
    adjacency: &[Vec<usize>],
    neighbor: Neighbor,
) {
    let mut fixed_pos = vec![0usize; lg.nodes.len()];
    for (pos, &v) in layers[fixed].iter().enumerate() {
        fixed_pos[v] = pos;
    }

    let mut keyed: Vec<(f64, usize, usize)> = layers[movable]
        .iter()
        .enumerate()
        .map(|(current, &v)| {
            let mut sum = 0.0;
            let mut weight = 0.0;
            for &e in &adjacency[v] {
                let edge = &lg.edges[e];
                let other = match neighbor {
                    Neighbor::Source => edge.v,
                    Neighbor::Target => edge.w,
                };
                let wgt = edge.weight.max(f64::EPSILON);
                sum += fixed_pos[other] as f64 * wgt;
                weight += wgt;
            }
            let barycenter = if weight > 0.0 {
                sum / weight
            } else {
                current as f64
            };
            (barycenter, current, v)
        })
        .collect();

    keyed.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)));
    layers[movable] = keyed.into_iter().map(|(_, _, v)| v).collect();
}

/// Weighted crossings between every pair of adjacent layers.
pub fn cross_count(lg: &LayerGraph, layers: &[Vec<usize>]) -> f64 {
    let (out_edges, _) = lg.adjacency();
    let mut pos = vec![0usize; lg.nodes.len()];
    for layer in layers {
        for (p, &v) in layer.iter().enumerate() {
            pos[v] = p;
        }
    }

    let mut total = 0.0;
    for r in 0..layers.len().saturating_sub(1) {
        let south_len = layers[r + 1].len();
        let mut entries: Vec<(usize, usize, f64)> = Vec::new();
        for &v in &layers[r] {
            for &e in &out_edges[v] {
                let edge = &lg.edges[e];
                entries.push((pos[v], pos[edge.w], edge.weight));
            }
        }
        entries.sort_by(|a, b| a.0.cmp(&b.0).then(a.1.cmp(&b.1)));

        let mut tree = Fenwick::new(south_len);
        let mut inserted = 0.0;
        for (_, south, weight) in entries {
            let not_greater = tree.prefix_sum(south);
            total += weight * (inserted - not_greater);
            tree.add(south, weight);
            inserted += weight;
        }
    }
    total
}

struct Fenwick {
    tree: Vec<f64>,
}

impl Fenwick {
    fn new(len: usize) -> Self {
        Self {
            tree: vec![0.0; len + 1],
        }
    }

    fn add(&mut self, idx: usize, value: f64) {
        let mut i = idx + 1;
        while i < self.tree.len() {
            self.tree[i] += value;
            i += i & i.wrapping_neg();
        }
    }

    /// Sum over positions `0..=idx`.
    fn prefix_sum(&self, idx: usize) -> f64 {
        let mut i = (idx + 1).min(self.tree.len() - 1);
        let mut sum = 0.0;
        while i > 0 {
            sum += self.tree[i];
            i -= i & i.wrapping_neg();
        }
        sum
    }
}
