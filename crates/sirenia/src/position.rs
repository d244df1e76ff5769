//! Coordinate assignment (top-to-bottom space).
//!
//! `y` comes from the rank: every rank is as tall as its tallest member and consecutive
//! ranks are `ranksep` apart. `x` starts as a left-packed row per rank and is refined by
//! sweeps that pull each node towards the weighted mean of its neighbours in the adjacent
//! rank. Each sweep solves the per-rank problem exactly with pool-adjacent-violators, so
//! the order from crossing reduction and the minimum separations always hold.

use crate::GraphLabel;
use crate::layered::LayerGraph;

const REFINE_SWEEPS: usize = 8;
/// Pull of a node that has no neighbour on the side being swept.
const ANCHOR_WEIGHT: f64 = 0.05;

pub fn run(lg: &mut LayerGraph, label: &GraphLabel) {
    let layers = lg.layers();
    assign_y(lg, &layers, label.ranksep);
    pack_x(lg, &layers, label);

    let (out_edges, in_edges) = lg.adjacency();
    for sweep in 0..REFINE_SWEEPS {
        if sweep % 2 == 0 {
            for r in 1..layers.len() {
                refine_layer(lg, &layers[r], label, &[(&in_edges, Side::Source)]);
            }
        } else {
            for r in (0..layers.len().saturating_sub(1)).rev() {
                refine_layer(lg, &layers[r], label, &[(&out_edges, Side::Target)]);
            }
        }
    }
    for layer in &layers {
        refine_layer(
            lg,
            layer,
            label,
            &[(&in_edges, Side::Source), (&out_edges, Side::Target)],
        );
    }
}

fn assign_y(lg: &mut LayerGraph, layers: &[Vec<usize>], ranksep: f64) {
    let mut y = 0.0;
    let mut prev_half: Option<f64> = None;
    for layer in layers {
        let half = layer
            .iter()
            .map(|&v| lg.nodes[v].height)
            .fold(0.0_f64, f64::max)
            / 2.0;
        y = match prev_half {
            Some(prev) => y + prev + ranksep + half,
            None => half,
        };
        for &v in layer {
            lg.nodes[v].y = y;
        }
        prev_half = Some(half);
    }
}

/// Minimum center distance between two neighbours in the same rank.
fn separation(lg: &LayerGraph, a: usize, b: usize, label: &GraphLabel) -> f64 {
    let (na, nb) = (&lg.nodes[a], &lg.nodes[b]);
    let gap = match (na.is_dummy(), nb.is_dummy()) {
        (false, false) => label.nodesep,
        (true, true) => label.edgesep,
        _ => (label.nodesep + label.edgesep) / 2.0,
    };
    (na.width + nb.width) / 2.0 + gap
}

fn pack_x(lg: &mut LayerGraph, layers: &[Vec<usize>], label: &GraphLabel) {
    for layer in layers {
        let mut x = 0.0;
        for (i, &v) in layer.iter().enumerate() {
            if i > 0 {
                x += separation(lg, layer[i - 1], v, label);
            }
            lg.nodes[v].x = x;
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum Side {
    Source,
    Target,
}

fn link_weight(lg: &LayerGraph, a: usize, b: usize) -> f64 {
    match (lg.nodes[a].is_dummy(), lg.nodes[b].is_dummy()) {
        (false, false) => 1.0,
        (true, true) => 8.0,
        _ => 2.0,
    }
}

fn refine_layer(
    lg: &mut LayerGraph,
    layer: &[usize],
    label: &GraphLabel,
    sides: &[(&Vec<Vec<usize>>, Side)],
) {
    if layer.is_empty() {
        return;
    }

    let mut desired = Vec::with_capacity(layer.len());
    let mut weights = Vec::with_capacity(layer.len());
    for &v in layer {
        let mut sum = 0.0;
        let mut weight = 0.0;
        for (adjacency, side) in sides {
            for &e in &adjacency[v] {
                let edge = &lg.edges[e];
                let other = match side {
                    Side::Source => edge.v,
                    Side::Target => edge.w,
                };
                let w = link_weight(lg, v, other) * edge.weight.max(f64::EPSILON);
                sum += lg.nodes[other].x * w;
                weight += w;
            }
        }
        if weight > 0.0 {
            desired.push(sum / weight);
            weights.push(weight);
        } else {
            desired.push(lg.nodes[v].x);
            weights.push(ANCHOR_WEIGHT);
        }
    }

    // x[i] = z[i] + offset[i] turns the separation constraints into z being non-decreasing.
    let mut offsets = Vec::with_capacity(layer.len());
    let mut acc = 0.0;
    for i in 0..layer.len() {
        if i > 0 {
            acc += separation(lg, layer[i - 1], layer[i], label);
        }
        offsets.push(acc);
    }

    let targets: Vec<f64> = desired
        .iter()
        .zip(&offsets)
        .map(|(d, o)| d - o)
        .collect();
    let fitted = isotonic_fit(&targets, &weights);
    for (i, &v) in layer.iter().enumerate() {
        lg.nodes[v].x = fitted[i] + offsets[i];
    }
}

/// Weighted least-squares fit of a non-decreasing sequence (pool adjacent violators).
pub fn isotonic_fit(values: &[f64], weights: &[f64]) -> Vec<f64> {
    struct Block {
        sum: f64,
        weight: f64,
        len: usize,
    }

    impl Block {
        fn mean(&self) -> f64 {
            self.sum / self.weight
        }
    }

    let mut blocks: Vec<Block> = Vec::with_capacity(values.len());
    for (&v, &w) in values.iter().zip(weights) {
        let mut block = Block {
            sum: v * w,
            weight: w,
            len: 1,
        };
        while let Some(prev) = blocks.last() {
            if prev.mean() <= block.mean() {
                break;
            }
            if let Some(prev) = blocks.pop() {
                block.sum += prev.sum;
                block.weight += prev.weight;
                block.len += prev.len;
            }
        }
        blocks.push(block);
    }

    let mut out = Vec::with_capacity(values.len());
    for block in blocks {
        let mean = block.mean();
        out.extend(std::iter::repeat_n(mean, block.len));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::isotonic_fit;

    #[test]
    fn isotonic_fit_pools_violators() {
        let fitted = isotonic_fit(&[1.0, 3.0, 2.0, 4.0], &[1.0, 1.0, 1.0, 1.0]);
        assert_eq!(fitted, vec![1.0, 2.5, 2.5, 4.0]);
    }

    #[test]
    fn isotonic_fit_keeps_sorted_input() {
        let fitted = isotonic_fit(&[0.0, 1.0, 5.0], &[2.0, 1.0, 1.0]);
        assert_eq!(fitted, vec![0.0, 1.0, 5.0]);
    }
}
