use crate::model::Node;
use crate::settings::Metric;
use crate::tree::TokenTree;

/// Ranking score of a node under `metric`; higher is better, `-1` when nothing is known.
pub fn score(metric: Metric, node: &Node) -> f64 {
    let e = node.frequency();
    let p = node.model_probability();
    match metric {
        Metric::Emp => e.or(p.map(|p| p * 0.5)).unwrap_or(-1.0),
        Metric::Prob => p.or(e.map(|e| e * 0.5)).unwrap_or(-1.0),
        Metric::Data => 0.0,
    }
}

/// The child that continues its parent's line. Ghosts never qualify; the first child
/// wins ties.
pub fn main_child(tree: &TokenTree, idx: usize, metric: Metric) -> Option<usize> {
    let mut best: Option<(usize, f64)> = None;
    for &child in tree.children(idx) {
        let node = tree.node(child);
        if node.is_ghost {
            continue;
        }
        if metric == Metric::Data {
            return Some(child);
        }
        let s = score(metric, node);
        if best.is_none_or(|(_, b)| s > b) {
            best = Some((child, s));
        }
    }
    best.map(|(child, _)| child)
}

/// Root-to-leaf chain of main children.
pub fn main_path(tree: &TokenTree, metric: Metric) -> Vec<usize> {
    let mut out = Vec::new();
    if tree.is_empty() {
        return out;
    }
    let mut cur = TokenTree::ROOT;
    out.push(cur);
    while let Some(next) = main_child(tree, cur, metric) {
        out.push(next);
        cur = next;
    }
    out
}
