//! Profile-packed placement for deep trees that are mostly one long line.
//!
//! Each node continues on its parent's line through a main child; the other children are
//! stacked underneath. Packing uses per-depth extents (profiles) and a running skyline per
//! column, so a subtree placed later never overlaps one placed earlier.
//!
//! Depth columns sit at fixed flow positions. When an edge into column `d + 1` is too steep,
//! column `d + 1` and every deeper column move forward together, so the nodes of a column stay
//! aligned and edges between deeper columns keep their geometry.

use crate::constraint::{AngleConstraint, RepairGroup, repair};
use crate::geometry::{PlacedLink, PlacedNode, Placement};
use crate::sizing::{NodeSizer, Size};
use probtree_core::score::main_child;
use probtree_core::{Metric, Settings, TokenTree};

/// Extra run between the root column and the first child column.
pub const ROOT_COLUMN_MARGIN: f64 = 100.0;

/// Cross-axis extent of a subtree at each depth below its root, relative to the root's
/// center. Index 0 is the root's own column.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Profile {
    pub top: Vec<f64>,
    pub bottom: Vec<f64>,
}

impl Profile {
    pub fn span(&self) -> usize {
        self.top.len()
    }
}

/// Packing plan of one node.
#[derive(Debug, Clone, Default)]
struct Plan {
    size: Option<Size>,
    /// Children in placement order (main child first) with their offset below this node.
    children: Vec<(usize, f64)>,
    profile: Profile,
    /// Distance from this node's center to the lowest point of its subtree.
    down: f64,
}

pub fn layout_linear(tree: &TokenTree, sizer: &dyn NodeSizer, settings: &Settings) -> Placement {
    if tree.is_empty() {
        return Placement::default();
    }
    let mut plans = build_profiles(tree, sizer, settings);
    let cross = pack(tree, &mut plans, settings.alt_gap);

    let size_of = |i: usize| plans[i].size.unwrap_or(Size { w: 0.0, h: 0.0 });
    let first_gap = settings
        .gap_x
        .max(size_of(TokenTree::ROOT).w + ROOT_COLUMN_MARGIN);
    let column = |d: usize| {
        if d == 0 {
            0.0
        } else {
            first_gap + (d - 1) as f64 * settings.gap_x
        }
    };

    let mut nodes: Vec<PlacedNode> = tree
        .iter()
        .map(|(i, t)| {
            let size = size_of(i);
            PlacedNode {
                x: cross[i],
                y: column(t.depth),
                w: size.w,
                h: size.h,
                depth: t.depth,
                key: tree.key(i),
                node: t.node.clone(),
            }
        })
        .collect();
    Placement::dedupe_keys(&mut nodes);

    if let Some(c) = AngleConstraint::from_degrees(settings.ang_max_deg) {
        shift_columns(tree, &mut nodes, c, settings.packing_metric);
    }

    let links = tree
        .iter()
        .filter_map(|(i, t)| {
            let parent = t.parent?;
            let p = t.node.display_probability().unwrap_or(0.0);
            Some(PlacedLink::between(&nodes[parent], &nodes[i], p))
        })
        .collect();

    tracing::debug!(nodes = nodes.len(), "linear layout");
    Placement { nodes, links }
}

/// Bottom-up pass: sizes, child offsets and subtree profiles.
fn build_profiles(tree: &TokenTree, sizer: &dyn NodeSizer, settings: &Settings) -> Vec<Plan> {
    let alt_gap = settings.alt_gap;
    let mut plans: Vec<Plan> = vec![Plan::default(); tree.len()];

    for v in tree.post_order() {
        let size = sizer.size(tree.node(v)).clamped();
        let half = size.h / 2.0;
        let main = main_child(tree, v, settings.packing_metric);

        let mut children = Vec::with_capacity(tree.children(v).len());
        if let Some(m) = main {
            children.push((m, 0.0));
        }
        let mut alt_start = half + alt_gap;
        for &c in tree.children(v) {
            if Some(c) == main {
                continue;
            }
            children.push((c, alt_start));
            alt_start += plans[c].down + alt_gap;
        }

        let span = 1 + children
            .iter()
            .map(|&(c, _)| plans[c].profile.span())
            .max()
            .unwrap_or(0);
        let mut top = vec![f64::INFINITY; span];
        let mut bottom = vec![f64::NEG_INFINITY; span];
        top[0] = -half;
        bottom[0] = half;
        for &(c, off) in &children {
            let child = &plans[c].profile;
            for j in 0..child.span() {
                top[j + 1] = top[j + 1].min(off + child.top[j]);
                bottom[j + 1] = bottom[j + 1].max(off + child.bottom[j]);
            }
        }
        for value in top.iter_mut().chain(bottom.iter_mut()) {
            if !value.is_finite() {
                *value = 0.0;
            }
        }
        let down = bottom.iter().copied().fold(half, f64::max);

        plans[v] = Plan {
            size: Some(size),
            children,
            profile: Profile { top, bottom },
            down,
        };
    }
    plans
}

/// Top-down pass: cross-axis centers, packing each child against the skyline.
fn pack(tree: &TokenTree, plans: &mut [Plan], alt_gap: f64) -> Vec<f64> {
    let mut cross = vec![0.0; tree.len()];
    let mut sky: Vec<f64> = Vec::new();
    let raise = |sky: &mut Vec<f64>, col: usize, value: f64| {
        if sky.len() <= col {
            sky.resize(col + 1, f64::NEG_INFINITY);
        }
        sky[col] = sky[col].max(value);
    };

    let root = TokenTree::ROOT;
    let half = |plans: &[Plan], v: usize| plans[v].size.map_or(0.0, |s| s.h / 2.0);
    raise(&mut sky, 0, half(plans, root));

    // (node, cursor into its placement-ordered children)
    let mut stack: Vec<(usize, usize)> = vec![(root, 0)];
    while let Some(frame) = stack.last_mut() {
        let (v, cursor) = *frame;
        if cursor == plans[v].children.len() {
            stack.pop();
            // The subtree is complete: record its extent on the skyline.
            let depth = tree.get(v).depth;
            let profile = std::mem::take(&mut plans[v].profile);
            for (j, bottom) in profile.bottom.iter().enumerate() {
                raise(&mut sky, depth + j, cross[v] + bottom);
            }
            continue;
        }
        frame.1 += 1;

        let (c, off) = plans[v].children[cursor];
        let child_depth = tree.get(c).depth;
        let profile = &plans[c].profile;
        let mut need: f64 = 0.0;
        for j in 0..profile.span() {
            let skyline = sky
                .get(child_depth + j)
                .copied()
                .unwrap_or(f64::NEG_INFINITY);
            let top_at = cross[v] + off + profile.top[j];
            need = need.max(skyline + alt_gap - top_at);
        }
        cross[c] = cross[v] + off + need;
        raise(&mut sky, child_depth, cross[c] + half(plans, c));
        stack.push((c, 0));
    }
    cross
}

/// Pushes columns forward until every alternate edge fits the angle bound. Main-child edges
/// stay on their parent's line and never need a shift. Columns are handled shallow to
/// deep; moving column `d + 1` and everything deeper never changes an edge between
/// shallower columns.
fn shift_columns(
    tree: &TokenTree,
    nodes: &mut [PlacedNode],
    constraint: AngleConstraint,
    metric: Metric,
) {
    let mut by_depth: Vec<usize> = (0..nodes.len()).collect();
    by_depth.sort_by_key(|&i| nodes[i].depth);
    let max_depth = nodes.iter().map(|n| n.depth).max().unwrap_or(0);

    // first_at[d] = first index in `by_depth` whose depth is at least `d`.
    let mut first_at = vec![by_depth.len(); max_depth + 2];
    for (pos, &i) in by_depth.iter().enumerate().rev() {
        first_at[nodes[i].depth] = pos;
    }
    for d in (0..=max_depth).rev() {
        first_at[d] = first_at[d].min(first_at[d + 1]);
    }

    let mains: Vec<Option<usize>> = (0..tree.len()).map(|v| main_child(tree, v, metric)).collect();
    let mut edges_from: Vec<Vec<(usize, usize)>> = vec![Vec::new(); max_depth + 1];
    for (i, t) in tree.iter() {
        match t.parent {
            Some(p) if mains[p] != Some(i) => edges_from[tree.get(p).depth].push((p, i)),
            _ => {}
        }
    }

    let groups = edges_from
        .into_iter()
        .enumerate()
        .filter(|(_, edges)| !edges.is_empty())
        .map(|(d, edges)| RepairGroup {
            edges,
            moving: d + 1,
        });
    repair(nodes, constraint, groups, |&column, buf| {
        buf.extend_from_slice(&by_depth[first_at[column]..]);
    });
}
