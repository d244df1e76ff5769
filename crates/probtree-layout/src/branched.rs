//! Tidy-tree placement.
//!
//! Sibling order follows the tree. Cross-axis offsets come from the Buchheim/Walker tidy
//! algorithm (siblings one slot apart, cousins two), scaled by a fixed slot height. Columns
//! are spaced wide enough for the widest box, then widened further, within a cap, so the
//! steepest parent/child edge fits the angle bound. Edges that still violate it are fixed by
//! pushing the child's whole subtree forward.

use crate::constraint::{AngleConstraint, RepairGroup, repair};
use crate::geometry::{PlacedLink, PlacedNode, Placement};
use crate::sizing::NodeSizer;
use probtree_core::{Settings, TokenTree};

/// Clearance added to the widest box when sizing columns.
pub const COLUMN_MARGIN: f64 = 24.0;

pub fn layout_branched(tree: &TokenTree, sizer: &dyn NodeSizer, settings: &Settings) -> Placement {
    if tree.is_empty() {
        return Placement::default();
    }
    let sizes: Vec<_> = tree
        .iter()
        .map(|(_, t)| sizer.size(&t.node).clamped())
        .collect();
    let w_max = sizes.iter().map(|s| s.w).fold(0.0, f64::max);
    let slot = settings.alt_gap + settings.token_fpx + settings.pad_t + settings.pad_b;

    let cross: Vec<f64> = tidy_offsets(tree).into_iter().map(|u| u * slot).collect();

    let constraint = AngleConstraint::from_degrees(settings.ang_max_deg);
    let base_gap = settings.gap_x.max(w_max + COLUMN_MARGIN);
    let gap = match constraint {
        Some(c) => {
            let worst = tree
                .iter()
                .filter_map(|(i, t)| t.parent.map(|p| (cross[i] - cross[p]).abs()))
                .fold(0.0, f64::max);
            let desired = w_max + c.min_run(worst) + COLUMN_MARGIN;
            base_gap.max(desired.min(settings.branched_gap_max))
        }
        None => base_gap,
    };

    let mut nodes: Vec<PlacedNode> = tree
        .iter()
        .map(|(i, t)| PlacedNode {
            x: cross[i],
            y: t.depth as f64 * gap,
            w: sizes[i].w,
            h: sizes[i].h,
            depth: t.depth,
            key: tree.key(i),
            node: t.node.clone(),
        })
        .collect();
    Placement::dedupe_keys(&mut nodes);

    if let Some(c) = constraint {
        let groups = tree.pre_order().into_iter().filter_map(|child| {
            tree.parent(child).map(|parent| RepairGroup {
                edges: vec![(parent, child)],
                moving: child,
            })
        });
        repair(&mut nodes, c, groups, |&child, buf| {
            buf.extend(tree.subtree(child));
        });
    }

    let links = tree
        .iter()
        .filter_map(|(i, t)| {
            let parent = t.parent?;
            let p = t.node.display_probability().unwrap_or(0.0);
            Some(PlacedLink::between(&nodes[parent], &nodes[i], p))
        })
        .collect();

    tracing::debug!(nodes = nodes.len(), gap, "branched layout");
    Placement { nodes, links }
}

/// Cross-axis position of every node in sibling-slot units, root at 0.
pub fn tidy_offsets(tree: &TokenTree) -> Vec<f64> {
    let n = tree.len();
    if n == 0 {
        return Vec::new();
    }
    let mut t = Tidy {
        tree,
        prelim: vec![0.0; n],
        modifier: vec![0.0; n],
        change: vec![0.0; n],
        shift: vec![0.0; n],
        ancestor: (0..n).collect(),
        thread: vec![None; n],
        number: vec![0; n],
        default_ancestor: vec![None; n],
    };
    for (_, node) in tree.iter() {
        for (k, &c) in node.children.iter().enumerate() {
            t.number[c] = k;
        }
    }

    for v in left_to_right_post_order(tree) {
        t.first_walk(v);
    }

    let root = TokenTree::ROOT;
    let mut x = vec![0.0; n];
    let root_mod = -t.prelim[root];
    for v in tree.pre_order() {
        let parent_mod = tree.parent(v).map_or(root_mod, |p| t.modifier[p]);
        x[v] = t.prelim[v] + parent_mod;
        t.modifier[v] += parent_mod;
    }
    x
}

fn left_to_right_post_order(tree: &TokenTree) -> Vec<usize> {
    let mut out = Vec::with_capacity(tree.len());
    let mut stack = vec![TokenTree::ROOT];
    while let Some(v) = stack.pop() {
        out.push(v);
        stack.extend(tree.children(v).iter().copied());
    }
    out.reverse();
    out
}

struct Tidy<'a> {
    tree: &'a TokenTree,
    prelim: Vec<f64>,
    modifier: Vec<f64>,
    change: Vec<f64>,
    shift: Vec<f64>,
    ancestor: Vec<usize>,
    thread: Vec<Option<usize>>,
    /// Index among siblings.
    number: Vec<usize>,
    /// Default ancestor, stored on the parent while its children are walked.
    default_ancestor: Vec<Option<usize>>,
}

impl Tidy<'_> {
    fn separation(&self, a: usize, b: usize) -> f64 {
        if self.tree.parent(a) == self.tree.parent(b) {
            1.0
        } else {
            2.0
        }
    }

    fn siblings(&self, v: usize) -> &[usize] {
        match self.tree.parent(v) {
            Some(p) => self.tree.children(p),
            None => &[],
        }
    }

    fn left_sibling(&self, v: usize) -> Option<usize> {
        let i = self.number[v];
        (i > 0).then(|| self.siblings(v)[i - 1])
    }

    fn next_left(&self, v: usize) -> Option<usize> {
        self.tree.children(v).first().copied().or(self.thread[v])
    }

    fn next_right(&self, v: usize) -> Option<usize> {
        self.tree.children(v).last().copied().or(self.thread[v])
    }

    fn first_walk(&mut self, v: usize) {
        let tree = self.tree;
        let w = self.left_sibling(v);
        let kids = tree.children(v);
        if let (Some(&first), Some(&last)) = (kids.first(), kids.last()) {
            self.execute_shifts(v);
            let midpoint = (self.prelim[first] + self.prelim[last]) / 2.0;
            match w {
                Some(w) => {
                    self.prelim[v] = self.prelim[w] + self.separation(v, w);
                    self.modifier[v] = self.prelim[v] - midpoint;
                }
                None => self.prelim[v] = midpoint,
            }
        } else if let Some(w) = w {
            self.prelim[v] = self.prelim[w] + self.separation(v, w);
        }

        if let Some(parent) = tree.parent(v) {
            let first_sibling = tree.children(parent)[0];
            let ancestor = self.default_ancestor[parent].unwrap_or(first_sibling);
            self.default_ancestor[parent] = Some(self.apportion(v, w, ancestor));
        }
    }

    fn apportion(&mut self, v: usize, w: Option<usize>, mut ancestor: usize) -> usize {
        let Some(w) = w else {
            return ancestor;
        };
        let parent = self.tree.parent(v);
        let mut vip = v;
        let mut vop = v;
        let mut vim = w;
        let mut vom = parent.map_or(v, |p| self.tree.children(p)[0]);
        let mut sip = self.modifier[vip];
        let mut sop = self.modifier[vop];
        let mut sim = self.modifier[vim];
        let mut som = self.modifier[vom];

        let mut next_vim = self.next_right(vim);
        let mut next_vip = self.next_left(vip);
        while let (Some(nim), Some(nip)) = (next_vim, next_vip) {
            vim = nim;
            vip = nip;
            // Both contours continue, so the outer ones do too.
            vom = self.next_left(vom).unwrap_or(vom);
            vop = self.next_right(vop).unwrap_or(vop);
            self.ancestor[vop] = v;
            let shift = self.prelim[vim] + sim - self.prelim[vip] - sip + self.separation(vim, vip);
            if shift > 0.0 {
                let wm = self.next_ancestor(vim, v, ancestor);
                self.move_subtree(wm, v, shift);
                sip += shift;
                sop += shift;
            }
            sim += self.modifier[vim];
            sip += self.modifier[vip];
            som += self.modifier[vom];
            sop += self.modifier[vop];
            next_vim = self.next_right(vim);
            next_vip = self.next_left(vip);
        }

        if let Some(nim) = next_vim {
            if self.next_right(vop).is_none() {
                self.thread[vop] = Some(nim);
                self.modifier[vop] += sim - sop;
            }
        }
        if let Some(nip) = next_vip {
            if self.next_left(vom).is_none() {
                self.thread[vom] = Some(nip);
                self.modifier[vom] += sip - som;
                ancestor = v;
            }
        }
        ancestor
    }

    fn next_ancestor(&self, vim: usize, v: usize, ancestor: usize) -> usize {
        let a = self.ancestor[vim];
        if self.tree.parent(a) == self.tree.parent(v) {
            a
        } else {
            ancestor
        }
    }

    fn move_subtree(&mut self, wm: usize, wp: usize, shift: f64) {
        let subtrees = (self.number[wp] - self.number[wm]) as f64;
        let change = shift / subtrees;
        self.change[wp] -= change;
        self.shift[wp] += shift;
        self.change[wm] += change;
        self.prelim[wp] += shift;
        self.modifier[wp] += shift;
    }

    fn execute_shifts(&mut self, v: usize) {
        let tree = self.tree;
        let mut shift = 0.0;
        let mut change = 0.0;
        for &w in tree.children(v).iter().rev() {
            self.prelim[w] += shift;
            self.modifier[w] += shift;
            change += self.change[w];
            shift += self.shift[w] + change;
        }
    }
}
