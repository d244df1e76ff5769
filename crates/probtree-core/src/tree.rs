//! Arena-backed token tree consumed by the branched and linear layouts.
//!
//! Nodes live in one `Vec` and refer to each other by index, so deep main paths never
//! recurse. Index 0 is the root.

use crate::error::{Error, Result};
use crate::graph::CanonicalGraph;
use crate::input::InputShape;
use crate::model::{EdgeKind, Node};

#[derive(Debug, Clone, PartialEq)]
pub struct TreeNode {
    pub node: Node,
    pub parent: Option<usize>,
    pub children: Vec<usize>,
    pub depth: usize,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TokenTree {
    nodes: Vec<TreeNode>,
}

impl TokenTree {
    pub fn with_root(node: Node) -> Self {
        Self {
            nodes: vec![TreeNode {
                node,
                parent: None,
                children: Vec::new(),
                depth: 0,
            }],
        }
    }

    pub const ROOT: usize = 0;

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn get(&self, idx: usize) -> &TreeNode {
        &self.nodes[idx]
    }

    pub fn get_mut(&mut self, idx: usize) -> &mut TreeNode {
        &mut self.nodes[idx]
    }

    pub fn node(&self, idx: usize) -> &Node {
        &self.nodes[idx].node
    }

    pub fn children(&self, idx: usize) -> &[usize] {
        &self.nodes[idx].children
    }

    pub fn parent(&self, idx: usize) -> Option<usize> {
        self.nodes[idx].parent
    }

    pub fn iter(&self) -> impl Iterator<Item = (usize, &TreeNode)> {
        self.nodes.iter().enumerate()
    }

    /// Appends `node` as the last child of `parent`.
    pub fn add_child(&mut self, parent: usize, node: Node) -> usize {
        let idx = self.nodes.len();
        let depth = self.nodes[parent].depth + 1;
        self.nodes.push(TreeNode {
            node,
            parent: Some(parent),
            children: Vec::new(),
            depth,
        });
        self.nodes[parent].children.push(idx);
        idx
    }

    pub fn key(&self, idx: usize) -> String {
        let n = &self.nodes[idx];
        n.node.key(n.depth)
    }

    /// Parents before children, siblings in order.
    pub fn pre_order(&self) -> Vec<usize> {
        let mut out = Vec::with_capacity(self.nodes.len());
        if self.nodes.is_empty() {
            return out;
        }
        let mut stack = vec![Self::ROOT];
        while let Some(idx) = stack.pop() {
            out.push(idx);
            stack.extend(self.nodes[idx].children.iter().rev().copied());
        }
        out
    }

    /// Children before parents.
    pub fn post_order(&self) -> Vec<usize> {
        let mut out = self.pre_order();
        out.reverse();
        out
    }

    /// All indices of the subtree rooted at `idx`, `idx` first.
    pub fn subtree(&self, idx: usize) -> Vec<usize> {
        let mut out = Vec::new();
        let mut stack = vec![idx];
        while let Some(i) = stack.pop() {
            out.push(i);
            stack.extend(self.nodes[i].children.iter().rev().copied());
        }
        out
    }

    /// Converts the canonical graph into a tree.
    ///
    /// Flat graphs pick a root and keep the first parent that reaches each node, visiting
    /// higher-probability children first; ghost nodes and ghost edges are left out.
    /// Bundles and nested trees are expanded from their root; a child that is already on
    /// the current root-to-node path becomes a leaf marked `cycle_detected`, and a node
    /// already expanded under another parent is not expanded again.
    pub fn build(graph: &CanonicalGraph) -> Result<Self> {
        if graph.is_empty() {
            return Err(Error::EmptyGraph);
        }
        let tree = match graph.shape {
            InputShape::Flat => first_parent_tree(graph, select_root(graph)),
            InputShape::Bundle | InputShape::Tree => {
                let root = graph
                    .root
                    .as_deref()
                    .and_then(|id| graph.node_index(id))
                    .unwrap_or_else(|| {
                        tracing::warn!(root = ?graph.root, "root not found, choosing one");
                        select_root(graph)
                    });
                expanded_tree(graph, root)
            }
        };
        tracing::debug!(nodes = tree.len(), "built token tree");
        Ok(tree)
    }
}

/// `anchor_root_id`, else the first `is_root` node, else the first non-ghost node without
/// empirical parents, else the first node.
pub fn select_root(graph: &CanonicalGraph) -> usize {
    if let Some(idx) = graph
        .anchor_root_id
        .as_deref()
        .and_then(|id| graph.node_index(id))
    {
        return idx;
    }
    let nodes = graph.nodes();
    if let Some(idx) = nodes.iter().position(|n| n.is_root) {
        return idx;
    }

    let mut indegree = vec![0usize; nodes.len()];
    for edge in graph.edges() {
        if edge.kind == EdgeKind::Ghost {
            continue;
        }
        if let Some(t) = graph.node_index(&edge.target) {
            if !nodes[t].is_ghost {
                indegree[t] += 1;
            }
        }
    }
    nodes
        .iter()
        .enumerate()
        .position(|(i, n)| indegree[i] == 0 && !n.is_ghost)
        .unwrap_or(0)
}

fn derive_identity(node: &mut Node, parent: Option<&Node>) {
    if node.path.is_none() {
        let mut path = parent
            .and_then(|p| p.path.clone())
            .unwrap_or_default();
        if parent.is_some() || !node.token.is_empty() {
            path.push(node.token.clone());
        }
        node.path = Some(path);
    }
    if node.position.is_none() {
        node.position = Some(match parent.and_then(|p| p.path.as_ref()) {
            Some(parent_path) => parent_path.len() as i64,
            None => 0,
        });
    }
}

/// Empirical children of a flat-graph node, most probable first (stable).
fn ranked_children(graph: &CanonicalGraph, idx: usize) -> Vec<usize> {
    let parent = &graph.nodes()[idx];
    let mut scored: Vec<(f64, usize)> = graph
        .outgoing(idx)
        .iter()
        .filter_map(|&e| {
            let edge = &graph.edges()[e];
            if edge.kind == EdgeKind::Ghost {
                return None;
            }
            let target = graph.node_index(&edge.target)?;
            let child = &graph.nodes()[target];
            if child.is_ghost {
                return None;
            }
            let score = edge.probability.unwrap_or_else(|| {
                parent.emp_children.get(&child.token).copied().unwrap_or(0.0)
            });
            Some((score, target))
        })
        .collect();
    scored.sort_by(|a, b| b.0.total_cmp(&a.0));
    scored.into_iter().map(|(_, t)| t).collect()
}

fn first_parent_tree(graph: &CanonicalGraph, root: usize) -> TokenTree {
    let nodes = graph.nodes();
    let mut visited = vec![false; nodes.len()];

    let mut root_node = nodes[root].clone();
    derive_identity(&mut root_node, None);
    let mut tree = TokenTree::with_root(root_node);
    visited[root] = true;

    // (graph index, tree index, ranked children, cursor)
    let mut stack: Vec<(usize, usize, Vec<usize>, usize)> =
        vec![(root, TokenTree::ROOT, ranked_children(graph, root), 0)];
    while let Some(frame) = stack.last_mut() {
        let (_, tree_idx, ref kids, cursor) = *frame;
        if cursor >= kids.len() {
            stack.pop();
            continue;
        }
        let child = kids[cursor];
        frame.3 += 1;
        if visited[child] {
            tracing::debug!(
                from = %tree.node(tree_idx).id,
                to = %nodes[child].id,
                "dropping edge to an already placed node"
            );
            continue;
        }
        visited[child] = true;

        let mut node = nodes[child].clone();
        derive_identity(&mut node, Some(tree.node(tree_idx)));
        let child_tree_idx = tree.add_child(tree_idx, node);
        stack.push((child, child_tree_idx, ranked_children(graph, child), 0));
    }
    tree
}

fn expanded_tree(graph: &CanonicalGraph, root: usize) -> TokenTree {
    let nodes = graph.nodes();
    let mut on_path = vec![false; nodes.len()];
    let mut expanded = vec![false; nodes.len()];

    let mut root_node = nodes[root].clone();
    derive_identity(&mut root_node, None);
    let mut tree = TokenTree::with_root(root_node);
    on_path[root] = true;
    expanded[root] = true;

    // (graph index, tree index, cursor over outgoing edges)
    let mut stack: Vec<(usize, usize, usize)> = vec![(root, TokenTree::ROOT, 0)];
    while let Some(frame) = stack.last_mut() {
        let (idx, tree_idx, cursor) = *frame;
        let out = graph.outgoing(idx);
        if cursor >= out.len() {
            on_path[idx] = false;
            stack.pop();
            continue;
        }
        frame.2 += 1;

        let edge = &graph.edges()[out[cursor]];
        let Some(child) = graph.node_index(&edge.target) else {
            continue;
        };

        if on_path[child] {
            tracing::debug!(id = %nodes[child].id, "cycle detected, emitting leaf");
            let parent = tree.node(tree_idx);
            let mut leaf = nodes[child].clone();
            let mut path = parent.path.clone().unwrap_or_default();
            path.push(leaf.token.clone());
            leaf.path = Some(path);
            leaf.position = Some(parent.path.as_ref().map_or(0, Vec::len) as i64);
            leaf.cycle_detected = true;
            leaf.predicted.clear();
            leaf.model_children.clear();
            tree.add_child(tree_idx, leaf);
            continue;
        }
        if expanded[child] {
            tracing::debug!(id = %nodes[child].id, "node already expanded under another parent");
            continue;
        }
        expanded[child] = true;
        on_path[child] = true;

        let mut node = nodes[child].clone();
        derive_identity(&mut node, Some(tree.node(tree_idx)));
        let child_tree_idx = tree.add_child(tree_idx, node);
        stack.push((child, child_tree_idx, 0));
    }
    tree
}
