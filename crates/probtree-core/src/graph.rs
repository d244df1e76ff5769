//! Canonical node/edge representation shared by every layout strategy.

use crate::input::{GraphInput, InputShape};
use crate::model::{Edge, EdgeKind, Node};
use crate::wire::{RawBundle, RawFlatGraph, RawNode, Scalar, id_of_ref};
use rustc_hash::FxHashMap;
use serde_json::Value;

#[derive(Debug, Clone)]
pub struct CanonicalGraph {
    pub shape: InputShape,
    nodes: Vec<Node>,
    edges: Vec<Edge>,
    index: FxHashMap<String, usize>,
    outgoing: Vec<Vec<usize>>,
    /// Explicit root of bundles and nested trees.
    pub root: Option<String>,
    pub anchor_root_id: Option<String>,
}

impl CanonicalGraph {
    /// Builds the graph, keeping the first node of each id and dropping edges whose
    /// endpoints do not exist.
    pub fn new(shape: InputShape, nodes: Vec<Node>, edges: Vec<Edge>) -> Self {
        let mut g = Self {
            shape,
            nodes: Vec::with_capacity(nodes.len()),
            edges: Vec::with_capacity(edges.len()),
            index: FxHashMap::default(),
            outgoing: Vec::new(),
            root: None,
            anchor_root_id: None,
        };
        for node in nodes {
            g.push_node(node);
        }
        for edge in edges {
            g.push_edge(edge);
        }
        g
    }

    pub fn with_root(mut self, root: Option<String>) -> Self {
        self.root = root;
        self
    }

    pub fn with_anchor_root(mut self, anchor: Option<String>) -> Self {
        self.anchor_root_id = anchor;
        self
    }

    /// Returns the node index, or `None` when the id is already taken.
    pub fn push_node(&mut self, node: Node) -> Option<usize> {
        if self.index.contains_key(&node.id) {
            tracing::warn!(id = %node.id, "duplicate node id, keeping the first occurrence");
            return None;
        }
        let idx = self.nodes.len();
        self.index.insert(node.id.clone(), idx);
        self.nodes.push(node);
        self.outgoing.push(Vec::new());
        Some(idx)
    }

    /// Returns `false` (and drops the edge) when an endpoint is unknown.
    pub fn push_edge(&mut self, edge: Edge) -> bool {
        let (Some(&v), Some(_)) = (self.index.get(&edge.source), self.index.get(&edge.target))
        else {
            tracing::debug!(
                source = %edge.source,
                target = %edge.target,
                "dropping edge with a missing endpoint"
            );
            return false;
        };
        self.outgoing[v].push(self.edges.len());
        self.edges.push(edge);
        true
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    pub fn node(&self, id: &str) -> Option<&Node> {
        self.index.get(id).map(|&idx| &self.nodes[idx])
    }

    pub fn node_index(&self, id: &str) -> Option<usize> {
        self.index.get(id).copied()
    }

    /// Outgoing edge indices of a node, in insertion order.
    pub fn outgoing(&self, node_idx: usize) -> &[usize] {
        &self.outgoing[node_idx]
    }

    /// Probability carried by an edge: the explicit value, else the ghost target's model
    /// probability, else the target token's share of the source's observed children.
    pub fn edge_probability(&self, edge_idx: usize) -> f64 {
        let edge = &self.edges[edge_idx];
        if let Some(p) = edge.probability {
            return p;
        }
        let (Some(src), Some(dst)) = (self.node(&edge.source), self.node(&edge.target)) else {
            return 0.0;
        };
        if edge.kind == EdgeKind::Ghost || dst.is_ghost {
            return dst.model_probability().unwrap_or(0.0);
        }
        empirical_share(src, &dst.token)
    }
}

/// `count(token) / sum(counts)` over a node's observed children, 0 when nothing was observed.
pub fn empirical_share(parent: &Node, token: &str) -> f64 {
    let total: f64 = parent.emp_children.values().sum();
    if total > 0.0 {
        parent.emp_children.get(token).copied().unwrap_or(0.0) / total
    } else {
        0.0
    }
}

/// Converts any accepted input into the canonical graph.
pub fn normalize(input: &GraphInput) -> CanonicalGraph {
    let graph = match input {
        GraphInput::Flat(flat) => from_flat(flat),
        GraphInput::Bundle(bundle) => from_bundle(bundle),
        GraphInput::Tree(root) => from_tree(root),
    };
    tracing::debug!(
        shape = ?graph.shape,
        nodes = graph.nodes.len(),
        edges = graph.edges.len(),
        "normalized input graph"
    );
    graph
}

fn from_flat(flat: &RawFlatGraph) -> CanonicalGraph {
    let nodes = flat
        .nodes
        .iter()
        .enumerate()
        .map(|(i, raw)| {
            let id = raw
                .id
                .as_ref()
                .map_or_else(|| i.to_string(), Scalar::to_string);
            Node::from_raw(id, raw)
        })
        .collect();
    let edges = flat.edges.iter().filter_map(Edge::from_raw).collect();
    CanonicalGraph::new(InputShape::Flat, nodes, edges)
        .with_anchor_root(flat.anchor_root_id.as_ref().map(Scalar::to_string))
}

fn from_bundle(bundle: &RawBundle) -> CanonicalGraph {
    let nodes = bundle
        .nodes_by_id
        .iter()
        .map(|(id, raw)| Node::from_raw(id.clone(), raw))
        .collect();
    let mut edges = Vec::new();
    for (id, raw) in &bundle.nodes_by_id {
        for child in raw.children.iter().flatten() {
            if let Some(child_id) = id_of_ref(child) {
                edges.push(Edge::empirical(id.clone(), child_id));
            }
        }
    }
    CanonicalGraph::new(InputShape::Bundle, nodes, edges)
        .with_root(id_of_ref(&bundle.root))
        .with_anchor_root(bundle.anchor_root_id.as_ref().map(Scalar::to_string))
}

fn from_tree(root: &RawNode) -> CanonicalGraph {
    let mut graph = CanonicalGraph::new(InputShape::Tree, Vec::new(), Vec::new());
    let mut counter = 0usize;

    // (raw node, parent id)
    let mut stack: Vec<(RawNode, Option<String>)> = vec![(root.clone(), None)];
    let mut root_id = None;
    while let Some((mut raw, parent)) = stack.pop() {
        let mut id = raw
            .id
            .as_ref()
            .map_or_else(|| format!("t{counter}"), Scalar::to_string);
        counter += 1;
        if graph.node_index(&id).is_some() {
            id = format!("{id}#{counter}");
        }
        let children = raw.children.take().unwrap_or_default();
        graph.push_node(Node::from_raw(id.clone(), &raw));
        match parent {
            Some(parent) => {
                graph.push_edge(Edge::empirical(parent, id.clone()));
            }
            None => root_id = Some(id.clone()),
        }

        // Reverse so the first child is expanded first.
        for child in children.into_iter().rev().filter_map(child_node) {
            stack.push((child, Some(id.clone())));
        }
    }
    graph.with_root(root_id)
}

fn child_node(value: Value) -> Option<RawNode> {
    match value {
        Value::Object(_) => match serde_json::from_value(value) {
            Ok(node) => Some(node),
            Err(err) => {
                tracing::warn!(error = %err, "skipping malformed child node");
                None
            }
        },
        _ => None,
    }
}
