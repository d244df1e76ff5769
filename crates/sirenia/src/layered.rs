//! Index-based working graph shared by the layout phases.
//!
//! [`LayerGraph`] mirrors the input [`crate::LayoutGraph`] node-for-node (same indices),
//! then grows dummy nodes while long edges are split. Phases mutate it in place and
//! [`LayerGraph::write_back`] copies the result into the caller's graph.

use crate::{LayoutGraph, Point};

#[derive(Debug, Clone)]
pub struct LayerNode {
    /// Index of the input node, `None` for dummy nodes.
    pub source: Option<usize>,
    pub width: f64,
    pub height: f64,
    pub rank: i32,
    pub order: usize,
    pub x: f64,
    pub y: f64,
}

impl LayerNode {
    pub fn is_dummy(&self) -> bool {
        self.source.is_none()
    }
}

#[derive(Debug, Clone)]
pub struct LayerEdge {
    pub v: usize,
    pub w: usize,
    pub weight: f64,
    pub minlen: i32,
    /// Index of the input edge this segment belongs to.
    pub origin: usize,
}

/// Route of one input edge through the layered graph.
#[derive(Debug, Clone)]
pub struct Route {
    pub v: usize,
    pub w: usize,
    pub reversed: bool,
    pub dummies: Vec<usize>,
}

#[derive(Debug, Clone, Default)]
pub struct LayerGraph {
    pub nodes: Vec<LayerNode>,
    pub edges: Vec<LayerEdge>,
    /// Indexed by input edge; `None` for self-loops.
    pub routes: Vec<Option<Route>>,
}

impl LayerGraph {
    pub fn from_graph(g: &LayoutGraph) -> Self {
        let mut nodes = Vec::with_capacity(g.node_count());
        for idx in 0..g.node_count() {
            let (_, n) = g.node_at(idx);
            nodes.push(LayerNode {
                source: Some(idx),
                width: n.width,
                height: n.height,
                rank: 0,
                order: 0,
                x: 0.0,
                y: 0.0,
            });
        }

        let mut edges = Vec::with_capacity(g.edge_count());
        let mut routes = Vec::with_capacity(g.edge_count());
        for idx in 0..g.edge_count() {
            let (key, label) = g.edge_at(idx);
            let (Some(v), Some(w)) = (g.node_position(&key.v), g.node_position(&key.w)) else {
                routes.push(None);
                continue;
            };
            if v == w {
                routes.push(None);
                continue;
            }
            edges.push(LayerEdge {
                v,
                w,
                weight: label.weight,
                minlen: label.minlen.max(1) as i32,
                origin: idx,
            });
            routes.push(Some(Route {
                v,
                w,
                reversed: false,
                dummies: Vec::new(),
            }));
        }

        Self {
            nodes,
            edges,
            routes,
        }
    }

    /// Outgoing and incoming edge indices per node.
    pub fn adjacency(&self) -> (Vec<Vec<usize>>, Vec<Vec<usize>>) {
        let mut out_edges = vec![Vec::new(); self.nodes.len()];
        let mut in_edges = vec![Vec::new(); self.nodes.len()];
        for (idx, e) in self.edges.iter().enumerate() {
            out_edges[e.v].push(idx);
            in_edges[e.w].push(idx);
        }
        (out_edges, in_edges)
    }

    pub fn max_rank(&self) -> i32 {
        self.nodes.iter().map(|n| n.rank).max().unwrap_or(0)
    }

    /// Node indices grouped by rank, each layer sorted by `order`.
    pub fn layers(&self) -> Vec<Vec<usize>> {
        let mut layers: Vec<Vec<usize>> = vec![Vec::new(); self.max_rank().max(0) as usize + 1];
        for (idx, n) in self.nodes.iter().enumerate() {
            layers[n.rank.max(0) as usize].push(idx);
        }
        for layer in &mut layers {
            layer.sort_by_key(|&idx| self.nodes[idx].order);
        }
        layers
    }

    pub fn add_dummy(&mut self, rank: i32) -> usize {
        self.nodes.push(LayerNode {
            source: None,
            width: 0.0,
            height: 0.0,
            rank,
            order: 0,
            x: 0.0,
            y: 0.0,
        });
        self.nodes.len() - 1
    }

    fn center(&self, idx: usize) -> Point {
        let n = &self.nodes[idx];
        Point { x: n.x, y: n.y }
    }

    pub fn write_back(&self, g: &mut LayoutGraph) {
        for n in &self.nodes {
            let Some(src) = n.source else {
                continue;
            };
            let label = g.node_at_mut(src);
            label.x = Some(n.x);
            label.y = Some(n.y);
            label.rank = Some(n.rank);
            label.order = Some(n.order);
        }

        for (idx, route) in self.routes.iter().enumerate() {
            let points = match route {
                Some(route) => {
                    let mut pts = Vec::with_capacity(route.dummies.len() + 2);
                    pts.push(self.center(route.v));
                    pts.extend(route.dummies.iter().map(|&d| self.center(d)));
                    pts.push(self.center(route.w));
                    if route.reversed {
                        pts.reverse();
                    }
                    pts
                }
                None => {
                    let (key, _) = g.edge_at(idx);
                    match g.node_position(&key.v) {
                        Some(v) => vec![self.center(v)],
                        None => Vec::new(),
                    }
                }
            };
            let reversed = route.as_ref().is_some_and(|r| r.reversed);
            let label = g.edge_at_mut(idx);
            label.points = points;
            label.reversed = reversed;
        }
    }
}
