//! Rank-based placement for graphs that are not trees.
//!
//! Ranking, crossing reduction and coordinates come from a [`LayeredPrimitive`] running with
//! left-to-right rank flow. The primitive's flow axis becomes `y` and its cross axis becomes
//! `x`. Fan nodes (prefix and root nodes) stay where the primitive put them; if a fan-to-anchor
//! edge is too steep, every anchor node moves forward by the largest deficit.

use crate::constraint::{AngleConstraint, RepairGroup, repair};
use crate::geometry::{PlacedLink, PlacedNode, Placement};
use crate::sizing::NodeSizer;
use crate::{Error, Layout, Result};
use probtree_core::{CanonicalGraph, EdgeKind, Settings};
use sirenia::{EdgeLabel, GraphLabel, LayoutGraph, NodeLabel, RankDir};

pub const EDGE_SEP: f64 = 10.0;
pub const MARGIN: f64 = 20.0;

/// External layered-graph layout step.
///
/// Implementations write node centers (`x`, `y`) into the graph's node labels.
pub trait LayeredPrimitive {
    fn layout(&self, graph: &mut LayoutGraph) -> Result<()>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SireniaPrimitive;

impl LayeredPrimitive for SireniaPrimitive {
    fn layout(&self, graph: &mut LayoutGraph) -> Result<()> {
        sirenia::layout(graph)?;
        Ok(())
    }
}

pub fn graph_label(settings: &Settings) -> GraphLabel {
    GraphLabel {
        rankdir: RankDir::LR,
        ranksep: settings.rank_sep,
        nodesep: settings.node_sep,
        edgesep: EDGE_SEP,
        marginx: MARGIN,
        marginy: MARGIN,
    }
}

/// Places `graph` and reports failures as an empty layout.
///
/// A missing or failing primitive is logged and yields an empty bounding box; no other
/// strategy is substituted.
pub fn layout_ranked(
    graph: &CanonicalGraph,
    sizer: &dyn NodeSizer,
    settings: &Settings,
    primitive: Option<&dyn LayeredPrimitive>,
) -> Layout {
    if graph.is_empty() {
        tracing::warn!("graph has no nodes, nothing to rank");
        return Layout::empty();
    }
    match try_layout_ranked(graph, sizer, settings, primitive) {
        Ok(placement) => Layout::from_placement(placement),
        Err(err) => {
            tracing::error!(error = %err, "rank-based layout failed");
            Layout::empty()
        }
    }
}

pub fn try_layout_ranked(
    graph: &CanonicalGraph,
    sizer: &dyn NodeSizer,
    settings: &Settings,
    primitive: Option<&dyn LayeredPrimitive>,
) -> Result<Placement> {
    let primitive = primitive.ok_or(Error::PrimitiveUnavailable)?;
    if graph.is_empty() {
        return Err(Error::NoData);
    }

    let sizes: Vec<_> = graph
        .nodes()
        .iter()
        .map(|n| sizer.size(n).clamped())
        .collect();

    let mut g = LayoutGraph::new();
    g.set_graph(graph_label(settings));
    for (node, size) in graph.nodes().iter().zip(&sizes) {
        g.set_node(
            node.id.clone(),
            NodeLabel {
                width: size.w,
                height: size.h,
                ..Default::default()
            },
        );
    }
    for (i, edge) in graph.edges().iter().enumerate() {
        g.set_edge_named(
            edge.source.clone(),
            edge.target.clone(),
            i.to_string(),
            EdgeLabel {
                weight: edge.weight,
                ..Default::default()
            },
        );
    }

    primitive.layout(&mut g)?;

    let mut nodes = Vec::with_capacity(sizes.len());
    for (node, size) in graph.nodes().iter().zip(&sizes) {
        let label = g.node(&node.id);
        let (cx, cy) = label
            .and_then(|l| Some((l.x?, l.y?)))
            .unwrap_or((size.w / 2.0, size.h / 2.0));
        let depth = node.rank_depth();
        nodes.push(PlacedNode {
            x: cy,
            y: cx - size.w / 2.0,
            w: size.w,
            h: size.h,
            depth,
            key: if node.is_ghost {
                node.id.clone()
            } else {
                node.key(depth)
            },
            node: node.clone(),
        });
    }
    normalize_origin(&mut nodes);
    Placement::dedupe_keys(&mut nodes);

    let mut links = Vec::with_capacity(graph.edges().len());
    let mut endpoints = Vec::with_capacity(graph.edges().len());
    for (i, edge) in graph.edges().iter().enumerate() {
        let (Some(s), Some(t)) = (graph.node_index(&edge.source), graph.node_index(&edge.target))
        else {
            continue;
        };
        let mut link = PlacedLink::between(&nodes[s], &nodes[t], graph.edge_probability(i));
        link.is_ghost = edge.kind == EdgeKind::Ghost || nodes[t].node.is_ghost;
        links.push(link);
        endpoints.push((s, t));
    }

    let mut placement = Placement { nodes, links };
    if let Some(c) = AngleConstraint::from_degrees(settings.ang_max_deg) {
        space_fan_anchor(&mut placement, &endpoints, c);
    }
    tracing::debug!(
        nodes = placement.nodes.len(),
        links = placement.links.len(),
        "rank-based layout"
    );
    Ok(placement)
}

/// Moves the layout so the smallest cross-axis center and the smallest leading edge are 0.
fn normalize_origin(nodes: &mut [PlacedNode]) {
    let min_x = nodes.iter().map(|n| n.x).fold(f64::INFINITY, f64::min);
    let min_y = nodes.iter().map(|n| n.y).fold(f64::INFINITY, f64::min);
    if !(min_x.is_finite() && min_y.is_finite()) {
        return;
    }
    for n in nodes {
        n.x -= min_x;
        n.y -= min_y;
    }
}

/// Fan nodes are fixed; anchors move forward together by the largest fan-to-anchor deficit.
fn space_fan_anchor(
    placement: &mut Placement,
    endpoints: &[(usize, usize)],
    constraint: AngleConstraint,
) {
    let is_fan: Vec<bool> = placement.nodes.iter().map(|n| n.node.is_fan()).collect();
    let edges: Vec<(usize, usize)> = endpoints
        .iter()
        .copied()
        .filter(|&(s, t)| is_fan[s] && !is_fan[t])
        .collect();
    if edges.is_empty() {
        return;
    }
    let anchors: Vec<usize> = (0..is_fan.len()).filter(|&i| !is_fan[i]).collect();
    let stats = repair(
        &mut placement.nodes,
        constraint,
        [RepairGroup { edges, moving: () }],
        |_, buf| buf.extend_from_slice(&anchors),
    );
    if stats.shifts > 0 {
        tracing::debug!(shift = stats.total, "moved anchor nodes clear of the fan");
        placement.relink();
    }
}
