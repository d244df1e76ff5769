#![forbid(unsafe_code)]

//! Layered (Sugiyama-style) graph layout.
//!
//! The pipeline follows the classic phases: break cycles, assign ranks, split long edges
//! into dummy chains, reduce crossings with barycenter sweeps, then assign coordinates.
//! Rank flow direction is configurable through [`RankDir`]; `LR` lays ranks out from left
//! to right.

pub mod acyclic;
pub mod coordinate_system;
pub mod error;
pub mod graph;
pub mod layered;
pub mod normalize;
pub mod order;
pub mod position;
pub mod rank;

pub use error::{Error, Result};
pub use graph::{EdgeKey, Graph};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RankDir {
    #[default]
    TB,
    BT,
    LR,
    RL,
}

#[derive(Debug, Clone)]
pub struct GraphLabel {
    pub rankdir: RankDir,
    pub nodesep: f64,
    pub ranksep: f64,
    pub edgesep: f64,
    pub marginx: f64,
    pub marginy: f64,
}

impl Default for GraphLabel {
    fn default() -> Self {
        Self {
            rankdir: RankDir::TB,
            nodesep: 50.0,
            ranksep: 50.0,
            edgesep: 10.0,
            marginx: 0.0,
            marginy: 0.0,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct NodeLabel {
    pub width: f64,
    pub height: f64,
    pub x: Option<f64>,
    pub y: Option<f64>,
    pub rank: Option<i32>,
    pub order: Option<usize>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EdgeLabel {
    pub minlen: usize,
    pub weight: f64,
    pub reversed: bool,
    pub points: Vec<Point>,
}

impl Default for EdgeLabel {
    fn default() -> Self {
        Self {
            minlen: 1,
            weight: 1.0,
            reversed: false,
            points: Vec::new(),
        }
    }
}

pub type LayoutGraph = Graph<NodeLabel, EdgeLabel, GraphLabel>;

fn validate(g: &LayoutGraph) -> Result<()> {
    let label = g.graph();
    for (name, value) in [
        ("nodesep", label.nodesep),
        ("ranksep", label.ranksep),
        ("edgesep", label.edgesep),
        ("marginx", label.marginx),
        ("marginy", label.marginy),
    ] {
        if !(value.is_finite() && value >= 0.0) {
            return Err(Error::InvalidSeparation { name, value });
        }
    }
    for idx in 0..g.node_count() {
        let (id, n) = g.node_at(idx);
        if !(n.width.is_finite() && n.width >= 0.0 && n.height.is_finite() && n.height >= 0.0) {
            return Err(Error::NonFiniteSize { id: id.to_string() });
        }
    }
    for idx in 0..g.edge_count() {
        let (key, e) = g.edge_at(idx);
        if !(e.weight.is_finite() && e.weight >= 0.0) {
            return Err(Error::InvalidWeight {
                v: key.v.clone(),
                w: key.w.clone(),
            });
        }
    }
    Ok(())
}

fn translate(g: &mut LayoutGraph) {
    let mut min_x = f64::INFINITY;
    let mut min_y = f64::INFINITY;
    for idx in 0..g.node_count() {
        let (_, n) = g.node_at(idx);
        if let (Some(x), Some(y)) = (n.x, n.y) {
            min_x = min_x.min(x - n.width / 2.0);
            min_y = min_y.min(y - n.height / 2.0);
        }
    }
    if !(min_x.is_finite() && min_y.is_finite()) {
        return;
    }
    let dx = g.graph().marginx - min_x;
    let dy = g.graph().marginy - min_y;
    g.for_each_node_mut(|_, n| {
        n.x = n.x.map(|x| x + dx);
        n.y = n.y.map(|y| y + dy);
    });
    g.for_each_edge_mut(|_, e| {
        for p in &mut e.points {
            p.x += dx;
            p.y += dy;
        }
    });
}

/// Runs the full layered layout, writing `x`/`y` (node centers), `rank`, `order` and edge
/// `points` back into `g`.
pub fn layout(g: &mut LayoutGraph) -> Result<()> {
    validate(g)?;
    if g.node_count() == 0 {
        return Ok(());
    }

    coordinate_system::adjust(g);

    let mut lg = layered::LayerGraph::from_graph(g);
    acyclic::run(&mut lg);
    rank::run(&mut lg);
    normalize::run(&mut lg);
    order::run(&mut lg);
    position::run(&mut lg, g.graph());
    lg.write_back(g);

    coordinate_system::undo(g);
    translate(g);
    Ok(())
}
