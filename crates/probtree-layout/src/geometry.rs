//! Placement output shared by every strategy.
//!
//! `x` runs across the flow (drawn vertically) and is the box center; `y` runs along the
//! flow (drawn horizontally) and is the box's leading edge. A link leaves its source at
//! `(y + w, x)` and enters its target at `(y, x)`.

use probtree_core::Node;
use rustc_hash::FxHashMap;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlacedNode {
    pub x: f64,
    pub y: f64,
    pub w: f64,
    pub h: f64,
    pub depth: usize,
    pub key: String,
    #[serde(rename = "sourceNode")]
    pub node: Node,
}

impl PlacedNode {
    pub fn top(&self) -> f64 {
        self.x - self.h / 2.0
    }

    pub fn bottom(&self) -> f64 {
        self.x + self.h / 2.0
    }

    pub fn exit(&self) -> (f64, f64) {
        (self.y + self.w, self.x)
    }

    pub fn entry(&self) -> (f64, f64) {
        (self.y, self.x)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlacedLink {
    pub sx: f64,
    pub sy: f64,
    pub tx: f64,
    pub ty: f64,
    pub probability: f64,
    pub is_ghost: bool,
    pub source_key: String,
    pub target_key: String,
}

impl PlacedLink {
    pub fn between(source: &PlacedNode, target: &PlacedNode, probability: f64) -> Self {
        let mut link = Self {
            sx: 0.0,
            sy: 0.0,
            tx: 0.0,
            ty: 0.0,
            probability,
            is_ghost: target.node.is_ghost,
            source_key: source.key.clone(),
            target_key: target.key.clone(),
        };
        link.attach(source, target);
        link
    }

    /// Recomputes the endpoints from the nodes' current positions.
    pub fn attach(&mut self, source: &PlacedNode, target: &PlacedNode) {
        (self.sx, self.sy) = source.exit();
        (self.tx, self.ty) = target.entry();
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BoundingBox {
    pub min_x: f64,
    pub max_x: f64,
    pub min_y: f64,
    pub max_y: f64,
    pub pad: f64,
    pub width: f64,
    pub height: f64,
}

impl BoundingBox {
    pub const PAD: f64 = 40.0;

    /// Returned when there is nothing to place or the layout failed.
    pub fn empty() -> Self {
        Self {
            min_x: 0.0,
            max_x: 0.0,
            min_y: 0.0,
            max_y: 0.0,
            pad: Self::PAD,
            width: 400.0,
            height: 300.0,
        }
    }

    /// Extent of all boxes plus [`Self::PAD`] on every side. Without nodes the cross axis
    /// defaults to `[-50, 50]` and the flow axis to `[0, 0]`.
    pub fn of(nodes: &[PlacedNode]) -> Self {
        if nodes.is_empty() {
            return Self::around(-50.0, 50.0, 0.0, 0.0);
        }
        let mut min_x = f64::INFINITY;
        let mut max_x = f64::NEG_INFINITY;
        let mut min_y = f64::INFINITY;
        let mut max_y = f64::NEG_INFINITY;
        for n in nodes {
            min_x = min_x.min(n.top());
            max_x = max_x.max(n.bottom());
            min_y = min_y.min(n.y);
            max_y = max_y.max(n.y + n.w);
        }
        Self::around(min_x, max_x, min_y, max_y)
    }

    fn around(min_x: f64, max_x: f64, min_y: f64, max_y: f64) -> Self {
        let pad = Self::PAD;
        Self {
            min_x,
            max_x,
            min_y,
            max_y,
            pad,
            width: (max_y - min_y) + 2.0 * pad,
            height: (max_x - min_x) + 2.0 * pad,
        }
    }
}

/// Placed nodes and links of one layout run.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Placement {
    #[serde(rename = "placedNodes")]
    pub nodes: Vec<PlacedNode>,
    #[serde(rename = "placedLinks")]
    pub links: Vec<PlacedLink>,
}

impl Placement {
    pub fn key_index(&self) -> FxHashMap<&str, usize> {
        self.nodes
            .iter()
            .enumerate()
            .map(|(i, n)| (n.key.as_str(), i))
            .collect()
    }

    /// Re-resolves every link's endpoints through its node keys. Links whose keys no longer
    /// resolve keep their previous endpoints.
    pub fn relink(&mut self) {
        let Self { nodes, links } = self;
        let by_key: FxHashMap<&str, usize> = nodes
            .iter()
            .enumerate()
            .map(|(i, n)| (n.key.as_str(), i))
            .collect();
        for link in links.iter_mut() {
            if let (Some(&s), Some(&t)) = (
                by_key.get(link.source_key.as_str()),
                by_key.get(link.target_key.as_str()),
            ) {
                link.attach(&nodes[s], &nodes[t]);
            }
        }
    }

    pub fn bounding_box(&self) -> BoundingBox {
        BoundingBox::of(&self.nodes)
    }

    /// Makes keys unique by suffixing repeats with `#<id>`.
    pub(crate) fn dedupe_keys(nodes: &mut [PlacedNode]) {
        let mut seen: FxHashMap<String, usize> = FxHashMap::default();
        for n in nodes.iter_mut() {
            let count = seen.entry(n.key.clone()).or_insert(0);
            *count += 1;
            if *count > 1 {
                tracing::warn!(key = %n.key, id = %n.node.id, "duplicate placement key");
                n.key = format!("{}#{}", n.key, n.node.id);
            }
        }
    }
}
