//! Edge-angle bound and the repair pass shared by all strategies.
//!
//! An edge leaves its source box at `(y + w, x)` and enters the target at `(y, x)`. Its angle
//! from the flow axis stays within the bound while the flow-axis run is at least
//! `|dx| / tan(max_angle)`. Repair only ever moves nodes forward along the flow axis.

use crate::geometry::PlacedNode;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AngleConstraint {
    tan: f64,
}

impl AngleConstraint {
    /// `None` when enforcement is off: a non-finite angle, or one outside `(0°, 90°)`.
    pub fn from_degrees(deg: f64) -> Option<Self> {
        if !deg.is_finite() || deg <= 0.0 || deg >= 90.0 {
            return None;
        }
        let tan = deg.to_radians().tan();
        (tan.is_finite() && tan > 0.0).then_some(Self { tan })
    }

    pub fn tan(&self) -> f64 {
        self.tan
    }

    /// Flow-axis run needed for a cross-axis displacement of `cross`.
    pub fn min_run(&self, cross: f64) -> f64 {
        cross.abs() / self.tan
    }

    /// How far the target must move forward for the edge to satisfy the bound.
    pub fn deficit(&self, source: &PlacedNode, target: &PlacedNode) -> f64 {
        let (sy, sx) = source.exit();
        let (ty, tx) = target.entry();
        (self.min_run(tx - sx) - (ty - sy)).max(0.0)
    }
}

/// Edges measured together and the side that moves when one of them is too steep.
#[derive(Debug, Clone)]
pub struct RepairGroup<S> {
    pub edges: Vec<(usize, usize)>,
    pub moving: S,
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RepairStats {
    pub shifts: usize,
    pub total: f64,
}

/// Walks `groups` in order. For each, the largest deficit over its edges is measured against
/// the current positions, and every node `movers` yields for the group's moving side is pushed
/// forward by exactly that amount.
pub fn repair<S>(
    nodes: &mut [PlacedNode],
    constraint: AngleConstraint,
    groups: impl IntoIterator<Item = RepairGroup<S>>,
    mut movers: impl FnMut(&S, &mut Vec<usize>),
) -> RepairStats {
    let mut stats = RepairStats::default();
    let mut buf = Vec::new();
    for group in groups {
        let deficit = group
            .edges
            .iter()
            .map(|&(s, t)| constraint.deficit(&nodes[s], &nodes[t]))
            .fold(0.0, f64::max);
        if deficit <= 0.0 {
            continue;
        }
        buf.clear();
        movers(&group.moving, &mut buf);
        for &i in &buf {
            nodes[i].y += deficit;
        }
        stats.shifts += 1;
        stats.total += deficit;
    }
    if stats.shifts > 0 {
        tracing::debug!(
            shifts = stats.shifts,
            total = stats.total,
            "applied edge-angle repairs"
        );
    }
    stats
}
