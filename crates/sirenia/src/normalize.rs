//! Splits edges that span more than one rank into chains of zero-size dummy nodes, so
//! that every edge of the layered graph connects adjacent ranks.

use crate::layered::{LayerEdge, LayerGraph};

pub fn run(lg: &mut LayerGraph) {
    let edge_count = lg.edges.len();
    for idx in 0..edge_count {
        let LayerEdge {
            v,
            w,
            weight,
            origin,
            ..
        } = lg.edges[idx].clone();
        let v_rank = lg.nodes[v].rank;
        let w_rank = lg.nodes[w].rank;
        if w_rank - v_rank <= 1 {
            continue;
        }

        let mut prev = v;
        let mut dummies = Vec::with_capacity((w_rank - v_rank - 1) as usize);
        for rank in (v_rank + 1)..w_rank {
            let d = lg.add_dummy(rank);
            dummies.push(d);
            if prev == v {
                lg.edges[idx].w = d;
                lg.edges[idx].minlen = 1;
            } else {
                lg.edges.push(LayerEdge {
                    v: prev,
                    w: d,
                    weight,
                    minlen: 1,
                    origin,
                });
            }
            prev = d;
        }
        lg.edges.push(LayerEdge {
            v: prev,
            w,
            weight,
            minlen: 1,
            origin,
        });

        if let Some(route) = lg.routes[origin].as_mut() {
            route.dummies = dummies;
        }
    }
}
