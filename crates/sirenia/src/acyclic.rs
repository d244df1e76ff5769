//! Cycle breaking by depth-first search.
//!
//! Every edge that points back to a node still on the DFS stack is reversed. Roots are
//! visited in node insertion order, out-edges in edge insertion order, so the reversed set
//! is deterministic: in `a -> b -> c -> a` only `c -> a` flips.

use crate::layered::LayerGraph;

pub fn run(lg: &mut LayerGraph) {
    let back_edges = find_back_edges(lg);
    for idx in back_edges {
        let e = &mut lg.edges[idx];
        std::mem::swap(&mut e.v, &mut e.w);
        if let Some(route) = lg.routes[e.origin].as_mut() {
            std::mem::swap(&mut route.v, &mut route.w);
            route.reversed = !route.reversed;
        }
    }
}

pub fn find_back_edges(lg: &LayerGraph) -> Vec<usize> {
    let (out_edges, _) = lg.adjacency();
    let n = lg.nodes.len();
    let mut visited = vec![false; n];
    let mut on_stack = vec![false; n];
    let mut back: Vec<usize> = Vec::new();

    for root in 0..n {
        if visited[root] {
            continue;
        }
        // (node, next out-edge cursor)
        let mut stack: Vec<(usize, usize)> = vec![(root, 0)];
        visited[root] = true;
        on_stack[root] = true;

        while let Some(top) = stack.last_mut() {
            let (v, cursor) = *top;
            if cursor >= out_edges[v].len() {
                on_stack[v] = false;
                stack.pop();
                continue;
            }
            top.1 += 1;

            let edge_idx = out_edges[v][cursor];
            let w = lg.edges[edge_idx].w;
            if on_stack[w] {
                back.push(edge_idx);
            } else if !visited[w] {
                visited[w] = true;
                on_stack[w] = true;
                stack.push((w, 0));
            }
        }
    }

    back
}
