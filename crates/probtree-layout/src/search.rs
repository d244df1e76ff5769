use crate::geometry::PlacedNode;
use rustc_hash::FxHashSet;

/// Placed nodes whose token contains a query, case-insensitively.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchMatches {
    indices: Vec<usize>,
    keys: FxHashSet<String>,
}

impl SearchMatches {
    /// An empty or whitespace-only query matches nothing.
    pub fn run(nodes: &[PlacedNode], query: &str) -> Self {
        let q = query.trim().to_lowercase();
        let mut out = Self::default();
        if q.is_empty() {
            return out;
        }
        for (idx, n) in nodes.iter().enumerate() {
            if n.node.token.to_lowercase().contains(&q) {
                out.indices.push(idx);
                out.keys.insert(n.key.clone());
            }
        }
        out
    }

    pub fn count(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    pub fn indices(&self) -> &[usize] {
        &self.indices
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.keys.contains(key)
    }
}
