//! Directed multigraph container used as the layout input/output.
//!
//! Nodes and edges keep insertion order; every traversal in the layout pipeline is
//! deterministic because of that. The phases address entries by insertion index; callers
//! address them by id.

use rustc_hash::FxHashMap;

/// Identifies an edge: endpoints plus an optional name, so parallel edges can coexist.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EdgeKey {
    pub v: String,
    pub w: String,
    pub name: Option<String>,
}

impl EdgeKey {
    fn lookup(v: &str, w: &str, name: Option<&str>) -> Self {
        Self {
            v: v.to_string(),
            w: w.to_string(),
            name: name.map(str::to_string),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Graph<N, E, G>
where
    N: Default,
    E: Default,
    G: Default,
{
    label: G,
    node_ids: Vec<String>,
    node_labels: Vec<N>,
    by_id: FxHashMap<String, usize>,
    edge_keys: Vec<EdgeKey>,
    edge_labels: Vec<E>,
    by_key: FxHashMap<EdgeKey, usize>,
}

impl<N, E, G> Default for Graph<N, E, G>
where
    N: Default,
    E: Default,
    G: Default,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<N, E, G> Graph<N, E, G>
where
    N: Default,
    E: Default,
    G: Default,
{
    pub fn new() -> Self {
        Self {
            label: G::default(),
            node_ids: Vec::new(),
            node_labels: Vec::new(),
            by_id: FxHashMap::default(),
            edge_keys: Vec::new(),
            edge_labels: Vec::new(),
            by_key: FxHashMap::default(),
        }
    }

    pub fn set_graph(&mut self, label: G) -> &mut Self {
        self.label = label;
        self
    }

    pub fn graph(&self) -> &G {
        &self.label
    }

    pub fn graph_mut(&mut self) -> &mut G {
        &mut self.label
    }

    /// Inserts a node, replacing the label when the id already exists.
    pub fn set_node(&mut self, id: impl Into<String>, label: N) -> &mut Self {
        let id = id.into();
        match self.by_id.get(&id) {
            Some(&idx) => self.node_labels[idx] = label,
            None => {
                self.by_id.insert(id.clone(), self.node_ids.len());
                self.node_ids.push(id);
                self.node_labels.push(label);
            }
        }
        self
    }

    /// Inserts a default-labelled node unless `id` is already present.
    pub fn ensure_node(&mut self, id: impl Into<String>) -> &mut Self {
        let id = id.into();
        if !self.by_id.contains_key(&id) {
            self.set_node(id, N::default());
        }
        self
    }

    pub fn node(&self, id: &str) -> Option<&N> {
        self.by_id.get(id).map(|&idx| &self.node_labels[idx])
    }

    pub fn node_mut(&mut self, id: &str) -> Option<&mut N> {
        let idx = *self.by_id.get(id)?;
        Some(&mut self.node_labels[idx])
    }

    pub fn node_count(&self) -> usize {
        self.node_ids.len()
    }

    pub fn node_ids(&self) -> Vec<String> {
        self.node_ids.clone()
    }

    pub fn edge_count(&self) -> usize {
        self.edge_keys.len()
    }

    pub fn set_edge_with_label(
        &mut self,
        v: impl Into<String>,
        w: impl Into<String>,
        label: E,
    ) -> &mut Self {
        self.insert_edge(v.into(), w.into(), None, label)
    }

    pub fn set_edge_named(
        &mut self,
        v: impl Into<String>,
        w: impl Into<String>,
        name: impl Into<String>,
        label: E,
    ) -> &mut Self {
        self.insert_edge(v.into(), w.into(), Some(name.into()), label)
    }

    /// Missing endpoints are created with default labels; an existing key keeps its slot
    /// and takes the new label.
    fn insert_edge(&mut self, v: String, w: String, name: Option<String>, label: E) -> &mut Self {
        self.ensure_node(v.as_str());
        self.ensure_node(w.as_str());
        let key = EdgeKey { v, w, name };
        match self.by_key.get(&key) {
            Some(&idx) => self.edge_labels[idx] = label,
            None => {
                self.by_key.insert(key.clone(), self.edge_keys.len());
                self.edge_keys.push(key);
                self.edge_labels.push(label);
            }
        }
        self
    }

    pub fn edge(&self, v: &str, w: &str, name: Option<&str>) -> Option<&E> {
        let idx = *self.by_key.get(&EdgeKey::lookup(v, w, name))?;
        Some(&self.edge_labels[idx])
    }

    pub fn edge_mut(&mut self, v: &str, w: &str, name: Option<&str>) -> Option<&mut E> {
        let idx = *self.by_key.get(&EdgeKey::lookup(v, w, name))?;
        Some(&mut self.edge_labels[idx])
    }

    pub(crate) fn node_position(&self, id: &str) -> Option<usize> {
        self.by_id.get(id).copied()
    }

    pub(crate) fn node_at(&self, idx: usize) -> (&str, &N) {
        (self.node_ids[idx].as_str(), &self.node_labels[idx])
    }

    pub(crate) fn node_at_mut(&mut self, idx: usize) -> &mut N {
        &mut self.node_labels[idx]
    }

    pub(crate) fn edge_at(&self, idx: usize) -> (&EdgeKey, &E) {
        (&self.edge_keys[idx], &self.edge_labels[idx])
    }

    pub(crate) fn edge_at_mut(&mut self, idx: usize) -> &mut E {
        &mut self.edge_labels[idx]
    }

    pub fn for_each_node_mut<F>(&mut self, mut f: F)
    where
        F: FnMut(&str, &mut N),
    {
        for (id, label) in self.node_ids.iter().zip(&mut self.node_labels) {
            f(id.as_str(), label);
        }
    }

    pub fn for_each_edge_mut<F>(&mut self, mut f: F)
    where
        F: FnMut(&EdgeKey, &mut E),
    {
        for (key, label) in self.edge_keys.iter().zip(&mut self.edge_labels) {
            f(key, label);
        }
    }
}
