//! State of one interactive view: loaded graph, settings, the current layout, search
//! matches and the pending frame.
//!
//! Every layout run replaces the placement wholesale. Transform and scroll changes only
//! schedule a frame; [`LayoutSession::on_frame`] draws at most once per scheduled frame.

use crate::frame::FrameCoalescer;
use crate::geometry::{BoundingBox, PlacedLink, PlacedNode};
use crate::search::SearchMatches;
use crate::viewport::{Canvas, RenderStats, Scene, ScrollRect, Transform, View, render_visible};
use crate::{Error, Layout, LayoutOptions, Result, layout_graph};
use probtree_core::score::main_path;
use probtree_core::{CanonicalGraph, GraphInput, Settings, TokenTree, normalize};
use rustc_hash::FxHashMap;
use serde_json::Value;

pub struct LayoutSession {
    settings: Settings,
    options: LayoutOptions,
    graph: Option<CanonicalGraph>,
    layout: Layout,
    query: String,
    matches: SearchMatches,
    view: View,
    frames: FrameCoalescer<View>,
}

impl Default for LayoutSession {
    fn default() -> Self {
        Self::new(Settings::default())
    }
}

impl LayoutSession {
    pub fn new(settings: Settings) -> Self {
        Self::with_options(settings, LayoutOptions::default())
    }

    pub fn with_options(settings: Settings, options: LayoutOptions) -> Self {
        Self {
            settings,
            options,
            graph: None,
            layout: Layout::empty(),
            query: String::new(),
            matches: SearchMatches::default(),
            view: View::default(),
            frames: FrameCoalescer::new(),
        }
    }

    /// Replaces the loaded graph. The previous placement is dropped; call
    /// [`Self::layout`] to place the new one.
    pub fn load_graph(&mut self, graph: CanonicalGraph) {
        tracing::debug!(
            nodes = graph.nodes().len(),
            edges = graph.edges().len(),
            "loaded graph"
        );
        self.graph = Some(graph);
        self.layout = Layout::empty();
        self.matches = SearchMatches::default();
    }

    pub fn load_data(&mut self, input: &GraphInput) {
        self.load_graph(normalize(input));
    }

    pub fn load_str(&mut self, text: &str) -> Result<()> {
        let input = GraphInput::from_json_str(text)?;
        self.load_data(&input);
        Ok(())
    }

    pub fn graph(&self) -> Option<&CanonicalGraph> {
        self.graph.as_ref()
    }

    /// Places the loaded graph with the current settings.
    ///
    /// On failure the placement is cleared, never left half-applied.
    pub fn layout(&mut self) -> Result<BoundingBox> {
        let graph = self.graph.as_ref().ok_or(Error::NoData)?;
        match layout_graph(graph, &self.settings, &self.options) {
            Ok(layout) => self.layout = layout,
            Err(err) => {
                tracing::error!(error = %err, "layout failed");
                self.layout = Layout::empty();
                self.matches = SearchMatches::default();
                return Err(err);
            }
        }
        self.matches = SearchMatches::run(&self.layout.placement.nodes, &self.query);
        self.request_frame();
        Ok(self.layout.bounding_box)
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn set_settings(&mut self, settings: Settings) -> Result<()> {
        settings.validate()?;
        self.settings = settings;
        self.request_frame();
        Ok(())
    }

    /// Deep-merges a partial JSON object into the settings. Nothing changes on error.
    pub fn merge_settings(&mut self, partial: &Value) -> Result<()> {
        self.settings = self.settings.merged(partial)?;
        self.request_frame();
        Ok(())
    }

    pub fn current_layout(&self) -> &Layout {
        &self.layout
    }

    pub fn placed_nodes(&self) -> &[PlacedNode] {
        &self.layout.placement.nodes
    }

    pub fn placed_links(&self) -> &[PlacedLink] {
        &self.layout.placement.links
    }

    pub fn placed_node(&self, idx: usize) -> Option<&PlacedNode> {
        self.layout.placement.nodes.get(idx)
    }

    /// The first placed prompt or cluster root.
    pub fn prompt_node(&self) -> Option<&PlacedNode> {
        self.placed_nodes().iter().find(|n| n.node.is_prompt())
    }

    pub fn bounding_box(&self) -> BoundingBox {
        self.layout.bounding_box
    }

    /// Placement keys of the highlighted main path under `MAIN_METRIC`, root first. The
    /// path is chosen on the observed tree and resolved against the current placement by
    /// node id, so it is empty until a layout has run.
    pub fn main_path(&self) -> Vec<String> {
        let Some(graph) = self.graph.as_ref() else {
            return Vec::new();
        };
        let Ok(tree) = TokenTree::build(graph) else {
            return Vec::new();
        };

        let mut placed: FxHashMap<&str, &str> = FxHashMap::default();
        for n in self.placed_nodes() {
            placed.entry(n.node.id.as_str()).or_insert(n.key.as_str());
        }
        main_path(&tree, self.settings.main_metric)
            .into_iter()
            .map_while(|i| placed.get(tree.node(i).id.as_str()))
            .map(|key| key.to_string())
            .collect()
    }

    /// Runs a search over the placed tokens and returns the match count. An empty query
    /// clears the matches.
    pub fn search(&mut self, query: &str) -> usize {
        self.query = query.to_string();
        self.matches = SearchMatches::run(self.placed_nodes(), query);
        self.request_frame();
        self.matches.count()
    }

    pub fn search_matches(&self) -> &[usize] {
        self.matches.indices()
    }

    pub fn matches(&self) -> &SearchMatches {
        &self.matches
    }

    pub fn view(&self) -> &View {
        &self.view
    }

    /// Returns `true` when the change scheduled a new frame.
    pub fn set_transform(&mut self, transform: Transform) -> bool {
        self.view.transform = transform;
        self.request_frame()
    }

    pub fn set_scroll(&mut self, scroll: ScrollRect) -> bool {
        self.view.scroll = scroll;
        self.request_frame()
    }

    pub fn request_frame(&mut self) -> bool {
        self.frames.request(self.view)
    }

    pub fn frame_pending(&self) -> bool {
        self.frames.is_pending()
    }

    /// Display-refresh hook: draws the pending frame, if any.
    pub fn on_frame(&mut self, canvas: &mut dyn Canvas) -> Option<RenderStats> {
        let view = self.frames.take_frame()?;
        Some(self.render_view(&view, canvas))
    }

    /// Draws the current view immediately, bypassing the frame throttle.
    pub fn render_now(&self, canvas: &mut dyn Canvas) -> RenderStats {
        self.render_view(&self.view, canvas)
    }

    fn render_view(&self, view: &View, canvas: &mut dyn Canvas) -> RenderStats {
        let scene = Scene {
            placement: &self.layout.placement,
            matches: &self.matches,
            settings: &self.settings,
            measurer: self.options.text_measurer.as_ref(),
        };
        render_visible(&scene, view, canvas)
    }
}
