#![forbid(unsafe_code)]

//! Layout and virtualized rendering for token-probability graphs.
//!
//! Three strategies place a [`CanonicalGraph`]: [`branched`] (tidy tree), [`linear`]
//! (profile-packed main lines) and [`ranked`] (layered, for graphs with shared children).
//! All of them produce the same [`Placement`] shape, so [`viewport`] draws any of them.
//! [`session::LayoutSession`] owns the state of one interactive view.

pub mod branched;
pub mod color;
pub mod constraint;
pub mod frame;
pub mod geometry;
pub mod linear;
pub mod ranked;
pub mod search;
pub mod session;
pub mod sizing;
pub mod text;
pub mod viewport;

use crate::geometry::{BoundingBox, Placement};
use crate::ranked::{LayeredPrimitive, SireniaPrimitive};
use crate::sizing::LabelSizer;
use crate::text::{DeterministicTextMeasurer, TextMeasurer};
use probtree_core::{CanonicalGraph, LayoutKind, Settings, TokenTree, ghost};
use serde::Serialize;
use std::sync::Arc;

pub use session::LayoutSession;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Core(#[from] probtree_core::Error),
    #[error("layered layout primitive is not available")]
    PrimitiveUnavailable,
    #[error("layered layout failed: {0}")]
    Primitive(#[from] sirenia::Error),
    #[error("no graph data loaded")]
    NoData,
}

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Clone)]
pub struct LayoutOptions {
    pub text_measurer: Arc<dyn TextMeasurer + Send + Sync>,
    /// `None` makes the rank-based strategy fail with [`Error::PrimitiveUnavailable`].
    pub primitive: Option<Arc<dyn LayeredPrimitive + Send + Sync>>,
}

impl Default for LayoutOptions {
    fn default() -> Self {
        Self {
            text_measurer: Arc::new(DeterministicTextMeasurer::default()),
            primitive: Some(Arc::new(SireniaPrimitive)),
        }
    }
}

/// Result of one layout run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Layout {
    #[serde(flatten)]
    pub placement: Placement,
    #[serde(rename = "boundingBox")]
    pub bounding_box: BoundingBox,
}

impl Layout {
    pub fn empty() -> Self {
        Self {
            placement: Placement::default(),
            bounding_box: BoundingBox::empty(),
        }
    }

    pub fn from_placement(placement: Placement) -> Self {
        let bounding_box = placement.bounding_box();
        Self {
            placement,
            bounding_box,
        }
    }
}

/// Runs the strategy `settings.layout` selects.
///
/// Ghosts are injected into a copy of the graph (or of its tree) on every call when
/// `SHOW_PREDICTED_PATHS` is on, so toggling the setting takes effect on the next run.
pub fn layout_graph(
    graph: &CanonicalGraph,
    settings: &Settings,
    options: &LayoutOptions,
) -> Result<Layout> {
    if graph.is_empty() {
        tracing::warn!("graph has no nodes");
        return Ok(Layout::empty());
    }
    let sizer = LabelSizer::new(settings, options.text_measurer.as_ref());

    match settings.layout {
        LayoutKind::Ranked => {
            let primitive = options
                .primitive
                .as_deref()
                .map(|p| p as &dyn LayeredPrimitive);
            let layout = if settings.show_predicted_paths {
                let mut augmented = graph.clone();
                ghost::inject_into_graph(&mut augmented);
                ranked::layout_ranked(&augmented, &sizer, settings, primitive)
            } else {
                ranked::layout_ranked(graph, &sizer, settings, primitive)
            };
            Ok(layout)
        }
        kind @ (LayoutKind::Branched | LayoutKind::Linear) => {
            let mut tree = TokenTree::build(graph)?;
            if settings.show_predicted_paths {
                ghost::inject_into_tree(&mut tree);
            }
            let placement = if kind == LayoutKind::Branched {
                branched::layout_branched(&tree, &sizer, settings)
            } else {
                linear::layout_linear(&tree, &sizer, settings)
            };
            Ok(Layout::from_placement(placement))
        }
    }
}
