#![forbid(unsafe_code)]

//! Token-probability graph model.
//!
//! Exports arrive in one of three shapes (flat node/edge graph, legacy adjacency bundle,
//! nested tree). [`GraphInput`] recognizes the shape once, [`normalize`] turns it into a
//! [`CanonicalGraph`], and [`TokenTree::build`] derives the tree that the tree-shaped
//! layouts consume. Ghost children are synthesized by [`ghost`].

pub mod error;
pub mod ghost;
pub mod graph;
pub mod input;
pub mod model;
pub mod score;
pub mod settings;
pub mod tree;
pub mod wire;

pub use error::{Error, Result};
pub use graph::{CanonicalGraph, empirical_share, normalize};
pub use input::{GraphInput, InputShape};
pub use model::{
    Continuation, Edge, EdgeKind, Empirical, ModelPrediction, Node, PATH_KEY_SEPARATOR,
};
pub use settings::{LayoutKind, Metric, ProbDisplay, Settings};
pub use tree::{TokenTree, TreeNode};

/// Parses JSON text and normalizes it in one step.
pub fn load_str(text: &str) -> Result<CanonicalGraph> {
    let input = GraphInput::from_json_str(text)?;
    Ok(normalize(&input))
}
