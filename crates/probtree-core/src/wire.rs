//! Serde mirrors of the JSON exports.
//!
//! Everything is optional and lenient: exports from different pipeline versions disagree on
//! which fields are present, and numeric ids are common. Interpretation happens in
//! [`crate::model`]; this module only describes what can appear on the wire.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// A JSON scalar used where the exports mix strings and numbers (ids, tokens).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Scalar {
    Text(String),
    Number(serde_json::Number),
    Bool(bool),
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scalar::Text(s) => f.write_str(s),
            Scalar::Number(n) => write!(f, "{n}"),
            Scalar::Bool(b) => write!(f, "{b}"),
        }
    }
}

impl From<&str> for Scalar {
    fn from(value: &str) -> Self {
        Scalar::Text(value.to_string())
    }
}

/// Reads an id out of a child reference: a bare string/number, or an object with `id`.
pub fn id_of_ref(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Object(map) => map.get("id").and_then(id_of_ref),
        _ => None,
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RawContinuation {
    pub token: Option<Scalar>,
    pub avg_prob: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RawModelChild {
    pub avg_prob: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RawNode {
    pub id: Option<Scalar>,
    pub token: Option<Scalar>,
    pub path: Option<Vec<Scalar>>,
    pub position: Option<f64>,

    pub emp_count_here: Option<f64>,
    pub emp_parent_total: Option<f64>,
    pub emp_freq_here: Option<f64>,

    pub model_prob_here: Option<f64>,
    pub model_prob_std: Option<f64>,
    pub model_prob_n: Option<f64>,

    pub theoretical_edges: Option<Vec<RawContinuation>>,
    pub emp_children: Option<IndexMap<String, Option<f64>>>,
    pub model_children: Option<IndexMap<String, RawModelChild>>,

    pub is_root: Option<bool>,
    pub is_prefix: Option<bool>,
    #[serde(rename = "isGhost")]
    pub is_ghost: Option<bool>,
    #[serde(rename = "cycleDetected")]
    pub cycle_detected: Option<bool>,

    pub cluster_label: Option<String>,
    pub prompt: Option<String>,

    /// Nested tree: node objects. Adjacency bundle: ids or `{id}` objects.
    pub children: Option<Vec<Value>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RawEdge {
    pub source: Option<Scalar>,
    pub target: Option<Scalar>,
    pub kind: Option<String>,
    pub prob: Option<f64>,
    pub weight: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RawFlatGraph {
    pub nodes: Vec<RawNode>,
    pub edges: Vec<RawEdge>,
    pub metadata: Option<Value>,
    pub anchor_root_id: Option<Scalar>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RawBundle {
    pub root: Value,
    pub nodes_by_id: IndexMap<String, RawNode>,
    pub anchor_root_id: Option<Scalar>,
}
