use crate::wire::{RawEdge, RawNode, Scalar};
use indexmap::IndexMap;
use serde::Serialize;

/// Joins path tokens into a placement key.
pub const PATH_KEY_SEPARATOR: &str = "\u{241F}";

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Empirical {
    pub count: f64,
    pub parent_total: f64,
    pub frequency: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ModelPrediction {
    pub mean: f64,
    pub std_dev: Option<f64>,
    pub samples: Option<u64>,
}

/// A model-predicted continuation, the seed of a ghost child.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Continuation {
    pub token: String,
    pub probability: Option<f64>,
}

/// One token position of a path.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Node {
    pub id: String,
    pub token: String,
    /// `None` until tree conversion derives it for exports that omit it.
    pub path: Option<Vec<String>>,
    /// Index of the token in its path; prompt/cluster roots are negative.
    pub position: Option<i64>,
    pub empirical: Option<Empirical>,
    pub model: Option<ModelPrediction>,
    pub predicted: Vec<Continuation>,
    /// Observed child token counts.
    pub emp_children: IndexMap<String, f64>,
    /// Model-predicted child tokens with their average probability.
    pub model_children: IndexMap<String, Option<f64>>,
    pub is_ghost: bool,
    pub is_root: bool,
    pub is_prefix: bool,
    pub cycle_detected: bool,
    pub cluster_label: Option<String>,
    pub prompt: Option<String>,
}

impl Node {
    pub fn from_raw(id: String, raw: &RawNode) -> Self {
        let empirical = match (raw.emp_freq_here, raw.emp_count_here, raw.emp_parent_total) {
            (Some(frequency), count, total) => Some(Empirical {
                count: count.unwrap_or(0.0),
                parent_total: total.unwrap_or(0.0),
                frequency,
            }),
            (None, Some(count), Some(total)) if total > 0.0 => Some(Empirical {
                count,
                parent_total: total,
                frequency: count / total,
            }),
            _ => None,
        };

        let model = raw.model_prob_here.map(|mean| ModelPrediction {
            mean,
            std_dev: raw.model_prob_std,
            samples: raw
                .model_prob_n
                .filter(|n| n.is_finite() && *n >= 0.0)
                .map(|n| n as u64),
        });

        let predicted = raw
            .theoretical_edges
            .iter()
            .flatten()
            .filter_map(|c| {
                Some(Continuation {
                    token: c.token.as_ref()?.to_string(),
                    probability: c.avg_prob,
                })
            })
            .collect();

        let emp_children = raw
            .emp_children
            .iter()
            .flatten()
            .map(|(tok, count)| (tok.clone(), count.unwrap_or(0.0)))
            .collect();
        let model_children = raw
            .model_children
            .iter()
            .flatten()
            .map(|(tok, child)| (tok.clone(), child.avg_prob))
            .collect();

        let is_ghost = raw.is_ghost.unwrap_or(false);
        Self {
            id,
            token: raw.token.as_ref().map(Scalar::to_string).unwrap_or_default(),
            path: raw
                .path
                .as_ref()
                .map(|p| p.iter().map(Scalar::to_string).collect()),
            position: raw
                .position
                .filter(|p| p.is_finite())
                .map(|p| p.trunc() as i64),
            // Ghosts are model-only.
            empirical: if is_ghost { None } else { empirical },
            model,
            predicted: if is_ghost { Vec::new() } else { predicted },
            emp_children,
            model_children,
            is_ghost,
            is_root: raw.is_root.unwrap_or(false),
            is_prefix: raw.is_prefix.unwrap_or(false),
            cycle_detected: raw.cycle_detected.unwrap_or(false),
            cluster_label: raw.cluster_label.clone(),
            prompt: raw.prompt.clone(),
        }
    }

    /// Prompt and cluster roots carry a negative position.
    pub fn is_prompt(&self) -> bool {
        self.position.is_some_and(|p| p < 0)
    }

    pub fn frequency(&self) -> Option<f64> {
        self.empirical.map(|e| e.frequency)
    }

    pub fn model_probability(&self) -> Option<f64> {
        self.model.map(|m| m.mean)
    }

    /// Probability shown for this node: model probability for ghosts, frequency otherwise.
    pub fn display_probability(&self) -> Option<f64> {
        if self.is_ghost {
            self.model_probability()
        } else {
            self.frequency()
        }
    }

    /// Fan nodes form the shared-prefix spine of a rank-based layout.
    pub fn is_fan(&self) -> bool {
        self.is_prefix || self.is_root
    }

    /// Rank column used by the rank-based layout.
    pub fn rank_depth(&self) -> usize {
        if self.is_root {
            0
        } else if self.is_prefix {
            self.path.as_ref().map_or(0, Vec::len)
        } else {
            (self.position.unwrap_or(0) + 1).max(0) as usize
        }
    }

    /// Stable placement key: the joined path, or `token:depth` when no path is known.
    pub fn key(&self, depth: usize) -> String {
        match &self.path {
            Some(path) => path.join(PATH_KEY_SEPARATOR),
            None => format!("{}:{}", self.token, depth),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum EdgeKind {
    #[default]
    Empirical,
    Ghost,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Edge {
    pub source: String,
    pub target: String,
    pub kind: EdgeKind,
    pub probability: Option<f64>,
    pub weight: f64,
}

impl Edge {
    pub fn empirical(source: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
            kind: EdgeKind::Empirical,
            probability: None,
            weight: 1.0,
        }
    }

    /// Returns `None` when an endpoint is missing.
    pub fn from_raw(raw: &RawEdge) -> Option<Self> {
        let kind = match raw.kind.as_deref() {
            Some("ghost") => EdgeKind::Ghost,
            _ => EdgeKind::Empirical,
        };
        Some(Self {
            source: raw.source.as_ref()?.to_string(),
            target: raw.target.as_ref()?.to_string(),
            kind,
            probability: raw.prob,
            weight: raw.weight.filter(|w| w.is_finite() && *w >= 0.0).unwrap_or(1.0),
        })
    }
}
