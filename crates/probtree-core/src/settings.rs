//! Visualization settings.
//!
//! JSON keys are the SCREAMING_CASE names used by exported configs; every key is optional.
//! Partial updates are deep-merged onto the current values and re-validated, so a caller
//! never observes half-applied settings.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LayoutKind {
    Branched,
    Linear,
    #[default]
    #[serde(alias = "dagre")]
    Ranked,
}

/// Scoring used to pick a node's main child.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Metric {
    #[default]
    Emp,
    #[serde(alias = "model")]
    Prob,
    Data,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProbDisplay {
    Mean,
    #[default]
    MeanSd,
    Range,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "SCREAMING_SNAKE_CASE")]
pub struct Settings {
    pub layout: LayoutKind,
    /// Distance between depth columns.
    pub gap_x: f64,
    /// Vertical gap between alternates.
    pub alt_gap: f64,
    pub pad_t: f64,
    pub pad_b: f64,
    pub pad_x: f64,
    pub label_max: f64,
    pub token_fpx: f64,
    pub meta_fpx: f64,
    /// Height of regular (non-prompt) nodes.
    pub node_h: f64,
    pub color_floor: f64,
    pub color_cap: f64,
    pub link_px: f64,
    pub branched_gap_max: f64,
    /// Maximum edge angle from the flow axis, in degrees.
    pub ang_max_deg: f64,
    pub rank_sep: f64,
    pub node_sep: f64,
    pub main_metric: Metric,
    pub packing_metric: Metric,
    pub prob_display: ProbDisplay,
    pub show_predicted_paths: bool,
    pub viewport_pad: f64,
    pub lod_hide_text_below: f64,
    pub lod_token_only_below: f64,
    pub lod_simplify_lines_below: f64,
    /// Multiple of `TOKEN_FPX` the enlarged token label may reach.
    pub lod_enlarged_font_cap: f64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            layout: LayoutKind::Ranked,
            gap_x: 400.0,
            alt_gap: 45.0,
            pad_t: 10.0,
            pad_b: 10.0,
            pad_x: 10.0,
            label_max: 520.0,
            token_fpx: 16.0,
            meta_fpx: 12.0,
            node_h: 70.0,
            color_floor: 0.02,
            color_cap: 0.60,
            link_px: 1.6,
            branched_gap_max: 700.0,
            ang_max_deg: 60.0,
            rank_sep: 200.0,
            node_sep: 45.0,
            main_metric: Metric::Emp,
            packing_metric: Metric::Emp,
            prob_display: ProbDisplay::MeanSd,
            show_predicted_paths: true,
            viewport_pad: 300.0,
            lod_hide_text_below: 0.05,
            lod_token_only_below: 0.25,
            lod_simplify_lines_below: 0.3,
            lod_enlarged_font_cap: 3.0,
        }
    }
}

impl Settings {
    pub fn from_json_str(text: &str) -> Result<Self> {
        let partial: Value = serde_json::from_str(text)?;
        Self::default().merged(&partial)
    }

    /// Returns a copy with `partial` deep-merged over the current values.
    pub fn merged(&self, partial: &Value) -> Result<Self> {
        if !partial.is_object() {
            return Err(Error::InvalidSettings {
                message: "settings must be a JSON object".to_string(),
            });
        }
        let mut base = serde_json::to_value(self).map_err(|e| Error::InvalidSettings {
            message: e.to_string(),
        })?;
        deep_merge_value(&mut base, partial);
        let merged: Settings = serde_json::from_value(base).map_err(|e| Error::InvalidSettings {
            message: e.to_string(),
        })?;
        merged.validate()?;
        Ok(merged)
    }

    pub fn validate(&self) -> Result<()> {
        let non_negative = [
            ("GAP_X", self.gap_x),
            ("ALT_GAP", self.alt_gap),
            ("PAD_T", self.pad_t),
            ("PAD_B", self.pad_b),
            ("PAD_X", self.pad_x),
            ("LABEL_MAX", self.label_max),
            ("TOKEN_FPX", self.token_fpx),
            ("META_FPX", self.meta_fpx),
            ("NODE_H", self.node_h),
            ("LINK_PX", self.link_px),
            ("BRANCHED_GAP_MAX", self.branched_gap_max),
            ("RANK_SEP", self.rank_sep),
            ("NODE_SEP", self.node_sep),
            ("VIEWPORT_PAD", self.viewport_pad),
            ("LOD_ENLARGED_FONT_CAP", self.lod_enlarged_font_cap),
        ];
        for (name, value) in non_negative {
            if !(value.is_finite() && value >= 0.0) {
                return Err(Error::InvalidSettings {
                    message: format!("{name} must be a finite, non-negative number (got {value})"),
                });
            }
        }
        for (name, value) in [
            ("COLOR_FLOOR", self.color_floor),
            ("COLOR_CAP", self.color_cap),
            ("LOD_HIDE_TEXT_BELOW", self.lod_hide_text_below),
            ("LOD_TOKEN_ONLY_BELOW", self.lod_token_only_below),
            ("LOD_SIMPLIFY_LINES_BELOW", self.lod_simplify_lines_below),
        ] {
            if !value.is_finite() {
                return Err(Error::InvalidSettings {
                    message: format!("{name} must be finite (got {value})"),
                });
            }
        }
        Ok(())
    }
}

fn deep_merge_value(base: &mut Value, incoming: &Value) {
    match (base, incoming) {
        (Value::Object(base_map), Value::Object(in_map)) => {
            for (key, in_value) in in_map {
                match base_map.get_mut(key) {
                    Some(base_value) => deep_merge_value(base_value, in_value),
                    None => {
                        base_map.insert(key.clone(), in_value.clone());
                    }
                }
            }
        }
        (base_slot, in_value) => {
            *base_slot = in_value.clone();
        }
    }
}
