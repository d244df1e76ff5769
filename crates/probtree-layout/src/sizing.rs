//! Node labels and box sizes.

use crate::text::{TextMeasurer, TextStyle, wrap_lines};
use probtree_core::{Node, ProbDisplay, Settings};
use regex::Regex;
use std::sync::OnceLock;

/// Smallest visible box edge.
pub const MIN_DIM: f64 = 8.0;
/// Edge used when a measurement is unusable.
pub const FALLBACK_DIM: f64 = 24.0;
/// Extra leading between wrapped prompt lines.
pub const PROMPT_LINE_GAP: f64 = 4.0;

fn brackets_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\[?\[?(.+?)\]?\]?$").expect("bracket regex must compile"))
}

fn tag_prefix_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\[.*?:\s*").expect("tag prefix regex must compile"))
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Size {
    pub w: f64,
    pub h: f64,
}

impl Size {
    /// Replaces unusable extents: non-finite or non-positive becomes [`FALLBACK_DIM`], anything
    /// else is raised to at least [`MIN_DIM`].
    pub fn clamped(self) -> Self {
        Self {
            w: clamp_dim(self.w),
            h: clamp_dim(self.h),
        }
    }
}

pub fn clamp_dim(v: f64) -> f64 {
    if v.is_finite() && v > 0.0 {
        v.max(MIN_DIM)
    } else {
        FALLBACK_DIM
    }
}

/// Maps a node to its box size. Layouts clamp whatever a sizer returns.
pub trait NodeSizer {
    fn size(&self, node: &Node) -> Size;
}

impl<F> NodeSizer for F
where
    F: Fn(&Node) -> Size,
{
    fn size(&self, node: &Node) -> Size {
        self(node)
    }
}

/// The text a node box shows: its token line and up to two metadata lines.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LabelParts {
    pub token: String,
    pub meta_emp: Option<String>,
    pub meta_model: Option<String>,
}

impl LabelParts {
    pub fn meta_lines(&self) -> impl Iterator<Item = &str> {
        self.meta_emp
            .as_deref()
            .into_iter()
            .chain(self.meta_model.as_deref())
    }
}

/// Strips `[[...]]` wrapping and a leading `[tag: ` from a prompt or cluster label.
pub fn clean_prompt_label(raw: &str) -> String {
    let unwrapped = brackets_re().replace(raw, "$1");
    tag_prefix_re().replace(&unwrapped, "").trim().to_string()
}

pub fn label_parts(node: &Node, display: ProbDisplay) -> LabelParts {
    if node.is_prompt() {
        let raw = [&node.cluster_label, &node.prompt]
            .into_iter()
            .flatten()
            .find(|s| !s.is_empty())
            .map_or(node.token.as_str(), String::as_str);
        return LabelParts {
            token: clean_prompt_label(raw),
            ..Default::default()
        };
    }

    let meta_emp = node.empirical.map(|e| {
        format!(
            "Observed frequency: {:.1}% ({}/{})",
            e.frequency * 100.0,
            count_text(e.count),
            count_text(e.parent_total)
        )
    });

    let meta_model = node.model.map(|m| {
        let mean = m.mean;
        let spread = match (m.std_dev, m.samples) {
            (Some(sd), Some(n)) if n >= 2 => Some((sd, n)),
            _ => None,
        };
        match (display, spread) {
            (ProbDisplay::MeanSd, Some((sd, n))) => format!(
                "Predicted probability: {:.1}% ± {:.1}% (n={n})",
                mean * 100.0,
                sd * 100.0
            ),
            (ProbDisplay::Range, Some((sd, n))) => {
                let lo = (mean - 2.0 * sd).max(0.0);
                let hi = (mean + 2.0 * sd).min(1.0);
                format!(
                    "Predicted probability: ~[{:.1}%–{:.1}%] (n={n})",
                    lo * 100.0,
                    hi * 100.0
                )
            }
            _ => format!("Predicted probability: {:.1}%", mean * 100.0),
        }
    });

    LabelParts {
        token: node.token.clone(),
        meta_emp,
        meta_model,
    }
}

fn count_text(v: f64) -> String {
    if v.fract() == 0.0 && v.abs() < 1e15 {
        format!("{}", v as i64)
    } else {
        format!("{v}")
    }
}

/// Sizes boxes from their label text.
pub struct LabelSizer<'a> {
    pub settings: &'a Settings,
    pub measurer: &'a dyn TextMeasurer,
}

impl<'a> LabelSizer<'a> {
    pub fn new(settings: &'a Settings, measurer: &'a dyn TextMeasurer) -> Self {
        Self { settings, measurer }
    }

    fn padded_width(&self, text: &str, font_px: f64) -> f64 {
        2.0 * self.settings.pad_x + self.measurer.measure(text, &TextStyle::sized(font_px)).width
    }

    /// Wrapped lines of a prompt label, for boxes of the maximum label width.
    pub fn prompt_lines(&self, text: &str) -> Vec<String> {
        let s = self.settings;
        wrap_lines(
            text,
            s.label_max - 2.0 * s.pad_x,
            &TextStyle::sized(s.token_fpx),
            self.measurer,
        )
    }
}

impl NodeSizer for LabelSizer<'_> {
    fn size(&self, node: &Node) -> Size {
        let s = self.settings;
        let parts = label_parts(node, s.prob_display);

        let token_w = self.padded_width(&parts.token, s.token_fpx);
        let meta_w = parts
            .meta_lines()
            .map(|line| self.padded_width(line, s.meta_fpx))
            .fold(0.0, f64::max);
        let w = s.label_max.min(token_w.max(meta_w));

        let h = if node.is_prompt() {
            let lines = self.prompt_lines(&parts.token).len() as f64;
            s.pad_t + lines * s.token_fpx + (lines - 1.0) * PROMPT_LINE_GAP + s.pad_b
        } else {
            s.node_h
        };
        Size { w, h }
    }
}
