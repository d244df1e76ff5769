//! Virtualized drawing of a placement.
//!
//! Only nodes whose screen rectangle meets the padded scroll viewport are drawn, and a link
//! is drawn only when both of its endpoint nodes are. Link endpoints are looked up by node key
//! on every call, so repeated renders of the same inputs draw the same thing and never
//! accumulate drift. The placement itself is never modified.

use crate::color::{node_colors, to_hex};
use crate::geometry::{PlacedLink, PlacedNode, Placement};
use crate::search::SearchMatches;
use crate::sizing::label_parts;
use crate::text::{TextMeasurer, TextStyle, wrap_lines};
use probtree_core::Settings;
use rustc_hash::{FxHashMap, FxHashSet};
use serde::{Deserialize, Serialize};

/// Pan/zoom: screen = content * k + offset.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Transform {
    pub k: f64,
    pub x: f64,
    pub y: f64,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            k: 1.0,
            x: 0.0,
            y: 0.0,
        }
    }
}

impl Transform {
    /// The zoom factor, with unusable values treated as 1.
    pub fn scale(&self) -> f64 {
        if self.k.is_finite() && self.k > 0.0 {
            self.k
        } else {
            1.0
        }
    }
}

/// The visible part of the scrolled stage, in screen pixels.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ScrollRect {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

/// Everything a frame depends on besides the placement.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct View {
    pub transform: Transform,
    pub scroll: ScrollRect,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DetailTier {
    /// Boxes and links only.
    Shapes,
    /// Token label only, enlarged to fill the box.
    TokenOnly,
    Full,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LevelOfDetail {
    pub tier: DetailTier,
    pub simplify_lines: bool,
}

impl LevelOfDetail {
    pub fn for_scale(k: f64, settings: &Settings) -> Self {
        let tier = if k < settings.lod_hide_text_below {
            DetailTier::Shapes
        } else if k < settings.lod_token_only_below {
            DetailTier::TokenOnly
        } else {
            DetailTier::Full
        };
        Self {
            tier,
            simplify_lines: k < settings.lod_simplify_lines_below,
        }
    }
}

pub fn node_visible(node: &PlacedNode, view: &View, pad: f64) -> bool {
    let k = view.transform.scale();
    let (ox, oy) = (view.transform.x, view.transform.y);
    let s = &view.scroll;
    let left = node.y * k + ox;
    let right = left + node.w * k;
    let top = node.top() * k + oy;
    let bottom = node.bottom() * k + oy;
    right >= s.left - pad
        && left <= s.left + s.width + pad
        && bottom >= s.top - pad
        && top <= s.top + s.height + pad
}

/// Indices of the nodes a frame draws.
pub fn visible_nodes(nodes: &[PlacedNode], view: &View, pad: f64) -> Vec<usize> {
    nodes
        .iter()
        .enumerate()
        .filter(|(_, n)| node_visible(n, view, pad))
        .map(|(i, _)| i)
        .collect()
}

/// SVG path data: a straight segment when both ends share a cross position, else a cubic
/// whose control points sit at 45% and 55% of the run.
pub fn link_path(sx: f64, sy: f64, tx: f64, ty: f64) -> String {
    if sy == ty {
        return format!("M{sx},{sy} L{tx},{ty}");
    }
    let dx = tx - sx;
    let c1x = sx + dx * 0.45;
    let c2x = sx + dx * 0.55;
    format!("M{sx},{sy} C{c1x},{sy} {c2x},{ty} {tx},{ty}")
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TextRun {
    pub text: String,
    pub font_px: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeDraw {
    pub index: usize,
    pub key: String,
    pub x: f64,
    pub y: f64,
    pub w: f64,
    pub h: f64,
    pub fill: String,
    pub text_color: String,
    pub is_ghost: bool,
    pub is_match: bool,
    pub text: Vec<TextRun>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LinkDraw {
    pub source_key: String,
    pub target_key: String,
    pub sx: f64,
    pub sy: f64,
    pub tx: f64,
    pub ty: f64,
    pub path: String,
    pub stroke_width: f64,
    pub dashed: bool,
    pub probability: f64,
}

/// Draw target of [`render_visible`].
pub trait Canvas {
    /// Called before anything of a new frame is drawn.
    fn begin_frame(&mut self) {}
    fn draw_link(&mut self, link: &LinkDraw);
    fn draw_node(&mut self, node: &NodeDraw);
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum DrawCommand {
    Link(LinkDraw),
    Node(NodeDraw),
}

/// Keeps the commands of the latest frame.
#[derive(Debug, Clone, Default)]
pub struct RecordingCanvas {
    pub commands: Vec<DrawCommand>,
    pub frames: usize,
}

impl RecordingCanvas {
    pub fn nodes(&self) -> impl Iterator<Item = &NodeDraw> {
        self.commands.iter().filter_map(|c| match c {
            DrawCommand::Node(n) => Some(n),
            DrawCommand::Link(_) => None,
        })
    }

    pub fn links(&self) -> impl Iterator<Item = &LinkDraw> {
        self.commands.iter().filter_map(|c| match c {
            DrawCommand::Link(l) => Some(l),
            DrawCommand::Node(_) => None,
        })
    }
}

impl Canvas for RecordingCanvas {
    fn begin_frame(&mut self) {
        self.commands.clear();
        self.frames += 1;
    }

    fn draw_link(&mut self, link: &LinkDraw) {
        self.commands.push(DrawCommand::Link(link.clone()));
    }

    fn draw_node(&mut self, node: &NodeDraw) {
        self.commands.push(DrawCommand::Node(node.clone()));
    }
}

/// What a frame draws from.
pub struct Scene<'a> {
    pub placement: &'a Placement,
    pub matches: &'a SearchMatches,
    pub settings: &'a Settings,
    pub measurer: &'a dyn TextMeasurer,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RenderStats {
    pub nodes: usize,
    pub links: usize,
    pub detail: LevelOfDetail,
}

pub fn render_visible(scene: &Scene<'_>, view: &View, canvas: &mut dyn Canvas) -> RenderStats {
    let settings = scene.settings;
    let nodes = &scene.placement.nodes;
    let detail = LevelOfDetail::for_scale(view.transform.scale(), settings);

    let visible = visible_nodes(nodes, view, settings.viewport_pad);
    let visible_keys: FxHashSet<&str> = visible.iter().map(|&i| nodes[i].key.as_str()).collect();
    let by_key: FxHashMap<&str, &PlacedNode> =
        nodes.iter().map(|n| (n.key.as_str(), n)).collect();

    canvas.begin_frame();

    let mut link_count = 0;
    for link in &scene.placement.links {
        if !(visible_keys.contains(link.source_key.as_str())
            && visible_keys.contains(link.target_key.as_str()))
        {
            continue;
        }
        let (Some(source), Some(target)) = (
            by_key.get(link.source_key.as_str()),
            by_key.get(link.target_key.as_str()),
        ) else {
            continue;
        };
        canvas.draw_link(&link_draw(link, source, target, detail, settings));
        link_count += 1;
    }

    for &i in &visible {
        canvas.draw_node(&node_draw(i, &nodes[i], scene, detail));
    }

    RenderStats {
        nodes: visible.len(),
        links: link_count,
        detail,
    }
}

fn link_draw(
    link: &PlacedLink,
    source: &PlacedNode,
    target: &PlacedNode,
    detail: LevelOfDetail,
    settings: &Settings,
) -> LinkDraw {
    let (sx, sy) = source.exit();
    let (tx, ty) = target.entry();
    LinkDraw {
        source_key: link.source_key.clone(),
        target_key: link.target_key.clone(),
        sx,
        sy,
        tx,
        ty,
        path: link_path(sx, sy, tx, ty),
        stroke_width: if detail.simplify_lines {
            1.0
        } else {
            settings.link_px
        },
        dashed: link.is_ghost && !detail.simplify_lines,
        probability: link.probability,
    }
}

fn node_draw(index: usize, n: &PlacedNode, scene: &Scene<'_>, detail: LevelOfDetail) -> NodeDraw {
    let settings = scene.settings;
    let colors = node_colors(&n.node, settings);
    let parts = label_parts(&n.node, settings.prob_display);

    let text = match detail.tier {
        DetailTier::Shapes => Vec::new(),
        _ if n.node.is_prompt() => wrap_lines(
            &parts.token,
            n.w - 2.0 * settings.pad_x,
            &TextStyle::sized(settings.token_fpx),
            scene.measurer,
        )
        .into_iter()
        .map(|text| TextRun {
            text,
            font_px: settings.token_fpx,
        })
        .collect(),
        DetailTier::TokenOnly => vec![TextRun {
            text: parts.token.clone(),
            font_px: (settings.token_fpx * settings.lod_enlarged_font_cap).min(n.h * 0.8),
        }],
        DetailTier::Full => std::iter::once(TextRun {
            text: parts.token.clone(),
            font_px: settings.token_fpx,
        })
        .chain(parts.meta_lines().map(|line| TextRun {
            text: line.to_string(),
            font_px: settings.meta_fpx,
        }))
        .collect(),
    };

    NodeDraw {
        index,
        key: n.key.clone(),
        x: n.x,
        y: n.y,
        w: n.w,
        h: n.h,
        fill: to_hex(colors.fill),
        text_color: to_hex(colors.text),
        is_ghost: n.node.is_ghost,
        is_match: scene.matches.contains_key(&n.key),
        text,
    }
}
