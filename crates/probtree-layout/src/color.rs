//! Probability-to-color mapping.

use palette::{LinSrgb, Mix, Srgb};
use probtree_core::{Node, Settings};

/// Viridis sampled at tenths, `#440154` to `#fde725`.
const VIRIDIS: [(u8, u8, u8); 11] = [
    (0x44, 0x01, 0x54),
    (0x48, 0x24, 0x75),
    (0x41, 0x44, 0x87),
    (0x35, 0x5f, 0x8d),
    (0x2a, 0x78, 0x8e),
    (0x21, 0x91, 0x8c),
    (0x22, 0xa8, 0x84),
    (0x44, 0xbf, 0x70),
    (0x7a, 0xd1, 0x51),
    (0xbd, 0xdf, 0x26),
    (0xfd, 0xe7, 0x25),
];

pub const GHOST_TINT: (u8, u8, u8) = (0xe5, 0xe5, 0xe5);
pub const GHOST_TINT_AMOUNT: f32 = 0.65;

fn rgb((r, g, b): (u8, u8, u8)) -> Srgb {
    Srgb::new(r, g, b).into_format()
}

/// Position of `p` between the color floor and cap, in `[0, 1]`.
pub fn normalized(p: Option<f64>, settings: &Settings) -> f64 {
    let Some(p) = p else {
        return 0.0;
    };
    let range = (settings.color_cap - settings.color_floor).max(1e-9);
    let t = (p - settings.color_floor) / range;
    if t.is_nan() { 0.0 } else { t.clamp(0.0, 1.0) }
}

pub fn viridis(t: f64) -> Srgb {
    let t = if t.is_finite() { t.clamp(0.0, 1.0) } else { 0.0 };
    let scaled = t * (VIRIDIS.len() - 1) as f64;
    let i = (scaled.floor() as usize).min(VIRIDIS.len() - 2);
    let frac = (scaled - i as f64) as f32;
    rgb(VIRIDIS[i]).mix(rgb(VIRIDIS[i + 1]), frac)
}

/// WCAG relative luminance.
pub fn luminance(color: Srgb) -> f32 {
    let lin: LinSrgb = color.into_linear();
    0.2126 * lin.red + 0.7152 * lin.green + 0.0722 * lin.blue
}

pub fn text_color_on(fill: Srgb) -> Srgb {
    if luminance(fill) < 0.5 {
        Srgb::new(1.0, 1.0, 1.0)
    } else {
        Srgb::new(0.0, 0.0, 0.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NodeColors {
    pub fill: Srgb,
    pub text: Srgb,
}

pub fn node_colors(node: &Node, settings: &Settings) -> NodeColors {
    if node.is_prompt() {
        return NodeColors {
            fill: Srgb::new(1.0, 1.0, 1.0),
            text: rgb((0x11, 0x11, 0x11)),
        };
    }
    let mut fill = viridis(normalized(node.display_probability(), settings));
    if node.is_ghost {
        fill = fill.mix(rgb(GHOST_TINT), GHOST_TINT_AMOUNT);
    }
    NodeColors {
        fill,
        text: text_color_on(fill),
    }
}

pub fn to_hex(color: Srgb) -> String {
    let c: Srgb<u8> = color.into_format();
    format!("#{:02x}{:02x}{:02x}", c.red, c.green, c.blue)
}
