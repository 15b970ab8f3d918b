//! Smooth escape-time coloring.
//!
//! The formulas here define what the image looks like, so they are kept
//! exactly as stated and pinned by golden values in the tests.

use std::f64::consts::LN_2;

use panbrot_core::{Complex, Escape};

/// Color of points that never escaped.
pub const INTERIOR_COLOR: [u8; 3] = [5, 10, 16];

const HUE_BASE: f64 = 210.0;
const HUE_SPAN: f64 = 140.0;
const SATURATION: f64 = 0.75;
const LIGHTNESS_BASE: f64 = 0.3;
const LIGHTNESS_SPAN: f64 = 0.5;

/// Continuous iteration count: `ν = n + 1 − log₂(ln|z| / ln 2)`.
#[inline]
pub fn smooth_iteration(iterations: u32, z: Complex) -> f64 {
    let log_zn = z.norm_sq().ln() / 2.0;
    let nu = (log_zn / LN_2).ln() / LN_2;
    iterations as f64 + 1.0 - nu
}

/// Round half up into a byte, as a canvas would store it.
#[inline]
fn channel(v: f64) -> u8 {
    (v * 255.0 + 0.5).floor().clamp(0.0, 255.0) as u8
}

/// HSL → RGB with `h` in degrees and `s`, `l` in `[0, 1]`.
///
/// Hues outside `[0, 360]` fall through every sector and come out gray
/// (`r = g = b = m`).
pub fn hsl_to_rgb(h: f64, s: f64, l: f64) -> [u8; 3] {
    let c = (1.0 - (2.0 * l - 1.0).abs()) * s;
    let hp = h / 60.0;
    let x = c * (1.0 - ((hp % 2.0) - 1.0).abs());

    let (r1, g1, b1) = if (0.0..1.0).contains(&hp) {
        (c, x, 0.0)
    } else if (1.0..2.0).contains(&hp) {
        (x, c, 0.0)
    } else if (2.0..3.0).contains(&hp) {
        (0.0, c, x)
    } else if (3.0..4.0).contains(&hp) {
        (0.0, x, c)
    } else if (4.0..5.0).contains(&hp) {
        (x, 0.0, c)
    } else if (5.0..=6.0).contains(&hp) {
        (c, 0.0, x)
    } else {
        (0.0, 0.0, 0.0)
    };

    let m = l - c / 2.0;
    [channel(r1 + m), channel(g1 + m), channel(b1 + m)]
}

/// Map one escape-time result to a color.
pub fn colorize(escape: &Escape, max_iter: u32) -> [u8; 3] {
    if escape.is_interior(max_iter) {
        return INTERIOR_COLOR;
    }
    let t = smooth_iteration(escape.iterations, escape.z) / max_iter as f64;
    let hue = (HUE_BASE + HUE_SPAN * t) % 360.0;
    hsl_to_rgb(hue, SATURATION, LIGHTNESS_BASE + LIGHTNESS_SPAN * t)
}

/// [`colorize`] with an opaque alpha channel appended.
#[inline]
pub fn colorize_rgba(escape: &Escape, max_iter: u32) -> [u8; 4] {
    let [r, g, b] = colorize(escape, max_iter);
    [r, g, b, 255]
}
