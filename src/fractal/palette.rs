//! Escape-count to color mappings.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColorMode {
    /// `(m, 2m, 3m) / max_iter` per channel, clipped to the color range.
    #[default]
    Channels,
    /// Hue sweep from blue to red over `m / max_iter`; zero counts drawn black.
    Gradient,
}

const SATURATION: f64 = 0.9;
/// Brightness of the first escape count; it rises to 1 at `max_iter`.
const BASE_VALUE: f64 = 0.35;

/// Escape-count gradient for a fixed iteration bound.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Gradient {
    max_iter: u32,
}

impl Gradient {
    pub fn new(max_iter: u32) -> Self {
        Self { max_iter }
    }

    pub fn color(&self, m: u32) -> [u8; 3] {
        if m == 0 {
            return [0, 0, 0];
        }
        let t = if self.max_iter == 0 {
            1.0
        } else {
            (m as f64 / self.max_iter as f64).min(1.0)
        };
        let value = BASE_VALUE + (1.0 - BASE_VALUE) * t.sqrt();
        hsv_to_rgb(240.0 * (1.0 - t), SATURATION, value)
    }
}

/// `h` in degrees (wrapped to `[0, 360)`), `s` and `v` in `[0, 1]`.
pub fn hsv_to_rgb(h: f64, s: f64, v: f64) -> [u8; 3] {
    let h = h.rem_euclid(360.0) / 60.0;
    let sector = h.floor();
    let f = h - sector;
    let p = v * (1.0 - s);
    let q = v * (1.0 - s * f);
    let t = v * (1.0 - s * (1.0 - f));
    let rgb = match sector as u8 {
        0 => [v, t, p],
        1 => [q, v, p],
        2 => [p, v, t],
        3 => [p, q, v],
        4 => [t, p, v],
        _ => [v, p, q],
    };
    rgb.map(|c| (c.clamp(0.0, 1.0) * 255.0).round() as u8)
}
