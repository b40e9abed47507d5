//! Stable series colors keyed by product index.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeriesColor {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl SeriesColor {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Same hue at reduced brightness, used for "actual" companions.
    pub fn dimmed(self) -> Self {
        let f = |c: u8| ((c as f64) * 0.6).round() as u8;
        Self::new(f(self.r), f(self.g), f(self.b))
    }

    pub fn hex(self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

// High-contrast on dark terminals.
const PALETTE: [SeriesColor; 10] = [
    SeriesColor::new(0, 255, 255),
    SeriesColor::new(255, 170, 0),
    SeriesColor::new(0, 255, 0),
    SeriesColor::new(255, 85, 255),
    SeriesColor::new(255, 255, 85),
    SeriesColor::new(85, 170, 255),
    SeriesColor::new(255, 85, 85),
    SeriesColor::new(170, 255, 170),
    SeriesColor::new(200, 160, 255),
    SeriesColor::new(255, 200, 150),
];

const GOLDEN_ANGLE_DEG: f64 = 137.507_764;

/// Color for the product at `index` in the mapping.
pub fn color_for_index(index: usize) -> SeriesColor {
    if let Some(c) = PALETTE.get(index) {
        return *c;
    }
    let hue = (index as f64 * GOLDEN_ANGLE_DEG) % 360.0;
    hsv_to_rgb(hue, 0.65, 0.95)
}

fn hsv_to_rgb(h: f64, s: f64, v: f64) -> SeriesColor {
    let c = v * s;
    let hp = h / 60.0;
    let x = c * (1.0 - (hp % 2.0 - 1.0).abs());
    let (r1, g1, b1) = match hp as u32 {
        0 => (c, x, 0.0),
        1 => (x, c, 0.0),
        2 => (0.0, c, x),
        3 => (0.0, x, c),
        4 => (x, 0.0, c),
        _ => (c, 0.0, x),
    };
    let m = v - c;
    let to_u8 = |f: f64| ((f + m) * 255.0).round().clamp(0.0, 255.0) as u8;
    SeriesColor::new(to_u8(r1), to_u8(g1), to_u8(b1))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn colors_are_stable_per_index() {
        for idx in 0..40 {
            assert_eq!(color_for_index(idx), color_for_index(idx));
        }
        assert_eq!(color_for_index(0).hex(), "#00ffff");
        assert_ne!(color_for_index(10), color_for_index(11));
    }

    #[test]
    fn hsv_primary_hues() {
        assert_eq!(hsv_to_rgb(0.0, 1.0, 1.0), SeriesColor::new(255, 0, 0));
        assert_eq!(hsv_to_rgb(120.0, 1.0, 1.0), SeriesColor::new(0, 255, 0));
        assert_eq!(hsv_to_rgb(240.0, 1.0, 1.0), SeriesColor::new(0, 0, 255));
    }
}
