use eframe::egui::Color32;
use palette::{Hsl, IntoColor, Srgb};

use crate::data::master::TIER_ORDER;

// ---------------------------------------------------------------------------
// Fixed brand colors
// ---------------------------------------------------------------------------

/// Tier colors, aligned with `TIER_ORDER` (best to worst).
pub const TIER_COLORS: [Color32; 5] = [
    Color32::from_rgb(0x22, 0xc5, 0x5e),
    Color32::from_rgb(0x84, 0xcc, 0x16),
    Color32::from_rgb(0xea, 0xb3, 0x08),
    Color32::from_rgb(0xf9, 0x73, 0x16),
    Color32::from_rgb(0xef, 0x44, 0x44),
];

/// Blues for the funding stage donut, darkest slice first.
pub const STAGE_BLUES: [Color32; 5] = [
    Color32::from_rgb(0x1d, 0x4e, 0xd8),
    Color32::from_rgb(0x3b, 0x82, 0xf6),
    Color32::from_rgb(0x60, 0xa5, 0xfa),
    Color32::from_rgb(0x93, 0xc5, 0xfd),
    Color32::from_rgb(0xdb, 0xea, 0xfe),
];

/// Accent blue for the industry bars.
pub const ACCENT_BLUE: Color32 = Color32::from_rgb(0x60, 0xa5, 0xfa);

/// Company trace on the signal radar.
pub const RADAR_BLUE: Color32 = Color32::from_rgb(0x3b, 0x82, 0xf6);

/// Population median trace on the signal radar.
pub const MEDIAN_GRAY: Color32 = Color32::from_rgb(0xbb, 0xbb, 0xbb);

/// Color for a tier label; unknown labels fall back to gray.
pub fn tier_color(tier: &str) -> Color32 {
    TIER_ORDER
        .iter()
        .position(|t| *t == tier)
        .map(|i| TIER_COLORS[i])
        .unwrap_or(Color32::GRAY)
}

/// Color for donut slice `index` of `total`. The first five slices use the
/// fixed blues; any further stages get evenly spaced hues.
pub fn stage_color(index: usize, total: usize) -> Color32 {
    if index < STAGE_BLUES.len() {
        STAGE_BLUES[index]
    } else {
        generate_palette(total)
            .get(index)
            .copied()
            .unwrap_or(Color32::GRAY)
    }
}

// ---------------------------------------------------------------------------
// Color palette generator
// ---------------------------------------------------------------------------

/// Generates `n` visually distinct colours using evenly spaced hues.
pub fn generate_palette(n: usize) -> Vec<Color32> {
    if n == 0 {
        return Vec::new();
    }
    (0..n)
        .map(|i| {
            let hue = (i as f32 / n as f32) * 360.0;
            let hsl = Hsl::new(hue, 0.75, 0.55);
            let rgb: Srgb = hsl.into_color();
            Color32::from_rgb(
                (rgb.red * 255.0) as u8,
                (rgb.green * 255.0) as u8,
                (rgb.blue * 255.0) as u8,
            )
        })
        .collect()
}
