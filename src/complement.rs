use palette::Srgb;

use crate::color::{hsl_to_rgb, rgb_to_hsl};
use crate::extract::Palette;

/// Half a turn on the hue wheel.
const OPPOSITE_HUE: f64 = 0.5;

/// Rotate the hue by 180°, keeping saturation and lightness.
pub fn complement(color: Srgb<u8>) -> Srgb<u8> {
    hsl_to_rgb(rgb_to_hsl(color).rotate_hue(OPPOSITE_HUE))
}

/// The complement of every palette color, in palette order.
pub fn complementary_palette(palette: &Palette) -> Vec<Srgb<u8>> {
    palette.iter().map(|c| complement(c.rgb())).collect()
}
