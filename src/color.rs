use palette::encoding;
use palette::{FromColor, IntoColor, Srgb};

use crate::error::{PaletteError, Result};

type PaletteHsl = palette::Hsl<encoding::Srgb, f64>;

// ITU-R BT.709 relative luminance weights.
const LUMA_RED: f64 = 0.2126;
const LUMA_GREEN: f64 = 0.7152;
const LUMA_BLUE: f64 = 0.0722;

/// Format a color as `#rrggbb` (lowercase, two digits per channel).
pub fn rgb_to_hex(color: Srgb<u8>) -> String {
    format!("#{:02x}{:02x}{:02x}", color.red, color.green, color.blue)
}

/// Parse `rrggbb` or `#rrggbb` into a color.
pub fn hex_to_rgb(value: &str) -> Result<Srgb<u8>> {
    let hex = value.strip_prefix('#').unwrap_or(value);
    if hex.len() != 6 || !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
        return Err(PaletteError::format(value));
    }
    let channel = |at: usize| {
        u8::from_str_radix(&hex[at..at + 2], 16).map_err(|_| PaletteError::format(value))
    };
    Ok(Srgb::new(channel(0)?, channel(2)?, channel(4)?))
}

/// Weighted brightness in 0-255 space, used to order palettes dark to light.
#[inline]
pub fn luminance(color: Srgb<u8>) -> f64 {
    LUMA_RED * color.red as f64 + LUMA_GREEN * color.green as f64 + LUMA_BLUE * color.blue as f64
}

/// Hue/saturation/lightness with every component in `[0, 1]`.
///
/// `hue` is measured in turns, so `0.5` is a 180° rotation, and always lies in
/// `[0, 1)`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Hsl {
    /// Position on the hue wheel, in turns.
    pub hue: f64,
    /// 0 is grey, 1 fully saturated.
    pub saturation: f64,
    /// 0 is black, 1 white.
    pub lightness: f64,
}

impl Hsl {
    /// Rotate the hue by `turns`, wrapping back into `[0, 1)`.
    pub fn rotate_hue(self, turns: f64) -> Self {
        Self {
            hue: wrap_turns(self.hue + turns),
            ..self
        }
    }
}

fn wrap_turns(turns: f64) -> f64 {
    let wrapped = turns.rem_euclid(1.0);
    // rem_euclid rounds tiny negative inputs up to exactly 1.0
    if wrapped >= 1.0 { 0.0 } else { wrapped }
}

/// Convert a color to HSL. Channels are normalized to `[0, 1]` first.
pub fn rgb_to_hsl(color: Srgb<u8>) -> Hsl {
    let hsl: PaletteHsl = color.into_format::<f64>().into_color();
    Hsl {
        hue: wrap_turns(hsl.hue.into_positive_degrees() / 360.0),
        saturation: hsl.saturation,
        lightness: hsl.lightness,
    }
}

/// Convert HSL back to 8-bit RGB, rounding each channel to the nearest integer.
pub fn hsl_to_rgb(hsl: Hsl) -> Srgb<u8> {
    let rgb = Srgb::<f64>::from_color(PaletteHsl::new(
        hsl.hue * 360.0,
        hsl.saturation,
        hsl.lightness,
    ));
    Srgb::new(quantize(rgb.red), quantize(rgb.green), quantize(rgb.blue))
}

/// Map a normalized channel to `0..=255`, round-to-nearest.
#[inline]
pub(crate) fn quantize(channel: f64) -> u8 {
    (channel * 255.0).round().clamp(0.0, 255.0) as u8
}
