use std::fmt;

use palette::Srgb;
use tracing::debug;

use crate::color::{luminance, rgb_to_hex};
use crate::complement::complement;
use crate::error::Result;
use crate::kmeans::{KMeansConfig, run_kmeans};

/// One extracted color.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PaletteColor {
    rgb: Srgb<u8>,
}

impl PaletteColor {
    pub fn new(rgb: Srgb<u8>) -> Self {
        Self { rgb }
    }

    pub fn rgb(&self) -> Srgb<u8> {
        self.rgb
    }

    /// `#rrggbb`, lowercase.
    pub fn to_hex(&self) -> String {
        rgb_to_hex(self.rgb)
    }

    pub fn luminance(&self) -> f64 {
        luminance(self.rgb)
    }

    /// The color on the opposite side of the hue wheel.
    pub fn complement(&self) -> Srgb<u8> {
        complement(self.rgb)
    }
}

impl fmt::Display for PaletteColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ({}, {}, {})",
            self.to_hex(),
            self.rgb.red,
            self.rgb.green,
            self.rgb.blue
        )
    }
}

/// Extracted colors, darkest first.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Palette {
    colors: Vec<PaletteColor>,
}

impl Palette {
    pub fn colors(&self) -> &[PaletteColor] {
        &self.colors
    }

    pub fn len(&self) -> usize {
        self.colors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.colors.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, PaletteColor> {
        self.colors.iter()
    }

    pub fn hex_codes(&self) -> Vec<String> {
        self.colors.iter().map(PaletteColor::to_hex).collect()
    }
}

impl<'a> IntoIterator for &'a Palette {
    type Item = &'a PaletteColor;
    type IntoIter = std::slice::Iter<'a, PaletteColor>;

    fn into_iter(self) -> Self::IntoIter {
        self.colors.iter()
    }
}

/// Extract `k` representative colors with the default clustering settings.
pub fn extract_palette(samples: &[Srgb<u8>], k: usize) -> Result<Palette> {
    extract_palette_with(samples, k, &KMeansConfig::default())
}

/// Cluster `samples` into `k` colors and order them by ascending luminance.
///
/// Centroids are rounded to the nearest integer per channel. Colors with equal
/// luminance keep the order in which the clustering produced them.
pub fn extract_palette_with(samples: &[Srgb<u8>], k: usize, config: &KMeansConfig) -> Result<Palette> {
    let clustering = run_kmeans(samples, k, config)?;

    let colors = order_by_luminance(
        clustering
            .rounded_centroids()
            .into_iter()
            .map(PaletteColor::new)
            .collect(),
    );

    debug!(
        k,
        converged = clustering.converged,
        iterations = clustering.iterations,
        "Extracted palette"
    );

    Ok(Palette { colors })
}

/// Darkest first. The sort is stable, so equal luminance keeps input order.
fn order_by_luminance(mut colors: Vec<PaletteColor>) -> Vec<PaletteColor> {
    colors.sort_by(|a, b| a.luminance().total_cmp(&b.luminance()));
    colors
}
