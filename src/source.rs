//! Turning encoded images into pixel samples.

use image::{DynamicImage, GenericImageView, imageops::FilterType};
use palette::Srgb;
use tracing::debug;

use crate::error::Result;
use crate::extract::{Palette, extract_palette_with};
use crate::kmeans::KMeansConfig;

/// Longest side images are shrunk to before clustering.
pub const DEFAULT_MAX_DIMENSION: u32 = 500;

/// Flatten an image into samples, skipping fully transparent pixels.
///
/// Pixels with alpha 0 contribute nothing, so an image that is transparent
/// everywhere yields no samples and clustering it fails with
/// [`PaletteError::EmptyInput`](crate::PaletteError::EmptyInput).
///
/// When `max_dimension` is set and the longest side exceeds it, the image is
/// first shrunk (nearest-neighbour, aspect ratio kept) so that the longest
/// side equals `max_dimension`.
pub fn samples_from_image(img: &DynamicImage, max_dimension: Option<u32>) -> Vec<Srgb<u8>> {
    let (orig_w, orig_h) = img.dimensions();
    let max_side = orig_w.max(orig_h);

    let rgba = match max_dimension {
        Some(limit) if limit > 0 && max_side > limit => {
            let ratio = limit as f32 / max_side as f32;
            let w = ((orig_w as f32) * ratio).max(1.0) as u32;
            let h = ((orig_h as f32) * ratio).max(1.0) as u32;
            debug!(orig_w, orig_h, w, h, "Downscaling before clustering");
            image::imageops::resize(img, w, h, FilterType::Nearest)
        }
        _ => img.to_rgba8(),
    };

    rgba.into_raw()
        .chunks_exact(4)
        .filter(|px| px[3] != 0)
        .map(|px| Srgb::new(px[0], px[1], px[2]))
        .collect()
}

/// Decode `input` (any format `image` recognizes) into samples.
pub fn decode_samples(input: &[u8], max_dimension: Option<u32>) -> Result<Vec<Srgb<u8>>> {
    let img = image::load_from_memory(input)?;
    Ok(samples_from_image(&img, max_dimension))
}

/// Decode `input` and extract a `k` color palette from it.
pub fn extract_palette_from_bytes(
    input: &[u8],
    k: usize,
    max_dimension: Option<u32>,
    config: &KMeansConfig,
) -> Result<Palette> {
    let samples = decode_samples(input, max_dimension)?;
    extract_palette_with(&samples, k, config)
}
