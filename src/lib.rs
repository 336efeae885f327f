//! Palette extraction by k-means clustering of pixel colors, plus
//! complementary colors by hue rotation.
//!
//! ```
//! use palette::Srgb;
//! use palettecraft::{complement, extract_palette};
//!
//! let mut pixels = vec![Srgb::new(0u8, 0, 0); 100];
//! pixels.extend(vec![Srgb::new(255u8, 255, 255); 100]);
//!
//! let palette = extract_palette(&pixels, 2).unwrap();
//! assert_eq!(palette.hex_codes(), ["#000000", "#ffffff"]);
//! assert_eq!(complement(Srgb::new(255, 0, 0)), Srgb::new(0, 255, 255));
//! ```

pub mod color;
pub mod complement;
pub mod error;
pub mod extract;
pub mod kmeans;
pub mod source;
pub mod wasm;

pub use color::{Hsl, hex_to_rgb, hsl_to_rgb, luminance, rgb_to_hex, rgb_to_hsl};
pub use complement::{complement, complementary_palette};
pub use error::{PaletteError, Result};
pub use extract::{Palette, PaletteColor, extract_palette, extract_palette_with};
pub use kmeans::{Clustering, KMeansConfig, run_kmeans};
pub use source::{DEFAULT_MAX_DIMENSION, decode_samples, extract_palette_from_bytes, samples_from_image};
