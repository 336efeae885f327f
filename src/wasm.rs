use js_sys::{Array, Object, Reflect};
use wasm_bindgen::prelude::*;

use crate::color::{hex_to_rgb, rgb_to_hex};
use crate::complement::{complement, complementary_palette};
use crate::kmeans::KMeansConfig;
use crate::source::extract_palette_from_bytes;

fn js_error(err: impl std::fmt::Display) -> JsValue {
    JsValue::from_str(&err.to_string())
}

fn hex_array<I: IntoIterator<Item = String>>(codes: I) -> Array {
    let out = Array::new();
    for hex in codes {
        out.push(&JsValue::from_str(&hex));
    }
    out
}

/// Extract a palette from an encoded image.
///
/// Returns `{ palette: string[], complements: string[] }` with `#rrggbb`
/// strings, darkest first. `complements` is empty unless `with_complements` is set.
#[wasm_bindgen(js_name = extractPalette)]
pub fn extract_palette_js(
    input: Vec<u8>,
    n_colors: usize,
    max_dimension: Option<u32>,
    with_complements: bool,
) -> Result<Object, JsValue> {
    let palette = extract_palette_from_bytes(&input, n_colors, max_dimension, &KMeansConfig::default())
        .map_err(js_error)?;

    let complements: Vec<String> = if with_complements {
        complementary_palette(&palette).into_iter().map(rgb_to_hex).collect()
    } else {
        Vec::new()
    };

    let result = Object::new();
    Reflect::set(&result, &JsValue::from_str("palette"), &hex_array(palette.hex_codes()))?;
    Reflect::set(&result, &JsValue::from_str("complements"), &hex_array(complements))?;

    Ok(result)
}

/// Complement of a single `#rrggbb` color.
#[wasm_bindgen(js_name = complementHex)]
pub fn complement_hex(hex: &str) -> Result<String, JsValue> {
    let rgb = hex_to_rgb(hex).map_err(js_error)?;
    Ok(rgb_to_hex(complement(rgb)))
}
