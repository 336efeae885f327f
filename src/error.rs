//! Error types for palette extraction.

use thiserror::Error;

/// Errors reported by the clustering engine, the color transforms and the
/// image source.
#[derive(Debug, Error)]
pub enum PaletteError {
    /// A parameter is outside its accepted range.
    #[error("Invalid argument: {message}")]
    InvalidArgument {
        /// Description of what's wrong with the parameter
        message: String,
    },

    /// No pixel samples were supplied.
    #[error("No pixel samples to cluster")]
    EmptyInput,

    /// A hex color string is not six hexadecimal digits.
    #[error("Invalid hex color {input:?}: expected 6 hexadecimal digits")]
    Format {
        /// The string as received
        input: String,
    },

    /// The image bytes could not be decoded.
    #[error("Unable to decode image: {0}")]
    Decode(#[from] image::ImageError),
}

impl PaletteError {
    /// Create an InvalidArgument error.
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            message: message.into(),
        }
    }

    /// Create a Format error.
    pub fn format(input: impl Into<String>) -> Self {
        Self::Format {
            input: input.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, PaletteError>;
