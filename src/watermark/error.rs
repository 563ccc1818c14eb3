use std::path::PathBuf;
use thiserror::Error;

use super::types::MAX_FONT_SIZE_PX;

#[derive(Debug, Error)]
pub enum WatermarkError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Image error: {0}")]
    ImageError(#[from] image::ImageError),

    #[error("Invalid font size: {0}px (must be between 1 and {max}px)", max = MAX_FONT_SIZE_PX)]
    InvalidFontSize(u32),

    #[error("Invalid date/time pattern: {0:?}")]
    InvalidPattern(String),

    #[error("Base image has no pixels ({width}x{height})")]
    EmptyImage { width: u32, height: u32 },

    #[error("Invalid coordinates: lat {latitude}, lon {longitude}")]
    InvalidCoordinates { latitude: f64, longitude: f64 },

    #[error("Failed to parse font: {0:?}")]
    FontParse(PathBuf),

    #[error("No fonts found in {0:?}")]
    NoFonts(PathBuf),
}
