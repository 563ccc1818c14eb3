use chrono::NaiveDateTime;
use image::RgbaImage;

use super::WatermarkError;

/// Largest accepted font size. Keeps the four-line block geometry well
/// inside `i32`.
pub const MAX_FONT_SIZE_PX: u32 = 10_000;

/// A latitude/longitude pair, in degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CoordinatePair {
    pub latitude: f64,
    pub longitude: f64,
}

impl CoordinatePair {
    pub fn new(latitude: f64, longitude: f64) -> Result<Self, WatermarkError> {
        if !latitude.is_finite() || !longitude.is_finite() {
            return Err(WatermarkError::InvalidCoordinates {
                latitude,
                longitude,
            });
        }
        Ok(Self {
            latitude,
            longitude,
        })
    }

    /// `"Lat: 40.4168, Lon: -3.7038"`
    pub fn display(&self) -> String {
        format!(
            "Lat: {:.4}, Lon: {:.4}",
            round_4(self.latitude),
            round_4(self.longitude)
        )
    }

    /// Address text used when no geocoded address exists for the point.
    pub fn fallback_address(&self) -> String {
        format!(
            "Coordenadas: {:.4}, {:.4}",
            round_4(self.latitude),
            round_4(self.longitude)
        )
    }
}

/// Four decimals with ties away from zero; `{:.4}` alone ties to even.
fn round_4(value: f64) -> f64 {
    (value * 1e4).round() / 1e4
}

/// Where and when the photo was taken. Every field may be missing.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MetadataRecord {
    /// Local wall-clock time. `None` means "now".
    pub timestamp: Option<NaiveDateTime>,
    pub address: Option<String>,
    pub coordinates: Option<CoordinatePair>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StyleConfig {
    pub font_family: String,
    pub font_size_px: u32,
}

impl StyleConfig {
    pub fn new(font_family: impl Into<String>, font_size_px: u32) -> Self {
        Self {
            font_family: font_family.into(),
            font_size_px,
        }
    }

    pub fn validate(&self) -> Result<(), WatermarkError> {
        if self.font_size_px == 0 || self.font_size_px > MAX_FONT_SIZE_PX {
            return Err(WatermarkError::InvalidFontSize(self.font_size_px));
        }
        Ok(())
    }
}

impl Default for StyleConfig {
    fn default() -> Self {
        Self {
            font_family: "DejaVu Sans".to_string(),
            font_size_px: 20,
        }
    }
}

/// The four text lines of the watermark, in drawing order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WatermarkLines {
    pub date: String,
    pub time: String,
    pub address: String,
    pub coordinates: String,
}

impl WatermarkLines {
    pub fn as_array(&self) -> [&str; 4] {
        [&self.date, &self.time, &self.address, &self.coordinates]
    }
}

/// Pixel geometry of the text block.
///
/// Origins are signed: on images shorter than four lines the block starts
/// above the top edge and drawing is clipped.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LayoutResult {
    pub line_height: i32,
    pub padding: i32,
    pub text_origin_x: i32,
    pub text_origin_y: i32,
    pub block_width: f32,
    pub block_height: i32,
}

impl LayoutResult {
    /// Top-left corner of the background rectangle.
    pub fn background_origin(&self) -> (i32, i32) {
        (
            self.text_origin_x.saturating_sub(self.padding),
            self.text_origin_y.saturating_sub(self.line_height),
        )
    }

    /// Baseline of line `index` (0 = date, 3 = coordinates).
    pub fn baseline(&self, index: usize) -> i32 {
        self.text_origin_y
            .saturating_add((index as i32).saturating_mul(self.line_height))
    }
}

/// The composited raster, same dimensions as the base photo.
#[derive(Debug, Clone, PartialEq)]
pub struct CompositeOutput {
    pub(super) image: RgbaImage,
}

impl CompositeOutput {
    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    pub fn image(&self) -> &RgbaImage {
        &self.image
    }

    pub fn into_image(self) -> RgbaImage {
        self.image
    }
}
