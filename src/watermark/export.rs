use image::{DynamicImage, ImageFormat};
use std::io::Cursor;
use std::path::Path;
use tracing::debug;

use super::WatermarkError;
use super::types::CompositeOutput;

pub const DEFAULT_EXPORT_FILE_NAME: &str = "gps_photo_watermark.png";

impl CompositeOutput {
    /// Encode as PNG, keeping the alpha channel.
    pub fn to_png_bytes(&self) -> Result<Vec<u8>, WatermarkError> {
        let mut buffer = Cursor::new(Vec::new());
        DynamicImage::ImageRgba8(self.image.clone()).write_to(&mut buffer, ImageFormat::Png)?;
        Ok(buffer.into_inner())
    }

    pub fn save_png(&self, path: &Path) -> Result<(), WatermarkError> {
        let bytes = self.to_png_bytes()?;
        std::fs::write(path, &bytes)?;
        debug!("Wrote {} bytes to {:?}", bytes.len(), path);
        Ok(())
    }
}
