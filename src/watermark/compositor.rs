use image::{DynamicImage, Rgba, RgbaImage};
use tracing::{debug, warn};

use super::fonts::FontBook;
use super::layout::compute_layout;
use super::metadata::{DateTimeFormat, MetadataFormatter, PatternFormat};
use super::surface::{DrawingSurface, RasterSurface};
use super::types::{CompositeOutput, LayoutResult, MetadataRecord, StyleConfig, WatermarkLines};
use super::WatermarkError;

/// Share of the shorter image side taken by the map thumbnail.
pub const MAP_SNAPSHOT_RATIO: f64 = 0.2;
pub const MAP_SNAPSHOT_OPACITY: f32 = 0.7;

pub const BACKGROUND_COLOR: Rgba<u8> = Rgba([0, 0, 0, 128]);
pub const TEXT_COLOR: Rgba<u8> = Rgba([255, 255, 255, 255]);

/// Side length of the map thumbnail for an image of the given size.
pub fn map_snapshot_size(width: u32, height: u32) -> u32 {
    (width.min(height) as f64 * MAP_SNAPSHOT_RATIO) as u32
}

/// Burns the location/time watermark into photos.
pub struct WatermarkCompositor<'a, F = PatternFormat> {
    fonts: &'a FontBook,
    formatter: MetadataFormatter<F>,
}

impl<'a> WatermarkCompositor<'a, PatternFormat> {
    pub fn new(fonts: &'a FontBook) -> Self {
        Self::with_formatter(fonts, MetadataFormatter::new(PatternFormat::default()))
    }
}

impl<'a, F: DateTimeFormat> WatermarkCompositor<'a, F> {
    pub fn with_formatter(fonts: &'a FontBook, formatter: MetadataFormatter<F>) -> Self {
        Self { fonts, formatter }
    }

    /// Composite `base`, the optional map thumbnail and the metadata text.
    ///
    /// Neither input image is modified; the result always has `base`'s
    /// dimensions.
    pub fn compose(
        &self,
        base: &DynamicImage,
        map_snapshot: Option<&DynamicImage>,
        metadata: &MetadataRecord,
        style: &StyleConfig,
    ) -> Result<CompositeOutput, WatermarkError> {
        style.validate()?;
        if base.width() == 0 || base.height() == 0 {
            return Err(WatermarkError::EmptyImage {
                width: base.width(),
                height: base.height(),
            });
        }

        let base = base.to_rgba8();
        let map_snapshot = map_snapshot.map(DynamicImage::to_rgba8);
        let lines = self.formatter.format(metadata);

        let mut surface = RasterSurface::new(base.width(), base.height(), self.fonts);
        let layout = render_watermark(&mut surface, &base, map_snapshot.as_ref(), &lines, style);
        debug!(
            "Composited {}x{} image, text block at {:?}",
            base.width(),
            base.height(),
            layout.background_origin()
        );

        Ok(CompositeOutput {
            image: surface.into_image(),
        })
    }
}

/// Draw base image, map thumbnail, text background and text, in that order.
pub fn render_watermark<S: DrawingSurface>(
    surface: &mut S,
    base: &RgbaImage,
    map_snapshot: Option<&RgbaImage>,
    lines: &WatermarkLines,
    style: &StyleConfig,
) -> LayoutResult {
    let (width, height) = base.dimensions();
    surface.draw_image(base, 0, 0, width, height, 1.0);

    if let Some(snapshot) = map_snapshot {
        let size = map_snapshot_size(width, height);
        if size > 0 {
            surface.draw_image(
                snapshot,
                (width - size) as i32,
                (height - size) as i32,
                size,
                size,
                MAP_SNAPSHOT_OPACITY,
            );
        } else {
            debug!("Image too small for a map thumbnail, skipping");
        }
    }

    let layout = compute_layout(lines, style, width, height, |text, style| {
        surface.measure_text(text, style)
    });

    let (block_x, block_y) = layout.background_origin();
    if block_y < 0 {
        warn!(
            "Text block starts {}px above the image top edge and will be clipped",
            -block_y
        );
    }
    surface.fill_rect(
        block_x,
        block_y,
        layout.block_width.ceil() as u32,
        layout.block_height as u32,
        BACKGROUND_COLOR,
    );

    for (index, line) in lines.as_array().into_iter().enumerate() {
        surface.fill_text(line, layout.text_origin_x, layout.baseline(index), style, TEXT_COLOR);
    }

    layout
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_map_snapshot_size() {
        assert_eq!(map_snapshot_size(800, 600), 120);
        assert_eq!(map_snapshot_size(600, 800), 120);
        assert_eq!(map_snapshot_size(1001, 1001), 200);
        assert_eq!(map_snapshot_size(4, 100), 0);
    }
}
