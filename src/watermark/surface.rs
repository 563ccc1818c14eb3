use ab_glyph::{Font, ScaleFont};
use image::{Rgba, RgbaImage, imageops::FilterType};
use imageproc::drawing::{Blend, draw_filled_rect_mut, draw_text_mut};
use imageproc::rect::Rect;
use std::borrow::Cow;

use super::fonts::{FontBook, advance_width, em_scale};
use super::types::StyleConfig;

/// Drawing operations the compositor needs from a target.
///
/// Coordinates are in surface pixels and may fall partly or wholly outside
/// the surface; implementations clip.
pub trait DrawingSurface {
    fn width(&self) -> u32;
    fn height(&self) -> u32;

    /// Draw `image` scaled to `width`x`height` with its top-left at `(x, y)`,
    /// its alpha multiplied by `opacity`.
    fn draw_image(
        &mut self,
        image: &RgbaImage,
        x: i32,
        y: i32,
        width: u32,
        height: u32,
        opacity: f32,
    );

    /// Alpha-blend a solid rectangle.
    fn fill_rect(&mut self, x: i32, y: i32, width: u32, height: u32, color: Rgba<u8>);

    /// Draw `text` with its alphabetic baseline at `baseline_y`.
    fn fill_text(&mut self, text: &str, x: i32, baseline_y: i32, style: &StyleConfig, color: Rgba<u8>);

    /// Advance width of `text` when drawn with `style`.
    fn measure_text(&self, text: &str, style: &StyleConfig) -> f32;
}

/// In-memory RGBA target. Starts fully transparent.
pub struct RasterSurface<'a> {
    canvas: Blend<RgbaImage>,
    fonts: &'a FontBook,
}

impl<'a> RasterSurface<'a> {
    pub fn new(width: u32, height: u32, fonts: &'a FontBook) -> Self {
        Self {
            canvas: Blend(RgbaImage::new(width, height)),
            fonts,
        }
    }

    pub fn into_image(self) -> RgbaImage {
        self.canvas.0
    }
}

impl DrawingSurface for RasterSurface<'_> {
    fn width(&self) -> u32 {
        self.canvas.0.width()
    }

    fn height(&self) -> u32 {
        self.canvas.0.height()
    }

    fn draw_image(
        &mut self,
        image: &RgbaImage,
        x: i32,
        y: i32,
        width: u32,
        height: u32,
        opacity: f32,
    ) {
        if width == 0 || height == 0 {
            return;
        }

        let mut layer = if image.dimensions() == (width, height) {
            Cow::Borrowed(image)
        } else {
            Cow::Owned(image::imageops::resize(
                image,
                width,
                height,
                FilterType::Triangle,
            ))
        };

        let opacity = opacity.clamp(0.0, 1.0);
        if opacity < 1.0 {
            for pixel in layer.to_mut().pixels_mut() {
                pixel[3] = (pixel[3] as f32 * opacity).round() as u8;
            }
        }

        image::imageops::overlay(&mut self.canvas.0, &*layer, x as i64, y as i64);
    }

    fn fill_rect(&mut self, x: i32, y: i32, width: u32, height: u32, color: Rgba<u8>) {
        if width == 0 || height == 0 {
            return;
        }
        draw_filled_rect_mut(
            &mut self.canvas,
            Rect::at(x, y).of_size(width, height),
            color,
        );
    }

    fn fill_text(&mut self, text: &str, x: i32, baseline_y: i32, style: &StyleConfig, color: Rgba<u8>) {
        let font = self.fonts.resolve(&style.font_family);
        let scale = em_scale(font, style.font_size_px as f32);
        let ascent = font.as_scaled(scale).ascent();
        let top = baseline_y - ascent.round() as i32;
        draw_text_mut(&mut self.canvas.0, color, x, top, scale, font, text);
    }

    fn measure_text(&self, text: &str, style: &StyleConfig) -> f32 {
        let font = self.fonts.resolve(&style.font_family);
        advance_width(font, em_scale(font, style.font_size_px as f32), text)
    }
}
