use super::types::{LayoutResult, StyleConfig, WatermarkLines};

/// Extra spacing added to the font size to get the line height.
pub const LINE_SPACING: i32 = 10;
/// Padding between the text and the edge of the background block.
pub const BLOCK_PADDING: i32 = 10;
/// Left margin of the text.
pub const TEXT_MARGIN_X: i32 = 20;

const LINE_COUNT: i32 = 4;

/// Compute the text block geometry for a canvas.
///
/// The block is anchored to the bottom of the canvas and grows upward.
/// `measure` must use the same font the text will be drawn with.
pub fn compute_layout<M>(
    lines: &WatermarkLines,
    style: &StyleConfig,
    _canvas_width: u32,
    canvas_height: u32,
    measure: M,
) -> LayoutResult
where
    M: Fn(&str, &StyleConfig) -> f32,
{
    // Sizes are not validated here, so the arithmetic saturates.
    let line_height = i32::try_from(style.font_size_px)
        .unwrap_or(i32::MAX)
        .saturating_add(LINE_SPACING);
    let padding = BLOCK_PADDING;
    let text_height = LINE_COUNT.saturating_mul(line_height);
    let text_origin_y = i32::try_from(canvas_height)
        .unwrap_or(i32::MAX)
        .saturating_sub(text_height);

    let max_width = lines
        .as_array()
        .into_iter()
        .map(|line| measure(line, style))
        .fold(0.0f32, f32::max);

    LayoutResult {
        line_height,
        padding,
        text_origin_x: TEXT_MARGIN_X,
        text_origin_y,
        block_width: max_width + 2.0 * padding as f32,
        block_height: text_height.saturating_add(2 * padding),
    }
}
