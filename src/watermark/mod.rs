// Watermark engine - formats metadata, lays out the text block and composites the overlay
mod compositor;
mod error;
mod export;
mod fonts;
mod layout;
mod metadata;
mod surface;
mod types;

pub use compositor::{
    BACKGROUND_COLOR, MAP_SNAPSHOT_OPACITY, MAP_SNAPSHOT_RATIO, TEXT_COLOR, WatermarkCompositor,
    map_snapshot_size, render_watermark,
};
pub use error::WatermarkError;
pub use export::DEFAULT_EXPORT_FILE_NAME;
pub use fonts::FontBook;
pub use layout::{BLOCK_PADDING, LINE_SPACING, TEXT_MARGIN_X, compute_layout};
pub use metadata::{DateTimeFormat, MetadataFormatter, PatternFormat};
pub use surface::{DrawingSurface, RasterSurface};
pub use types::{
    CompositeOutput, CoordinatePair, LayoutResult, MAX_FONT_SIZE_PX, MetadataRecord, StyleConfig,
    WatermarkLines,
};
