use ab_glyph::{Font, FontVec, PxScale, ScaleFont};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use super::WatermarkError;

/// Loaded fonts keyed by normalised family name.
///
/// A book always holds its default font, which stands in for any family
/// that isn't loaded (the way a canvas falls back for unknown fonts).
#[derive(Debug)]
pub struct FontBook {
    fonts: HashMap<String, FontVec>,
    default_family: String,
}

impl FontBook {
    /// Build a book holding a single font, which becomes the default.
    pub fn new(family: &str, font: FontVec) -> Self {
        let key = normalize_family(family);
        let mut fonts = HashMap::new();
        fonts.insert(key.clone(), font);
        Self {
            fonts,
            default_family: key,
        }
    }

    /// Load one font file as the default; its family is the file stem.
    pub fn from_file(path: &Path) -> Result<Self, WatermarkError> {
        let font = load_font(path)?;
        Ok(Self::new(&family_from_path(path), font))
    }

    /// Load every `.ttf`/`.otf` file in `dir`.
    ///
    /// `default_family` picks the fallback font; if it isn't among the loaded
    /// files the alphabetically first family is used instead.
    pub fn from_directory(dir: &Path, default_family: &str) -> Result<Self, WatermarkError> {
        let mut paths: Vec<PathBuf> = std::fs::read_dir(dir)?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| is_font_file(path))
            .collect();
        paths.sort();

        let mut fonts = HashMap::new();
        for path in &paths {
            match load_font(path) {
                Ok(font) => {
                    debug!("Loaded font {:?}", path);
                    fonts.insert(normalize_family(&family_from_path(path)), font);
                }
                Err(e) => warn!("Skipping font {:?}: {}", path, e),
            }
        }

        let requested = normalize_family(default_family);
        let default_family = if fonts.contains_key(&requested) {
            requested
        } else {
            let mut families: Vec<&String> = fonts.keys().collect();
            families.sort();
            match families.first() {
                Some(first) => {
                    warn!(
                        "Default font family '{}' not found in {:?}, using '{}'",
                        default_family, dir, first
                    );
                    (*first).clone()
                }
                None => return Err(WatermarkError::NoFonts(dir.to_path_buf())),
            }
        };

        info!("Loaded {} font(s) from {:?}", fonts.len(), dir);
        Ok(Self {
            fonts,
            default_family,
        })
    }

    pub fn default_family(&self) -> &str {
        &self.default_family
    }

    pub fn contains(&self, family: &str) -> bool {
        self.fonts.contains_key(&normalize_family(family))
    }

    /// Families in sorted order.
    pub fn families(&self) -> Vec<&str> {
        let mut families: Vec<&str> = self.fonts.keys().map(String::as_str).collect();
        families.sort_unstable();
        families
    }

    /// The font for `family`, or the default font.
    pub fn resolve(&self, family: &str) -> &FontVec {
        if let Some(font) = self.fonts.get(&normalize_family(family)) {
            return font;
        }
        debug!(
            "Font family '{}' not loaded, falling back to '{}'",
            family, self.default_family
        );
        &self.fonts[&self.default_family]
    }
}

/// Scale at which the font's em square is `size_px` pixels, as CSS sizes fonts.
pub fn em_scale(font: &FontVec, size_px: f32) -> PxScale {
    match font.units_per_em() {
        Some(units_per_em) => PxScale::from(size_px * font.height_unscaled() / units_per_em),
        None => PxScale::from(size_px),
    }
}

/// Horizontal advance of `text`, kerning included.
pub fn advance_width(font: &FontVec, scale: PxScale, text: &str) -> f32 {
    let scaled = font.as_scaled(scale);
    let mut width = 0.0;
    let mut previous = None;
    for c in text.chars() {
        let id = scaled.glyph_id(c);
        if let Some(prev) = previous {
            width += scaled.kern(prev, id);
        }
        width += scaled.h_advance(id);
        previous = Some(id);
    }
    width
}

fn load_font(path: &Path) -> Result<FontVec, WatermarkError> {
    let data = std::fs::read(path)?;
    FontVec::try_from_vec(data).map_err(|_| WatermarkError::FontParse(path.to_path_buf()))
}

fn is_font_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.eq_ignore_ascii_case("ttf") || ext.eq_ignore_ascii_case("otf"))
        .unwrap_or(false)
}

fn family_from_path(path: &Path) -> String {
    path.file_stem()
        .and_then(|stem| stem.to_str())
        .unwrap_or_default()
        .to_string()
}

/// `"DejaVu Sans"`, `"dejavu-sans"` and `"DejaVuSans"` all map to `"dejavusans"`.
fn normalize_family(family: &str) -> String {
    family
        .chars()
        .filter(|c| !matches!(c, ' ' | '-' | '_' | '"' | '\''))
        .flat_map(char::to_lowercase)
        .collect()
}
