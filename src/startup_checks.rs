use crate::Config;
use crate::watermark::{FontBook, WatermarkError};
use std::path::Path;
use thiserror::Error;
use tracing::{error, info, warn};

#[derive(Debug, Error)]
pub enum StartupCheckError {
    #[error("Failed to create output directory: {0}")]
    OutputDirectoryCreationFailed(#[from] std::io::Error),

    #[error("Fonts directory does not exist: {0}")]
    FontsDirectoryMissing(String),

    #[error("Fonts could not be loaded: {0}")]
    FontsUnusable(#[source] WatermarkError),

    #[error("Input file missing: {0}")]
    InputFileMissing(String),
}

/// Check the fonts directory, the input photo and the output location.
///
/// On success returns the font book loaded from `fonts_directory`, with the
/// configured family as its default. Missing output directories are
/// created. A default font family that isn't installed only warns, since
/// the font book falls back.
pub async fn perform_startup_checks(
    config: &Config,
    input: Option<&Path>,
    output: Option<&Path>,
) -> Result<FontBook, Vec<StartupCheckError>> {
    let mut errors = Vec::new();
    let mut fonts = None;

    info!("Performing startup checks...");

    let fonts_dir = &config.watermark.fonts_directory;
    if !fonts_dir.exists() {
        error!("Fonts directory does not exist: {:?}", fonts_dir);
        errors.push(StartupCheckError::FontsDirectoryMissing(
            fonts_dir.display().to_string(),
        ));
    } else {
        info!("Fonts directory exists: {:?}", fonts_dir);
        match FontBook::from_directory(fonts_dir, &config.watermark.font_family) {
            Ok(book) => {
                if book.contains(&config.watermark.font_family) {
                    info!("Font family '{}' available", config.watermark.font_family);
                } else {
                    warn!(
                        "Font family '{}' not installed, text will use '{}'",
                        config.watermark.font_family,
                        book.default_family()
                    );
                }
                fonts = Some(book);
            }
            Err(e) => {
                error!("Fonts in {:?} are unusable: {}", fonts_dir, e);
                errors.push(StartupCheckError::FontsUnusable(e));
            }
        }
    }

    if let Some(input) = input {
        if input.exists() {
            info!("Input photo found: {:?}", input);
        } else {
            error!("Input photo does not exist: {:?}", input);
            errors.push(StartupCheckError::InputFileMissing(
                input.display().to_string(),
            ));
        }
    }

    if let Some(parent) = output.and_then(Path::parent)
        && !parent.as_os_str().is_empty()
        && !parent.exists()
    {
        info!("Output directory does not exist, creating: {:?}", parent);
        if let Err(e) = tokio::fs::create_dir_all(parent).await {
            error!("Failed to create output directory {:?}: {}", parent, e);
            errors.push(StartupCheckError::OutputDirectoryCreationFailed(e));
        }
    }

    match fonts {
        Some(fonts) if errors.is_empty() => {
            info!("All startup checks passed");
            Ok(fonts)
        }
        _ => {
            error!("Startup checks failed with {} errors", errors.len());
            Err(errors)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use tempfile::TempDir;

    fn config_with_fonts(dir: &Path) -> Config {
        let mut config = Config::default();
        config.watermark.fonts_directory = dir.to_path_buf();
        config
    }

    fn bundled_fonts() -> PathBuf {
        Path::new(env!("CARGO_MANIFEST_DIR")).join("static")
    }

    #[tokio::test]
    async fn test_checks_pass_with_bundled_fonts() {
        let config = config_with_fonts(&bundled_fonts());
        let fonts = perform_startup_checks(&config, None, None).await.unwrap();
        assert!(fonts.contains("DejaVu Sans"));
    }

    #[tokio::test]
    async fn test_unknown_family_resolves_to_configured_default() {
        let temp_dir = TempDir::new().unwrap();
        let bundled = bundled_fonts().join("DejaVuSans.ttf");
        // Sorts ahead of DejaVuSans, so it would win an alphabetical fallback
        std::fs::copy(&bundled, temp_dir.path().join("AaaSans.ttf")).unwrap();
        std::fs::copy(&bundled, temp_dir.path().join("DejaVuSans.ttf")).unwrap();

        let config = config_with_fonts(temp_dir.path());
        let fonts = perform_startup_checks(&config, None, None).await.unwrap();

        assert_eq!(fonts.families(), vec!["aaasans", "dejavusans"]);
        assert_eq!(fonts.default_family(), "dejavusans");
        assert!(std::ptr::eq(
            fonts.resolve("DejaVu Sans"),
            fonts.resolve("Comic Sans")
        ));
    }

    #[tokio::test]
    async fn test_missing_fonts_directory() {
        let temp_dir = TempDir::new().unwrap();
        let config = config_with_fonts(&temp_dir.path().join("nope"));

        let errors = perform_startup_checks(&config, None, None)
            .await
            .unwrap_err();
        assert_eq!(errors.len(), 1);
        assert!(matches!(
            errors[0],
            StartupCheckError::FontsDirectoryMissing(_)
        ));
    }

    #[tokio::test]
    async fn test_empty_fonts_directory() {
        let temp_dir = TempDir::new().unwrap();
        let config = config_with_fonts(temp_dir.path());

        let errors = perform_startup_checks(&config, None, None)
            .await
            .unwrap_err();
        assert!(matches!(
            errors[0],
            StartupCheckError::FontsUnusable(WatermarkError::NoFonts(_))
        ));
    }

    #[tokio::test]
    async fn test_missing_input_and_output_creation() {
        let temp_dir = TempDir::new().unwrap();
        let config = config_with_fonts(&bundled_fonts());
        let input = temp_dir.path().join("photo.jpg");
        let output = temp_dir.path().join("out/nested/stamped.png");

        let errors = perform_startup_checks(&config, Some(&input), Some(&output))
            .await
            .unwrap_err();
        assert_eq!(errors.len(), 1);
        assert!(matches!(errors[0], StartupCheckError::InputFileMissing(_)));
        assert!(temp_dir.path().join("out/nested").is_dir());
    }
}
