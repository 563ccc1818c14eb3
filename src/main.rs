use chrono::NaiveDateTime;
use clap::{Args, Parser, Subcommand};
use image::DynamicImage;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{Level, info, warn};
use tracing_subscriber::FmtSubscriber;

use geostamp::{
    Config, startup_checks,
    watermark::{
        CoordinatePair, FontBook, MetadataFormatter, MetadataRecord, StyleConfig,
        WatermarkCompositor,
    },
};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Global options that apply to all commands
    #[arg(short, long, default_value = "config.toml", global = true)]
    config: PathBuf,

    /// Overrides `app.log_level` from the config file
    #[arg(short, long, global = true)]
    log_level: Option<String>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Stamp a photo with date, time, address, coordinates and a map thumbnail
    Compose(ComposeArgs),
    /// Verify fonts and configuration without composing anything
    Check,
}

#[derive(Args, Debug)]
struct ComposeArgs {
    /// Photo to stamp
    #[arg(short, long)]
    input: PathBuf,

    /// Where to write the PNG (defaults to `export.file_name`)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Map view snapshot drawn in the bottom-right corner
    #[arg(short, long)]
    map: Option<PathBuf>,

    /// Address line text
    #[arg(short, long, conflicts_with = "address_from_coordinates")]
    address: Option<String>,

    /// Use the coordinates as the address text
    #[arg(long, requires = "lat")]
    address_from_coordinates: bool,

    #[arg(long, requires = "lon", allow_negative_numbers = true)]
    lat: Option<f64>,

    #[arg(long, requires = "lat", allow_negative_numbers = true)]
    lon: Option<f64>,

    /// Local date and time, e.g. 2024-05-01T10:30 (defaults to now)
    #[arg(short, long, value_parser = parse_timestamp)]
    datetime: Option<NaiveDateTime>,

    #[arg(long)]
    font_family: Option<String>,

    #[arg(long)]
    font_size: Option<u32>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let (config, config_found) = load_config(&cli.config)?;

    // Set up logging first
    let level_name = cli.log_level.as_deref().unwrap_or(&config.app.log_level);
    let level = match level_name.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = FmtSubscriber::builder().with_max_level(level).finish();
    tracing::subscriber::set_global_default(subscriber)?;

    if config_found {
        info!("Configuration loaded from: {:?}", cli.config);
    } else {
        info!("Config file not found at {:?}, using defaults", cli.config);
    }

    match cli.command {
        Commands::Compose(args) => run_compose(config, args).await,
        Commands::Check => {
            let fonts = run_checks(&config, None, None).await?;
            info!(
                "Fonts available: {} (default '{}')",
                fonts.families().join(", "),
                fonts.default_family()
            );
            Ok(())
        }
    }
}

fn load_config(path: &Path) -> Result<(Config, bool), Box<dyn std::error::Error>> {
    if path.exists() {
        let content = std::fs::read_to_string(path)?;
        Ok((Config::from_toml_str(&content)?, true))
    } else {
        Ok((Config::default(), false))
    }
}

async fn run_checks(
    config: &Config,
    input: Option<&Path>,
    output: Option<&Path>,
) -> Result<FontBook, Box<dyn std::error::Error>> {
    match startup_checks::perform_startup_checks(config, input, output).await {
        Ok(fonts) => Ok(fonts),
        Err(errors) => {
            for error in &errors {
                tracing::error!("Startup check failed: {}", error);
            }
            Err(format!("{} startup check(s) failed", errors.len()).into())
        }
    }
}

async fn run_compose(config: Config, args: ComposeArgs) -> Result<(), Box<dyn std::error::Error>> {
    let output = args
        .output
        .clone()
        .unwrap_or_else(|| PathBuf::from(&config.export.file_name));

    let fonts = run_checks(&config, Some(&args.input), Some(&output)).await?;

    let style = StyleConfig::new(
        args.font_family
            .clone()
            .unwrap_or_else(|| config.watermark.font_family.clone()),
        args.font_size.unwrap_or(config.watermark.font_size_px),
    );
    style.validate()?;

    let coordinates = match (args.lat, args.lon) {
        (Some(lat), Some(lon)) => Some(CoordinatePair::new(lat, lon)?),
        _ => None,
    };
    let address = if args.address_from_coordinates {
        coordinates.as_ref().map(CoordinatePair::fallback_address)
    } else {
        args.address.clone()
    };
    let metadata = MetadataRecord {
        timestamp: args.datetime,
        address,
        coordinates,
    };

    let photo_bytes = tokio::fs::read(&args.input).await?;
    let base = tokio::task::spawn_blocking(move || image::load_from_memory(&photo_bytes)).await??;
    info!(
        "Loaded {:?} ({}x{})",
        args.input,
        base.width(),
        base.height()
    );

    let map_snapshot = match &args.map {
        Some(path) => {
            acquire_map_snapshot(path, Duration::from_millis(config.map.snapshot_timeout_ms))
                .await
        }
        None => None,
    };

    let format = config.watermark.date_time_format();
    let output_path = output.clone();
    tokio::task::spawn_blocking(move || -> Result<(), geostamp::watermark::WatermarkError> {
        let compositor =
            WatermarkCompositor::with_formatter(&fonts, MetadataFormatter::new(format));
        let composite = compositor.compose(&base, map_snapshot.as_ref(), &metadata, &style)?;
        composite.save_png(&output_path)
    })
    .await??;

    info!("Watermarked photo written to {:?}", output);
    Ok(())
}

/// Load the map snapshot, or `None` if it can't be had in time.
///
/// A missing map only drops the thumbnail from the watermark, so every
/// failure here is logged and swallowed.
async fn acquire_map_snapshot(path: &Path, timeout: Duration) -> Option<DynamicImage> {
    let bytes = match tokio::time::timeout(timeout, tokio::fs::read(path)).await {
        Ok(Ok(bytes)) => bytes,
        Ok(Err(e)) => {
            warn!("Could not read map snapshot {:?}: {}", path, e);
            return None;
        }
        Err(_) => {
            warn!(
                "Timed out after {:?} reading map snapshot {:?}",
                timeout, path
            );
            return None;
        }
    };

    match tokio::task::spawn_blocking(move || image::load_from_memory(&bytes)).await {
        Ok(Ok(snapshot)) => {
            info!(
                "Map snapshot {:?} ({}x{})",
                path,
                snapshot.width(),
                snapshot.height()
            );
            Some(snapshot)
        }
        Ok(Err(e)) => {
            warn!("Could not decode map snapshot {:?}: {}", path, e);
            None
        }
        Err(e) => {
            warn!("Map snapshot decoding task failed: {}", e);
            None
        }
    }
}

fn parse_timestamp(value: &str) -> Result<NaiveDateTime, String> {
    ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M:%S", "%Y-%m-%d %H:%M"]
        .iter()
        .find_map(|pattern| NaiveDateTime::parse_from_str(value, pattern).ok())
        .ok_or_else(|| format!("invalid date/time '{}', expected e.g. 2024-05-01T10:30", value))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_parse_timestamp() {
        let expected = NaiveDate::from_ymd_opt(2024, 5, 1)
            .unwrap()
            .and_hms_opt(10, 30, 0)
            .unwrap();
        assert_eq!(parse_timestamp("2024-05-01T10:30"), Ok(expected));
        assert_eq!(parse_timestamp("2024-05-01T10:30:00"), Ok(expected));
        assert_eq!(parse_timestamp("2024-05-01 10:30"), Ok(expected));
        assert!(parse_timestamp("01/05/2024").is_err());
    }

    #[test]
    fn test_cli_parses_compose() {
        let cli = Cli::try_parse_from([
            "geostamp",
            "compose",
            "--input",
            "photo.jpg",
            "--lat",
            "40.4168",
            "--lon",
            "-3.7038",
            "--address-from-coordinates",
        ])
        .unwrap();

        match cli.command {
            Commands::Compose(args) => {
                assert_eq!(args.lat, Some(40.4168));
                assert_eq!(args.lon, Some(-3.7038));
                assert!(args.address_from_coordinates);
                assert!(args.map.is_none());
            }
            Commands::Check => panic!("expected compose"),
        }
    }

    #[test]
    fn test_cli_requires_both_coordinates() {
        let result = Cli::try_parse_from(["geostamp", "compose", "--input", "p.jpg", "--lat", "1"]);
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_missing_map_snapshot_is_none() {
        let snapshot =
            acquire_map_snapshot(Path::new("does/not/exist.png"), Duration::from_secs(1)).await;
        assert!(snapshot.is_none());
    }
}
