use chrono::format::{Item, StrftimeItems};
use chrono::{Local, NaiveDateTime};
use std::fmt::Write;
use tracing::warn;

use super::WatermarkError;
use super::types::{MetadataRecord, WatermarkLines};

const UNSPECIFIED_ADDRESS: &str = "Ubicación no especificada";
const COORDINATES_UNAVAILABLE: &str = "Coordenadas no disponibles";

/// Renders the date and time parts of a timestamp.
pub trait DateTimeFormat {
    fn format_date(&self, timestamp: &NaiveDateTime) -> String;
    fn format_time(&self, timestamp: &NaiveDateTime) -> String;
}

/// strftime-style patterns, defaulting to day/month/year ordering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatternFormat {
    pub date_pattern: String,
    pub time_pattern: String,
}

impl PatternFormat {
    pub fn new(date_pattern: impl Into<String>, time_pattern: impl Into<String>) -> Self {
        Self {
            date_pattern: date_pattern.into(),
            time_pattern: time_pattern.into(),
        }
    }

    /// Reject patterns chrono can't render, e.g. `%Q`.
    pub fn validate(&self) -> Result<(), WatermarkError> {
        for pattern in [&self.date_pattern, &self.time_pattern] {
            if StrftimeItems::new(pattern).any(|item| matches!(item, Item::Error)) {
                return Err(WatermarkError::InvalidPattern(pattern.clone()));
            }
        }
        Ok(())
    }
}

const DEFAULT_DATE_PATTERN: &str = "%d/%m/%Y";
const DEFAULT_TIME_PATTERN: &str = "%H:%M:%S";

impl Default for PatternFormat {
    fn default() -> Self {
        Self::new(DEFAULT_DATE_PATTERN, DEFAULT_TIME_PATTERN)
    }
}

impl DateTimeFormat for PatternFormat {
    fn format_date(&self, timestamp: &NaiveDateTime) -> String {
        render(timestamp, &self.date_pattern, DEFAULT_DATE_PATTERN)
    }

    fn format_time(&self, timestamp: &NaiveDateTime) -> String {
        render(timestamp, &self.time_pattern, DEFAULT_TIME_PATTERN)
    }
}

/// Render with `pattern`, or with `fallback` if `pattern` is malformed.
fn render(timestamp: &NaiveDateTime, pattern: &str, fallback: &str) -> String {
    let mut out = String::new();
    if write!(out, "{}", timestamp.format(pattern)).is_ok() {
        return out;
    }
    warn!("Invalid date/time pattern {:?}, using {:?}", pattern, fallback);
    out.clear();
    // The fallbacks are the default patterns, which always render.
    let _ = write!(out, "{}", timestamp.format(fallback));
    out
}

/// Turns a metadata record into the watermark's display lines.
#[derive(Debug, Clone, Default)]
pub struct MetadataFormatter<F = PatternFormat> {
    format: F,
}

impl<F: DateTimeFormat> MetadataFormatter<F> {
    pub fn new(format: F) -> Self {
        Self { format }
    }

    pub fn format(&self, record: &MetadataRecord) -> WatermarkLines {
        self.format_at(record, Local::now().naive_local())
    }

    /// Same as [`format`](Self::format) with an explicit "now" for records
    /// that carry no timestamp.
    pub fn format_at(&self, record: &MetadataRecord, now: NaiveDateTime) -> WatermarkLines {
        let timestamp = record.timestamp.unwrap_or(now);

        let address = record
            .address
            .as_deref()
            .filter(|a| !a.trim().is_empty())
            .unwrap_or(UNSPECIFIED_ADDRESS);

        let coordinates = match &record.coordinates {
            Some(coords) => format!("Coordenadas: {}", coords.display()),
            None => COORDINATES_UNAVAILABLE.to_string(),
        };

        WatermarkLines {
            date: format!("Fecha: {}", self.format.format_date(&timestamp)),
            time: format!("Hora: {}", self.format.format_time(&timestamp)),
            address: format!("Dirección: {}", address),
            coordinates,
        }
    }
}
