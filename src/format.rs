//! Display formatting for record fields, report timestamps and filenames.
//!
//! Record dates arrive from the inventory API as ISO-8601 strings and are
//! always rendered from their UTC components. Report timestamps
//! ("generated at", "printed at") are wall-clock values supplied by the
//! caller; nothing in this module reads the system clock.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};

/// Pattern shared by every date shown in a report.
const DISPLAY_PATTERN: &str = "%d/%m/%Y %H:%M:%S";

/// Label that prefixes the spreadsheet footer timestamp.
pub const PRINT_LABEL: &str = "Fecha de Impresión";

/// Label that prefixes the PDF footer timestamp.
pub const GENERATION_LABEL: &str = "Fecha y Hora de Generación";

/// Placeholder used by the inventory listing when a date is missing.
pub const MISSING_DATE: &str = "SIN FECHA";

/// Naive layouts accepted in addition to RFC 3339. All are read as UTC.
const NAIVE_LAYOUTS: [&str; 4] = [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
];

/// Format an API date-time as `DD/MM/YYYY HH:MM:SS` using UTC components.
///
/// Absent, empty or blank input yields an empty string. Input that cannot
/// be read as a date is passed through unchanged (trimmed).
///
/// ```
/// use inventory_reports::format::format_date;
/// assert_eq!(format_date(Some("2024-03-05T14:30:00Z")), "05/03/2024 14:30:00");
/// assert_eq!(format_date(None), "");
/// ```
pub fn format_date(raw: Option<&str>) -> String {
    let Some(raw) = raw.map(str::trim).filter(|s| !s.is_empty()) else {
        return String::new();
    };
    match parse_utc(raw) {
        Some(utc) => utc.format(DISPLAY_PATTERN).to_string(),
        None => {
            log::warn!("unparseable date {raw:?} passed through unformatted");
            raw.to_string()
        }
    }
}

/// Like [`format_date`], but absent or blank input yields `fallback`.
pub fn format_date_or(raw: Option<&str>, fallback: &str) -> String {
    let formatted = format_date(raw);
    if formatted.is_empty() {
        fallback.to_string()
    } else {
        formatted
    }
}

/// Read an API timestamp as a UTC wall-clock value.
pub fn parse_utc(raw: &str) -> Option<NaiveDateTime> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc).naive_utc());
    }
    // Offsets without a colon (`+0000`) are common in older API payloads
    if let Ok(dt) = DateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f%z") {
        return Some(dt.with_timezone(&Utc).naive_utc());
    }
    for layout in NAIVE_LAYOUTS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(raw, layout) {
            return Some(dt);
        }
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}

/// Format a caller-supplied timestamp as `DD/MM/YYYY HH:MM:SS`.
pub fn format_timestamp(at: NaiveDateTime) -> String {
    at.format(DISPLAY_PATTERN).to_string()
}

/// Spreadsheet footer: `Fecha de Impresión: DD/MM/YYYY HH:MM:SS`.
pub fn print_footer(at: NaiveDateTime) -> String {
    format!("{PRINT_LABEL}: {}", format_timestamp(at))
}

/// PDF footer: `Fecha y Hora de Generación: DD/MM/YYYY HH:MM:SS`.
pub fn generation_footer(at: NaiveDateTime) -> String {
    format!("{GENERATION_LABEL}: {}", format_timestamp(at))
}

/// Download filename for a report: the title with all whitespace removed.
///
/// `extension` is given without the leading dot.
pub fn download_filename(title: &str, extension: &str) -> String {
    let stem: String = title.chars().filter(|c| !c.is_whitespace()).collect();
    format!("{stem}.{extension}")
}

/// Worksheet/document heading: `REPORTE DE <TITLE>`.
pub fn report_heading(title: &str) -> String {
    format!("REPORTE DE {}", title.to_uppercase())
}
