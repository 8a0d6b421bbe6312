//! One export action end to end: API payload in, named file bytes out.
//!
//! Both the browser surface and the CLI go through [`render_report`], so
//! entity titles, filenames and schema overrides are decided in one place.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::config::ExportConfig;
use crate::entity::{shape_payload, EntityKind, StatusFilter};
use crate::error::Result;
use crate::format::download_filename;
use crate::logo::LogoImage;
use crate::pdf::build_pdf_report_with_style;
use crate::xlsx::{build_spreadsheet_report, XLSX_MIME};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportFormat {
    Pdf,
    Xlsx,
}

impl ReportFormat {
    pub fn parse(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "pdf" => Some(Self::Pdf),
            "xlsx" | "excel" => Some(Self::Xlsx),
            _ => None,
        }
    }

    pub fn mime_type(self) -> &'static str {
        match self {
            Self::Pdf => "application/pdf",
            Self::Xlsx => XLSX_MIME,
        }
    }
}

/// A finished export, ready to be saved or downloaded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedReport {
    pub filename: String,
    pub mime_type: &'static str,
    pub bytes: Vec<u8>,
}

/// Shape `payload` (the API's list JSON) for `kind` and build the report.
///
/// `now` is the wall-clock time printed on the report.
pub fn render_report(
    format: ReportFormat,
    kind: EntityKind,
    payload: &str,
    filter: StatusFilter,
    logo: Option<&LogoImage>,
    config: &ExportConfig,
    now: NaiveDateTime,
) -> Result<RenderedReport> {
    let (pdf_records, sheet_rows) = shape_payload(kind, payload, filter)?;
    let (filename, bytes) = match format {
        ReportFormat::Pdf => (
            kind.pdf_filename().to_string(),
            build_pdf_report_with_style(kind.pdf_title(), logo, &pdf_records, now, &config.pdf)?,
        ),
        ReportFormat::Xlsx => (
            download_filename(kind.sheet_title(), "xlsx"),
            build_spreadsheet_report(
                kind.sheet_title(),
                &config.schema_for(kind),
                &sheet_rows,
                logo,
                now,
            )?,
        ),
    };
    Ok(RenderedReport {
        filename,
        mime_type: format.mime_type(),
        bytes,
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn now() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, 5)
            .and_then(|d| d.and_hms_opt(10, 0, 0))
            .unwrap()
    }

    const DEPARTMENTS: &str = r#"{"response": [
        {"ID_DEPARTAMENTO": 1, "NOMBRE_DEPARTAMENTO": "Bodega", "FECHA_CREACION": "2024-01-02T03:04:05Z", "ESTADO": "A"},
        {"ID_DEPARTAMENTO": 2, "NOMBRE_DEPARTAMENTO": "Archivo", "FECHA_CREACION": null, "ESTADO": "I"}
    ]}"#;

    #[test]
    fn test_xlsx_filename_strips_spaces() {
        let report = render_report(
            ReportFormat::Xlsx,
            EntityKind::EquipmentType,
            "[]",
            StatusFilter::All,
            None,
            &ExportConfig::default(),
            now(),
        )
        .unwrap();
        assert_eq!(report.filename, "TipodeEquipo.xlsx");
        assert_eq!(report.mime_type, XLSX_MIME);
        assert!(!report.bytes.is_empty());
    }

    #[test]
    fn test_pdf_uses_entity_filename() {
        let report = render_report(
            ReportFormat::Pdf,
            EntityKind::Department,
            DEPARTMENTS,
            StatusFilter::Active,
            None,
            &ExportConfig::default(),
            now(),
        )
        .unwrap();
        assert_eq!(report.filename, "departamento.pdf");
        assert!(report.bytes.starts_with(b"%PDF"));
    }

    #[test]
    fn test_bad_payload_is_an_error() {
        let result = render_report(
            ReportFormat::Pdf,
            EntityKind::Inventory,
            "{\"data\": []}",
            StatusFilter::All,
            None,
            &ExportConfig::default(),
            now(),
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_format_parse() {
        assert_eq!(ReportFormat::parse("XLSX"), Some(ReportFormat::Xlsx));
        assert_eq!(ReportFormat::parse("pdf"), Some(ReportFormat::Pdf));
        assert_eq!(ReportFormat::parse("csv"), None);
    }
}
