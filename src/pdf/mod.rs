//! PDF listing export.
//!
//! A listing is a banner (title and optional logo), a "Datos Registrados"
//! caption, a table whose columns are the non-identifier fields of the
//! first record, and a right-aligned generation timestamp at the foot of
//! every page. Long listings continue on further pages with the header
//! row repeated.
//!
//! ```no_run
//! use chrono::Local;
//! use inventory_reports::pdf::build_pdf_report;
//! use inventory_reports::types::ReportRecord;
//!
//! let records = vec![ReportRecord::new()
//!     .with("ID_DEPARTAMENTO", 1_i64, "ID")
//!     .with("NOMBRE_DEPARTAMENTO", "Bodega", "DEPARTAMENTO")];
//! let bytes = build_pdf_report("Departamento", None, &records, Local::now().naive_local())?;
//! # Ok::<(), inventory_reports::error::ExportError>(())
//! ```

mod image;
pub mod layout;
pub mod metrics;
mod writer;

use chrono::NaiveDateTime;

use crate::error::Result;
use crate::logo::LogoImage;
use crate::types::ReportRecord;

pub use layout::{DocumentLayout, PdfStyle, Rgb};

/// Render `records` as a PDF listing with the default style.
pub fn build_pdf_report(
    title: &str,
    logo: Option<&LogoImage>,
    records: &[ReportRecord],
    generated_at: NaiveDateTime,
) -> Result<Vec<u8>> {
    build_pdf_report_with_style(title, logo, records, generated_at, &PdfStyle::default())
}

/// Render `records` as a PDF listing.
///
/// # Errors
/// Fails if the logo cannot be decoded or the document cannot be serialized.
pub fn build_pdf_report_with_style(
    title: &str,
    logo: Option<&LogoImage>,
    records: &[ReportRecord],
    generated_at: NaiveDateTime,
    style: &PdfStyle,
) -> Result<Vec<u8>> {
    let decoded = logo.map(image::decode_logo).transpose()?;
    let layout = DocumentLayout::build(
        title,
        logo.map(|l| (l.width(), l.height())),
        records,
        generated_at,
        style,
    );
    log::info!(
        "PDF report {title:?}: {} record(s), {} page(s)",
        records.len(),
        layout.pages.len()
    );
    writer::write_document(&layout, title, decoded.as_ref(), generated_at)
}
