//! Spreadsheet report export.
//!
//! [`build_worksheet`] lays the listing out in memory; [`build_spreadsheet_report`]
//! also packages it as XLSX bytes. [`reader::read_workbook`] reads a
//! produced file back for inspection.

pub mod builder;
mod package;
pub mod reader;
mod sheet_writer;
mod styles;
pub mod worksheet;

use chrono::NaiveDateTime;

use crate::error::Result;
use crate::logo::LogoImage;
use crate::types::{ColumnHeaderSpec, ReportRecord, ReportSchema};

pub use builder::{build_worksheet, footer_row, sheet_name};
pub use worksheet::Worksheet;

/// MIME type of the produced workbook.
pub const XLSX_MIME: &str = "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

/// Serialize an already built worksheet.
pub fn write_worksheet(sheet: &Worksheet) -> Result<Vec<u8>> {
    package::write_workbook(sheet)
}

/// Build the report workbook for `records` and return its bytes.
///
/// # Errors
/// Fails when the schema is inconsistent, the title makes an invalid
/// worksheet name, or packaging fails.
pub fn build_spreadsheet_report(
    title: &str,
    schema: &ReportSchema,
    records: &[ReportRecord],
    logo: Option<&LogoImage>,
    printed_at: NaiveDateTime,
) -> Result<Vec<u8>> {
    let sheet = build_worksheet(title, schema, records, logo, printed_at)?;
    let bytes = package::write_workbook(&sheet)?;
    log::info!(
        "spreadsheet report {:?}: {} record(s), {} bytes",
        sheet.name(),
        records.len(),
        bytes.len()
    );
    Ok(bytes)
}

/// Same as [`build_spreadsheet_report`] with header labels placed by the caller.
///
/// Each header relabels the schema column at its position; a header at a
/// position the schema does not fill is an error.
pub fn build_spreadsheet_report_with_headers(
    title: &str,
    schema: &ReportSchema,
    headers: &[ColumnHeaderSpec],
    records: &[ReportRecord],
    logo: Option<&LogoImage>,
    printed_at: NaiveDateTime,
) -> Result<Vec<u8>> {
    let schema = schema.clone().with_headers(headers)?;
    build_spreadsheet_report(title, &schema, records, logo, printed_at)
}
