//! Lay a listing out on a worksheet.
//!
//! Row map: the logo and merged title sit on rows 1..=3, column headers
//! on row 4 (frozen above), data from row 5, a closing rule under the
//! last data row and the print timestamp three rows after the data.

use chrono::NaiveDateTime;

use crate::error::{ExportError, Result};
use crate::format::{print_footer, report_heading};
use crate::logo::LogoImage;
use crate::types::{ColumnStyle, ReportRecord, ReportSchema};

use super::worksheet::{
    BorderSides, CellStyle, CellValue, Color, FontStyle, HAlign, ImageAnchor, MergeRange, VAlign,
    Worksheet,
};

pub const TITLE_ROW: u32 = 1;
pub const HEADER_ROW: u32 = 4;
pub const FIRST_DATA_ROW: u32 = 5;
/// Rows between the end of the data and the footer.
pub const FOOTER_GAP: u32 = 3;

/// Status label that turns its cell red.
pub const INACTIVE_LABEL: &str = "INACTIVO";

/// Longest worksheet name Excel accepts.
pub const MAX_SHEET_NAME: usize = 31;

const FORBIDDEN_NAME_CHARS: [char; 7] = ['[', ']', ':', '*', '?', '/', '\\'];

/// Logo size on the sheet, in pixels.
const LOGO_PX: u32 = 350;

/// Row where the print timestamp goes for `records` data rows.
pub fn footer_row(records: usize) -> u32 {
    FIRST_DATA_ROW + u32::try_from(records).unwrap_or(u32::MAX - FIRST_DATA_ROW - FOOTER_GAP) + FOOTER_GAP
}

/// `"REPORTE DE <TITLE>"`, checked against Excel's sheet name rules.
pub fn sheet_name(title: &str) -> Result<String> {
    let name = report_heading(title.trim());
    if let Some(bad) = name.chars().find(|c| FORBIDDEN_NAME_CHARS.contains(c)) {
        return Err(ExportError::SheetName(format!(
            "{name:?} contains {bad:?}, which worksheet names cannot hold"
        )));
    }
    if name.chars().count() > MAX_SHEET_NAME {
        let truncated: String = name.chars().take(MAX_SHEET_NAME).collect();
        let truncated = truncated.trim_end().to_string();
        log::warn!("worksheet name {name:?} is too long, using {truncated:?}");
        return Ok(truncated);
    }
    Ok(name)
}

fn title_style() -> CellStyle {
    CellStyle {
        font: FontStyle {
            bold: true,
            size: 20,
            color: None,
        },
        horizontal: HAlign::Left,
        ..CellStyle::default()
    }
}

fn header_style() -> CellStyle {
    CellStyle {
        font: FontStyle {
            bold: true,
            size: 17,
            color: Some(Color::WHITE),
        },
        fill: Some(Color::BLACK),
        border: BorderSides::BOX,
        horizontal: HAlign::Center,
        vertical: VAlign::Center,
    }
}

fn inactive_style() -> CellStyle {
    CellStyle {
        font: FontStyle {
            color: Some(Color::RED),
            ..FontStyle::default()
        },
        ..CellStyle::default()
    }
}

/// Build the report worksheet for `records` under `schema`.
///
/// Records are read by the schema's keys; a missing key leaves its cell
/// empty. `printed_at` is the wall-clock time shown in the footer.
pub fn build_worksheet(
    title: &str,
    schema: &ReportSchema,
    records: &[ReportRecord],
    logo: Option<&LogoImage>,
    printed_at: NaiveDateTime,
) -> Result<Worksheet> {
    schema.validate()?;
    let heading = report_heading(title.trim());
    let mut sheet = Worksheet::new(sheet_name(title)?);

    for column in &schema.columns {
        sheet.set_column_width(column.column, column.width);
    }
    for extra in &schema.extra_widths {
        sheet.set_column_width(extra.column, extra.width);
    }

    if let Some(logo) = logo {
        sheet.set_image(ImageAnchor {
            image: logo.clone(),
            from: (0, 0),
            to: (1, 3),
            width_px: LOGO_PX,
            height_px: LOGO_PX,
        });
    }
    sheet.set_value(2, TITLE_ROW, format!(" {heading} "));
    sheet.cell_mut(2, TITLE_ROW).style = title_style();
    if schema.title_span_end > 2 {
        sheet.merge(MergeRange::row_span(TITLE_ROW, 2, schema.title_span_end));
    }

    sheet.freeze_rows(HEADER_ROW);

    for header in schema.headers() {
        let cell = sheet.cell_mut(header.position, HEADER_ROW);
        cell.value = CellValue::Text(header.value);
        cell.style = header_style();
    }

    let mut row = FIRST_DATA_ROW;
    for record in records {
        for column in &schema.columns {
            let value = CellValue::from(record.value(&column.key));
            let inactive = column.style == ColumnStyle::Status
                && value.as_text() == Some(INACTIVE_LABEL);
            let cell = sheet.cell_mut(column.column, row);
            cell.value = value;
            if inactive {
                cell.style = inactive_style();
            }
        }
        for &column in &schema.right_border_columns {
            sheet.cell_mut(column, row).style.border = BorderSides::RIGHT;
        }
        row += 1;
    }

    // Closing rule under the last written row (the header row when empty)
    let last_row = row - 1;
    let ruled: Vec<u32> = sheet
        .row(last_row)
        .map(|(col, _)| col)
        .filter(|&col| col != 1)
        .collect();
    for col in ruled {
        sheet.cell_mut(col, last_row + 1).style.border = BorderSides::TOP;
    }

    let footer = footer_row(records.len());
    let (start, end) = schema.footer_span;
    sheet.set_value(start, footer, print_footer(printed_at));
    if end > start {
        sheet.merge(MergeRange::row_span(footer, start, end));
    }

    log::debug!(
        "worksheet {:?}: {} data row(s), footer at row {footer}",
        sheet.name(),
        records.len()
    );
    Ok(sheet)
}
