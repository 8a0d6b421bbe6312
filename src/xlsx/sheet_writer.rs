//! Generates worksheet XML from a [`Worksheet`].
//!
//! Text cells are written as inline strings (`t="inlineStr"`), so the
//! package needs no shared string table.

use std::fmt::Write as _;

use crate::cell_ref::{cell_address, column_letter};

use super::styles::StyleRegistry;
use super::worksheet::{Cell, CellValue, Worksheet};

/// Relationship id of the drawing part in the sheet's `.rels`.
pub(crate) const DRAWING_REL_ID: &str = "rId1";

/// Write a complete worksheet XML string, registering cell styles as it goes.
pub(crate) fn write_sheet_xml(sheet: &Worksheet, styles: &mut StyleRegistry) -> String {
    let mut out = String::with_capacity(4096);
    out.push_str(r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#);
    out.push('\n');
    out.push_str(
        r#"<worksheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" "#,
    );
    out.push_str(
        r#"xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships">"#,
    );
    out.push('\n');

    if let Some(dimension) = sheet.dimension() {
        let _ = writeln!(out, "<dimension ref=\"{dimension}\"/>");
    }

    // <sheetViews>, frozen rows
    out.push_str("<sheetViews><sheetView tabSelected=\"1\" workbookViewId=\"0\">");
    if sheet.frozen_rows() > 0 {
        let top_left = cell_address(1, sheet.frozen_rows() + 1);
        let _ = write!(
            out,
            "<pane ySplit=\"{}\" topLeftCell=\"{top_left}\" activePane=\"bottomLeft\" state=\"frozen\"/>",
            sheet.frozen_rows()
        );
        let _ = write!(
            out,
            "<selection pane=\"bottomLeft\" activeCell=\"{top_left}\" sqref=\"{top_left}\"/>"
        );
    }
    out.push_str("</sheetView></sheetViews>\n");

    out.push_str("<sheetFormatPr defaultRowHeight=\"15\"/>\n");

    let widths: Vec<(u32, f64)> = sheet.column_widths().collect();
    if !widths.is_empty() {
        out.push_str("<cols>\n");
        for (col, width) in widths {
            let _ = writeln!(
                out,
                "<col min=\"{col}\" max=\"{col}\" width=\"{width:.4}\" customWidth=\"1\"/>"
            );
        }
        out.push_str("</cols>\n");
    }

    out.push_str("<sheetData>\n");
    write_sheet_data(&mut out, sheet, styles);
    out.push_str("</sheetData>\n");

    if !sheet.merges().is_empty() {
        let _ = writeln!(out, "<mergeCells count=\"{}\">", sheet.merges().len());
        for merge in sheet.merges() {
            let _ = writeln!(out, "<mergeCell ref=\"{merge}\"/>");
        }
        out.push_str("</mergeCells>\n");
    }

    out.push_str(
        "<pageMargins left=\"0.7\" right=\"0.7\" top=\"0.75\" bottom=\"0.75\" header=\"0.3\" footer=\"0.3\"/>\n",
    );

    if sheet.image().is_some() {
        let _ = writeln!(out, "<drawing r:id=\"{DRAWING_REL_ID}\"/>");
    }

    out.push_str("</worksheet>");
    out
}

/// Write all cell rows into `<sheetData>`.
fn write_sheet_data(out: &mut String, sheet: &Worksheet, styles: &mut StyleRegistry) {
    let mut current_row = None;
    for (col, row, cell) in sheet.cells() {
        if current_row != Some(row) {
            if current_row.is_some() {
                out.push_str("</row>\n");
            }
            let _ = write!(out, "<row r=\"{row}\">");
            current_row = Some(row);
        }
        write_cell(out, col, row, cell, styles);
    }
    if current_row.is_some() {
        out.push_str("</row>\n");
    }
}

/// Write a single `<c>` element.
fn write_cell(out: &mut String, col: u32, row: u32, cell: &Cell, styles: &mut StyleRegistry) {
    let _ = write!(out, "<c r=\"{}{row}\"", column_letter(col));

    let style = styles.register(&cell.style);
    if style != 0 {
        let _ = write!(out, " s=\"{style}\"");
    }

    match &cell.value {
        CellValue::Empty => out.push_str("/>"),
        CellValue::Text(text) => {
            out.push_str(" t=\"inlineStr\"><is>");
            if text.starts_with(char::is_whitespace) || text.ends_with(char::is_whitespace) {
                out.push_str("<t xml:space=\"preserve\">");
            } else {
                out.push_str("<t>");
            }
            out.push_str(&xml_escape(text));
            out.push_str("</t></is></c>");
        }
        CellValue::Number(n) => {
            let _ = write!(out, "><v>{n}</v></c>");
        }
    }
}

/// Minimal XML escaping for attribute/text content.
///
/// Characters XML 1.0 forbids (C0 controls other than tab, LF and CR, and
/// U+FFFE/U+FFFF) are dropped.
pub(crate) fn xml_escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            '\t' | '\n' | '\r' => out.push(c),
            '\u{0}'..='\u{1F}' | '\u{FFFE}' | '\u{FFFF}' => {}
            _ => out.push(c),
        }
    }
    out
}
