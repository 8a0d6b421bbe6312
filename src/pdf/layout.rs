//! Page layout for the PDF listing.
//!
//! Layout is a pure pass over the records: it decides every position,
//! wrap and page break up front and emits flat drawing primitives in
//! top-left-origin points. The writer only translates them to PDF
//! operators.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use super::metrics::{text_width, wrap_text, Font};
use crate::format::generation_footer;
use crate::types::ReportRecord;

/// Field keys containing this marker are identifiers and never printed.
pub const HIDDEN_KEY_MARKER: &str = "ID";

/// Line height as a multiple of the font size.
const LINE_HEIGHT: f32 = 1.2;

/// Baseline offset from the top of a line box, as a multiple of the font size.
const BASELINE: f32 = 0.9;

/// An sRGB color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Rgb(pub u8, pub u8, pub u8);

impl Rgb {
    pub const BLACK: Self = Self(0, 0, 0);
    pub const WHITE: Self = Self(0xFF, 0xFF, 0xFF);

    /// Parse `#RRGGBB` or `RRGGBB`.
    pub fn from_hex(hex: &str) -> Option<Self> {
        let hex = hex.trim().trim_start_matches('#');
        if hex.len() != 6 || !hex.is_ascii() {
            return None;
        }
        let channel = |range: std::ops::Range<usize>| {
            hex.get(range).and_then(|h| u8::from_str_radix(h, 16).ok())
        };
        Some(Self(channel(0..2)?, channel(2..4)?, channel(4..6)?))
    }

    /// Channels scaled to 0.0..=1.0 for PDF color operators.
    pub fn unit(self) -> [f32; 3] {
        [
            f32::from(self.0) / 255.0,
            f32::from(self.1) / 255.0,
            f32::from(self.2) / 255.0,
        ]
    }
}

impl TryFrom<String> for Rgb {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::from_hex(&value).ok_or_else(|| format!("invalid color {value:?}, expected #RRGGBB"))
    }
}

impl From<Rgb> for String {
    fn from(c: Rgb) -> Self {
        format!("#{:02X}{:02X}{:02X}", c.0, c.1, c.2)
    }
}

/// Geometry and palette of the listing. Defaults reproduce the console's
/// printed listing on A4 portrait.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PdfStyle {
    pub page_width: f32,
    pub page_height: f32,
    pub padding: f32,
    pub banner_color: Rgb,
    pub banner_padding: f32,
    pub title_size: f32,
    pub title_color: Rgb,
    pub logo_size: f32,
    pub body_margin_top: f32,
    pub caption: String,
    pub caption_size: f32,
    pub rule_margin: f32,
    /// Space between the caption rule and the top of the header cells.
    pub header_offset: f32,
    pub header_fill: Rgb,
    pub header_size: f32,
    pub body_size: f32,
    pub cell_padding_top: f32,
    pub cell_padding_left: f32,
    pub text_padding: f32,
    pub grid_color: Rgb,
    pub footer_size: f32,
    pub footer_color: Rgb,
    pub footer_bottom: f32,
}

impl Default for PdfStyle {
    fn default() -> Self {
        Self {
            page_width: 595.28,
            page_height: 841.89,
            padding: 20.0,
            banner_color: Rgb(0x28, 0x3A, 0x1B),
            banner_padding: 15.0,
            title_size: 29.0,
            title_color: Rgb::WHITE,
            logo_size: 60.0,
            body_margin_top: 20.0,
            caption: "Datos Registrados".to_string(),
            caption_size: 12.0,
            rule_margin: 10.0,
            header_offset: 38.0,
            header_fill: Rgb(0xDE, 0xDE, 0xDE),
            header_size: 11.0,
            body_size: 10.0,
            cell_padding_top: 4.0,
            cell_padding_left: 7.0,
            text_padding: 2.0,
            grid_color: Rgb(0xF5, 0xF5, 0xF5),
            footer_size: 10.0,
            footer_color: Rgb(0x55, 0x55, 0x55),
            footer_bottom: 20.0,
        }
    }
}

/// A drawing primitive. Coordinates are points from the top-left corner.
#[derive(Debug, Clone, PartialEq)]
pub enum Element {
    Rect {
        x: f32,
        y: f32,
        width: f32,
        height: f32,
        fill: Rgb,
    },
    Line {
        x1: f32,
        y1: f32,
        x2: f32,
        y2: f32,
        width: f32,
        color: Rgb,
    },
    /// A single line of text; `baseline` is the y of the text baseline.
    Text {
        x: f32,
        baseline: f32,
        size: f32,
        font: Font,
        color: Rgb,
        text: String,
    },
    /// The banner logo, drawn into this box.
    Logo {
        x: f32,
        y: f32,
        width: f32,
        height: f32,
    },
}

/// Everything drawn on one page.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PageLayout {
    pub elements: Vec<Element>,
    /// Indices (into the report's rows) of the body rows on this page.
    pub rows: std::ops::Range<usize>,
}

impl PageLayout {
    /// Text runs on this page, in drawing order.
    pub fn texts(&self) -> impl Iterator<Item = &str> {
        self.elements.iter().filter_map(|e| match e {
            Element::Text { text, .. } => Some(text.as_str()),
            _ => None,
        })
    }
}

/// Keys of `record` that become columns, in field order.
pub fn visible_keys(record: &ReportRecord) -> Vec<&str> {
    record
        .keys()
        .filter(|k| !k.contains(HIDDEN_KEY_MARKER))
        .collect()
}

/// A fully positioned listing, ready for serialization.
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentLayout {
    pub width: f32,
    pub height: f32,
    pub pages: Vec<PageLayout>,
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl DocumentLayout {
    /// Lay out `records` under `title`.
    ///
    /// `logo` is the pixel size of the banner logo, if there is one. The
    /// column set comes from the first record; later records are read by
    /// the same keys and missing fields print empty.
    pub fn build(
        title: &str,
        logo: Option<(u32, u32)>,
        records: &[ReportRecord],
        generated_at: NaiveDateTime,
        style: &PdfStyle,
    ) -> Self {
        let keys: Vec<&str> = records.first().map(visible_keys).unwrap_or_default();
        let headers: Vec<String> = match records.first() {
            Some(first) => keys
                .iter()
                .map(|k| first.get(k).map(|f| f.description.clone()).unwrap_or_default())
                .collect(),
            None => Vec::new(),
        };
        let rows: Vec<Vec<String>> = records
            .iter()
            .map(|record| {
                keys.iter()
                    .map(|k| record.get(k).map(|f| f.value.display()).unwrap_or_default())
                    .collect()
            })
            .collect();

        let mut pager = Pager::new(style, headers.len());
        pager.banner(title, logo);
        pager.caption();
        pager.header_row(&headers, style.header_offset);
        for (index, row) in rows.iter().enumerate() {
            pager.body_row(index, row, &headers);
        }
        let pages = pager.finish(&generation_footer(generated_at));
        log::debug!(
            "laid out {} rows x {} columns on {} page(s)",
            rows.len(),
            headers.len(),
            pages.len()
        );

        Self {
            width: style.page_width,
            height: style.page_height,
            pages,
            headers,
            rows,
        }
    }

    /// Column labels, in display order.
    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    /// Cell text of every body row.
    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }
}

/// Running cursor over the pages being filled.
struct Pager<'a> {
    style: &'a PdfStyle,
    columns: usize,
    pages: Vec<PageLayout>,
    current: PageLayout,
    y: f32,
}

impl<'a> Pager<'a> {
    fn new(style: &'a PdfStyle, columns: usize) -> Self {
        Self {
            style,
            columns,
            pages: Vec::new(),
            current: PageLayout::default(),
            y: style.padding,
        }
    }

    fn content_width(&self) -> f32 {
        (self.style.page_width - 2.0 * self.style.padding).max(1.0)
    }

    /// Lowest y a body row may reach before the footer area.
    fn bottom_limit(&self) -> f32 {
        let s = self.style;
        s.page_height - s.footer_bottom - s.footer_size * LINE_HEIGHT - s.rule_margin
    }

    fn column_width(&self) -> f32 {
        #[allow(clippy::cast_precision_loss)]
        let n = self.columns.max(1) as f32;
        self.content_width() / n
    }

    fn push(&mut self, element: Element) {
        self.current.elements.push(element);
    }

    fn text_line(&mut self, x: f32, top: f32, size: f32, font: Font, color: Rgb, text: String) {
        self.push(Element::Text {
            x,
            baseline: top + size * BASELINE,
            size,
            font,
            color,
            text,
        });
    }

    fn banner(&mut self, title: &str, logo: Option<(u32, u32)>) {
        let s = self.style;
        let x = s.padding;
        let width = self.content_width();
        let logo_box = if logo.is_some() { s.logo_size } else { 0.0 };
        let title_room = (width - 2.0 * s.banner_padding - logo_box - s.banner_padding).max(1.0);
        let lines = wrap_text(Font::Bold, s.title_size, title, title_room);
        #[allow(clippy::cast_precision_loss)]
        let title_height = lines.len() as f32 * s.title_size * LINE_HEIGHT;
        let inner = title_height.max(s.logo_size);
        let height = inner + 2.0 * s.banner_padding;

        self.push(Element::Rect {
            x,
            y: self.y,
            width,
            height,
            fill: s.banner_color,
        });
        let mut top = self.y + s.banner_padding + (inner - title_height) / 2.0;
        for line in lines {
            self.text_line(x + s.banner_padding, top, s.title_size, Font::Bold, s.title_color, line);
            top += s.title_size * LINE_HEIGHT;
        }
        if let Some((px_w, px_h)) = logo {
            let (w, h) = fit_box(px_w, px_h, s.logo_size);
            self.push(Element::Logo {
                x: x + width - s.banner_padding - s.logo_size + (s.logo_size - w) / 2.0,
                y: self.y + s.banner_padding + (inner - s.logo_size) / 2.0 + (s.logo_size - h) / 2.0,
                width: w,
                height: h,
            });
        }
        self.y += height + s.body_margin_top;
    }

    fn caption(&mut self) {
        let s = self.style;
        let caption = s.caption.clone();
        self.text_line(s.padding, self.y, s.caption_size, Font::Regular, Rgb::BLACK, caption);
        self.y += s.caption_size * LINE_HEIGHT + s.rule_margin;
        self.push(Element::Line {
            x1: s.padding,
            y1: self.y,
            x2: s.padding + self.content_width(),
            y2: self.y,
            width: 1.0,
            color: Rgb::BLACK,
        });
        self.y += 1.0 + s.rule_margin;
    }

    /// Height of a row of `cells` set at `size` in `font`.
    fn row_height(&self, cells: &[String], font: Font, size: f32) -> (f32, Vec<Vec<String>>) {
        let s = self.style;
        let inner = (self.column_width() - s.cell_padding_left - 2.0 * s.text_padding).max(1.0);
        let wrapped: Vec<Vec<String>> = cells
            .iter()
            .map(|c| wrap_text(font, size, c, inner))
            .collect();
        let max_lines = wrapped.iter().map(Vec::len).max().unwrap_or(0);
        if max_lines == 0 {
            return (0.0, wrapped);
        }
        #[allow(clippy::cast_precision_loss)]
        let text_height = max_lines as f32 * size * LINE_HEIGHT;
        let height = s.cell_padding_top + 2.0 * s.text_padding + text_height;
        (height, wrapped)
    }

    fn draw_row(&mut self, wrapped: Vec<Vec<String>>, height: f32, font: Font, size: f32, fill: Option<Rgb>) {
        let s = self.style;
        let col_w = self.column_width();
        let inner = (col_w - s.cell_padding_left - 2.0 * s.text_padding).max(1.0);
        let top = self.y;
        let mut x = s.padding;
        for lines in wrapped {
            if let Some(fill) = fill {
                self.push(Element::Rect {
                    x,
                    y: top,
                    width: col_w,
                    height,
                    fill,
                });
            }
            // Right and bottom cell rules
            self.push(Element::Line {
                x1: x + col_w,
                y1: top,
                x2: x + col_w,
                y2: top + height,
                width: 1.0,
                color: s.grid_color,
            });
            self.push(Element::Line {
                x1: x,
                y1: top + height,
                x2: x + col_w,
                y2: top + height,
                width: 1.0,
                color: s.grid_color,
            });
            let mut line_top = top + s.cell_padding_top + s.text_padding;
            let text_left = x + s.cell_padding_left + s.text_padding;
            for line in lines {
                let slack = (inner - text_width(font, size, &line)).max(0.0);
                self.text_line(text_left + slack / 2.0, line_top, size, font, Rgb::BLACK, line);
                line_top += size * LINE_HEIGHT;
            }
            x += col_w;
        }
        self.y += height;
    }

    fn header_row(&mut self, headers: &[String], offset: f32) {
        let s = self.style;
        self.y += offset;
        let (height, wrapped) = self.row_height(headers, Font::Bold, s.header_size);
        self.draw_row(wrapped, height, Font::Bold, s.header_size, Some(s.header_fill));
    }

    fn body_row(&mut self, index: usize, cells: &[String], headers: &[String]) {
        let s = self.style;
        let (height, wrapped) = self.row_height(cells, Font::Regular, s.body_size);
        let page_has_rows = !self.current.rows.is_empty();
        if self.y + height > self.bottom_limit() && page_has_rows {
            self.break_page(index);
            self.header_row(headers, 0.0);
        }
        if self.current.rows.is_empty() {
            self.current.rows = index..index;
        }
        self.draw_row(wrapped, height, Font::Regular, s.body_size, None);
        self.current.rows.end = index + 1;
    }

    fn break_page(&mut self, next_row: usize) {
        let page = std::mem::take(&mut self.current);
        self.pages.push(page);
        self.current.rows = next_row..next_row;
        self.y = self.style.padding;
        log::debug!("page break before row {next_row}");
    }

    fn finish(mut self, footer: &str) -> Vec<PageLayout> {
        let page = std::mem::take(&mut self.current);
        self.pages.push(page);
        let s = self.style;
        let footer_width = text_width(Font::Regular, s.footer_size, footer);
        let x = s.page_width - s.padding - footer_width;
        let top = s.page_height - s.footer_bottom - s.footer_size * LINE_HEIGHT;
        for page in &mut self.pages {
            page.elements.push(Element::Text {
                x,
                baseline: top + s.footer_size * BASELINE,
                size: s.footer_size,
                font: Font::Regular,
                color: s.footer_color,
                text: footer.to_string(),
            });
        }
        self.pages
    }
}

/// Scale a `px_w` x `px_h` image to fit a `side` x `side` box, keeping aspect.
fn fit_box(px_w: u32, px_h: u32, side: f32) -> (f32, f32) {
    #[allow(clippy::cast_precision_loss)]
    let (w, h) = (px_w.max(1) as f32, px_h.max(1) as f32);
    let scale = side / w.max(h);
    (w * scale, h * scale)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, 5)
            .and_then(|d| d.and_hms_opt(14, 30, 0))
            .unwrap()
    }

    fn record(i: usize) -> ReportRecord {
        ReportRecord::new()
            .with("ID_TIPO_EQUIPO", i.to_string(), "ID")
            .with("NOMBRE_EQUIPO", format!("Equipo {i}"), "TIPO DE EQUIPO")
            .with("ESTADO", "ACTIVO", "ESTADO")
    }

    #[test]
    fn test_headers_skip_identifier_keys() {
        let layout = DocumentLayout::build("Tipo de Equipo", None, &[record(1)], at(), &PdfStyle::default());
        assert_eq!(layout.headers(), ["TIPO DE EQUIPO", "ESTADO"]);
        assert_eq!(layout.rows(), [vec!["Equipo 1".to_string(), "ACTIVO".to_string()]]);
    }

    #[test]
    fn test_empty_records_single_page_with_banner() {
        let layout = DocumentLayout::build("Departamento", None, &[], at(), &PdfStyle::default());
        assert_eq!(layout.pages.len(), 1);
        assert!(layout.headers().is_empty());
        let texts: Vec<&str> = layout.pages[0].texts().collect();
        assert!(texts.contains(&"Departamento"));
        assert!(texts.contains(&"Datos Registrados"));
        assert!(texts.contains(&"Fecha y Hora de Generación: 05/03/2024 14:30:00"));
    }

    #[test]
    fn test_long_listing_paginates_and_repeats_headers() {
        let records: Vec<ReportRecord> = (0..120).map(record).collect();
        let layout = DocumentLayout::build("Tipo de Equipo", None, &records, at(), &PdfStyle::default());
        assert!(layout.pages.len() > 1);

        let mut next = 0;
        for page in &layout.pages {
            assert_eq!(page.rows.start, next);
            next = page.rows.end;
            let texts: Vec<&str> = page.texts().collect();
            assert!(texts.contains(&"TIPO DE EQUIPO"));
            assert_eq!(texts.last().copied(), Some("Fecha y Hora de Generación: 05/03/2024 14:30:00"));
        }
        assert_eq!(next, 120);

        let banners = layout
            .pages
            .iter()
            .filter(|p| p.texts().any(|t| t == "Datos Registrados"))
            .count();
        assert_eq!(banners, 1);
    }

    #[test]
    fn test_logo_keeps_aspect_ratio() {
        let layout = DocumentLayout::build("Tipo de Equipo", Some((200, 100)), &[], at(), &PdfStyle::default());
        let logo = layout.pages[0].elements.iter().find_map(|e| match e {
            Element::Logo { width, height, .. } => Some((*width, *height)),
            _ => None,
        });
        let (w, h) = logo.unwrap();
        assert!((w - 60.0).abs() < 1e-3);
        assert!((h - 30.0).abs() < 1e-3);
    }

    #[test]
    fn test_rgb_hex() {
        assert_eq!(Rgb::from_hex("#283a1b"), Some(Rgb(0x28, 0x3A, 0x1B)));
        assert_eq!(Rgb::from_hex("12345"), None);
        assert_eq!(String::from(Rgb(0xDE, 0xDE, 0xDE)), "#DEDEDE");
    }
}
