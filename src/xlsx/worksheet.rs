//! In-memory worksheet model.
//!
//! Cells are addressed 1-based as `(column, row)`, the same order as an A1
//! reference reads. The grid is sparse: a cell exists once something has
//! been written to it, either a value or a style.

use std::collections::BTreeMap;
use std::fmt;

use crate::cell_ref::{cell_address, column_letter};
use crate::logo::LogoImage;
use crate::types::FieldValue;

/// An opaque ARGB color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Color(pub u32);

impl Color {
    pub const BLACK: Self = Self(0xFF00_0000);
    pub const WHITE: Self = Self(0xFFFF_FFFF);
    pub const RED: Self = Self(0xFFFF_0000);
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:08X}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FontStyle {
    pub bold: bool,
    /// Size in points.
    pub size: u16,
    pub color: Option<Color>,
}

impl Default for FontStyle {
    fn default() -> Self {
        Self {
            bold: false,
            size: 11,
            color: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum HAlign {
    #[default]
    General,
    Left,
    Center,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum VAlign {
    #[default]
    Bottom,
    Center,
}

/// Thin black rules on each side of a cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct BorderSides {
    pub left: bool,
    pub right: bool,
    pub top: bool,
    pub bottom: bool,
}

impl BorderSides {
    pub const BOX: Self = Self {
        left: true,
        right: true,
        top: true,
        bottom: true,
    };
    pub const RIGHT: Self = Self {
        left: false,
        right: true,
        top: false,
        bottom: false,
    };
    pub const TOP: Self = Self {
        left: false,
        right: false,
        top: true,
        bottom: false,
    };

    pub fn is_empty(self) -> bool {
        !(self.left || self.right || self.top || self.bottom)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct CellStyle {
    pub font: FontStyle,
    /// Solid pattern fill.
    pub fill: Option<Color>,
    pub border: BorderSides,
    pub horizontal: HAlign,
    pub vertical: VAlign,
}

impl CellStyle {
    pub fn is_default(&self) -> bool {
        *self == Self::default()
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub enum CellValue {
    #[default]
    Empty,
    Text(String),
    Number(f64),
}

impl CellValue {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }
}

impl From<&FieldValue> for CellValue {
    fn from(value: &FieldValue) -> Self {
        match value {
            FieldValue::Text(s) => Self::Text(s.clone()),
            FieldValue::Number(n) => Self::Number(*n),
            FieldValue::Empty => Self::Empty,
        }
    }
}

impl From<&str> for CellValue {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl From<String> for CellValue {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Cell {
    pub value: CellValue,
    pub style: CellStyle,
}

/// Inclusive rectangle of merged cells, 1-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MergeRange {
    pub start_col: u32,
    pub start_row: u32,
    pub end_col: u32,
    pub end_row: u32,
}

impl MergeRange {
    /// A merge across columns `start_col..=end_col` of one row.
    pub fn row_span(row: u32, start_col: u32, end_col: u32) -> Self {
        Self {
            start_col,
            start_row: row,
            end_col,
            end_row: row,
        }
    }

    pub fn contains(&self, col: u32, row: u32) -> bool {
        (self.start_col..=self.end_col).contains(&col) && (self.start_row..=self.end_row).contains(&row)
    }
}

impl fmt::Display for MergeRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}",
            cell_address(self.start_col, self.start_row),
            cell_address(self.end_col, self.end_row)
        )
    }
}

/// A picture placed between two cell corners.
///
/// Anchor corners are 0-based `(column, row)` as in DrawingML.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageAnchor {
    pub image: LogoImage,
    pub from: (u32, u32),
    pub to: (u32, u32),
    pub width_px: u32,
    pub height_px: u32,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Worksheet {
    name: String,
    /// Keyed by `(row, column)` so iteration is row-major.
    cells: BTreeMap<(u32, u32), Cell>,
    merges: Vec<MergeRange>,
    column_widths: BTreeMap<u32, f64>,
    frozen_rows: u32,
    image: Option<ImageAnchor>,
}

impl Worksheet {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn cell(&self, col: u32, row: u32) -> Option<&Cell> {
        self.cells.get(&(row, col))
    }

    /// The cell at `(col, row)`, created empty if needed.
    pub fn cell_mut(&mut self, col: u32, row: u32) -> &mut Cell {
        self.cells.entry((row, col)).or_default()
    }

    pub fn set_value(&mut self, col: u32, row: u32, value: impl Into<CellValue>) {
        self.cell_mut(col, row).value = value.into();
    }

    /// Look a cell up by its A1 reference.
    pub fn cell_at(&self, address: &str) -> Option<&Cell> {
        let (col, row) = crate::cell_ref::parse_cell_ref(address)?;
        self.cell(col, row)
    }

    /// Populated cells of one row, left to right, as `(column, cell)`.
    pub fn row(&self, row: u32) -> impl Iterator<Item = (u32, &Cell)> {
        self.cells
            .range((row, 0)..=(row, u32::MAX))
            .map(|(&(_, col), cell)| (col, cell))
    }

    /// All populated cells in row-major order, as `(column, row, cell)`.
    pub fn cells(&self) -> impl Iterator<Item = (u32, u32, &Cell)> {
        self.cells.iter().map(|(&(row, col), cell)| (col, row, cell))
    }

    pub fn merge(&mut self, range: MergeRange) {
        self.merges.push(range);
    }

    pub fn merges(&self) -> &[MergeRange] {
        &self.merges
    }

    pub fn set_column_width(&mut self, col: u32, width: f64) {
        self.column_widths.insert(col, width);
    }

    pub fn column_width(&self, col: u32) -> Option<f64> {
        self.column_widths.get(&col).copied()
    }

    pub fn column_widths(&self) -> impl Iterator<Item = (u32, f64)> + '_ {
        self.column_widths.iter().map(|(&c, &w)| (c, w))
    }

    /// Keep the top `rows` rows visible while scrolling.
    pub fn freeze_rows(&mut self, rows: u32) {
        self.frozen_rows = rows;
    }

    pub fn frozen_rows(&self) -> u32 {
        self.frozen_rows
    }

    pub fn set_image(&mut self, anchor: ImageAnchor) {
        self.image = Some(anchor);
    }

    pub fn image(&self) -> Option<&ImageAnchor> {
        self.image.as_ref()
    }

    /// Last populated row, 0 when the sheet is empty.
    pub fn last_row(&self) -> u32 {
        self.cells.keys().next_back().map_or(0, |&(row, _)| row)
    }

    /// Rightmost populated or sized column, 0 when there is none.
    pub fn last_column(&self) -> u32 {
        let from_cells = self.cells.keys().map(|&(_, col)| col).max().unwrap_or(0);
        let from_widths = self.column_widths.keys().next_back().copied().unwrap_or(0);
        from_cells.max(from_widths)
    }

    /// Used range as an A1 reference, `None` for an empty sheet.
    pub fn dimension(&self) -> Option<String> {
        let last_row = self.last_row();
        let last_col = self.cells.keys().map(|&(_, col)| col).max()?;
        Some(format!("A1:{}{}", column_letter(last_col), last_row))
    }
}
