use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::error::{ExportError, Result};

/// Explicit (label, 1-based column) header placement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnHeaderSpec {
    pub value: String,
    pub position: u32,
}

impl ColumnHeaderSpec {
    pub fn new(value: impl Into<String>, position: u32) -> Self {
        Self {
            value: value.into(),
            position,
        }
    }
}

/// Conditional styling applied to a data column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnStyle {
    #[default]
    Plain,
    /// Cells holding the literal `INACTIVO` render in red.
    Status,
}

/// One data column: which record key feeds it, its header, where it sits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnSpec {
    pub key: String,
    pub header: String,
    /// 1-based column index (2 = column B).
    pub column: u32,
    /// Width in Excel character units.
    pub width: f64,
    #[serde(default)]
    pub style: ColumnStyle,
}

impl ColumnSpec {
    pub fn new(key: &str, header: &str, column: u32, width: f64) -> Self {
        Self {
            key: key.to_string(),
            header: header.to_string(),
            column,
            width,
            style: ColumnStyle::Plain,
        }
    }

    #[must_use]
    pub fn status(mut self) -> Self {
        self.style = ColumnStyle::Status;
        self
    }
}

/// A column that only carries a width (no header, no data).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtraWidth {
    pub column: u32,
    pub width: f64,
}

/// Declarative spreadsheet layout shared by the header and row writers.
///
/// Header placement and data placement both come from `columns`, so a
/// header can never point at a column the rows don't fill.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportSchema {
    pub columns: Vec<ColumnSpec>,
    /// Widths for columns outside the data range.
    #[serde(default)]
    pub extra_widths: Vec<ExtraWidth>,
    /// Last column of the merged title cell on row 1 (starts at column B).
    pub title_span_end: u32,
    /// Columns that receive a right-hand border on every data row.
    pub right_border_columns: Vec<u32>,
    /// Inclusive (start, end) columns of the merged footer cell.
    pub footer_span: (u32, u32),
}

impl ReportSchema {
    /// Three-column entity listing: name, status, creation date (B..D).
    pub fn simple() -> Self {
        Self {
            columns: vec![
                ColumnSpec::new("NOMBRE", "NOMBRE", 2, 25.0),
                ColumnSpec::new("ESTADO", "ESTADO", 3, 15.0).status(),
                ColumnSpec::new("FECHA_CREACION", "FECHA CREACIÓN", 4, 27.0),
            ],
            extra_widths: Vec::new(),
            title_span_end: 4,
            right_border_columns: vec![1, 4],
            footer_span: (2, 4),
        }
    }

    /// Inventory master listing (B..I, title merged through J).
    pub fn master() -> Self {
        Self {
            columns: vec![
                ColumnSpec::new("CODIGO", "CÓDIGO", 2, 15.0),
                ColumnSpec::new("MARCA", "MARCA", 3, 25.0),
                ColumnSpec::new("NOMBRE_RESPONSABLE", "NOMBRE RESPONSABLE", 4, 35.0),
                ColumnSpec::new("NOMBRE_DEPARTAMENTO", "DEPARTAMENTO", 5, 35.0),
                ColumnSpec::new("NOMBRE_TIPO_EQUIPO", "TIPO EQUIPO", 6, 35.0),
                ColumnSpec::new("ESTADO", "ESTADO", 7, 15.0).status(),
                ColumnSpec::new("FECHA_ASIGNACION", "FECHA ASIGNACIÓN", 8, 27.0),
                ColumnSpec::new("FECHA_INGRESO", "FECHA INGRESO", 9, 27.0),
            ],
            extra_widths: vec![ExtraWidth {
                column: 10,
                width: 27.0,
            }],
            title_span_end: 10,
            right_border_columns: vec![1, 9],
            footer_span: (2, 4),
        }
    }

    /// Header placements derived from the columns, in column order.
    pub fn headers(&self) -> Vec<ColumnHeaderSpec> {
        let mut headers: Vec<ColumnHeaderSpec> = self
            .columns
            .iter()
            .map(|c| ColumnHeaderSpec::new(c.header.clone(), c.column))
            .collect();
        headers.sort_by_key(|h| h.position);
        headers
    }

    /// Relabel columns from caller-supplied header placements.
    ///
    /// Every header must land on a column this schema fills.
    pub fn with_headers(mut self, headers: &[ColumnHeaderSpec]) -> Result<Self> {
        for header in headers {
            let column = self
                .columns
                .iter_mut()
                .find(|c| c.column == header.position)
                .ok_or_else(|| {
                    ExportError::Schema(format!(
                        "header {:?} at column {} has no data column",
                        header.value, header.position
                    ))
                })?;
            column.header.clone_from(&header.value);
        }
        Ok(self)
    }

    /// Reject positions that would overlap or fall outside the sheet.
    pub fn validate(&self) -> Result<()> {
        let mut seen = HashSet::new();
        for column in &self.columns {
            if column.column == 0 {
                return Err(ExportError::Schema(format!(
                    "column {:?} has position 0; positions are 1-based",
                    column.key
                )));
            }
            if !seen.insert(column.column) {
                return Err(ExportError::Schema(format!(
                    "column position {} is used twice",
                    column.column
                )));
            }
        }
        let (start, end) = self.footer_span;
        if start == 0 || end < start {
            return Err(ExportError::Schema(format!(
                "footer span {start}..{end} is empty"
            )));
        }
        if self.title_span_end < 2 {
            return Err(ExportError::Schema(
                "title must span at least column B".to_string(),
            ));
        }
        Ok(())
    }

    /// Rightmost column any part of the layout touches.
    pub fn last_column(&self) -> u32 {
        self.columns
            .iter()
            .map(|c| c.column)
            .chain(self.right_border_columns.iter().copied())
            .chain(std::iter::once(self.title_span_end))
            .chain(std::iter::once(self.footer_span.1))
            .max()
            .unwrap_or(1)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_schemas_validate() {
        ReportSchema::simple().validate().unwrap();
        ReportSchema::master().validate().unwrap();
    }

    #[test]
    fn test_headers_follow_columns() {
        let headers = ReportSchema::simple().headers();
        assert_eq!(
            headers,
            vec![
                ColumnHeaderSpec::new("NOMBRE", 2),
                ColumnHeaderSpec::new("ESTADO", 3),
                ColumnHeaderSpec::new("FECHA CREACIÓN", 4),
            ]
        );
    }

    #[test]
    fn test_with_headers_relabels_by_position() {
        let schema = ReportSchema::simple()
            .with_headers(&[ColumnHeaderSpec::new("NOMBRE DEPARTAMENTO", 2)])
            .unwrap();
        assert_eq!(schema.columns[0].header, "NOMBRE DEPARTAMENTO");
        assert_eq!(schema.columns[0].key, "NOMBRE");
    }

    #[test]
    fn test_with_headers_rejects_orphan_position() {
        let err = ReportSchema::simple()
            .with_headers(&[ColumnHeaderSpec::new("EXTRA", 7)])
            .unwrap_err();
        assert!(matches!(err, ExportError::Schema(_)));
    }

    #[test]
    fn test_validate_rejects_duplicate_positions() {
        let mut schema = ReportSchema::simple();
        schema.columns[1].column = 2;
        assert!(schema.validate().is_err());
    }

    #[test]
    fn test_last_column() {
        assert_eq!(ReportSchema::simple().last_column(), 4);
        assert_eq!(ReportSchema::master().last_column(), 10);
    }
}
