//! Structured error types for report export.
//!
//! Every failure while composing a document or workbook surfaces as an
//! [`ExportError`]; callers decide whether to notify, log or retry.

/// All errors that can occur while building or reading back a report.
#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    /// XML error from quick-xml (workbook read-back).
    #[error("XML parsing: {0}")]
    Xml(#[from] quick_xml::Error),

    /// ZIP archive error.
    #[error("ZIP archive: {0}")]
    Zip(#[from] zip::result::ZipError),

    /// PDF object model or serialization error.
    #[error("PDF: {0}")]
    Pdf(#[from] lopdf::Error),

    /// Record or configuration JSON error.
    #[error("JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// Logo image could not be decoded or embedded.
    #[error("Logo image: {0}")]
    Image(String),

    /// Column schema and header layout disagree.
    #[error("Column schema: {0}")]
    Schema(String),

    /// Worksheet name rejected by the spreadsheet format.
    #[error("Invalid worksheet name: {0}")]
    SheetName(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Catch-all for string errors.
    #[error("{0}")]
    Other(String),
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, ExportError>;

impl From<String> for ExportError {
    fn from(s: String) -> Self {
        Self::Other(s)
    }
}

impl From<&str> for ExportError {
    fn from(s: &str) -> Self {
        Self::Other(s.to_string())
    }
}

#[cfg(target_arch = "wasm32")]
impl From<ExportError> for wasm_bindgen::JsValue {
    fn from(e: ExportError) -> Self {
        wasm_bindgen::JsValue::from_str(&e.to_string())
    }
}
