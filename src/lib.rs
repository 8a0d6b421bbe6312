//! inventory-reports - listing reports for the inventory console
//!
//! Turns the console's record listings (equipment types, departments,
//! inventory control) into downloadable files:
//! - PDF listing with a logo banner, paginated table and print timestamp
//! - XLSX report with a frozen header band, borders, red inactive status
//!   cells and a merged timestamp footer
//! - Runs in the browser via WebAssembly, or natively through the CLI
//!
//! # Usage (JavaScript)
//!
//! ```javascript
//! import init, { ReportExporter } from 'inventory-reports';
//! await init();
//! const exporter = new ReportExporter();
//! await exporter.export('pdf', 'department', json, 'all', logoUrl);
//! ```
//!
//! # Usage (Rust)
//!
//! ```no_run
//! use inventory_reports::types::ReportSchema;
//! use inventory_reports::xlsx::build_spreadsheet_report;
//!
//! let now = chrono::Local::now().naive_local();
//! let bytes = build_spreadsheet_report("Departamentos", &ReportSchema::simple(), &[], None, now)?;
//! std::fs::write("Departamentos.xlsx", bytes)?;
//! # Ok::<(), inventory_reports::error::ExportError>(())
//! ```

// Data and formatting
pub mod cell_ref;
pub mod config;
pub mod entity;
pub mod error;
pub mod format;
pub mod logo;
pub mod types;

// Builders
pub mod pdf;
pub mod report;
pub mod xlsx;

// Browser surface
pub mod logging;
pub mod web;

#[cfg(test)]
mod test_support;

use wasm_bindgen::prelude::*;

pub use error::{ExportError, Result};
pub use report::{render_report, RenderedReport, ReportFormat};
pub use types::*;
pub use web::ReportExporter;

/// Get the library version
#[must_use]
#[wasm_bindgen]
pub fn version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}
