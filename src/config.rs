//! Export configuration.
//!
//! A JSON document; every field is optional:
//!
//! ```json
//! {
//!   "logo": "assets/logo_app.png",
//!   "pdf": { "banner_color": "#283A1B", "body_size": 9.0 },
//!   "schemas": { "department": { "columns": [...], "title_span_end": 4,
//!                                "right_border_columns": [1, 4], "footer_span": [2, 4] } }
//! }
//! ```

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::entity::EntityKind;
use crate::error::{ExportError, Result};
use crate::pdf::PdfStyle;
use crate::types::ReportSchema;

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    /// Logo image used by both builders.
    pub logo: Option<PathBuf>,
    /// PDF listing geometry and palette.
    pub pdf: PdfStyle,
    /// Spreadsheet layouts replacing the built-in ones, by entity key.
    pub schemas: BTreeMap<String, ReportSchema>,
}

impl ExportConfig {
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Read a configuration file. Relative logo paths resolve against the
    /// file's directory.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        let mut config = Self::from_json_str(&text)?;
        if let (Some(logo), Some(dir)) = (config.logo.as_mut(), path.parent()) {
            if logo.is_relative() {
                *logo = dir.join(&*logo);
            }
        }
        log::debug!(
            "loaded export config from {}: {} schema override(s)",
            path.display(),
            config.schemas.len()
        );
        Ok(config)
    }

    /// Check schema overrides: known entity keys and consistent layouts.
    pub fn validate(&self) -> Result<()> {
        for (key, schema) in &self.schemas {
            if EntityKind::parse(key).is_none() {
                return Err(ExportError::Schema(format!(
                    "unknown entity {key:?} in schema overrides"
                )));
            }
            schema
                .validate()
                .map_err(|e| ExportError::Schema(format!("{key}: {e}")))?;
        }
        Ok(())
    }

    /// Spreadsheet layout for `kind`: the override if configured, else the
    /// built-in one.
    pub fn schema_for(&self, kind: EntityKind) -> ReportSchema {
        self.schemas
            .iter()
            .find(|(key, _)| EntityKind::parse(key) == Some(kind))
            .map_or_else(|| kind.schema(), |(_, schema)| schema.clone())
    }
}
