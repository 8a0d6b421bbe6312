//! Inventory console records and how each one is shaped for export.
//!
//! The remote API returns upper-case field names wrapped in a
//! `{ "response": [...] }` envelope. Each entity knows how to turn itself
//! into a described [`ReportRecord`] for the PDF listing and into a flat
//! row keyed for its [`ReportSchema`].

use serde::{Deserialize, Serialize};

use crate::error::{ExportError, Result};
use crate::format::{format_date, format_date_or, MISSING_DATE};
use crate::types::{ReportRecord, ReportSchema};

/// Placeholder for an inventory entry nobody is responsible for.
pub const MISSING_RESPONSIBLE: &str = "SIN RESPONSABLE";

/// Record status as stored by the API (`"A"` active, `"I"` inactive).
///
/// A missing, `null` or unrecognised code is [`Status::Unknown`]: it prints
/// as `INACTIVO` but only shows up in the "all" tab.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Status {
    #[serde(rename = "A")]
    Active,
    #[serde(rename = "I")]
    Inactive,
    #[default]
    #[serde(other)]
    Unknown,
}

impl Status {
    /// Label printed in reports. Anything not active prints as `INACTIVO`.
    pub fn label(self) -> &'static str {
        match self {
            Self::Active => "ACTIVO",
            Self::Inactive | Self::Unknown => "INACTIVO",
        }
    }

    pub fn is_active(self) -> bool {
        self == Self::Active
    }
}

/// `null` reads as the field's default ([`Status::Unknown`], `""` for text).
fn nullable<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: serde::Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// The listing tabs: all records, active only, inactive only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusFilter {
    #[default]
    All,
    Active,
    Inactive,
}

impl StatusFilter {
    pub fn matches(self, status: Status) -> bool {
        match self {
            Self::All => true,
            Self::Active => status == Status::Active,
            Self::Inactive => status == Status::Inactive,
        }
    }

    pub fn parse(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "all" | "todos" => Some(Self::All),
            "active" | "activos" => Some(Self::Active),
            "inactive" | "inactivos" => Some(Self::Inactive),
            _ => None,
        }
    }
}

/// Anything that can be listed in a report.
pub trait Exportable {
    fn status(&self) -> Status;

    /// Described fields for the PDF listing.
    fn to_pdf_record(&self) -> ReportRecord;

    /// Flat row keyed for the entity's spreadsheet schema.
    fn to_sheet_row(&self) -> ReportRecord;
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EquipmentType {
    #[serde(rename = "ID_TIPO_EQUIPO", default)]
    pub id: Option<i64>,
    #[serde(rename = "NOMBRE_TIPO_EQUIPO", default, deserialize_with = "nullable")]
    pub name: String,
    #[serde(rename = "FECHA_CREACION", default)]
    pub created_at: Option<String>,
    #[serde(rename = "ESTADO", default, deserialize_with = "nullable")]
    pub status: Status,
}

impl Exportable for EquipmentType {
    fn status(&self) -> Status {
        self.status
    }

    fn to_pdf_record(&self) -> ReportRecord {
        ReportRecord::new()
            .with("NOMBRE_EQUIPO", self.name.as_str(), "TIPO DE EQUIPO")
            .with(
                "FECHA_CREACION",
                format_date(self.created_at.as_deref()),
                "FECHA CREACIÓN",
            )
            .with("ESTADO", self.status.label(), "ESTADO")
    }

    fn to_sheet_row(&self) -> ReportRecord {
        simple_row(&self.name, self.created_at.as_deref(), self.status)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Department {
    #[serde(rename = "ID_DEPARTAMENTO", default)]
    pub id: Option<i64>,
    #[serde(rename = "NOMBRE_DEPARTAMENTO", default, deserialize_with = "nullable")]
    pub name: String,
    #[serde(rename = "FECHA_CREACION", default)]
    pub created_at: Option<String>,
    #[serde(rename = "ESTADO", default, deserialize_with = "nullable")]
    pub status: Status,
}

impl Exportable for Department {
    fn status(&self) -> Status {
        self.status
    }

    fn to_pdf_record(&self) -> ReportRecord {
        ReportRecord::new()
            .with("NOMBRE_DEPARTAMENTO", self.name.as_str(), "DEPARTAMENTO")
            .with(
                "FECHA_CREACION",
                format_date(self.created_at.as_deref()),
                "FECHA CREACIÓN",
            )
            .with("ESTADO", self.status.label(), "ESTADO")
    }

    fn to_sheet_row(&self) -> ReportRecord {
        simple_row(&self.name, self.created_at.as_deref(), self.status)
    }
}

fn simple_row(name: &str, created_at: Option<&str>, status: Status) -> ReportRecord {
    ReportRecord::new()
        .with("NOMBRE", name, "NOMBRE")
        .with("FECHA_CREACION", format_date(created_at), "FECHA_CREACION")
        .with("ESTADO", status.label(), "ESTADO")
}

/// One inventory-control entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InventoryItem {
    #[serde(rename = "ID_CONTROL_INVENTARIO", default)]
    pub id: Option<i64>,
    #[serde(rename = "CODIGO_INVENTARIO", default, deserialize_with = "nullable")]
    pub code: String,
    #[serde(rename = "MARCA", default, deserialize_with = "nullable")]
    pub brand: String,
    #[serde(rename = "ID_TIPO_EQUIPO", default)]
    pub equipment_type_id: Option<i64>,
    #[serde(rename = "ID_DEPARTAMENTO", default)]
    pub department_id: Option<i64>,
    #[serde(rename = "NOMBRE_TIPO_EQUIPO", default, deserialize_with = "nullable")]
    pub equipment_type: String,
    #[serde(rename = "NOMBRE_DEPARTAMENTO", default, deserialize_with = "nullable")]
    pub department: String,
    #[serde(rename = "FECHA_ASIGNACION", default)]
    pub assigned_at: Option<String>,
    #[serde(rename = "NOMBRE_RESPONSABLE", default)]
    pub responsible: Option<String>,
    #[serde(rename = "FECHA_INGRESO_INVENTARIO", default)]
    pub entered_at: Option<String>,
    #[serde(rename = "ESTADO", default, deserialize_with = "nullable")]
    pub status: Status,
}

impl Exportable for InventoryItem {
    fn status(&self) -> Status {
        self.status
    }

    fn to_pdf_record(&self) -> ReportRecord {
        let responsible = self
            .responsible
            .as_deref()
            .filter(|r| !r.trim().is_empty())
            .unwrap_or(MISSING_RESPONSIBLE);
        ReportRecord::new()
            .with("CODIGO_INVENTARIO", self.code.as_str(), "CÓDIGO DE INVENTARIO")
            .with("NOMBRE_RESPONSABLE", responsible, "NOMBRE DEL RESPONSABLE")
            .with("NOMBRE_DEPARTAMENTO", self.department.as_str(), "DEPARTAMENTO")
            .with("NOMBRE_TIPO_EQUIPO", self.equipment_type.as_str(), "TIPO DE EQUIPO")
            .with(
                "FECHA_ASIGNACION",
                format_date_or(self.assigned_at.as_deref(), MISSING_DATE),
                "FECHA DE ASIGNACIÓN",
            )
            .with(
                "FECHA_INGRESO_INVENTARIO",
                format_date_or(self.entered_at.as_deref(), MISSING_DATE),
                "FECHA DE INGRESO",
            )
            .with("ESTADO", self.status.label(), "ESTADO")
            .with("MARCA", self.brand.as_str(), "MARCA")
    }

    fn to_sheet_row(&self) -> ReportRecord {
        ReportRecord::new()
            .with("CODIGO", self.code.as_str(), "CODIGO")
            .with("MARCA", self.brand.as_str(), "MARCA")
            .with(
                "NOMBRE_RESPONSABLE",
                self.responsible.clone(),
                "NOMBRE_RESPONSABLE",
            )
            .with("NOMBRE_DEPARTAMENTO", self.department.as_str(), "NOMBRE_DEPARTAMENTO")
            .with("NOMBRE_TIPO_EQUIPO", self.equipment_type.as_str(), "NOMBRE_TIPO_EQUIPO")
            .with("ESTADO", self.status.label(), "ESTADO")
            .with(
                "FECHA_ASIGNACION",
                format_date(self.assigned_at.as_deref()),
                "FECHA_ASIGNACION",
            )
            .with(
                "FECHA_INGRESO",
                format_date(self.entered_at.as_deref()),
                "FECHA_INGRESO",
            )
    }
}

/// The three listings the console can export.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    EquipmentType,
    Department,
    Inventory,
}

impl EntityKind {
    pub fn parse(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "equipment_type" | "tipo_equipo" => Some(Self::EquipmentType),
            "department" | "departamento" => Some(Self::Department),
            "inventory" | "inventario" => Some(Self::Inventory),
            _ => None,
        }
    }

    /// Key used for schema overrides in the export configuration.
    pub fn config_key(self) -> &'static str {
        match self {
            Self::EquipmentType => "equipment_type",
            Self::Department => "department",
            Self::Inventory => "inventory",
        }
    }

    /// Banner title of the PDF listing.
    pub fn pdf_title(self) -> &'static str {
        match self {
            Self::EquipmentType => "Tipo de Equipo",
            Self::Department => "Departamento",
            Self::Inventory => "Control Inventario",
        }
    }

    /// Download name of the PDF listing.
    pub fn pdf_filename(self) -> &'static str {
        match self {
            Self::EquipmentType => "tipo_equipo.pdf",
            Self::Department => "departamento.pdf",
            Self::Inventory => "control_inventario.pdf",
        }
    }

    /// Title passed to the spreadsheet builder (also the filename stem).
    pub fn sheet_title(self) -> &'static str {
        match self {
            Self::EquipmentType => "Tipo de Equipo",
            Self::Department => "Departamentos",
            Self::Inventory => "Control de Inventario",
        }
    }

    /// Built-in spreadsheet layout with the entity's own header labels.
    pub fn schema(self) -> ReportSchema {
        match self {
            Self::EquipmentType => {
                relabel(ReportSchema::simple(), &[(2, "NOMBRE EQUIPO")])
            }
            Self::Department => {
                relabel(ReportSchema::simple(), &[(2, "NOMBRE DEPARTAMENTO")])
            }
            Self::Inventory => ReportSchema::master(),
        }
    }
}

fn relabel(mut schema: ReportSchema, labels: &[(u32, &str)]) -> ReportSchema {
    for (position, label) in labels {
        if let Some(column) = schema.columns.iter_mut().find(|c| c.column == *position) {
            column.header = (*label).to_string();
        }
    }
    schema
}

/// Records of one listing after the status tab has been applied.
pub fn filter_by_status<T: Exportable>(items: &[T], filter: StatusFilter) -> Vec<&T> {
    items.iter().filter(|i| filter.matches(i.status())).collect()
}

/// Parse an API list payload (enveloped or a bare array) and shape it.
///
/// Returns `(pdf_records, sheet_rows)` for the entities passing `filter`.
pub fn shape_payload(
    kind: EntityKind,
    json: &str,
    filter: StatusFilter,
) -> Result<(Vec<ReportRecord>, Vec<ReportRecord>)> {
    match kind {
        EntityKind::EquipmentType => shape::<EquipmentType>(json, filter),
        EntityKind::Department => shape::<Department>(json, filter),
        EntityKind::Inventory => shape::<InventoryItem>(json, filter),
    }
}

fn shape<T>(json: &str, filter: StatusFilter) -> Result<(Vec<ReportRecord>, Vec<ReportRecord>)>
where
    T: Exportable + serde::de::DeserializeOwned,
{
    let list = match serde_json::from_str::<serde_json::Value>(json)? {
        serde_json::Value::Object(mut envelope) => envelope
            .remove("response")
            .ok_or_else(|| ExportError::Other("payload has no \"response\" list".to_string()))?,
        other => other,
    };
    let items: Vec<T> = serde_json::from_value(list)?;
    let kept = filter_by_status(&items, filter);
    log::debug!(
        "shaped {} of {} records ({filter:?})",
        kept.len(),
        items.len()
    );
    let pdf = kept.iter().map(|i| i.to_pdf_record()).collect();
    let rows = kept.iter().map(|i| i.to_sheet_row()).collect();
    Ok((pdf, rows))
}
