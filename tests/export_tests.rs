//! End-to-end exports: payload shaping, configuration and the exporter
//! the browser surface drives.
#![allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::indexing_slicing,
    clippy::panic
)]

mod common;

use std::fs;

use inventory_reports::config::ExportConfig;
use inventory_reports::entity::{shape_payload, EntityKind, StatusFilter};
use inventory_reports::types::FieldValue;
use inventory_reports::xlsx::reader::read_workbook;
use inventory_reports::{render_report, ReportExporter, ReportFormat};

#[test]
fn test_envelope_and_bare_array_shape_alike() {
    let bare = r#"[{"ID_TIPO_EQUIPO": 1, "NOMBRE_TIPO_EQUIPO": "Laptop", "ESTADO": "A"}]"#;
    let enveloped = format!("{{\"response\": {bare}}}");
    let a = shape_payload(EntityKind::EquipmentType, bare, StatusFilter::All).unwrap();
    let b = shape_payload(EntityKind::EquipmentType, &enveloped, StatusFilter::All).unwrap();
    assert_eq!(a, b);
}

#[test]
fn test_status_tabs() {
    let count = |filter| {
        shape_payload(EntityKind::EquipmentType, common::EQUIPMENT_TYPES, filter)
            .unwrap()
            .1
            .len()
    };
    assert_eq!(count(StatusFilter::All), 3);
    assert_eq!(count(StatusFilter::Active), 2);
    assert_eq!(count(StatusFilter::Inactive), 1);
}

#[test]
fn test_sheet_rows_use_utc_dates() {
    let (_, rows) =
        shape_payload(EntityKind::Department, common::DEPARTMENTS, StatusFilter::All).unwrap();
    assert_eq!(
        rows[1].value("FECHA_CREACION"),
        &FieldValue::from("29/02/2024 10:00:00")
    );
    assert_eq!(rows[0].value("ESTADO"), &FieldValue::from("ACTIVO"));
}

#[test]
fn test_malformed_payload_is_an_error() {
    assert!(shape_payload(EntityKind::Department, "{", StatusFilter::All).is_err());
    assert!(shape_payload(EntityKind::Department, r#"{"rows": []}"#, StatusFilter::All).is_err());
    assert!(
        shape_payload(EntityKind::Department, r#"[{"NOMBRE_DEPARTAMENTO": 5}]"#, StatusFilter::All)
            .is_err()
    );
}

#[test]
fn test_render_uses_download_names() {
    let config = ExportConfig::default();
    let cases = [
        (ReportFormat::Pdf, EntityKind::EquipmentType, "tipo_equipo.pdf"),
        (ReportFormat::Pdf, EntityKind::Inventory, "control_inventario.pdf"),
        (ReportFormat::Xlsx, EntityKind::Department, "Departamentos.xlsx"),
        (ReportFormat::Xlsx, EntityKind::Inventory, "ControldeInventario.xlsx"),
    ];
    for (format, kind, filename) in cases {
        let report = render_report(
            format,
            kind,
            "[]",
            StatusFilter::All,
            None,
            &config,
            common::printed_at(),
        )
        .unwrap();
        assert_eq!(report.filename, filename);
        assert_eq!(report.mime_type, format.mime_type());
    }
}

#[test]
fn test_config_file_overrides_schema_and_resolves_logo() {
    let dir = std::env::temp_dir().join(format!("inventory-reports-{}", std::process::id()));
    fs::create_dir_all(&dir).unwrap();
    fs::write(dir.join("logo.png"), common::png_logo()).unwrap();

    let mut schema = EntityKind::Department.schema();
    schema.columns[0].header = "ÁREA".to_string();
    let config_json = serde_json::json!({
        "logo": "logo.png",
        "schemas": { "department": schema },
    });
    let config_path = dir.join("export.json");
    fs::write(&config_path, config_json.to_string()).unwrap();

    let config = ExportConfig::load(&config_path).unwrap();
    assert_eq!(config.logo.as_deref(), Some(dir.join("logo.png").as_path()));

    let report = render_report(
        ReportFormat::Xlsx,
        EntityKind::Department,
        common::DEPARTMENTS,
        StatusFilter::All,
        None,
        &config,
        common::printed_at(),
    )
    .unwrap();
    let workbook = read_workbook(&report.bytes).unwrap();
    assert_eq!(workbook.sheets[0].text("B4"), Some("ÁREA"));

    fs::remove_dir_all(&dir).ok();
}

#[test]
fn test_exporter_runs_one_export_at_a_time() {
    let exporter = ReportExporter::default();
    let mut outer = None;
    let ok = exporter.export_with(
        ReportFormat::Pdf,
        EntityKind::Department,
        common::DEPARTMENTS,
        StatusFilter::All,
        common::printed_at(),
        |report| {
            assert!(exporter.is_busy());
            // A click while this export is pending is refused
            let nested = exporter.export_with(
                ReportFormat::Xlsx,
                EntityKind::Department,
                common::DEPARTMENTS,
                StatusFilter::All,
                common::printed_at(),
                |_| Ok(()),
            );
            assert!(!nested);
            outer = Some(report.filename.clone());
            Ok(())
        },
    );
    assert!(ok);
    assert_eq!(outer.as_deref(), Some("departamento.pdf"));
    assert!(!exporter.is_busy());
}
