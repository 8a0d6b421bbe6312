//! PDF listings read back with lopdf.
#![allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::indexing_slicing,
    clippy::panic
)]

mod common;

use inventory_reports::entity::{shape_payload, EntityKind, StatusFilter};
use inventory_reports::logo::LogoImage;
use inventory_reports::pdf::{build_pdf_report, build_pdf_report_with_style, PdfStyle};
use inventory_reports::types::ReportRecord;

const FOOTER: &str = "Fecha y Hora de Generación: 05/03/2024 08:05:09";

fn records(kind: EntityKind, payload: &str, filter: StatusFilter) -> Vec<ReportRecord> {
    shape_payload(kind, payload, filter).unwrap().0
}

#[test]
fn test_equipment_listing() {
    let records = records(EntityKind::EquipmentType, common::EQUIPMENT_TYPES, StatusFilter::All);
    let bytes = build_pdf_report("Tipo de Equipo", None, &records, common::printed_at()).unwrap();
    assert!(bytes.starts_with(b"%PDF"));

    let pages = common::pdf_page_strings(&bytes);
    assert_eq!(pages.len(), 1);
    let strings = &pages[0];
    for expected in [
        "Tipo de Equipo",
        "TIPO DE EQUIPO",
        "FECHA CREACIÓN",
        "ESTADO",
        "Laptop",
        "Impresora",
        "10/01/2024 15:00:00",
        "INACTIVO",
    ] {
        assert!(strings.iter().any(|s| s == expected), "missing {expected:?}");
    }
    assert_eq!(strings.last().map(String::as_str), Some(FOOTER));
}

#[test]
fn test_headers_follow_first_record_order() {
    let records = records(EntityKind::Department, common::DEPARTMENTS, StatusFilter::All);
    let bytes = build_pdf_report("Departamento", None, &records, common::printed_at()).unwrap();
    let strings = &common::pdf_page_strings(&bytes)[0];
    let position = |label: &str| strings.iter().position(|s| s == label).unwrap();
    assert!(position("DEPARTAMENTO") < position("FECHA CREACIÓN"));
    assert!(position("FECHA CREACIÓN") < position("ESTADO"));
    // Offset timestamps render in UTC
    assert!(strings.iter().any(|s| s == "29/02/2024 10:00:00"));
}

#[test]
fn test_status_filter_limits_rows() {
    let active = records(EntityKind::EquipmentType, common::EQUIPMENT_TYPES, StatusFilter::Active);
    let bytes = build_pdf_report("Tipo de Equipo", None, &active, common::printed_at()).unwrap();
    let strings = &common::pdf_page_strings(&bytes)[0];
    assert!(strings.iter().any(|s| s == "Monitor"));
    assert!(!strings.iter().any(|s| s == "Impresora"));
}

#[test]
fn test_inventory_fallbacks() {
    let records = records(EntityKind::Inventory, &common::inventory_payload(2), StatusFilter::All);
    let bytes =
        build_pdf_report("Control Inventario", None, &records, common::printed_at()).unwrap();
    let strings = &common::pdf_page_strings(&bytes)[0];
    assert!(strings.iter().any(|s| s == "SIN FECHA"));
    assert!(strings.iter().any(|s| s == "Ana Pérez"));
}

#[test]
fn test_long_listing_paginates() {
    let records = records(EntityKind::Inventory, &common::inventory_payload(200), StatusFilter::All);
    let bytes =
        build_pdf_report("Control Inventario", None, &records, common::printed_at()).unwrap();
    let pages = common::pdf_page_strings(&bytes);
    assert!(pages.len() > 1);

    for strings in &pages {
        assert_eq!(strings.last().map(String::as_str), Some(FOOTER));
        // Narrow columns wrap the header label
        assert!(strings.iter().any(|s| s.starts_with("CÓDIGO")));
    }
    // Banner title only on the first page
    assert!(pages[0].iter().any(|s| s == "Control Inventario"));
    assert!(!pages[1].iter().any(|s| s == "Control Inventario"));

    // Every record appears exactly once
    let codes: usize = pages
        .iter()
        .map(|p| p.iter().filter(|s| s.starts_with("INV-")).count())
        .sum();
    assert_eq!(codes, 200);
}

#[test]
fn test_logo_and_style() {
    let logo = LogoImage::from_bytes(common::png_logo()).unwrap();
    let style = PdfStyle {
        body_size: 7.0,
        ..PdfStyle::default()
    };
    let records = records(EntityKind::Department, common::DEPARTMENTS, StatusFilter::All);
    let bytes = build_pdf_report_with_style(
        "Departamento",
        Some(&logo),
        &records,
        common::printed_at(),
        &style,
    )
    .unwrap();
    assert!(common::pdf_has_image(&bytes));

    let plain = build_pdf_report("Departamento", None, &records, common::printed_at()).unwrap();
    assert!(!common::pdf_has_image(&plain));
}
