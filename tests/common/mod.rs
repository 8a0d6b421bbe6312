//! Common test utilities: API payload fixtures, a tiny logo, and helpers
//! that read produced PDFs back.
#![allow(
    dead_code,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::indexing_slicing,
    clippy::panic,
    clippy::cast_possible_truncation
)]

use std::io::Write;

use chrono::{NaiveDate, NaiveDateTime};
use flate2::write::ZlibEncoder;
use flate2::Compression;
use lopdf::content::Content;
use lopdf::Document;

/// Fixed wall-clock time used for every report timestamp in tests.
#[must_use]
pub fn printed_at() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 3, 5)
        .and_then(|d| d.and_hms_opt(8, 5, 9))
        .unwrap()
}

// ============================================================================
// Payload fixtures
// ============================================================================

pub const EQUIPMENT_TYPES: &str = r#"{"response": [
    {"ID_TIPO_EQUIPO": 1, "NOMBRE_TIPO_EQUIPO": "Laptop", "FECHA_CREACION": "2024-01-10T15:00:00Z", "ESTADO": "A"},
    {"ID_TIPO_EQUIPO": 2, "NOMBRE_TIPO_EQUIPO": "Impresora", "FECHA_CREACION": "2024-01-11T09:15:30Z", "ESTADO": "I"},
    {"ID_TIPO_EQUIPO": 3, "NOMBRE_TIPO_EQUIPO": "Monitor", "FECHA_CREACION": null, "ESTADO": "A"}
]}"#;

pub const DEPARTMENTS: &str = r#"[
    {"ID_DEPARTAMENTO": 10, "NOMBRE_DEPARTAMENTO": "Bodega", "FECHA_CREACION": "2023-12-31T23:59:59Z", "ESTADO": "A"},
    {"ID_DEPARTAMENTO": 11, "NOMBRE_DEPARTAMENTO": "Contabilidad", "FECHA_CREACION": "2024-02-29T12:00:00+02:00", "ESTADO": "A"}
]"#;

/// Inventory payload with `n` entries; entry 6 (0-based) is inactive.
#[must_use]
pub fn inventory_payload(n: usize) -> String {
    let items: Vec<serde_json::Value> = (0..n)
        .map(|i| {
            serde_json::json!({
                "ID_CONTROL_INVENTARIO": i,
                "CODIGO_INVENTARIO": format!("INV-{i:03}"),
                "MARCA": "Dell",
                "ID_TIPO_EQUIPO": 1,
                "ID_DEPARTAMENTO": 10,
                "NOMBRE_TIPO_EQUIPO": "Laptop",
                "NOMBRE_DEPARTAMENTO": "Bodega",
                "FECHA_ASIGNACION": "2024-03-01T10:00:00Z",
                "NOMBRE_RESPONSABLE": if i % 2 == 0 { serde_json::Value::from("Ana Pérez") } else { serde_json::Value::Null },
                "FECHA_INGRESO_INVENTARIO": null,
                "ESTADO": if i == 6 { "I" } else { "A" },
            })
        })
        .collect();
    serde_json::json!({ "response": items }).to_string()
}

// ============================================================================
// Images
// ============================================================================

fn png_chunk(out: &mut Vec<u8>, kind: &[u8; 4], body: &[u8]) {
    out.extend_from_slice(&(body.len() as u32).to_be_bytes());
    out.extend_from_slice(kind);
    out.extend_from_slice(body);
    out.extend_from_slice(&[0, 0, 0, 0]);
}

/// An opaque 8x4 RGB PNG.
#[must_use]
pub fn png_logo() -> Vec<u8> {
    let (width, height) = (8u32, 4u32);
    let mut raw = Vec::new();
    for _ in 0..height {
        raw.push(0);
        for x in 0..width {
            raw.extend_from_slice(&[0x28, 0x3A, (x * 30) as u8]);
        }
    }
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(&raw).unwrap();
    let idat = encoder.finish().unwrap();

    let mut out = vec![0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];
    let mut ihdr = Vec::new();
    ihdr.extend_from_slice(&width.to_be_bytes());
    ihdr.extend_from_slice(&height.to_be_bytes());
    ihdr.extend_from_slice(&[8, 2, 0, 0, 0]);
    png_chunk(&mut out, b"IHDR", &ihdr);
    png_chunk(&mut out, b"IDAT", &idat);
    png_chunk(&mut out, b"IEND", &[]);
    out
}

// ============================================================================
// PDF inspection
// ============================================================================

/// Every `Tj` string of every page, in page order, decoded as Latin-1.
#[must_use]
pub fn pdf_page_strings(bytes: &[u8]) -> Vec<Vec<String>> {
    let doc = Document::load_mem(bytes).expect("Failed to load PDF");
    doc.get_pages()
        .values()
        .map(|&page_id| {
            let content = doc.get_page_content(page_id).unwrap();
            Content::decode(&content)
                .unwrap()
                .operations
                .iter()
                .filter(|op| op.operator == "Tj")
                .map(|op| {
                    op.operands[0]
                        .as_str()
                        .unwrap()
                        .iter()
                        .map(|&b| char::from(b))
                        .collect()
                })
                .collect()
        })
        .collect()
}

/// Whether the document holds an image XObject.
#[must_use]
pub fn pdf_has_image(bytes: &[u8]) -> bool {
    let doc = Document::load_mem(bytes).expect("Failed to load PDF");
    doc.objects.values().any(|obj| {
        obj.as_stream()
            .ok()
            .and_then(|s| s.dict.get(b"Subtype").ok())
            .and_then(|t| t.as_name().ok())
            == Some(b"Image".as_slice())
    })
}
