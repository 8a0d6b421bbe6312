//! Assemble a single-sheet workbook package (the XLSX ZIP container).

use std::io::{Cursor, Write};

use zip::write::FileOptions;
use zip::ZipWriter;

use crate::error::Result;

use super::sheet_writer::{write_sheet_xml, xml_escape, DRAWING_REL_ID};
use super::styles::StyleRegistry;
use super::worksheet::{ImageAnchor, Worksheet};

/// English Metric Units per screen pixel at 96 dpi.
const EMU_PER_PIXEL: u64 = 9525;

pub(crate) const SHEET_PATH: &str = "xl/worksheets/sheet1.xml";

const XML_HEADER: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#;
const REL_NS: &str = "http://schemas.openxmlformats.org/package/2006/relationships";
const DOC_REL: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships";

fn content_types(image: Option<&ImageAnchor>) -> String {
    let mut out = String::from(XML_HEADER);
    out.push_str(
        r#"<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">"#,
    );
    out.push_str(
        r#"<Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/>"#,
    );
    out.push_str(r#"<Default Extension="xml" ContentType="application/xml"/>"#);
    if let Some(anchor) = image {
        let format = anchor.image.format();
        out.push_str(&format!(
            r#"<Default Extension="{}" ContentType="{}"/>"#,
            format.extension(),
            format.mime_type()
        ));
    }
    out.push_str(
        r#"<Override PartName="/xl/workbook.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.sheet.main+xml"/>"#,
    );
    out.push_str(
        r#"<Override PartName="/xl/worksheets/sheet1.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.worksheet+xml"/>"#,
    );
    out.push_str(
        r#"<Override PartName="/xl/styles.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.styles+xml"/>"#,
    );
    if image.is_some() {
        out.push_str(
            r#"<Override PartName="/xl/drawings/drawing1.xml" ContentType="application/vnd.openxmlformats-officedocument.drawing+xml"/>"#,
        );
    }
    out.push_str("</Types>");
    out
}

fn root_rels() -> String {
    format!(
        r#"{XML_HEADER}<Relationships xmlns="{REL_NS}"><Relationship Id="rId1" Type="{DOC_REL}/officeDocument" Target="xl/workbook.xml"/></Relationships>"#
    )
}

fn workbook_xml(sheet_name: &str) -> String {
    format!(
        r#"{XML_HEADER}<workbook xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" xmlns:r="{DOC_REL}"><bookViews><workbookView activeTab="0"/></bookViews><sheets><sheet name="{}" sheetId="1" r:id="rId1"/></sheets></workbook>"#,
        xml_escape(sheet_name)
    )
}

fn workbook_rels() -> String {
    format!(
        r#"{XML_HEADER}<Relationships xmlns="{REL_NS}"><Relationship Id="rId1" Type="{DOC_REL}/worksheet" Target="worksheets/sheet1.xml"/><Relationship Id="rId2" Type="{DOC_REL}/styles" Target="styles.xml"/></Relationships>"#
    )
}

fn sheet_rels() -> String {
    format!(
        r#"{XML_HEADER}<Relationships xmlns="{REL_NS}"><Relationship Id="{DRAWING_REL_ID}" Type="{DOC_REL}/drawing" Target="../drawings/drawing1.xml"/></Relationships>"#
    )
}

fn drawing_rels(anchor: &ImageAnchor) -> String {
    format!(
        r#"{XML_HEADER}<Relationships xmlns="{REL_NS}"><Relationship Id="rId1" Type="{DOC_REL}/image" Target="../media/image1.{}"/></Relationships>"#,
        anchor.image.format().extension()
    )
}

/// Two-cell anchored picture, stretched between the anchor corners.
fn drawing_xml(anchor: &ImageAnchor) -> String {
    let marker = |tag: &str, (col, row): (u32, u32)| {
        format!(
            "<xdr:{tag}><xdr:col>{col}</xdr:col><xdr:colOff>0</xdr:colOff><xdr:row>{row}</xdr:row><xdr:rowOff>0</xdr:rowOff></xdr:{tag}>"
        )
    };
    let cx = u64::from(anchor.width_px) * EMU_PER_PIXEL;
    let cy = u64::from(anchor.height_px) * EMU_PER_PIXEL;
    format!(
        concat!(
            "{header}",
            r#"<xdr:wsDr xmlns:xdr="http://schemas.openxmlformats.org/drawingml/2006/spreadsheetDrawing" "#,
            r#"xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main" xmlns:r="{rel}">"#,
            r#"<xdr:twoCellAnchor editAs="oneCell">{from}{to}"#,
            r#"<xdr:pic><xdr:nvPicPr><xdr:cNvPr id="2" name="Logo"/><xdr:cNvPicPr><a:picLocks noChangeAspect="1"/></xdr:cNvPicPr></xdr:nvPicPr>"#,
            r#"<xdr:blipFill><a:blip r:embed="rId1"/><a:stretch><a:fillRect/></a:stretch></xdr:blipFill>"#,
            r#"<xdr:spPr><a:xfrm><a:off x="0" y="0"/><a:ext cx="{cx}" cy="{cy}"/></a:xfrm><a:prstGeom prst="rect"><a:avLst/></a:prstGeom></xdr:spPr>"#,
            r#"</xdr:pic><xdr:clientData/></xdr:twoCellAnchor></xdr:wsDr>"#
        ),
        header = XML_HEADER,
        rel = DOC_REL,
        from = marker("from", anchor.from),
        to = marker("to", anchor.to),
        cx = cx,
        cy = cy,
    )
}

/// Serialize `sheet` as a complete XLSX file.
pub(crate) fn write_workbook(sheet: &Worksheet) -> Result<Vec<u8>> {
    let mut styles = StyleRegistry::default();
    let sheet_xml = write_sheet_xml(sheet, &mut styles);
    let image = sheet.image();

    let mut parts: Vec<(String, Vec<u8>)> = vec![
        ("[Content_Types].xml".to_string(), content_types(image).into_bytes()),
        ("_rels/.rels".to_string(), root_rels().into_bytes()),
        ("xl/workbook.xml".to_string(), workbook_xml(sheet.name()).into_bytes()),
        ("xl/_rels/workbook.xml.rels".to_string(), workbook_rels().into_bytes()),
        ("xl/styles.xml".to_string(), styles.to_xml().into_bytes()),
        (SHEET_PATH.to_string(), sheet_xml.into_bytes()),
    ];
    if let Some(anchor) = image {
        parts.push(("xl/worksheets/_rels/sheet1.xml.rels".to_string(), sheet_rels().into_bytes()));
        parts.push(("xl/drawings/drawing1.xml".to_string(), drawing_xml(anchor).into_bytes()));
        parts.push((
            "xl/drawings/_rels/drawing1.xml.rels".to_string(),
            drawing_rels(anchor).into_bytes(),
        ));
        parts.push((
            format!("xl/media/image1.{}", anchor.image.format().extension()),
            anchor.image.bytes().to_vec(),
        ));
    }

    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    let options = FileOptions::default().compression_method(zip::CompressionMethod::Deflated);
    for (name, data) in &parts {
        writer.start_file(name.as_str(), options)?;
        writer.write_all(data)?;
    }
    let cursor = writer.finish()?;
    let bytes = cursor.into_inner();
    log::debug!(
        "packaged workbook: {} parts, {} cell formats, {} bytes",
        parts.len(),
        styles.len(),
        bytes.len()
    );
    Ok(bytes)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;
    use std::io::Read;
    use zip::ZipArchive;

    fn part(bytes: &[u8], name: &str) -> String {
        let mut archive = ZipArchive::new(Cursor::new(bytes)).unwrap();
        let mut file = archive.by_name(name).unwrap();
        let mut out = String::new();
        file.read_to_string(&mut out).unwrap();
        out
    }

    #[test]
    fn test_package_without_logo_has_no_drawing() {
        let mut sheet = Worksheet::new("REPORTE DE DEPARTAMENTOS");
        sheet.set_value(2, 1, "x");
        let bytes = write_workbook(&sheet).unwrap();
        let archive = ZipArchive::new(Cursor::new(bytes.as_slice())).unwrap();
        let names: Vec<&str> = archive.file_names().collect();
        assert!(names.contains(&"xl/worksheets/sheet1.xml"));
        assert!(!names.iter().any(|n| n.starts_with("xl/drawings")));
        assert!(part(&bytes, "xl/workbook.xml").contains("name=\"REPORTE DE DEPARTAMENTOS\""));
    }

    #[test]
    fn test_drawing_anchor_size() {
        let anchor = ImageAnchor {
            image: crate::test_support::logo(),
            from: (0, 0),
            to: (1, 3),
            width_px: 350,
            height_px: 350,
        };
        let xml = drawing_xml(&anchor);
        assert!(xml.contains("<xdr:to><xdr:col>1</xdr:col><xdr:colOff>0</xdr:colOff><xdr:row>3</xdr:row>"));
        assert!(xml.contains("<a:ext cx=\"3333750\" cy=\"3333750\"/>"));
    }
}
