//! Serialize a [`DocumentLayout`] into PDF bytes with lopdf.

use chrono::NaiveDateTime;
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Dictionary, Document, Object, ObjectId, Stream};

use super::image::DecodedImage;
use super::layout::{DocumentLayout, Element, Rgb};
use super::metrics::{encode_win_ansi, Font};
use crate::error::Result;

const LOGO_RESOURCE: &str = "Im1";

fn real(v: f32) -> Object {
    Object::Real(v.into())
}

fn color_operands(color: Rgb) -> Vec<Object> {
    color.unit().into_iter().map(real).collect()
}

/// Translate one page's elements into content stream operators.
fn page_operations(elements: &[Element], page_height: f32) -> Vec<Operation> {
    let mut ops = Vec::new();
    for element in elements {
        match element {
            Element::Rect {
                x,
                y,
                width,
                height,
                fill,
            } => {
                ops.push(Operation::new("rg", color_operands(*fill)));
                ops.push(Operation::new(
                    "re",
                    vec![real(*x), real(page_height - y - height), real(*width), real(*height)],
                ));
                ops.push(Operation::new("f", vec![]));
            }
            Element::Line {
                x1,
                y1,
                x2,
                y2,
                width,
                color,
            } => {
                ops.push(Operation::new("RG", color_operands(*color)));
                ops.push(Operation::new("w", vec![real(*width)]));
                ops.push(Operation::new("m", vec![real(*x1), real(page_height - y1)]));
                ops.push(Operation::new("l", vec![real(*x2), real(page_height - y2)]));
                ops.push(Operation::new("S", vec![]));
            }
            Element::Text {
                x,
                baseline,
                size,
                font,
                color,
                text,
            } => {
                if text.is_empty() {
                    continue;
                }
                ops.push(Operation::new("rg", color_operands(*color)));
                ops.push(Operation::new("BT", vec![]));
                ops.push(Operation::new(
                    "Tf",
                    vec![font.resource_name().into(), real(*size)],
                ));
                ops.push(Operation::new(
                    "Tm",
                    vec![
                        1.into(),
                        0.into(),
                        0.into(),
                        1.into(),
                        real(*x),
                        real(page_height - baseline),
                    ],
                ));
                ops.push(Operation::new(
                    "Tj",
                    vec![Object::string_literal(encode_win_ansi(text))],
                ));
                ops.push(Operation::new("ET", vec![]));
            }
            Element::Logo {
                x,
                y,
                width,
                height,
            } => {
                ops.push(Operation::new("q", vec![]));
                ops.push(Operation::new(
                    "cm",
                    vec![
                        real(*width),
                        0.into(),
                        0.into(),
                        real(*height),
                        real(*x),
                        real(page_height - y - height),
                    ],
                ));
                ops.push(Operation::new("Do", vec![LOGO_RESOURCE.into()]));
                ops.push(Operation::new("Q", vec![]));
            }
        }
    }
    ops
}

fn font_object(font: Font) -> Dictionary {
    dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => font.base_font(),
        "Encoding" => "WinAnsiEncoding",
    }
}

fn image_object(doc: &mut Document, image: &DecodedImage) -> ObjectId {
    let smask = image.alpha.as_ref().map(|alpha| {
        let dict = dictionary! {
            "Type" => "XObject",
            "Subtype" => "Image",
            "Width" => i64::from(image.width),
            "Height" => i64::from(image.height),
            "ColorSpace" => "DeviceGray",
            "BitsPerComponent" => 8,
            "Filter" => "FlateDecode",
        };
        doc.add_object(Stream::new(dict, alpha.clone()).with_compression(false))
    });
    let mut dict = dictionary! {
        "Type" => "XObject",
        "Subtype" => "Image",
        "Width" => i64::from(image.width),
        "Height" => i64::from(image.height),
        "ColorSpace" => image.color_space,
        "BitsPerComponent" => 8,
        "Filter" => image.filter,
    };
    if image.color_space == "DeviceCMYK" && image.filter == "DCTDecode" {
        // Adobe CMYK JPEGs are stored inverted
        dict.set(
            "Decode",
            vec![1.into(), 0.into(), 1.into(), 0.into(), 1.into(), 0.into(), 1.into(), 0.into()],
        );
    }
    if let Some(smask) = smask {
        dict.set("SMask", smask);
    }
    doc.add_object(Stream::new(dict, image.data.clone()).with_compression(false))
}

/// PDF date string, `D:YYYYMMDDHHmmSS`.
fn pdf_date(at: NaiveDateTime) -> String {
    at.format("D:%Y%m%d%H%M%S").to_string()
}

/// Write `layout` as a PDF document.
pub(crate) fn write_document(
    layout: &DocumentLayout,
    title: &str,
    logo: Option<&DecodedImage>,
    created_at: NaiveDateTime,
) -> Result<Vec<u8>> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let regular = doc.add_object(font_object(Font::Regular));
    let bold = doc.add_object(font_object(Font::Bold));
    let mut resources = dictionary! {
        "Font" => dictionary! {
            Font::Regular.resource_name() => regular,
            Font::Bold.resource_name() => bold,
        },
    };
    if let Some(image) = logo {
        let image_id = image_object(&mut doc, image);
        resources.set("XObject", dictionary! { LOGO_RESOURCE => image_id });
    }
    let resources_id = doc.add_object(resources);

    let media_box = vec![0.into(), 0.into(), real(layout.width), real(layout.height)];
    let mut kids = Vec::with_capacity(layout.pages.len());
    for page in &layout.pages {
        let content = Content {
            operations: page_operations(&page.elements, layout.height),
        };
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode()?));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
        });
        kids.push(Object::Reference(page_id));
    }
    let count = i64::try_from(kids.len()).unwrap_or(i64::MAX);
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => count,
            "Resources" => resources_id,
            "MediaBox" => media_box,
        }),
    );

    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    let info_id = doc.add_object(dictionary! {
        "Title" => Object::string_literal(encode_win_ansi(title)),
        "Producer" => Object::string_literal(format!("inventory-reports {}", env!("CARGO_PKG_VERSION"))),
        "CreationDate" => Object::string_literal(pdf_date(created_at)),
    });
    doc.trailer.set("Root", catalog_id);
    doc.trailer.set("Info", info_id);
    doc.compress();

    let mut bytes = Vec::new();
    doc.save_to(&mut bytes)?;
    log::debug!("wrote PDF: {} page(s), {} bytes", layout.pages.len(), bytes.len());
    Ok(bytes)
}
