//! Builds xl/styles.xml from the cell styles a worksheet uses.
//!
//! Fonts, fills, borders and cell formats (xf) are deduplicated; each
//! distinct [`CellStyle`] gets one `cellXfs` index.

use std::collections::HashMap;
use std::fmt::Write as _;

use super::worksheet::{BorderSides, CellStyle, Color, FontStyle, HAlign, VAlign};

/// Index 1 is reserved by Excel for the `gray125` pattern.
const RESERVED_FILLS: usize = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct XfKey {
    font: usize,
    fill: usize,
    border: usize,
    horizontal: HAlign,
    vertical: VAlign,
}

/// Registry of the styles referenced by a worksheet.
#[derive(Debug)]
pub(crate) struct StyleRegistry {
    fonts: Vec<FontStyle>,
    fills: Vec<Color>,
    borders: Vec<BorderSides>,
    xfs: Vec<XfKey>,
    lookup: HashMap<CellStyle, u32>,
}

impl Default for StyleRegistry {
    fn default() -> Self {
        let mut registry = Self {
            fonts: Vec::new(),
            fills: Vec::new(),
            borders: Vec::new(),
            xfs: Vec::new(),
            lookup: HashMap::new(),
        };
        // xf 0 is the workbook default and must exist
        registry.register(&CellStyle::default());
        registry
    }
}

fn index_of<T: PartialEq + Copy>(items: &mut Vec<T>, item: T) -> usize {
    if let Some(i) = items.iter().position(|x| *x == item) {
        return i;
    }
    items.push(item);
    items.len() - 1
}

impl StyleRegistry {
    /// The `s` attribute value for cells drawn in `style`.
    pub(crate) fn register(&mut self, style: &CellStyle) -> u32 {
        if let Some(&xf) = self.lookup.get(style) {
            return xf;
        }
        let font = index_of(&mut self.fonts, style.font);
        let fill = match style.fill {
            Some(color) => index_of(&mut self.fills, color) + RESERVED_FILLS,
            None => 0,
        };
        let border = index_of(&mut self.borders, style.border);
        let key = XfKey {
            font,
            fill,
            border,
            horizontal: style.horizontal,
            vertical: style.vertical,
        };
        let xf = index_of(&mut self.xfs, key);
        let xf = u32::try_from(xf).unwrap_or(0);
        self.lookup.insert(*style, xf);
        xf
    }

    /// Number of distinct cell formats registered so far.
    pub(crate) fn len(&self) -> usize {
        self.xfs.len()
    }

    pub(crate) fn to_xml(&self) -> String {
        let mut out = String::with_capacity(2048);
        out.push_str(r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#);
        out.push('\n');
        out.push_str(
            r#"<styleSheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main">"#,
        );
        out.push('\n');

        let _ = write!(out, "<fonts count=\"{}\">", self.fonts.len());
        for font in &self.fonts {
            out.push_str("<font>");
            if font.bold {
                out.push_str("<b/>");
            }
            let _ = write!(out, "<sz val=\"{}\"/>", font.size);
            match font.color {
                Some(color) => {
                    let _ = write!(out, "<color rgb=\"{color}\"/>");
                }
                None => out.push_str("<color theme=\"1\"/>"),
            }
            out.push_str("<name val=\"Calibri\"/><family val=\"2\"/><scheme val=\"minor\"/></font>");
        }
        out.push_str("</fonts>\n");

        let _ = write!(out, "<fills count=\"{}\">", self.fills.len() + RESERVED_FILLS);
        out.push_str("<fill><patternFill patternType=\"none\"/></fill>");
        out.push_str("<fill><patternFill patternType=\"gray125\"/></fill>");
        for color in &self.fills {
            let _ = write!(
                out,
                "<fill><patternFill patternType=\"solid\"><fgColor rgb=\"{color}\"/><bgColor indexed=\"64\"/></patternFill></fill>"
            );
        }
        out.push_str("</fills>\n");

        let _ = write!(out, "<borders count=\"{}\">", self.borders.len());
        for border in &self.borders {
            out.push_str("<border>");
            for (side, on) in [
                ("left", border.left),
                ("right", border.right),
                ("top", border.top),
                ("bottom", border.bottom),
            ] {
                if on {
                    let _ = write!(
                        out,
                        "<{side} style=\"thin\"><color rgb=\"{}\"/></{side}>",
                        Color::BLACK
                    );
                } else {
                    let _ = write!(out, "<{side}/>");
                }
            }
            out.push_str("<diagonal/></border>");
        }
        out.push_str("</borders>\n");

        out.push_str(
            "<cellStyleXfs count=\"1\"><xf numFmtId=\"0\" fontId=\"0\" fillId=\"0\" borderId=\"0\"/></cellStyleXfs>\n",
        );

        let _ = write!(out, "<cellXfs count=\"{}\">", self.xfs.len());
        for xf in &self.xfs {
            let _ = write!(
                out,
                "<xf numFmtId=\"0\" fontId=\"{}\" fillId=\"{}\" borderId=\"{}\" xfId=\"0\"",
                xf.font, xf.fill, xf.border
            );
            if xf.font != 0 {
                out.push_str(" applyFont=\"1\"");
            }
            if xf.fill != 0 {
                out.push_str(" applyFill=\"1\"");
            }
            if xf.border != 0 {
                out.push_str(" applyBorder=\"1\"");
            }
            let horizontal = match xf.horizontal {
                HAlign::General => None,
                HAlign::Left => Some("left"),
                HAlign::Center => Some("center"),
            };
            let vertical = match xf.vertical {
                VAlign::Bottom => None,
                VAlign::Center => Some("center"),
            };
            if horizontal.is_none() && vertical.is_none() {
                out.push_str("/>");
                continue;
            }
            out.push_str(" applyAlignment=\"1\"><alignment");
            if let Some(h) = horizontal {
                let _ = write!(out, " horizontal=\"{h}\"");
            }
            if let Some(v) = vertical {
                let _ = write!(out, " vertical=\"{v}\"");
            }
            out.push_str("/></xf>");
        }
        out.push_str("</cellXfs>\n");

        out.push_str(
            "<cellStyles count=\"1\"><cellStyle name=\"Normal\" xfId=\"0\" builtinId=\"0\"/></cellStyles>\n",
        );
        out.push_str("</styleSheet>");
        out
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;

    fn header_style() -> CellStyle {
        CellStyle {
            font: FontStyle {
                bold: true,
                size: 17,
                color: Some(Color::WHITE),
            },
            fill: Some(Color::BLACK),
            border: BorderSides::BOX,
            horizontal: HAlign::Center,
            vertical: VAlign::Center,
        }
    }

    #[test]
    fn test_default_style_is_xf_zero() {
        let mut registry = StyleRegistry::default();
        assert_eq!(registry.register(&CellStyle::default()), 0);
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_styles_are_deduplicated() {
        let mut registry = StyleRegistry::default();
        let a = registry.register(&header_style());
        let b = registry.register(&header_style());
        assert_eq!(a, b);
        assert_eq!(registry.len(), 2);

        let mut red = CellStyle::default();
        red.font.color = Some(Color::RED);
        assert_eq!(registry.register(&red), 2);
    }

    #[test]
    fn test_xml_lists_header_parts() {
        let mut registry = StyleRegistry::default();
        registry.register(&header_style());
        let xml = registry.to_xml();
        assert!(xml.contains("<fills count=\"3\">"));
        assert!(xml.contains("<fgColor rgb=\"FF000000\"/>"));
        assert!(xml.contains("<b/><sz val=\"17\"/><color rgb=\"FFFFFFFF\"/>"));
        assert!(xml.contains("<left style=\"thin\"><color rgb=\"FF000000\"/></left>"));
        assert!(xml.contains("<alignment horizontal=\"center\" vertical=\"center\"/>"));
        assert!(xml.contains("<cellXfs count=\"2\">"));
    }
}
