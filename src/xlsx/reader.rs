//! Read a workbook back: sheet names, frozen rows, merges, cell text
//! and the font each cell is drawn with.
//!
//! This is a small inspection reader for produced reports, not a general
//! XLSX parser. It understands inline strings, shared strings and plain
//! numeric values.

use std::collections::{BTreeMap, HashMap};
use std::io::{BufReader, Cursor, Read, Seek};

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use zip::ZipArchive;

use crate::cell_ref::parse_cell_ref;
use crate::error::{ExportError, Result};

/// Font properties resolved for a cell format.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ReadFont {
    pub bold: bool,
    pub size: Option<String>,
    /// ARGB hex, when set explicitly.
    pub color: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ReadCell {
    pub text: String,
    /// `cellXfs` index (`s` attribute).
    pub style: usize,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct ReadSheet {
    pub name: String,
    pub path: String,
    pub frozen_rows: u32,
    pub merges: Vec<String>,
    pub has_drawing: bool,
    /// Keyed by 1-based `(column, row)`.
    pub cells: BTreeMap<(u32, u32), ReadCell>,
}

impl ReadSheet {
    /// Cell text at an A1 reference.
    pub fn text(&self, address: &str) -> Option<&str> {
        let key = parse_cell_ref(address)?;
        self.cells.get(&key).map(|c| c.text.as_str())
    }

    /// Cells in reading order: row by row, left to right.
    pub fn cells_by_row(&self) -> Vec<(u32, u32, &ReadCell)> {
        let mut cells: Vec<_> = self
            .cells
            .iter()
            .map(|(&(col, row), cell)| (col, row, cell))
            .collect();
        cells.sort_by_key(|&(col, row, _)| (row, col));
        cells
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct ReadWorkbook {
    pub sheets: Vec<ReadSheet>,
    /// Font of each `cellXfs` entry.
    pub cell_fonts: Vec<ReadFont>,
}

impl ReadWorkbook {
    pub fn sheet_names(&self) -> Vec<&str> {
        self.sheets.iter().map(|s| s.name.as_str()).collect()
    }

    pub fn sheet(&self, name: &str) -> Option<&ReadSheet> {
        self.sheets.iter().find(|s| s.name == name)
    }

    /// Font used by `cell`, resolved through its cell format.
    pub fn font(&self, cell: &ReadCell) -> Option<&ReadFont> {
        self.cell_fonts.get(cell.style)
    }
}

fn attr_value(e: &BytesStart<'_>, key: &[u8]) -> Option<String> {
    e.attributes()
        .flatten()
        .find(|a| a.key.as_ref() == key)
        .and_then(|a| a.unescape_value().ok().map(|v| v.into_owned()))
}

fn read_part<R: Read + Seek>(archive: &mut ZipArchive<R>, name: &str) -> Result<Option<String>> {
    let mut file = match archive.by_name(name) {
        Ok(file) => file,
        Err(zip::result::ZipError::FileNotFound) => return Ok(None),
        Err(e) => return Err(e.into()),
    };
    let mut out = String::new();
    file.read_to_string(&mut out)?;
    Ok(Some(out))
}

/// Resolve a relationship target against the `xl/` directory.
fn resolve_target(target: &str) -> String {
    if let Some(stripped) = target.strip_prefix('/') {
        stripped.to_string()
    } else {
        format!("xl/{target}")
    }
}

/// rId -> worksheet path, from xl/_rels/workbook.xml.rels.
fn parse_workbook_rels(xml: &str) -> HashMap<String, String> {
    let mut rels = HashMap::new();
    let mut reader = Reader::from_reader(BufReader::new(xml.as_bytes()));
    reader.trim_text(true);
    let mut buf = Vec::new();
    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Empty(ref e) | Event::Start(ref e))
                if e.local_name().as_ref() == b"Relationship" =>
            {
                let id = attr_value(e, b"Id").unwrap_or_default();
                let target = attr_value(e, b"Target").unwrap_or_default();
                let kind = attr_value(e, b"Type").unwrap_or_default();
                if kind.ends_with("/worksheet") && !id.is_empty() {
                    rels.insert(id, resolve_target(&target));
                }
            }
            Ok(Event::Eof) | Err(_) => break,
            _ => {}
        }
        buf.clear();
    }
    rels
}

/// `(name, path)` of every sheet in workbook order.
fn parse_workbook(xml: &str, rels: &HashMap<String, String>) -> Result<Vec<(String, String)>> {
    let mut sheets = Vec::new();
    let mut reader = Reader::from_reader(BufReader::new(xml.as_bytes()));
    reader.trim_text(true);
    let mut buf = Vec::new();
    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Empty(ref e) | Event::Start(ref e) if e.local_name().as_ref() == b"sheet" => {
                let name = attr_value(e, b"name").unwrap_or_default();
                let path = attr_value(e, b"r:id")
                    .and_then(|id| rels.get(&id).cloned())
                    .unwrap_or_else(|| format!("xl/worksheets/sheet{}.xml", sheets.len() + 1));
                sheets.push((name, path));
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }
    Ok(sheets)
}

/// Shared string table, if the package has one.
fn parse_shared_strings(xml: &str) -> Result<Vec<String>> {
    let mut strings = Vec::new();
    let mut reader = Reader::from_reader(BufReader::new(xml.as_bytes()));
    let mut buf = Vec::new();
    let mut current: Option<String> = None;
    let mut in_text = false;
    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(ref e) => match e.local_name().as_ref() {
                b"si" => current = Some(String::new()),
                b"t" => in_text = true,
                _ => {}
            },
            Event::Text(ref t) if in_text => {
                if let Some(s) = current.as_mut() {
                    s.push_str(&t.unescape()?);
                }
            }
            Event::End(ref e) => match e.local_name().as_ref() {
                b"si" => strings.extend(current.take()),
                b"t" => in_text = false,
                _ => {}
            },
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }
    Ok(strings)
}

/// Font of each cellXfs entry in styles.xml.
fn parse_cell_fonts(xml: &str) -> Result<Vec<ReadFont>> {
    let mut fonts = Vec::new();
    let mut xf_fonts = Vec::new();
    let mut current: Option<ReadFont> = None;
    let mut in_fonts = false;
    let mut in_cell_xfs = false;
    let mut reader = Reader::from_reader(BufReader::new(xml.as_bytes()));
    reader.trim_text(true);
    let mut buf = Vec::new();
    loop {
        match reader.read_event_into(&mut buf)? {
            ref event @ (Event::Start(ref e) | Event::Empty(ref e)) => {
                let is_empty = matches!(event, Event::Empty(_));
                match e.local_name().as_ref() {
                    b"fonts" => in_fonts = true,
                    b"cellXfs" => in_cell_xfs = true,
                    b"font" if in_fonts => {
                        if is_empty {
                            fonts.push(ReadFont::default());
                        } else {
                            current = Some(ReadFont::default());
                        }
                    }
                    b"b" => {
                        if let Some(font) = current.as_mut() {
                            font.bold = attr_value(e, b"val").map_or(true, |v| v != "0");
                        }
                    }
                    b"sz" => {
                        if let Some(font) = current.as_mut() {
                            font.size = attr_value(e, b"val");
                        }
                    }
                    b"color" => {
                        if let Some(font) = current.as_mut() {
                            font.color = attr_value(e, b"rgb");
                        }
                    }
                    b"xf" if in_cell_xfs => {
                        let font_id: usize = attr_value(e, b"fontId")
                            .and_then(|v| v.parse().ok())
                            .unwrap_or(0);
                        xf_fonts.push(font_id);
                    }
                    _ => {}
                }
            }
            Event::End(ref e) => match e.local_name().as_ref() {
                b"fonts" => in_fonts = false,
                b"cellXfs" => in_cell_xfs = false,
                b"font" => fonts.extend(current.take()),
                _ => {}
            },
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }
    Ok(xf_fonts
        .into_iter()
        .map(|id| fonts.get(id).cloned().unwrap_or_default())
        .collect())
}

/// Parse one worksheet part.
fn parse_sheet(xml: &str, shared: &[String]) -> Result<ReadSheet> {
    let mut sheet = ReadSheet::default();
    // Text is kept verbatim: titles carry significant edge spaces
    let mut reader = Reader::from_reader(BufReader::new(xml.as_bytes()));
    let mut buf = Vec::new();

    let mut cell: Option<((u32, u32), ReadCell, Option<String>)> = None;
    let mut in_value = false;
    loop {
        match reader.read_event_into(&mut buf)? {
            ref event @ (Event::Start(ref e) | Event::Empty(ref e)) => {
                let is_empty = matches!(event, Event::Empty(_));
                match e.local_name().as_ref() {
                    b"pane" => {
                        let frozen = attr_value(e, b"state").as_deref() == Some("frozen");
                        if frozen {
                            sheet.frozen_rows = attr_value(e, b"ySplit")
                                .and_then(|v| v.parse().ok())
                                .unwrap_or(0);
                        }
                    }
                    b"mergeCell" => sheet.merges.extend(attr_value(e, b"ref")),
                    b"drawing" => sheet.has_drawing = true,
                    b"c" => {
                        let position = attr_value(e, b"r").as_deref().and_then(parse_cell_ref);
                        let style = attr_value(e, b"s").and_then(|v| v.parse().ok()).unwrap_or(0);
                        if let Some(position) = position {
                            let read = ReadCell {
                                text: String::new(),
                                style,
                            };
                            if is_empty {
                                sheet.cells.insert(position, read);
                            } else {
                                cell = Some((position, read, attr_value(e, b"t")));
                            }
                        }
                    }
                    b"v" | b"t" => in_value = cell.is_some(),
                    _ => {}
                }
            }
            Event::Text(ref t) if in_value => {
                if let Some((_, read, _)) = cell.as_mut() {
                    read.text.push_str(&t.unescape()?);
                }
            }
            Event::End(ref e) => match e.local_name().as_ref() {
                b"v" | b"t" => in_value = false,
                b"c" => {
                    if let Some((position, mut read, kind)) = cell.take() {
                        if kind.as_deref() == Some("s") {
                            let index: usize = read.text.trim().parse().map_err(|_| {
                                ExportError::Other(format!("bad shared string index {:?}", read.text))
                            })?;
                            read.text = shared.get(index).cloned().unwrap_or_default();
                        }
                        sheet.cells.insert(position, read);
                    }
                }
                _ => {}
            },
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }
    Ok(sheet)
}

/// Read every sheet of the workbook in `data`.
pub fn read_workbook(data: &[u8]) -> Result<ReadWorkbook> {
    let mut archive = ZipArchive::new(Cursor::new(data))?;

    let rels = read_part(&mut archive, "xl/_rels/workbook.xml.rels")?
        .map(|xml| parse_workbook_rels(&xml))
        .unwrap_or_default();
    let workbook = read_part(&mut archive, "xl/workbook.xml")?
        .ok_or_else(|| ExportError::Other("xl/workbook.xml is missing".to_string()))?;
    let shared = match read_part(&mut archive, "xl/sharedStrings.xml")? {
        Some(xml) => parse_shared_strings(&xml)?,
        None => Vec::new(),
    };
    let cell_fonts = match read_part(&mut archive, "xl/styles.xml")? {
        Some(xml) => parse_cell_fonts(&xml)?,
        None => Vec::new(),
    };

    let mut sheets = Vec::new();
    for (name, path) in parse_workbook(&workbook, &rels)? {
        let xml = read_part(&mut archive, &path)?
            .ok_or_else(|| ExportError::Other(format!("sheet {name:?} points at missing {path}")))?;
        let mut sheet = parse_sheet(&xml, &shared)?;
        sheet.name = name;
        sheet.path = path;
        sheets.push(sheet);
    }
    Ok(ReadWorkbook { sheets, cell_fonts })
}
