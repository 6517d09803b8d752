//! Minimal `.xlsx` reader: just enough of SpreadsheetML to recover cell
//! text, solid fill colors and hyperlinks for one worksheet.

use std::collections::HashMap;
use std::fs::File;
use std::io::{BufReader, Read, Seek};
use std::path::Path;

use anyhow::{Context, Result, bail};
use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};
use tracing::{debug, warn};
use zip::ZipArchive;
use zip::result::ZipError;

mod cell_ref;
#[cfg(test)]
pub(crate) mod fixtures;
mod relationships;
mod shared_strings;
mod styles;
mod worksheet;

pub use worksheet::{RawCell, RawRow};

use cell_ref::parse_range;
use relationships::{Relationship, parse_relationships, rels_path_for, resolve_part_path};
use shared_strings::parse_shared_strings;
use styles::parse_fill_colors;
use worksheet::{HyperlinkRef, parse_worksheet};

const WORKBOOK_PART: &str = "xl/workbook.xml";
const WORKBOOK_RELS_PART: &str = "xl/_rels/workbook.xml.rels";
const SHARED_STRINGS_PART: &str = "xl/sharedStrings.xml";
const STYLES_PART: &str = "xl/styles.xml";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SheetEntry {
    pub name: String,
    pub part: String,
}

#[derive(Debug, Clone)]
pub struct Sheet {
    pub name: String,
    rows: Vec<RawRow>,
}

impl Sheet {
    /// Contiguous rows from `start_row` (zero-based) to the last defined row.
    /// Rows absent from the sheet XML come back as blank rows.
    pub fn rows_from(&self, start_row: u32) -> Vec<RawRow> {
        let mut rows = Vec::new();
        let mut expected = start_row;

        for row in self.rows.iter().filter(|row| row.index >= start_row) {
            while expected < row.index {
                rows.push(RawRow::blank(expected));
                expected += 1;
            }
            rows.push(row.clone());
            expected = row.index + 1;
        }

        rows
    }

    pub fn defined_row_count(&self) -> usize {
        self.rows.len()
    }
}

pub struct Workbook<R> {
    archive: ZipArchive<R>,
    sheets: Vec<SheetEntry>,
    shared_strings: Vec<String>,
    fill_colors: Vec<Option<String>>,
}

impl Workbook<BufReader<File>> {
    pub fn open(path: &Path) -> Result<Self> {
        let file = File::open(path)
            .with_context(|| format!("failed to open workbook: {}", path.display()))?;
        Self::from_reader(BufReader::new(file))
            .with_context(|| format!("failed to load workbook: {}", path.display()))
    }
}

impl<R: Read + Seek> Workbook<R> {
    pub fn from_reader(reader: R) -> Result<Self> {
        let mut archive = ZipArchive::new(reader).context("workbook is not a zip archive")?;

        let workbook_xml = read_part(&mut archive, WORKBOOK_PART)?
            .with_context(|| format!("workbook is missing {WORKBOOK_PART}"))?;
        let workbook_rels = match read_part(&mut archive, WORKBOOK_RELS_PART)? {
            Some(xml) => parse_relationships(&xml)
                .with_context(|| format!("failed to parse {WORKBOOK_RELS_PART}"))?,
            None => HashMap::new(),
        };
        let sheets = parse_sheet_entries(&workbook_xml, &workbook_rels)
            .with_context(|| format!("failed to parse {WORKBOOK_PART}"))?;

        let shared_strings = match read_part(&mut archive, SHARED_STRINGS_PART)? {
            Some(xml) => parse_shared_strings(&xml)
                .with_context(|| format!("failed to parse {SHARED_STRINGS_PART}"))?,
            None => Vec::new(),
        };
        let fill_colors = match read_part(&mut archive, STYLES_PART)? {
            Some(xml) => {
                parse_fill_colors(&xml).with_context(|| format!("failed to parse {STYLES_PART}"))?
            }
            None => Vec::new(),
        };

        debug!(
            sheets = sheets.len(),
            shared_strings = shared_strings.len(),
            cell_styles = fill_colors.len(),
            "loaded workbook parts"
        );

        Ok(Self {
            archive,
            sheets,
            shared_strings,
            fill_colors,
        })
    }

    pub fn sheets(&self) -> &[SheetEntry] {
        &self.sheets
    }

    pub fn sheet(&mut self, index: usize) -> Result<Sheet> {
        let Some(entry) = self.sheets.get(index).cloned() else {
            bail!(
                "workbook has {} sheet(s); sheet index {} is out of range",
                self.sheets.len(),
                index
            );
        };

        let xml = read_part(&mut self.archive, &entry.part)?
            .with_context(|| format!("workbook is missing sheet part {}", entry.part))?;
        let parsed = parse_worksheet(&xml, &self.shared_strings, &self.fill_colors)
            .with_context(|| format!("failed to parse sheet '{}'", entry.name))?;

        let sheet_rels = match read_part(&mut self.archive, &rels_path_for(&entry.part))? {
            Some(xml) => parse_relationships(&xml)
                .with_context(|| format!("failed to parse relationships of '{}'", entry.name))?,
            None => HashMap::new(),
        };

        let mut rows = parsed.rows;
        apply_hyperlinks(&mut rows, &parsed.hyperlinks, &sheet_rels);

        debug!(sheet = %entry.name, rows = rows.len(), hyperlinks = parsed.hyperlinks.len(), "loaded sheet");

        Ok(Sheet {
            name: entry.name,
            rows,
        })
    }
}

fn parse_sheet_entries(
    xml: &str,
    relationships: &HashMap<String, Relationship>,
) -> Result<Vec<SheetEntry>> {
    let mut reader = Reader::from_str(xml);
    let mut sheets = Vec::new();

    loop {
        match reader.read_event()? {
            Event::Start(e) | Event::Empty(e) if e.local_name().as_ref() == b"sheet" => {
                let name = attribute(&e, b"name")?.unwrap_or_default();
                let relationship_id = attribute(&e, b"id")?
                    .with_context(|| format!("sheet '{name}' has no relationship id"))?;
                let relationship = relationships.get(&relationship_id).with_context(|| {
                    format!("sheet '{name}' references unknown relationship {relationship_id}")
                })?;
                sheets.push(SheetEntry {
                    name,
                    part: resolve_part_path("xl", &relationship.target),
                });
            }
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(sheets)
}

fn apply_hyperlinks(
    rows: &mut [RawRow],
    hyperlinks: &[HyperlinkRef],
    relationships: &HashMap<String, Relationship>,
) {
    for hyperlink in hyperlinks {
        let target = hyperlink
            .relationship_id
            .as_ref()
            .and_then(|id| relationships.get(id))
            .map(|relationship| {
                if !relationship.external {
                    debug!(reference = %hyperlink.reference, target = %relationship.target, "hyperlink points inside the package");
                }
                relationship.target.clone()
            })
            .or_else(|| hyperlink.location.clone());

        let Some(target) = target else {
            warn!(reference = %hyperlink.reference, "hyperlink has no resolvable target");
            continue;
        };

        let Some(range) = parse_range(&hyperlink.reference) else {
            warn!(reference = %hyperlink.reference, "hyperlink reference is not a cell range");
            continue;
        };

        // Only rows the sheet defines are touched. Within each, the anchor
        // cell is materialized and existing cells across the span pick up
        // the link.
        let first = rows.partition_point(|row| row.index < *range.rows.start());
        let last = rows.partition_point(|row| row.index <= *range.rows.end());
        for row in &mut rows[first..last] {
            row.cell_mut_or_insert(*range.columns.start());
            for cell in row
                .cells
                .iter_mut()
                .filter(|cell| range.columns.contains(&cell.column))
            {
                cell.hyperlink = Some(target.clone());
            }
        }
    }
}

fn read_part<R: Read + Seek>(archive: &mut ZipArchive<R>, name: &str) -> Result<Option<String>> {
    let mut file = match archive.by_name(name) {
        Ok(file) => file,
        Err(ZipError::FileNotFound) => return Ok(None),
        Err(err) => {
            return Err(err).with_context(|| format!("failed to open workbook part {name}"));
        }
    };

    let mut content = String::new();
    file.read_to_string(&mut content)
        .with_context(|| format!("failed to read workbook part {name}"))?;
    Ok(Some(content))
}

/// Unescaped value of the attribute whose local name is `key`.
pub(crate) fn attribute(element: &BytesStart<'_>, key: &[u8]) -> Result<Option<String>> {
    for attr in element.attributes() {
        let attr = attr?;
        if attr.key.local_name().as_ref() == key {
            return Ok(Some(attr.unescape_value()?.into_owned()));
        }
    }
    Ok(None)
}
