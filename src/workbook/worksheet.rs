use anyhow::Result;
use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};
use serde::Serialize;

use super::attribute;
use super::cell_ref::parse_cell_ref;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RawCell {
    pub column: u32,
    pub text: Option<String>,
    pub hyperlink: Option<String>,
    pub color: Option<String>,
}

/// One physical sheet row. `index` is zero-based; sheet row numbers are
/// `index + 1`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RawRow {
    pub index: u32,
    pub cells: Vec<RawCell>,
}

impl RawRow {
    pub fn new(index: u32, cells: Vec<RawCell>) -> Self {
        Self { index, cells }
    }

    pub fn blank(index: u32) -> Self {
        Self {
            index,
            cells: Vec::new(),
        }
    }

    pub fn sheet_row(&self) -> u32 {
        self.index + 1
    }

    pub fn cell(&self, column: u32) -> Option<&RawCell> {
        self.cells.iter().find(|cell| cell.column == column)
    }

    pub fn cell_mut_or_insert(&mut self, column: u32) -> &mut RawCell {
        let position = match self.cells.iter().position(|cell| cell.column == column) {
            Some(position) => position,
            None => {
                let position = self
                    .cells
                    .iter()
                    .position(|cell| cell.column > column)
                    .unwrap_or(self.cells.len());
                self.cells.insert(
                    position,
                    RawCell {
                        column,
                        ..RawCell::default()
                    },
                );
                position
            }
        };
        &mut self.cells[position]
    }

    /// Trimmed cell text, `None` when the cell is missing or whitespace only.
    pub fn text_at(&self, column: u32) -> Option<&str> {
        self.cell(column)
            .and_then(|cell| cell.text.as_deref())
            .map(str::trim)
            .filter(|text| !text.is_empty())
    }

    pub fn link_at(&self, column: u32) -> Option<&str> {
        self.cell(column)
            .and_then(|cell| cell.hyperlink.as_deref())
            .filter(|link| !link.trim().is_empty())
    }

    pub fn color_at(&self, column: u32) -> Option<&str> {
        self.cell(column).and_then(|cell| cell.color.as_deref())
    }

    pub fn is_blank(&self) -> bool {
        self.cells.iter().all(|cell| {
            cell.text
                .as_deref()
                .map(|text| text.trim().is_empty())
                .unwrap_or(true)
        })
    }

    pub fn contains_text(&self, needle: &str) -> bool {
        self.cells
            .iter()
            .filter_map(|cell| cell.text.as_deref())
            .any(|text| text.contains(needle))
    }

    /// Trimmed text of the first cell whose text starts with `prefix`.
    pub fn text_starting_with(&self, prefix: &str) -> Option<&str> {
        self.cells
            .iter()
            .filter_map(|cell| cell.text.as_deref())
            .map(str::trim)
            .find(|text| text.starts_with(prefix))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HyperlinkRef {
    pub reference: String,
    pub relationship_id: Option<String>,
    pub location: Option<String>,
}

#[derive(Debug, Default)]
pub struct ParsedWorksheet {
    pub rows: Vec<RawRow>,
    pub hyperlinks: Vec<HyperlinkRef>,
}

#[derive(Debug)]
struct PendingCell {
    column: u32,
    kind: Option<String>,
    color: Option<String>,
    value: String,
    inline: String,
}

pub fn parse_worksheet(
    xml: &str,
    shared_strings: &[String],
    fill_colors: &[Option<String>],
) -> Result<ParsedWorksheet> {
    let mut reader = Reader::from_str(xml);
    let mut parsed = ParsedWorksheet::default();

    let mut row: Option<RawRow> = None;
    let mut next_row_index = 0_u32;
    let mut next_column = 0_u32;
    let mut cell: Option<PendingCell> = None;
    let mut in_value = false;
    let mut in_inline = false;
    let mut in_inline_text = false;
    let mut in_phonetic = false;
    let mut in_hyperlinks = false;

    loop {
        match reader.read_event()? {
            Event::Start(e) => match e.local_name().as_ref() {
                b"row" => {
                    let index = row_index(&e, next_row_index)?;
                    row = Some(RawRow::blank(index));
                    next_row_index = index + 1;
                    next_column = 0;
                }
                b"c" => {
                    let pending = pending_cell(&e, next_column, fill_colors)?;
                    next_column = pending.column + 1;
                    cell = Some(pending);
                }
                b"v" => in_value = true,
                b"is" => in_inline = true,
                b"t" if in_inline && !in_phonetic => in_inline_text = true,
                b"rPh" => in_phonetic = true,
                b"hyperlinks" => in_hyperlinks = true,
                b"hyperlink" if in_hyperlinks => parsed.hyperlinks.push(hyperlink_ref(&e)?),
                _ => {}
            },
            Event::Empty(e) => match e.local_name().as_ref() {
                b"row" => {
                    let index = row_index(&e, next_row_index)?;
                    parsed.rows.push(RawRow::blank(index));
                    next_row_index = index + 1;
                }
                b"c" => {
                    let pending = pending_cell(&e, next_column, fill_colors)?;
                    next_column = pending.column + 1;
                    if let Some(row) = row.as_mut() {
                        row.cells.push(finish_cell(pending, shared_strings));
                    }
                }
                b"hyperlink" if in_hyperlinks => parsed.hyperlinks.push(hyperlink_ref(&e)?),
                _ => {}
            },
            Event::Text(e) => {
                if let Some(pending) = cell.as_mut() {
                    if in_value {
                        pending.value.push_str(&e.unescape()?);
                    } else if in_inline_text {
                        pending.inline.push_str(&e.unescape()?);
                    }
                }
            }
            Event::End(e) => match e.local_name().as_ref() {
                b"row" => {
                    if let Some(done) = row.take() {
                        parsed.rows.push(done);
                    }
                }
                b"c" => {
                    if let (Some(pending), Some(row)) = (cell.take(), row.as_mut()) {
                        row.cells.push(finish_cell(pending, shared_strings));
                    }
                }
                b"v" => in_value = false,
                b"is" => in_inline = false,
                b"t" => in_inline_text = false,
                b"rPh" => in_phonetic = false,
                b"hyperlinks" => in_hyperlinks = false,
                _ => {}
            },
            Event::Eof => break,
            _ => {}
        }
    }

    parsed.rows.sort_by_key(|row| row.index);
    Ok(parsed)
}

fn row_index(e: &BytesStart<'_>, fallback: u32) -> Result<u32> {
    Ok(attribute(e, b"r")?
        .and_then(|raw| raw.trim().parse::<u32>().ok())
        .and_then(|number| number.checked_sub(1))
        .unwrap_or(fallback))
}

fn pending_cell(
    e: &BytesStart<'_>,
    fallback_column: u32,
    fill_colors: &[Option<String>],
) -> Result<PendingCell> {
    let column = attribute(e, b"r")?
        .as_deref()
        .and_then(parse_cell_ref)
        .map(|(column, _)| column)
        .unwrap_or(fallback_column);
    let color = attribute(e, b"s")?
        .and_then(|raw| raw.parse::<usize>().ok())
        .and_then(|style| fill_colors.get(style).cloned().flatten());

    Ok(PendingCell {
        column,
        kind: attribute(e, b"t")?,
        color,
        value: String::new(),
        inline: String::new(),
    })
}

fn hyperlink_ref(e: &BytesStart<'_>) -> Result<HyperlinkRef> {
    Ok(HyperlinkRef {
        reference: attribute(e, b"ref")?.unwrap_or_default(),
        relationship_id: attribute(e, b"id")?,
        location: attribute(e, b"location")?,
    })
}

fn finish_cell(pending: PendingCell, shared_strings: &[String]) -> RawCell {
    let text = match pending.kind.as_deref() {
        Some("s") => pending
            .value
            .trim()
            .parse::<usize>()
            .ok()
            .and_then(|index| shared_strings.get(index).cloned()),
        Some("inlineStr") => Some(pending.inline),
        Some("b") => Some(
            match pending.value.trim() {
                "1" => "true",
                _ => "false",
            }
            .to_string(),
        ),
        Some("n") | None => render_number(&pending.value),
        Some(_) => Some(pending.value),
    };

    RawCell {
        column: pending.column,
        text: text.filter(|text| !text.is_empty()),
        hyperlink: None,
        color: pending.color,
    }
}

fn render_number(raw: &str) -> Option<String> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    match raw.parse::<f64>() {
        Ok(value) if value.fract() == 0.0 && value.abs() < 1e15 => {
            Some(format!("{}", value as i64))
        }
        _ => Some(raw.to_string()),
    }
}
