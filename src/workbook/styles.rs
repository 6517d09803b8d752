use anyhow::Result;
use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};

use super::attribute;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    Other,
    Fills,
    CellXfs,
}

#[derive(Debug, Default)]
struct FillBuilder {
    pattern: Option<String>,
    foreground: Option<String>,
    background: Option<String>,
}

impl FillBuilder {
    fn color(self) -> Option<String> {
        if matches!(self.pattern.as_deref(), Some("none") | Some("gray125")) {
            return None;
        }
        self.foreground.or(self.background)
    }
}

/// Background color for every `cellXfs` entry, indexed by the cell `s` attribute.
pub fn parse_fill_colors(xml: &str) -> Result<Vec<Option<String>>> {
    let mut reader = Reader::from_str(xml);
    let mut section = Section::Other;
    let mut fills: Vec<Option<String>> = Vec::new();
    let mut fill: Option<FillBuilder> = None;
    let mut xf_fill_ids: Vec<Option<usize>> = Vec::new();

    loop {
        match reader.read_event()? {
            Event::Start(e) => {
                handle_open(&e, &mut section, &mut fill, &mut xf_fill_ids)?;
            }
            Event::Empty(e) => {
                handle_open(&e, &mut section, &mut fill, &mut xf_fill_ids)?;
                if section == Section::Fills && e.local_name().as_ref() == b"fill" {
                    fills.push(fill.take().and_then(FillBuilder::color));
                }
            }
            Event::End(e) => match e.local_name().as_ref() {
                b"fills" | b"cellXfs" => section = Section::Other,
                b"fill" if section == Section::Fills => {
                    fills.push(fill.take().and_then(FillBuilder::color));
                }
                _ => {}
            },
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(xf_fill_ids
        .into_iter()
        .map(|fill_id| fill_id.and_then(|id| fills.get(id).cloned().flatten()))
        .collect())
}

fn handle_open(
    e: &BytesStart<'_>,
    section: &mut Section,
    fill: &mut Option<FillBuilder>,
    xf_fill_ids: &mut Vec<Option<usize>>,
) -> Result<()> {
    match (e.local_name().as_ref(), *section) {
        (b"fills", _) => *section = Section::Fills,
        (b"cellXfs", _) => *section = Section::CellXfs,
        (b"fill", Section::Fills) => *fill = Some(FillBuilder::default()),
        (b"patternFill", Section::Fills) => {
            if let Some(fill) = fill.as_mut() {
                fill.pattern = attribute(e, b"patternType")?;
            }
        }
        (b"fgColor", Section::Fills) => {
            if let Some(fill) = fill.as_mut() {
                fill.foreground = attribute(e, b"rgb")?.as_deref().and_then(normalize_rgb);
            }
        }
        (b"bgColor", Section::Fills) => {
            if let Some(fill) = fill.as_mut() {
                fill.background = attribute(e, b"rgb")?.as_deref().and_then(normalize_rgb);
            }
        }
        (b"xf", Section::CellXfs) => {
            let fill_id = attribute(e, b"fillId")?.and_then(|raw| raw.parse::<usize>().ok());
            xf_fill_ids.push(fill_id);
        }
        _ => {}
    }
    Ok(())
}

/// `FFE06666` or `e06666` -> `e06666`.
pub fn normalize_rgb(raw: &str) -> Option<String> {
    let raw = raw.trim().trim_start_matches('#');
    if !raw.is_ascii() {
        return None;
    }
    let rgb = match raw.len() {
        8 => &raw[2..],
        6 => raw,
        _ => return None,
    };
    if !rgb.chars().all(|ch| ch.is_ascii_hexdigit()) {
        return None;
    }
    Some(rgb.to_ascii_lowercase())
}
