use std::collections::HashMap;

use anyhow::Result;
use quick_xml::Reader;
use quick_xml::events::Event;

use super::attribute;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Relationship {
    pub target: String,
    pub external: bool,
}

pub fn parse_relationships(xml: &str) -> Result<HashMap<String, Relationship>> {
    let mut reader = Reader::from_str(xml);
    let mut relationships = HashMap::new();

    loop {
        match reader.read_event()? {
            Event::Start(e) | Event::Empty(e) if e.local_name().as_ref() == b"Relationship" => {
                let Some(id) = attribute(&e, b"Id")? else {
                    continue;
                };
                let Some(target) = attribute(&e, b"Target")? else {
                    continue;
                };
                let external = attribute(&e, b"TargetMode")?
                    .map(|mode| mode.eq_ignore_ascii_case("external"))
                    .unwrap_or(false);
                relationships.insert(id, Relationship { target, external });
            }
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(relationships)
}

/// Resolves a package-internal relationship target against the directory of
/// the part that owns the relationship (`xl` for the workbook).
pub fn resolve_part_path(base_dir: &str, target: &str) -> String {
    if let Some(absolute) = target.strip_prefix('/') {
        return absolute.to_string();
    }

    let mut segments: Vec<&str> = base_dir.split('/').filter(|s| !s.is_empty()).collect();
    for segment in target.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            other => segments.push(other),
        }
    }
    segments.join("/")
}

/// `xl/worksheets/sheet2.xml` -> `xl/worksheets/_rels/sheet2.xml.rels`.
pub fn rels_path_for(part: &str) -> String {
    match part.rsplit_once('/') {
        Some((dir, file)) => format!("{dir}/_rels/{file}.rels"),
        None => format!("_rels/{part}.rels"),
    }
}
