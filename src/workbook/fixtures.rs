//! In-memory `.xlsx` builder for tests.

use std::io::{Cursor, Write};

use zip::ZipWriter;
use zip::write::FileOptions;

#[derive(Debug, Clone, Default)]
pub struct FixtureCell {
    pub column: u32,
    pub text: Option<String>,
    pub link: Option<String>,
    pub color: Option<String>,
}

impl FixtureCell {
    pub fn text(column: u32, text: &str) -> Self {
        Self {
            column,
            text: Some(text.to_string()),
            ..Self::default()
        }
    }

    pub fn quest(column: u32, text: &str, link: &str, color: &str) -> Self {
        Self {
            column,
            text: Some(text.to_string()),
            link: Some(link.to_string()),
            color: Some(color.to_string()),
        }
    }
}

/// Two-sheet workbook: an empty `Intro` sheet and a `Quests` sheet holding
/// `rows`, each given as a 1-based sheet row number and its cells.
pub fn quest_workbook(rows: &[(u32, Vec<FixtureCell>)]) -> Vec<u8> {
    let mut colors: Vec<String> = Vec::new();
    for (_, cells) in rows {
        for color in cells.iter().filter_map(|cell| cell.color.as_ref()) {
            if !colors.contains(color) {
                colors.push(color.clone());
            }
        }
    }

    let mut sheet_data = String::new();
    let mut hyperlinks = String::new();
    let mut sheet_rels = String::new();
    let mut link_count = 0;

    for (row_number, cells) in rows {
        sheet_data.push_str(&format!(r#"<row r="{row_number}">"#));
        for cell in cells {
            let reference = format!("{}{}", column_letter(cell.column), row_number);
            let style = cell
                .color
                .as_ref()
                .and_then(|color| colors.iter().position(|known| known == color))
                .map(|position| format!(r#" s="{}""#, position + 1))
                .unwrap_or_default();
            match &cell.text {
                Some(text) => sheet_data.push_str(&format!(
                    r#"<c r="{reference}"{style} t="inlineStr"><is><t>{}</t></is></c>"#,
                    escape(text)
                )),
                None => sheet_data.push_str(&format!(r#"<c r="{reference}"{style}/>"#)),
            }
            if let Some(link) = &cell.link {
                link_count += 1;
                hyperlinks.push_str(&format!(
                    r#"<hyperlink ref="{reference}" r:id="rIdLink{link_count}"/>"#
                ));
                sheet_rels.push_str(&format!(
                    r#"<Relationship Id="rIdLink{link_count}" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/hyperlink" Target="{}" TargetMode="External"/>"#,
                    escape(link)
                ));
            }
        }
        sheet_data.push_str("</row>");
    }

    let hyperlinks = if hyperlinks.is_empty() {
        String::new()
    } else {
        format!("<hyperlinks>{hyperlinks}</hyperlinks>")
    };

    let worksheet = format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<worksheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships"><sheetData>{sheet_data}</sheetData>{hyperlinks}</worksheet>"#
    );

    let mut fills = String::from(
        r#"<fill><patternFill patternType="none"/></fill><fill><patternFill patternType="gray125"/></fill>"#,
    );
    let mut xfs = String::from(r#"<xf numFmtId="0" fontId="0" fillId="0" xfId="0"/>"#);
    for (position, color) in colors.iter().enumerate() {
        fills.push_str(&format!(
            r#"<fill><patternFill patternType="solid"><fgColor rgb="FF{}"/><bgColor rgb="FF{}"/></patternFill></fill>"#,
            color.to_ascii_uppercase(),
            color.to_ascii_uppercase()
        ));
        xfs.push_str(&format!(
            r#"<xf numFmtId="0" fontId="0" fillId="{}" xfId="0" applyFill="1"/>"#,
            position + 2
        ));
    }
    let styles = format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<styleSheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main"><fills count="{}">{fills}</fills><cellXfs count="{}">{xfs}</cellXfs></styleSheet>"#,
        colors.len() + 2,
        colors.len() + 1
    );

    let workbook = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<workbook xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships"><sheets><sheet name="Intro" sheetId="1" r:id="rId1"/><sheet name="Quests" sheetId="2" r:id="rId2"/></sheets></workbook>"#;
    let workbook_rels = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet" Target="worksheets/sheet1.xml"/><Relationship Id="rId2" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet" Target="worksheets/sheet2.xml"/><Relationship Id="rId3" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/styles" Target="styles.xml"/></Relationships>"#;
    let intro = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<worksheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main"><sheetData/></worksheet>"#;
    let sheet_rels = format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">{sheet_rels}</Relationships>"#
    );

    zip_parts(&[
        ("xl/workbook.xml", workbook),
        ("xl/_rels/workbook.xml.rels", workbook_rels),
        ("xl/styles.xml", &styles),
        ("xl/worksheets/sheet1.xml", intro),
        ("xl/worksheets/sheet2.xml", &worksheet),
        ("xl/worksheets/_rels/sheet2.xml.rels", &sheet_rels),
    ])
}

pub fn zip_parts(parts: &[(&str, &str)]) -> Vec<u8> {
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    for (name, content) in parts {
        writer
            .start_file(*name, FileOptions::default())
            .expect("start zip entry");
        writer
            .write_all(content.as_bytes())
            .expect("write zip entry");
    }
    writer.finish().expect("finish zip").into_inner()
}

fn column_letter(column: u32) -> String {
    let mut column = column + 1;
    let mut letters = Vec::new();
    while column > 0 {
        let remainder = (column - 1) % 26;
        letters.push((b'A' + remainder as u8) as char);
        column = (column - 1) / 26;
    }
    letters.iter().rev().collect()
}

fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}
