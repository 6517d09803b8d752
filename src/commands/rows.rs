use std::io::{self, Write};

use anyhow::{Context, Result};
use tracing::info;

use crate::cli::RowsArgs;
use crate::commands::extract::{LinkTable, ParserState, RowEvent};
use crate::workbook::{RawRow, Workbook};

pub fn run(args: RowsArgs) -> Result<()> {
    let mut workbook = Workbook::open(&args.input)?;
    let sheet = workbook.sheet(args.sheet_index)?;
    let rows = sheet.rows_from(args.start_row);
    let links = args
        .link_table
        .as_deref()
        .map(LinkTable::load)
        .transpose()?;

    info!(sheet = %sheet.name, rows = rows.len(), "classifying rows");

    let events = classify_rows(&rows, links.as_ref())?;

    let mut output = io::BufWriter::new(io::stdout().lock());
    if args.json {
        serde_json::to_writer_pretty(&mut output, &events)
            .context("failed to serialize row events")?;
        writeln!(output)?;
    } else {
        write_text_events(&mut output, &events)?;
    }
    output.flush()?;

    Ok(())
}

/// Scanner events for every row; stops at the first row the scanner rejects.
pub fn classify_rows(rows: &[RawRow], links: Option<&LinkTable>) -> Result<Vec<RowEvent>> {
    let mut state = ParserState::default();
    let mut events = Vec::with_capacity(rows.len());

    for row in rows {
        let event = state
            .scan(row, links)
            .with_context(|| format!("scanner stopped at sheet row {}", row.sheet_row()))?;
        events.push(event);
    }

    Ok(events)
}

pub fn write_text_events(output: &mut impl Write, events: &[RowEvent]) -> Result<()> {
    for event in events {
        match event {
            RowEvent::Marker { row, marker } => {
                writeln!(output, "{}\tmarker\t{:?}", row + 1, marker)?;
            }
            RowEvent::Blank { row, block_closed } => {
                let note = if *block_closed { "\tblock closed" } else { "" };
                writeln!(output, "{}\tblank{}", row + 1, note)?;
            }
            RowEvent::Candidate(candidate) => {
                writeln!(
                    output,
                    "{}\tquest\t{} | {} | {:?}{}",
                    candidate.row + 1,
                    candidate.location,
                    candidate.raw_name,
                    candidate.ordering,
                    candidate
                        .story_branch
                        .as_deref()
                        .map(|branch| format!(" | {branch}"))
                        .unwrap_or_default()
                )?;
                if let Some(detail) = &candidate.detail {
                    writeln!(output, "\tdetail\t{}", detail.detail)?;
                }
            }
            RowEvent::Detached { row, detail } => {
                writeln!(
                    output,
                    "{}\tdetached\t{}",
                    row + 1,
                    detail
                        .as_ref()
                        .map(|detail| detail.detail.as_str())
                        .unwrap_or("")
                )?;
            }
        }
    }

    Ok(())
}
