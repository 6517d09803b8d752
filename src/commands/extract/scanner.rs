use serde::Serialize;
use tracing::{debug, trace};

use super::links::LinkTable;
use super::markers::{
    ANNOTATION_SPAN, CONSIDER_IGNORING_MESSAGE, Marker, ONLY_REASON_MESSAGE, classify_marker,
};
use crate::error::ExtractError;
use crate::model::ExtraDetail;
use crate::workbook::RawRow;

pub const LOCATION_COLUMN: u32 = 0;
pub const QUEST_COLUMN: u32 = 1;
pub const DETAIL_COLUMN: u32 = 3;

const BLOCK_END_BLANK_ROWS: u32 = 2;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub enum OrderingMode {
    #[default]
    Sequential,
    Unordered,
}

/// The last quest-name cell seen, carried over rows that only add details.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HeldQuest {
    pub raw_name: String,
    pub url: String,
    pub color: String,
    pub row: u32,
}

/// Sticky state threaded through the row loop of one extraction run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParserState {
    pub current_location: Option<String>,
    pub current_quest: Option<HeldQuest>,
    pub current_story_branch: Option<String>,
    pub ordering_mode: OrderingMode,
    pub suppression_countdown: u32,
    pub annotation_countdown: u32,
    pub consecutive_blank_rows: u32,
}

/// A data row resolved against the parser state, ready for aggregation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CandidateRow {
    pub row: u32,
    pub quest_row: u32,
    pub location: String,
    pub raw_name: String,
    pub url: String,
    pub color: String,
    pub story_branch: Option<String>,
    pub ordering: OrderingMode,
    pub detail: Option<ExtraDetail>,
    pub consider_ignoring: bool,
    pub message: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum RowEvent {
    Marker { row: u32, marker: Marker },
    Blank { row: u32, block_closed: bool },
    Candidate(CandidateRow),
    /// A data row with no location or quest to attribute it to.
    Detached { row: u32, detail: Option<ExtraDetail> },
}

impl ParserState {
    pub fn scan(
        &mut self,
        row: &RawRow,
        links: Option<&LinkTable>,
    ) -> Result<RowEvent, ExtractError> {
        trace!(row = row.sheet_row(), cells = ?row.cells, "scanning row");

        if let Some(marker) = classify_marker(row) {
            self.apply_marker(&marker);
            debug!(row = row.sheet_row(), marker = ?marker, "control marker");
            return Ok(RowEvent::Marker {
                row: row.index,
                marker,
            });
        }

        if row.is_blank() {
            self.consecutive_blank_rows += 1;
            let block_closed = self.consecutive_blank_rows == BLOCK_END_BLANK_ROWS;
            if block_closed {
                self.close_block();
                debug!(row = row.sheet_row(), "block closed by blank rows");
            }
            return Ok(RowEvent::Blank {
                row: row.index,
                block_closed,
            });
        }

        self.consecutive_blank_rows = 0;
        self.scan_data_row(row, links)
    }

    fn apply_marker(&mut self, marker: &Marker) {
        match marker {
            Marker::AnyOrderStart => {
                self.ordering_mode = OrderingMode::Unordered;
                self.current_story_branch = None;
                self.consecutive_blank_rows = 0;
            }
            Marker::OrderEnd => self.close_block(),
            Marker::StoryBranch(branch) => self.current_story_branch = Some(branch.clone()),
            Marker::ConsiderIgnoring => self.suppression_countdown = 1,
            // The marker row consumes the first step of the span.
            Marker::OnlyReason => self.annotation_countdown = ANNOTATION_SPAN - 1,
        }
    }

    /// End of a document block: ordering returns to sequential, branch and
    /// pending notes are dropped and detail rows can no longer reach back to
    /// the previous quest.
    fn close_block(&mut self) {
        self.ordering_mode = OrderingMode::Sequential;
        self.current_story_branch = None;
        self.suppression_countdown = 0;
        self.annotation_countdown = 0;
        self.current_quest = None;
    }

    fn scan_data_row(
        &mut self,
        row: &RawRow,
        links: Option<&LinkTable>,
    ) -> Result<RowEvent, ExtractError> {
        if let Some(location) = row.text_at(LOCATION_COLUMN) {
            self.current_location = Some(location.to_string());
        }

        if let Some(raw_name) = row.text_at(QUEST_COLUMN) {
            self.current_quest = Some(resolve_quest_cell(row, raw_name, links)?);
        }

        let detail = row.text_at(DETAIL_COLUMN).map(|text| {
            ExtraDetail::new(text, row.link_at(DETAIL_COLUMN).map(ToOwned::to_owned))
        });
        let consider_ignoring = self.tick_suppression();
        let annotated = self.tick_annotation();

        let (Some(location), Some(quest)) = (&self.current_location, &self.current_quest) else {
            debug!(row = row.sheet_row(), "data row without location or quest");
            return Ok(RowEvent::Detached {
                row: row.index,
                detail,
            });
        };

        let message = if annotated {
            Some(ONLY_REASON_MESSAGE.to_string())
        } else if consider_ignoring {
            Some(CONSIDER_IGNORING_MESSAGE.to_string())
        } else {
            None
        };

        let candidate = CandidateRow {
            row: row.index,
            quest_row: quest.row,
            location: location.clone(),
            raw_name: quest.raw_name.clone(),
            url: quest.url.clone(),
            color: quest.color.clone(),
            story_branch: self.current_story_branch.clone(),
            ordering: self.ordering_mode,
            detail,
            consider_ignoring,
            message,
        };
        debug!(
            row = row.sheet_row(),
            location = %candidate.location,
            quest = %candidate.raw_name,
            ordering = ?candidate.ordering,
            branch = candidate.story_branch.as_deref().unwrap_or(""),
            "data row"
        );

        Ok(RowEvent::Candidate(candidate))
    }

    /// True for the one data row the consider-ignoring marker points at.
    fn tick_suppression(&mut self) -> bool {
        if self.suppression_countdown == 0 {
            return false;
        }
        self.suppression_countdown -= 1;
        self.suppression_countdown == 0
    }

    /// True for each data row while the "only reason" countdown is armed.
    fn tick_annotation(&mut self) -> bool {
        if self.annotation_countdown == 0 {
            return false;
        }
        self.annotation_countdown -= 1;
        true
    }
}

fn resolve_quest_cell(
    row: &RawRow,
    raw_name: &str,
    links: Option<&LinkTable>,
) -> Result<HeldQuest, ExtractError> {
    let color = row
        .color_at(QUEST_COLUMN)
        .ok_or_else(|| ExtractError::MissingMetadata {
            row: row.sheet_row(),
            quest: raw_name.to_string(),
            field: "background color",
        })?;

    let url = match (row.link_at(QUEST_COLUMN), links) {
        (Some(link), _) => link.trim().to_string(),
        (None, Some(table)) => table
            .resolve(raw_name)
            .map(ToOwned::to_owned)
            .ok_or_else(|| {
                ExtractError::integrity(
                    "C-004",
                    format!(
                        "row {}: no link table entry for '{}'",
                        row.sheet_row(),
                        raw_name
                    ),
                )
            })?,
        (None, None) => {
            return Err(ExtractError::MissingMetadata {
                row: row.sheet_row(),
                quest: raw_name.to_string(),
                field: "hyperlink",
            });
        }
    };

    Ok(HeldQuest {
        raw_name: raw_name.to_string(),
        url,
        color: color.to_string(),
        row: row.index,
    })
}
