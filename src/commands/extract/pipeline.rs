use std::collections::BTreeMap;

use anyhow::Result;
use tracing::debug;

use super::aggregator::{Merge, QuestAggregator};
use super::emitter::emit_quests;
use super::level::LevelParser;
use super::links::LinkTable;
use super::scanner::{ParserState, RowEvent};
use crate::catalog::group_contiguous_by;
use crate::error::ExtractError;
use crate::model::{ExtractCounts, LocationCount, Order, Quest};
use crate::workbook::RawRow;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScanStats {
    pub rows_scanned: usize,
    pub marker_rows: usize,
    pub blank_rows: usize,
    pub data_rows: usize,
    pub skipped_rows: usize,
    pub blocks_closed: usize,
}

#[derive(Debug, Clone)]
pub struct Extraction {
    pub quests: Vec<Quest>,
    pub stats: ScanStats,
}

/// Scanner, aggregator and emitter wired into a single forward pass.
#[derive(Debug, Clone)]
pub struct QuestExtractor {
    levels: LevelParser,
}

impl QuestExtractor {
    pub fn new() -> Result<Self> {
        Ok(Self {
            levels: LevelParser::new()?,
        })
    }

    pub fn extract(
        &self,
        rows: &[RawRow],
        links: Option<&LinkTable>,
    ) -> Result<Extraction, ExtractError> {
        let mut state = ParserState::default();
        let mut aggregator = QuestAggregator::new(self.levels.clone());
        let mut stats = ScanStats::default();

        for row in rows {
            stats.rows_scanned += 1;

            match state.scan(row, links)? {
                RowEvent::Marker { .. } => stats.marker_rows += 1,
                RowEvent::Blank { block_closed, .. } => {
                    stats.blank_rows += 1;
                    if block_closed {
                        stats.blocks_closed += 1;
                    }
                }
                RowEvent::Candidate(candidate) => {
                    stats.data_rows += 1;
                    match aggregator.accept(candidate)? {
                        Merge::Inserted { id } => debug!(id, "new quest"),
                        Merge::Appended { id } => debug!(id, "merged into quest"),
                    }
                }
                RowEvent::Detached { row, detail } => match detail {
                    Some(detail) if !aggregator.is_empty() => {
                        return Err(ExtractError::OrphanDetail {
                            row: row + 1,
                            detail: detail.detail,
                        });
                    }
                    _ => {
                        stats.skipped_rows += 1;
                        debug!(row = row + 1, "skipped row without quest");
                    }
                },
            }
        }

        debug!(quests = aggregator.len(), "aggregation finished");

        Ok(Extraction {
            quests: emit_quests(aggregator.into_records()),
            stats,
        })
    }
}

pub fn build_counts(extraction: &Extraction) -> ExtractCounts {
    let quests = &extraction.quests;
    let stats = &extraction.stats;

    let mut quests_by_type = BTreeMap::new();
    for quest in quests {
        *quests_by_type
            .entry(quest.quest_type.label().to_string())
            .or_insert(0) += 1;
    }

    let quests_by_location = group_contiguous_by(quests.iter().collect(), |quest| {
        quest.location.as_str()
    })
    .into_iter()
    .map(|(location, group)| LocationCount {
        location,
        quests: group.len(),
    })
    .collect();

    ExtractCounts {
        rows_scanned: stats.rows_scanned,
        marker_rows: stats.marker_rows,
        blank_rows: stats.blank_rows,
        data_rows: stats.data_rows,
        skipped_rows: stats.skipped_rows,
        blocks_closed: stats.blocks_closed,
        quests_emitted: quests.len(),
        extra_details: quests.iter().map(|quest| quest.extra_details.len()).sum(),
        unordered_quests: quests
            .iter()
            .filter(|quest| quest.order == Order::Any)
            .count(),
        branched_quests: quests.iter().filter(|quest| quest.branch.is_some()).count(),
        consider_ignoring_quests: quests.iter().filter(|quest| quest.consider_ignoring).count(),
        annotated_quests: quests.iter().filter(|quest| quest.message.is_some()).count(),
        quests_by_type,
        quests_by_location,
    }
}
