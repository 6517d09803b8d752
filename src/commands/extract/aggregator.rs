use std::collections::HashMap;

use super::level::LevelParser;
use super::palette::quest_type_for;
use super::scanner::{CandidateRow, OrderingMode};
use crate::error::ExtractError;
use crate::model::{ExtraDetail, Level, Order, QuestType};

/// Identity of a quest: rows producing the same key are one quest.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QuestKey {
    pub location: String,
    pub name: String,
    pub level: Level,
    pub url: String,
    pub story_branch: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuestRecord {
    pub id: u32,
    pub key: QuestKey,
    pub quest_type: QuestType,
    pub color: String,
    pub order: Order,
    pub consider_ignoring: bool,
    pub message: Option<String>,
    pub extra_details: Vec<ExtraDetail>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Merge {
    Inserted { id: u32 },
    Appended { id: u32 },
}

/// Folds candidate rows into quest records, keeping first-insertion order.
#[derive(Debug)]
pub struct QuestAggregator {
    levels: LevelParser,
    records: Vec<QuestRecord>,
    positions: HashMap<QuestKey, usize>,
    next_order: u32,
}

impl QuestAggregator {
    pub fn new(levels: LevelParser) -> Self {
        Self {
            levels,
            records: Vec::new(),
            positions: HashMap::new(),
            next_order: 1,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn accept(&mut self, candidate: CandidateRow) -> Result<Merge, ExtractError> {
        let (name, level) = self.levels.split(&candidate.raw_name);
        let key = QuestKey {
            location: candidate.location,
            name,
            level,
            url: candidate.url,
            story_branch: candidate.story_branch,
        };

        if let Some(&position) = self.positions.get(&key) {
            let record = &mut self.records[position];
            record.extra_details.extend(candidate.detail);
            return Ok(Merge::Appended { id: record.id });
        }

        let quest_type =
            quest_type_for(&candidate.color).ok_or_else(|| ExtractError::UnknownQuestType {
                row: candidate.quest_row + 1,
                quest: candidate.raw_name.clone(),
                color: candidate.color.clone(),
            })?;

        // The counter only advances in sequential blocks and is never rewound.
        let order = match candidate.ordering {
            OrderingMode::Sequential => {
                let order = self.next_order;
                self.next_order += 1;
                Order::Suggested { order }
            }
            OrderingMode::Unordered => Order::Any,
        };

        let id = candidate.quest_row + 1;
        self.positions.insert(key.clone(), self.records.len());
        self.records.push(QuestRecord {
            id,
            key,
            quest_type,
            color: candidate.color,
            order,
            consider_ignoring: candidate.consider_ignoring,
            message: candidate.message,
            extra_details: candidate.detail.into_iter().collect(),
        });

        Ok(Merge::Inserted { id })
    }

    pub fn into_records(self) -> Vec<QuestRecord> {
        self.records
    }
}
