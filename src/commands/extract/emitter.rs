use anyhow::{Context, Result};

use super::aggregator::QuestRecord;
use crate::model::Quest;

pub fn emit_quests(records: Vec<QuestRecord>) -> Vec<Quest> {
    records
        .into_iter()
        .map(|record| Quest {
            id: record.id,
            quest_type: record.quest_type,
            location: record.key.location,
            quest: record.key.name,
            is_completed: false,
            suggested: record.key.level,
            url: record.key.url,
            order: record.order,
            color: record.color,
            extra_details: record.extra_details,
            consider_ignoring: record.consider_ignoring,
            branch: record.key.story_branch,
            message: record.message,
        })
        .collect()
}

/// Compact JSON array, the shape bundled with the application.
pub fn serialize_catalog(quests: &[Quest]) -> Result<Vec<u8>> {
    serde_json::to_vec(quests).context("failed to serialize quest catalog")
}
