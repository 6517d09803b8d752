use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum QuestType {
    Main,
    Secondary,
    Contract,
    TreasureHunt,
    ScavengerHunt,
    GwentAndHeroesPursuits,
    ChanceEncounters,
}

impl QuestType {
    pub fn label(self) -> &'static str {
        match self {
            Self::Main => "Main",
            Self::Secondary => "Secondary",
            Self::Contract => "Contract",
            Self::TreasureHunt => "Treasure Hunt",
            Self::ScavengerHunt => "Scavenger Hunt",
            Self::GwentAndHeroesPursuits => "Gwent & The Heroes' Pursuits",
            Self::ChanceEncounters => "Chance Encounters",
        }
    }
}

/// Suggested character level for a quest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Level {
    Any,
    Suggested { level: u32 },
}

impl Level {
    pub fn show(self) -> String {
        match self {
            Self::Any => "Any".to_string(),
            Self::Suggested { level } => level.to_string(),
        }
    }
}

/// Suggested completion order; `Any` inside any-order blocks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Order {
    Any,
    Suggested { order: u32 },
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtraDetail {
    pub detail: String,
    #[serde(default)]
    pub link: Option<String>,
    #[serde(default)]
    pub is_completed: bool,
}

impl ExtraDetail {
    pub fn new(detail: impl Into<String>, link: Option<String>) -> Self {
        Self {
            detail: detail.into(),
            link,
            is_completed: false,
        }
    }
}

/// One catalog entry as consumed by the application.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Quest {
    pub id: u32,
    #[serde(rename = "type")]
    pub quest_type: QuestType,
    pub location: String,
    pub quest: String,
    pub is_completed: bool,
    pub suggested: Level,
    pub url: String,
    pub order: Order,
    pub color: String,
    pub extra_details: Vec<ExtraDetail>,
    pub consider_ignoring: bool,
    pub branch: Option<String>,
    pub message: Option<String>,
}

/// Per-quest completion flags kept by the consumer, keyed by `Quest::id`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestStatus {
    pub id: u32,
    pub is_completed: bool,
    pub is_hidden: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceWorkbook {
    pub path: String,
    pub sha256: String,
    pub sheet_index: usize,
    pub sheet_name: String,
    pub start_row: u32,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExtractCounts {
    pub rows_scanned: usize,
    pub marker_rows: usize,
    pub blank_rows: usize,
    pub data_rows: usize,
    pub skipped_rows: usize,
    pub blocks_closed: usize,
    pub quests_emitted: usize,
    pub extra_details: usize,
    pub unordered_quests: usize,
    pub branched_quests: usize,
    pub consider_ignoring_quests: usize,
    pub annotated_quests: usize,
    pub quests_by_type: BTreeMap<String, usize>,
    pub quests_by_location: Vec<LocationCount>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocationCount {
    pub location: String,
    pub quests: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckSummary {
    pub total_checks: usize,
    pub passed: usize,
    pub failed: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractRunManifest {
    pub manifest_version: u32,
    pub run_id: String,
    pub status: String,
    pub started_at: String,
    pub updated_at: String,
    pub command: String,
    pub source: SourceWorkbook,
    pub catalog_path: String,
    pub catalog_sha256: String,
    pub link_table_path: Option<String>,
    pub golden_manifest_path: Option<String>,
    pub counts: ExtractCounts,
    pub checks: CheckSummary,
    pub warnings: Vec<String>,
}
