use std::path::Path;

use anyhow::Result;
use serde::{Deserialize, Serialize};

use super::checks::CatalogCheck;
use crate::model::{Level, Quest};
use crate::util::read_json;

/// Hand-maintained expectations for quests whose extraction must never drift.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GoldenManifest {
    pub manifest_version: u32,
    pub golden_quests: Vec<GoldenQuest>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GoldenQuest {
    pub quest: String,
    pub id: u32,
    /// `None` expects level `Any`.
    #[serde(default)]
    pub level: Option<u32>,
    pub extra_details: usize,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

impl GoldenQuest {
    fn expected_level(&self) -> Level {
        match self.level {
            Some(level) => Level::Suggested { level },
            None => Level::Any,
        }
    }
}

pub fn load_golden_manifest(path: &Path) -> Result<GoldenManifest> {
    read_json(path)
}

/// One `G-NNN` check per golden quest, numbered in manifest order.
pub fn golden_checks(quests: &[Quest], manifest: &GoldenManifest) -> Vec<CatalogCheck> {
    manifest
        .golden_quests
        .iter()
        .enumerate()
        .map(|(index, golden)| {
            CatalogCheck::from_failures(
                &format!("G-{:03}", index + 1),
                &format!("golden record '{}'", golden.quest),
                golden_mismatches(quests, golden),
            )
        })
        .collect()
}

fn golden_mismatches(quests: &[Quest], golden: &GoldenQuest) -> Vec<String> {
    let matches: Vec<&Quest> = quests
        .iter()
        .filter(|quest| quest.quest == golden.quest)
        .filter(|quest| {
            golden
                .location
                .as_ref()
                .is_none_or(|location| *location == quest.location)
        })
        .collect();

    let quest = match matches.as_slice() {
        [] => return vec![format!("quest '{}' not found", golden.quest)],
        [quest] => *quest,
        many => {
            return vec![format!(
                "quest '{}' matches {} catalog entries",
                golden.quest,
                many.len()
            )];
        }
    };

    let mut mismatches = Vec::new();
    if quest.id != golden.id {
        mismatches.push(format!("id {} != expected {}", quest.id, golden.id));
    }
    if quest.suggested != golden.expected_level() {
        mismatches.push(format!(
            "level {} != expected {}",
            quest.suggested.show(),
            golden.expected_level().show()
        ));
    }
    if quest.extra_details.len() != golden.extra_details {
        mismatches.push(format!(
            "{} extra details != expected {}",
            quest.extra_details.len(),
            golden.extra_details
        ));
    }
    if let Some(url) = golden.url.as_ref().filter(|url| **url != quest.url) {
        mismatches.push(format!("url '{}' != expected '{}'", quest.url, url));
    }
    if golden
        .message
        .as_ref()
        .is_some_and(|message| quest.message.as_ref() != Some(message))
    {
        mismatches.push("message does not match".to_string());
    }

    mismatches
}
