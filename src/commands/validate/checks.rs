use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::error::ExtractError;
use crate::model::{CheckSummary, Level, Quest};

pub const RESULT_PASS: &str = "pass";
pub const RESULT_FAILED: &str = "failed";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogCheck {
    pub check_id: String,
    pub name: String,
    pub result: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl CatalogCheck {
    /// Passes when `failures` is empty, otherwise carries them joined as the detail.
    pub fn from_failures(check_id: &str, name: &str, failures: Vec<String>) -> Self {
        let (result, detail) = if failures.is_empty() {
            (RESULT_PASS, None)
        } else {
            (RESULT_FAILED, Some(failures.join("; ")))
        };

        Self {
            check_id: check_id.to_string(),
            name: name.to_string(),
            result: result.to_string(),
            detail,
        }
    }

    pub fn failed(&self) -> bool {
        self.result == RESULT_FAILED
    }
}

#[derive(Debug, PartialEq, Eq, Hash)]
struct IdentityKey<'a> {
    location: &'a str,
    quest: &'a str,
    suggested: Level,
    url: &'a str,
    branch: Option<&'a str>,
}

pub fn integrity_checks(quests: &[Quest]) -> Vec<CatalogCheck> {
    vec![
        CatalogCheck::from_failures("C-001", "quest ids are unique", duplicate_ids(quests)),
        CatalogCheck::from_failures(
            "C-002",
            "no field-identical quests",
            identical_quests(quests),
        ),
        CatalogCheck::from_failures(
            "C-003",
            "quest identity keys are unique",
            duplicate_keys(quests),
        ),
    ]
}

fn duplicate_ids(quests: &[Quest]) -> Vec<String> {
    let mut counts: HashMap<u32, usize> = HashMap::new();
    for quest in quests {
        *counts.entry(quest.id).or_insert(0) += 1;
    }

    let mut duplicates = counts
        .into_iter()
        .filter(|(_, count)| *count > 1)
        .collect::<Vec<(u32, usize)>>();
    duplicates.sort_unstable();

    duplicates
        .into_iter()
        .map(|(id, count)| format!("id {id} appears {count} times"))
        .collect()
}

fn identical_quests(quests: &[Quest]) -> Vec<String> {
    let mut seen: HashSet<&Quest> = HashSet::new();
    quests
        .iter()
        .filter(|quest| !seen.insert(*quest))
        .map(|quest| format!("quest '{}' (id {}) is duplicated", quest.quest, quest.id))
        .collect()
}

fn duplicate_keys(quests: &[Quest]) -> Vec<String> {
    let mut first_id: HashMap<IdentityKey<'_>, u32> = HashMap::new();
    let mut failures = Vec::new();

    for quest in quests {
        let key = IdentityKey {
            location: &quest.location,
            quest: &quest.quest,
            suggested: quest.suggested,
            url: &quest.url,
            branch: quest.branch.as_deref(),
        };
        if let Some(existing) = first_id.get(&key) {
            failures.push(format!(
                "quest '{}' in '{}' shares its key with id {} (id {})",
                quest.quest, quest.location, existing, quest.id
            ));
        } else {
            first_id.insert(key, quest.id);
        }
    }

    failures
}

/// First failed check as a terminal error.
pub fn enforce_checks(checks: &[CatalogCheck]) -> Result<(), ExtractError> {
    match checks.iter().find(|check| check.failed()) {
        Some(check) => Err(ExtractError::integrity(
            &check.check_id,
            check
                .detail
                .clone()
                .unwrap_or_else(|| format!("{} failed", check.name)),
        )),
        None => Ok(()),
    }
}

pub fn summarize_checks(checks: &[CatalogCheck]) -> CheckSummary {
    let passed = checks
        .iter()
        .filter(|check| check.result == RESULT_PASS)
        .count();
    let failed = checks.iter().filter(|check| check.failed()).count();

    CheckSummary {
        total_checks: checks.len(),
        passed,
        failed,
    }
}
