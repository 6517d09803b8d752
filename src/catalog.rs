//! Consumer-side view of an emitted catalog: completion flags merged by id,
//! contiguous location groups, search and hide-completed filtering.

use std::collections::HashMap;

use serde::Serialize;

use crate::model::{Quest, QuestStatus};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackedQuest {
    #[serde(flatten)]
    pub quest: Quest,
    pub is_hidden: bool,
}

/// Overlays completion flags onto the catalog. Later statuses for the same id
/// win; statuses for unknown ids are ignored.
pub fn apply_statuses(quests: Vec<Quest>, statuses: &[QuestStatus]) -> Vec<TrackedQuest> {
    let mut latest: HashMap<u32, QuestStatus> = HashMap::new();
    for status in statuses {
        latest.insert(status.id, *status);
    }

    quests
        .into_iter()
        .map(|mut quest| {
            let status = latest.get(&quest.id);
            if let Some(status) = status {
                quest.is_completed = status.is_completed;
            }
            TrackedQuest {
                quest,
                is_hidden: status.map(|status| status.is_hidden).unwrap_or(false),
            }
        })
        .collect()
}

/// Groups runs of consecutive items sharing a key. A location that appears
/// again later in the list starts a new group.
pub fn group_contiguous_by<T, F>(items: Vec<T>, key: F) -> Vec<(String, Vec<T>)>
where
    F: Fn(&T) -> &str,
{
    let mut groups: Vec<(String, Vec<T>)> = Vec::new();

    for item in items {
        let item_key = key(&item).to_string();
        match groups.last_mut() {
            Some((current, members)) if *current == item_key => members.push(item),
            _ => groups.push((item_key, vec![item])),
        }
    }

    groups
}

#[derive(Debug, Clone, Default)]
pub struct QuestFilter {
    pub search: Option<String>,
    pub hide_completed: bool,
}

impl QuestFilter {
    pub fn matches(&self, tracked: &TrackedQuest) -> bool {
        if tracked.is_hidden {
            return false;
        }
        if self.hide_completed && tracked.quest.is_completed {
            return false;
        }

        let Some(search) = self
            .search
            .as_deref()
            .map(str::trim)
            .filter(|search| !search.is_empty())
        else {
            return true;
        };
        let needle = search.to_lowercase();
        let quest = &tracked.quest;

        quest.quest.to_lowercase().contains(&needle)
            || quest.location.to_lowercase().contains(&needle)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct LocationGroup {
    pub location: String,
    pub quests: Vec<TrackedQuest>,
}

/// Location groups after filtering; groups left empty are dropped.
pub fn visible_groups(tracked: Vec<TrackedQuest>, filter: &QuestFilter) -> Vec<LocationGroup> {
    group_contiguous_by(tracked, |quest| quest.quest.location.as_str())
        .into_iter()
        .filter_map(|(location, quests)| {
            let quests: Vec<TrackedQuest> = quests
                .into_iter()
                .filter(|quest| filter.matches(quest))
                .collect();
            (!quests.is_empty()).then_some(LocationGroup { location, quests })
        })
        .collect()
}
