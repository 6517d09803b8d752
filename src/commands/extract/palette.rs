use crate::model::QuestType;

const QUEST_TYPE_BY_COLOR: &[(&str, QuestType)] = &[
    ("e06666", QuestType::Main),
    ("f6b26b", QuestType::Secondary),
    ("ffd966", QuestType::Contract),
    ("93c47d", QuestType::TreasureHunt),
    ("3d85c6", QuestType::ScavengerHunt),
    ("a4c2f4", QuestType::GwentAndHeroesPursuits),
    ("8e7cc3", QuestType::ChanceEncounters),
];

pub fn quest_type_for(color: &str) -> Option<QuestType> {
    let color = color.trim().trim_start_matches('#');
    QUEST_TYPE_BY_COLOR
        .iter()
        .find(|(known, _)| known.eq_ignore_ascii_case(color))
        .map(|(_, quest_type)| *quest_type)
}
