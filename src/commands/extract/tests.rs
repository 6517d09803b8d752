use std::fs;
use std::io::Cursor;

use serde_json::Value;

use super::emitter::serialize_catalog;
use super::level::LevelParser;
use super::markers::{
    ANY_ORDER_MARKER, CONSIDER_IGNORING_MARKER, CONSIDER_IGNORING_MESSAGE, ONLY_REASON_MARKER,
    ONLY_REASON_MESSAGE, ORDER_END_MARKER,
};
use super::pipeline::{Extraction, QuestExtractor, build_counts};
use super::run::render_extract_command;
use super::*;
use crate::cli::ExtractArgs;
use crate::error::ExtractError;
use crate::model::{ExtractRunManifest, Level, Order, Quest, QuestType};
use crate::workbook::fixtures::{FixtureCell, quest_workbook};
use crate::workbook::{RawCell, RawRow, Workbook};

const MAIN: &str = "e06666";
const SECONDARY: &str = "f6b26b";
const CONTRACT: &str = "ffd966";

fn wiki_url(name: &str) -> String {
    format!("https://witcher.fandom.com/wiki/{}", name.replace(' ', "_"))
}

fn text_cell(column: u32, text: &str) -> RawCell {
    RawCell {
        column,
        text: Some(text.to_string()),
        ..RawCell::default()
    }
}

/// Builds consecutive sheet rows starting at zero-based row 9.
struct Rows {
    rows: Vec<RawRow>,
}

impl Rows {
    fn new() -> Self {
        Self { rows: Vec::new() }
    }

    fn next_index(&self) -> u32 {
        9 + self.rows.len() as u32
    }

    fn push(mut self, cells: Vec<RawCell>) -> Self {
        let index = self.next_index();
        self.rows.push(RawRow::new(index, cells));
        self
    }

    fn quest(self, location: Option<&str>, name: &str, color: &str, detail: Option<&str>) -> Self {
        let mut cells = Vec::new();
        if let Some(location) = location {
            cells.push(text_cell(0, location));
        }
        cells.push(RawCell {
            column: 1,
            text: Some(name.to_string()),
            hyperlink: Some(wiki_url(name)),
            color: Some(color.to_string()),
        });
        if let Some(detail) = detail {
            cells.push(text_cell(3, detail));
        }
        self.push(cells)
    }

    fn detail(self, detail: &str) -> Self {
        self.push(vec![text_cell(3, detail)])
    }

    fn marker(self, text: &str) -> Self {
        self.push(vec![text_cell(1, text)])
    }

    fn blank(self) -> Self {
        self.push(Vec::new())
    }

    fn build(self) -> Vec<RawRow> {
        self.rows
    }
}

fn extract(rows: &[RawRow]) -> Result<Extraction, ExtractError> {
    QuestExtractor::new()
        .expect("extractor should build")
        .extract(rows, None)
}

fn extract_quests(rows: &[RawRow]) -> Vec<Quest> {
    extract(rows).expect("extraction should succeed").quests
}

fn find<'a>(quests: &'a [Quest], name: &str) -> &'a Quest {
    quests
        .iter()
        .find(|quest| quest.quest == name)
        .unwrap_or_else(|| panic!("quest {name} should be emitted"))
}

#[test]
fn level_suffix_is_split_from_quest_name() {
    let parser = LevelParser::new().expect("regex should compile");

    assert_eq!(
        parser.split("Kaer Morhen (1)"),
        ("Kaer Morhen".to_string(), Level::Suggested { level: 1 })
    );
    assert_eq!(
        parser.split("Viper Silver Sword (Basic) (6)"),
        (
            "Viper Silver Sword (Basic)".to_string(),
            Level::Suggested { level: 6 }
        )
    );
    assert_eq!(
        parser.split("Disturbance"),
        ("Disturbance".to_string(), Level::Any)
    );
    assert_eq!(
        parser.split("Deadly Crossing (II)"),
        ("Deadly Crossing (II)".to_string(), Level::Any)
    );
}

#[test]
fn golden_kaer_morhen_row_keeps_sheet_row_id_and_all_details() {
    let mut rows = Rows::new().quest(
        Some("White Orchard"),
        "Kaer Morhen (1)",
        MAIN,
        Some("Detail 1"),
    );
    for step in 2..=9 {
        rows = rows.detail(&format!("Detail {step}"));
    }

    let quests = extract_quests(&rows.build());
    assert_eq!(quests.len(), 1);

    let kaer_morhen = &quests[0];
    assert_eq!(kaer_morhen.id, 10);
    assert_eq!(kaer_morhen.quest, "Kaer Morhen");
    assert_eq!(kaer_morhen.suggested, Level::Suggested { level: 1 });
    assert_eq!(kaer_morhen.order, Order::Suggested { order: 1 });
    assert_eq!(kaer_morhen.quest_type, QuestType::Main);
    assert_eq!(kaer_morhen.url, wiki_url("Kaer Morhen (1)"));
    let details: Vec<&str> = kaer_morhen
        .extra_details
        .iter()
        .map(|detail| detail.detail.as_str())
        .collect();
    assert_eq!(
        details,
        (1..=9)
            .map(|step| format!("Detail {step}"))
            .collect::<Vec<String>>()
    );
}

#[test]
fn ordering_continues_across_any_order_blocks() {
    let rows = Rows::new()
        .quest(Some("White Orchard"), "Q1 (1)", MAIN, None)
        .quest(None, "Q2 (2)", MAIN, None)
        .marker(ANY_ORDER_MARKER)
        .quest(None, "Q3 (2)", SECONDARY, None)
        .quest(None, "Q4 (3)", CONTRACT, None)
        .blank()
        .blank()
        .quest(None, "Q5 (4)", MAIN, None)
        .build();

    let quests = extract_quests(&rows);
    let orders: Vec<Order> = quests.iter().map(|quest| quest.order).collect();
    assert_eq!(
        orders,
        vec![
            Order::Suggested { order: 1 },
            Order::Suggested { order: 2 },
            Order::Any,
            Order::Any,
            Order::Suggested { order: 3 },
        ]
    );
    assert!(quests.iter().all(|quest| quest.location == "White Orchard"));
}

#[test]
fn order_end_marker_closes_the_block_like_two_blank_rows() {
    let rows = Rows::new()
        .marker(ANY_ORDER_MARKER)
        .quest(Some("Velen"), "Contract: Jenny o' the Woods", CONTRACT, None)
        .marker(ORDER_END_MARKER)
        .quest(None, "Bloody Baron (6)", MAIN, None)
        .build();

    let quests = extract_quests(&rows);
    assert_eq!(quests[0].order, Order::Any);
    assert_eq!(quests[1].order, Order::Suggested { order: 1 });
}

#[test]
fn single_blank_row_keeps_the_held_quest() {
    let rows = Rows::new()
        .quest(Some("Velen"), "Bloody Baron (6)", MAIN, Some("Meet the Baron"))
        .blank()
        .detail("Find Gran")
        .build();

    let quests = extract_quests(&rows);
    assert_eq!(quests.len(), 1);
    assert_eq!(quests[0].extra_details.len(), 2);
    assert_eq!(quests[0].extra_details[1].detail, "Find Gran");
}

#[test]
fn two_blank_rows_release_the_held_quest() {
    let rows = Rows::new()
        .quest(Some("Velen"), "Bloody Baron (6)", MAIN, Some("Meet the Baron"))
        .blank()
        .blank()
        .detail("Find Gran")
        .build();

    let err = extract(&rows).expect_err("detail after a closed block has no quest");
    assert_eq!(
        err,
        ExtractError::OrphanDetail {
            row: 13,
            detail: "Find Gran".to_string(),
        }
    );
}

#[test]
fn rows_before_the_first_quest_are_skipped() {
    let rows = Rows::new()
        .push(vec![text_cell(0, "White Orchard")])
        .detail("Introductory note")
        .quest(None, "Lilac and Gooseberries (1)", MAIN, None)
        .build();

    let extraction = extract(&rows).expect("extraction should succeed");
    assert_eq!(extraction.stats.skipped_rows, 2);
    assert_eq!(extraction.quests.len(), 1);
    assert_eq!(extraction.quests[0].location, "White Orchard");
    assert_eq!(extraction.quests[0].id, 12);
}

#[test]
fn repeated_quest_merges_into_first_occurrence() {
    let rows = Rows::new()
        .quest(Some("Velen"), "Bloody Baron (6)", MAIN, Some("Meet the Baron"))
        .quest(None, "Ciri's Room (6)", SECONDARY, Some("Search the room"))
        .quest(None, "Bloody Baron (6)", SECONDARY, Some("Find Gran"))
        .build();

    let quests = extract_quests(&rows);
    assert_eq!(quests.len(), 2);

    let baron = find(&quests, "Bloody Baron");
    assert_eq!(baron.id, 10);
    assert_eq!(baron.order, Order::Suggested { order: 1 });
    assert_eq!(baron.color, MAIN);
    assert_eq!(baron.quest_type, QuestType::Main);
    let details: Vec<&str> = baron
        .extra_details
        .iter()
        .map(|detail| detail.detail.as_str())
        .collect();
    assert_eq!(details, vec!["Meet the Baron", "Find Gran"]);

    let room = find(&quests, "Ciri's Room");
    assert_eq!(room.id, 11);
    assert_eq!(room.order, Order::Suggested { order: 2 });
}

#[test]
fn same_name_in_another_location_is_a_separate_quest() {
    let rows = Rows::new()
        .quest(Some("Velen"), "Gwent: Velen Players", SECONDARY, None)
        .quest(Some("Novigrad"), "Gwent: Velen Players", SECONDARY, None)
        .build();

    let quests = extract_quests(&rows);
    assert_eq!(quests.len(), 2);
    assert_eq!(quests[0].id, 10);
    assert_eq!(quests[1].id, 11);
}

#[test]
fn detail_links_are_kept_in_row_order() {
    let rows = Rows::new()
        .quest(Some("Skellige"), "Destination: Skellige (16)", MAIN, None)
        .push(vec![RawCell {
            column: 3,
            text: Some("Watch the clip".to_string()),
            hyperlink: Some("https://youtu.be/clip".to_string()),
            color: None,
        }])
        .detail("Sail to Kaer Trolde")
        .build();

    let quests = extract_quests(&rows);
    let details = &quests[0].extra_details;
    assert_eq!(details.len(), 2);
    assert_eq!(details[0].link.as_deref(), Some("https://youtu.be/clip"));
    assert_eq!(details[1].link, None);
    assert!(details.iter().all(|detail| !detail.is_completed));
}

#[test]
fn story_branch_applies_until_the_block_closes() {
    let rows = Rows::new()
        .marker("STORY BRANCH 1 - SIDE WITH ROCHE")
        .quest(Some("Velen"), "Redania's Most Wanted (12)", MAIN, None)
        .blank()
        .blank()
        .quest(None, "Count Reuven's Treasure (13)", MAIN, None)
        .build();

    let quests = extract_quests(&rows);
    assert_eq!(
        quests[0].branch.as_deref(),
        Some("STORY BRANCH 1 - SIDE WITH ROCHE")
    );
    assert_eq!(quests[1].branch, None);
}

#[test]
fn consider_ignoring_flags_only_the_next_data_row() {
    let rows = Rows::new()
        .marker(CONSIDER_IGNORING_MARKER)
        .quest(Some("Velen"), "A Princess in Distress", SECONDARY, None)
        .quest(None, "Fake Papers", SECONDARY, None)
        .build();

    let quests = extract_quests(&rows);
    assert!(quests[0].consider_ignoring);
    assert_eq!(quests[0].message.as_deref(), Some(CONSIDER_IGNORING_MESSAGE));
    assert!(!quests[1].consider_ignoring);
    assert_eq!(quests[1].message, None);
}

#[test]
fn only_reason_note_covers_the_six_rows_after_the_marker() {
    let mut rows = Rows::new().marker(ONLY_REASON_MARKER);
    for step in 1..=8 {
        rows = rows.quest(Some("Novigrad"), &format!("Quest {step}"), MAIN, None);
    }

    let quests = extract_quests(&rows.build());
    let annotated: Vec<bool> = quests
        .iter()
        .map(|quest| quest.message.as_deref() == Some(ONLY_REASON_MESSAGE))
        .collect();
    assert_eq!(
        annotated,
        vec![true, true, true, true, true, true, false, false]
    );
}

#[test]
fn destination_skellige_right_after_the_marker_carries_the_note() {
    let rows = Rows::new()
        .quest(Some("Velen"), "Flesh for Sale (13)", SECONDARY, None)
        .marker(ONLY_REASON_MARKER)
        .quest(
            Some("Skellige"),
            "Destination: Skellige (16)",
            MAIN,
            Some("Sail to Skellige"),
        )
        .detail("Meet Crach")
        .build();

    let quests = extract_quests(&rows);
    let skellige = find(&quests, "Destination: Skellige");
    assert_eq!(skellige.message.as_deref(), Some(ONLY_REASON_MESSAGE));
    assert_eq!(skellige.extra_details.len(), 2);
    assert_eq!(find(&quests, "Flesh for Sale").message, None);
}

#[test]
fn name_cell_without_fill_color_is_missing_metadata() {
    let rows = Rows::new()
        .push(vec![
            text_cell(0, "White Orchard"),
            RawCell {
                column: 1,
                text: Some("Kaer Morhen (1)".to_string()),
                hyperlink: Some(wiki_url("Kaer Morhen")),
                color: None,
            },
        ])
        .build();

    let err = extract(&rows).expect_err("color is required");
    assert_eq!(
        err,
        ExtractError::MissingMetadata {
            row: 10,
            quest: "Kaer Morhen (1)".to_string(),
            field: "background color",
        }
    );
}

fn unlinked_quest_rows() -> Vec<RawRow> {
    Rows::new()
        .push(vec![
            text_cell(0, "White Orchard"),
            RawCell {
                column: 1,
                text: Some("Kaer Morhen (1)".to_string()),
                hyperlink: None,
                color: Some(MAIN.to_string()),
            },
        ])
        .build()
}

#[test]
fn name_cell_without_hyperlink_is_missing_metadata() {
    let err = extract(&unlinked_quest_rows()).expect_err("hyperlink is required");
    assert!(matches!(
        err,
        ExtractError::MissingMetadata {
            row: 10,
            field: "hyperlink",
            ..
        }
    ));
}

#[test]
fn link_table_resolves_unlinked_name_cells() {
    let url = "https://witcher.fandom.com/wiki/Kaer_Morhen_(quest)";
    let links = LinkTable::from_pairs([("Kaer Morhen (1)", url)]);

    let extraction = QuestExtractor::new()
        .expect("extractor should build")
        .extract(&unlinked_quest_rows(), Some(&links))
        .expect("link table should resolve the url");
    assert_eq!(extraction.quests[0].url, url);
}

#[test]
fn link_table_miss_is_an_integrity_failure() {
    let links = LinkTable::from_pairs([("Lilac and Gooseberries (1)", "https://example.test")]);

    let err = QuestExtractor::new()
        .expect("extractor should build")
        .extract(&unlinked_quest_rows(), Some(&links))
        .expect_err("unresolvable link must not be defaulted");
    assert!(matches!(
        err,
        ExtractError::CatalogIntegrity { ref check, .. } if check == "C-004"
    ));
}

#[test]
fn color_outside_the_palette_is_unknown_quest_type() {
    let rows = Rows::new()
        .quest(Some("White Orchard"), "Kaer Morhen (1)", "123456", None)
        .build();

    let err = extract(&rows).expect_err("unknown color must fail");
    assert_eq!(
        err,
        ExtractError::UnknownQuestType {
            row: 10,
            quest: "Kaer Morhen (1)".to_string(),
            color: "123456".to_string(),
        }
    );
}

#[test]
fn scan_reports_marker_and_block_events() {
    let rows = Rows::new()
        .marker(ANY_ORDER_MARKER)
        .blank()
        .blank()
        .build();
    let mut state = ParserState::default();

    let events: Vec<RowEvent> = rows
        .iter()
        .map(|row| state.scan(row, None).expect("scan should succeed"))
        .collect();
    assert!(matches!(events[0], RowEvent::Marker { row: 9, .. }));
    assert_eq!(
        events[1],
        RowEvent::Blank {
            row: 10,
            block_closed: false
        }
    );
    assert_eq!(
        events[2],
        RowEvent::Blank {
            row: 11,
            block_closed: true
        }
    );
    assert_eq!(state.ordering_mode, ParserState::default().ordering_mode);
    assert_eq!(state.current_quest, None);
}

fn sample_workbook() -> Vec<u8> {
    quest_workbook(&[
        (
            10,
            vec![
                FixtureCell::text(0, "White Orchard"),
                FixtureCell::quest(1, "Kaer Morhen (1)", &wiki_url("Kaer Morhen"), MAIN),
                FixtureCell::text(3, "Talk to Vesemir"),
            ],
        ),
        (11, vec![FixtureCell::text(3, "Spar with Ciri")]),
        (
            12,
            vec![FixtureCell::quest(
                1,
                "Lilac and Gooseberries (1)",
                &wiki_url("Lilac and Gooseberries"),
                MAIN,
            )],
        ),
        (15, vec![FixtureCell::text(1, ANY_ORDER_MARKER)]),
        (
            16,
            vec![
                FixtureCell::text(0, "Velen"),
                FixtureCell::quest(1, "Gwent: Velen Players", &wiki_url("Velen Players"), "a4c2f4"),
            ],
        ),
    ])
}

fn sample_rows() -> Vec<RawRow> {
    let mut workbook =
        Workbook::from_reader(Cursor::new(sample_workbook())).expect("workbook should load");
    workbook.sheet(1).expect("sheet should load").rows_from(9)
}

#[test]
fn workbook_rows_extract_to_catalog_json() {
    let quests = extract_quests(&sample_rows());
    assert_eq!(quests.len(), 3);

    let json: Value =
        serde_json::from_slice(&serialize_catalog(&quests).expect("serialize")).expect("json");
    let first = &json[0];
    assert_eq!(first["id"], 10);
    assert_eq!(first["type"], "Main");
    assert_eq!(first["quest"], "Kaer Morhen");
    assert_eq!(first["isCompleted"], false);
    assert_eq!(first["suggested"]["Suggested"]["level"], 1);
    assert_eq!(first["order"]["Suggested"]["order"], 1);
    assert_eq!(first["extraDetails"][1]["detail"], "Spar with Ciri");
    assert_eq!(first["extraDetails"][1]["link"], Value::Null);
    assert_eq!(first["considerIgnoring"], false);
    assert_eq!(first["branch"], Value::Null);
    assert_eq!(first["message"], Value::Null);

    let gwent = &json[2];
    assert_eq!(gwent["id"], 16);
    assert_eq!(gwent["type"], "GwentAndHeroesPursuits");
    assert_eq!(gwent["suggested"], "Any");
    assert_eq!(gwent["order"], "Any");
    assert_eq!(gwent["location"], "Velen");
}

#[test]
fn extraction_is_byte_identical_across_runs() {
    let rows = sample_rows();
    let first = serialize_catalog(&extract_quests(&rows)).expect("serialize");
    let second = serialize_catalog(&extract_quests(&rows)).expect("serialize");
    assert_eq!(first, second);
}

#[test]
fn counts_group_quests_by_contiguous_location() {
    let extraction = extract(&sample_rows()).expect("extraction should succeed");
    let counts = build_counts(&extraction);

    assert_eq!(counts.quests_emitted, 3);
    assert_eq!(counts.extra_details, 2);
    assert_eq!(counts.marker_rows, 1);
    assert_eq!(counts.blank_rows, 2);
    assert_eq!(counts.blocks_closed, 1);
    assert_eq!(counts.unordered_quests, 1);
    assert_eq!(counts.quests_by_type.get("Main"), Some(&2));
    let locations: Vec<(&str, usize)> = counts
        .quests_by_location
        .iter()
        .map(|entry| (entry.location.as_str(), entry.quests))
        .collect();
    assert_eq!(locations, vec![("White Orchard", 2), ("Velen", 1)]);
}

fn extract_args(root: &std::path::Path, input: std::path::PathBuf) -> ExtractArgs {
    ExtractArgs {
        input,
        sheet_index: 1,
        start_row: 9,
        output: root.join("catalog").join("quests.json"),
        cache_root: root.join("cache"),
        run_manifest_path: None,
        link_table: None,
        golden_manifest_path: None,
        dry_run: false,
    }
}

#[test]
fn run_writes_catalog_and_run_manifest() {
    let dir = tempfile::tempdir().expect("tempdir");
    let input = dir.path().join("quests.xlsx");
    fs::write(&input, sample_workbook()).expect("write workbook");
    let args = extract_args(dir.path(), input);

    run(args.clone()).expect("extract should succeed");

    let catalog = fs::read(&args.output).expect("catalog written");
    let quests: Vec<Quest> = serde_json::from_slice(&catalog).expect("catalog parses");
    assert_eq!(quests.len(), 3);

    let manifests: Vec<_> = fs::read_dir(args.cache_root.join("manifests"))
        .expect("manifest dir")
        .map(|entry| entry.expect("entry").path())
        .collect();
    assert_eq!(manifests.len(), 1);
    let name = manifests[0]
        .file_name()
        .and_then(|name| name.to_str())
        .expect("file name");
    assert!(name.starts_with("extract_run_"));

    let manifest: ExtractRunManifest =
        serde_json::from_slice(&fs::read(&manifests[0]).expect("read manifest"))
            .expect("manifest parses");
    assert_eq!(manifest.status, "completed");
    assert_eq!(manifest.source.sheet_name, "Quests");
    assert_eq!(manifest.counts.quests_emitted, 3);
    assert_eq!(manifest.checks.failed, 0);
    assert_eq!(manifest.catalog_sha256, crate::util::sha256_bytes(&catalog));
    assert_eq!(manifest.command, render_extract_command(&args));
}

#[test]
fn dry_run_and_failed_runs_write_nothing() {
    let dir = tempfile::tempdir().expect("tempdir");
    let input = dir.path().join("quests.xlsx");
    fs::write(&input, sample_workbook()).expect("write workbook");
    let mut args = extract_args(dir.path(), input.clone());
    args.dry_run = true;

    run(args.clone()).expect("dry run should succeed");
    assert!(!args.output.exists());
    assert!(!args.cache_root.exists());

    fs::write(
        &input,
        quest_workbook(&[(
            10,
            vec![
                FixtureCell::text(0, "White Orchard"),
                FixtureCell::quest(1, "Kaer Morhen (1)", &wiki_url("Kaer Morhen"), "123456"),
            ],
        )]),
    )
    .expect("rewrite workbook");
    args.dry_run = false;

    let err = run(args.clone()).expect_err("unknown color must abort");
    assert!(
        err.chain()
            .any(|cause| cause.to_string().contains("not in the palette"))
    );
    assert!(!args.output.exists());
}
