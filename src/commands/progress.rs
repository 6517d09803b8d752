use std::io::{self, Write};

use anyhow::{Context, Result};
use tracing::info;

use crate::catalog::{LocationGroup, QuestFilter, apply_statuses, visible_groups};
use crate::cli::ProgressArgs;
use crate::model::{Order, Quest, QuestStatus};
use crate::util::read_json;

pub fn run(args: ProgressArgs) -> Result<()> {
    let quests: Vec<Quest> = read_json(&args.catalog_path)?;
    let statuses: Vec<QuestStatus> = match &args.statuses_path {
        Some(path) => read_json(path)?,
        None => Vec::new(),
    };
    let total = quests.len();
    let tracked = apply_statuses(quests, &statuses);
    let completed = tracked
        .iter()
        .filter(|tracked| tracked.quest.is_completed)
        .count();

    let filter = QuestFilter {
        search: args.search.clone(),
        hide_completed: args.hide_completed,
    };
    let groups = visible_groups(tracked, &filter);
    let shown: usize = groups.iter().map(|group| group.quests.len()).sum();

    info!(
        catalog = %args.catalog_path.display(),
        quests = total,
        statuses = statuses.len(),
        completed,
        shown,
        "progress view"
    );

    let mut output = io::BufWriter::new(io::stdout().lock());
    if args.json {
        serde_json::to_writer_pretty(&mut output, &groups)
            .context("failed to serialize progress json output")?;
        writeln!(output)?;
    } else {
        write_text_groups(&mut output, &groups)?;
    }
    output.flush()?;

    Ok(())
}

pub fn write_text_groups(output: &mut impl Write, groups: &[LocationGroup]) -> Result<()> {
    for group in groups {
        writeln!(output, "{}", group.location)?;
        for tracked in &group.quests {
            let quest = &tracked.quest;
            let mark = if quest.is_completed { "x" } else { " " };
            writeln!(
                output,
                "  [{mark}] {}\t{}\tlevel {}\torder {}",
                quest.quest,
                quest.quest_type.label(),
                quest.suggested.show(),
                order_label(quest.order)
            )?;
            if let Some(branch) = &quest.branch {
                writeln!(output, "      {branch}")?;
            }
            if quest.consider_ignoring {
                writeln!(output, "      (consider ignoring)")?;
            }
        }
    }

    Ok(())
}

fn order_label(order: Order) -> String {
    match order {
        Order::Any => "any".to_string(),
        Order::Suggested { order } => order.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::TrackedQuest;
    use crate::model::{Level, QuestType};

    #[test]
    fn text_view_marks_completed_quests() {
        let quest = Quest {
            id: 10,
            quest_type: QuestType::Main,
            location: "White Orchard".to_string(),
            quest: "Kaer Morhen".to_string(),
            is_completed: true,
            suggested: Level::Suggested { level: 1 },
            url: "https://witcher.fandom.com/wiki/Kaer_Morhen".to_string(),
            order: Order::Suggested { order: 1 },
            color: "e06666".to_string(),
            extra_details: Vec::new(),
            consider_ignoring: false,
            branch: None,
            message: None,
        };
        let mut open = quest.clone();
        open.id = 12;
        open.quest = "Lilac and Gooseberries".to_string();
        open.is_completed = false;
        open.order = Order::Any;
        open.consider_ignoring = true;

        let groups = vec![LocationGroup {
            location: "White Orchard".to_string(),
            quests: vec![
                TrackedQuest {
                    quest,
                    is_hidden: false,
                },
                TrackedQuest {
                    quest: open,
                    is_hidden: false,
                },
            ],
        }];

        let mut output = Vec::new();
        write_text_groups(&mut output, &groups).expect("write");
        let text = String::from_utf8(output).expect("utf8");
        assert_eq!(
            text,
            "White Orchard\n  [x] Kaer Morhen\tMain\tlevel 1\torder 1\n  [ ] Lilac and Gooseberries\tMain\tlevel 1\torder any\n      (consider ignoring)\n"
        );
    }
}
