use serde::Serialize;

use crate::workbook::RawRow;

pub const ANY_ORDER_MARKER: &str = "THE FOLLOWING QUESTS CAN BE DONE AT ANY TIME IN ANY ORDER";
pub const ORDER_END_MARKER: &str = "ORDER-END-MARKER";
pub const STORY_BRANCH_MARKER: &str = "STORY BRANCH ";
pub const CONSIDER_IGNORING_MARKER: &str =
    "THE FOLLOWING QUEST IS NOT WORTH DOING CONSIDERING HOW OUT OF ORDER YOU WILL HAVE TO DO CERTAIN QUESTS.";
pub const ONLY_REASON_MARKER: &str = "THE ONLY REASON THAT 'DESTINATION: SKELLIGE'";

pub const ONLY_REASON_MESSAGE: &str = "THE ONLY REASON THAT 'DESTINATION: SKELLIGE' IS PLACED HERE IS BECAUSE 'FLESH FOR SALE' IS EASILY MISSABLE AND THE ONLY WAY TO DO IT IS IN SKELLIGE. AS LONG AS YOU COMPLETE 'FLESH FOR SALE' BEFORE STARTING 'FOLLOWING THE THREAD', THEN YOU CAN TRAVEL TO SKELLIGE WHEN YOU ARE READY.";

pub const CONSIDER_IGNORING_MESSAGE: &str = "THE FOLLOWING QUEST IS NOT WORTH DOING CONSIDERING HOW OUT OF ORDER YOU WILL HAVE TO DO CERTAIN QUESTS. IT IS SIMPLY A 3 MINUTE BIT OF DIALOGUE AND THAT IS IT. IF YOU WOULD LIKE TO WATCH IT, I'VE ATTACHED A YOUTUBE CLIP OF THE QUEST ITSELF IN THE EXTRA DETAILS LINK. I'VE ONLY ADDED IT HERE IN CASE SOMEONE DID WANT TO DO IT.";

/// Rows the "only reason" note spans, counting the marker row itself; the
/// note lands on the six data rows right after the marker.
pub const ANNOTATION_SPAN: u32 = 7;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum Marker {
    AnyOrderStart,
    OrderEnd,
    StoryBranch(String),
    ConsiderIgnoring,
    OnlyReason,
}

/// Control marker carried by `row`, checked in priority order.
pub fn classify_marker(row: &RawRow) -> Option<Marker> {
    if row.contains_text(ANY_ORDER_MARKER) {
        return Some(Marker::AnyOrderStart);
    }
    if let Some(branch) = row.text_starting_with(STORY_BRANCH_MARKER) {
        return Some(Marker::StoryBranch(branch.to_string()));
    }
    if row.contains_text(CONSIDER_IGNORING_MARKER) {
        return Some(Marker::ConsiderIgnoring);
    }
    if row.contains_text(ONLY_REASON_MARKER) {
        return Some(Marker::OnlyReason);
    }
    if row.text_starting_with(ORDER_END_MARKER).is_some() {
        return Some(Marker::OrderEnd);
    }
    None
}
