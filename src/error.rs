use thiserror::Error;

/// Terminal failures of an extraction run.
///
/// Row numbers are 1-based sheet rows, the same numbers a human sees in the
/// spreadsheet when fixing the source.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ExtractError {
    #[error("row {row}: quest '{quest}' has no {field}")]
    MissingMetadata {
        row: u32,
        quest: String,
        field: &'static str,
    },

    #[error("row {row}: detail '{detail}' has no quest to attach to")]
    OrphanDetail { row: u32, detail: String },

    #[error("row {row}: quest '{quest}' has color '{color}' which is not in the palette")]
    UnknownQuestType {
        row: u32,
        quest: String,
        color: String,
    },

    #[error("catalog integrity check {check} failed: {reason}")]
    CatalogIntegrity { check: String, reason: String },
}

impl ExtractError {
    pub fn integrity(check: &str, reason: impl Into<String>) -> Self {
        Self::CatalogIntegrity {
            check: check.to_string(),
            reason: reason.into(),
        }
    }
}
