use anyhow::{Result, bail};
use chrono::Utc;
use serde::Serialize;
use tracing::{info, warn};

use crate::cli::ValidateArgs;
use crate::model::{CheckSummary, Quest};
use crate::util::{now_utc_string, read_json, sha256_file, utc_compact_string, write_json_pretty};

mod checks;
mod golden;
mod run;

pub use self::checks::{CatalogCheck, enforce_checks, integrity_checks, summarize_checks};
pub use self::golden::{GoldenManifest, golden_checks, load_golden_manifest};
pub use self::run::run;

/// Integrity checks followed by golden-record checks when a manifest is given.
pub fn catalog_checks(quests: &[Quest], golden: Option<&GoldenManifest>) -> Vec<CatalogCheck> {
    let mut checks = integrity_checks(quests);
    if let Some(golden) = golden {
        checks.extend(golden_checks(quests, golden));
    }
    checks
}
