use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(
    name = "quest-catalog",
    version,
    about = "Extracts the quest-order spreadsheet into the bundled quest catalog"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Extract the catalog from the workbook.
    Extract(ExtractArgs),
    /// Print how each sheet row is classified.
    Rows(RowsArgs),
    /// Re-run integrity and golden checks against an emitted catalog.
    Validate(ValidateArgs),
    Status(StatusArgs),
    /// Show the catalog grouped by location with completion flags applied.
    Progress(ProgressArgs),
}

#[derive(Args, Debug, Clone)]
pub struct ExtractArgs {
    #[arg(long)]
    pub input: PathBuf,

    #[arg(long, default_value_t = 1)]
    pub sheet_index: usize,

    /// Zero-based index of the first data row.
    #[arg(long, default_value_t = 9)]
    pub start_row: u32,

    #[arg(long, default_value = "catalog/quests.json")]
    pub output: PathBuf,

    #[arg(long, default_value = ".cache/quest-catalog")]
    pub cache_root: PathBuf,

    #[arg(long)]
    pub run_manifest_path: Option<PathBuf>,

    /// JSON object mapping raw quest-name cell text to its url.
    #[arg(long)]
    pub link_table: Option<PathBuf>,

    #[arg(long)]
    pub golden_manifest_path: Option<PathBuf>,

    #[arg(long, default_value_t = false)]
    pub dry_run: bool,
}

#[derive(Args, Debug, Clone)]
pub struct RowsArgs {
    #[arg(long)]
    pub input: PathBuf,

    #[arg(long, default_value_t = 1)]
    pub sheet_index: usize,

    #[arg(long, default_value_t = 9)]
    pub start_row: u32,

    #[arg(long)]
    pub link_table: Option<PathBuf>,

    #[arg(long, default_value_t = false)]
    pub json: bool,
}

#[derive(Args, Debug, Clone)]
pub struct ValidateArgs {
    #[arg(long, default_value = ".cache/quest-catalog")]
    pub cache_root: PathBuf,

    #[arg(long, default_value = "catalog/quests.json")]
    pub catalog_path: PathBuf,

    #[arg(long)]
    pub golden_manifest_path: Option<PathBuf>,

    #[arg(long)]
    pub report_path: Option<PathBuf>,
}

#[derive(Args, Debug, Clone)]
pub struct StatusArgs {
    #[arg(long, default_value = ".cache/quest-catalog")]
    pub cache_root: PathBuf,
}

#[derive(Args, Debug, Clone)]
pub struct ProgressArgs {
    #[arg(long, default_value = "catalog/quests.json")]
    pub catalog_path: PathBuf,

    /// JSON array of `{id, isCompleted, isHidden}` records.
    #[arg(long)]
    pub statuses_path: Option<PathBuf>,

    #[arg(long)]
    pub search: Option<String>,

    #[arg(long, default_value_t = false)]
    pub hide_completed: bool,

    #[arg(long, default_value_t = false)]
    pub json: bool,
}
