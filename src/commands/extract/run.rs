use std::path::Path;

use anyhow::{Context, Result};
use chrono::Utc;
use tracing::{info, warn};

use super::emitter::serialize_catalog;
use super::links::LinkTable;
use super::pipeline::{QuestExtractor, build_counts};
use crate::cli::ExtractArgs;
use crate::commands::validate::{
    catalog_checks, enforce_checks, load_golden_manifest, summarize_checks,
};
use crate::model::{ExtractRunManifest, SourceWorkbook};
use crate::util::{
    now_utc_string, sha256_bytes, sha256_file, utc_compact_string, write_bytes_atomic,
    write_json_pretty,
};
use crate::workbook::Workbook;

pub fn run(args: ExtractArgs) -> Result<()> {
    let started = Utc::now();
    let started_at = now_utc_string();
    let manifest_dir = args.cache_root.join("manifests");
    let run_manifest_path = args.run_manifest_path.clone().unwrap_or_else(|| {
        manifest_dir.join(format!("extract_run_{}.json", utc_compact_string(started)))
    });

    let source_sha256 = sha256_file(&args.input)?;
    let mut workbook = Workbook::open(&args.input)?;
    let sheet = workbook.sheet(args.sheet_index)?;
    let rows = sheet.rows_from(args.start_row);
    info!(
        input = %args.input.display(),
        sheets = workbook.sheets().len(),
        sheet = %sheet.name,
        defined_rows = sheet.defined_row_count(),
        scanned_rows = rows.len(),
        "workbook loaded"
    );

    let links = args
        .link_table
        .as_deref()
        .map(LinkTable::load)
        .transpose()?;

    let extraction = QuestExtractor::new()?
        .extract(&rows, links.as_ref())
        .with_context(|| format!("extraction failed for {}", args.input.display()))?;

    let golden = args
        .golden_manifest_path
        .as_deref()
        .map(load_golden_manifest)
        .transpose()?;
    let checks = catalog_checks(&extraction.quests, golden.as_ref());
    for check in checks.iter().filter(|check| check.failed()) {
        warn!(
            check_id = %check.check_id,
            name = %check.name,
            detail = check.detail.as_deref().unwrap_or(""),
            "catalog check failed"
        );
    }
    enforce_checks(&checks).context("catalog rejected, nothing was written")?;

    let catalog = serialize_catalog(&extraction.quests)?;
    let counts = build_counts(&extraction);

    let mut warnings = Vec::new();
    if counts.skipped_rows > 0 {
        warnings.push(format!(
            "{} data rows had no quest to attach to and were skipped",
            counts.skipped_rows
        ));
    }
    if golden.is_none() {
        warnings.push("no golden manifest supplied; golden-record checks skipped".to_string());
    }
    for warning in &warnings {
        warn!(warning = %warning, "extraction warning");
    }

    if args.dry_run {
        info!(
            quests = counts.quests_emitted,
            extra_details = counts.extra_details,
            checks = checks.len(),
            "dry-run enabled; catalog and run manifest not written"
        );
        return Ok(());
    }

    write_bytes_atomic(&args.output, &catalog)?;

    let manifest = ExtractRunManifest {
        manifest_version: 1,
        run_id: format!("run-{}", utc_compact_string(started)),
        status: "completed".to_string(),
        started_at,
        updated_at: now_utc_string(),
        command: render_extract_command(&args),
        source: SourceWorkbook {
            path: args.input.display().to_string(),
            sha256: source_sha256,
            sheet_index: args.sheet_index,
            sheet_name: sheet.name.clone(),
            start_row: args.start_row,
        },
        catalog_path: args.output.display().to_string(),
        catalog_sha256: sha256_bytes(&catalog),
        link_table_path: display_path(args.link_table.as_deref()),
        golden_manifest_path: display_path(args.golden_manifest_path.as_deref()),
        counts,
        checks: summarize_checks(&checks),
        warnings,
    };
    write_json_pretty(&run_manifest_path, &manifest)?;

    info!(
        output = %args.output.display(),
        manifest = %run_manifest_path.display(),
        quests = manifest.counts.quests_emitted,
        extra_details = manifest.counts.extra_details,
        "extraction completed"
    );

    Ok(())
}

fn display_path(path: Option<&Path>) -> Option<String> {
    path.map(|path| path.display().to_string())
}

pub(super) fn render_extract_command(args: &ExtractArgs) -> String {
    let mut command = format!(
        "quest-catalog extract --input {} --sheet-index {} --start-row {} --output {} --cache-root {}",
        args.input.display(),
        args.sheet_index,
        args.start_row,
        args.output.display(),
        args.cache_root.display()
    );
    if let Some(path) = &args.link_table {
        command.push_str(&format!(" --link-table {}", path.display()));
    }
    if let Some(path) = &args.golden_manifest_path {
        command.push_str(&format!(" --golden-manifest-path {}", path.display()));
    }
    command
}
