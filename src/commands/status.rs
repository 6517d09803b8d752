use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::{info, warn};

use crate::cli::StatusArgs;
use crate::model::ExtractRunManifest;
use crate::util::{read_json, sha256_file};

const RUN_MANIFEST_PREFIX: &str = "extract_run_";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CatalogState {
    Missing,
    Matches,
    Changed,
}

impl CatalogState {
    fn as_str(self) -> &'static str {
        match self {
            Self::Missing => "missing",
            Self::Matches => "matches run manifest",
            Self::Changed => "changed since run",
        }
    }
}

pub fn run(args: StatusArgs) -> Result<()> {
    let manifest_dir = args.cache_root.join("manifests");
    let quality_report_path = manifest_dir.join("catalog_quality_report.json");

    info!(cache_root = %args.cache_root.display(), "status requested");

    match latest_run_manifest(&manifest_dir)? {
        Some(path) => {
            let manifest: ExtractRunManifest = read_json(&path)?;
            let state = catalog_state(&manifest)?;

            info!(
                path = %path.display(),
                run_id = %manifest.run_id,
                status = %manifest.status,
                updated_at = %manifest.updated_at,
                source = %manifest.source.path,
                sheet = %manifest.source.sheet_name,
                quests = manifest.counts.quests_emitted,
                extra_details = manifest.counts.extra_details,
                checks_failed = manifest.checks.failed,
                "loaded extract run manifest"
            );

            match state {
                CatalogState::Matches => info!(
                    catalog = %manifest.catalog_path,
                    state = state.as_str(),
                    "catalog status"
                ),
                _ => warn!(
                    catalog = %manifest.catalog_path,
                    state = state.as_str(),
                    "catalog status"
                ),
            }
        }
        None => warn!(path = %manifest_dir.display(), "no extract run manifest found"),
    }

    if quality_report_path.exists() {
        let report: serde_json::Value = read_json(&quality_report_path)?;
        info!(
            path = %quality_report_path.display(),
            status = report["status"].as_str().unwrap_or_default(),
            generated_at = report["generated_at"].as_str().unwrap_or_default(),
            "loaded catalog quality report"
        );
    } else {
        warn!(path = %quality_report_path.display(), "catalog quality report missing");
    }

    Ok(())
}

/// Newest `extract_run_<timestamp>.json`; compact UTC timestamps sort by name.
pub fn latest_run_manifest(manifest_dir: &Path) -> Result<Option<PathBuf>> {
    if !manifest_dir.exists() {
        return Ok(None);
    }

    let mut candidates = Vec::new();
    for entry in fs::read_dir(manifest_dir)
        .with_context(|| format!("failed to list {}", manifest_dir.display()))?
    {
        let path = entry
            .with_context(|| format!("failed to read entry in {}", manifest_dir.display()))?
            .path();
        let is_run_manifest = path
            .file_name()
            .and_then(|name| name.to_str())
            .is_some_and(|name| name.starts_with(RUN_MANIFEST_PREFIX) && name.ends_with(".json"));
        if is_run_manifest {
            candidates.push(path);
        }
    }

    candidates.sort();
    Ok(candidates.pop())
}

pub fn catalog_state(manifest: &ExtractRunManifest) -> Result<CatalogState> {
    let catalog_path = Path::new(&manifest.catalog_path);
    if !catalog_path.exists() {
        return Ok(CatalogState::Missing);
    }

    if sha256_file(catalog_path)? == manifest.catalog_sha256 {
        Ok(CatalogState::Matches)
    } else {
        Ok(CatalogState::Changed)
    }
}
