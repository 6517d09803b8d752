use super::*;

#[derive(Debug, Serialize)]
struct CatalogQualityReport {
    manifest_version: u32,
    run_id: String,
    generated_at: String,
    status: String,
    catalog_path: String,
    catalog_sha256: String,
    golden_manifest_path: Option<String>,
    quests: usize,
    summary: CheckSummary,
    checks: Vec<CatalogCheck>,
    issues: Vec<String>,
}

pub fn run(args: ValidateArgs) -> Result<()> {
    let manifest_dir = args.cache_root.join("manifests");
    let report_path = args
        .report_path
        .clone()
        .unwrap_or_else(|| manifest_dir.join("catalog_quality_report.json"));

    let quests: Vec<Quest> = read_json(&args.catalog_path)?;
    let catalog_sha256 = sha256_file(&args.catalog_path)?;
    info!(
        path = %args.catalog_path.display(),
        quests = quests.len(),
        "loaded catalog"
    );

    let golden = args
        .golden_manifest_path
        .as_deref()
        .map(load_golden_manifest)
        .transpose()?;
    let checks = catalog_checks(&quests, golden.as_ref());
    let summary = summarize_checks(&checks);

    let issues = checks
        .iter()
        .filter(|check| check.failed())
        .map(|check| {
            format!(
                "{} failed: {}",
                check.name,
                check.detail.as_deref().unwrap_or("no detail")
            )
        })
        .collect::<Vec<String>>();
    for issue in &issues {
        warn!(issue = %issue, "catalog check failed");
    }

    let report = CatalogQualityReport {
        manifest_version: 1,
        run_id: format!("run-{}", utc_compact_string(Utc::now())),
        generated_at: now_utc_string(),
        status: if summary.failed > 0 {
            "failed".to_string()
        } else {
            "passed".to_string()
        },
        catalog_path: args.catalog_path.display().to_string(),
        catalog_sha256,
        golden_manifest_path: args
            .golden_manifest_path
            .as_ref()
            .map(|path| path.display().to_string()),
        quests: quests.len(),
        summary,
        checks,
        issues,
    };

    write_json_pretty(&report_path, &report)?;

    info!(
        report_path = %report_path.display(),
        passed = report.summary.passed,
        failed = report.summary.failed,
        "validation completed"
    );

    if report.summary.failed > 0 {
        bail!(
            "{} of {} catalog checks failed; see {}",
            report.summary.failed,
            report.summary.total_checks,
            report_path.display()
        );
    }

    Ok(())
}
