//! Subcommand handlers

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::ArgMatches;
use sdw_plans::{
    list_variants, AugmentSettings, Augmenter, PlansFile, PlansLocator, StridePolicy, VariantGrid,
};

/// Resolve `--plans-file` or `-d` (+ root and plans name) to a plans file
fn plans_file(args: &ArgMatches) -> Result<PlansFile> {
    if let Some(path) = args.get_one::<PathBuf>("plans-file") {
        return Ok(PlansFile::new(path));
    }

    let id = *args
        .get_one::<u32>("dataset-id")
        .context("either --dataset-id or --plans-file is required")?;
    let mut locator = PlansLocator::resolve(args.get_one::<PathBuf>("preprocessed-dir").cloned())?;
    if let Some(plans_name) = args.get_one::<String>("plans-name") {
        locator = locator.with_plans_name(plans_name);
    }
    Ok(PlansFile::new(locator.plans_path(id)?))
}

/// Settings file (if any) overridden by flags
fn settings(args: &ArgMatches) -> Result<AugmentSettings> {
    let mut settings = match args.get_one::<PathBuf>("config") {
        Some(path) => AugmentSettings::from_toml_file(path)?,
        None => AugmentSettings::new(),
    };

    if let Some(base) = args.get_one::<String>("base") {
        settings = settings.with_base(base);
    }
    let axis = |id: &str| args.get_many::<u32>(id).map(|v| v.copied().collect::<Vec<_>>());
    let grid = VariantGrid::new(
        axis("stages").unwrap_or_else(|| settings.grid.stages.clone()),
        axis("depths").unwrap_or_else(|| settings.grid.depths.clone()),
        axis("widths").unwrap_or_else(|| settings.grid.widths.clone()),
    );
    settings = settings.with_grid(grid);
    if let Some(&max_features) = args.get_one::<u32>("max-features") {
        settings = settings.with_max_features(max_features);
    }
    if let Some(policy) = args.get_one::<String>("stride-policy") {
        settings = settings.with_stride_policy(policy.parse::<StridePolicy>()?);
    }
    if args.get_flag("overwrite") {
        settings = settings.with_overwrite(true);
    }
    Ok(settings)
}

/// Dataset folder name for messages, falling back to the full path
fn dataset_label(path: &Path) -> String {
    path.parent()
        .and_then(Path::file_name)
        .map_or_else(|| path.display().to_string(), |name| name.to_string_lossy().into_owned())
}

pub(crate) fn add(args: &ArgMatches) -> Result<()> {
    let file = plans_file(args)?;
    let settings = settings(args)?;
    let json = args.get_flag("json");
    let dry_run = args.get_flag("dry-run");
    let path = file.path().display().to_string();
    tracing::debug!(?settings, plans = %path, "resolved settings");

    let mut doc = file
        .load()
        .with_context(|| format!("failed to load plans from {path}"))?;

    if !json {
        println!(
            "Adding S/D/W variants to {} based on {}...",
            dataset_label(file.path()),
            settings.base
        );
    }
    let report = Augmenter::new(settings).apply(&mut doc)?;

    let mut backup = None;
    if report.changed() && !dry_run {
        backup = file
            .save(&doc, !args.get_flag("no-backup"))
            .with_context(|| format!("failed to write plans to {path}"))?;
    }

    if json {
        let out = serde_json::json!({
            "plans_file": path,
            "dry_run": dry_run,
            "backup": backup.map(|p| p.display().to_string()),
            "report": report,
        });
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(());
    }

    if let Some(backup) = backup {
        println!("Backup created: {}", backup.display());
    }
    if !report.changed() {
        println!("No new configurations added (all already exist)");
    } else if dry_run {
        println!(
            "\nDry run: {} configurations would be written to {path}",
            report.written()
        );
    } else {
        println!(
            "\nSuccessfully added {} configurations to {path}",
            report.written()
        );
    }
    println!("Total configurations now: {}", report.total_configurations);
    Ok(())
}

pub(crate) fn list(args: &ArgMatches) -> Result<()> {
    let file = plans_file(args)?;
    let path = file.path().display().to_string();
    let doc = file
        .load()
        .with_context(|| format!("failed to load plans from {path}"))?;
    let entries = list_variants(&doc);

    if args.get_flag("json") {
        println!("{}", serde_json::to_string_pretty(&entries)?);
        return Ok(());
    }

    if entries.is_empty() {
        println!("No S/D/W variants found in {path}");
        return Ok(());
    }

    println!("S/D/W variants in {path}:");
    for entry in &entries {
        let v = entry.variant;
        print!(
            "  {:<28} base={} S={} D={} W={} features={:?}",
            entry.name, entry.base, v.stages, v.depth, v.width, entry.features_per_stage
        );
        if entry.is_consistent() {
            println!();
        } else {
            println!("  [mismatch: {}]", entry.mismatches.join("; "));
        }
    }
    println!("Total: {} variants", entries.len());
    Ok(())
}
