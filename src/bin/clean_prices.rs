use std::path::PathBuf;

use anyhow::{Context, Result};
use bestellverwaltung::{
    backup::BackupManager,
    config,
    db::DbConfig,
    services::prices::{self, CleanupReport},
};
use clap::{ArgAction, Parser};
use serde::Serialize;
use tracing::info;

/// Converts product prices stored as text (`"179,00"`, `"1.234,56 €"`)
/// into numbers.
#[derive(Parser)]
#[command(name = "clean-prices", about = "Normalize product prices stored as text", version)]
struct Cli {
    #[arg(long, help = "Database file to clean instead of the configured one")]
    database: Option<PathBuf>,
    #[arg(
        long,
        action = ArgAction::SetTrue,
        help = "Only report the changes, write nothing"
    )]
    dry: bool,
    #[arg(
        long,
        action = ArgAction::SetTrue,
        help = "Render the report as pretty JSON"
    )]
    json: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let (cfg, notices) = config::load_config().context("failed to load application config")?;
    let cfg = cfg.with_database_path(cli.database);
    config::init_tracing(cfg.log_level(), cfg.log_file(), cfg.log_stderr);
    config::log_notices(&notices);

    let backups = BackupManager::new(cfg.backup_dir());
    let report = prices::clean_database_file(&DbConfig::from(&cfg), cli.dry, &backups)
        .await
        .with_context(|| format!("price cleanup of {} failed", cfg.database_path))?;

    if cli.json {
        print_json(&report)?;
    } else {
        render_report(&report);
    }

    info!(
        "clean-prices finished: {} change(s), {} skipped, dry run {}",
        report.changes.len(),
        report.skipped.len(),
        report.dry_run
    );
    Ok(())
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn render_report(report: &CleanupReport) {
    if report.changes.is_empty() && report.skipped.is_empty() {
        println!("No text prices found.");
        return;
    }

    for fix in &report.changes {
        println!(
            "- {} (ID {}): '{}' -> {}",
            fix.product_name, fix.product_id, fix.original, fix.cleaned
        );
    }
    for skipped in &report.skipped {
        println!(
            "- {} (ID {}): '{}' skipped, {}",
            skipped.product_name, skipped.product_id, skipped.original, skipped.reason
        );
    }

    if let Some(path) = &report.backup {
        println!("Backup before cleanup: {}", path.display());
    }
    if report.dry_run {
        println!("Dry run: {} price(s) would be changed.", report.changes.len());
    } else {
        println!("{} price(s) changed.", report.applied);
    }
}
