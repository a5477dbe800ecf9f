use std::path::PathBuf;

use anyhow::{Context, Result};
use bestellverwaltung::{
    backup::{self, BackupManager},
    config,
    db::DbConfig,
};
use clap::Parser;

/// Scheduled snapshot with retention. Exits non-zero when the backup or
/// the pruning fails.
#[derive(Parser)]
#[command(name = "daily-backup", about = "Back up the database and prune old backups", version)]
struct Cli {
    #[arg(long, help = "Database file to back up instead of the configured one")]
    database: Option<PathBuf>,
    #[arg(long, help = "Number of backups to keep; 0 keeps all")]
    keep: Option<usize>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let (cfg, notices) = config::load_config().context("failed to load application config")?;
    let cfg = cfg.with_database_path(cli.database);
    config::init_tracing(cfg.log_level(), cfg.log_file(), cfg.log_stderr);
    config::log_notices(&notices);

    let keep = cli.keep.unwrap_or(cfg.backup_keep);
    let manager = BackupManager::new(cfg.backup_dir());
    let done = backup::run_scheduled_backup(&DbConfig::from(&cfg), &manager, keep)
        .await
        .with_context(|| format!("scheduled backup of {} failed", cfg.database_path))?;

    println!("Backup created: {}", done.backup.path.display());
    for path in &done.removed {
        println!("Removed old backup: {}", path.display());
    }
    Ok(())
}
