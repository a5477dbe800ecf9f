//! Database snapshots.
//!
//! Snapshots are written with `VACUUM INTO`, which produces a consistent copy
//! even while another connection has the file open. File names carry the
//! creation time, which is what retention orders by.

use crate::db::{self, DbConfig, DbPool};
use crate::errors::ServiceError;
use chrono::{Duration, Local, NaiveDateTime, Timelike};
use sea_orm::ConnectionTrait;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{error, info, instrument, warn};

const STAMP_FORMAT: &str = "%Y%m%d_%H%M%S";
const EXTENSION: &str = ".db";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum BackupKind {
    /// Ad-hoc and scheduled backups; subject to retention
    Regular,
    /// Snapshot taken before the price cleanup writes
    PreCleanup,
}

impl BackupKind {
    pub fn prefix(self) -> &'static str {
        match self {
            BackupKind::Regular => "bestellverwaltung_BACKUP_",
            BackupKind::PreCleanup => "bestellverwaltung_CLEANBACKUP_",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BackupFile {
    pub path: PathBuf,
    pub kind: BackupKind,
    pub created_at: NaiveDateTime,
}

/// `YYYYmmdd_HHMMSS_mmm`
pub fn format_stamp(at: NaiveDateTime) -> String {
    format!(
        "{}_{:03}",
        at.format(STAMP_FORMAT),
        at.nanosecond() / 1_000_000
    )
}

/// Reads the timestamp of a backup file name. Names without milliseconds,
/// as written by older versions, are accepted too.
pub fn parse_backup_name(name: &str, kind: BackupKind) -> Option<NaiveDateTime> {
    let stamp = name.strip_prefix(kind.prefix())?.strip_suffix(EXTENSION)?;
    if !stamp.is_ascii() {
        return None;
    }
    let (seconds, millis) = match stamp.len() {
        15 => (stamp, 0),
        19 => {
            let (seconds, rest) = stamp.split_at(15);
            let millis = rest.strip_prefix('_')?;
            if !millis.chars().all(|c| c.is_ascii_digit()) {
                return None;
            }
            (seconds, millis.parse::<i64>().ok()?)
        }
        _ => return None,
    };
    let at = NaiveDateTime::parse_from_str(seconds, STAMP_FORMAT).ok()?;
    Some(at + Duration::milliseconds(millis))
}

/// Creates, lists and prunes snapshots in one directory.
#[derive(Debug, Clone)]
pub struct BackupManager {
    dir: PathBuf,
}

impl BackupManager {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn backup_path(&self, kind: BackupKind, at: NaiveDateTime) -> PathBuf {
        self.dir
            .join(format!("{}{}{}", kind.prefix(), format_stamp(at), EXTENSION))
    }

    /// Writes a snapshot stamped with the current local time
    pub async fn create_backup(
        &self,
        db: &DbPool,
        kind: BackupKind,
    ) -> Result<BackupFile, ServiceError> {
        self.create_backup_at(db, kind, Local::now().naive_local())
            .await
    }

    /// Writes a snapshot stamped with `at`. Fails rather than overwrite an
    /// existing file.
    #[instrument(skip(self, db))]
    pub async fn create_backup_at(
        &self,
        db: &DbPool,
        kind: BackupKind,
        at: NaiveDateTime,
    ) -> Result<BackupFile, ServiceError> {
        fs::create_dir_all(&self.dir).map_err(|e| {
            error!("Cannot create backup directory {}: {}", self.dir.display(), e);
            ServiceError::BackupError(format!("{}: {}", self.dir.display(), e))
        })?;

        let path = self.backup_path(kind, at);
        if path.exists() {
            return Err(ServiceError::BackupError(format!(
                "{} already exists",
                path.display()
            )));
        }

        let target = path.to_string_lossy().replace('\'', "''");
        db.execute_unprepared(&format!("VACUUM INTO '{}'", target))
            .await
            .map_err(|e| {
                error!("Backup to {} failed: {}", path.display(), e);
                ServiceError::BackupError(format!("{}: {}", path.display(), e))
            })?;

        info!("Backup created: {}", path.display());
        Ok(BackupFile {
            path,
            kind,
            created_at: at,
        })
    }

    /// Backups of `kind` in the directory, oldest first
    pub fn list_backups(&self, kind: BackupKind) -> Result<Vec<BackupFile>, ServiceError> {
        if !self.dir.exists() {
            return Ok(Vec::new());
        }

        let mut backups = Vec::new();
        for entry in fs::read_dir(&self.dir)? {
            let entry = entry?;
            if !entry.file_type()?.is_file() {
                continue;
            }
            let name = entry.file_name();
            let Some(name) = name.to_str() else {
                continue;
            };
            if let Some(created_at) = parse_backup_name(name, kind) {
                backups.push(BackupFile {
                    path: entry.path(),
                    kind,
                    created_at,
                });
            }
        }
        backups.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.path.cmp(&b.path)));
        Ok(backups)
    }

    /// Deletes all but the `keep` newest regular backups; `keep == 0` keeps
    /// everything. Returns the deleted files.
    #[instrument(skip(self))]
    pub fn prune(&self, keep: usize) -> Result<Vec<PathBuf>, ServiceError> {
        if keep == 0 {
            return Ok(Vec::new());
        }

        let backups = self.list_backups(BackupKind::Regular)?;
        let excess = backups.len().saturating_sub(keep);
        let mut removed = Vec::with_capacity(excess);
        let mut failures = Vec::new();

        for backup in backups.into_iter().take(excess) {
            match fs::remove_file(&backup.path) {
                Ok(()) => {
                    info!("Old backup removed: {}", backup.path.display());
                    removed.push(backup.path);
                }
                Err(e) => {
                    warn!("Cannot remove {}: {}", backup.path.display(), e);
                    failures.push(format!("{}: {}", backup.path.display(), e));
                }
            }
        }

        if !failures.is_empty() {
            return Err(ServiceError::BackupError(failures.join("; ")));
        }
        Ok(removed)
    }
}

/// Result of a scheduled backup run.
#[derive(Debug, Clone)]
pub struct ScheduledBackup {
    pub backup: BackupFile,
    pub removed: Vec<PathBuf>,
}

/// Snapshots the existing database behind `db_config` and prunes the
/// regular backups down to `keep`. A failure is logged at error level before
/// it is returned, so unattended runs leave a trace in the log file.
#[instrument(skip(db_config, manager), fields(path = %db_config.path.display()))]
pub async fn run_scheduled_backup(
    db_config: &DbConfig,
    manager: &BackupManager,
    keep: usize,
) -> Result<ScheduledBackup, ServiceError> {
    match scheduled_backup(db_config, manager, keep).await {
        Ok(done) => {
            info!(
                "Scheduled backup done: {} (kept {}, removed {})",
                done.backup.path.display(),
                keep,
                done.removed.len()
            );
            Ok(done)
        }
        Err(e) => {
            error!(
                "Scheduled backup of {} failed: {}",
                db_config.path.display(),
                e
            );
            Err(e)
        }
    }
}

async fn scheduled_backup(
    db_config: &DbConfig,
    manager: &BackupManager,
    keep: usize,
) -> Result<ScheduledBackup, ServiceError> {
    let config = DbConfig {
        create_if_missing: false,
        ..db_config.clone()
    };
    let pool = db::open_unmigrated(&config).await?;
    let backup = manager.create_backup(&pool, BackupKind::Regular).await?;
    if let Err(e) = pool.close().await {
        warn!("Closing {} after the backup failed: {}", config.path.display(), e);
    }
    let removed = manager.prune(keep)?;
    Ok(ScheduledBackup { backup, removed })
}
