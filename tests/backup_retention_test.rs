mod common;

use assert_matches::assert_matches;
use bestellverwaltung::{
    backup::{self, BackupKind, BackupManager},
    db::{self, DatabaseFileState},
    errors::ServiceError,
};
use chrono::{Duration, NaiveDate, NaiveDateTime};
use common::{db_config, TestDb};
use sea_orm::{EntityTrait, PaginatorTrait};

fn day(n: i64) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2025, 12, 1)
        .unwrap()
        .and_hms_opt(18, 0, 0)
        .unwrap()
        + Duration::days(n)
}

#[tokio::test]
async fn scheduled_runs_keep_the_newest_backups() {
    let test_db = TestDb::seeded().await;
    let manager = test_db.backups();
    let keep = 3;
    let runs = keep + 4;

    for n in 0..runs {
        manager
            .create_backup_at(&test_db.db, BackupKind::Regular, day(n as i64))
            .await
            .unwrap();
        manager.prune(keep).unwrap();
    }

    let remaining = manager.list_backups(BackupKind::Regular).unwrap();
    let stamps: Vec<NaiveDateTime> = remaining.iter().map(|b| b.created_at).collect();
    let expected: Vec<NaiveDateTime> = (runs - keep..runs).map(|n| day(n as i64)).collect();
    assert_eq!(stamps, expected);
}

#[tokio::test]
async fn legacy_names_are_ordered_with_new_ones() {
    let test_db = TestDb::seeded().await;
    let manager = test_db.backups();
    std::fs::create_dir_all(manager.dir()).unwrap();
    let legacy = manager
        .dir()
        .join("bestellverwaltung_BACKUP_20251130_180000.db");
    std::fs::write(&legacy, b"").unwrap();
    let unrelated = manager.dir().join("notizen.txt");
    std::fs::write(&unrelated, b"").unwrap();

    manager
        .create_backup_at(&test_db.db, BackupKind::Regular, day(0))
        .await
        .unwrap();
    let removed = manager.prune(1).unwrap();

    assert_eq!(removed, vec![legacy.clone()]);
    assert!(!legacy.exists());
    assert!(unrelated.exists());
}

#[tokio::test]
async fn cleanup_snapshots_are_not_pruned() {
    let test_db = TestDb::seeded().await;
    let manager = test_db.backups();
    manager
        .create_backup_at(&test_db.db, BackupKind::PreCleanup, day(0))
        .await
        .unwrap();
    for n in 1..4 {
        manager
            .create_backup_at(&test_db.db, BackupKind::Regular, day(n))
            .await
            .unwrap();
    }

    manager.prune(1).unwrap();
    assert_eq!(manager.list_backups(BackupKind::Regular).unwrap().len(), 1);
    assert_eq!(manager.list_backups(BackupKind::PreCleanup).unwrap().len(), 1);
}

#[tokio::test]
async fn backup_is_a_complete_database() {
    let test_db = TestDb::seeded().await;
    let manager = test_db.backups();
    let backup = manager
        .create_backup(&test_db.db, BackupKind::Regular)
        .await
        .unwrap();

    assert_eq!(
        db::inspect_database_file(&backup.path).unwrap(),
        DatabaseFileState::Existing
    );
    let (copy, _) = db::open_database(&db_config(&backup.path)).await.unwrap();
    let customers = bestellverwaltung::entities::customer::Entity::find()
        .count(&copy)
        .await
        .unwrap();
    assert_eq!(customers, 3);
}

#[tokio::test]
async fn existing_backup_is_not_overwritten() {
    let test_db = TestDb::seeded().await;
    let manager = test_db.backups();
    manager
        .create_backup_at(&test_db.db, BackupKind::Regular, day(0))
        .await
        .unwrap();

    let result = manager
        .create_backup_at(&test_db.db, BackupKind::Regular, day(0))
        .await;
    assert_matches!(result, Err(ServiceError::BackupError(_)));
}

#[tokio::test]
async fn unwritable_target_is_reported() {
    let test_db = TestDb::seeded().await;
    let blocker = test_db.dir.path().join("blocked");
    std::fs::write(&blocker, b"a file, not a directory").unwrap();

    let manager = BackupManager::new(blocker.join("backups"));
    let result = manager.create_backup(&test_db.db, BackupKind::Regular).await;
    assert_matches!(result, Err(ServiceError::BackupError(_)));
}

#[tokio::test]
async fn scheduled_run_snapshots_then_prunes() {
    let test_db = TestDb::seeded().await;
    let manager = test_db.backups();
    for n in 0..3 {
        manager
            .create_backup_at(&test_db.db, BackupKind::Regular, day(n))
            .await
            .unwrap();
    }

    let done = backup::run_scheduled_backup(&db_config(&test_db.path), &manager, 2)
        .await
        .unwrap();

    assert!(done.backup.path.exists());
    assert_eq!(done.removed.len(), 2);
    let kept: Vec<_> = manager
        .list_backups(BackupKind::Regular)
        .unwrap()
        .into_iter()
        .map(|b| b.path)
        .collect();
    assert_eq!(kept.len(), 2);
    assert!(kept.contains(&done.backup.path));
}

#[tokio::test]
async fn scheduled_run_of_a_missing_database_fails_without_creating_it() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("absent.db");
    let manager = BackupManager::new(dir.path().join("backups"));

    let result = backup::run_scheduled_backup(&db_config(&missing), &manager, 3).await;
    assert_matches!(result, Err(ServiceError::NotFound(_)));
    assert!(!missing.exists());
}
