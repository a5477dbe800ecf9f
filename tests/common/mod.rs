#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use bestellverwaltung::{
    backup::BackupManager,
    db::{self, DatabaseFileState, DbConfig, DbPool},
    services::Services,
};
use sea_orm::{ConnectionTrait, DbBackend, FromQueryResult, Statement, Value};
use tempfile::TempDir;

/// Seeded product IDs
pub const LAPTOP: i32 = 1;
pub const SMARTPHONE: i32 = 2;
pub const HEADPHONES: i32 = 3;

/// Stock after seeding: the sample order holds one laptop and two headphones
pub const LAPTOP_STOCK: i32 = 9;
pub const SMARTPHONE_STOCK: i32 = 15;
pub const HEADPHONES_STOCK: i32 = 18;

pub fn db_config(path: &Path) -> DbConfig {
    DbConfig {
        connect_attempts: 1,
        retry_delay: Duration::from_millis(10),
        ..DbConfig::new(path)
    }
}

/// A database file in its own temporary directory, opened and migrated.
pub struct TestDb {
    pub dir: TempDir,
    pub path: PathBuf,
    pub state: DatabaseFileState,
    pub db: Arc<DbPool>,
    pub services: Services,
}

impl TestDb {
    /// Fresh database with the sample data
    pub async fn seeded() -> Self {
        let test_db = Self::empty().await;
        let seeded = db::seed::seed_sample_data(&*test_db.db)
            .await
            .expect("seed sample data");
        assert!(seeded);
        test_db
    }

    /// Fresh database without any rows
    pub async fn empty() -> Self {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("bestellverwaltung.db");
        Self::open_in(dir, path).await
    }

    pub async fn open_in(dir: TempDir, path: PathBuf) -> Self {
        let (pool, state) = db::open_database(&db_config(&path))
            .await
            .expect("open database");
        let db = Arc::new(pool);
        let services = Services::new(db.clone(), 19.0);
        Self {
            dir,
            path,
            state,
            db,
            services,
        }
    }

    pub fn backups(&self) -> BackupManager {
        BackupManager::new(self.dir.path().join("backups"))
    }

    pub async fn execute(&self, sql: &str) {
        self.db
            .execute_unprepared(sql)
            .await
            .unwrap_or_else(|e| panic!("{}: {}", sql, e));
    }

    pub async fn stock_of(&self, product_id: i32) -> i32 {
        self.services
            .inventory
            .stock_on_hand(product_id)
            .await
            .expect("stock on hand")
    }

    /// Smallest quantity over all stock rows
    pub async fn min_stock(&self) -> i64 {
        scalar_i64(&*self.db, "SELECT COALESCE(MIN(Menge), 0) AS value FROM Lagerbestand", []).await
    }

    pub async fn count(&self, table: &str) -> i64 {
        scalar_i64(&*self.db, &format!("SELECT COUNT(*) AS value FROM {}", table), []).await
    }

    /// Storage class of a product's price (`real`, `integer` or `text`)
    pub async fn price_type(&self, product_id: i32) -> String {
        #[derive(FromQueryResult)]
        struct Row {
            value: String,
        }
        Row::find_by_statement(Statement::from_sql_and_values(
            DbBackend::Sqlite,
            "SELECT typeof(Preis) AS value FROM Produkte WHERE ProduktID = ?",
            [Value::from(product_id)],
        ))
        .one(&*self.db)
        .await
        .expect("price type")
        .expect("product exists")
        .value
    }
}

pub async fn scalar_i64<C: ConnectionTrait, const N: usize>(
    db: &C,
    sql: &str,
    values: [Value; N],
) -> i64 {
    #[derive(FromQueryResult)]
    struct Row {
        value: i64,
    }
    Row::find_by_statement(Statement::from_sql_and_values(DbBackend::Sqlite, sql, values))
        .one(db)
        .await
        .expect("scalar query")
        .expect("one row")
        .value
}
