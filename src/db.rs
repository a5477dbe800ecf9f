pub mod seed;

use crate::config::AppConfig;
use crate::errors::ServiceError;
use crate::migrator::Migrator;
use sea_orm::{
    ConnectOptions, ConnectionTrait, Database, DatabaseConnection, DbBackend, DbErr, Statement,
};
use sea_orm_migration::MigratorTrait;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, error, info, warn};

/// Type alias for a database connection pool
pub type DbPool = DatabaseConnection;

/// First 16 bytes of every SQLite 3 database file.
const SQLITE_HEADER: &[u8; 16] = b"SQLite format 3\0";

/// Configuration for database connection
#[derive(Debug, Clone)]
pub struct DbConfig {
    /// Path of the database file
    pub path: PathBuf,
    /// Connection attempts before giving up
    pub connect_attempts: u32,
    /// Pause between connection attempts
    pub retry_delay: Duration,
    /// Create the file when it does not exist
    pub create_if_missing: bool,
    /// Open with `mode=ro`; SQLite then refuses every write
    pub read_only: bool,
}

impl DbConfig {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            connect_attempts: 6,
            retry_delay: Duration::from_secs(1),
            create_if_missing: true,
            read_only: false,
        }
    }

    /// SQLite connection URL for the configured file
    pub fn url(&self) -> String {
        let mode = match (self.read_only, self.create_if_missing) {
            (true, _) => "ro",
            (false, true) => "rwc",
            (false, false) => "rw",
        };
        format!("sqlite://{}?mode={}", self.path.display(), mode)
    }
}

impl From<&AppConfig> for DbConfig {
    fn from(cfg: &AppConfig) -> Self {
        Self {
            path: cfg.database_path().to_path_buf(),
            connect_attempts: cfg.db_connect_attempts.max(1),
            retry_delay: Duration::from_secs(cfg.db_connect_retry_secs),
            create_if_missing: true,
            read_only: false,
        }
    }
}

/// What was found at the database path before connecting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DatabaseFileState {
    /// No file; connecting creates a new database
    Missing,
    /// Zero-length file, which SQLite treats as an empty database
    Empty,
    /// File carrying a SQLite header
    Existing,
}

impl DatabaseFileState {
    pub fn is_new(self) -> bool {
        matches!(self, DatabaseFileState::Missing | DatabaseFileState::Empty)
    }
}

/// Checks that `path` is absent, empty, or a SQLite database, without
/// opening it for writing.
pub fn inspect_database_file(path: &Path) -> Result<DatabaseFileState, ServiceError> {
    if !path.exists() {
        return Ok(DatabaseFileState::Missing);
    }
    if !path.is_file() {
        return Err(ServiceError::InvalidDatabase(format!(
            "{} is not a regular file",
            path.display()
        )));
    }

    let mut file = File::open(path)?;
    let mut header = Vec::with_capacity(SQLITE_HEADER.len());
    file.by_ref()
        .take(SQLITE_HEADER.len() as u64)
        .read_to_end(&mut header)?;

    if header.is_empty() {
        return Ok(DatabaseFileState::Empty);
    }
    if header.as_slice() != SQLITE_HEADER {
        return Err(ServiceError::InvalidDatabase(format!(
            "{} is not a SQLite database",
            path.display()
        )));
    }
    Ok(DatabaseFileState::Existing)
}

/// Establishes a connection to the database file, retrying while another
/// process holds it.
pub async fn establish_connection(config: &DbConfig) -> Result<DbPool, ServiceError> {
    debug!("Configuring database connection with: {:?}", config);

    let mut attempt = 0;
    loop {
        attempt += 1;

        // A single connection: the menu is single-user and transactions must
        // see their own writes.
        let mut opt = ConnectOptions::new(config.url());
        opt.max_connections(1)
            .min_connections(1)
            .connect_timeout(Duration::from_secs(10))
            .acquire_timeout(Duration::from_secs(10))
            .sqlx_logging(false);

        match Database::connect(opt).await {
            Ok(pool) => {
                info!("Database {} opened", config.path.display());
                return Ok(pool);
            }
            Err(e) if attempt < config.connect_attempts => {
                warn!(
                    "Connection attempt {} of {} to {} failed: {}",
                    attempt,
                    config.connect_attempts,
                    config.path.display(),
                    e
                );
                sleep(config.retry_delay).await;
            }
            Err(e) => {
                error!(
                    "Could not connect to {} after {} attempts: {}",
                    config.path.display(),
                    attempt,
                    e
                );
                return Err(ServiceError::DatabaseError(e));
            }
        }
    }
}

/// Runs `PRAGMA quick_check` and fails unless SQLite reports `ok`.
pub async fn verify_integrity(pool: &DbPool) -> Result<(), ServiceError> {
    let row = pool
        .query_one(Statement::from_string(
            DbBackend::Sqlite,
            "PRAGMA quick_check".to_owned(),
        ))
        .await
        .map_err(|e| ServiceError::InvalidDatabase(e.to_string()))?;

    let verdict = match row {
        Some(row) => row
            .try_get_by_index::<String>(0)
            .map_err(|e| ServiceError::InvalidDatabase(e.to_string()))?,
        None => return Err(ServiceError::InvalidDatabase("quick_check returned nothing".into())),
    };

    if verdict != "ok" {
        error!("Integrity check failed: {}", verdict);
        return Err(ServiceError::InvalidDatabase(verdict));
    }
    Ok(())
}

/// Runs database migrations
///
/// Every migration checks the schema before changing it, so running this
/// against an up-to-date file changes nothing.
pub async fn run_migrations(pool: &DbPool) -> Result<(), ServiceError> {
    info!("Running database migrations");
    let start = std::time::Instant::now();

    let result = Migrator::up(pool, None).await.map_err(ServiceError::DatabaseError);

    let elapsed = start.elapsed();
    match &result {
        Ok(_) => info!("Database migrations completed successfully in {:?}", elapsed),
        Err(e) => error!("Database migrations failed after {:?}: {}", elapsed, e),
    }

    result
}

/// Names of the migrations recorded as applied
pub async fn applied_migrations(pool: &DbPool) -> Result<Vec<String>, ServiceError> {
    let statuses = Migrator::get_applied_migrations(pool).await?;
    Ok(statuses.iter().map(|m| m.name().to_string()).collect())
}

/// Validates, opens and migrates the database file. Nothing is written to
/// a file that fails validation.
pub async fn open_database(config: &DbConfig) -> Result<(DbPool, DatabaseFileState), ServiceError> {
    let state = inspect_database_file(&config.path)?;
    if state == DatabaseFileState::Missing && !config.create_if_missing {
        return Err(ServiceError::NotFound(format!(
            "database file {}",
            config.path.display()
        )));
    }

    let pool = establish_connection(config).await?;
    verify_integrity(&pool).await?;
    run_migrations(&pool).await?;

    Ok((pool, state))
}

/// Validates and opens an existing database file as it is, without running
/// migrations. Tools that only read, or that must snapshot the file before
/// anything changes it, start here.
pub async fn open_unmigrated(config: &DbConfig) -> Result<DbPool, ServiceError> {
    match inspect_database_file(&config.path)? {
        DatabaseFileState::Existing => {}
        DatabaseFileState::Missing => {
            return Err(ServiceError::NotFound(format!(
                "database file {}",
                config.path.display()
            )))
        }
        DatabaseFileState::Empty => {
            return Err(ServiceError::InvalidDatabase(format!(
                "{} holds no tables",
                config.path.display()
            )))
        }
    }

    let pool = establish_connection(config).await?;
    verify_integrity(&pool).await?;
    Ok(pool)
}

/// A row in `sqlite_master`, used to compare schemas.
#[derive(Debug, Clone, PartialEq, Eq, sea_orm::FromQueryResult)]
pub struct SchemaObject {
    pub kind: String,
    pub name: String,
    pub sql: Option<String>,
}

/// All tables, indexes and triggers, ordered by name.
pub async fn schema_snapshot<C: ConnectionTrait>(conn: &C) -> Result<Vec<SchemaObject>, DbErr> {
    use sea_orm::FromQueryResult;

    SchemaObject::find_by_statement(Statement::from_string(
        DbBackend::Sqlite,
        "SELECT type AS kind, name, sql FROM sqlite_master \
         WHERE name NOT LIKE 'sqlite_%' ORDER BY type, name"
            .to_owned(),
    ))
    .all(conn)
    .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn missing_file_is_reported_as_new() {
        let dir = tempfile::tempdir().unwrap();
        let state = inspect_database_file(&dir.path().join("absent.db")).unwrap();
        assert_eq!(state, DatabaseFileState::Missing);
        assert!(state.is_new());
    }

    #[test]
    fn empty_file_is_accepted() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.db");
        File::create(&path).unwrap();
        assert_eq!(inspect_database_file(&path).unwrap(), DatabaseFileState::Empty);
    }

    #[test]
    fn foreign_file_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notes.db");
        let mut file = File::create(&path).unwrap();
        writeln!(file, "Kunde;Adresse\nMax;Musterstraße 1").unwrap();

        let err = inspect_database_file(&path).unwrap_err();
        assert!(matches!(err, ServiceError::InvalidDatabase(_)));
    }

    #[test]
    fn directory_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let err = inspect_database_file(dir.path()).unwrap_err();
        assert!(matches!(err, ServiceError::InvalidDatabase(_)));
    }

    #[test]
    fn url_respects_create_flag() {
        let mut cfg = DbConfig::new("orders.db");
        assert_eq!(cfg.url(), "sqlite://orders.db?mode=rwc");
        cfg.create_if_missing = false;
        assert_eq!(cfg.url(), "sqlite://orders.db?mode=rw");
        cfg.read_only = true;
        assert_eq!(cfg.url(), "sqlite://orders.db?mode=ro");
    }

    #[tokio::test]
    async fn fresh_database_is_migrated() {
        let dir = tempfile::tempdir().unwrap();
        let config = DbConfig::new(dir.path().join("fresh.db"));

        let (pool, state) = open_database(&config).await.unwrap();
        assert_eq!(state, DatabaseFileState::Missing);

        let applied = applied_migrations(&pool).await.unwrap();
        assert_eq!(applied.len(), Migrator::migrations().len());
    }
}
