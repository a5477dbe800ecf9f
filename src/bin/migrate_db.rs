use std::path::PathBuf;

use anyhow::{Context, Result};
use bestellverwaltung::{
    config,
    db::{self, DatabaseFileState, DbConfig},
};
use clap::{ArgAction, Parser};
use tracing::info;

/// Brings an existing database file up to the current schema. Missing
/// columns and triggers are added; existing rows are kept.
#[derive(Parser)]
#[command(name = "migrate-db", about = "Repair and migrate a Bestellverwaltung database", version)]
struct Cli {
    #[arg(long, help = "Database file to migrate instead of the configured one")]
    database: Option<PathBuf>,
    #[arg(
        long,
        action = ArgAction::SetTrue,
        help = "Print the resulting tables, indexes and triggers"
    )]
    schema: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let (cfg, notices) = config::load_config().context("failed to load application config")?;
    let cfg = cfg.with_database_path(cli.database);
    config::init_tracing(cfg.log_level(), cfg.log_file(), cfg.log_stderr);
    config::log_notices(&notices);

    let mut db_config = DbConfig::from(&cfg);
    db_config.create_if_missing = false;

    let (pool, state) = db::open_database(&db_config)
        .await
        .with_context(|| format!("migration of {} aborted", cfg.database_path))?;
    if state == DatabaseFileState::Empty {
        println!("{} was empty; base tables created.", cfg.database_path);
    }

    let applied = db::applied_migrations(&pool)
        .await
        .context("failed to read migration history")?;
    println!("Database {} is up to date.", cfg.database_path);
    println!("Applied migrations:");
    for name in &applied {
        println!("  - {}", name);
    }

    if cli.schema {
        let objects = db::schema_snapshot(&pool)
            .await
            .context("failed to read schema")?;
        for object in objects {
            println!("\n-- {} {}", object.kind, object.name);
            if let Some(sql) = object.sql {
                println!("{};", sql);
            }
        }
    }

    info!("migrate-db finished for {}", cfg.database_path);
    Ok(())
}
