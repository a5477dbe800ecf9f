use std::{io, path::PathBuf, sync::Arc};

use anyhow::Context;
use clap::Parser;
use tracing::{error, info};

use bestellverwaltung as app;
use app::{
    backup::BackupManager,
    console::Console,
    db::{self, DbConfig},
    menu::Menu,
    services::Services,
};

#[derive(Parser)]
#[command(name = "bestellverwaltung", about = "Interactive order management", version)]
struct Cli {
    #[arg(long, help = "Database file to open instead of the configured one")]
    database: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let (cfg, notices) = app::config::load_config().context("failed to load configuration")?;
    let cfg = cfg.with_database_path(cli.database);
    app::config::init_tracing(cfg.log_level(), cfg.log_file(), cfg.log_stderr);
    app::config::log_notices(&notices);

    info!("Starting bestellverwaltung on {}", cfg.database_path);
    let (pool, state) = db::open_database(&DbConfig::from(&cfg))
        .await
        .map_err(|e| {
            error!("Cannot open database {}: {}", cfg.database_path, e);
            e
        })
        .with_context(|| format!("cannot open database {}", cfg.database_path))?;

    if state.is_new() && cfg.seed_sample_data && db::seed::seed_sample_data(&pool).await? {
        info!("Sample data inserted into new database");
    }

    let db = Arc::new(pool);
    let services = Services::new(db.clone(), cfg.default_vat_rate);
    let console = Console::new(io::stdin().lock(), io::stdout());
    let mut menu = Menu::new(console, services, db, BackupManager::new(cfg.backup_dir()));

    menu.run().await.context("menu aborted")?;
    info!("Bestellverwaltung finished");
    Ok(())
}
