use crate::{
    backup::{BackupKind, BackupManager},
    db::{self, DbConfig, DbPool},
    entities::product,
    errors::ServiceError,
    services::MAX_PRICE,
};
use rust_decimal::prelude::*;
use sea_orm::{
    sea_query::Expr, ColumnTrait, DbBackend, EntityTrait, FromQueryResult, QueryFilter, Statement,
    TransactionTrait,
};
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, instrument, warn};

/// Parses a price written by hand, e.g. `"179,00"`, `"€ 12.34"`,
/// `"12 345,67"` or `"1.234,56 €"`.
///
/// The last `.` or `,` is the decimal separator; earlier separators, spaces
/// and currency symbols are dropped. A minus sign is only accepted in front.
/// Returns `None` when no number remains.
pub fn parse_price(raw: &str) -> Option<Decimal> {
    let kept: String = raw
        .trim()
        .chars()
        .filter(|c| c.is_ascii_digit() || matches!(c, '.' | ',' | '-'))
        .collect();

    let (negative, body) = match kept.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, kept.as_str()),
    };
    if body.contains('-') || !body.chars().any(|c| c.is_ascii_digit()) {
        return None;
    }

    let digits = |s: &str| -> String { s.chars().filter(char::is_ascii_digit).collect() };
    let normalized = match body.rfind(['.', ',']) {
        Some(pos) => {
            let int_part = digits(&body[..pos]);
            let frac_part = digits(&body[pos + 1..]);
            format!(
                "{}.{}",
                if int_part.is_empty() { "0" } else { int_part.as_str() },
                if frac_part.is_empty() { "0" } else { frac_part.as_str() }
            )
        }
        None => digits(body),
    };

    let value = normalized.parse::<Decimal>().ok()?;
    Some(if negative { -value } else { value })
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PriceFix {
    pub product_id: i32,
    pub product_name: String,
    pub original: String,
    pub cleaned: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SkippedPrice {
    pub product_id: i32,
    pub product_name: String,
    pub original: String,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CleanupReport {
    pub dry_run: bool,
    pub changes: Vec<PriceFix>,
    pub skipped: Vec<SkippedPrice>,
    /// Snapshot taken before writing
    pub backup: Option<PathBuf>,
    /// Rows rewritten; 0 on a dry run
    pub applied: usize,
}

#[derive(Debug, FromQueryResult)]
struct TextPriceRow {
    id: i32,
    name: String,
    raw: String,
}

/// Rewrites product prices stored as text into numbers.
#[derive(Clone)]
pub struct PriceCleanupService {
    db: Arc<DbPool>,
}

impl PriceCleanupService {
    pub fn new(db: Arc<DbPool>) -> Self {
        Self { db }
    }

    /// Classifies every text price without writing anything
    #[instrument(skip(self))]
    pub async fn scan(&self) -> Result<(Vec<PriceFix>, Vec<SkippedPrice>), ServiceError> {
        let rows = TextPriceRow::find_by_statement(Statement::from_string(
            DbBackend::Sqlite,
            "SELECT ProduktID AS id, Produktname AS name, CAST(Preis AS TEXT) AS raw \
             FROM Produkte WHERE typeof(Preis) = 'text' ORDER BY ProduktID"
                .to_owned(),
        ))
        .all(&*self.db)
        .await?;

        let mut changes = Vec::new();
        let mut skipped = Vec::new();
        for row in rows {
            let reason = match parse_price(&row.raw) {
                Some(value) if value.is_sign_negative() && !value.is_zero() => {
                    Some("negative price".to_string())
                }
                Some(value) if value > Decimal::from(MAX_PRICE) => {
                    Some("out of range".to_string())
                }
                Some(value) => match value.to_f64() {
                    Some(cleaned) => {
                        changes.push(PriceFix {
                            product_id: row.id,
                            product_name: row.name.clone(),
                            original: row.raw.clone(),
                            cleaned,
                        });
                        None
                    }
                    None => Some("out of range".to_string()),
                },
                None => Some("not a number".to_string()),
            };
            if let Some(reason) = reason {
                warn!(
                    "Price of product {} ('{}') left unchanged: '{}' is {}",
                    row.id, row.name, row.raw, reason
                );
                skipped.push(SkippedPrice {
                    product_id: row.id,
                    product_name: row.name,
                    original: row.raw,
                    reason,
                });
            }
        }
        Ok((changes, skipped))
    }

    /// Scans and, unless `dry_run`, snapshots the database and writes all
    /// fixes in one transaction
    #[instrument(skip(self, backups))]
    pub async fn clean_prices(
        &self,
        dry_run: bool,
        backups: &BackupManager,
    ) -> Result<CleanupReport, ServiceError> {
        let (changes, skipped) = self.scan().await?;

        if dry_run || changes.is_empty() {
            return Ok(unchanged_report(dry_run, changes, skipped));
        }

        let backup = backups.create_backup(&self.db, BackupKind::PreCleanup).await?;
        self.write_fixes(changes, skipped, backup.path).await
    }

    async fn write_fixes(
        &self,
        changes: Vec<PriceFix>,
        skipped: Vec<SkippedPrice>,
        backup: PathBuf,
    ) -> Result<CleanupReport, ServiceError> {
        let txn = self.db.begin().await?;
        let mut applied = 0;
        for fix in &changes {
            let result = product::Entity::update_many()
                .col_expr(product::Column::Price, Expr::value(fix.cleaned))
                .filter(product::Column::Id.eq(fix.product_id))
                .exec(&txn)
                .await?;
            applied += result.rows_affected as usize;
        }
        txn.commit().await?;

        info!(
            "Price cleanup applied to {} product(s), {} skipped, backup {}",
            applied,
            skipped.len(),
            backup.display()
        );
        Ok(CleanupReport {
            dry_run: false,
            changes,
            skipped,
            backup: Some(backup),
            applied,
        })
    }
}

fn unchanged_report(
    dry_run: bool,
    changes: Vec<PriceFix>,
    skipped: Vec<SkippedPrice>,
) -> CleanupReport {
    info!(
        "Price cleanup (dry run: {}): {} fixable, {} skipped",
        dry_run,
        changes.len(),
        skipped.len()
    );
    CleanupReport {
        dry_run,
        changes,
        skipped,
        backup: None,
        applied: 0,
    }
}

/// Cleans the prices of the database file behind `config` without migrating
/// it. A dry run opens the file read-only. Otherwise the snapshot is taken
/// before the first write, so it holds the file exactly as it was found.
#[instrument(skip(config, backups), fields(path = %config.path.display()))]
pub async fn clean_database_file(
    config: &DbConfig,
    dry_run: bool,
    backups: &BackupManager,
) -> Result<CleanupReport, ServiceError> {
    let config = DbConfig {
        create_if_missing: false,
        read_only: dry_run,
        ..config.clone()
    };
    let pool = db::open_unmigrated(&config).await?;
    let report = PriceCleanupService::new(Arc::new(pool.clone()))
        .clean_prices(dry_run, backups)
        .await;
    if let Err(e) = pool.close().await {
        warn!("Closing {} after price cleanup failed: {}", config.path.display(), e);
    }
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn common_formats_are_normalized() {
        assert_eq!(parse_price("179,00"), Some(dec!(179.00)));
        assert_eq!(parse_price("€ 12.34"), Some(dec!(12.34)));
        assert_eq!(parse_price("12 345,67"), Some(dec!(12345.67)));
        assert_eq!(parse_price("1.234,56 €"), Some(dec!(1234.56)));
        assert_eq!(parse_price("1,234.56"), Some(dec!(1234.56)));
        assert_eq!(parse_price("42"), Some(dec!(42)));
        assert_eq!(parse_price(",5"), Some(dec!(0.5)));
    }

    #[test]
    fn garbage_is_not_coerced_to_zero() {
        assert_eq!(parse_price(""), None);
        assert_eq!(parse_price("auf Anfrage"), None);
        assert_eq!(parse_price("€"), None);
        assert_eq!(parse_price("12-34"), None);
    }

    #[test]
    fn huge_values_parse_but_exceed_the_price_bound() {
        let value = parse_price("99.999.999.999.999,00").unwrap();
        assert!(value > Decimal::from(MAX_PRICE));
    }

    #[test]
    fn negative_values_parse_as_negative() {
        assert_eq!(parse_price("-5,00"), Some(dec!(-5.00)));
    }
}
