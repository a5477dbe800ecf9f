use crate::{
    db::DbPool,
    entities::stock_level::{self, Entity as StockLevelEntity},
    errors::ServiceError,
    services::products::find_product,
};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DbBackend, EntityTrait, FromQueryResult,
    QueryFilter, QueryOrder, Set, Statement, TransactionTrait, Value,
};
use serde::Serialize;
use std::sync::Arc;
use tracing::{info, instrument, warn};

/// Minimum level assumed for stock rows written without one
pub const DEFAULT_MINIMUM_QUANTITY: i32 = 5;

/// Factor applied to the minimum level to get the target stock of a reorder.
pub const REORDER_TARGET_FACTOR: i32 = 3;

/// A stock row at or below its minimum level.
#[derive(Debug, Clone, PartialEq, Eq, FromQueryResult, Serialize)]
pub struct LowStockRow {
    pub product_id: i32,
    pub product_name: String,
    pub on_hand: i32,
    pub minimum: i32,
    pub supplier_name: Option<String>,
    pub lead_time_days: Option<i32>,
}

impl LowStockRow {
    pub fn suggested_quantity(&self) -> i32 {
        reorder_quantity(self.minimum, self.on_hand)
    }
}

/// Quantity that brings `on_hand` up to `minimum × 3`.
pub fn reorder_quantity(minimum: i32, on_hand: i32) -> i32 {
    minimum
        .saturating_mul(REORDER_TARGET_FACTOR)
        .saturating_sub(on_hand)
        .max(0)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StockCorrection {
    pub product_id: i32,
    pub product_name: String,
    pub previous: i32,
    pub current: i32,
}

/// Service for stock levels
#[derive(Clone)]
pub struct InventoryService {
    db: Arc<DbPool>,
}

impl InventoryService {
    pub fn new(db: Arc<DbPool>) -> Self {
        Self { db }
    }

    /// Stock on hand for a product; 0 when it has no stock row
    #[instrument(skip(self))]
    pub async fn stock_on_hand(&self, product_id: i32) -> Result<i32, ServiceError> {
        stock_on_hand(&*self.db, product_id).await
    }

    /// Products whose stock row is at or below its minimum level, lowest
    /// stock first. Only the row with the lowest `LagerID` counts.
    #[instrument(skip(self))]
    pub async fn low_stock_report(&self) -> Result<Vec<LowStockRow>, ServiceError> {
        let rows = LowStockRow::find_by_statement(Statement::from_sql_and_values(
            DbBackend::Sqlite,
            "SELECT P.ProduktID AS product_id, P.Produktname AS product_name, \
             L.Menge AS on_hand, COALESCE(L.Mindestbestand, ?) AS minimum, \
             Li.Name AS supplier_name, Li.Lieferzeit AS lead_time_days \
             FROM Lagerbestand L \
             JOIN Produkte P ON L.ProduktID = P.ProduktID \
             LEFT JOIN Lieferanten Li ON L.LieferantID = Li.LieferantID \
             WHERE L.LagerID = (SELECT MIN(L2.LagerID) FROM Lagerbestand L2 WHERE L2.ProduktID = L.ProduktID) \
             AND L.Menge <= COALESCE(L.Mindestbestand, ?) \
             ORDER BY L.Menge ASC, P.ProduktID ASC",
            [Value::from(DEFAULT_MINIMUM_QUANTITY), Value::from(DEFAULT_MINIMUM_QUANTITY)],
        ))
        .all(&*self.db)
        .await?;

        if !rows.is_empty() {
            warn!("{} product(s) at or below minimum stock", rows.len());
        }
        Ok(rows)
    }

    /// Sets the product's stock to a physically counted quantity
    #[instrument(skip(self))]
    pub async fn correct_stock(
        &self,
        product_id: i32,
        counted: i32,
    ) -> Result<StockCorrection, ServiceError> {
        if counted < 0 {
            return Err(ServiceError::ValidationError(
                "stock cannot be negative".to_string(),
            ));
        }

        let txn = self.db.begin().await?;
        let product = find_product(&txn, product_id).await?;
        let row = primary_stock_row(&txn, product_id).await?.ok_or_else(|| {
            ServiceError::NotFound(format!("stock row for product {}", product_id))
        })?;

        let previous = row.quantity;
        let mut active: stock_level::ActiveModel = row.into();
        active.quantity = Set(counted);
        active.update(&txn).await?;
        txn.commit().await?;

        info!(
            "Stock of '{}' corrected: {} -> {}",
            product.name, previous, counted
        );
        Ok(StockCorrection {
            product_id,
            product_name: product.name,
            previous,
            current: counted,
        })
    }
}

/// The stock row that holds a product's quantity: the one with the lowest
/// `LagerID`.
pub(crate) async fn primary_stock_row<C: ConnectionTrait>(
    db: &C,
    product_id: i32,
) -> Result<Option<stock_level::Model>, ServiceError> {
    let row = StockLevelEntity::find()
        .filter(stock_level::Column::ProductId.eq(product_id))
        .order_by_asc(stock_level::Column::Id)
        .one(db)
        .await?;
    Ok(row)
}

pub(crate) async fn stock_on_hand<C: ConnectionTrait>(
    db: &C,
    product_id: i32,
) -> Result<i32, ServiceError> {
    Ok(primary_stock_row(db, product_id)
        .await?
        .map(|row| row.quantity)
        .unwrap_or(0))
}
