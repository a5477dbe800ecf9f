use crate::{
    db::DbPool,
    entities::{product, stock_level},
    errors::ServiceError,
    services::{like_pattern, suppliers::find_supplier, validate_not_blank, validate_price},
};
use sea_orm::{
    ActiveModelTrait, ConnectionTrait, DbBackend, FromQueryResult, Set, Statement,
    TransactionTrait, Value,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument};
use validator::Validate;

/// Projection used by every product read. `Preis` is only decoded when
/// SQLite holds it as a number, so rows with legacy text prices are still
/// listed.
const OVERVIEW_SELECT: &str = "SELECT P.ProduktID AS id, P.Produktname AS name, \
    CASE WHEN typeof(P.Preis) IN ('real', 'integer') THEN CAST(P.Preis AS REAL) END AS price, \
    CAST(P.Preis AS TEXT) AS stored_price, \
    COALESCE((SELECT L.Menge FROM Lagerbestand L WHERE L.ProduktID = P.ProduktID ORDER BY L.LagerID LIMIT 1), 0) AS stock \
    FROM Produkte P";

#[derive(Debug, Clone, PartialEq, FromQueryResult, Serialize)]
pub struct ProductOverview {
    pub id: i32,
    pub name: String,
    /// `None` when the stored price is not numeric
    pub price: Option<f64>,
    pub stored_price: Option<String>,
    /// Quantity of the product's stock row; 0 without one
    pub stock: i32,
}

impl ProductOverview {
    /// Current price, or a validation error naming the price cleanup.
    pub fn numeric_price(&self) -> Result<f64, ServiceError> {
        self.price.ok_or_else(|| {
            ServiceError::ValidationError(format!(
                "price of product {} ('{}') is not numeric: '{}'; run the price cleanup first",
                self.id,
                self.name,
                self.stored_price.as_deref().unwrap_or_default()
            ))
        })
    }

    pub fn price_label(&self) -> String {
        match self.price {
            Some(price) => format!("{:.2}", price),
            None => format!("{} (?)", self.stored_price.as_deref().unwrap_or_default()),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct InitialStock {
    #[validate(range(min = 0))]
    pub quantity: i32,
    #[validate(range(min = 0))]
    pub minimum_quantity: i32,
    pub supplier_id: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct NewProduct {
    #[validate(custom = "validate_not_blank")]
    pub name: String,
    #[validate(custom = "validate_price")]
    pub price: f64,
    pub initial_stock: Option<InitialStock>,
}

/// Service for managing products
#[derive(Clone)]
pub struct ProductService {
    db: Arc<DbPool>,
}

impl ProductService {
    pub fn new(db: Arc<DbPool>) -> Self {
        Self { db }
    }

    /// Creates a product and, optionally, its stock row in one transaction
    #[instrument(skip(self))]
    pub async fn create_product(&self, input: NewProduct) -> Result<ProductOverview, ServiceError> {
        input.validate()?;
        if let Some(stock) = &input.initial_stock {
            stock.validate()?;
        }

        let txn = self.db.begin().await?;

        let product = product::ActiveModel {
            name: Set(input.name.trim().to_owned()),
            price: Set(input.price),
            ..Default::default()
        }
        .insert(&txn)
        .await?;

        if let Some(stock) = &input.initial_stock {
            let supplier = find_supplier(&txn, stock.supplier_id).await?;
            stock_level::ActiveModel {
                product_id: Set(product.id),
                quantity: Set(stock.quantity),
                supplier_id: Set(supplier.id),
                minimum_quantity: Set(Some(stock.minimum_quantity)),
                ..Default::default()
            }
            .insert(&txn)
            .await?;
        }

        let overview = find_product(&txn, product.id).await?;
        txn.commit().await?;

        info!(
            "Product created: {} (ID {}, price {:.2}, stock {})",
            overview.name, overview.id, input.price, overview.stock
        );
        Ok(overview)
    }

    /// Gets a product with its stock by ID
    #[instrument(skip(self))]
    pub async fn get_product(&self, product_id: i32) -> Result<ProductOverview, ServiceError> {
        find_product(&*self.db, product_id).await
    }

    /// Lists all products with their stock
    #[instrument(skip(self))]
    pub async fn list_products(&self) -> Result<Vec<ProductOverview>, ServiceError> {
        let products = ProductOverview::find_by_statement(Statement::from_string(
            DbBackend::Sqlite,
            format!("{} ORDER BY P.ProduktID", OVERVIEW_SELECT),
        ))
        .all(&*self.db)
        .await?;
        Ok(products)
    }

    /// Finds products whose name contains `term`
    #[instrument(skip(self))]
    pub async fn search_products(&self, term: &str) -> Result<Vec<ProductOverview>, ServiceError> {
        if term.trim().is_empty() {
            return Err(ServiceError::ValidationError(
                "search term must not be empty".to_string(),
            ));
        }

        let products = ProductOverview::find_by_statement(Statement::from_sql_and_values(
            DbBackend::Sqlite,
            format!(
                "{} WHERE P.Produktname LIKE ? ESCAPE '\\' ORDER BY P.Produktname",
                OVERVIEW_SELECT
            ),
            [Value::from(like_pattern(term))],
        ))
        .all(&*self.db)
        .await?;
        Ok(products)
    }
}

pub(crate) async fn find_product<C: ConnectionTrait>(
    db: &C,
    product_id: i32,
) -> Result<ProductOverview, ServiceError> {
    ProductOverview::find_by_statement(Statement::from_sql_and_values(
        DbBackend::Sqlite,
        format!("{} WHERE P.ProduktID = ?", OVERVIEW_SELECT),
        [Value::from(product_id)],
    ))
    .one(db)
    .await?
    .ok_or_else(|| ServiceError::NotFound(format!("product {}", product_id)))
}
