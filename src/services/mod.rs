//! Business operations behind the menu and the command-line tools.
//!
//! Every service owns a shared handle to the connection and can be used
//! without the menu.

pub mod customers;
pub mod inventory;
pub mod invoicing;
pub mod order_status;
pub mod orders;
pub mod prices;
pub mod products;
pub mod suppliers;

use crate::db::DbPool;
use std::sync::Arc;
use validator::ValidationError;

pub use customers::CustomerService;
pub use inventory::InventoryService;
pub use invoicing::InvoiceService;
pub use order_status::OrderStatusService;
pub use orders::OrderService;
pub use prices::PriceCleanupService;
pub use products::ProductService;
pub use suppliers::SupplierService;

/// All services over one connection.
#[derive(Clone)]
pub struct Services {
    pub customers: CustomerService,
    pub suppliers: SupplierService,
    pub products: ProductService,
    pub inventory: InventoryService,
    pub orders: OrderService,
    pub order_status: OrderStatusService,
    pub invoices: InvoiceService,
    pub prices: PriceCleanupService,
}

impl Services {
    pub fn new(db: Arc<DbPool>, default_vat_rate: f64) -> Self {
        Self {
            customers: CustomerService::new(db.clone()),
            suppliers: SupplierService::new(db.clone()),
            products: ProductService::new(db.clone()),
            inventory: InventoryService::new(db.clone()),
            orders: OrderService::new(db.clone(), default_vat_rate),
            order_status: OrderStatusService::new(db.clone()),
            invoices: InvoiceService::new(db.clone()),
            prices: PriceCleanupService::new(db),
        }
    }
}

pub(crate) fn validate_not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        let mut err = ValidationError::new("blank");
        err.message = Some("must not be empty".into());
        return Err(err);
    }
    Ok(())
}

/// Highest price a product may carry. Invoice totals over such prices stay
/// far inside the range of `Decimal`.
pub const MAX_PRICE: i64 = 1_000_000_000_000;

pub(crate) fn validate_percentage(rate: f64) -> Result<(), ValidationError> {
    if !rate.is_finite() || !(0.0..=100.0).contains(&rate) {
        let mut err = ValidationError::new("percentage");
        err.message = Some("must be between 0 and 100".into());
        return Err(err);
    }
    Ok(())
}

pub(crate) fn validate_price(price: f64) -> Result<(), ValidationError> {
    if !price.is_finite() || !(0.0..=MAX_PRICE as f64).contains(&price) {
        let mut err = ValidationError::new("price");
        err.message = Some(format!("must be between 0 and {}", MAX_PRICE).into());
        return Err(err);
    }
    Ok(())
}

/// `%term%` pattern for a substring search with `LIKE ... ESCAPE '\'`.
/// SQLite matches ASCII letters case-insensitively.
pub(crate) fn like_pattern(term: &str) -> String {
    let escaped = term
        .trim()
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{}%", escaped)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_strings_are_rejected() {
        assert!(validate_not_blank("  ").is_err());
        assert!(validate_not_blank("Anna").is_ok());
    }

    #[test]
    fn percentages_are_bounded() {
        assert!(validate_percentage(0.0).is_ok());
        assert!(validate_percentage(100.0).is_ok());
        assert!(validate_percentage(-0.5).is_err());
        assert!(validate_percentage(100.5).is_err());
        assert!(validate_percentage(f64::NAN).is_err());
    }

    #[test]
    fn prices_are_bounded() {
        assert!(validate_price(0.0).is_ok());
        assert!(validate_price(999.99).is_ok());
        assert!(validate_price(MAX_PRICE as f64).is_ok());
        assert!(validate_price(1e27).is_err());
        assert!(validate_price(-0.01).is_err());
        assert!(validate_price(f64::INFINITY).is_err());
    }

    #[test]
    fn like_wildcards_are_escaped() {
        assert_eq!(like_pattern(" Müll "), "%Müll%");
        assert_eq!(like_pattern("50%"), "%50\\%%");
        assert_eq!(like_pattern("a_b"), "%a\\_b%");
    }
}
