//! SeaORM entities for the order-management tables.
//!
//! Table and column names follow the existing database files, so the Rust
//! field names are mapped explicitly with `column_name`.

pub mod customer;
pub mod order;
pub mod order_item;
pub mod product;
pub mod stock_level;
pub mod supplier;

pub use order::OrderStatus;
