//! Bestellverwaltung
//!
//! Order management over a local SQLite database: customers, suppliers,
//! products with stock levels, orders with line items, invoicing, price
//! cleanup and backups.
#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]
#![allow(elided_lifetimes_in_paths)]
#![warn(clippy::all, clippy::perf, clippy::dbg_macro)]

pub mod backup;
pub mod config;
pub mod console;
pub mod db;
pub mod entities;
pub mod errors;
pub mod menu;
pub mod migrator;
pub mod services;

pub use errors::ServiceError;
