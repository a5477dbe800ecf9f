use crate::{
    db::DbPool,
    entities::{customer, order},
    errors::ServiceError,
    services::{customers::find_customer, orders::find_order},
};
use rust_decimal::prelude::*;
use sea_orm::{ConnectionTrait, DbBackend, FromQueryResult, Statement, Value};
use serde::Serialize;
use std::sync::Arc;
use tracing::{info, instrument};

const HUNDRED: Decimal = Decimal::ONE_HUNDRED;

/// Rounds a monetary amount to cents, halves away from zero.
pub fn round_money(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Converts a stored REAL into a decimal using its shortest representation,
/// so `149.99` stays `149.99`.
pub fn decimal_from_f64(value: f64) -> Result<Decimal, ServiceError> {
    Decimal::from_f64(value)
        .map(|d| d.normalize())
        .ok_or_else(|| ServiceError::ValidationError(format!("{} is not a finite amount", value)))
}

/// Amounts of an invoice. Every field is rounded to cents; they are derived
/// from the exact intermediate values, so `net + vat_amount` may differ from
/// `total` by a cent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct InvoiceTotals {
    pub subtotal: Decimal,
    pub discount_amount: Decimal,
    pub net: Decimal,
    pub vat_amount: Decimal,
    pub total: Decimal,
}

fn amount_overflow(what: &str) -> ServiceError {
    ServiceError::ValidationError(format!("{} exceeds the supported amount range", what))
}

/// `quantity × unit price`, unrounded.
pub fn line_amount(quantity: i32, unit_price: Decimal) -> Result<Decimal, ServiceError> {
    Decimal::from(quantity)
        .checked_mul(unit_price)
        .ok_or_else(|| amount_overflow("line total"))
}

/// Computes `Σ(quantity × unit price) × (1 − discount) × (1 + VAT)` for
/// `(quantity, unit price)` pairs and percentages. Fails instead of
/// overflowing when the amounts leave the range of `Decimal`.
pub fn compute_invoice(
    lines: &[(i32, Decimal)],
    discount_percent: Decimal,
    vat_rate_percent: Decimal,
) -> Result<InvoiceTotals, ServiceError> {
    let mut subtotal = Decimal::ZERO;
    for (quantity, unit_price) in lines {
        subtotal = subtotal
            .checked_add(line_amount(*quantity, *unit_price)?)
            .ok_or_else(|| amount_overflow("subtotal"))?;
    }

    let discount = subtotal
        .checked_mul(discount_percent)
        .ok_or_else(|| amount_overflow("discount"))?
        / HUNDRED;
    let net = subtotal
        .checked_sub(discount)
        .ok_or_else(|| amount_overflow("net amount"))?;
    let vat = net
        .checked_mul(vat_rate_percent)
        .ok_or_else(|| amount_overflow("VAT"))?
        / HUNDRED;
    let total = net
        .checked_add(vat)
        .ok_or_else(|| amount_overflow("total"))?;

    Ok(InvoiceTotals {
        subtotal: round_money(subtotal),
        discount_amount: round_money(discount),
        net: round_money(net),
        vat_amount: round_money(vat),
        total: round_money(total),
    })
}

/// An invoice line as stored. `unit_price` is the snapshot taken when the
/// line was added, or the product's current numeric price for older lines.
#[derive(Debug, Clone, PartialEq, FromQueryResult)]
pub struct StoredLine {
    pub line_id: i32,
    pub product_id: i32,
    pub product_name: String,
    pub quantity: i32,
    pub unit_price: Option<f64>,
}

pub(crate) async fn stored_lines<C: ConnectionTrait>(
    db: &C,
    order_id: i32,
) -> Result<Vec<StoredLine>, ServiceError> {
    let lines = StoredLine::find_by_statement(Statement::from_sql_and_values(
        DbBackend::Sqlite,
        "SELECT BP.PositionID AS line_id, BP.ProduktID AS product_id, \
         P.Produktname AS product_name, BP.Menge AS quantity, \
         COALESCE(BP.Einzelpreis, CASE WHEN typeof(P.Preis) IN ('real', 'integer') THEN CAST(P.Preis AS REAL) END) AS unit_price \
         FROM Bestellpositionen BP \
         JOIN Produkte P ON BP.ProduktID = P.ProduktID \
         WHERE BP.BestellID = ? \
         ORDER BY BP.PositionID",
        [Value::from(order_id)],
    ))
    .all(db)
    .await?;
    Ok(lines)
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InvoiceLine {
    pub line_id: i32,
    pub product_name: String,
    pub quantity: i32,
    pub unit_price: Decimal,
    pub line_total: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Invoice {
    pub order: order::Model,
    pub customer: customer::Model,
    pub lines: Vec<InvoiceLine>,
    pub discount_percent: Decimal,
    pub vat_rate_percent: Decimal,
    pub totals: InvoiceTotals,
}

/// Builds the invoice of an order from its stored state.
pub(crate) async fn build_invoice<C: ConnectionTrait>(
    db: &C,
    order_id: i32,
) -> Result<Invoice, ServiceError> {
    let order = find_order(db, order_id).await?;
    let customer = find_customer(db, order.customer_id).await?;

    let mut lines = Vec::new();
    for stored in stored_lines(db, order_id).await? {
        let price = stored.unit_price.ok_or_else(|| {
            ServiceError::ValidationError(format!(
                "line {} ('{}') has no numeric price; run the price cleanup first",
                stored.line_id, stored.product_name
            ))
        })?;
        let unit_price = decimal_from_f64(price)?;
        lines.push(InvoiceLine {
            line_id: stored.line_id,
            product_name: stored.product_name,
            quantity: stored.quantity,
            line_total: round_money(line_amount(stored.quantity, unit_price)?),
            unit_price,
        });
    }

    let discount_percent = decimal_from_f64(order.discount_percent)?;
    let vat_rate_percent = decimal_from_f64(order.vat_rate_percent)?;
    let pairs: Vec<(i32, Decimal)> = lines.iter().map(|l| (l.quantity, l.unit_price)).collect();
    let totals = compute_invoice(&pairs, discount_percent, vat_rate_percent)?;

    Ok(Invoice {
        order,
        customer,
        lines,
        discount_percent,
        vat_rate_percent,
        totals,
    })
}

/// Service for invoices. Nothing is cached; every call reads the order.
#[derive(Clone)]
pub struct InvoiceService {
    db: Arc<DbPool>,
}

impl InvoiceService {
    pub fn new(db: Arc<DbPool>) -> Self {
        Self { db }
    }

    /// Builds the invoice for an order
    #[instrument(skip(self))]
    pub async fn invoice_for_order(&self, order_id: i32) -> Result<Invoice, ServiceError> {
        let invoice = build_invoice(&*self.db, order_id).await?;
        info!(
            "Invoice shown for order {}: total {}",
            order_id, invoice.totals.total
        );
        Ok(invoice)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn discount_and_vat_are_applied_in_order() {
        let totals = compute_invoice(&[(3, dec!(10.00))], dec!(10), dec!(19)).unwrap();
        assert_eq!(totals.subtotal, dec!(30.00));
        assert_eq!(totals.discount_amount, dec!(3.00));
        assert_eq!(totals.net, dec!(27.00));
        assert_eq!(totals.vat_amount, dec!(5.13));
        assert_eq!(totals.total, dec!(32.13));
    }

    #[test]
    fn zero_discount_and_vat_return_the_subtotal() {
        let totals = compute_invoice(&[(2, dec!(149.99)), (1, dec!(999.99))], dec!(0), dec!(0)).unwrap();
        assert_eq!(totals.subtotal, dec!(1299.97));
        assert_eq!(totals.total, dec!(1299.97));
        assert_eq!(totals.vat_amount, Decimal::ZERO);
    }

    #[test]
    fn empty_invoice_is_zero() {
        let totals = compute_invoice(&[], dec!(10), dec!(19)).unwrap();
        assert_eq!(totals.total, Decimal::ZERO);
    }

    #[test]
    fn amounts_beyond_decimal_range_are_rejected() {
        let huge = Decimal::from_f64(1e27).unwrap();
        let result = compute_invoice(&[(100, huge)], dec!(0), dec!(19));
        assert!(matches!(result, Err(ServiceError::ValidationError(msg)) if msg.contains("line total")));

        let result = compute_invoice(&[(1, Decimal::MAX), (1, Decimal::MAX)], dec!(0), dec!(0));
        assert!(matches!(result, Err(ServiceError::ValidationError(msg)) if msg.contains("subtotal")));
    }

    #[test]
    fn largest_allowed_price_is_invoiced() {
        let price = Decimal::from(crate::services::MAX_PRICE);
        let totals = compute_invoice(&[(i32::MAX, price)], dec!(0), dec!(100)).unwrap();
        assert_eq!(totals.total, Decimal::from(i32::MAX) * price * dec!(2));
    }

    #[test]
    fn halves_round_away_from_zero() {
        assert_eq!(round_money(dec!(0.125)), dec!(0.13));
        assert_eq!(round_money(dec!(-0.125)), dec!(-0.13));
        assert_eq!(round_money(dec!(2.344)), dec!(2.34));
    }

    #[test]
    fn stored_reals_keep_their_cents() {
        assert_eq!(decimal_from_f64(149.99).unwrap(), dec!(149.99));
        assert_eq!(decimal_from_f64(19.0).unwrap(), dec!(19));
        assert!(decimal_from_f64(f64::NAN).is_err());
    }
}
