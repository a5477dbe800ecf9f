//! Property-based tests for stock bookkeeping and invoice arithmetic.

mod common;

use bestellverwaltung::services::invoicing::{compute_invoice, round_money};
use common::{TestDb, HEADPHONES, LAPTOP, SMARTPHONE};
use proptest::prelude::*;
use rust_decimal::Decimal;

#[derive(Debug, Clone)]
enum LineOp {
    Add { product_id: i32, quantity: i32 },
    Change { line: usize, quantity: i32 },
    Remove { line: usize },
}

fn line_op_strategy() -> impl Strategy<Value = LineOp> {
    prop_oneof![
        (prop_oneof![Just(LAPTOP), Just(SMARTPHONE), Just(HEADPHONES)], 1i32..25)
            .prop_map(|(product_id, quantity)| LineOp::Add { product_id, quantity }),
        (0usize..8, -2i32..25).prop_map(|(line, quantity)| LineOp::Change { line, quantity }),
        (0usize..8).prop_map(|line| LineOp::Remove { line }),
    ]
}

/// Applies `ops` to the sample order through the services, ignoring
/// rejected operations, and returns the lowest stock seen after each step
/// together with the final books.
async fn run_ops(ops: Vec<LineOp>) -> (i64, Vec<(i32, i32, i64)>) {
    let test_db = TestDb::seeded().await;
    let orders = &test_db.services.orders;
    let mut lowest = i64::MAX;

    for op in ops {
        let lines = orders.order_lines(1).await.unwrap();
        let _ = match op {
            LineOp::Add {
                product_id,
                quantity,
            } => orders.add_line(1, product_id, quantity).await.map(|_| ()),
            LineOp::Change { line, quantity } => match lines.get(line) {
                Some(l) => orders
                    .change_line_quantity(l.line_id, quantity)
                    .await
                    .map(|_| ()),
                None => Ok(()),
            },
            LineOp::Remove { line } => match lines.get(line) {
                Some(l) => orders.remove_line(l.line_id).await.map(|_| ()),
                None => Ok(()),
            },
        };
        lowest = lowest.min(test_db.min_stock().await);
    }

    let lines = orders.order_lines(1).await.unwrap();
    let mut books = Vec::new();
    for product_id in [LAPTOP, SMARTPHONE, HEADPHONES] {
        let ordered: i64 = lines
            .iter()
            .filter(|l| l.product_id == product_id)
            .map(|l| l.quantity as i64)
            .sum();
        books.push((product_id, test_db.stock_of(product_id).await, ordered));
    }
    (lowest, books)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    #[test]
    fn stock_never_goes_negative(ops in prop::collection::vec(line_op_strategy(), 1..20)) {
        let runtime = tokio::runtime::Runtime::new().unwrap();
        let (lowest, books) = runtime.block_on(run_ops(ops));

        prop_assert!(lowest >= 0, "stock dropped to {}", lowest);
        // Seeded stock before the sample order: laptop 10, smartphone 15, headphones 20.
        for (product_id, stock, ordered) in books {
            let initial = match product_id {
                LAPTOP => 10,
                SMARTPHONE => 15,
                _ => 20,
            };
            prop_assert_eq!(stock as i64 + ordered, initial);
        }
    }
}

fn cents() -> impl Strategy<Value = Decimal> {
    (0i64..500_000).prop_map(|c| Decimal::new(c, 2))
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(500))]

    #[test]
    fn invoice_total_follows_the_formula(
        lines in prop::collection::vec((1i32..50, cents()), 0..8),
        discount in 0u32..=100,
        vat in 0u32..=30,
    ) {
        let discount = Decimal::from(discount);
        let vat = Decimal::from(vat);
        let totals = compute_invoice(&lines, discount, vat).unwrap();

        let subtotal: Decimal = lines.iter().map(|(q, p)| Decimal::from(*q) * *p).sum();
        let hundred = Decimal::ONE_HUNDRED;
        let expected = subtotal * (hundred - discount) / hundred * (hundred + vat) / hundred;

        prop_assert_eq!(totals.subtotal, round_money(subtotal));
        prop_assert_eq!(totals.total, round_money(expected));
        prop_assert!(totals.total >= Decimal::ZERO);
        if discount == hundred {
            prop_assert_eq!(totals.total, Decimal::ZERO);
        }
    }
}
