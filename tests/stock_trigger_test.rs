mod common;

use assert_matches::assert_matches;
use bestellverwaltung::{
    errors::ServiceError,
    services::orders::{LineChange, NewOrder, NewOrderLine},
};
use common::{TestDb, HEADPHONES, HEADPHONES_STOCK, LAPTOP, LAPTOP_STOCK, SMARTPHONE, SMARTPHONE_STOCK};
use sea_orm::ConnectionTrait;

fn order_for(customer_id: i32, lines: &[(i32, i32)]) -> NewOrder {
    NewOrder {
        customer_id,
        lines: lines
            .iter()
            .map(|&(product_id, quantity)| NewOrderLine {
                product_id,
                quantity,
            })
            .collect(),
        discount_percent: 0.0,
        vat_rate_percent: None,
    }
}

#[tokio::test]
async fn order_deducts_stock_per_line() {
    let test_db = TestDb::seeded().await;
    let created = test_db
        .services
        .orders
        .create_order(order_for(2, &[(SMARTPHONE, 4), (LAPTOP, 2)]))
        .await
        .unwrap();

    assert_eq!(created.lines.len(), 2);
    assert_eq!(created.order.vat_rate_percent, 19.0);
    assert_eq!(test_db.stock_of(SMARTPHONE).await, SMARTPHONE_STOCK - 4);
    assert_eq!(test_db.stock_of(LAPTOP).await, LAPTOP_STOCK - 2);
}

#[tokio::test]
async fn order_beyond_stock_is_rejected_as_a_whole() {
    let test_db = TestDb::seeded().await;
    let orders_before = test_db.count("Bestellungen").await;

    let result = test_db
        .services
        .orders
        .create_order(order_for(2, &[(SMARTPHONE, 1), (LAPTOP, LAPTOP_STOCK + 1)]))
        .await;

    assert_matches!(result, Err(ServiceError::InsufficientStock(_)));
    assert_eq!(test_db.count("Bestellungen").await, orders_before);
    assert_eq!(test_db.stock_of(SMARTPHONE).await, SMARTPHONE_STOCK);
    assert_eq!(test_db.stock_of(LAPTOP).await, LAPTOP_STOCK);
}

#[tokio::test]
async fn trigger_rejects_writes_that_bypass_the_services() {
    let test_db = TestDb::seeded().await;

    let err = test_db
        .db
        .execute_unprepared("INSERT INTO Bestellpositionen (BestellID, ProduktID, Menge) VALUES (1, 1, 500)")
        .await
        .unwrap_err();
    assert_matches!(
        ServiceError::from_line_item_write(err, "Laptop"),
        ServiceError::InsufficientStock(_)
    );

    let err = test_db
        .db
        .execute_unprepared("INSERT INTO Bestellpositionen (BestellID, ProduktID, Menge) VALUES (1, 1, 0)")
        .await
        .unwrap_err();
    assert_matches!(
        ServiceError::from_line_item_write(err, "Laptop"),
        ServiceError::ValidationError(_)
    );

    let err = test_db
        .db
        .execute_unprepared("UPDATE Bestellpositionen SET Menge = 1000 WHERE PositionID = 1")
        .await
        .unwrap_err();
    assert_matches!(
        ServiceError::from_line_item_write(err, "Laptop"),
        ServiceError::InsufficientStock(_)
    );

    assert_eq!(test_db.stock_of(LAPTOP).await, LAPTOP_STOCK);
    assert!(test_db.min_stock().await >= 0);
}

#[tokio::test]
async fn quantity_changes_adjust_stock_by_the_difference() {
    let test_db = TestDb::seeded().await;
    let lines = test_db.services.orders.order_lines(1).await.unwrap();
    let headphones = lines.iter().find(|l| l.product_id == HEADPHONES).unwrap();
    assert_eq!(headphones.quantity, 2);

    let change = test_db
        .services
        .orders
        .change_line_quantity(headphones.line_id, 5)
        .await
        .unwrap();
    assert_matches!(change, LineChange::Updated { previous: 2, .. });
    assert_eq!(test_db.stock_of(HEADPHONES).await, HEADPHONES_STOCK - 3);

    test_db
        .services
        .orders
        .change_line_quantity(headphones.line_id, 1)
        .await
        .unwrap();
    assert_eq!(test_db.stock_of(HEADPHONES).await, HEADPHONES_STOCK + 1);

    let result = test_db
        .services
        .orders
        .change_line_quantity(headphones.line_id, HEADPHONES_STOCK + 3)
        .await;
    assert_matches!(result, Err(ServiceError::InsufficientStock(_)));
    assert_eq!(test_db.stock_of(HEADPHONES).await, HEADPHONES_STOCK + 1);
}

#[tokio::test]
async fn removing_a_line_releases_its_stock() {
    let test_db = TestDb::seeded().await;
    let lines = test_db.services.orders.order_lines(1).await.unwrap();
    let laptop = lines.iter().find(|l| l.product_id == LAPTOP).unwrap();

    let removed = test_db
        .services
        .orders
        .remove_line(laptop.line_id)
        .await
        .unwrap();
    assert_eq!(removed.quantity, 1);
    assert_eq!(test_db.stock_of(LAPTOP).await, LAPTOP_STOCK + 1);

    let headphones = lines.iter().find(|l| l.product_id == HEADPHONES).unwrap();
    let change = test_db
        .services
        .orders
        .change_line_quantity(headphones.line_id, 0)
        .await
        .unwrap();
    assert_matches!(change, LineChange::Removed { .. });
    assert_eq!(test_db.stock_of(HEADPHONES).await, HEADPHONES_STOCK + 2);
    assert_eq!(test_db.count("Bestellpositionen").await, 0);
}

#[tokio::test]
async fn negative_quantities_are_rejected() {
    let test_db = TestDb::seeded().await;
    let result = test_db.services.orders.change_line_quantity(1, -1).await;
    assert_matches!(result, Err(ServiceError::ValidationError(_)));

    let result = test_db.services.orders.add_line(1, LAPTOP, 0).await;
    assert_matches!(result, Err(ServiceError::ValidationError(_)));
}

#[tokio::test]
async fn product_without_stock_row_cannot_be_ordered() {
    let test_db = TestDb::seeded().await;
    test_db
        .execute("INSERT INTO Produkte (Produktname, Preis) VALUES ('Tablet', 399.0)")
        .await;

    let result = test_db.services.orders.add_line(1, 4, 1).await;
    assert_matches!(result, Err(ServiceError::InsufficientStock(_)));
}

#[tokio::test]
async fn stock_correction_overwrites_the_counted_quantity() {
    let test_db = TestDb::seeded().await;
    let correction = test_db
        .services
        .inventory
        .correct_stock(SMARTPHONE, 12)
        .await
        .unwrap();
    assert_eq!(correction.previous, SMARTPHONE_STOCK);
    assert_eq!(correction.current, 12);
    assert_eq!(test_db.stock_of(SMARTPHONE).await, 12);

    let result = test_db.services.inventory.correct_stock(SMARTPHONE, -3).await;
    assert_matches!(result, Err(ServiceError::ValidationError(_)));
}

#[tokio::test]
async fn low_stock_report_suggests_reorders() {
    let test_db = TestDb::seeded().await;
    test_db
        .services
        .inventory
        .correct_stock(HEADPHONES, 4)
        .await
        .unwrap();

    let report = test_db.services.inventory.low_stock_report().await.unwrap();
    assert_eq!(report.len(), 1);
    let row = &report[0];
    assert_eq!(row.product_id, HEADPHONES);
    assert_eq!(row.minimum, 10);
    assert_eq!(row.suggested_quantity(), 26);
    assert_eq!(row.supplier_name.as_deref(), Some("TechGroßhandel GmbH"));
    assert_eq!(row.lead_time_days, Some(3));
}

#[tokio::test]
async fn low_stock_report_reads_only_the_primary_stock_row() {
    let test_db = TestDb::seeded().await;
    // A second, nearly empty row for the laptop, and a well-filled second
    // row for the smartphone whose primary row is then run down.
    test_db
        .execute(&format!(
            "INSERT INTO Lagerbestand (ProduktID, Menge, LieferantID, Mindestbestand) VALUES ({}, 1, 1, 5)",
            LAPTOP
        ))
        .await;
    test_db
        .execute(&format!(
            "INSERT INTO Lagerbestand (ProduktID, Menge, LieferantID, Mindestbestand) VALUES ({}, 500, 1, 5)",
            SMARTPHONE
        ))
        .await;
    test_db
        .services
        .inventory
        .correct_stock(SMARTPHONE, 2)
        .await
        .unwrap();

    let report = test_db.services.inventory.low_stock_report().await.unwrap();
    let products: Vec<i32> = report.iter().map(|r| r.product_id).collect();
    assert_eq!(products, vec![SMARTPHONE]);
    assert_eq!(report[0].on_hand, 2);
    assert_eq!(
        report[0].on_hand,
        test_db.services.inventory.stock_on_hand(SMARTPHONE).await.unwrap()
    );
    assert_eq!(test_db.stock_of(LAPTOP).await, LAPTOP_STOCK);
}
