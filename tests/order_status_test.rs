mod common;

use assert_matches::assert_matches;
use bestellverwaltung::{entities::OrderStatus, errors::ServiceError};
use common::{TestDb, LAPTOP};

#[tokio::test]
async fn status_advances_open_shipped_delivered() {
    let test_db = TestDb::seeded().await;
    let status = &test_db.services.order_status;

    let change = status.advance_status(1).await.unwrap();
    assert_eq!((change.from, change.to), (OrderStatus::Open, OrderStatus::Shipped));
    assert_eq!(change.order.status, OrderStatus::Shipped);

    let change = status.advance_status(1).await.unwrap();
    assert_eq!((change.from, change.to), (OrderStatus::Shipped, OrderStatus::Delivered));

    let result = status.advance_status(1).await;
    assert_matches!(result, Err(ServiceError::InvalidOperation(_)));
    let order = test_db.services.orders.get_order(1).await.unwrap();
    assert_eq!(order.status, OrderStatus::Delivered);
}

#[tokio::test]
async fn statuses_cannot_be_skipped_or_reverted() {
    let test_db = TestDb::seeded().await;
    let status = &test_db.services.order_status;

    let result = status.update_status(1, OrderStatus::Delivered).await;
    assert_matches!(result, Err(ServiceError::InvalidOperation(_)));

    status.update_status(1, OrderStatus::Shipped).await.unwrap();
    let result = status.update_status(1, OrderStatus::Open).await;
    assert_matches!(result, Err(ServiceError::InvalidOperation(_)));

    let result = status.update_status(1, OrderStatus::Shipped).await;
    assert_matches!(result, Err(ServiceError::InvalidOperation(_)));
}

#[tokio::test]
async fn shipped_orders_keep_their_lines() {
    let test_db = TestDb::seeded().await;
    test_db.services.order_status.advance_status(1).await.unwrap();
    let orders = &test_db.services.orders;

    assert_matches!(
        orders.add_line(1, LAPTOP, 1).await,
        Err(ServiceError::InvalidOperation(_))
    );
    assert_matches!(
        orders.change_line_quantity(1, 3).await,
        Err(ServiceError::InvalidOperation(_))
    );
    assert_matches!(orders.remove_line(1).await, Err(ServiceError::InvalidOperation(_)));
    assert_eq!(test_db.count("Bestellpositionen").await, 2);
}

#[tokio::test]
async fn unknown_order_is_not_found() {
    let test_db = TestDb::seeded().await;
    let result = test_db.services.order_status.advance_status(99).await;
    assert_matches!(result, Err(ServiceError::NotFound(_)));
}
