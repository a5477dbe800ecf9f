use crate::entities::{customer, order, order_item, product, stock_level, supplier, OrderStatus};
use crate::errors::ServiceError;
use chrono::NaiveDate;
use sea_orm::{ActiveModelTrait, ConnectionTrait, EntityTrait, PaginatorTrait, Set, TransactionTrait};
use tracing::info;

const CUSTOMERS: [(&str, &str); 3] = [
    ("Max Mustermann", "Musterstraße 1"),
    ("Anna Schmidt", "Hauptstraße 10"),
    ("Lisa Müller", "Beispielweg 42"),
];

const SUPPLIERS: [(&str, &str, i32); 2] = [
    ("TechGroßhandel GmbH", "max@techgross.de", 3),
    ("ElektroPartner AG", "vertrieb@elektropartner.de", 5),
];

/// (name, price, stock, supplier index, minimum)
const PRODUCTS: [(&str, f64, i32, usize, i32); 3] = [
    ("Laptop", 999.99, 10, 0, 3),
    ("Smartphone", 699.99, 15, 1, 5),
    ("Kopfhörer", 149.99, 20, 0, 10),
];

/// (product index, quantity) of the sample order
const ORDER_LINES: [(usize, i32); 2] = [(0, 1), (2, 2)];

/// True when the database holds no customers, products or suppliers.
pub async fn is_empty<C: ConnectionTrait>(db: &C) -> Result<bool, ServiceError> {
    let customers = customer::Entity::find().count(db).await?;
    let products = product::Entity::find().count(db).await?;
    let suppliers = supplier::Entity::find().count(db).await?;
    Ok(customers == 0 && products == 0 && suppliers == 0)
}

/// Fills an empty database with sample master data and one open order.
/// Does nothing when any master data already exists.
pub async fn seed_sample_data<C: TransactionTrait + ConnectionTrait>(
    db: &C,
) -> Result<bool, ServiceError> {
    if !is_empty(db).await? {
        info!("Database already holds data; skipping sample data");
        return Ok(false);
    }

    let txn = db.begin().await?;

    let mut customer_ids = Vec::with_capacity(CUSTOMERS.len());
    for (name, address) in CUSTOMERS {
        let model = customer::ActiveModel {
            name: Set(name.to_owned()),
            address: Set(address.to_owned()),
            ..Default::default()
        }
        .insert(&txn)
        .await?;
        customer_ids.push(model.id);
    }

    let mut supplier_ids = Vec::with_capacity(SUPPLIERS.len());
    for (name, contact, lead_time) in SUPPLIERS {
        let model = supplier::ActiveModel {
            name: Set(name.to_owned()),
            contact: Set(Some(contact.to_owned())),
            lead_time_days: Set(Some(lead_time)),
            ..Default::default()
        }
        .insert(&txn)
        .await?;
        supplier_ids.push(model.id);
    }

    let mut products = Vec::with_capacity(PRODUCTS.len());
    for (name, price, stock, supplier, minimum) in PRODUCTS {
        let model = product::ActiveModel {
            name: Set(name.to_owned()),
            price: Set(price),
            ..Default::default()
        }
        .insert(&txn)
        .await?;

        stock_level::ActiveModel {
            product_id: Set(model.id),
            quantity: Set(stock),
            supplier_id: Set(supplier_ids[supplier]),
            minimum_quantity: Set(Some(minimum)),
            ..Default::default()
        }
        .insert(&txn)
        .await?;
        products.push(model);
    }

    let order_date = NaiveDate::from_ymd_opt(2025, 12, 1)
        .ok_or_else(|| ServiceError::InvalidOperation("invalid sample order date".into()))?;
    let order = order::ActiveModel {
        customer_id: Set(customer_ids[0]),
        order_date: Set(order_date),
        status: Set(OrderStatus::Open),
        discount_percent: Set(0.0),
        vat_rate_percent: Set(19.0),
        ..Default::default()
    }
    .insert(&txn)
    .await?;

    for (index, quantity) in ORDER_LINES {
        let product = &products[index];
        order_item::ActiveModel {
            order_id: Set(order.id),
            product_id: Set(product.id),
            quantity: Set(quantity),
            unit_price: Set(Some(product.price)),
            ..Default::default()
        }
        .insert(&txn)
        .await
        .map_err(|e| ServiceError::from_line_item_write(e, product.name.clone()))?;
    }

    txn.commit().await?;
    info!(
        "Sample data created: {} customers, {} suppliers, {} products, order {}",
        CUSTOMERS.len(),
        SUPPLIERS.len(),
        PRODUCTS.len(),
        order.id
    );
    Ok(true)
}
