use crate::{
    db::DbPool,
    entities::{
        customer,
        order::{self, Entity as OrderEntity, Model as OrderModel},
        order_item::{self, Entity as OrderItemEntity, Model as OrderItemModel},
        OrderStatus,
    },
    errors::ServiceError,
    services::{
        customers::find_customer,
        inventory::stock_on_hand,
        invoicing::{build_invoice, stored_lines, StoredLine},
        products::find_product,
        validate_percentage,
    },
};
use chrono::Local;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, ModelTrait, QueryFilter,
    QueryOrder, Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info, instrument, warn};
use validator::Validate;

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct NewOrderLine {
    pub product_id: i32,
    #[validate(range(min = 1))]
    pub quantity: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct NewOrder {
    pub customer_id: i32,
    pub lines: Vec<NewOrderLine>,
    #[validate(custom = "validate_percentage")]
    pub discount_percent: f64,
    /// `None` applies the configured default rate
    #[validate(custom = "validate_percentage")]
    pub vat_rate_percent: Option<f64>,
}

/// New discount and/or VAT rate; `None` keeps the stored value.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct TermsUpdate {
    #[validate(custom = "validate_percentage")]
    pub discount_percent: Option<f64>,
    #[validate(custom = "validate_percentage")]
    pub vat_rate_percent: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OrderWithLines {
    pub order: OrderModel,
    pub lines: Vec<OrderItemModel>,
}

/// Outcome of a quantity change on a line.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum LineChange {
    Updated { line: OrderItemModel, previous: i32 },
    /// Quantity 0 removes the line
    Removed { line: OrderItemModel },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TermsChange {
    pub previous: OrderModel,
    pub current: OrderModel,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OrderSummary {
    pub order: OrderModel,
    pub line_count: usize,
    /// `None` when a line has no numeric price
    pub total: Option<Decimal>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CustomerHistory {
    pub customer: customer::Model,
    pub orders: Vec<OrderSummary>,
}

/// Service for orders and their lines
#[derive(Clone)]
pub struct OrderService {
    db: Arc<DbPool>,
    default_vat_rate: f64,
}

impl OrderService {
    pub fn new(db: Arc<DbPool>, default_vat_rate: f64) -> Self {
        Self {
            db,
            default_vat_rate,
        }
    }

    pub fn default_vat_rate(&self) -> f64 {
        self.default_vat_rate
    }

    /// Creates an order dated today with its lines in one transaction.
    /// Nothing is written when any line is rejected.
    #[instrument(skip(self, input), fields(customer_id = input.customer_id, lines = input.lines.len()))]
    pub async fn create_order(&self, input: NewOrder) -> Result<OrderWithLines, ServiceError> {
        input.validate()?;
        for line in &input.lines {
            line.validate()?;
        }

        let txn = self.db.begin().await?;
        let customer = find_customer(&txn, input.customer_id).await?;

        let order = order::ActiveModel {
            customer_id: Set(customer.id),
            order_date: Set(Local::now().date_naive()),
            status: Set(OrderStatus::Open),
            discount_percent: Set(input.discount_percent),
            vat_rate_percent: Set(input.vat_rate_percent.unwrap_or(self.default_vat_rate)),
            ..Default::default()
        }
        .insert(&txn)
        .await?;

        let mut lines = Vec::with_capacity(input.lines.len());
        for line in &input.lines {
            match insert_line(&txn, &order, line.product_id, line.quantity).await {
                Ok(item) => lines.push(item),
                Err(e) => {
                    warn!("Order for customer {} rejected: {}", customer.id, e);
                    return Err(e);
                }
            }
        }

        txn.commit().await?;
        info!(
            "Order {} created for '{}' with {} line(s), discount {}%, VAT {}%",
            order.id,
            customer.name,
            lines.len(),
            order.discount_percent,
            order.vat_rate_percent
        );
        Ok(OrderWithLines { order, lines })
    }

    /// Gets an order by ID
    #[instrument(skip(self))]
    pub async fn get_order(&self, order_id: i32) -> Result<OrderModel, ServiceError> {
        find_order(&*self.db, order_id).await
    }

    /// Lines of an order with product names and unit prices
    #[instrument(skip(self))]
    pub async fn order_lines(&self, order_id: i32) -> Result<Vec<StoredLine>, ServiceError> {
        find_order(&*self.db, order_id).await?;
        stored_lines(&*self.db, order_id).await
    }

    /// Adds a line to an open order
    #[instrument(skip(self))]
    pub async fn add_line(
        &self,
        order_id: i32,
        product_id: i32,
        quantity: i32,
    ) -> Result<OrderItemModel, ServiceError> {
        let txn = self.db.begin().await?;
        let order = find_order(&txn, order_id).await?;
        ensure_open(&order)?;

        let line = insert_line(&txn, &order, product_id, quantity).await?;
        txn.commit().await?;

        info!(
            "Line {} added to order {}: {}x product {}",
            line.id, order_id, quantity, product_id
        );
        Ok(line)
    }

    /// Changes the quantity of a line on an open order; 0 removes the line
    #[instrument(skip(self))]
    pub async fn change_line_quantity(
        &self,
        line_id: i32,
        quantity: i32,
    ) -> Result<LineChange, ServiceError> {
        if quantity < 0 {
            return Err(ServiceError::ValidationError(
                "quantity cannot be negative".to_string(),
            ));
        }
        if quantity == 0 {
            let line = self.remove_line(line_id).await?;
            return Ok(LineChange::Removed { line });
        }

        let txn = self.db.begin().await?;
        let line = find_line(&txn, line_id).await?;
        let order = find_order(&txn, line.order_id).await?;
        ensure_open(&order)?;

        let previous = line.quantity;
        if quantity == previous {
            return Ok(LineChange::Updated { line, previous });
        }
        if quantity > previous {
            let available = stock_on_hand(&txn, line.product_id).await?;
            let increase = quantity - previous;
            if increase > available {
                warn!(
                    "Line {}: increase of {} rejected, {} available",
                    line_id, increase, available
                );
                return Err(ServiceError::InsufficientStock(format!(
                    "product {}: requested {} more, available {}",
                    line.product_id, increase, available
                )));
            }
        }

        let product_id = line.product_id;
        let mut active: order_item::ActiveModel = line.into();
        active.quantity = Set(quantity);
        let updated = active.update(&txn).await.map_err(|e| {
            ServiceError::from_line_item_write(e, format!("product {}", product_id))
        })?;
        txn.commit().await?;

        info!("Line {} changed: {} -> {}", line_id, previous, quantity);
        Ok(LineChange::Updated {
            line: updated,
            previous,
        })
    }

    /// Removes a line from an open order; its quantity returns to stock
    #[instrument(skip(self))]
    pub async fn remove_line(&self, line_id: i32) -> Result<OrderItemModel, ServiceError> {
        let txn = self.db.begin().await?;
        let line = find_line(&txn, line_id).await?;
        let order = find_order(&txn, line.order_id).await?;
        ensure_open(&order)?;

        line.clone().delete(&txn).await?;
        txn.commit().await?;

        info!(
            "Line {} removed from order {}; {} unit(s) of product {} back in stock",
            line.id, line.order_id, line.quantity, line.product_id
        );
        Ok(line)
    }

    /// Changes discount and/or VAT rate of an order
    #[instrument(skip(self))]
    pub async fn update_terms(
        &self,
        order_id: i32,
        update: TermsUpdate,
    ) -> Result<TermsChange, ServiceError> {
        update.validate()?;

        let previous = find_order(&*self.db, order_id).await?;
        let mut active: order::ActiveModel = previous.clone().into();
        if let Some(discount) = update.discount_percent {
            active.discount_percent = Set(discount);
        }
        if let Some(vat) = update.vat_rate_percent {
            active.vat_rate_percent = Set(vat);
        }
        let current = active.update(&*self.db).await?;

        info!(
            "Order {}: discount {}% -> {}%, VAT {}% -> {}%",
            order_id,
            previous.discount_percent,
            current.discount_percent,
            previous.vat_rate_percent,
            current.vat_rate_percent
        );
        Ok(TermsChange { previous, current })
    }

    /// Orders of a customer, newest first, with their invoice totals
    #[instrument(skip(self))]
    pub async fn customer_history(&self, customer_id: i32) -> Result<CustomerHistory, ServiceError> {
        let db = &*self.db;
        let customer = find_customer(db, customer_id).await?;

        let orders = OrderEntity::find()
            .filter(order::Column::CustomerId.eq(customer_id))
            .order_by_desc(order::Column::OrderDate)
            .order_by_desc(order::Column::Id)
            .all(db)
            .await?;

        let mut summaries = Vec::with_capacity(orders.len());
        for order in orders {
            let line_count = OrderItemEntity::find()
                .filter(order_item::Column::OrderId.eq(order.id))
                .all(db)
                .await?
                .len();
            let total = match build_invoice(db, order.id).await {
                Ok(invoice) => Some(invoice.totals.total),
                Err(ServiceError::ValidationError(msg)) => {
                    warn!("No total for order {}: {}", order.id, msg);
                    None
                }
                Err(e) => {
                    error!("Failed to total order {}: {}", order.id, e);
                    return Err(e);
                }
            };
            summaries.push(OrderSummary {
                order,
                line_count,
                total,
            });
        }

        info!("Order history shown for customer {}", customer_id);
        Ok(CustomerHistory {
            customer,
            orders: summaries,
        })
    }
}

fn ensure_open(order: &OrderModel) -> Result<(), ServiceError> {
    if order.status.allows_line_changes() {
        Ok(())
    } else {
        Err(ServiceError::InvalidOperation(format!(
            "order {} is {}; lines can only be changed while it is open",
            order.id, order.status
        )))
    }
}

/// Inserts a line priced at the product's current price. Stock is checked
/// here first; the insert trigger deducts it.
async fn insert_line<C: ConnectionTrait>(
    db: &C,
    order: &OrderModel,
    product_id: i32,
    quantity: i32,
) -> Result<OrderItemModel, ServiceError> {
    if quantity <= 0 {
        return Err(ServiceError::ValidationError(
            "quantity must be greater than zero".to_string(),
        ));
    }

    let product = find_product(db, product_id).await?;
    let unit_price = product.numeric_price()?;

    let available = stock_on_hand(db, product_id).await?;
    if quantity > available {
        warn!(
            "Line for '{}' rejected: requested {}, available {}",
            product.name, quantity, available
        );
        return Err(ServiceError::InsufficientStock(format!(
            "'{}': requested {}, available {}",
            product.name, quantity, available
        )));
    }

    order_item::ActiveModel {
        order_id: Set(order.id),
        product_id: Set(product_id),
        quantity: Set(quantity),
        unit_price: Set(Some(unit_price)),
        ..Default::default()
    }
    .insert(db)
    .await
    .map_err(|e| ServiceError::from_line_item_write(e, format!("'{}'", product.name)))
}

pub(crate) async fn find_order<C: ConnectionTrait>(
    db: &C,
    order_id: i32,
) -> Result<OrderModel, ServiceError> {
    OrderEntity::find_by_id(order_id)
        .one(db)
        .await?
        .ok_or_else(|| ServiceError::NotFound(format!("order {}", order_id)))
}

async fn find_line<C: ConnectionTrait>(db: &C, line_id: i32) -> Result<OrderItemModel, ServiceError> {
    OrderItemEntity::find_by_id(line_id)
        .one(db)
        .await?
        .ok_or_else(|| ServiceError::NotFound(format!("order line {}", line_id)))
}
