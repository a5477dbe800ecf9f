use std::sync::Arc;

use sea_orm::{ActiveModelTrait, ActiveValue::Set, DatabaseConnection, TransactionTrait};
use serde::Serialize;
use tracing::{error, info, instrument};

use crate::{
    entities::{
        order::{ActiveModel as OrderActiveModel, Model as OrderModel},
        OrderStatus,
    },
    errors::ServiceError,
    services::orders::find_order,
};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatusChange {
    pub order: OrderModel,
    pub from: OrderStatus,
    pub to: OrderStatus,
}

/// Moves orders through `open → shipped → delivered`.
#[derive(Clone)]
pub struct OrderStatusService {
    db: Arc<DatabaseConnection>,
}

impl OrderStatusService {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Moves an order to the next status
    #[instrument(skip(self))]
    pub async fn advance_status(&self, order_id: i32) -> Result<StatusChange, ServiceError> {
        let order = find_order(&*self.db, order_id).await?;
        let next = order.status.next().ok_or_else(|| {
            ServiceError::InvalidOperation(format!(
                "order {} is already {}",
                order_id, order.status
            ))
        })?;
        self.update_status(order_id, next).await
    }

    /// Sets the status of an order, allowing only the next step
    #[instrument(skip(self), fields(order_id = %order_id, new_status = %new_status))]
    pub async fn update_status(
        &self,
        order_id: i32,
        new_status: OrderStatus,
    ) -> Result<StatusChange, ServiceError> {
        let txn = self.db.begin().await.map_err(|e| {
            error!("Failed to begin transaction: {}", e);
            ServiceError::DatabaseError(e)
        })?;

        let order = find_order(&txn, order_id).await?;
        let old_status = order.status;

        if !old_status.can_transition_to(new_status) {
            error!(
                "Invalid status transition for order {}: {} -> {}",
                order_id, old_status, new_status
            );
            return Err(ServiceError::InvalidOperation(format!(
                "order {} cannot change from {} to {}",
                order_id, old_status, new_status
            )));
        }

        let mut active: OrderActiveModel = order.into();
        active.status = Set(new_status);
        let updated = active.update(&txn).await.map_err(|e| {
            error!("Failed to update order {}: {}", order_id, e);
            ServiceError::DatabaseError(e)
        })?;

        txn.commit().await.map_err(|e| {
            error!("Failed to commit transaction: {}", e);
            ServiceError::DatabaseError(e)
        })?;

        info!(
            "Order {} status changed: {} -> {}",
            order_id, old_status, new_status
        );
        Ok(StatusChange {
            order: updated,
            from: old_status,
            to: new_status,
        })
    }
}
