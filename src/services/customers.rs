use crate::{
    db::DbPool,
    entities::customer::{self, Entity as CustomerEntity, Model as CustomerModel},
    errors::ServiceError,
    services::{like_pattern, validate_not_blank},
};
use sea_orm::{
    sea_query::LikeExpr, ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait,
    QueryFilter, QueryOrder, Set,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument, warn};
use validator::Validate;

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct NewCustomer {
    #[validate(custom = "validate_not_blank")]
    pub name: String,
    #[validate(custom = "validate_not_blank")]
    pub address: String,
}

/// Changes to a customer; `None` keeps the stored value.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct CustomerUpdate {
    #[validate(custom = "validate_not_blank")]
    pub name: Option<String>,
    #[validate(custom = "validate_not_blank")]
    pub address: Option<String>,
}

impl CustomerUpdate {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.address.is_none()
    }
}

/// Service for managing customers
#[derive(Clone)]
pub struct CustomerService {
    db: Arc<DbPool>,
}

impl CustomerService {
    pub fn new(db: Arc<DbPool>) -> Self {
        Self { db }
    }

    /// Creates a new customer
    #[instrument(skip(self))]
    pub async fn create_customer(&self, input: NewCustomer) -> Result<CustomerModel, ServiceError> {
        input.validate()?;

        let customer = customer::ActiveModel {
            name: Set(input.name.trim().to_owned()),
            address: Set(input.address.trim().to_owned()),
            ..Default::default()
        }
        .insert(&*self.db)
        .await?;

        info!("Customer created: {} (ID {})", customer.name, customer.id);
        Ok(customer)
    }

    /// Updates name and/or address of an existing customer
    #[instrument(skip(self))]
    pub async fn update_customer(
        &self,
        customer_id: i32,
        update: CustomerUpdate,
    ) -> Result<CustomerModel, ServiceError> {
        update.validate()?;

        let existing = self.get_customer(customer_id).await?;
        if update.is_empty() {
            return Ok(existing);
        }

        let mut active: customer::ActiveModel = existing.clone().into();
        if let Some(name) = update.name {
            active.name = Set(name.trim().to_owned());
        }
        if let Some(address) = update.address {
            active.address = Set(address.trim().to_owned());
        }
        let updated = active.update(&*self.db).await?;

        info!(
            "Customer {} updated: '{}' / '{}' -> '{}' / '{}'",
            customer_id, existing.name, existing.address, updated.name, updated.address
        );
        Ok(updated)
    }

    /// Gets a customer by ID
    #[instrument(skip(self))]
    pub async fn get_customer(&self, customer_id: i32) -> Result<CustomerModel, ServiceError> {
        find_customer(&*self.db, customer_id).await
    }

    /// Lists all customers
    #[instrument(skip(self))]
    pub async fn list_customers(&self) -> Result<Vec<CustomerModel>, ServiceError> {
        let customers = CustomerEntity::find()
            .order_by_asc(customer::Column::Id)
            .all(&*self.db)
            .await?;
        Ok(customers)
    }

    /// Finds customers whose name contains `term`
    #[instrument(skip(self))]
    pub async fn search_customers(&self, term: &str) -> Result<Vec<CustomerModel>, ServiceError> {
        if term.trim().is_empty() {
            warn!("Rejected empty customer search");
            return Err(ServiceError::ValidationError(
                "search term must not be empty".to_string(),
            ));
        }

        let customers = CustomerEntity::find()
            .filter(customer::Column::Name.like(LikeExpr::new(like_pattern(term)).escape('\\')))
            .order_by_asc(customer::Column::Name)
            .all(&*self.db)
            .await?;
        Ok(customers)
    }
}

pub(crate) async fn find_customer<C: ConnectionTrait>(
    db: &C,
    customer_id: i32,
) -> Result<CustomerModel, ServiceError> {
    CustomerEntity::find_by_id(customer_id)
        .one(db)
        .await?
        .ok_or_else(|| ServiceError::NotFound(format!("customer {}", customer_id)))
}
