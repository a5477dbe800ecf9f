use crate::{
    db::DbPool,
    entities::supplier::{self, Entity as SupplierEntity, Model as SupplierModel},
    errors::ServiceError,
    services::validate_not_blank,
};
use sea_orm::{ActiveModelTrait, ConnectionTrait, EntityTrait, QueryOrder, Set};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument};
use validator::Validate;

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct NewSupplier {
    #[validate(custom = "validate_not_blank")]
    pub name: String,
    /// E-mail address or phone number
    #[validate(custom = "validate_not_blank")]
    pub contact: String,
    #[validate(range(min = 0))]
    pub lead_time_days: i32,
}

/// Service for managing suppliers
#[derive(Clone)]
pub struct SupplierService {
    db: Arc<DbPool>,
}

impl SupplierService {
    pub fn new(db: Arc<DbPool>) -> Self {
        Self { db }
    }

    /// Creates a new supplier
    #[instrument(skip(self))]
    pub async fn create_supplier(&self, input: NewSupplier) -> Result<SupplierModel, ServiceError> {
        input.validate()?;

        let supplier = supplier::ActiveModel {
            name: Set(input.name.trim().to_owned()),
            contact: Set(Some(input.contact.trim().to_owned())),
            lead_time_days: Set(Some(input.lead_time_days)),
            ..Default::default()
        }
        .insert(&*self.db)
        .await?;

        info!("Supplier created: {} (ID {})", supplier.name, supplier.id);
        Ok(supplier)
    }

    /// Gets a supplier by ID
    #[instrument(skip(self))]
    pub async fn get_supplier(&self, supplier_id: i32) -> Result<SupplierModel, ServiceError> {
        find_supplier(&*self.db, supplier_id).await
    }

    /// Lists all suppliers
    #[instrument(skip(self))]
    pub async fn list_suppliers(&self) -> Result<Vec<SupplierModel>, ServiceError> {
        let suppliers = SupplierEntity::find()
            .order_by_asc(supplier::Column::Id)
            .all(&*self.db)
            .await?;
        Ok(suppliers)
    }
}

pub(crate) async fn find_supplier<C: ConnectionTrait>(
    db: &C,
    supplier_id: i32,
) -> Result<SupplierModel, ServiceError> {
    SupplierEntity::find_by_id(supplier_id)
        .one(db)
        .await?
        .ok_or_else(|| ServiceError::NotFound(format!("supplier {}", supplier_id)))
}
