use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Product master data.
///
/// `Preis` is declared REAL but older files may hold text such as
/// `"1.234,56 €"`; such rows fail to decode into this model until the price
/// cleanup has normalized them. Read paths that must tolerate them go through
/// the typed projections in `services::products`.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "Produkte")]
pub struct Model {
    #[sea_orm(primary_key, column_name = "ProduktID")]
    pub id: i32,
    #[sea_orm(column_name = "Produktname")]
    pub name: String,
    #[sea_orm(column_name = "Preis")]
    pub price: f64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::stock_level::Entity")]
    StockLevels,
    #[sea_orm(has_many = "super::order_item::Entity")]
    OrderItems,
}

impl Related<super::stock_level::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::StockLevels.def()
    }
}

impl Related<super::order_item::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::OrderItems.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
