use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Stock row of a product. A product's stock is the row with the lowest
/// `LagerID`; the line-item triggers read and adjust that row only.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "Lagerbestand")]
pub struct Model {
    #[sea_orm(primary_key, column_name = "LagerID")]
    pub id: i32,
    #[sea_orm(column_name = "ProduktID")]
    pub product_id: i32,
    #[sea_orm(column_name = "Menge")]
    pub quantity: i32,
    #[sea_orm(column_name = "LieferantID")]
    pub supplier_id: i32,
    #[sea_orm(column_name = "Mindestbestand", nullable)]
    pub minimum_quantity: Option<i32>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::product::Entity",
        from = "Column::ProductId",
        to = "super::product::Column::Id"
    )]
    Product,
    #[sea_orm(
        belongs_to = "super::supplier::Entity",
        from = "Column::SupplierId",
        to = "super::supplier::Column::Id"
    )]
    Supplier,
}

impl Related<super::product::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Product.def()
    }
}

impl Related<super::supplier::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Supplier.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
