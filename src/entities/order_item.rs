use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Order line. Inserting, changing or deleting a line moves stock through
/// the triggers installed by the migrator; nothing here touches
/// `Lagerbestand` directly.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "Bestellpositionen")]
pub struct Model {
    #[sea_orm(primary_key, column_name = "PositionID")]
    pub id: i32,
    #[sea_orm(column_name = "BestellID")]
    pub order_id: i32,
    #[sea_orm(column_name = "ProduktID")]
    pub product_id: i32,
    #[sea_orm(column_name = "Menge")]
    pub quantity: i32,
    /// Unit price at the time the line was added; `None` for lines written
    /// by older versions that kept no snapshot.
    #[sea_orm(column_name = "Einzelpreis", nullable)]
    pub unit_price: Option<f64>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::order::Entity",
        from = "Column::OrderId",
        to = "super::order::Column::Id"
    )]
    Order,
    #[sea_orm(
        belongs_to = "super::product::Entity",
        from = "Column::ProductId",
        to = "super::product::Column::Id"
    )]
    Product,
}

impl Related<super::order::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Order.def()
    }
}

impl Related<super::product::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Product.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
