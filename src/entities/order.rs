use chrono::NaiveDate;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "Bestellungen")]
pub struct Model {
    #[sea_orm(primary_key, column_name = "BestellID")]
    pub id: i32,
    #[sea_orm(column_name = "KundeID")]
    pub customer_id: i32,
    #[sea_orm(column_name = "Bestelldatum")]
    pub order_date: NaiveDate,
    #[sea_orm(column_name = "Status")]
    pub status: OrderStatus,
    /// Discount in percent (10.0 = 10 %)
    #[sea_orm(column_name = "Rabatt")]
    pub discount_percent: f64,
    /// VAT rate in percent (19.0 = 19 %)
    #[sea_orm(column_name = "Mwst_Satz")]
    pub vat_rate_percent: f64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::customer::Entity",
        from = "Column::CustomerId",
        to = "super::customer::Column::Id"
    )]
    Customer,
    #[sea_orm(has_many = "super::order_item::Entity")]
    OrderItems,
}

impl Related<super::customer::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Customer.def()
    }
}

impl Related<super::order_item::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::OrderItems.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

/// Order workflow state. Stored with the German values the table's CHECK
/// constraint accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, EnumIter, DeriveActiveEnum)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(20))")]
pub enum OrderStatus {
    #[sea_orm(string_value = "offen")]
    Open,
    #[sea_orm(string_value = "versendet")]
    Shipped,
    #[sea_orm(string_value = "geliefert")]
    Delivered,
}

impl OrderStatus {
    /// The only state this one may move to, if any.
    pub fn next(self) -> Option<OrderStatus> {
        match self {
            OrderStatus::Open => Some(OrderStatus::Shipped),
            OrderStatus::Shipped => Some(OrderStatus::Delivered),
            OrderStatus::Delivered => None,
        }
    }

    pub fn can_transition_to(self, target: OrderStatus) -> bool {
        self.next() == Some(target)
    }

    /// Line items can only be changed while the order has not left the
    /// warehouse.
    pub fn allows_line_changes(self) -> bool {
        self == OrderStatus::Open
    }

    pub fn label(self) -> &'static str {
        match self {
            OrderStatus::Open => "open",
            OrderStatus::Shipped => "shipped",
            OrderStatus::Delivered => "delivered",
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
