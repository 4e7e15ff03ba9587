use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// VAT rate applied to every catalog price (fixed 20%).
pub const TAX_RATE: Decimal = dec!(0.20);

/// Catalog product entity
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "products")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub name: String,
    #[sea_orm(column_type = "Text")]
    pub description: String,
    #[sea_orm(column_type = "Decimal(Some((12, 4)))")]
    pub price: Decimal,
    pub stock: i32,
    pub sku: String,
    #[sea_orm(nullable)]
    pub image: Option<String>,
    /// Ordered extra image references, stored as a JSON array of strings.
    #[sea_orm(column_type = "Json")]
    pub images: Json,
    pub is_active: bool,
    pub is_featured: bool,
    pub category_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Model {
    /// Price including the fixed 20% VAT, rounded to the currency minor unit.
    pub fn price_with_tax(&self) -> Decimal {
        (self.price * (Decimal::ONE + TAX_RATE)).round_dp(2)
    }

    /// A product is sellable only while its stock is strictly positive.
    pub fn is_in_stock(&self) -> bool {
        self.stock > 0
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::category::Entity",
        from = "Column::CategoryId",
        to = "super::category::Column::Id"
    )]
    Category,
    #[sea_orm(has_many = "super::order_item::Entity")]
    OrderItems,
}

impl Related<super::category::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Category.def()
    }
}

impl Related<super::order_item::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::OrderItems.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
