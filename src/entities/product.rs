use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "products")]
#[serde(rename_all = "camelCase")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub name: String,
    #[sea_orm(unique)]
    pub sku: String,
    pub description: Option<String>,
    pub min_stock_level: i32,
    pub max_stock_level: i32,
    pub total_stock: i32,
    pub amount: Decimal,
    /// Weak reference to the primary storage location.
    pub location_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

/// Where a product's stock sits relative to its configured band.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StockBand {
    BelowMinimum,
    Within,
    AboveMaximum,
}

impl Model {
    pub fn stock_band(&self) -> StockBand {
        if self.total_stock < self.min_stock_level {
            StockBand::BelowMinimum
        } else if self.total_stock > self.max_stock_level {
            StockBand::AboveMaximum
        } else {
            StockBand::Within
        }
    }
}
