use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use sea_orm::FromJsonQueryResult;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// Quantity of one product held at a location.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProductAllocation {
    pub product_id: Uuid,
    pub quantity: i32,
}

#[derive(Clone, Debug, PartialEq, Eq, Default, Serialize, Deserialize, FromJsonQueryResult)]
pub struct ProductAllocations(pub Vec<ProductAllocation>);

impl ProductAllocations {
    pub fn quantity_of(&self, product_id: Uuid) -> Option<i32> {
        self.0
            .iter()
            .find(|entry| entry.product_id == product_id)
            .map(|entry| entry.quantity)
    }

    /// Adds `delta` to the product's quantity, creating the pair when missing.
    /// Returns `None` and leaves the list untouched when the sum overflows.
    pub fn adjust(&mut self, product_id: Uuid, delta: i32) -> Option<i32> {
        match self.0.iter_mut().find(|entry| entry.product_id == product_id) {
            Some(entry) => {
                entry.quantity = entry.quantity.checked_add(delta)?;
                Some(entry.quantity)
            }
            None => {
                self.0.push(ProductAllocation {
                    product_id,
                    quantity: delta,
                });
                Some(delta)
            }
        }
    }

    /// Replaces the product's quantity, creating the pair when missing.
    pub fn set(&mut self, product_id: Uuid, quantity: i32) {
        match self.0.iter_mut().find(|entry| entry.product_id == product_id) {
            Some(entry) => entry.quantity = quantity,
            None => self.0.push(ProductAllocation {
                product_id,
                quantity,
            }),
        }
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "locations")]
#[serde(rename_all = "camelCase")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(unique)]
    pub location_code: String,
    pub capacity: i32,
    pub current_load: i32,
    pub stock: i32,
    #[sea_orm(column_type = "Json")]
    pub products: ProductAllocations,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    pub fn is_over_capacity(&self) -> bool {
        self.current_load > self.capacity
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn adjust_upserts_and_accumulates() {
        let product = Uuid::new_v4();
        let mut allocations = ProductAllocations::default();

        assert_eq!(allocations.adjust(product, 5), Some(5));
        assert_eq!(allocations.adjust(product, -2), Some(3));
        assert_eq!(allocations.0.len(), 1);
        assert_eq!(allocations.quantity_of(product), Some(3));
    }

    #[test]
    fn adjust_refuses_to_overflow() {
        let product = Uuid::new_v4();
        let mut allocations = ProductAllocations::default();
        allocations.set(product, i32::MAX);

        assert_eq!(allocations.adjust(product, 1), None);
        assert_eq!(allocations.quantity_of(product), Some(i32::MAX));
    }

    #[test]
    fn set_replaces_existing_quantity() {
        let product = Uuid::new_v4();
        let mut allocations = ProductAllocations(vec![ProductAllocation {
            product_id: product,
            quantity: 9,
        }]);

        allocations.set(product, 2);
        allocations.set(Uuid::new_v4(), 4);
        assert_eq!(allocations.quantity_of(product), Some(2));
        assert_eq!(allocations.0.len(), 2);
    }
}
