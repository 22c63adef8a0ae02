//! Product catalogue and the product/location stock ledger.

use chrono::Utc;
use metrics::counter;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, Set,
    TransactionTrait,
};
use serde::Deserialize;
use std::sync::Arc;
use tracing::{info, instrument, warn};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::{Validate, ValidationError};

use crate::{
    db::DbPool,
    entities::{
        location::{self, Entity as Location},
        product::{self, Entity as Product, StockBand},
    },
    errors::ServiceError,
    events::{Event, EventSender, StockUpdate},
};

const DEFAULT_MIN_STOCK: i32 = 10;
const DEFAULT_MAX_STOCK: i32 = 100;

fn validate_non_negative_amount(amount: &Decimal) -> Result<(), ValidationError> {
    if amount.is_sign_negative() {
        return Err(ValidationError::new("amount_must_not_be_negative"));
    }
    Ok(())
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateProductInput {
    #[serde(default)]
    #[validate(length(min = 1, message = "name is required"))]
    pub name: String,
    #[serde(default)]
    #[validate(length(min = 1, message = "sku is required"))]
    pub sku: String,
    pub description: Option<String>,
    #[validate(range(min = 0))]
    pub min_stock_level: Option<i32>,
    #[validate(range(min = 0))]
    pub max_stock_level: Option<i32>,
    pub total_stock: Option<i32>,
    #[validate(custom = "validate_non_negative_amount")]
    pub amount: Option<Decimal>,
    pub location_id: Option<Uuid>,
}

#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProductInput {
    #[validate(length(min = 1))]
    pub name: Option<String>,
    #[validate(length(min = 1))]
    pub sku: Option<String>,
    pub description: Option<String>,
    #[validate(range(min = 0))]
    pub min_stock_level: Option<i32>,
    #[validate(range(min = 0))]
    pub max_stock_level: Option<i32>,
    #[validate(custom = "validate_non_negative_amount")]
    pub amount: Option<Decimal>,
}

#[derive(Clone)]
pub struct InventoryService {
    db_pool: Arc<DbPool>,
    event_sender: Arc<EventSender>,
}

fn log_ledger_breaches(product: &product::Model, location: &location::Model) {
    match product.stock_band() {
        StockBand::BelowMinimum => warn!(
            product_id = %product.id,
            total_stock = product.total_stock,
            min_stock_level = product.min_stock_level,
            "Product stock below minimum level"
        ),
        StockBand::AboveMaximum => warn!(
            product_id = %product.id,
            total_stock = product.total_stock,
            max_stock_level = product.max_stock_level,
            "Product stock above maximum level"
        ),
        StockBand::Within => {}
    }

    if location.is_over_capacity() {
        warn!(
            location_id = %location.id,
            current_load = location.current_load,
            capacity = location.capacity,
            "Location load exceeds capacity"
        );
    }
}

impl InventoryService {
    pub fn new(db_pool: Arc<DbPool>, event_sender: Arc<EventSender>) -> Self {
        Self {
            db_pool,
            event_sender,
        }
    }

    /// Moves `quantity_change` units of a product into (or out of) a location.
    /// The product total, the location allocation and the location load change together.
    #[instrument(skip(self))]
    pub async fn adjust_stock(
        &self,
        product_id: Uuid,
        location_id: Uuid,
        quantity_change: i32,
    ) -> Result<StockUpdate, ServiceError> {
        let txn = self.db_pool.begin().await?;

        let product = Product::find_by_id(product_id).one(&txn).await?;
        let location = Location::find_by_id(location_id).one(&txn).await?;
        let (Some(product), Some(mut location)) = (product, location) else {
            return Err(ServiceError::NotFound(
                "Product or Location not found".to_string(),
            ));
        };

        let out_of_range =
            || ServiceError::ValidationError("Quantity change is out of range".to_string());
        let total_stock = product
            .total_stock
            .checked_add(quantity_change)
            .ok_or_else(out_of_range)?;
        let current_load = location
            .current_load
            .checked_add(quantity_change)
            .ok_or_else(out_of_range)?;
        location
            .products
            .adjust(product_id, quantity_change)
            .ok_or_else(out_of_range)?;

        let now = Utc::now();

        let mut product_update: product::ActiveModel = product.into();
        product_update.total_stock = Set(total_stock);
        product_update.updated_at = Set(now);
        let product = product_update.update(&txn).await?;

        let products = location.products.clone();
        let mut location_update: location::ActiveModel = location.into();
        location_update.products = Set(products);
        location_update.current_load = Set(current_load);
        location_update.updated_at = Set(now);
        let location = location_update.update(&txn).await?;

        txn.commit().await?;

        counter!("warehouse_stock.adjustments", 1);
        log_ledger_breaches(&product, &location);
        info!(
            product_id = %product_id,
            location_id = %location_id,
            quantity_change,
            total_stock,
            "Stock adjusted"
        );

        let update = StockUpdate { product, location };
        self.event_sender
            .send_or_log(Event::StockUpdated(update.clone()));
        Ok(update)
    }

    #[instrument(skip(self, input), fields(sku = %input.sku))]
    pub async fn create_product(
        &self,
        input: CreateProductInput,
    ) -> Result<product::Model, ServiceError> {
        let sku = input.sku.trim().to_string();
        let name = input.name.trim().to_string();
        if sku.is_empty() || name.is_empty() {
            return Err(ServiceError::ValidationError(
                "name and sku are required".to_string(),
            ));
        }

        let min_stock_level = input.min_stock_level.unwrap_or(DEFAULT_MIN_STOCK);
        let max_stock_level = input.max_stock_level.unwrap_or(DEFAULT_MAX_STOCK);
        if min_stock_level > max_stock_level {
            return Err(ServiceError::ValidationError(
                "minStockLevel cannot exceed maxStockLevel".to_string(),
            ));
        }

        if let Some(location_id) = input.location_id {
            self.ensure_location(location_id).await?;
        }

        let duplicate = format!("Product with SKU {} already exists", sku);
        if self.count_by_sku(&sku).await? > 0 {
            return Err(ServiceError::Conflict(duplicate));
        }

        let now = Utc::now();
        let created = product::ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(name),
            sku: Set(sku),
            description: Set(input.description),
            min_stock_level: Set(min_stock_level),
            max_stock_level: Set(max_stock_level),
            total_stock: Set(input.total_stock.unwrap_or(0)),
            amount: Set(input.amount.unwrap_or(Decimal::ZERO)),
            location_id: Set(input.location_id),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&*self.db_pool)
        .await
        .map_err(|e| ServiceError::from_write_error(e, duplicate))?;

        info!(product_id = %created.id, "Product created");
        Ok(created)
    }

    pub async fn get_product(&self, product_id: Uuid) -> Result<product::Model, ServiceError> {
        Product::find_by_id(product_id)
            .one(&*self.db_pool)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Product {} not found", product_id)))
    }

    /// Lists products by name; `page` is 1-based.
    pub async fn list_products(
        &self,
        page: u64,
        limit: u64,
    ) -> Result<(Vec<product::Model>, u64), ServiceError> {
        if page == 0 || limit == 0 {
            return Err(ServiceError::ValidationError(
                "Page and limit must be greater than 0".to_string(),
            ));
        }

        let paginator = Product::find()
            .order_by_asc(product::Column::Name)
            .paginate(&*self.db_pool, limit);
        let total = paginator.num_items().await?;
        let products = paginator.fetch_page(page - 1).await?;
        Ok((products, total))
    }

    #[instrument(skip(self, input))]
    pub async fn update_product(
        &self,
        product_id: Uuid,
        input: UpdateProductInput,
    ) -> Result<product::Model, ServiceError> {
        let current = self.get_product(product_id).await?;

        let min_stock_level = input.min_stock_level.unwrap_or(current.min_stock_level);
        let max_stock_level = input.max_stock_level.unwrap_or(current.max_stock_level);
        if min_stock_level > max_stock_level {
            return Err(ServiceError::ValidationError(
                "minStockLevel cannot exceed maxStockLevel".to_string(),
            ));
        }

        let mut active: product::ActiveModel = current.into();
        if let Some(name) = input.name {
            active.name = Set(name.trim().to_string());
        }
        let mut duplicate = String::from("Product with this SKU already exists");
        if let Some(sku) = input.sku {
            let sku = sku.trim().to_string();
            duplicate = format!("Product with SKU {} already exists", sku);
            active.sku = Set(sku);
        }
        if let Some(description) = input.description {
            active.description = Set(Some(description));
        }
        if let Some(amount) = input.amount {
            active.amount = Set(amount);
        }
        active.min_stock_level = Set(min_stock_level);
        active.max_stock_level = Set(max_stock_level);
        active.updated_at = Set(Utc::now());

        active
            .update(&*self.db_pool)
            .await
            .map_err(|e| ServiceError::from_write_error(e, duplicate))
    }

    /// Points a product at its primary storage location.
    #[instrument(skip(self))]
    pub async fn set_product_location(
        &self,
        product_id: Uuid,
        location_id: Uuid,
    ) -> Result<product::Model, ServiceError> {
        let current = self.get_product(product_id).await?;
        self.ensure_location(location_id).await?;

        let mut active: product::ActiveModel = current.into();
        active.location_id = Set(Some(location_id));
        active.updated_at = Set(Utc::now());
        Ok(active.update(&*self.db_pool).await?)
    }

    #[instrument(skip(self))]
    pub async fn delete_products(&self, product_ids: &[Uuid]) -> Result<u64, ServiceError> {
        if product_ids.is_empty() {
            return Err(ServiceError::ValidationError(
                "ids must not be empty".to_string(),
            ));
        }

        let result = Product::delete_many()
            .filter(product::Column::Id.is_in(product_ids.iter().copied()))
            .exec(&*self.db_pool)
            .await?;
        if result.rows_affected == 0 {
            return Err(ServiceError::NotFound(
                "No products found to delete".to_string(),
            ));
        }

        info!(count = result.rows_affected, "Products deleted");
        self.event_sender.send_or_log(Event::ProductsDeleted {
            count: result.rows_affected,
        });
        Ok(result.rows_affected)
    }

    pub async fn count_by_sku(&self, sku: &str) -> Result<u64, ServiceError> {
        Ok(Product::find()
            .filter(product::Column::Sku.eq(sku.trim()))
            .count(&*self.db_pool)
            .await?)
    }

    async fn ensure_location(&self, location_id: Uuid) -> Result<(), ServiceError> {
        let found = Location::find_by_id(location_id)
            .count(&*self.db_pool)
            .await?;
        if found == 0 {
            return Err(ServiceError::ValidationError(
                "Invalid location ID".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn negative_amounts_are_rejected() {
        assert!(validate_non_negative_amount(&dec!(-0.01)).is_err());
        assert!(validate_non_negative_amount(&dec!(0)).is_ok());
        assert!(validate_non_negative_amount(&dec!(12.50)).is_ok());
    }

    #[test]
    fn product_input_requires_name_and_sku() {
        let input: CreateProductInput = serde_json::from_value(serde_json::json!({
            "name": "",
            "sku": "SKU-1"
        }))
        .unwrap();
        assert!(input.validate().is_err());
    }
}
