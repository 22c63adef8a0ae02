//! Storage locations, receiving docks and the assignment of receipt items to them.

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument, warn};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::{
    db::DbPool,
    entities::{
        dock_location::{self, Entity as DockLocation},
        grn::Entity as Grn,
        location::{self, Entity as Location},
        product::Entity as Product,
    },
    errors::ServiceError,
    events::{Event, EventSender},
};

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateLocationInput {
    #[serde(default)]
    #[validate(length(min = 1, message = "locationCode is required"))]
    pub location_code: String,
    #[validate(range(min = 0, message = "Invalid capacity value"))]
    pub capacity: i32,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateDockLocationInput {
    #[serde(default)]
    #[validate(length(min = 1, message = "dockCode is required"))]
    pub dock_code: String,
    #[validate(range(min = 0, message = "Invalid capacity value"))]
    pub capacity: i32,
    pub description: Option<String>,
    #[serde(default)]
    #[validate(length(min = 1, message = "locationCode is required"))]
    pub location_code: String,
}

/// One requested move of a receipt item onto a storage location.
#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LocationAssignment {
    pub item_id: Uuid,
    /// Becomes the item's dock code.
    pub new_location: String,
    pub location_code: String,
    pub dock_code: Option<String>,
    pub capacity: i32,
    pub current_load: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
pub enum AssignmentResult {
    Applied,
    Skipped,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AssignmentOutcome {
    pub item_id: Uuid,
    pub outcome: AssignmentResult,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AssignmentReport {
    pub grn_id: Uuid,
    pub outcomes: Vec<AssignmentOutcome>,
    pub applied: usize,
    pub skipped: usize,
}

impl AssignmentReport {
    fn new(grn_id: Uuid) -> Self {
        Self {
            grn_id,
            outcomes: Vec::new(),
            applied: 0,
            skipped: 0,
        }
    }

    fn applied(&mut self, item_id: Uuid) {
        self.applied += 1;
        self.outcomes.push(AssignmentOutcome {
            item_id,
            outcome: AssignmentResult::Applied,
            reason: None,
        });
    }

    fn skipped(&mut self, item_id: Uuid, reason: String) {
        warn!(item_id = %item_id, reason = %reason, "Skipping location assignment");
        self.skipped += 1;
        self.outcomes.push(AssignmentOutcome {
            item_id,
            outcome: AssignmentResult::Skipped,
            reason: Some(reason),
        });
    }
}

fn invalid_capacity() -> ServiceError {
    ServiceError::ValidationError("Invalid capacity value".to_string())
}

#[derive(Clone)]
pub struct LocationService {
    db_pool: Arc<DbPool>,
    event_sender: Arc<EventSender>,
}

impl LocationService {
    pub fn new(db_pool: Arc<DbPool>, event_sender: Arc<EventSender>) -> Self {
        Self {
            db_pool,
            event_sender,
        }
    }

    /// Applies each assignment it can and reports the rest as skipped.
    /// Location writes and the receipt write commit together.
    #[instrument(skip(self, entries), fields(entries = entries.len()))]
    pub async fn assign_location(
        &self,
        grn_id: Uuid,
        entries: Vec<LocationAssignment>,
    ) -> Result<AssignmentReport, ServiceError> {
        let txn = self.db_pool.begin().await?;

        let mut document = Grn::find_by_id(grn_id)
            .one(&txn)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("GRN with ID {} not found.", grn_id)))?;

        let mut report = AssignmentReport::new(grn_id);
        let now = Utc::now();

        for entry in entries {
            if document.item(entry.item_id).is_none() {
                report.skipped(entry.item_id, format!("Item {} not found", entry.item_id));
                continue;
            }
            if entry.capacity < 0 || entry.current_load < 0 {
                report.skipped(entry.item_id, "Invalid capacity value".to_string());
                continue;
            }

            let Some(target) = Self::find_by_code(&txn, entry.location_code.trim()).await? else {
                report.skipped(
                    entry.item_id,
                    format!("Location {} not found", entry.location_code),
                );
                continue;
            };

            if entry.current_load > entry.capacity {
                warn!(
                    location_code = %target.location_code,
                    capacity = entry.capacity,
                    current_load = entry.current_load,
                    "Location load exceeds capacity"
                );
            }

            let mut active: location::ActiveModel = target.into();
            active.capacity = Set(entry.capacity);
            active.current_load = Set(entry.current_load);
            active.updated_at = Set(now);
            active.update(&txn).await?;

            if let Some(item) = document.item_mut(entry.item_id) {
                item.dock_code = entry.new_location.trim().to_string();
            }
            report.applied(entry.item_id);
        }

        if report.applied > 0 {
            document.into_document_update().update(&txn).await?;
        }
        txn.commit().await?;

        info!(
            grn_id = %grn_id,
            applied = report.applied,
            skipped = report.skipped,
            "Locations assigned"
        );
        self.event_sender.send_or_log(Event::LocationsAssigned {
            grn_id,
            applied: report.applied,
            skipped: report.skipped,
        });

        Ok(report)
    }

    async fn find_by_code<C: ConnectionTrait>(
        conn: &C,
        location_code: &str,
    ) -> Result<Option<location::Model>, ServiceError> {
        Ok(Location::find()
            .filter(location::Column::LocationCode.eq(location_code))
            .one(conn)
            .await?)
    }

    async fn get_location(&self, location_id: Uuid) -> Result<location::Model, ServiceError> {
        Location::find_by_id(location_id)
            .one(&*self.db_pool)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Location {} not found", location_id)))
    }

    #[instrument(skip(self))]
    pub async fn create_location(
        &self,
        input: CreateLocationInput,
    ) -> Result<location::Model, ServiceError> {
        let location_code = input.location_code.trim().to_string();
        if location_code.is_empty() {
            return Err(ServiceError::ValidationError(
                "locationCode is required".to_string(),
            ));
        }
        if input.capacity < 0 {
            return Err(invalid_capacity());
        }

        const DUPLICATE: &str = "Location code already exists.";
        if Self::find_by_code(&*self.db_pool, &location_code).await?.is_some() {
            return Err(ServiceError::Conflict(DUPLICATE.to_string()));
        }

        let now = Utc::now();
        let created = location::ActiveModel {
            id: Set(Uuid::new_v4()),
            location_code: Set(location_code),
            capacity: Set(input.capacity),
            current_load: Set(0),
            stock: Set(0),
            products: Set(Default::default()),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&*self.db_pool)
        .await
        .map_err(|e| ServiceError::from_write_error(e, DUPLICATE))?;

        info!(location_id = %created.id, location_code = %created.location_code, "Location created");
        Ok(created)
    }

    pub async fn list_locations(&self) -> Result<Vec<location::Model>, ServiceError> {
        Ok(Location::find()
            .order_by_asc(location::Column::LocationCode)
            .all(&*self.db_pool)
            .await?)
    }

    #[instrument(skip(self))]
    pub async fn update_stock(
        &self,
        location_id: Uuid,
        stock: i32,
    ) -> Result<location::Model, ServiceError> {
        let mut active: location::ActiveModel = self.get_location(location_id).await?.into();
        active.stock = Set(stock);
        active.updated_at = Set(Utc::now());
        Ok(active.update(&*self.db_pool).await?)
    }

    #[instrument(skip(self))]
    pub async fn update_capacity(
        &self,
        location_id: Uuid,
        capacity: i32,
    ) -> Result<location::Model, ServiceError> {
        if capacity < 0 {
            return Err(invalid_capacity());
        }

        let current = self.get_location(location_id).await?;
        if current.current_load > capacity {
            warn!(
                location_id = %location_id,
                capacity,
                current_load = current.current_load,
                "New capacity is below the current load"
            );
        }

        let mut active: location::ActiveModel = current.into();
        active.capacity = Set(capacity);
        active.updated_at = Set(Utc::now());
        Ok(active.update(&*self.db_pool).await?)
    }

    /// Sets the absolute quantity of a product held at a location.
    #[instrument(skip(self))]
    pub async fn set_location_product(
        &self,
        location_id: Uuid,
        product_id: Uuid,
        quantity: i32,
    ) -> Result<location::Model, ServiceError> {
        if quantity < 0 {
            return Err(ServiceError::ValidationError(
                "Quantity cannot be negative".to_string(),
            ));
        }

        let mut current = self.get_location(location_id).await?;
        if Product::find_by_id(product_id)
            .count(&*self.db_pool)
            .await?
            == 0
        {
            return Err(ServiceError::NotFound(format!(
                "Product {} not found",
                product_id
            )));
        }

        current.products.set(product_id, quantity);
        let products = current.products.clone();

        let mut active: location::ActiveModel = current.into();
        active.products = Set(products);
        active.updated_at = Set(Utc::now());
        Ok(active.update(&*self.db_pool).await?)
    }

    #[instrument(skip(self))]
    pub async fn create_dock_location(
        &self,
        input: CreateDockLocationInput,
    ) -> Result<dock_location::Model, ServiceError> {
        let dock_code = input.dock_code.trim().to_string();
        let location_code = input.location_code.trim().to_string();
        if dock_code.is_empty() || location_code.is_empty() {
            return Err(ServiceError::ValidationError(
                "dockCode and locationCode are required".to_string(),
            ));
        }
        if input.capacity < 0 {
            return Err(invalid_capacity());
        }

        const DUPLICATE_DOCK: &str = "Dock code already exists.";
        const DUPLICATE_LOCATION: &str = "Location code already exists.";

        let dock_taken = DockLocation::find()
            .filter(dock_location::Column::DockCode.eq(dock_code.as_str()))
            .count(&*self.db_pool)
            .await?;
        if dock_taken > 0 {
            return Err(ServiceError::Conflict(DUPLICATE_DOCK.to_string()));
        }

        let location_taken = DockLocation::find()
            .filter(dock_location::Column::LocationCode.eq(location_code.as_str()))
            .count(&*self.db_pool)
            .await?;
        if location_taken > 0 {
            return Err(ServiceError::Conflict(DUPLICATE_LOCATION.to_string()));
        }

        let now = Utc::now();
        let created = dock_location::ActiveModel {
            id: Set(Uuid::new_v4()),
            dock_code: Set(dock_code),
            capacity: Set(input.capacity),
            description: Set(input
                .description
                .map(|text| text.trim().to_string())
                .filter(|text| !text.is_empty())),
            location_code: Set(location_code),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&*self.db_pool)
        .await
        .map_err(|e| ServiceError::from_write_error(e, DUPLICATE_DOCK))?;

        info!(dock_location_id = %created.id, dock_code = %created.dock_code, "Dock location created");
        Ok(created)
    }

    pub async fn list_dock_locations(&self) -> Result<Vec<dock_location::Model>, ServiceError> {
        Ok(DockLocation::find()
            .order_by_asc(dock_location::Column::DockCode)
            .all(&*self.db_pool)
            .await?)
    }

    #[instrument(skip(self))]
    pub async fn delete_dock_location(&self, dock_location_id: Uuid) -> Result<(), ServiceError> {
        let result = DockLocation::delete_by_id(dock_location_id)
            .exec(&*self.db_pool)
            .await?;
        if result.rows_affected == 0 {
            return Err(ServiceError::NotFound(format!(
                "Dock location {} not found",
                dock_location_id
            )));
        }
        info!(dock_location_id = %dock_location_id, "Dock location deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn report_counts_outcomes() {
        let grn_id = Uuid::new_v4();
        let mut report = AssignmentReport::new(grn_id);
        report.applied(Uuid::new_v4());
        report.skipped(Uuid::new_v4(), "Location X not found".into());
        report.applied(Uuid::new_v4());

        assert_eq!(report.applied, 2);
        assert_eq!(report.skipped, 1);
        assert_eq!(report.outcomes[1].outcome, AssignmentResult::Skipped);
    }

    #[test]
    fn skipped_outcome_serializes_reason_only_when_present() {
        let mut report = AssignmentReport::new(Uuid::new_v4());
        report.applied(Uuid::new_v4());
        report.skipped(Uuid::new_v4(), "Item missing".into());

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["outcomes"][0]["outcome"], "Applied");
        assert!(json["outcomes"][0].get("reason").is_none());
        assert_eq!(json["outcomes"][1]["reason"], "Item missing");
    }
}
