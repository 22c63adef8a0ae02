//! Goods receipt notes and their line items.
//!
//! A receipt is stored as one document: header columns plus the embedded item
//! list. Every item mutation loads the document, applies the change together
//! with the recomputed receipt sums and writes it back in a single update.

use chrono::{DateTime, Utc};
use metrics::counter;
use rust_decimal::Decimal;
use sea_orm::{
    sea_query::{Expr, Func, LikeExpr},
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::str::FromStr;
use std::sync::Arc;
use tracing::{info, instrument, warn};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::{
    db::DbPool,
    entities::grn::{self, Entity as Grn, GrnItem, GrnItems, QuantitySplit, ReceiptStatus},
    errors::ServiceError,
    events::{Event, EventSender},
    services::master_list::MasterListService,
};

const MISSING_FIELDS_MESSAGE: &str = "Missing required fields or invalid items array.";

/// Line item as submitted on receipt creation.
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct NewGrnItem {
    #[serde(default)]
    #[validate(length(min = 1, message = "itemNo is required"))]
    pub item_no: String,
    #[serde(default)]
    pub description: String,
    #[validate(range(min = 1, message = "quantity must be at least 1"))]
    pub quantity: i32,
    #[serde(default)]
    pub serial_number: String,
    #[serde(default)]
    pub invoice_no: String,
    #[serde(default)]
    pub dock_code: String,
    pub receiving_date: Option<DateTime<Utc>>,
    pub amount: Option<Decimal>,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateGrnInput {
    #[serde(default)]
    #[validate(length(min = 1, message = "poNumber is required"))]
    pub po_number: String,
    #[serde(default)]
    #[validate(length(min = 1, message = "receivingNo is required"))]
    pub receiving_no: String,
    #[serde(default)]
    pub supplier: String,
    pub receiving_date: Option<DateTime<Utc>>,
    pub status: Option<ReceiptStatus>,
    #[serde(default)]
    #[validate(length(min = 1, message = "items must not be empty"))]
    #[validate]
    pub items: Vec<NewGrnItem>,
}

/// Header fields that may be edited after creation.
#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct GrnHeaderUpdate {
    #[validate(length(min = 1))]
    pub po_number: Option<String>,
    pub supplier: Option<String>,
    pub receiving_date: Option<DateTime<Utc>>,
    pub status: Option<ReceiptStatus>,
}

#[derive(Debug, Clone, Default)]
pub struct GrnListFilter {
    pub status: Option<ReceiptStatus>,
    /// Case-insensitive substring of the purchase order number.
    pub po_number: Option<String>,
}

/// Service for goods receipt notes
#[derive(Clone)]
pub struct GrnService {
    db_pool: Arc<DbPool>,
    event_sender: Arc<EventSender>,
    master_list: Arc<MasterListService>,
}

fn grn_not_found(grn_id: Uuid) -> ServiceError {
    ServiceError::NotFound(format!("GRN with ID {} not found.", grn_id))
}

fn item_not_found(grn_id: Uuid, item_id: Uuid) -> ServiceError {
    ServiceError::NotFound(format!("Item {} not found in GRN {}.", item_id, grn_id))
}

fn ensure_unique_item_ids(items: &GrnItems) -> Result<(), ServiceError> {
    if items.has_unique_ids() {
        Ok(())
    } else {
        Err(ServiceError::InternalError(
            "GRN items must have unique ids".to_string(),
        ))
    }
}

fn escape_like(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for ch in raw.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped
}

impl GrnService {
    pub fn new(
        db_pool: Arc<DbPool>,
        event_sender: Arc<EventSender>,
        master_list: Arc<MasterListService>,
    ) -> Self {
        Self {
            db_pool,
            event_sender,
            master_list,
        }
    }

    /// Creates a receipt once every item number passes the master list gate.
    #[instrument(skip(self, input), fields(po_number = %input.po_number, receiving_no = %input.receiving_no))]
    pub async fn create(&self, input: CreateGrnInput) -> Result<grn::Model, ServiceError> {
        let po_number = input.po_number.trim().to_string();
        let receiving_no = input.receiving_no.trim().to_string();
        if po_number.is_empty() || receiving_no.is_empty() || input.items.is_empty() {
            return Err(ServiceError::ValidationError(
                MISSING_FIELDS_MESSAGE.to_string(),
            ));
        }
        if input
            .items
            .iter()
            .any(|item| item.item_no.trim().is_empty() || item.quantity < 1)
        {
            return Err(ServiceError::ValidationError(
                MISSING_FIELDS_MESSAGE.to_string(),
            ));
        }

        {
            let item_nos: Vec<&str> = input
                .items
                .iter()
                .map(|item| item.item_no.trim())
                .collect();
            self.master_list.ensure_known(&item_nos).await?;
        }

        let duplicate = format!("GRN with receiving number {} already exists", receiving_no);
        let existing = Grn::find()
            .filter(grn::Column::ReceivingNo.eq(receiving_no.as_str()))
            .count(&*self.db_pool)
            .await?;
        if existing > 0 {
            return Err(ServiceError::Conflict(duplicate));
        }

        let now = Utc::now();
        let receiving_date = input.receiving_date.unwrap_or(now);
        let items: Vec<GrnItem> = input
            .items
            .into_iter()
            .map(|item| GrnItem {
                id: Uuid::new_v4(),
                item_no: item.item_no.trim().to_string(),
                description: item.description,
                quantity: item.quantity,
                serial_number: item.serial_number,
                invoice_no: item.invoice_no,
                dock_code: item.dock_code,
                receiving_date: item.receiving_date.unwrap_or(receiving_date),
                status: ReceiptStatus::Pending,
                ok_quantity: 0,
                rejected_quantity: 0,
                current_quantity: 0,
                dispatched_quantity: 0,
                amount: item.amount,
            })
            .collect();
        let items = GrnItems(items);
        ensure_unique_item_ids(&items)?;
        let item_count = items.0.len();

        let created = grn::ActiveModel {
            id: Set(Uuid::new_v4()),
            po_number: Set(po_number),
            receiving_no: Set(receiving_no.clone()),
            status: Set(input.status.unwrap_or_default()),
            receiving_date: Set(receiving_date),
            supplier: Set(input.supplier.trim().to_string()),
            ok_quantity: Set(0),
            rejected_quantity: Set(0),
            items: Set(items),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&*self.db_pool)
        .await
        .map_err(|e| ServiceError::from_write_error(e, duplicate))?;

        counter!("warehouse_grn.created", 1);
        info!(grn_id = %created.id, item_count, "GRN created");
        self.event_sender.send_or_log(Event::GrnCreated {
            grn_id: created.id,
            receiving_no,
            item_count,
        });

        Ok(created)
    }

    #[instrument(skip(self))]
    pub async fn get(&self, grn_id: Uuid) -> Result<grn::Model, ServiceError> {
        Self::find_document(&*self.db_pool, grn_id).await
    }

    async fn find_document<C: ConnectionTrait>(
        conn: &C,
        grn_id: Uuid,
    ) -> Result<grn::Model, ServiceError> {
        Grn::find_by_id(grn_id)
            .one(conn)
            .await?
            .ok_or_else(|| grn_not_found(grn_id))
    }

    /// Lists receipts newest first; `page` is 1-based.
    #[instrument(skip(self))]
    pub async fn list(
        &self,
        filter: GrnListFilter,
        page: u64,
        limit: u64,
    ) -> Result<(Vec<grn::Model>, u64), ServiceError> {
        if page == 0 {
            return Err(ServiceError::ValidationError(
                "Page number must be greater than 0".to_string(),
            ));
        }
        if limit == 0 {
            return Err(ServiceError::ValidationError(
                "Limit must be greater than 0".to_string(),
            ));
        }

        let mut query = Grn::find();

        if let Some(status) = filter.status {
            query = query.filter(grn::Column::Status.eq(status));
        }

        if let Some(po_number) = filter
            .po_number
            .as_deref()
            .map(str::trim)
            .filter(|value| !value.is_empty())
        {
            let pattern = format!("%{}%", escape_like(&po_number.to_lowercase()));
            query = query.filter(
                Expr::expr(Func::lower(Expr::col(grn::Column::PoNumber)))
                    .like(LikeExpr::new(pattern).escape('\\')),
            );
        }

        let paginator = query
            .order_by_desc(grn::Column::CreatedAt)
            .paginate(&*self.db_pool, limit);

        let total = paginator.num_items().await?;
        let grns = paginator.fetch_page(page - 1).await?;

        Ok((grns, total))
    }

    /// Edits header fields; a status given here must be a final verdict.
    #[instrument(skip(self))]
    pub async fn update_header(
        &self,
        grn_id: Uuid,
        update: GrnHeaderUpdate,
    ) -> Result<grn::Model, ServiceError> {
        if let Some(status) = update.status {
            if !status.is_verdict() {
                return Err(ServiceError::ValidationError(
                    "Status must be either OK or Rejected".to_string(),
                ));
            }
        }

        let txn = self.db_pool.begin().await?;
        let mut document = Self::find_document(&txn, grn_id).await?;
        if let Some(po_number) = update.po_number {
            let po_number = po_number.trim().to_string();
            if po_number.is_empty() {
                return Err(ServiceError::ValidationError(
                    "poNumber cannot be blank".to_string(),
                ));
            }
            document.po_number = po_number;
        }
        if let Some(supplier) = update.supplier {
            document.supplier = supplier.trim().to_string();
        }
        if let Some(receiving_date) = update.receiving_date {
            document.receiving_date = receiving_date;
        }
        if let Some(status) = update.status {
            document.status = status;
        }

        let saved = Self::save(&txn, document).await?;
        txn.commit().await?;
        self.event_sender.send_or_log(Event::GrnUpdated(grn_id));
        Ok(saved)
    }

    /// Sets the receipt-level status.
    #[instrument(skip(self))]
    pub async fn set_status(
        &self,
        grn_id: Uuid,
        status: ReceiptStatus,
    ) -> Result<grn::Model, ServiceError> {
        let txn = self.db_pool.begin().await?;
        let mut document = Self::find_document(&txn, grn_id).await?;
        document.status = status;

        let saved = Self::save(&txn, document).await?;
        txn.commit().await?;
        self.event_sender.send_or_log(Event::GrnUpdated(grn_id));
        Ok(saved)
    }

    /// Sets an item's status and optionally its OK/rejected split.
    #[instrument(skip(self))]
    pub async fn update_item_status(
        &self,
        grn_id: Uuid,
        item_id: Uuid,
        status: ReceiptStatus,
        ok_quantity: Option<i32>,
        rejected_quantity: Option<i32>,
    ) -> Result<grn::Model, ServiceError> {
        let txn = self.db_pool.begin().await?;
        let mut document = Self::find_document(&txn, grn_id).await?;
        let item = document
            .item_mut(item_id)
            .ok_or_else(|| item_not_found(grn_id, item_id))?;

        item.apply_split(QuantitySplit {
            ok_quantity,
            rejected_quantity,
            current_quantity: None,
        })?;
        item.status = status;
        document.recompute_totals()?;

        let saved = Self::save(&txn, document).await?;
        txn.commit().await?;
        self.event_sender.send_or_log(Event::GrnItemStatusChanged {
            grn_id,
            item_id,
            status,
        });
        Ok(saved)
    }

    /// Updates any of an item's OK, rejected and current quantities.
    #[instrument(skip(self))]
    pub async fn update_item_quantities(
        &self,
        grn_id: Uuid,
        item_id: Uuid,
        split: QuantitySplit,
    ) -> Result<grn::Model, ServiceError> {
        if split.is_empty() {
            return Err(ServiceError::ValidationError(
                "At least one of okQuantity, rejectedQuantity or currentQuantity is required"
                    .to_string(),
            ));
        }

        let txn = self.db_pool.begin().await?;
        let mut document = Self::find_document(&txn, grn_id).await?;
        document
            .item_mut(item_id)
            .ok_or_else(|| item_not_found(grn_id, item_id))?
            .apply_split(split)?;
        document.recompute_totals()?;

        let saved = Self::save(&txn, document).await?;
        txn.commit().await?;
        self.event_sender.send_or_log(Event::GrnUpdated(grn_id));
        Ok(saved)
    }

    /// Moves one item to a dock and/or changes its status.
    #[instrument(skip(self))]
    pub async fn update_item_location(
        &self,
        grn_id: Uuid,
        item_id: Uuid,
        dock_code: Option<String>,
        status: Option<ReceiptStatus>,
    ) -> Result<grn::Model, ServiceError> {
        if dock_code.is_none() && status.is_none() {
            return Err(ServiceError::ValidationError(
                "dockLocation or status is required".to_string(),
            ));
        }

        let txn = self.db_pool.begin().await?;
        let mut document = Self::find_document(&txn, grn_id).await?;
        let item = document
            .item_mut(item_id)
            .ok_or_else(|| item_not_found(grn_id, item_id))?;
        if let Some(dock_code) = dock_code {
            item.dock_code = dock_code.trim().to_string();
        }
        if let Some(status) = status {
            item.status = status;
        }

        let saved = Self::save(&txn, document).await?;
        txn.commit().await?;
        if let Some(status) = status {
            self.event_sender.send_or_log(Event::GrnItemStatusChanged {
                grn_id,
                item_id,
                status,
            });
        }
        Ok(saved)
    }

    /// Removes the first item with `item_no`.
    #[instrument(skip(self))]
    pub async fn delete_item(&self, grn_id: Uuid, item_no: &str) -> Result<grn::Model, ServiceError> {
        let txn = self.db_pool.begin().await?;
        let mut document = Self::find_document(&txn, grn_id).await?;
        if document.remove_item_by_no(item_no).is_none() {
            return Err(ServiceError::NotFound(format!(
                "Item with itemNo {} not found in GRN {}.",
                item_no, grn_id
            )));
        }
        if document.items.0.is_empty() {
            warn!(grn_id = %grn_id, "GRN has no items left");
        }

        let saved = Self::save(&txn, document).await?;
        txn.commit().await?;
        self.event_sender.send_or_log(Event::GrnItemRemoved {
            grn_id,
            item_no: item_no.to_string(),
        });
        Ok(saved)
    }

    /// Points the listed items at `dock_location`; unknown ids are ignored.
    #[instrument(skip(self))]
    pub async fn update_dock_location(
        &self,
        grn_id: Uuid,
        item_ids: &[Uuid],
        dock_location: &str,
    ) -> Result<grn::Model, ServiceError> {
        let dock_location = dock_location.trim();
        if dock_location.is_empty() {
            return Err(ServiceError::ValidationError(
                "dockLocation is required".to_string(),
            ));
        }

        let txn = self.db_pool.begin().await?;
        let mut document = Self::find_document(&txn, grn_id).await?;
        let matched = document.assign_dock_code(item_ids, dock_location);
        if matched < item_ids.len() {
            warn!(
                grn_id = %grn_id,
                requested = item_ids.len(),
                matched,
                "Some item ids were not found on the GRN"
            );
        }

        let saved = Self::save(&txn, document).await?;
        txn.commit().await?;
        self.event_sender.send_or_log(Event::GrnUpdated(grn_id));
        Ok(saved)
    }

    #[instrument(skip(self))]
    pub async fn delete(&self, grn_id: Uuid) -> Result<(), ServiceError> {
        let result = Grn::delete_by_id(grn_id).exec(&*self.db_pool).await?;
        if result.rows_affected == 0 {
            return Err(grn_not_found(grn_id));
        }

        info!(grn_id = %grn_id, "GRN deleted");
        self.event_sender.send_or_log(Event::GrnDeleted(grn_id));
        Ok(())
    }

    /// Fills item unit prices from a price table keyed by item number.
    /// Returns how many items were updated.
    #[instrument(skip(self, prices), fields(price_count = prices.len()))]
    pub async fn backfill_amounts(
        &self,
        prices: &HashMap<String, Decimal>,
    ) -> Result<usize, ServiceError> {
        let mut updated = 0;

        for mut document in Grn::find().all(&*self.db_pool).await? {
            let mut changed = 0;
            for item in document.items.0.iter_mut() {
                if let Some(amount) = prices.get(item.item_no.trim()) {
                    if item.amount != Some(*amount) {
                        item.amount = Some(*amount);
                        changed += 1;
                    }
                }
            }

            if changed > 0 {
                let grn_id = document.id;
                Self::save(&*self.db_pool, document).await?;
                info!(grn_id = %grn_id, changed, "Backfilled item amounts");
                updated += changed;
            }
        }

        Ok(updated)
    }

    async fn save<C: ConnectionTrait>(
        conn: &C,
        document: grn::Model,
    ) -> Result<grn::Model, ServiceError> {
        ensure_unique_item_ids(&document.items)?;
        let receiving_no = document.receiving_no.clone();
        document
            .into_document_update()
            .update(conn)
            .await
            .map_err(|e| {
                ServiceError::from_write_error(
                    e,
                    format!("GRN with receiving number {} already exists", receiving_no),
                )
            })
    }
}

/// Parses an amount such as `"1,234.50"`, ignoring thousands separators.
pub fn parse_amount(raw: &str) -> Option<Decimal> {
    let cleaned: String = raw.chars().filter(|c| *c != ',').collect();
    let cleaned = cleaned.trim();
    if cleaned.is_empty() {
        return None;
    }
    Decimal::from_str(cleaned).ok()
}

fn cell_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(text) => Some(text.trim().to_string()),
        Value::Number(number) => Some(number.to_string()),
        _ => None,
    }
}

/// Reads a price table of `{"Item No.": .., "Amount": ..}` rows.
/// Rows with a missing item number or an unparseable amount are skipped with a warning.
pub fn parse_price_table(table: &Value) -> Result<HashMap<String, Decimal>, ServiceError> {
    let rows = table.as_array().ok_or_else(|| {
        ServiceError::ValidationError("Price table must be a JSON array".to_string())
    })?;

    let mut prices = HashMap::with_capacity(rows.len());
    for (index, row) in rows.iter().enumerate() {
        let item_no = row
            .get("Item No.")
            .and_then(cell_to_string)
            .filter(|item_no| !item_no.is_empty());
        let amount = row
            .get("Amount")
            .and_then(cell_to_string)
            .and_then(|raw| parse_amount(&raw));

        match (item_no, amount) {
            (Some(item_no), Some(amount)) => {
                prices.insert(item_no, amount);
            }
            _ => warn!(row = index, "Skipping unusable price row"),
        }
    }

    Ok(prices)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use serde_json::json;

    #[test]
    fn amounts_ignore_thousands_separators() {
        assert_eq!(parse_amount("1,234.50"), Some(dec!(1234.50)));
        assert_eq!(parse_amount(" 12 "), Some(dec!(12)));
        assert_eq!(parse_amount(""), None);
        assert_eq!(parse_amount("n/a"), None);
    }

    #[test]
    fn price_table_accepts_numeric_cells_and_skips_bad_rows() {
        let table = json!([
            {"Item No.": "A1", "Amount": "1,000.25"},
            {"Item No.": 4711, "Amount": 3.5},
            {"Item No.": "", "Amount": "5"},
            {"Item No.": "B2"},
        ]);

        let prices = parse_price_table(&table).unwrap();
        assert_eq!(prices.len(), 2);
        assert_eq!(prices["A1"], dec!(1000.25));
        assert_eq!(prices["4711"], dec!(3.5));
    }

    #[test]
    fn price_table_must_be_an_array() {
        assert!(parse_price_table(&json!({"Item No.": "A1"})).is_err());
    }

    #[test]
    fn repeated_item_ids_are_refused() {
        let line = GrnItem {
            id: Uuid::new_v4(),
            item_no: "A1".to_string(),
            description: String::new(),
            quantity: 1,
            serial_number: String::new(),
            invoice_no: String::new(),
            dock_code: String::new(),
            receiving_date: Utc::now(),
            status: ReceiptStatus::Pending,
            ok_quantity: 0,
            rejected_quantity: 0,
            current_quantity: 0,
            dispatched_quantity: 0,
            amount: None,
        };

        assert!(ensure_unique_item_ids(&GrnItems(vec![line.clone()])).is_ok());
        assert!(matches!(
            ensure_unique_item_ids(&GrnItems(vec![line.clone(), line])),
            Err(ServiceError::InternalError(_))
        ));
    }

    #[test]
    fn like_patterns_are_escaped() {
        assert_eq!(escape_like("PO_10%"), "PO\\_10\\%");
    }
}
