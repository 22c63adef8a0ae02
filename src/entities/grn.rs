use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use sea_orm::ActiveValue::{Set, Unchanged};
use sea_orm::FromJsonQueryResult;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::errors::ServiceError;

/// Status shared by goods receipts and their line items.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Default,
    EnumIter,
    DeriveActiveEnum,
    Serialize,
    Deserialize,
    ToSchema,
    strum::Display,
    strum::EnumString,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
pub enum ReceiptStatus {
    #[default]
    #[sea_orm(string_value = "Pending")]
    Pending,
    #[sea_orm(string_value = "OK")]
    #[serde(rename = "OK")]
    #[strum(serialize = "OK")]
    Ok,
    #[sea_orm(string_value = "Rejected")]
    Rejected,
}

impl ReceiptStatus {
    /// Final verdicts a receipt header may be moved to through a header update.
    pub fn is_verdict(self) -> bool {
        matches!(self, ReceiptStatus::Ok | ReceiptStatus::Rejected)
    }
}

/// One received line, embedded in its receipt document.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct GrnItem {
    pub id: Uuid,
    pub item_no: String,
    pub description: String,
    pub quantity: i32,
    pub serial_number: String,
    pub invoice_no: String,
    pub dock_code: String,
    pub receiving_date: DateTime<Utc>,
    #[serde(default)]
    pub status: ReceiptStatus,
    #[serde(default)]
    pub ok_quantity: i32,
    #[serde(default)]
    pub rejected_quantity: i32,
    #[serde(default)]
    pub current_quantity: i32,
    #[serde(default)]
    pub dispatched_quantity: i32,
    /// Unit price, filled in by the price backfill.
    #[serde(default)]
    pub amount: Option<Decimal>,
}

/// Partial update of an item's quantity split; absent fields keep their current value.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct QuantitySplit {
    pub ok_quantity: Option<i32>,
    pub rejected_quantity: Option<i32>,
    pub current_quantity: Option<i32>,
}

impl QuantitySplit {
    pub fn is_empty(&self) -> bool {
        self.ok_quantity.is_none()
            && self.rejected_quantity.is_none()
            && self.current_quantity.is_none()
    }
}

pub const QUANTITY_CEILING_MESSAGE: &str = "Total OK and Rejected quantities cannot exceed Item Quantity";
pub const RECEIPT_TOTAL_OVERFLOW_MESSAGE: &str = "Receipt quantity totals are out of range";

impl GrnItem {
    /// Applies `split` after checking the merged values; on error the item is untouched.
    pub fn apply_split(&mut self, split: QuantitySplit) -> Result<(), ServiceError> {
        let ok = split.ok_quantity.unwrap_or(self.ok_quantity);
        let rejected = split.rejected_quantity.unwrap_or(self.rejected_quantity);
        let current = split.current_quantity.unwrap_or(self.current_quantity);

        if ok < 0 || rejected < 0 || current < 0 {
            return Err(ServiceError::ValidationError(
                "Quantities cannot be negative".to_string(),
            ));
        }
        if i64::from(ok) + i64::from(rejected) > i64::from(self.quantity) {
            return Err(ServiceError::ValidationError(
                QUANTITY_CEILING_MESSAGE.to_string(),
            ));
        }

        self.ok_quantity = ok;
        self.rejected_quantity = rejected;
        self.current_quantity = current;
        Ok(())
    }
}

#[derive(Clone, Debug, PartialEq, Default, Serialize, Deserialize, FromJsonQueryResult)]
pub struct GrnItems(pub Vec<GrnItem>);

impl GrnItems {
    /// Item ids must be unique inside one receipt.
    pub fn has_unique_ids(&self) -> bool {
        let mut seen = HashSet::with_capacity(self.0.len());
        self.0.iter().all(|item| seen.insert(item.id))
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "grns")]
#[serde(rename_all = "camelCase")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub po_number: String,
    #[sea_orm(unique)]
    pub receiving_no: String,
    pub status: ReceiptStatus,
    pub receiving_date: DateTime<Utc>,
    pub supplier: String,
    pub ok_quantity: i32,
    pub rejected_quantity: i32,
    #[sea_orm(column_type = "Json")]
    pub items: GrnItems,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    pub fn item(&self, item_id: Uuid) -> Option<&GrnItem> {
        self.items.0.iter().find(|item| item.id == item_id)
    }

    pub fn item_mut(&mut self, item_id: Uuid) -> Option<&mut GrnItem> {
        self.items.0.iter_mut().find(|item| item.id == item_id)
    }

    /// OK and rejected sums over the items, `None` if either overflows.
    fn item_sums(&self) -> Option<(i32, i32)> {
        self.items.0.iter().try_fold((0i32, 0i32), |(ok, rejected), item| {
            Some((
                ok.checked_add(item.ok_quantity)?,
                rejected.checked_add(item.rejected_quantity)?,
            ))
        })
    }

    /// Recomputes the receipt-level sums from the items. On overflow the
    /// sums are left as they were.
    pub fn recompute_totals(&mut self) -> Result<(), ServiceError> {
        let (ok, rejected) = self.item_sums().ok_or_else(|| {
            ServiceError::ValidationError(RECEIPT_TOTAL_OVERFLOW_MESSAGE.to_string())
        })?;
        self.ok_quantity = ok;
        self.rejected_quantity = rejected;
        Ok(())
    }

    /// Removes the first item carrying `item_no`.
    pub fn remove_item_by_no(&mut self, item_no: &str) -> Option<GrnItem> {
        let position = self.items.0.iter().position(|item| item.item_no == item_no)?;
        let removed = self.items.0.remove(position);
        // a subset of sums that fit still fits
        if let Some((ok, rejected)) = self.item_sums() {
            self.ok_quantity = ok;
            self.rejected_quantity = rejected;
        }
        Some(removed)
    }

    /// Sets the dock code of every listed item and returns how many matched.
    pub fn assign_dock_code(&mut self, item_ids: &[Uuid], dock_code: &str) -> usize {
        let wanted: HashSet<&Uuid> = item_ids.iter().collect();
        let mut matched = 0;
        for item in self.items.0.iter_mut().filter(|item| wanted.contains(&item.id)) {
            item.dock_code = dock_code.to_string();
            matched += 1;
        }
        matched
    }

    /// Active model that rewrites the whole document in one update.
    pub fn into_document_update(self) -> ActiveModel {
        ActiveModel {
            id: Unchanged(self.id),
            po_number: Set(self.po_number),
            receiving_no: Set(self.receiving_no),
            status: Set(self.status),
            receiving_date: Set(self.receiving_date),
            supplier: Set(self.supplier),
            ok_quantity: Set(self.ok_quantity),
            rejected_quantity: Set(self.rejected_quantity),
            items: Set(self.items),
            created_at: Unchanged(self.created_at),
            updated_at: Set(Utc::now()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use rstest::rstest;

    fn item(item_no: &str, quantity: i32) -> GrnItem {
        GrnItem {
            id: Uuid::new_v4(),
            item_no: item_no.to_string(),
            description: String::new(),
            quantity,
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
        }
    }

    fn receipt(items: Vec<GrnItem>) -> Model {
        Model {
            id: Uuid::new_v4(),
            po_number: "PO1".into(),
            receiving_no: "R1".into(),
            status: ReceiptStatus::Pending,
            receiving_date: Utc::now(),
            supplier: String::new(),
            ok_quantity: 0,
            rejected_quantity: 0,
            items: GrnItems(items),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[rstest]
    #[case(Some(7), Some(4), false)]
    #[case(Some(6), Some(4), true)]
    #[case(Some(10), None, true)]
    #[case(None, Some(11), false)]
    #[case(Some(-1), None, false)]
    fn split_respects_item_quantity(
        #[case] ok: Option<i32>,
        #[case] rejected: Option<i32>,
        #[case] accepted: bool,
    ) {
        let mut line = item("A1", 10);
        let before = line.clone();
        let result = line.apply_split(QuantitySplit {
            ok_quantity: ok,
            rejected_quantity: rejected,
            current_quantity: None,
        });

        assert_eq!(result.is_ok(), accepted);
        if !accepted {
            assert_eq!(line, before);
        }
    }

    #[test]
    fn split_merges_with_current_values() {
        let mut line = item("A1", 10);
        line.ok_quantity = 8;
        let err = line
            .apply_split(QuantitySplit {
                rejected_quantity: Some(3),
                ..Default::default()
            })
            .unwrap_err();
        assert_matches!(err, ServiceError::ValidationError(msg) if msg == QUANTITY_CEILING_MESSAGE);
    }

    #[test]
    fn totals_follow_items() {
        let mut a = item("A1", 10);
        a.ok_quantity = 6;
        a.rejected_quantity = 4;
        let mut b = item("B2", 5);
        b.ok_quantity = 5;
        let mut grn = receipt(vec![a, b]);

        grn.recompute_totals().unwrap();
        assert_eq!(grn.ok_quantity, 11);
        assert_eq!(grn.rejected_quantity, 4);

        grn.remove_item_by_no("A1").unwrap();
        assert_eq!(grn.ok_quantity, 5);
        assert_eq!(grn.rejected_quantity, 0);
    }

    #[test]
    fn totals_that_overflow_are_rejected() {
        let mut a = item("A1", i32::MAX);
        a.ok_quantity = i32::MAX;
        let mut b = item("A2", i32::MAX);
        b.ok_quantity = 1;
        let mut grn = receipt(vec![a, b]);
        grn.ok_quantity = 7;

        let err = grn.recompute_totals().unwrap_err();
        assert_matches!(err, ServiceError::ValidationError(msg) if msg == RECEIPT_TOTAL_OVERFLOW_MESSAGE);
        assert_eq!(grn.ok_quantity, 7);
    }

    #[test]
    fn remove_unknown_item_keeps_items() {
        let mut grn = receipt(vec![item("A1", 1), item("A1", 2)]);
        assert!(grn.remove_item_by_no("Z9").is_none());
        assert_eq!(grn.items.0.len(), 2);

        let removed = grn.remove_item_by_no("A1").unwrap();
        assert_eq!(removed.quantity, 1);
        assert_eq!(grn.items.0.len(), 1);
    }

    #[test]
    fn dock_assignment_ignores_unknown_ids() {
        let first = item("A1", 1);
        let second = item("B2", 1);
        let ids = vec![first.id, Uuid::new_v4()];
        let mut grn = receipt(vec![first, second]);

        assert_eq!(grn.assign_dock_code(&ids, "D-01"), 1);
        assert_eq!(grn.items.0[0].dock_code, "D-01");
        assert_eq!(grn.items.0[1].dock_code, "");
    }

    #[test]
    fn duplicate_item_ids_are_detected() {
        let line = item("A1", 1);
        assert!(!GrnItems(vec![line.clone(), line.clone()]).has_unique_ids());
        assert!(GrnItems(vec![line]).has_unique_ids());
    }

    #[test]
    fn status_uses_wire_spelling() {
        assert_eq!(
            serde_json::to_string(&ReceiptStatus::Ok).unwrap(),
            "\"OK\""
        );
        assert_eq!("OK".parse::<ReceiptStatus>().unwrap(), ReceiptStatus::Ok);
        assert!("Done".parse::<ReceiptStatus>().is_err());
        assert!(!ReceiptStatus::Pending.is_verdict());
    }
}
