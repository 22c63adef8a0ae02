//! Property-based tests for receipt reconciliation and the stock ledger.
//!
//! These exercise the in-memory document operations across a wide range of
//! quantities; the HTTP tests cover the same rules end to end.

use chrono::Utc;
use proptest::prelude::*;
use uuid::Uuid;
use warehouse_api::entities::{
    grn::{self, GrnItem, GrnItems, QuantitySplit, ReceiptStatus},
    location::ProductAllocations,
};
use warehouse_api::services::master_list::normalize_item_nos;

fn line(quantity: i32) -> GrnItem {
    GrnItem {
        id: Uuid::new_v4(),
        item_no: "A1".to_string(),
        description: String::new(),
        quantity,
        serial_number: String::new(),
        invoice_no: String::new(),
        dock_code: "D1".to_string(),
        receiving_date: Utc::now(),
        status: ReceiptStatus::Pending,
        ok_quantity: 0,
        rejected_quantity: 0,
        current_quantity: 0,
        dispatched_quantity: 0,
        amount: None,
    }
}

fn receipt(items: Vec<GrnItem>) -> grn::Model {
    grn::Model {
        id: Uuid::new_v4(),
        po_number: "PO1".to_string(),
        receiving_no: "R1".to_string(),
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

fn split_strategy() -> impl Strategy<Value = QuantitySplit> {
    (
        proptest::option::of(-5i32..200),
        proptest::option::of(-5i32..200),
        proptest::option::of(0i32..200),
    )
        .prop_map(|(ok_quantity, rejected_quantity, current_quantity)| QuantitySplit {
            ok_quantity,
            rejected_quantity,
            current_quantity,
        })
}

// Property: an item's OK plus rejected never exceeds its quantity
proptest! {
    #![proptest_config(ProptestConfig::with_cases(500))]

    #[test]
    fn split_never_breaks_the_quantity_ceiling(
        quantity in 1i32..150,
        splits in proptest::collection::vec(split_strategy(), 1..10),
    ) {
        let mut item = line(quantity);
        for split in splits {
            let before = item.clone();
            match item.apply_split(split) {
                Ok(()) => {
                    prop_assert!(item.ok_quantity >= 0 && item.rejected_quantity >= 0);
                }
                Err(_) => prop_assert_eq!(&item, &before),
            }
            prop_assert!(item.ok_quantity + item.rejected_quantity <= item.quantity);
        }
    }

    #[test]
    fn header_totals_equal_item_sums(
        quantities in proptest::collection::vec(1i32..100, 1..12),
        fractions in proptest::collection::vec((0u8..=100, 0u8..=100), 12),
    ) {
        let mut document = receipt(quantities.iter().copied().map(line).collect());
        for (item, (ok_pct, rejected_pct)) in document.items.0.iter_mut().zip(fractions) {
            let ok = item.quantity * i32::from(ok_pct) / 100;
            let rejected = (item.quantity - ok) * i32::from(rejected_pct) / 100;
            item.apply_split(QuantitySplit {
                ok_quantity: Some(ok),
                rejected_quantity: Some(rejected),
                current_quantity: None,
            })
            .unwrap();
        }
        document.recompute_totals().unwrap();

        let ok_sum: i32 = document.items.0.iter().map(|item| item.ok_quantity).sum();
        let rejected_sum: i32 = document.items.0.iter().map(|item| item.rejected_quantity).sum();
        prop_assert_eq!(document.ok_quantity, ok_sum);
        prop_assert_eq!(document.rejected_quantity, rejected_sum);

        if let Some(first_no) = document.items.0.first().map(|item| item.item_no.clone()) {
            document.remove_item_by_no(&first_no);
            let ok_sum: i32 = document.items.0.iter().map(|item| item.ok_quantity).sum();
            prop_assert_eq!(document.ok_quantity, ok_sum);
        }
    }
}

// Property: allocations keep one entry per product and track the net change
proptest! {
    #![proptest_config(ProptestConfig::with_cases(300))]

    #[test]
    fn allocation_adjustments_accumulate(deltas in proptest::collection::vec(-50i32..50, 1..20)) {
        let product_id = Uuid::new_v4();
        let mut allocations = ProductAllocations::default();
        for delta in &deltas {
            prop_assert!(allocations.adjust(product_id, *delta).is_some());
        }

        prop_assert_eq!(allocations.0.len(), 1);
        prop_assert_eq!(allocations.quantity_of(product_id), Some(deltas.iter().sum::<i32>()));
    }

    #[test]
    fn normalized_master_list_has_no_blanks_or_duplicates(
        raw in proptest::collection::vec("[ ]{0,2}[A-C][0-3]?[ ]{0,2}", 0..30),
    ) {
        let normalized = normalize_item_nos(&raw);
        let mut unique = normalized.clone();
        unique.sort();
        unique.dedup();

        prop_assert_eq!(unique.len(), normalized.len());
        prop_assert!(normalized.iter().all(|item_no| !item_no.is_empty() && item_no.trim() == item_no));
    }
}
