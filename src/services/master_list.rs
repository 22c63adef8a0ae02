//! Master list of authorised item numbers.
//!
//! Every item number on an incoming goods receipt must be present here; the
//! list is replaced wholesale from an uploaded sheet or extended one entry at a time.

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, Set, TransactionTrait,
};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::{
    db::DbPool,
    entities::master_list_item::{self, Entity as MasterListItem},
    errors::ServiceError,
    events::{Event, EventSender},
};

/// Rows per INSERT, kept well under SQLite's bound-parameter limit.
const INSERT_CHUNK: usize = 300;

#[derive(Clone)]
pub struct MasterListService {
    db_pool: Arc<DbPool>,
    event_sender: Arc<EventSender>,
}

/// Trims entries, drops blanks and keeps the first occurrence of each item number.
pub fn normalize_item_nos<I, S>(item_nos: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut seen = HashSet::new();
    item_nos
        .into_iter()
        .map(|raw| raw.as_ref().trim().to_string())
        .filter(|item_no| !item_no.is_empty())
        .filter(|item_no| seen.insert(item_no.clone()))
        .collect()
}

impl MasterListService {
    pub fn new(db_pool: Arc<DbPool>, event_sender: Arc<EventSender>) -> Self {
        Self {
            db_pool,
            event_sender,
        }
    }

    /// Replaces the whole list atomically and returns the number of stored entries.
    #[instrument(skip(self, item_nos), fields(submitted = item_nos.len()))]
    pub async fn replace(&self, item_nos: Vec<String>) -> Result<usize, ServiceError> {
        let normalized = normalize_item_nos(&item_nos);
        let now = Utc::now();

        let txn = self.db_pool.begin().await?;
        MasterListItem::delete_many().exec(&txn).await?;

        for chunk in normalized.chunks(INSERT_CHUNK) {
            let rows = chunk.iter().map(|item_no| master_list_item::ActiveModel {
                id: Set(Uuid::new_v4()),
                item_no: Set(item_no.clone()),
                created_at: Set(now),
            });
            MasterListItem::insert_many(rows).exec(&txn).await?;
        }

        txn.commit().await?;

        info!(count = normalized.len(), "Master list replaced");
        self.event_sender.send_or_log(Event::MasterListReplaced {
            count: normalized.len(),
        });
        Ok(normalized.len())
    }

    /// Whether `item_no` is on the list, using any connection or open transaction.
    pub async fn contains<C: ConnectionTrait>(conn: &C, item_no: &str) -> Result<bool, ServiceError> {
        let count = MasterListItem::find()
            .filter(master_list_item::Column::ItemNo.eq(item_no))
            .count(conn)
            .await?;
        Ok(count > 0)
    }

    /// Checks item numbers in order, failing on the first unknown one.
    pub async fn ensure_known<S>(&self, item_nos: &[S]) -> Result<(), ServiceError>
    where
        S: AsRef<str> + Sync,
    {
        for item_no in item_nos {
            let item_no = item_no.as_ref();
            if !Self::contains(&*self.db_pool, item_no).await? {
                return Err(ServiceError::InvalidReference(item_no.to_string()));
            }
        }
        Ok(())
    }

    #[instrument(skip(self))]
    pub async fn add_item(&self, item_no: &str) -> Result<String, ServiceError> {
        let item_no = item_no.trim();
        if item_no.is_empty() {
            return Err(ServiceError::ValidationError(
                "Item number is required".to_string(),
            ));
        }

        const DUPLICATE: &str = "Item number already exists in the master list";
        if Self::contains(&*self.db_pool, item_no).await? {
            return Err(ServiceError::Conflict(DUPLICATE.to_string()));
        }

        master_list_item::ActiveModel {
            id: Set(Uuid::new_v4()),
            item_no: Set(item_no.to_string()),
            created_at: Set(Utc::now()),
        }
        .insert(&*self.db_pool)
        .await
        .map_err(|e| ServiceError::from_write_error(e, DUPLICATE))?;

        self.event_sender
            .send_or_log(Event::MasterListItemAdded(item_no.to_string()));
        Ok(item_no.to_string())
    }

    /// All item numbers in lexical order.
    pub async fn list(&self) -> Result<Vec<String>, ServiceError> {
        let item_nos = MasterListItem::find()
            .select_only()
            .column(master_list_item::Column::ItemNo)
            .order_by_asc(master_list_item::Column::ItemNo)
            .into_tuple::<String>()
            .all(&*self.db_pool)
            .await?;
        Ok(item_nos)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_trims_and_dedupes_in_order() {
        let normalized = normalize_item_nos(vec![" A1 ", "B2", "", "A1", "  ", "C3", "B2"]);
        assert_eq!(normalized, vec!["A1", "B2", "C3"]);
    }

    #[test]
    fn normalize_of_blank_sheet_is_empty() {
        assert!(normalize_item_nos(Vec::<String>::new()).is_empty());
        assert!(normalize_item_nos(vec!["   "]).is_empty());
    }
}
