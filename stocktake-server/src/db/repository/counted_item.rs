//! Counted Item Repository
//!
//! Implements the three counting procedures as single transactions so
//! concurrent counters never lose updates:
//!
//! - `add_quantity` - accumulate (`quantity += amount`), never
//!   read-compute-write from the caller's side
//! - `correct_quantity` - wholesale overwrite, last write wins
//! - `remove_item` - authorized delete
//!
//! Each transaction also recomputes the owning session's totals from its
//! items (so the stored totals always equal the fold) and appends an
//! audit-trail row.

use surrealdb::Surreal;
use surrealdb::engine::local::Db;

use super::{BaseRepository, RepoError, RepoResult, parse_record_id};
use crate::db::models::{
    CountHistoryEntry, CountedItem, CountedItemDetail, OPERATION_ADD, OPERATION_CORRECT,
    OPERATION_REMOVE, SESSION_STATUS_ACTIVE,
};
use shared::CountedRowFlat;

const ITEM_TABLE: &str = "counted_item";

/// Refreshes the owning session's totals from its surviving items.
/// Runs inside every mutation transaction.
const REFRESH_SESSION_TOTALS: &str = "\
    UPDATE $session SET \
        total_items_counted = (SELECT count() FROM counted_item WHERE session = $session GROUP ALL)[0].count ?? 0, \
        total_units_counted = math::sum((SELECT VALUE quantity FROM counted_item WHERE session = $session));";

const DETAIL_FIELDS: &str = "\
    id, product AS product_id, product.code AS code, product.description AS description, \
    product.category AS category, product.barcode AS barcode, product.unit AS unit, \
    quantity, record_count, last_updated_at, last_updated_by.name AS updated_by";

const FLAT_FIELDS: &str = "\
    product.code AS code, product.description AS description, product.category AS category, \
    product.barcode AS barcode, product.unit AS unit, quantity, record_count, \
    session.user.name AS counted_by, last_updated_at";

#[derive(Clone)]
pub struct CountedItemRepository {
    base: BaseRepository,
}

impl CountedItemRepository {
    pub fn new(db: Surreal<Db>) -> Self {
        Self {
            base: BaseRepository::new(db),
        }
    }

    /// Find one counted item by id
    pub async fn find_by_id(&self, id: &str) -> RepoResult<Option<CountedItem>> {
        let record = parse_record_id(ITEM_TABLE, id)?;
        let item: Option<CountedItem> = self.base.db().select(record).await?;
        Ok(item)
    }

    /// Atomically accumulate quantity onto the (session, product) item.
    ///
    /// The item id is derived from the session and product keys, so the
    /// first add and every later add target the same record; `UPSERT` on
    /// that id plus the unique (session, product) index make concurrent
    /// adds converge instead of losing updates.
    pub async fn add_quantity(
        &self,
        session_id: &str,
        product_id: &str,
        amount: f64,
        acting_user_id: &str,
    ) -> RepoResult<CountedItem> {
        if !amount.is_finite() || amount <= 0.0 {
            return Err(RepoError::Validation(format!(
                "quantity must be a positive number, got {amount}"
            )));
        }

        let session = parse_record_id("counting_session", session_id)?;
        let product = parse_record_id("product", product_id)?;
        let user = parse_record_id("user", acting_user_id)?;

        self.ensure_session_active(session_id).await?;
        self.ensure_product_exists(product_id).await?;

        self.base
            .db()
            .query(format!(
                "BEGIN TRANSACTION; \
                 LET $item_id = type::thing('counted_item', string::concat(<string> record::id($session), '_', <string> record::id($product))); \
                 UPSERT $item_id SET \
                     session = $session, \
                     product = $product, \
                     quantity = (quantity ?? 0) + $amount, \
                     record_count = (record_count ?? 0) + 1, \
                     last_updated_at = $now, \
                     last_updated_by = $user; \
                 {REFRESH_SESSION_TOTALS} \
                 CREATE count_history SET \
                     item = $item_id, session = $session, product = $product, \
                     operation = $op, quantity_delta = $amount, \
                     user = $user, recorded_at = $now; \
                 COMMIT TRANSACTION;"
            ))
            .bind(("session", session.clone()))
            .bind(("product", product.clone()))
            .bind(("amount", amount))
            .bind(("user", user))
            .bind(("op", OPERATION_ADD))
            .bind(("now", shared::util::now_millis()))
            .await?
            .check()?;

        // Read back the post-increment row; the transaction guarantees it
        // reflects at least this addition.
        let mut result = self
            .base
            .db()
            .query("SELECT * FROM counted_item WHERE session = $session AND product = $product LIMIT 1")
            .bind(("session", session))
            .bind(("product", product))
            .await?;
        let items: Vec<CountedItem> = result.take(0)?;
        items
            .into_iter()
            .next()
            .ok_or_else(|| RepoError::Database("Counted item missing after add".to_string()))
    }

    /// Overwrite an item's quantity (correction). Last write wins; the
    /// record count is not treated as another addition.
    pub async fn correct_quantity(
        &self,
        item_id: &str,
        new_quantity: f64,
        acting_user_id: &str,
    ) -> RepoResult<CountedItem> {
        if !new_quantity.is_finite() || new_quantity < 0.0 {
            return Err(RepoError::Validation(format!(
                "quantity must be non-negative, got {new_quantity}"
            )));
        }

        let record = parse_record_id(ITEM_TABLE, item_id)?;
        let user = parse_record_id("user", acting_user_id)?;

        let existing = self
            .find_by_id(item_id)
            .await?
            .ok_or_else(|| RepoError::NotFound(format!("Counted item {} not found", item_id)))?;
        let delta = new_quantity - existing.quantity;

        self.base
            .db()
            .query(format!(
                "BEGIN TRANSACTION; \
                 LET $session = $item.session; \
                 LET $product = $item.product; \
                 UPDATE $item SET \
                     quantity = $quantity, \
                     last_updated_at = $now, \
                     last_updated_by = $user; \
                 {REFRESH_SESSION_TOTALS} \
                 CREATE count_history SET \
                     item = $item, session = $session, product = $product, \
                     operation = $op, quantity_delta = $delta, \
                     user = $user, recorded_at = $now; \
                 COMMIT TRANSACTION;"
            ))
            .bind(("item", record.clone()))
            .bind(("quantity", new_quantity))
            .bind(("delta", delta))
            .bind(("user", user))
            .bind(("op", OPERATION_CORRECT))
            .bind(("now", shared::util::now_millis()))
            .await?
            .check()?;

        self.find_by_id(item_id)
            .await?
            .ok_or_else(|| RepoError::Database("Counted item missing after correction".to_string()))
    }

    /// Delete a counted item. Only the owner of the item's session may
    /// remove it.
    pub async fn remove_item(&self, item_id: &str, acting_user_id: &str) -> RepoResult<()> {
        let record = parse_record_id(ITEM_TABLE, item_id)?;
        let user = parse_record_id("user", acting_user_id)?;

        let existing = self
            .find_by_id(item_id)
            .await?
            .ok_or_else(|| RepoError::NotFound(format!("Counted item {} not found", item_id)))?;

        let owner = self.session_owner(&existing.session).await?;
        if owner != user {
            return Err(RepoError::Forbidden(
                "Only the session owner may remove counted items".to_string(),
            ));
        }

        self.base
            .db()
            .query(format!(
                "BEGIN TRANSACTION; \
                 LET $session = $item.session; \
                 LET $product = $item.product; \
                 DELETE $item; \
                 {REFRESH_SESSION_TOTALS} \
                 CREATE count_history SET \
                     item = $item, session = $session, product = $product, \
                     operation = $op, quantity_delta = $delta, \
                     user = $user, recorded_at = $now; \
                 COMMIT TRANSACTION;"
            ))
            .bind(("item", record))
            .bind(("delta", -existing.quantity))
            .bind(("user", user))
            .bind(("op", OPERATION_REMOVE))
            .bind(("now", shared::util::now_millis()))
            .await?
            .check()?;

        Ok(())
    }

    /// Items of one session joined with product fields, most recently
    /// updated first (the counting screen refreshes from this after every
    /// mutation).
    pub async fn find_details_by_session(
        &self,
        session_id: &str,
    ) -> RepoResult<Vec<CountedItemDetail>> {
        let session = parse_record_id("counting_session", session_id)?;
        let mut result = self
            .base
            .db()
            .query(format!(
                "SELECT {DETAIL_FIELDS} FROM counted_item \
                 WHERE session = $session ORDER BY last_updated_at DESC"
            ))
            .bind(("session", session))
            .await?;
        let items: Vec<CountedItemDetail> = result.take(0)?;
        Ok(items)
    }

    /// Flat joined rows for one session (per-session report input)
    pub async fn flat_rows_by_session(&self, session_id: &str) -> RepoResult<Vec<CountedRowFlat>> {
        let session = parse_record_id("counting_session", session_id)?;
        let mut result = self
            .base
            .db()
            .query(format!(
                "SELECT {FLAT_FIELDS} FROM counted_item WHERE session = $session"
            ))
            .bind(("session", session))
            .await?;
        let rows: Vec<CountedRowFlat> = result.take(0)?;
        Ok(rows)
    }

    /// Flat joined rows across the given sessions (consolidated report
    /// input); empty session list short-circuits to no rows.
    pub async fn flat_rows_by_sessions(
        &self,
        session_ids: &[surrealdb::RecordId],
    ) -> RepoResult<Vec<CountedRowFlat>> {
        if session_ids.is_empty() {
            return Ok(Vec::new());
        }
        let mut result = self
            .base
            .db()
            .query(format!(
                "SELECT {FLAT_FIELDS} FROM counted_item WHERE session IN $sessions"
            ))
            .bind(("sessions", session_ids.to_vec()))
            .await?;
        let rows: Vec<CountedRowFlat> = result.take(0)?;
        Ok(rows)
    }

    /// Flat joined rows for every counted item (general statistics)
    pub async fn flat_rows_all(&self) -> RepoResult<Vec<CountedRowFlat>> {
        let mut result = self
            .base
            .db()
            .query(format!("SELECT {FLAT_FIELDS} FROM counted_item"))
            .await?;
        let rows: Vec<CountedRowFlat> = result.take(0)?;
        Ok(rows)
    }

    /// Audit trail for one session, most recent first
    pub async fn history_by_session(
        &self,
        session_id: &str,
        limit: usize,
    ) -> RepoResult<Vec<CountHistoryEntry>> {
        let session = parse_record_id("counting_session", session_id)?;
        let mut result = self
            .base
            .db()
            .query(
                "SELECT id, operation, quantity_delta, \
                 product.code AS code, product.description AS description, \
                 user.name AS user_name, recorded_at \
                 FROM count_history WHERE session = $session \
                 ORDER BY recorded_at DESC LIMIT $limit",
            )
            .bind(("session", session))
            .bind(("limit", limit as i64))
            .await?;
        let entries: Vec<CountHistoryEntry> = result.take(0)?;
        Ok(entries)
    }

    /// Delete every counted item (catalog replacement)
    pub async fn delete_all(&self) -> RepoResult<()> {
        self.base.db().query("DELETE counted_item").await?.check()?;
        Ok(())
    }

    /// Delete the whole audit trail (catalog replacement)
    pub async fn delete_all_history(&self) -> RepoResult<()> {
        self.base.db().query("DELETE count_history").await?.check()?;
        Ok(())
    }

    async fn ensure_session_active(&self, session_id: &str) -> RepoResult<()> {
        let sessions = super::SessionRepository::new(self.base.db().clone());
        let session = sessions
            .find_by_id(session_id)
            .await?
            .ok_or_else(|| RepoError::NotFound(format!("Session {} not found", session_id)))?;
        if session.status != SESSION_STATUS_ACTIVE {
            return Err(RepoError::Validation(format!(
                "Session {} is already completed",
                session_id
            )));
        }
        Ok(())
    }

    async fn ensure_product_exists(&self, product_id: &str) -> RepoResult<()> {
        let products = super::ProductRepository::new(self.base.db().clone());
        products
            .find_by_id(product_id)
            .await?
            .ok_or_else(|| RepoError::NotFound(format!("Product {} not found", product_id)))?;
        Ok(())
    }

    async fn session_owner(
        &self,
        session: &surrealdb::RecordId,
    ) -> RepoResult<surrealdb::RecordId> {
        let sessions = super::SessionRepository::new(self.base.db().clone());
        let session = sessions
            .find_by_id(&session.to_string())
            .await?
            .ok_or_else(|| RepoError::NotFound("Owning session not found".to_string()))?;
        Ok(session.user)
    }
}
