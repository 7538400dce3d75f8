//! Product Repository

use serde::{Deserialize, Serialize};
use surrealdb::Surreal;
use surrealdb::engine::local::Db;

use super::{BaseRepository, RepoError, RepoResult, parse_record_id};
use crate::db::models::{Product, ProductCreate};

const PRODUCT_TABLE: &str = "product";

/// Row shape for `INSERT INTO product` (create payload + timestamp)
#[derive(Debug, Serialize)]
struct ProductInsertRow {
    code: String,
    description: String,
    barcode: Option<String>,
    category: Option<String>,
    unit: String,
    is_active: bool,
    created_at: i64,
}

impl ProductInsertRow {
    fn from_create(data: ProductCreate, now: i64) -> Self {
        Self {
            code: data.code,
            description: data.description,
            barcode: data.barcode,
            category: data.category,
            unit: data.unit,
            is_active: data.is_active,
            created_at: now,
        }
    }
}

#[derive(Clone)]
pub struct ProductRepository {
    base: BaseRepository,
}

impl ProductRepository {
    pub fn new(db: Surreal<Db>) -> Self {
        Self {
            base: BaseRepository::new(db),
        }
    }

    /// Find all active products ordered by code
    pub async fn find_all(&self) -> RepoResult<Vec<Product>> {
        let products: Vec<Product> = self
            .base
            .db()
            .query("SELECT * FROM product WHERE is_active = true ORDER BY code")
            .await?
            .take(0)?;
        Ok(products)
    }

    /// Case-insensitive substring search over code and description
    pub async fn search(&self, term: &str, limit: usize) -> RepoResult<Vec<Product>> {
        let needle = term.trim().to_uppercase();
        let products: Vec<Product> = self
            .base
            .db()
            .query(
                "SELECT * FROM product \
                 WHERE is_active = true \
                 AND (string::contains(string::uppercase(code), $term) \
                      OR string::contains(string::uppercase(description), $term)) \
                 ORDER BY code LIMIT $limit",
            )
            .bind(("term", needle))
            .bind(("limit", limit as i64))
            .await?
            .take(0)?;
        Ok(products)
    }

    /// Find product by id
    pub async fn find_by_id(&self, id: &str) -> RepoResult<Option<Product>> {
        let record = parse_record_id(PRODUCT_TABLE, id)?;
        let product: Option<Product> = self.base.db().select(record).await?;
        Ok(product)
    }

    /// Find product by internal code
    pub async fn find_by_code(&self, code: &str) -> RepoResult<Option<Product>> {
        let mut result = self
            .base
            .db()
            .query("SELECT * FROM product WHERE code = $code LIMIT 1")
            .bind(("code", code.to_string()))
            .await?;
        let products: Vec<Product> = result.take(0)?;
        Ok(products.into_iter().next())
    }

    /// Resolve a scanned value against barcode first, then internal code.
    /// A miss is the caller's distinguished "unknown barcode" state, not a
    /// database failure.
    pub async fn find_by_scanned_code(&self, scanned: &str) -> RepoResult<Option<Product>> {
        let mut result = self
            .base
            .db()
            .query(
                "SELECT * FROM product \
                 WHERE is_active = true AND (barcode = $scanned OR code = $scanned) \
                 LIMIT 1",
            )
            .bind(("scanned", scanned.to_string()))
            .await?;
        let products: Vec<Product> = result.take(0)?;
        Ok(products.into_iter().next())
    }

    /// Create a single product
    pub async fn create(&self, data: ProductCreate) -> RepoResult<Product> {
        if data.code.trim().is_empty() {
            return Err(RepoError::Validation("code cannot be empty".into()));
        }
        if data.description.trim().is_empty() {
            return Err(RepoError::Validation("description cannot be empty".into()));
        }
        if self.find_by_code(&data.code).await?.is_some() {
            return Err(RepoError::Duplicate(format!(
                "Product code '{}' already exists",
                data.code
            )));
        }

        let row = ProductInsertRow::from_create(data, shared::util::now_millis());
        let created: Option<Product> = self.base.db().create(PRODUCT_TABLE).content(row).await?;
        created.ok_or_else(|| RepoError::Database("Failed to create product".to_string()))
    }

    /// Insert a batch of products in one statement. Fails as a whole if
    /// any row conflicts; callers fall back to per-record inserts.
    pub async fn insert_many(&self, batch: Vec<ProductCreate>) -> RepoResult<usize> {
        let now = shared::util::now_millis();
        let rows: Vec<ProductInsertRow> = batch
            .into_iter()
            .map(|data| ProductInsertRow::from_create(data, now))
            .collect();
        let inserted = rows.len();

        self.base
            .db()
            .query("INSERT INTO product $rows")
            .bind(("rows", rows))
            .await?
            .check()?;
        Ok(inserted)
    }

    /// Link a scanned barcode to an existing product. Rejects a barcode
    /// already linked to a different product.
    pub async fn link_barcode(&self, id: &str, barcode: &str) -> RepoResult<Product> {
        let record = parse_record_id(PRODUCT_TABLE, id)?;
        let barcode = barcode.trim().to_string();
        if barcode.is_empty() {
            return Err(RepoError::Validation("barcode cannot be empty".into()));
        }

        let mut result = self
            .base
            .db()
            .query("SELECT * FROM product WHERE barcode = $barcode AND id != $id LIMIT 1")
            .bind(("barcode", barcode.clone()))
            .bind(("id", record.clone()))
            .await?;
        let taken: Vec<Product> = result.take(0)?;
        if let Some(other) = taken.into_iter().next() {
            return Err(RepoError::Duplicate(format!(
                "Barcode '{}' is already linked to product '{}'",
                barcode, other.code
            )));
        }

        let mut result = self
            .base
            .db()
            .query("UPDATE $id SET barcode = $barcode RETURN AFTER")
            .bind(("id", record))
            .bind(("barcode", barcode))
            .await?;
        let products: Vec<Product> = result.take(0)?;
        products
            .into_iter()
            .next()
            .ok_or_else(|| RepoError::NotFound(format!("Product {} not found", id)))
    }

    /// Count every product row (read-back check after import)
    pub async fn count(&self) -> RepoResult<i64> {
        #[derive(Deserialize)]
        struct CountRow {
            count: i64,
        }

        let mut result = self
            .base
            .db()
            .query("SELECT count() FROM product GROUP ALL")
            .await?;
        let rows: Vec<CountRow> = result.take(0)?;
        Ok(rows.into_iter().next().map(|r| r.count).unwrap_or(0))
    }

    /// Delete every product row (catalog replacement). Dependent counted
    /// items and history must be removed first.
    pub async fn delete_all(&self) -> RepoResult<()> {
        self.base.db().query("DELETE product").await?.check()?;
        Ok(())
    }
}
