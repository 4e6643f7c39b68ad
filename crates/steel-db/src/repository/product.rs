//! # Product Repository
//!
//! Products and their variants. Variants carry price and stock; documents
//! copy the display fields they need through [`VariantSnapshot`] so later
//! catalog edits never rewrite history.
//!
//! ## Snapshot Lookup
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  invoice/import line { variant_id: 11 }                                │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  product_variants v JOIN products p                                    │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  VariantSnapshot { product_id, product_name, variant_name,             │
//! │                    unit = COALESCE(v.unit, p.unit) }                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use sqlx::{QueryBuilder, Sqlite, SqliteConnection, SqlitePool};
use steel_core::catalog::{
    NewProduct, NewVariant, Product, ProductQuery, ProductVariant, UpdateProduct, UpdateVariant,
    VariantSnapshot,
};
use steel_core::validation::validate_search_query;
use steel_core::{PageRequest, Paginated};
use tracing::{debug, info};

use super::like_pattern;
use crate::error::{DbError, DbResult};

const PRODUCT_COLUMNS: &str = "id, name, unit, notes, is_active, created_at, updated_at";

const VARIANT_COLUMNS: &str =
    "id, product_id, name, sku, price_cents, stock, unit, is_active, created_at, updated_at";

/// Display fields of a variant, joined with its product.
/// Fails with NotFound when the variant does not exist.
pub(crate) async fn variant_snapshot(conn: &mut SqliteConnection, variant_id: i64) -> DbResult<VariantSnapshot> {
    sqlx::query_as::<_, VariantSnapshot>(
        r#"
        SELECT
            v.id AS variant_id,
            v.product_id AS product_id,
            p.name AS product_name,
            v.name AS variant_name,
            COALESCE(v.unit, p.unit) AS unit
        FROM product_variants v
        JOIN products p ON p.id = v.product_id
        WHERE v.id = ?1
        "#,
    )
    .bind(variant_id)
    .fetch_optional(&mut *conn)
    .await?
    .ok_or_else(|| DbError::not_found("ProductVariant", variant_id))
}

/// Current stock of a variant.
pub(crate) async fn variant_stock(conn: &mut SqliteConnection, variant_id: i64) -> DbResult<f64> {
    sqlx::query_scalar::<_, f64>("SELECT stock FROM product_variants WHERE id = ?1")
        .bind(variant_id)
        .fetch_optional(&mut *conn)
        .await?
        .ok_or_else(|| DbError::not_found("ProductVariant", variant_id))
}

/// Adds `delta` to a variant's stock.
pub(crate) async fn adjust_stock(conn: &mut SqliteConnection, variant_id: i64, delta: f64) -> DbResult<()> {
    let result = sqlx::query("UPDATE product_variants SET stock = stock + ?1, updated_at = ?2 WHERE id = ?3")
        .bind(delta)
        .bind(Utc::now())
        .bind(variant_id)
        .execute(&mut *conn)
        .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::not_found("ProductVariant", variant_id));
    }

    debug!(variant_id, delta, "Adjusted variant stock");
    Ok(())
}

async fn variants_of(conn: &mut SqliteConnection, product_id: i64) -> DbResult<Vec<ProductVariant>> {
    let variants = sqlx::query_as::<_, ProductVariant>(&format!(
        "SELECT {} FROM product_variants WHERE product_id = ?1 ORDER BY id",
        VARIANT_COLUMNS
    ))
    .bind(product_id)
    .fetch_all(&mut *conn)
    .await?;

    Ok(variants)
}

async fn fetch(conn: &mut SqliteConnection, id: i64) -> DbResult<Option<Product>> {
    let product = sqlx::query_as::<_, Product>(&format!(
        "SELECT {} FROM products WHERE id = ?1",
        PRODUCT_COLUMNS
    ))
    .bind(id)
    .fetch_optional(&mut *conn)
    .await?;

    match product {
        Some(mut product) => {
            product.variants = variants_of(conn, id).await?;
            Ok(Some(product))
        }
        None => Ok(None),
    }
}

async fn fetch_variant(conn: &mut SqliteConnection, id: i64) -> DbResult<Option<ProductVariant>> {
    let variant = sqlx::query_as::<_, ProductVariant>(&format!(
        "SELECT {} FROM product_variants WHERE id = ?1",
        VARIANT_COLUMNS
    ))
    .bind(id)
    .fetch_optional(&mut *conn)
    .await?;

    Ok(variant)
}

/// Maps a SKU collision to `UniqueViolation { field: "sku" }`.
fn sku_conflict(err: sqlx::Error, sku: &str) -> DbError {
    match DbError::from(err) {
        DbError::UniqueViolation { .. } => DbError::duplicate("sku", sku),
        other => other,
    }
}

async fn insert_variant(
    conn: &mut SqliteConnection,
    product_id: i64,
    variant: &NewVariant,
    now: DateTime<Utc>,
) -> DbResult<i64> {
    let sku = variant.sku.trim();
    let id = sqlx::query(
        r#"
        INSERT INTO product_variants (
            product_id, name, sku, price_cents, stock, unit, is_active, created_at, updated_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, 1, ?7, ?7)
        "#,
    )
    .bind(product_id)
    .bind(variant.name.trim())
    .bind(sku)
    .bind(variant.price_cents)
    .bind(variant.stock)
    .bind(variant.unit.as_deref())
    .bind(now)
    .execute(&mut *conn)
    .await
    .map_err(|e| sku_conflict(e, sku))?
    .last_insert_rowid();

    Ok(id)
}

fn push_search(qb: &mut QueryBuilder<'_, Sqlite>, pattern: Option<&str>) {
    if let Some(pattern) = pattern {
        qb.push(" AND (name LIKE ")
            .push_bind(pattern.to_string())
            .push(" OR id IN (SELECT product_id FROM product_variants WHERE sku LIKE ")
            .push_bind(pattern.to_string())
            .push("))");
    }
}

/// Repository for the product catalog.
#[derive(Debug, Clone)]
pub struct ProductRepository {
    pool: SqlitePool,
}

impl ProductRepository {
    /// Creates a new ProductRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ProductRepository { pool }
    }

    /// Creates a product together with its variants in one transaction.
    ///
    /// A duplicate SKU rolls the whole product back.
    pub async fn create(&self, product: &NewProduct) -> DbResult<Product> {
        product.validate()?;
        let now = Utc::now();

        let mut tx = self.pool.begin().await?;

        let product_id = sqlx::query(
            r#"
            INSERT INTO products (name, unit, notes, is_active, created_at, updated_at)
            VALUES (?1, ?2, ?3, 1, ?4, ?4)
            "#,
        )
        .bind(product.name.trim())
        .bind(product.unit.trim())
        .bind(product.notes.as_deref())
        .bind(now)
        .execute(&mut *tx)
        .await?
        .last_insert_rowid();

        for variant in &product.variants {
            insert_variant(&mut tx, product_id, variant, now).await?;
        }

        let created = fetch(&mut tx, product_id)
            .await?
            .ok_or_else(|| DbError::not_found("Product", product_id))?;

        tx.commit().await?;

        info!(
            product_id,
            variants = created.variants.len(),
            "Product created"
        );
        Ok(created)
    }

    /// Gets a product with its variants.
    pub async fn get_by_id(&self, id: i64) -> DbResult<Option<Product>> {
        let mut conn = self.pool.acquire().await?;
        fetch(&mut conn, id).await
    }

    /// Gets a single variant.
    pub async fn get_variant(&self, id: i64) -> DbResult<Option<ProductVariant>> {
        let mut conn = self.pool.acquire().await?;
        fetch_variant(&mut conn, id).await
    }

    /// Updates product fields. Issued documents keep their copied names.
    ///
    /// Deactivating through `is_active` leaves the variants untouched; use
    /// [`ProductRepository::deactivate`] to retire the whole family.
    pub async fn update(&self, id: i64, update: &UpdateProduct) -> DbResult<Product> {
        update.validate()?;

        let mut tx = self.pool.begin().await?;

        let mut product = fetch(&mut tx, id)
            .await?
            .ok_or_else(|| DbError::not_found("Product", id))?;
        if let Some(name) = &update.name {
            product.name = name.trim().to_string();
        }
        if let Some(unit) = &update.unit {
            product.unit = unit.trim().to_string();
        }
        if let Some(notes) = &update.notes {
            product.notes = Some(notes.clone());
        }
        if let Some(active) = update.is_active {
            product.is_active = active;
        }

        sqlx::query("UPDATE products SET name = ?1, unit = ?2, notes = ?3, is_active = ?4, updated_at = ?5 WHERE id = ?6")
            .bind(&product.name)
            .bind(&product.unit)
            .bind(product.notes.as_deref())
            .bind(product.is_active)
            .bind(Utc::now())
            .bind(id)
            .execute(&mut *tx)
            .await?;

        let updated = fetch(&mut tx, id)
            .await?
            .ok_or_else(|| DbError::not_found("Product", id))?;

        tx.commit().await?;

        info!(product_id = id, "Product updated");
        Ok(updated)
    }

    /// Soft-deletes a product and all of its variants.
    ///
    /// Rows stay in place so invoice lines, import lines and movements keep
    /// resolving; inactive products drop out of the listing.
    pub async fn deactivate(&self, id: i64) -> DbResult<()> {
        let now = Utc::now();
        let mut tx = self.pool.begin().await?;

        let result = sqlx::query("UPDATE products SET is_active = 0, updated_at = ?1 WHERE id = ?2")
            .bind(now)
            .bind(id)
            .execute(&mut *tx)
            .await?;
        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", id));
        }

        let variants = sqlx::query("UPDATE product_variants SET is_active = 0, updated_at = ?1 WHERE product_id = ?2")
            .bind(now)
            .bind(id)
            .execute(&mut *tx)
            .await?
            .rows_affected();

        tx.commit().await?;

        info!(product_id = id, variants, "Product deactivated");
        Ok(())
    }

    /// Adds a variant to an existing product.
    pub async fn add_variant(&self, product_id: i64, variant: &NewVariant) -> DbResult<ProductVariant> {
        variant.validate()?;

        let mut tx = self.pool.begin().await?;

        if fetch(&mut tx, product_id).await?.is_none() {
            return Err(DbError::not_found("Product", product_id));
        }
        let id = insert_variant(&mut tx, product_id, variant, Utc::now()).await?;
        let created = fetch_variant(&mut tx, id)
            .await?
            .ok_or_else(|| DbError::not_found("ProductVariant", id))?;

        tx.commit().await?;

        info!(product_id, variant_id = id, sku = %created.sku, "Variant added");
        Ok(created)
    }

    /// Updates variant fields. Stock is left alone.
    pub async fn update_variant(&self, id: i64, update: &UpdateVariant) -> DbResult<ProductVariant> {
        update.validate()?;

        let mut tx = self.pool.begin().await?;

        let mut variant = fetch_variant(&mut tx, id)
            .await?
            .ok_or_else(|| DbError::not_found("ProductVariant", id))?;
        if let Some(name) = &update.name {
            variant.name = name.trim().to_string();
        }
        if let Some(sku) = &update.sku {
            variant.sku = sku.trim().to_string();
        }
        if let Some(price) = update.price_cents {
            variant.price_cents = price;
        }
        if let Some(unit) = &update.unit {
            let unit = unit.trim();
            variant.unit = (!unit.is_empty()).then(|| unit.to_string());
        }
        if let Some(active) = update.is_active {
            variant.is_active = active;
        }

        sqlx::query(
            r#"
            UPDATE product_variants
            SET name = ?1, sku = ?2, price_cents = ?3, unit = ?4, is_active = ?5, updated_at = ?6
            WHERE id = ?7
            "#,
        )
        .bind(&variant.name)
        .bind(&variant.sku)
        .bind(variant.price_cents)
        .bind(variant.unit.as_deref())
        .bind(variant.is_active)
        .bind(Utc::now())
        .bind(id)
        .execute(&mut *tx)
        .await
        .map_err(|e| sku_conflict(e, &variant.sku))?;

        let updated = fetch_variant(&mut tx, id)
            .await?
            .ok_or_else(|| DbError::not_found("ProductVariant", id))?;

        tx.commit().await?;

        info!(variant_id = id, "Variant updated");
        Ok(updated)
    }

    /// Soft-deletes a single variant.
    pub async fn deactivate_variant(&self, id: i64) -> DbResult<()> {
        let result = sqlx::query("UPDATE product_variants SET is_active = 0, updated_at = ?1 WHERE id = ?2")
            .bind(Utc::now())
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("ProductVariant", id));
        }

        info!(variant_id = id, "Variant deactivated");
        Ok(())
    }

    /// Lists active products with their variants, ordered by name.
    /// Search matches the product name or any variant SKU.
    pub async fn list(&self, query: &ProductQuery) -> DbResult<Paginated<Product>> {
        let page = PageRequest::new(query.page, query.limit);
        let pattern = validate_search_query(query.search.as_deref())?.map(|s| like_pattern(&s));

        let mut count_qb = QueryBuilder::<Sqlite>::new("SELECT COUNT(*) FROM products WHERE is_active = 1");
        push_search(&mut count_qb, pattern.as_deref());
        let total: i64 = count_qb.build_query_scalar().fetch_one(&self.pool).await?;

        let mut qb = QueryBuilder::<Sqlite>::new(format!(
            "SELECT {} FROM products WHERE is_active = 1",
            PRODUCT_COLUMNS
        ));
        push_search(&mut qb, pattern.as_deref());
        qb.push(" ORDER BY name ASC, id ASC LIMIT ")
            .push_bind(page.limit as i64)
            .push(" OFFSET ")
            .push_bind(page.offset());

        let mut items: Vec<Product> = qb.build_query_as().fetch_all(&self.pool).await?;

        let mut conn = self.pool.acquire().await?;
        for product in &mut items {
            product.variants = variants_of(&mut conn, product.id).await?;
        }

        Ok(Paginated::new(items, total, page))
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::test_support::{db_with_product, manager, steel_box, variant_line, walk_in};
    use crate::{Database, DbConfig};

    #[tokio::test]
    async fn test_create_hydrates_variants() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let product = db.products().create(&steel_box("HOP-40X80")).await.unwrap();

        assert_eq!(product.variants.len(), 2);
        assert_eq!(product.variants[1].stock, 30.5);

        let fetched = db.products().get_by_id(product.id).await.unwrap().unwrap();
        assert_eq!(fetched, product);
    }

    #[tokio::test]
    async fn test_duplicate_sku_rolls_back_product() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        db.products().create(&steel_box("HOP-40X80")).await.unwrap();

        let err = db.products().create(&steel_box("HOP-40X80")).await.unwrap_err();
        assert!(matches!(err, DbError::UniqueViolation { .. }));

        let page = db.products().list(&ProductQuery::default()).await.unwrap();
        assert_eq!(page.total, 1);
    }

    #[tokio::test]
    async fn test_variant_snapshot_falls_back_to_product_unit() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let product = db.products().create(&steel_box("HOP-40X80")).await.unwrap();
        let mut conn = db.pool().acquire().await.unwrap();

        let snap = variant_snapshot(&mut conn, product.variants[0].id).await.unwrap();
        assert_eq!(snap.product_id, product.id);
        assert_eq!(snap.product_name, "Thép hộp mạ kẽm");
        assert_eq!(snap.unit, "cây");

        let snap = variant_snapshot(&mut conn, product.variants[1].id).await.unwrap();
        assert_eq!(snap.unit, "m");

        assert!(matches!(
            variant_snapshot(&mut conn, 999).await,
            Err(DbError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_list_search_by_sku() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        db.products().create(&steel_box("HOP-40X80")).await.unwrap();
        let mut other = steel_box("TON-LANH");
        other.name = "Tôn lạnh".into();
        db.products().create(&other).await.unwrap();

        let page = db
            .products()
            .list(&ProductQuery {
                search: Some("TON".into()),
                ..ProductQuery::default()
            })
            .await
            .unwrap();
        assert_eq!(page.total, 1);
        assert_eq!(page.items[0].name, "Tôn lạnh");
        assert_eq!(page.items[0].variants.len(), 2);
    }

    #[tokio::test]
    async fn test_adjust_stock() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let product = db.products().create(&steel_box("HOP-40X80")).await.unwrap();
        let variant_id = product.variants[0].id;
        let mut conn = db.pool().acquire().await.unwrap();

        adjust_stock(&mut conn, variant_id, 3.5).await.unwrap();
        assert_eq!(variant_stock(&mut conn, variant_id).await.unwrap(), 15.5);
    }

    #[tokio::test]
    async fn test_renames_leave_issued_invoices_alone() {
        let (db, product) = db_with_product().await;
        let variant = &product.variants[0];
        let invoice = db
            .invoices()
            .create(walk_in(vec![variant_line(variant.id, 1.0, 32_500_000)]), &manager())
            .await
            .unwrap();

        let renamed = db
            .products()
            .update(
                product.id,
                &UpdateProduct {
                    name: Some("Thép hộp đen".into()),
                    ..UpdateProduct::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(renamed.name, "Thép hộp đen");
        assert_eq!(renamed.unit, "cây");

        let variant = db
            .products()
            .update_variant(
                variant.id,
                &UpdateVariant {
                    name: Some("40x80 dày 1.8".into()),
                    price_cents: Some(34_000_000),
                    ..UpdateVariant::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(variant.name, "40x80 dày 1.8");
        assert_eq!(variant.price_cents, 34_000_000);
        assert_eq!(variant.stock, 12.0);

        let stored = db.invoices().get_by_id(invoice.id).await.unwrap().unwrap();
        assert_eq!(stored.items[0].product_name, "Thép hộp mạ kẽm");
        assert_eq!(stored.items[0].variant_name.as_deref(), Some("40x80 dày 1.4"));
        assert_eq!(stored.items[0].unit_price_cents, 32_500_000);
    }

    #[tokio::test]
    async fn test_add_variant_and_sku_conflicts() {
        let (db, product) = db_with_product().await;
        let new_variant = NewVariant {
            name: "50x100 dày 2.0".into(),
            sku: "HOP-50X100".into(),
            price_cents: 51_000_000,
            stock: 4.0,
            unit: None,
        };

        let added = db.products().add_variant(product.id, &new_variant).await.unwrap();
        assert_eq!(added.product_id, product.id);
        assert!(added.is_active);
        let fetched = db.products().get_by_id(product.id).await.unwrap().unwrap();
        assert_eq!(fetched.variants.len(), 3);

        let err = db.products().add_variant(product.id, &new_variant).await.unwrap_err();
        assert!(matches!(err, DbError::UniqueViolation { ref field, .. } if field == "sku"));

        let err = db.products().add_variant(999, &new_variant).await.unwrap_err();
        assert!(matches!(err, DbError::NotFound { .. }));

        let err = db
            .products()
            .update_variant(
                added.id,
                &UpdateVariant {
                    sku: Some("HOP-40X80".into()),
                    ..UpdateVariant::default()
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::UniqueViolation { ref field, .. } if field == "sku"));
    }

    #[tokio::test]
    async fn test_deactivate_hides_product_but_keeps_rows() {
        let (db, product) = db_with_product().await;

        db.products().deactivate_variant(product.variants[1].id).await.unwrap();
        let fetched = db.products().get_by_id(product.id).await.unwrap().unwrap();
        assert!(fetched.variants[0].is_active);
        assert!(!fetched.variants[1].is_active);

        db.products().deactivate(product.id).await.unwrap();
        let page = db.products().list(&ProductQuery::default()).await.unwrap();
        assert_eq!(page.total, 0);

        let fetched = db.products().get_by_id(product.id).await.unwrap().unwrap();
        assert!(!fetched.is_active);
        assert!(fetched.variants.iter().all(|v| !v.is_active));

        assert!(matches!(db.products().deactivate(999).await, Err(DbError::NotFound { .. })));
        assert!(matches!(
            db.products().deactivate_variant(999).await,
            Err(DbError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_update_unknown_product() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let err = db.products().update(7, &UpdateProduct::default()).await.unwrap_err();
        assert!(matches!(err, DbError::NotFound { .. }));
    }
}
