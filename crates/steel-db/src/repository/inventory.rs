//! # Inventory Repository
//!
//! The append-only movement log. Rows are written by invoice creation
//! (sales, log only) and import approval (stock-bearing); this repository
//! only reads them back.

use chrono::Utc;
use sqlx::{SqliteConnection, SqlitePool};
use steel_core::inventory::{InventoryMovement, NewMovement};
use tracing::debug;

use crate::error::DbResult;

const MOVEMENT_COLUMNS: &str = "id, product_id, variant_id, movement_type, quantity_change, \
    previous_stock, new_stock, reference_type, reference_id, notes, created_by, created_at";

/// Appends one movement on the given connection.
pub(crate) async fn record(conn: &mut SqliteConnection, movement: &NewMovement) -> DbResult<i64> {
    let id = sqlx::query(
        r#"
        INSERT INTO inventory_movements (
            product_id, variant_id, movement_type, quantity_change,
            previous_stock, new_stock, reference_type, reference_id,
            notes, created_by, created_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
        "#,
    )
    .bind(movement.product_id)
    .bind(movement.variant_id)
    .bind(movement.movement_type)
    .bind(movement.quantity_change)
    .bind(movement.previous_stock)
    .bind(movement.new_stock)
    .bind(movement.reference_type)
    .bind(movement.reference_id)
    .bind(movement.notes.as_deref())
    .bind(movement.created_by)
    .bind(Utc::now())
    .execute(&mut *conn)
    .await?
    .last_insert_rowid();

    debug!(
        movement_id = id,
        variant_id = movement.variant_id,
        quantity_change = movement.quantity_change,
        reference_type = movement.reference_type,
        reference_id = movement.reference_id,
        "Recorded inventory movement"
    );

    Ok(id)
}

/// Repository for reading the movement log.
#[derive(Debug, Clone)]
pub struct InventoryRepository {
    pool: SqlitePool,
}

impl InventoryRepository {
    /// Creates a new InventoryRepository.
    pub fn new(pool: SqlitePool) -> Self {
        InventoryRepository { pool }
    }

    /// Movements of one variant, newest first.
    pub async fn list_by_variant(&self, variant_id: i64) -> DbResult<Vec<InventoryMovement>> {
        let movements = sqlx::query_as::<_, InventoryMovement>(&format!(
            "SELECT {} FROM inventory_movements WHERE variant_id = ?1 ORDER BY created_at DESC, id DESC",
            MOVEMENT_COLUMNS
        ))
        .bind(variant_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(movements)
    }

    /// Movements caused by one document, in write order.
    pub async fn list_by_reference(
        &self,
        reference_type: &str,
        reference_id: i64,
    ) -> DbResult<Vec<InventoryMovement>> {
        let movements = sqlx::query_as::<_, InventoryMovement>(&format!(
            "SELECT {} FROM inventory_movements WHERE reference_type = ?1 AND reference_id = ?2 ORDER BY id",
            MOVEMENT_COLUMNS
        ))
        .bind(reference_type)
        .bind(reference_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(movements)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::test_support::db_with_product;
    use steel_core::inventory::{reference, MovementType};

    #[tokio::test]
    async fn test_record_and_list() {
        let (db, product) = db_with_product().await;
        let variant_id = product.variants[0].id;

        let movement = NewMovement {
            product_id: Some(product.id),
            variant_id,
            movement_type: MovementType::Sale,
            quantity_change: -2.0,
            previous_stock: None,
            new_stock: None,
            reference_type: reference::INVOICE,
            reference_id: 1,
            notes: None,
            created_by: Some(2),
        };
        {
            let mut conn = db.pool().acquire().await.unwrap();
            record(&mut conn, &movement).await.unwrap();
            record(&mut conn, &NewMovement { reference_id: 2, ..movement.clone() }).await.unwrap();
        }

        let by_variant = db.inventory().list_by_variant(variant_id).await.unwrap();
        assert_eq!(by_variant.len(), 2);
        assert_eq!(by_variant[0].reference_id, 2);
        assert_eq!(by_variant[0].movement_type, MovementType::Sale);
        assert_eq!(by_variant[0].previous_stock, None);

        let by_ref = db.inventory().list_by_reference(reference::INVOICE, 1).await.unwrap();
        assert_eq!(by_ref.len(), 1);
        assert_eq!(by_ref[0].quantity_change, -2.0);
    }
}
