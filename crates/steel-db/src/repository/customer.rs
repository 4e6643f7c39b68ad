//! # Customer Repository
//!
//! The customer directory. Phone numbers are unique, which lets invoice
//! creation find-or-create a walk-in customer with one insert.

use chrono::Utc;
use sqlx::{QueryBuilder, Sqlite, SqliteConnection, SqlitePool};
use steel_core::customer::{Customer, CustomerQuery, NewCustomer, UpdateCustomer};
use steel_core::validation::validate_search_query;
use steel_core::{PageRequest, Paginated};
use tracing::{debug, info};

use super::like_pattern;
use crate::error::{DbError, DbResult};

const CUSTOMER_COLUMNS: &str = "id, phone, name, address, is_active, created_at, updated_at";

pub(crate) async fn find_by_id(conn: &mut SqliteConnection, id: i64) -> DbResult<Option<Customer>> {
    let customer = sqlx::query_as::<_, Customer>(&format!(
        "SELECT {} FROM customers WHERE id = ?1",
        CUSTOMER_COLUMNS
    ))
    .bind(id)
    .fetch_optional(&mut *conn)
    .await?;

    Ok(customer)
}

pub(crate) async fn find_by_phone(conn: &mut SqliteConnection, phone: &str) -> DbResult<Option<Customer>> {
    let customer = sqlx::query_as::<_, Customer>(&format!(
        "SELECT {} FROM customers WHERE phone = ?1",
        CUSTOMER_COLUMNS
    ))
    .bind(phone)
    .fetch_optional(&mut *conn)
    .await?;

    Ok(customer)
}

/// Returns the customer with this phone, creating it when absent.
/// An existing customer is returned unchanged.
pub(crate) async fn get_or_create_by_phone(
    conn: &mut SqliteConnection,
    customer: &NewCustomer,
) -> DbResult<Customer> {
    let customer = customer.normalized();
    customer.validate()?;
    let now = Utc::now();

    let inserted = sqlx::query(
        r#"
        INSERT INTO customers (phone, name, address, is_active, created_at, updated_at)
        VALUES (?1, ?2, ?3, 1, ?4, ?4)
        ON CONFLICT(phone) DO NOTHING
        "#,
    )
    .bind(&customer.phone)
    .bind(&customer.name)
    .bind(customer.address.as_deref())
    .bind(now)
    .execute(&mut *conn)
    .await?
    .rows_affected();

    if inserted > 0 {
        debug!(phone = %customer.phone, "Created customer from invoice");
    }

    find_by_phone(conn, &customer.phone)
        .await?
        .ok_or_else(|| DbError::not_found("Customer", &customer.phone))
}

fn push_search(qb: &mut QueryBuilder<'_, Sqlite>, pattern: Option<&str>) {
    if let Some(pattern) = pattern {
        qb.push(" AND (name LIKE ")
            .push_bind(pattern.to_string())
            .push(" OR phone LIKE ")
            .push_bind(pattern.to_string())
            .push(")");
    }
}

/// Repository for the customer directory.
#[derive(Debug, Clone)]
pub struct CustomerRepository {
    pool: SqlitePool,
}

impl CustomerRepository {
    /// Creates a new CustomerRepository.
    pub fn new(pool: SqlitePool) -> Self {
        CustomerRepository { pool }
    }

    /// Gets a customer by ID.
    pub async fn get_by_id(&self, id: i64) -> DbResult<Option<Customer>> {
        let mut conn = self.pool.acquire().await?;
        find_by_id(&mut conn, id).await
    }

    /// Gets a customer by phone number.
    pub async fn get_by_phone(&self, phone: &str) -> DbResult<Option<Customer>> {
        let mut conn = self.pool.acquire().await?;
        find_by_phone(&mut conn, phone.trim()).await
    }

    /// Finds a customer by phone or creates one with the given name/address.
    pub async fn get_or_create_by_phone(&self, customer: &NewCustomer) -> DbResult<Customer> {
        let mut conn = self.pool.acquire().await?;
        get_or_create_by_phone(&mut conn, customer).await
    }

    /// Creates a customer. Fails with `UniqueViolation` on a known phone.
    pub async fn create(&self, customer: &NewCustomer) -> DbResult<Customer> {
        let customer = customer.normalized();
        customer.validate()?;
        let now = Utc::now();

        let result = sqlx::query(
            r#"
            INSERT INTO customers (phone, name, address, is_active, created_at, updated_at)
            VALUES (?1, ?2, ?3, 1, ?4, ?4)
            "#,
        )
        .bind(&customer.phone)
        .bind(&customer.name)
        .bind(customer.address.as_deref())
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(|e| match DbError::from(e) {
            DbError::UniqueViolation { .. } => DbError::duplicate("phone", &customer.phone),
            other => other,
        })?;

        let id = result.last_insert_rowid();
        info!(customer_id = id, phone = %customer.phone, "Customer created");

        self.get_by_id(id)
            .await?
            .ok_or_else(|| DbError::not_found("Customer", id))
    }

    /// Updates directory fields. A phone already taken by another customer
    /// fails with `UniqueViolation`.
    pub async fn update(&self, id: i64, update: &UpdateCustomer) -> DbResult<Customer> {
        update.validate()?;

        let mut tx = self.pool.begin().await?;

        let mut customer = find_by_id(&mut tx, id)
            .await?
            .ok_or_else(|| DbError::not_found("Customer", id))?;
        update.apply(&mut customer);

        sqlx::query(
            "UPDATE customers SET phone = ?1, name = ?2, address = ?3, is_active = ?4, updated_at = ?5 WHERE id = ?6",
        )
        .bind(&customer.phone)
        .bind(&customer.name)
        .bind(customer.address.as_deref())
        .bind(customer.is_active)
        .bind(Utc::now())
        .bind(id)
        .execute(&mut *tx)
        .await
        .map_err(|e| match DbError::from(e) {
            DbError::UniqueViolation { .. } => DbError::duplicate("phone", &customer.phone),
            other => other,
        })?;

        let updated = find_by_id(&mut tx, id)
            .await?
            .ok_or_else(|| DbError::not_found("Customer", id))?;

        tx.commit().await?;

        info!(customer_id = id, "Customer updated");
        Ok(updated)
    }

    /// Soft-deletes a customer. Invoices keep their link and header copy.
    pub async fn deactivate(&self, id: i64) -> DbResult<()> {
        let result = sqlx::query("UPDATE customers SET is_active = 0, updated_at = ?1 WHERE id = ?2")
            .bind(Utc::now())
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Customer", id));
        }

        info!(customer_id = id, "Customer deactivated");
        Ok(())
    }

    /// Searches by name or phone, ordered by name.
    pub async fn search(&self, query: &CustomerQuery) -> DbResult<Paginated<Customer>> {
        let page = PageRequest::new(query.page, query.limit);
        let pattern = validate_search_query(query.search.as_deref())?.map(|s| like_pattern(&s));

        let mut count_qb = QueryBuilder::<Sqlite>::new("SELECT COUNT(*) FROM customers WHERE is_active = 1");
        push_search(&mut count_qb, pattern.as_deref());
        let total: i64 = count_qb.build_query_scalar().fetch_one(&self.pool).await?;

        let mut qb = QueryBuilder::<Sqlite>::new(format!(
            "SELECT {} FROM customers WHERE is_active = 1",
            CUSTOMER_COLUMNS
        ));
        push_search(&mut qb, pattern.as_deref());
        qb.push(" ORDER BY name ASC, id ASC LIMIT ")
            .push_bind(page.limit as i64)
            .push(" OFFSET ")
            .push_bind(page.offset());

        let items: Vec<Customer> = qb.build_query_as().fetch_all(&self.pool).await?;
        Ok(Paginated::new(items, total, page))
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Database, DbConfig};

    fn new_customer(phone: &str, name: &str) -> NewCustomer {
        NewCustomer {
            phone: phone.to_string(),
            name: name.to_string(),
            address: None,
        }
    }

    #[tokio::test]
    async fn test_create_and_lookup() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.customers();

        let created = repo.create(&new_customer("0901234567", "Anh Tuấn")).await.unwrap();
        assert!(created.is_active);

        let by_phone = repo.get_by_phone("0901234567").await.unwrap().unwrap();
        assert_eq!(by_phone.id, created.id);
        assert!(repo.get_by_id(9999).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_duplicate_phone_rejected() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.customers();

        repo.create(&new_customer("0901234567", "A")).await.unwrap();
        let err = repo.create(&new_customer("0901234567", "B")).await.unwrap_err();
        assert!(matches!(err, DbError::UniqueViolation { ref field, .. } if field == "phone"));
    }

    #[tokio::test]
    async fn test_get_or_create_keeps_existing_customer() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.customers();

        let first = repo.get_or_create_by_phone(&new_customer("0909000111", "Chị Hoa")).await.unwrap();
        let again = repo.get_or_create_by_phone(&new_customer("0909000111", "Someone else")).await.unwrap();

        assert_eq!(first.id, again.id);
        assert_eq!(again.name, "Chị Hoa");
    }

    #[tokio::test]
    async fn test_search_paginates() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.customers();
        for (phone, name) in [("0901", "Bình"), ("0902", "An"), ("0903", "Cường")] {
            repo.create(&new_customer(phone, name)).await.unwrap();
        }

        let page = repo
            .search(&CustomerQuery {
                search: None,
                page: Some(1),
                limit: Some(2),
            })
            .await
            .unwrap();
        assert_eq!(page.total, 3);
        assert_eq!(page.items.len(), 2);
        assert_eq!(page.items[0].name, "An");

        let page = repo
            .search(&CustomerQuery {
                search: Some("0903".into()),
                ..CustomerQuery::default()
            })
            .await
            .unwrap();
        assert_eq!(page.total, 1);
        assert_eq!(page.items[0].name, "Cường");
    }

    #[tokio::test]
    async fn test_update_and_phone_conflict() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.customers();
        let lan = repo.create(&new_customer("0901000001", "Cô Lan")).await.unwrap();
        repo.create(&new_customer("0901000002", "Anh Bảo")).await.unwrap();

        let updated = repo
            .update(
                lan.id,
                &UpdateCustomer {
                    name: Some("Cô Lan (cửa hàng)".into()),
                    address: Some("45 Hai Bà Trưng".into()),
                    ..UpdateCustomer::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.name, "Cô Lan (cửa hàng)");
        assert_eq!(updated.phone, "0901000001");
        assert_eq!(updated.address.as_deref(), Some("45 Hai Bà Trưng"));

        let err = repo
            .update(
                lan.id,
                &UpdateCustomer {
                    phone: Some("0901000002".into()),
                    ..UpdateCustomer::default()
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::UniqueViolation { ref field, .. } if field == "phone"));

        let err = repo.update(999, &UpdateCustomer::default()).await.unwrap_err();
        assert!(matches!(err, DbError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_deactivate_drops_from_search() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.customers();
        let customer = repo.create(&new_customer("0901000003", "Chú Tư")).await.unwrap();

        repo.deactivate(customer.id).await.unwrap();

        let page = repo.search(&CustomerQuery::default()).await.unwrap();
        assert_eq!(page.total, 0);
        let stored = repo.get_by_phone("0901000003").await.unwrap().unwrap();
        assert!(!stored.is_active);
        assert!(matches!(repo.deactivate(999).await, Err(DbError::NotFound { .. })));
    }
}
