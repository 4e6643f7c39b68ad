//! # Code Sequences
//!
//! Persisted counters behind `INV-000001` and `IMP-000001`.
//!
//! The bump is a single `UPDATE ... RETURNING` statement, so two callers can
//! never read the same value. Running it inside the caller's transaction also
//! takes the SQLite write lock up front; a rolled back document gives its
//! number back.

use sqlx::SqliteConnection;
use steel_core::CodeSequence;
use tracing::debug;

use crate::error::{DbError, DbResult};

/// Reserves the next code of `sequence`.
pub(crate) async fn next_code(conn: &mut SqliteConnection, sequence: CodeSequence) -> DbResult<String> {
    let value: Option<i64> = sqlx::query_scalar(
        "UPDATE code_sequences SET value = value + 1 WHERE name = ?1 RETURNING value",
    )
    .bind(sequence.name())
    .fetch_optional(&mut *conn)
    .await?;

    let value = value.ok_or_else(|| {
        DbError::Internal(format!("Code sequence '{}' is not initialized", sequence.name()))
    })?;

    let code = sequence.format(value);
    debug!(sequence = sequence.name(), code = %code, "Reserved document code");
    Ok(code)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Database, DbConfig};

    #[tokio::test]
    async fn test_codes_are_sequential_per_sequence() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let mut conn = db.pool().acquire().await.unwrap();

        assert_eq!(next_code(&mut conn, CodeSequence::Invoice).await.unwrap(), "INV-000001");
        assert_eq!(next_code(&mut conn, CodeSequence::Invoice).await.unwrap(), "INV-000002");
        assert_eq!(next_code(&mut conn, CodeSequence::ImportOrder).await.unwrap(), "IMP-000001");
    }

    #[tokio::test]
    async fn test_rolled_back_code_is_reused() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();

        let mut tx = db.pool().begin().await.unwrap();
        assert_eq!(next_code(&mut tx, CodeSequence::Invoice).await.unwrap(), "INV-000001");
        tx.rollback().await.unwrap();

        let mut conn = db.pool().acquire().await.unwrap();
        assert_eq!(next_code(&mut conn, CodeSequence::Invoice).await.unwrap(), "INV-000001");
    }
}
