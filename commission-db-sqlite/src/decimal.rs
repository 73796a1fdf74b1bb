use std::str::FromStr;

use commission_core::RepositoryError;
use rust_decimal::Decimal;
use sqlx::{Row, TypeInfo, ValueRef};

/// Get a decimal value from a row.
///
/// Values are written as TEXT; INTEGER and REAL cells (for example from
/// hand-edited databases) are accepted too.
pub fn get_decimal(
    row: &sqlx::sqlite::SqliteRow,
    column: &str,
) -> Result<Decimal, RepositoryError> {
    let value_ref = row
        .try_get_raw(column)
        .map_err(|e| RepositoryError::Database(format!("Column '{}' not found: {}", column, e)))?;

    let type_info = value_ref.type_info();
    let type_name = type_info.name();

    match type_name {
        "TEXT" => {
            let val: String = row.try_get(column).map_err(|e| {
                RepositoryError::Database(format!("Failed to get TEXT from '{}': {}", column, e))
            })?;
            Decimal::from_str(val.trim()).map_err(|e| {
                RepositoryError::Database(format!(
                    "Invalid decimal '{}' in column '{}': {}",
                    val, column, e
                ))
            })
        }
        "INTEGER" => {
            let val: i64 = row.try_get(column).map_err(|e| {
                RepositoryError::Database(format!(
                    "Failed to get INTEGER from '{}': {}",
                    column, e
                ))
            })?;
            Ok(Decimal::from(val))
        }
        "REAL" => {
            let val: f64 = row.try_get(column).map_err(|e| {
                RepositoryError::Database(format!("Failed to get REAL from '{}': {}", column, e))
            })?;
            Decimal::try_from(val).map_err(|e| {
                RepositoryError::Database(format!("Failed to convert {} to Decimal: {}", val, e))
            })
        }
        _ => Err(RepositoryError::Database(format!(
            "Unexpected type '{}' for column '{}'",
            type_name, column
        ))),
    }
}

/// Get an optional decimal value from a row, returning None for NULL values.
pub fn get_optional_decimal(
    row: &sqlx::sqlite::SqliteRow,
    column: &str,
) -> Result<Option<Decimal>, RepositoryError> {
    let value_ref = row
        .try_get_raw(column)
        .map_err(|e| RepositoryError::Database(format!("Column '{}' not found: {}", column, e)))?;

    if value_ref.is_null() {
        return Ok(None);
    }

    get_decimal(row, column).map(Some)
}

/// Convert a Decimal to its exact TEXT form for storage.
pub fn decimal_to_text(d: Decimal) -> String {
    d.to_string()
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;
    use sqlx::sqlite::SqlitePoolOptions;

    use super::*;

    async fn create_test_table(pool: &sqlx::sqlite::SqlitePool) {
        sqlx::query(
            "CREATE TABLE test_decimals (
                id INTEGER PRIMARY KEY,
                text_value TEXT,
                int_value INTEGER,
                real_value REAL,
                null_value TEXT,
                blob_value BLOB
            )",
        )
        .execute(pool)
        .await
        .expect("Failed to create test table");
    }

    async fn setup_test_db() -> sqlx::sqlite::SqlitePool {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .expect("Failed to create in-memory database");
        create_test_table(&pool).await;
        pool
    }

    async fn fetch(
        pool: &sqlx::sqlite::SqlitePool,
        column: &str,
    ) -> sqlx::sqlite::SqliteRow {
        sqlx::query(&format!("SELECT {column} FROM test_decimals WHERE id = 1"))
            .fetch_one(pool)
            .await
            .expect("Failed to fetch row")
    }

    // get_decimal tests

    #[tokio::test]
    async fn test_get_decimal_from_text_keeps_scale() {
        let pool = setup_test_db().await;
        sqlx::query("INSERT INTO test_decimals (id, text_value) VALUES (1, ?)")
            .bind(decimal_to_text(dec!(9803.921568627450980392156863)))
            .execute(&pool)
            .await
            .expect("Failed to insert test data");

        let row = fetch(&pool, "text_value").await;

        let result = get_decimal(&row, "text_value");

        assert_eq!(result, Ok(dec!(9803.921568627450980392156863)));
    }

    #[tokio::test]
    async fn test_get_decimal_from_integer() {
        let pool = setup_test_db().await;
        sqlx::query("INSERT INTO test_decimals (id, int_value) VALUES (1, 12345)")
            .execute(&pool)
            .await
            .expect("Failed to insert test data");

        let row = fetch(&pool, "int_value").await;

        let result = get_decimal(&row, "int_value");

        assert_eq!(result, Ok(dec!(12345)));
    }

    #[tokio::test]
    async fn test_get_decimal_from_real() {
        let pool = setup_test_db().await;
        sqlx::query("INSERT INTO test_decimals (id, real_value) VALUES (1, 123.45)")
            .execute(&pool)
            .await
            .expect("Failed to insert test data");

        let row = fetch(&pool, "real_value").await;

        let result = get_decimal(&row, "real_value");

        assert_eq!(result, Ok(dec!(123.45)));
    }

    #[tokio::test]
    async fn test_get_decimal_from_invalid_text() {
        let pool = setup_test_db().await;
        sqlx::query("INSERT INTO test_decimals (id, text_value) VALUES (1, 'not a number')")
            .execute(&pool)
            .await
            .expect("Failed to insert test data");

        let row = fetch(&pool, "text_value").await;

        let result = get_decimal(&row, "text_value");

        assert!(matches!(result, Err(RepositoryError::Database(msg)) if msg.starts_with("Invalid decimal 'not a number'")));
    }

    #[tokio::test]
    async fn test_get_decimal_column_not_found() {
        let pool = setup_test_db().await;
        sqlx::query("INSERT INTO test_decimals (id) VALUES (1)")
            .execute(&pool)
            .await
            .expect("Failed to insert test data");

        let row = fetch(&pool, "id").await;

        let result = get_decimal(&row, "nonexistent_column");

        assert!(matches!(result, Err(RepositoryError::Database(msg)) if msg.starts_with("Column 'nonexistent_column' not found:")));
    }

    #[tokio::test]
    async fn test_get_decimal_unexpected_type() {
        let pool = setup_test_db().await;
        sqlx::query("INSERT INTO test_decimals (id, blob_value) VALUES (1, x'00ff')")
            .execute(&pool)
            .await
            .expect("Failed to insert test data");

        let row = fetch(&pool, "blob_value").await;

        let result = get_decimal(&row, "blob_value");

        assert_eq!(
            result,
            Err(RepositoryError::Database(
                "Unexpected type 'BLOB' for column 'blob_value'".to_string()
            ))
        );
    }

    // get_optional_decimal tests

    #[tokio::test]
    async fn test_get_optional_decimal_from_text() {
        let pool = setup_test_db().await;
        sqlx::query("INSERT INTO test_decimals (id, text_value) VALUES (1, '7600.00')")
            .execute(&pool)
            .await
            .expect("Failed to insert test data");

        let row = fetch(&pool, "text_value").await;

        let result = get_optional_decimal(&row, "text_value");

        assert_eq!(result, Ok(Some(dec!(7600.00))));
    }

    #[tokio::test]
    async fn test_get_optional_decimal_from_null_returns_none() {
        let pool = setup_test_db().await;
        sqlx::query("INSERT INTO test_decimals (id, null_value) VALUES (1, NULL)")
            .execute(&pool)
            .await
            .expect("Failed to insert test data");

        let row = fetch(&pool, "null_value").await;

        let result = get_optional_decimal(&row, "null_value");

        assert_eq!(result, Ok(None));
    }

    // decimal_to_text tests

    #[test]
    fn test_decimal_to_text_keeps_trailing_zeros() {
        assert_eq!(decimal_to_text(dec!(7600.00)), "7600.00");
    }

    #[test]
    fn test_decimal_to_text_negative() {
        assert_eq!(decimal_to_text(dec!(-789.012)), "-789.012");
    }
}
