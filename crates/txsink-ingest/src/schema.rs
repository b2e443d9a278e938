//! Destination table bootstrap.

use sqlx::PgExecutor;

/// Canonical shape of the `transaction` table. `id` carries the
/// producer's opaque record identity and is the only key.
pub const CREATE_TABLE_SQL: &str = "CREATE TABLE IF NOT EXISTS transaction (\
    id TEXT PRIMARY KEY, \
    account_id TEXT, \
    amount_type TEXT, \
    dispute_id TEXT, \
    initial_date TIMESTAMPTZ, \
    original_amount NUMERIC, \
    posting_date TIMESTAMPTZ, \
    reference_key_value TEXT, \
    tran_code TEXT, \
    reference_key_type TEXT, \
    settlement_date TIMESTAMPTZ, \
    transaction_return BOOLEAN)";

/// Ensure the `transaction` table exists with the canonical column set.
///
/// Runs before every batch; `IF NOT EXISTS` makes the statement a no-op
/// once the table is in place, and it never touches existing rows.
pub async fn ensure_schema(executor: impl PgExecutor<'_>) -> Result<(), sqlx::Error> {
    sqlx::query(CREATE_TABLE_SQL).execute(executor).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::FIELD_MAP;

    #[test]
    fn test_statement_is_idempotent_create() {
        assert!(CREATE_TABLE_SQL.starts_with("CREATE TABLE IF NOT EXISTS transaction"));
    }

    #[test]
    fn test_identity_column_is_primary_key() {
        assert!(CREATE_TABLE_SQL.contains("id TEXT PRIMARY KEY"));
    }

    #[test]
    fn test_every_canonical_column_is_declared() {
        for (_, canonical) in FIELD_MAP {
            assert!(
                CREATE_TABLE_SQL.contains(canonical),
                "schema does not declare {}",
                canonical
            );
        }
    }

    #[test]
    fn test_column_types() {
        for column in ["initial_date", "posting_date", "settlement_date"] {
            assert!(CREATE_TABLE_SQL.contains(&format!("{} TIMESTAMPTZ", column)));
        }
        assert!(CREATE_TABLE_SQL.contains("original_amount NUMERIC"));
        assert!(CREATE_TABLE_SQL.contains("transaction_return BOOLEAN"));
    }
}
