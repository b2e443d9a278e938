//! Upsert statement construction for the `transaction` table.
//!
//! The column list and bind order are fixed at compile time; nothing
//! about the statement depends on which fields a particular event
//! carried. Building and executing are separated so the statement can be
//! tested without a connection.

use sqlx::postgres::PgArguments;
use sqlx::query::Query;
use sqlx::Postgres;

use crate::record::TransactionRecord;

/// Insert-or-overwrite statement for one transaction row.
///
/// The conflict clause assigns every column except the `id` key, so a
/// redelivered event replaces the stored row wholesale.
pub const UPSERT_SQL: &str = "INSERT INTO transaction \
    (id, account_id, amount_type, dispute_id, initial_date, original_amount, \
     posting_date, reference_key_value, tran_code, reference_key_type, \
     settlement_date, transaction_return) \
    VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12) \
    ON CONFLICT (id) DO UPDATE SET \
    account_id = EXCLUDED.account_id, \
    amount_type = EXCLUDED.amount_type, \
    dispute_id = EXCLUDED.dispute_id, \
    initial_date = EXCLUDED.initial_date, \
    original_amount = EXCLUDED.original_amount, \
    posting_date = EXCLUDED.posting_date, \
    reference_key_value = EXCLUDED.reference_key_value, \
    tran_code = EXCLUDED.tran_code, \
    reference_key_type = EXCLUDED.reference_key_type, \
    settlement_date = EXCLUDED.settlement_date, \
    transaction_return = EXCLUDED.transaction_return";

/// Build the parameterized upsert for one record.
///
/// The returned query is bound but not executed; the caller runs it
/// inside the batch transaction.
pub fn compile_upsert(record: &TransactionRecord) -> Query<'static, Postgres, PgArguments> {
    sqlx::query(UPSERT_SQL)
        .bind(record.id.clone())
        .bind(record.account_id.clone())
        .bind(record.amount_type.clone())
        .bind(record.dispute_id.clone())
        .bind(record.initial_date)
        .bind(record.original_amount.clone())
        .bind(record.posting_date)
        .bind(record.reference_key_value.clone())
        .bind(record.tran_code.clone())
        .bind(record.reference_key_type.clone())
        .bind(record.settlement_date)
        .bind(record.transaction_return)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::FIELD_MAP;

    #[test]
    fn test_statement_binds_every_column() {
        for n in 1..=12 {
            assert!(
                UPSERT_SQL.contains(&format!("${}", n)),
                "missing placeholder ${}",
                n
            );
        }
        assert!(!UPSERT_SQL.contains("$13"));
    }

    #[test]
    fn test_column_order_matches_bind_order() {
        let columns_start = UPSERT_SQL.find('(').unwrap() + 1;
        let columns_end = UPSERT_SQL.find(')').unwrap();
        let columns: Vec<&str> = UPSERT_SQL[columns_start..columns_end]
            .split(',')
            .map(str::trim)
            .collect();

        let mut expected = vec!["id"];
        expected.extend(FIELD_MAP.iter().map(|(_, canonical)| *canonical));
        assert_eq!(columns, expected);
    }

    #[test]
    fn test_conflict_clause_overwrites_every_non_key_column() {
        let update_clause = UPSERT_SQL
            .split("DO UPDATE SET")
            .nth(1)
            .expect("statement has a conflict clause");

        for (_, canonical) in FIELD_MAP {
            assert!(
                update_clause.contains(&format!("{} = EXCLUDED.{}", canonical, canonical)),
                "conflict clause does not overwrite {}",
                canonical
            );
        }
        assert!(!update_clause.contains("id = EXCLUDED.id,"));
        assert!(!update_clause.trim_start().starts_with("id ="));
    }

    #[test]
    fn test_conflict_key_is_id() {
        assert!(UPSERT_SQL.contains("ON CONFLICT (id)"));
    }
}
