//! Canonical transaction records and producer-field mapping.
//!
//! Producers emit camel-case business fields; storage uses snake-case
//! columns. The rename table below is the single source of truth for the
//! pairing. Mapping is total: every canonical key exists in the mapped
//! output (as `Null` when the producer omitted the field), which is what
//! lets a redelivered event overwrite every column instead of leaving
//! stale values behind.

use bigdecimal::BigDecimal;
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde_json::{Map, Value};
use thiserror::Error;

/// Producer field name to storage column name pairs.
pub const FIELD_MAP: [(&str, &str); 11] = [
    ("accountId", "account_id"),
    ("amountType", "amount_type"),
    ("disputeId", "dispute_id"),
    ("initialDate", "initial_date"),
    ("originalAmount", "original_amount"),
    ("postingDate", "posting_date"),
    ("referenceKeyValue", "reference_key_value"),
    ("tranCode", "tran_code"),
    ("referenceKeyType", "reference_key_type"),
    ("settlementDate", "settlement_date"),
    ("transactionReturn", "transaction_return"),
];

/// Rename producer-side keys to their storage column names.
///
/// Keys outside [`FIELD_MAP`] (including `id`) pass through unchanged.
pub fn map_fields(mut record: Map<String, Value>) -> Map<String, Value> {
    for (external, canonical) in FIELD_MAP {
        let value = record.remove(external).unwrap_or(Value::Null);
        record.insert(canonical.to_string(), value);
    }
    record
}

/// A value in the canonical mapping that cannot be coerced to its column
/// type. The affected record is skipped; its siblings are unaffected.
#[derive(Debug, Error)]
pub enum TransformError {
    #[error("record has no 'id' field")]
    MissingId,

    #[error("field '{field}' must be a string")]
    NotAString { field: &'static str },

    #[error("field '{field}' has unrecognized timestamp '{value}'")]
    InvalidTimestamp { field: &'static str, value: String },

    #[error("field '{field}' has non-numeric amount '{value}'")]
    InvalidAmount { field: &'static str, value: String },

    #[error("field '{field}' must be a boolean")]
    NotABoolean { field: &'static str },
}

/// Fixed-shape storage representation of one transaction event.
///
/// `id` is the conflict key and always present; every other column is
/// optional and overwritten wholesale when the same `id` is seen again.
#[derive(Debug, Clone, PartialEq)]
pub struct TransactionRecord {
    pub id: String,
    pub account_id: Option<String>,
    pub amount_type: Option<String>,
    pub dispute_id: Option<String>,
    pub initial_date: Option<DateTime<Utc>>,
    pub original_amount: Option<BigDecimal>,
    pub posting_date: Option<DateTime<Utc>>,
    pub reference_key_value: Option<String>,
    pub tran_code: Option<String>,
    pub reference_key_type: Option<String>,
    pub settlement_date: Option<DateTime<Utc>>,
    pub transaction_return: Option<bool>,
    /// Producer fields outside the canonical set. Kept for logging,
    /// never persisted.
    pub extra: Map<String, Value>,
}

impl TransactionRecord {
    /// Coerce a canonical mapping (the output of [`map_fields`]) into the
    /// typed record.
    pub fn from_canonical(mut canonical: Map<String, Value>) -> Result<Self, TransformError> {
        let id = match canonical.remove("id") {
            Some(Value::String(s)) => s,
            Some(Value::Null) | None => return Err(TransformError::MissingId),
            Some(_) => return Err(TransformError::NotAString { field: "id" }),
        };

        Ok(Self {
            id,
            account_id: take_string(&mut canonical, "account_id")?,
            amount_type: take_string(&mut canonical, "amount_type")?,
            dispute_id: take_string(&mut canonical, "dispute_id")?,
            initial_date: take_timestamp(&mut canonical, "initial_date")?,
            original_amount: take_amount(&mut canonical, "original_amount")?,
            posting_date: take_timestamp(&mut canonical, "posting_date")?,
            reference_key_value: take_string(&mut canonical, "reference_key_value")?,
            tran_code: take_string(&mut canonical, "tran_code")?,
            reference_key_type: take_string(&mut canonical, "reference_key_type")?,
            settlement_date: take_timestamp(&mut canonical, "settlement_date")?,
            transaction_return: take_bool(&mut canonical, "transaction_return")?,
            extra: canonical,
        })
    }
}

fn take_string(
    map: &mut Map<String, Value>,
    field: &'static str,
) -> Result<Option<String>, TransformError> {
    match map.remove(field) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s)),
        Some(_) => Err(TransformError::NotAString { field }),
    }
}

fn take_timestamp(
    map: &mut Map<String, Value>,
    field: &'static str,
) -> Result<Option<DateTime<Utc>>, TransformError> {
    match map.remove(field) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => match parse_timestamp(&s) {
            Some(ts) => Ok(Some(ts)),
            None => Err(TransformError::InvalidTimestamp { field, value: s }),
        },
        Some(other) => Err(TransformError::InvalidTimestamp {
            field,
            value: other.to_string(),
        }),
    }
}

fn take_amount(
    map: &mut Map<String, Value>,
    field: &'static str,
) -> Result<Option<BigDecimal>, TransformError> {
    let raw = match map.remove(field) {
        None | Some(Value::Null) => return Ok(None),
        Some(Value::Number(n)) => n.to_string(),
        Some(Value::String(s)) => s,
        Some(other) => {
            return Err(TransformError::InvalidAmount {
                field,
                value: other.to_string(),
            })
        },
    };

    match raw.parse::<BigDecimal>() {
        Ok(amount) => Ok(Some(amount)),
        Err(_) => Err(TransformError::InvalidAmount { field, value: raw }),
    }
}

fn take_bool(
    map: &mut Map<String, Value>,
    field: &'static str,
) -> Result<Option<bool>, TransformError> {
    match map.remove(field) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Bool(b)) => Ok(Some(b)),
        Some(_) => Err(TransformError::NotABoolean { field }),
    }
}

/// Accepts RFC 3339, naive date-times, and bare dates. Naive values are
/// taken as UTC, matching how the producers stamp them.
fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.with_timezone(&Utc));
    }

    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(naive.and_utc());
        }
    }

    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;
    use std::str::FromStr;

    fn object(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            other => panic!("expected JSON object, got {}", other),
        }
    }

    #[test]
    fn test_map_fields_renames_known_keys() {
        let mapped = map_fields(object(json!({
            "id": "tx-1",
            "accountId": "A1",
            "amountType": "FEE",
            "tranCode": "T01"
        })));

        assert_eq!(mapped["id"], json!("tx-1"));
        assert_eq!(mapped["account_id"], json!("A1"));
        assert_eq!(mapped["amount_type"], json!("FEE"));
        assert_eq!(mapped["tran_code"], json!("T01"));
        assert!(!mapped.contains_key("accountId"));
        assert!(!mapped.contains_key("amountType"));
    }

    #[test]
    fn test_map_fields_absent_keys_become_null() {
        let mapped = map_fields(object(json!({ "id": "tx-1" })));

        for (_, canonical) in FIELD_MAP {
            assert_eq!(mapped[canonical], Value::Null, "missing {}", canonical);
        }
    }

    #[test]
    fn test_map_fields_passes_unknown_keys_through() {
        let mapped = map_fields(object(json!({
            "id": "tx-1",
            "sourceSystem": "ledger-7",
            "retryCount": 3
        })));

        assert_eq!(mapped["sourceSystem"], json!("ledger-7"));
        assert_eq!(mapped["retryCount"], json!(3));
    }

    #[test]
    fn test_from_canonical_full_event() {
        let record = TransactionRecord::from_canonical(map_fields(object(json!({
            "id": "tx-1",
            "accountId": "A1",
            "amountType": "FEE",
            "originalAmount": 12.50,
            "postingDate": "2025-03-01T09:30:00Z",
            "transactionReturn": false
        }))))
        .unwrap();

        assert_eq!(record.id, "tx-1");
        assert_eq!(record.account_id.as_deref(), Some("A1"));
        assert_eq!(record.amount_type.as_deref(), Some("FEE"));
        assert_eq!(
            record.original_amount,
            Some(BigDecimal::from_str("12.5").unwrap())
        );
        assert_eq!(
            record.posting_date,
            Some(Utc.with_ymd_and_hms(2025, 3, 1, 9, 30, 0).unwrap())
        );
        assert_eq!(record.transaction_return, Some(false));
        assert_eq!(record.dispute_id, None);
        assert_eq!(record.initial_date, None);
        assert_eq!(record.settlement_date, None);
    }

    #[test]
    fn test_from_canonical_missing_id() {
        let err = TransactionRecord::from_canonical(map_fields(object(json!({
            "accountId": "A1"
        }))))
        .unwrap_err();
        assert!(matches!(err, TransformError::MissingId));

        let err = TransactionRecord::from_canonical(map_fields(object(json!({
            "id": null
        }))))
        .unwrap_err();
        assert!(matches!(err, TransformError::MissingId));
    }

    #[test]
    fn test_from_canonical_non_string_id() {
        let err = TransactionRecord::from_canonical(map_fields(object(json!({
            "id": 42
        }))))
        .unwrap_err();
        assert!(matches!(err, TransformError::NotAString { field: "id" }));
    }

    #[test]
    fn test_from_canonical_keeps_unknown_fields() {
        let record = TransactionRecord::from_canonical(map_fields(object(json!({
            "id": "tx-1",
            "sourceSystem": "ledger-7"
        }))))
        .unwrap();

        assert_eq!(record.extra["sourceSystem"], json!("ledger-7"));
    }

    #[test]
    fn test_from_canonical_amount_from_string() {
        let record = TransactionRecord::from_canonical(map_fields(object(json!({
            "id": "tx-1",
            "originalAmount": "1999.99"
        }))))
        .unwrap();

        assert_eq!(
            record.original_amount,
            Some(BigDecimal::from_str("1999.99").unwrap())
        );
    }

    #[test]
    fn test_from_canonical_bad_amount() {
        let err = TransactionRecord::from_canonical(map_fields(object(json!({
            "id": "tx-1",
            "originalAmount": "twelve"
        }))))
        .unwrap_err();
        assert!(matches!(
            err,
            TransformError::InvalidAmount {
                field: "original_amount",
                ..
            }
        ));
    }

    #[test]
    fn test_from_canonical_bad_timestamp() {
        let err = TransactionRecord::from_canonical(map_fields(object(json!({
            "id": "tx-1",
            "initialDate": "yesterday"
        }))))
        .unwrap_err();
        assert!(matches!(
            err,
            TransformError::InvalidTimestamp {
                field: "initial_date",
                ..
            }
        ));
    }

    #[test]
    fn test_from_canonical_bad_boolean() {
        let err = TransactionRecord::from_canonical(map_fields(object(json!({
            "id": "tx-1",
            "transactionReturn": "yes"
        }))))
        .unwrap_err();
        assert!(matches!(
            err,
            TransformError::NotABoolean {
                field: "transaction_return"
            }
        ));
    }

    #[test]
    fn test_parse_timestamp_formats() {
        let expected = Utc.with_ymd_and_hms(2025, 3, 1, 9, 30, 0).unwrap();

        assert_eq!(parse_timestamp("2025-03-01T09:30:00Z"), Some(expected));
        assert_eq!(parse_timestamp("2025-03-01T04:30:00-05:00"), Some(expected));
        assert_eq!(parse_timestamp("2025-03-01T09:30:00"), Some(expected));
        assert_eq!(parse_timestamp("2025-03-01 09:30:00"), Some(expected));
        assert_eq!(
            parse_timestamp("2025-03-01"),
            Some(Utc.with_ymd_and_hms(2025, 3, 1, 0, 0, 0).unwrap())
        );
        assert_eq!(parse_timestamp("03/01/2025"), None);
    }
}
