use chrono::{DateTime, NaiveDate};
use serde_json::Value;
use thiserror::Error;

use super::{decoder::decode_byte_vector, units::octas_to_apt, units::parse_u64_value};
use crate::{
    constants::{DEFAULT_BILL_CATEGORY, DEFAULT_BILL_DESCRIPTION},
    models::{Bill, BillStatus},
};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum NormalizeError {
    #[error("bill record {index} is not an object")]
    NotAnObject { index: usize },

    #[error("bill record {index} has no id")]
    MissingId { index: usize },

    #[error("bill record {index} has an invalid amount")]
    InvalidAmount { index: usize },
}

/// Builds a [`Bill`] from one `get_user_bills` record.
///
/// `index` only feeds diagnostics. `today` is used as the due date when the
/// record's `due_date` is zero or absent (unset on-chain).
pub fn normalize_bill(
    raw: &Value,
    index: usize,
    today: NaiveDate,
) -> Result<Bill, NormalizeError> {
    let record = raw
        .as_object()
        .ok_or(NormalizeError::NotAnObject { index })?;

    let id = match record.get("id") {
        Some(Value::String(s)) if !s.is_empty() => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        _ => return Err(NormalizeError::MissingId { index }),
    };

    let description = decode_byte_vector(record.get("description"), DEFAULT_BILL_DESCRIPTION);

    let payee = record
        .get("payee")
        .and_then(|v| v.as_str())
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string);

    let due_date = record
        .get("due_date")
        .and_then(parse_u64_value)
        .filter(|secs| *secs > 0)
        .and_then(unix_to_date)
        .unwrap_or(today);

    let amount = record
        .get("amount")
        .and_then(parse_u64_value)
        .map(octas_to_apt)
        .ok_or(NormalizeError::InvalidAmount { index })?;

    let status = BillStatus::from_value(record.get("status"));

    tracing::trace!(index, %id, %status, amount, "normalized bill record");

    Ok(Bill {
        id,
        service: description.clone(),
        due_date: due_date.format("%Y-%m-%d").to_string(),
        amount,
        status,
        description: Some(description),
        category: DEFAULT_BILL_CATEGORY.to_string(),
        last_paid: None,
        payee,
    })
}

/// Normalizes every record, dropping (and logging) the ones that fail.
pub fn normalize_batch(records: &[Value], today: NaiveDate) -> Vec<Bill> {
    records
        .iter()
        .enumerate()
        .filter_map(|(index, raw)| match normalize_bill(raw, index, today) {
            Ok(bill) => Some(bill),
            Err(e) => {
                tracing::warn!("Skipping bill record: {}", e);
                None
            }
        })
        .collect()
}

/// UTC calendar date of a unix timestamp in seconds.
pub fn unix_to_date(secs: u64) -> Option<NaiveDate> {
    let secs = i64::try_from(secs).ok()?;
    DateTime::from_timestamp(secs, 0).map(|dt| dt.date_naive())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 17).unwrap()
    }

    #[test]
    fn normalizes_autopay_rent_record() {
        let raw = json!({
            "id": "3",
            "description": "0x52656e74",
            "amount": "250000000",
            "payee": "0xfeed",
            "due_date": "1767225600",
            "status": 2
        });
        let bill = normalize_bill(&raw, 0, today()).unwrap();
        assert_eq!(bill.status, BillStatus::AutoPayEnabled);
        assert_eq!(bill.amount, 2.5);
        assert_eq!(bill.service, "Rent");
        assert_eq!(bill.description.as_deref(), Some("Rent"));
        assert_eq!(bill.due_date, "2026-01-01");
        assert_eq!(bill.payee.as_deref(), Some("0xfeed"));
        assert_eq!(bill.category, "Payment");
    }

    #[test]
    fn zero_due_date_uses_today() {
        let raw = json!({"id": 1, "amount": 0, "due_date": 0, "status": 0});
        let bill = normalize_bill(&raw, 0, today()).unwrap();
        assert_eq!(bill.due_date, "2026-10-17");
        assert_eq!(bill.service, "No description");
        assert_eq!(bill.status, BillStatus::Pending);
        assert!(bill.payee.is_none());
    }

    #[test]
    fn rejects_non_objects_and_missing_ids() {
        assert_eq!(
            normalize_bill(&json!([1, 2]), 4, today()),
            Err(NormalizeError::NotAnObject { index: 4 })
        );
        assert_eq!(
            normalize_bill(&json!({"amount": "1"}), 2, today()),
            Err(NormalizeError::MissingId { index: 2 })
        );
        assert_eq!(
            normalize_bill(&json!({"id": "1", "amount": "-5"}), 1, today()),
            Err(NormalizeError::InvalidAmount { index: 1 })
        );
    }

    #[test]
    fn batch_skips_only_bad_records() {
        let records = vec![
            json!({"id": "1", "amount": "100000000", "status": 1}),
            json!("garbage"),
            json!({"id": "2", "amount": "50000000", "status": 0}),
        ];
        let bills = normalize_batch(&records, today());
        assert_eq!(bills.len(), 2);
        assert_eq!(bills[0].status, BillStatus::Paid);
        assert_eq!(bills[1].id, "2");
    }

    #[test]
    fn unix_to_date_is_utc() {
        // 2024-01-15T23:30:00Z
        assert_eq!(
            unix_to_date(1_705_361_400),
            NaiveDate::from_ymd_opt(2024, 1, 15)
        );
        assert!(unix_to_date(u64::MAX).is_none());
    }
}
